//! # pgfrag
//!
//! Parameter-safe SQL fragment composition for PostgreSQL.
//!
//! ## Features
//!
//! - **Values are always bound**: native data reaches the server only as `$n` parameters
//! - **Composable fragments**: scalars, lists and nested statements share one placeholder grammar
//! - **Fluent builder**: `Db` assembles statements clause by clause, merging repeated clauses
//! - **Typed results**: rows decode into [`Value`]s keyed by column name
//! - **Error taxonomy**: server failures map onto [`DbError`] variants by SQLSTATE
//! - **Hooks**: observe every statement before and after it runs
//!
//! ## Fragments
//!
//! ```ignore
//! use pgfrag::{Fragment, params};
//!
//! let inner = Fragment::new(r#"SELECT "v" FROM t WHERE "v" > {#}"#, params![7])?;
//! let outer = Fragment::new(r#""fieldA" = ({#::#})"#, params![inner])?;
//! let stmt = outer.prepared_statement();
//! // "fieldA" = (SELECT "v" FROM t WHERE "v" > $1), [7]
//! ```
//!
//! ## Statement builder
//!
//! ```ignore
//! use pgfrag::{PgAdapter, AdapterConfig, items, select};
//!
//! let adapter = PgAdapter::connect(AdapterConfig::from_url(&url)?).await?;
//!
//! let rows = select(["id", "name"])?
//!     .from(["users"])?
//!     .where_(items! { "status" => "active", "team_id" => vec![1, 2, 3] })?
//!     .order_by(items! { "created_at" => "DESC" })?
//!     .limit(10)?
//!     .as_table(&adapter)
//!     .await?;
//! ```

pub mod adapter;
pub mod collection;
pub mod db;
pub mod error;
pub mod fragment;
pub mod ident;
pub mod monitor;
pub mod prelude;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use adapter::{Adapter, AdapterConfig, PgAdapter, escape_value, quote_literal};
pub use collection::{
    AnyConditionCollection, AssignmentCollection, ClauseCollection, ConditionCollection,
    FragmentCollection, Item, Node, OrderCollection, SelectExpression, SimpleColumnReference,
    SimpleTableReference, TableReference, TableWithColumnsReference, ValueExpression,
    WithTableReference, parenthesize,
};
pub use db::{Clause, Db, JoinKind, Slot, delete_from, insert_into, select, update, with};
pub use error::{DatabaseError, DbError, DbResult};
pub use fragment::{COMMA, Fragment, Placeholder, PreparedStatement, SINGLE, SUBQUERY};
pub use ident::{Identifier, Reference, parse_identifier, quote_ident};
pub use monitor::{
    CompositeHook, QueryContext, QueryHook, QueryResult, QueryStats, QueryType, StatsHook,
};
pub use row::Row;
pub use value::{Param, Value};

#[cfg(feature = "tracing")]
pub use monitor::TracingHook;

#[cfg(feature = "pool")]
pub use pool::{close_shared_pools, create_pool, create_pool_with_manager_config, shared_pool};

/// Build a `Vec<Param>` from native values.
///
/// Each argument goes through `Param::from`: scalars and `Option`s bind to
/// `{#}`, `Vec`s and arrays to `{#,#}`, fragments and builders to `{#::#}`.
///
/// ```ignore
/// let f = Fragment::new("a = {#} AND b IN ({#,#})", params![1, vec![2, 3]])?;
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::from($value)),+]
    };
}

/// Build a `Vec<Item>` of keyed entries.
///
/// ```ignore
/// db.where_(items! { "a" => 5, "b" => vec![1, 2, 3], "deleted_at" => None::<i64> })?;
/// ```
#[macro_export]
macro_rules! items {
    () => {
        ::std::vec::Vec::<$crate::Item>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Item::pair($key, $value)),+]
    };
}
