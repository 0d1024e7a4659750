//! Convenient imports for typical `pgfrag` usage.
//!
//! ```ignore
//! use pgfrag::prelude::*;
//! ```

pub use crate::{
    Adapter, AdapterConfig, Db, DbError, DbResult, Fragment, Item, Param, PgAdapter, Row, Value,
    delete_from, insert_into, items, params, select, update, with,
};

pub use crate::{QueryHook, StatsHook};

#[cfg(feature = "tracing")]
pub use crate::TracingHook;
