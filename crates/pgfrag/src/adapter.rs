//! Execution adapters.
//!
//! An [`Adapter`] runs a flattened [`PreparedStatement`] and hands back
//! decoded [`Row`]s. It also decides how placeholders are spelled and how
//! values are written as literals when a statement is rendered for display.
//!
//! [`PgAdapter`] is the PostgreSQL implementation; a bare
//! `tokio_postgres::Client` is an adapter as well, without session setup or
//! hooks.

mod config;
mod escape;
mod postgres;

pub use config::AdapterConfig;
pub use escape::{escape_value, quote_literal};
pub use postgres::PgAdapter;

use crate::error::{DbError, DbResult};
use crate::fragment::{PreparedStatement, dollar_placeholder};
use crate::monitor::QueryHook;
use crate::row::Row;
use crate::value::Value;
use futures_util::StreamExt;

/// Something that can execute statements.
pub trait Adapter: Send + Sync {
    /// Run `statement` and collect its rows, at most `stop_after` of them.
    fn execute(
        &self,
        statement: &PreparedStatement,
        stop_after: Option<usize>,
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    /// Placeholder text for the `index`-th parameter (1-based).
    fn enumerate_parameter(&self, index: usize) -> String {
        dollar_placeholder(index)
    }

    /// Literal SQL for `value`.
    fn escape_value(&self, value: &Value) -> DbResult<String> {
        escape_value(value)
    }

    /// Hook notified around each statement.
    fn hook(&self) -> Option<&dyn QueryHook> {
        None
    }
}

/// Stream the rows of `statement`, stopping early after `stop_after` rows.
pub(crate) async fn query_rows(
    client: &tokio_postgres::Client,
    statement: &PreparedStatement,
    stop_after: Option<usize>,
) -> DbResult<Vec<Row>> {
    let params = statement.params_ref();
    let stream = client
        .query_raw(statement.query(), params.iter().copied())
        .await
        .map_err(DbError::from_db_error)?;
    let mut stream = std::pin::pin!(stream);

    let mut rows = Vec::new();
    while stop_after.is_none_or(|limit| rows.len() < limit) {
        match stream.next().await {
            Some(row) => rows.push(Row::from_pg(&row.map_err(DbError::from_db_error)?)?),
            None => break,
        }
    }
    Ok(rows)
}

impl Adapter for tokio_postgres::Client {
    async fn execute(
        &self,
        statement: &PreparedStatement,
        stop_after: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        query_rows(self, statement, stop_after).await
    }
}
