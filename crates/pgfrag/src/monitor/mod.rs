//! Statement execution hooks.
//!
//! Every statement run through [`Db::commit`](crate::Db::commit) notifies the
//! adapter's [`QueryHook`] twice: before it is sent and after it completes
//! (with its duration and rows, or the error).
//!
//! # Example
//!
//! ```rust,ignore
//! use pgfrag::monitor::{QueryContext, QueryHook, QueryResult, StatsHook};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct PrintHook;
//!
//! impl QueryHook for PrintHook {
//!     fn after_execute(&self, ctx: &QueryContext, duration: Duration, result: QueryResult<'_>) {
//!         println!("[{duration:?}] {} - {result}", ctx.sql);
//!     }
//! }
//!
//! let stats = Arc::new(StatsHook::new());
//! let adapter = PgAdapter::connect(config)
//!     .await?
//!     .with_hook(PrintHook)
//!     .with_hook_arc(stats.clone());
//! ```

mod hooks;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;

#[cfg(test)]
mod tests;

pub use hooks::{CompositeHook, QueryStats, StatsHook};
pub use types::{QueryContext, QueryHook, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingHook;

#[cfg(feature = "tracing")]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
