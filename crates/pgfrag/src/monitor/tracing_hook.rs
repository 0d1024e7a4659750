use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// A `tracing`-based hook that logs each statement before it is sent and
/// again when it completes.
///
/// Enable via the crate feature: `pgfrag = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryHook for TracingHook {
    fn before_execute(&self, ctx: &QueryContext) {
        let sql = self.truncate_sql(&ctx.sql);
        emit_at_level!(
            self.level,
            target: "pgfrag.sql",
            query_type = ?ctx.query_type,
            param_count = ctx.param_count(),
            sql = %sql,
        );
    }

    fn after_execute(&self, ctx: &QueryContext, duration: Duration, result: QueryResult<'_>) {
        match result {
            QueryResult::Rows(rows) => emit_at_level!(
                self.level,
                target: "pgfrag.sql",
                query_type = ?ctx.query_type,
                duration_us = duration.as_micros() as u64,
                rows = rows.len(),
                "statement completed"
            ),
            QueryResult::Error(err) => emit_at_level!(
                self.level,
                target: "pgfrag.sql",
                query_type = ?ctx.query_type,
                duration_us = duration.as_micros() as u64,
                error = %err,
                "statement failed"
            ),
        }
    }
}
