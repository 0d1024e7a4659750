use crate::error::DbError;
use crate::fragment::PreparedStatement;
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

/// Skip leading whitespace, comments and opening parentheses.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => {
                    s = &s[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => {
                    s = &s[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

impl QueryType {
    /// Detect query type from SQL string.
    ///
    /// For CTEs (`WITH ...`), looks past the CTE definitions to find the
    /// statement they feed.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::detect_cte_dml(trimmed)
        } else {
            QueryType::Other
        }
    }

    /// The statement after the last top-level closing parenthesis.
    fn detect_cte_dml(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut depth: i32 = 0;
        let mut last_top_level = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        last_top_level = i + 1;
                    }
                }
                b'\'' => {
                    i += 1;
                    while i < bytes.len() {
                        if bytes[i] == b'\'' {
                            if bytes.get(i + 1) == Some(&b'\'') {
                                i += 1;
                            } else {
                                break;
                            }
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let remainder = sql[last_top_level..].trim_start();
        if starts_with_keyword(remainder, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(remainder, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(remainder, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Select
        }
    }
}

/// What is about to run.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL sent to the server, with positional placeholders.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub parameters: Vec<Value>,
    /// Detected query type.
    pub query_type: QueryType,
    /// Row limit requested by the caller.
    pub stop_after: Option<usize>,
}

impl QueryContext {
    pub fn new(statement: &PreparedStatement, stop_after: Option<usize>) -> Self {
        Self {
            sql: statement.query().to_string(),
            parameters: statement.parameters().to_vec(),
            query_type: QueryType::from_sql(statement.query()),
            stop_after,
        }
    }

    pub fn param_count(&self) -> usize {
        self.parameters.len()
    }
}

/// How a statement ended.
#[derive(Debug, Clone, Copy)]
pub enum QueryResult<'a> {
    Rows(&'a [Row]),
    Error(&'a DbError),
}

impl QueryResult<'_> {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }

    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Rows(rows) => rows.len(),
            QueryResult::Error(_) => 0,
        }
    }
}

impl fmt::Display for QueryResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(rows) => write!(f, "{} rows", rows.len()),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Notification points around statement execution.
///
/// Both methods default to doing nothing. Hooks observe; they cannot change
/// or cancel the statement.
pub trait QueryHook: Send + Sync {
    /// Called before the statement is sent.
    fn before_execute(&self, ctx: &QueryContext) {
        let _ = ctx;
    }

    /// Called once the statement has finished, successfully or not.
    fn after_execute(&self, _ctx: &QueryContext, _duration: Duration, _result: QueryResult<'_>) {}
}
