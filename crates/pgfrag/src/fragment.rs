//! Parameterized SQL fragments.
//!
//! A [`Fragment`] is query text with placeholder tokens plus the ordered
//! parameters that fill them. Three tokens are recognized:
//!
//! | Token    | Binds                 | Flattens to                        |
//! |----------|-----------------------|------------------------------------|
//! | `{#}`    | [`Param::Scalar`]     | one placeholder                    |
//! | `{#,#}`  | [`Param::List`]       | `n` placeholders joined by `,`     |
//! | `{#::#}` | [`Param::SubQuery`]   | the nested fragment, spliced in    |
//!
//! Flattening produces a [`PreparedStatement`] whose parameters appear in the
//! order their tokens are consumed, left to right, at every nesting depth.
//!
//! # Example
//!
//! ```ignore
//! use pgfrag::{Fragment, params};
//!
//! let inner = Fragment::new(r#"SELECT "v" FROM t WHERE "v" > {#}"#, params![7])?;
//! let outer = Fragment::new(r#""fieldA" = ({#::#})"#, params![inner])?;
//!
//! let stmt = outer.prepared_statement();
//! assert_eq!(stmt.query(), r#""fieldA" = (SELECT "v" FROM t WHERE "v" > $1)"#);
//! ```

use crate::error::{DbError, DbResult};
use crate::value::{Param, Value};
use std::fmt;
use tokio_postgres::types::ToSql;


/// Token for a single scalar parameter.
pub const SINGLE: &str = "{#}";
/// Token for a list parameter expanded into comma-separated placeholders.
pub const COMMA: &str = "{#,#}";
/// Token for a nested sub-statement.
pub const SUBQUERY: &str = "{#::#}";

/// Placeholder kinds recognized in fragment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Single,
    Comma,
    SubQuery,
}

impl Placeholder {
    const ALL: [Placeholder; 3] = [Placeholder::Single, Placeholder::Comma, Placeholder::SubQuery];

    /// The literal token for this kind.
    pub const fn token(self) -> &'static str {
        match self {
            Placeholder::Single => SINGLE,
            Placeholder::Comma => COMMA,
            Placeholder::SubQuery => SUBQUERY,
        }
    }

    pub(crate) const fn expects(self) -> &'static str {
        match self {
            Placeholder::Single => "a scalar",
            Placeholder::Comma => "a list",
            Placeholder::SubQuery => "a sub-statement",
        }
    }

    /// Whether `param` may fill a placeholder of this kind.
    pub fn accepts(self, param: &Param) -> bool {
        matches!(
            (self, param),
            (Placeholder::Single, Param::Scalar(_))
                | (Placeholder::Comma, Param::List(_))
                | (Placeholder::SubQuery, Param::SubQuery(_))
        )
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Find placeholder tokens in `query`, left to right, with their byte offsets.
pub fn placeholders(query: &str) -> Vec<(usize, Placeholder)> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(pos) = query[cursor..].find("{#") {
        let start = cursor + pos;
        let tail = &query[start..];
        match Placeholder::ALL.into_iter().find(|p| tail.starts_with(p.token())) {
            Some(kind) => {
                found.push((start, kind));
                cursor = start + kind.token().len();
            }
            None => cursor = start + 2,
        }
    }
    found
}

/// Default parameter enumeration: `$1, $2, ...`.
pub fn dollar_placeholder(index: usize) -> String {
    format!("${index}")
}

/// An immutable query template with its ordered parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    query: String,
    parameters: Vec<Param>,
}

impl Fragment {
    /// Create a fragment, checking that every placeholder has a parameter of
    /// the matching kind.
    pub fn new(query: impl Into<String>, parameters: Vec<Param>) -> DbResult<Self> {
        let query = query.into();
        validate(&query, &parameters)?;
        Ok(Self { query, parameters })
    }

    /// A fragment without parameters. Fails if `query` contains placeholders.
    pub fn raw(query: impl Into<String>) -> DbResult<Self> {
        Self::new(query, Vec::new())
    }

    /// A fragment with exactly one parameter.
    pub fn bind(query: impl Into<String>, param: impl Into<Param>) -> DbResult<Self> {
        Self::new(query, vec![param.into()])
    }

    /// Build from parts already known to agree (generated by this crate).
    pub(crate) fn from_parts(query: String, parameters: Vec<Param>) -> Self {
        debug_assert!(validate(&query, &parameters).is_ok(), "{query}");
        Self { query, parameters }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[Param] {
        &self.parameters
    }

    pub fn into_parts(self) -> (String, Vec<Param>) {
        (self.query, self.parameters)
    }

    /// Flatten into a statement with `$1, $2, ...` placeholders.
    pub fn prepared_statement(&self) -> PreparedStatement {
        self.prepared_statement_with(dollar_placeholder)
    }

    /// Flatten into a statement, rendering the `n`-th placeholder (1-based)
    /// with `enumerate(n)`.
    pub fn prepared_statement_with(&self, enumerate: impl Fn(usize) -> String) -> PreparedStatement {
        let unpacked = self.unpack();
        let mut query = String::new();
        let mut index = 0;
        for part in &unpacked.parts {
            match part {
                SqlPart::Raw(s) => query.push_str(s),
                SqlPart::Param => {
                    index += 1;
                    query.push_str(&enumerate(index));
                }
            }
        }
        PreparedStatement {
            query,
            parameters: unpacked.values,
        }
    }

    /// Render with every parameter inlined as a literal.
    ///
    /// Debugging output only; statements are always executed with bound
    /// parameters.
    pub fn render_literal(&self, escape: impl Fn(&Value) -> DbResult<String>) -> DbResult<String> {
        let unpacked = self.unpack();
        let mut values = unpacked.values.iter();
        let mut out = String::new();
        for part in &unpacked.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    if let Some(value) = values.next() {
                        out.push_str(&escape(value)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn unpack(&self) -> Unpacked {
        let mut out = Unpacked::default();
        self.unpack_into(&mut out);
        out
    }

    fn unpack_into(&self, out: &mut Unpacked) {
        let mut cursor = 0;
        for ((start, kind), param) in placeholders(&self.query).into_iter().zip(&self.parameters) {
            out.push_raw(&self.query[cursor..start]);
            cursor = start + kind.token().len();
            match param {
                Param::Scalar(value) => out.push_value(value.clone()),
                // Keeps `IN ({#,#})` valid SQL for an empty list.
                Param::List(values) if values.is_empty() => out.push_raw("NULL"),
                Param::List(values) => {
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            out.push_raw(",");
                        }
                        out.push_value(value.clone());
                    }
                }
                Param::SubQuery(fragment) => fragment.unpack_into(out),
            }
        }
        out.push_raw(&self.query[cursor..]);
    }
}

fn validate(query: &str, parameters: &[Param]) -> DbResult<()> {
    let tokens = placeholders(query);
    if tokens.len() != parameters.len() {
        return Err(DbError::PlaceholderMismatch {
            placeholders: tokens.len(),
            parameters: parameters.len(),
        });
    }
    for (i, ((_, kind), param)) in tokens.iter().zip(parameters).enumerate() {
        if !kind.accepts(param) {
            return Err(DbError::PlaceholderType {
                position: i + 1,
                placeholder: *kind,
                found: param.kind_name(),
            });
        }
    }
    Ok(())
}

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Param,
}

#[derive(Debug, Default)]
struct Unpacked {
    parts: Vec<SqlPart>,
    values: Vec<Value>,
}

impl Unpacked {
    fn push_raw(&mut self, sql: &str) {
        if sql.is_empty() {
            return;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
    }

    fn push_value(&mut self, value: Value) {
        self.parts.push(SqlPart::Param);
        self.values.push(value);
    }
}

/// A flattened statement: query text with positional placeholders and its
/// parameters in binding order.
///
/// Only produced by flattening a [`Fragment`] or a collection of them.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    query: String,
    parameters: Vec<Value>,
}

impl PreparedStatement {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.parameters
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.query, self.parameters)
    }
}

impl fmt::Display for PreparedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}
