use super::{ClauseCollection, FragmentCollection, Item, clause_collection, sql_text, unsupported};
use crate::error::{DbError, DbResult};
use crate::fragment::Fragment;
use crate::ident::Reference;
use crate::value::{Param, Value};
use regex::Regex;
use std::sync::OnceLock;

clause_collection! {
    /// `ORDER BY` terms.
    ///
    /// A positional column renders quoted (or verbatim if it is not an
    /// identifier). A keyed entry takes a direction:
    /// `"created_at" => "desc nulls last"` renders
    /// `"created_at" DESC NULLS LAST`.
    OrderCollection, ", "
}

fn direction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(ASC|DESC)(?:\s+NULLS\s+(FIRST|LAST))?\s*$")
            .expect("invalid built-in direction regex")
    })
}

/// Normalize `asc`, `DESC nulls first`, ... to upper case. `None` if invalid.
fn direction(text: &str) -> Option<String> {
    let caps = direction_re().captures(text)?;
    let mut out = caps.get(1)?.as_str().to_ascii_uppercase();
    if let Some(nulls) = caps.get(2) {
        out.push_str(" NULLS ");
        out.push_str(&nulls.as_str().to_ascii_uppercase());
    }
    Some(out)
}

impl ClauseCollection for OrderCollection {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Raw(sql) => match Reference::column(&sql) {
                Reference::Identifier(ident) => sql_text(ident.to_sql()),
                Reference::Raw(sql) => Fragment::raw(sql)?,
            },
            Item::Pair(column, Param::Scalar(Value::Text(dir))) => {
                let dir = direction(&dir).ok_or_else(|| {
                    DbError::invalid_clause(format!("invalid sort direction {dir:?} for {column}"))
                })?;
                Fragment::raw(format!("{} {dir}", Reference::column(&column).to_sql()))?
            }
            Item::Pair(column, param) => {
                return Err(DbError::invalid_clause(format!(
                    "ORDER BY {column} expects a direction, got {}",
                    param.kind_name()
                )));
            }
            Item::Expr(fragment) => fragment,
            other => return Err(unsupported("ORDER BY", &other)),
        };
        self.inner.append(fragment);
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn into_collection(self) -> FragmentCollection {
        self.inner
    }
}
