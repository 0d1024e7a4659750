use super::{
    ClauseCollection, FragmentCollection, Item, clause_collection, parenthesize, sql_text,
    unsupported,
};
use crate::error::{DbError, DbResult};
use crate::fragment::{Fragment, SUBQUERY};
use crate::ident::{Reference, parse_identifier, parse_name, quote_ident};
use crate::value::{Param, Value};

/// Quoted if `reference` is an identifier, otherwise checked raw SQL.
fn render(reference: Reference) -> DbResult<Fragment> {
    match reference {
        Reference::Identifier(ident) => Ok(sql_text(ident.to_sql())),
        Reference::Raw(sql) => Fragment::raw(sql),
    }
}

clause_collection! {
    /// Positional column list (`GROUP BY`, `ON CONFLICT (...)`).
    SimpleColumnReference, ", "
}

impl ClauseCollection for SimpleColumnReference {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Raw(sql) => render(Reference::column(&sql))?,
            Item::Expr(fragment) => fragment,
            other => return Err(unsupported("a column list", &other)),
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

clause_collection! {
    /// A single `schema.table [alias]` target (`UPDATE`, `DELETE FROM`).
    SimpleTableReference, ""
}

impl ClauseCollection for SimpleTableReference {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        if !self.inner.is_empty() {
            return Err(DbError::invalid_clause("only one target table is allowed"));
        }
        let fragment = match item {
            Item::Raw(sql) => render(Reference::table(&sql))?,
            other => return Err(unsupported("a target table", &other)),
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

clause_collection! {
    /// `FROM` / `JOIN` sources.
    ///
    /// - `"users u"` renders `"users" AS "u"`
    /// - `"u" => "users"` renders `"users" AS "u"`
    /// - `"t" => sub-statement` renders `({#::#}) AS "t"`
    TableReference, ", "
}

impl ClauseCollection for TableReference {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Raw(sql) => render(Reference::table(&sql))?,
            Item::Pair(alias, Param::Scalar(Value::Text(table))) => Fragment::raw(format!(
                "{} AS {}",
                Reference::qualified(&table).to_sql(),
                Reference::name(&alias).to_sql()
            ))?,
            Item::Pair(alias, param @ Param::SubQuery(_)) => Fragment::new(
                format!("({}) AS {}", SUBQUERY, Reference::name(&alias).to_sql()),
                vec![param],
            )?,
            Item::Expr(fragment) => fragment,
            other => return Err(unsupported("FROM", &other)),
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

clause_collection! {
    /// Common table expressions: `"name" => sub-statement` renders
    /// `"name" AS ({#::#})`.
    WithTableReference, ", "
}

impl ClauseCollection for WithTableReference {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Pair(name, param @ Param::SubQuery(_)) => Fragment::new(
                format!("{} AS ({})", Reference::name(&name).to_sql(), SUBQUERY),
                vec![param],
            )?,
            Item::Pair(name, param) => {
                return Err(DbError::invalid_clause(format!(
                    "WITH {name} expects a sub-statement, got {}",
                    param.kind_name()
                )));
            }
            other => return Err(unsupported("WITH", &other)),
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

/// `INSERT INTO` target: `"schema"."table" ("a", "b")`.
///
/// Unlike the other references there is no raw fallback: the table and every
/// column must be identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct TableWithColumnsReference {
    table: String,
    columns: Vec<String>,
}

impl TableWithColumnsReference {
    pub fn new<I, S>(table: &str, columns: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = match parse_identifier(table) {
            Some(ident) if ident.alias.is_none() => ident.to_sql(),
            _ => return Err(DbError::invalid_identifier(format!("table {table:?}"))),
        };
        let columns = columns
            .into_iter()
            .map(|c| {
                let c = c.as_ref();
                parse_name(c)
                    .map(quote_ident)
                    .ok_or_else(|| DbError::invalid_identifier(format!("column {c:?}")))
            })
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Self { table, columns })
    }

    pub fn to_collection(&self) -> FragmentCollection {
        let mut c = FragmentCollection::new(" ");
        c.append(sql_text(self.table.clone()));
        if !self.columns.is_empty() {
            c.append(parenthesize(sql_text(self.columns.join(", "))));
        }
        c
    }
}
