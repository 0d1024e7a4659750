use super::{ClauseCollection, FragmentCollection, Item, clause_collection, sql_text, unsupported};
use crate::error::DbResult;
use crate::fragment::{COMMA, Fragment, SINGLE, SUBQUERY};
use crate::ident::Reference;
use crate::value::Param;

clause_collection! {
    /// Output expressions of `SELECT` and `RETURNING`.
    ///
    /// Positional entries are columns (`users.id uid` renders
    /// `"users"."id" AS "uid"`) or raw SQL such as `*` and `count(*)`.
    /// Keyed entries bind a value under an alias: `{#} AS "alias"`,
    /// `ARRAY[{#,#}] AS "alias"`, `({#::#}) AS "alias"`.
    SelectExpression, ", "
}

impl ClauseCollection for SelectExpression {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Raw(sql) => match Reference::aliased_column(&sql) {
                Reference::Identifier(ident) => sql_text(ident.to_sql()),
                Reference::Raw(sql) => Fragment::raw(sql)?,
            },
            Item::Pair(alias, param) => {
                let alias = Reference::name(&alias).to_sql();
                let token = match param {
                    Param::Scalar(_) => SINGLE.to_string(),
                    Param::List(_) => format!("ARRAY[{}]", COMMA),
                    Param::SubQuery(_) => format!("({})", SUBQUERY),
                };
                Fragment::new(format!("{token} AS {alias}"), vec![param])?
            }
            Item::Expr(fragment) => fragment,
            other => return Err(unsupported("SELECT", &other)),
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
