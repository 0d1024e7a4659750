use super::{ClauseCollection, FragmentCollection, Item, Node, bind_template, clause_collection, parenthesize};
use crate::error::{DbError, DbResult};
use crate::fragment::{COMMA, Fragment, SINGLE, SUBQUERY};
use crate::ident::Reference;
use crate::value::{Param, Value};

clause_collection! {
    /// Conditions joined by `AND` (`WHERE`, `HAVING`, `JOIN ... ON`).
    ///
    /// | Entry                  | Renders                    |
    /// |------------------------|----------------------------|
    /// | `col => NULL`          | `"col" IS NULL`            |
    /// | `col => scalar`        | `"col" = {#}`              |
    /// | `col => list`          | `"col" IN ({#,#})`         |
    /// | `col => sub-statement` | `"col" = ({#::#})`         |
    /// | raw SQL                | the text itself            |
    /// | expression             | the fragment itself        |
    /// | `Any` / `All`          | `(a OR b)` / `(a AND b)`   |
    ConditionCollection, " AND "
}

clause_collection! {
    /// Conditions joined by `OR`, rendered in parentheses.
    AnyConditionCollection, " OR "
}

impl ClauseCollection for ConditionCollection {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        self.inner.append(condition(item)?);
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn into_collection(self) -> FragmentCollection {
        self.inner
    }
}

impl ClauseCollection for AnyConditionCollection {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        self.inner.append(condition(item)?);
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn into_collection(self) -> FragmentCollection {
        parenthesize(self.inner)
    }
}

fn condition(item: Item) -> DbResult<Node> {
    match item {
        Item::Pair(key, param) => keyed(&key, param).map(Node::from),
        Item::Raw(sql) => Fragment::raw(sql).map(Node::from),
        Item::Expr(fragment) => Ok(fragment.into()),
        Item::Any(items) => {
            let any = AnyConditionCollection::from_items(items)?;
            if any.is_empty() {
                return Err(DbError::invalid_clause("empty OR group"));
            }
            Ok(any.into())
        }
        Item::All(items) => {
            let all = ConditionCollection::from_items(items)?;
            if all.is_empty() {
                return Err(DbError::invalid_clause("empty AND group"));
            }
            Ok(parenthesize(all).into())
        }
    }
}

fn keyed(key: &str, param: Param) -> DbResult<Fragment> {
    let column = match Reference::column(key) {
        Reference::Identifier(ident) => ident.to_sql(),
        Reference::Raw(template) => return bind_template(&template, param),
    };
    match param {
        Param::Scalar(Value::Null) => Fragment::raw(format!("{column} IS NULL")),
        Param::Scalar(_) => Fragment::new(format!("{column} = {}", SINGLE), vec![param]),
        Param::List(_) => Fragment::new(format!("{column} IN ({})", COMMA), vec![param]),
        Param::SubQuery(_) => Fragment::new(format!("{column} = ({})", SUBQUERY), vec![param]),
    }
}
