use super::{ClauseCollection, FragmentCollection, Item, bind_template, clause_collection, unsupported};
use crate::error::DbResult;
use crate::fragment::{COMMA, Fragment, SINGLE, SUBQUERY};
use crate::ident::Reference;
use crate::value::Param;

clause_collection! {
    /// `SET` assignments: `"col" = {#}`, `"col" = ARRAY[{#,#}]`,
    /// `"col" = ({#::#})`. Raw SQL and expressions pass through.
    AssignmentCollection, ", "
}

impl ClauseCollection for AssignmentCollection {
    fn append_item(&mut self, item: Item) -> DbResult<()> {
        let fragment = match item {
            Item::Pair(key, param) => assignment(&key, param)?,
            Item::Raw(sql) => Fragment::raw(sql)?,
            Item::Expr(fragment) => fragment,
            other => return Err(unsupported("SET", &other)),
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

fn assignment(key: &str, param: Param) -> DbResult<Fragment> {
    let column = match Reference::column(key) {
        Reference::Identifier(ident) => ident.to_sql(),
        Reference::Raw(template) => return bind_template(&template, param),
    };
    let token = match param {
        Param::Scalar(_) => SINGLE.to_string(),
        Param::List(_) => format!("ARRAY[{}]", COMMA),
        Param::SubQuery(_) => format!("({})", SUBQUERY),
    };
    Fragment::new(format!("{column} = {token}"), vec![param])
}
