use super::{FragmentCollection, parenthesize};
use crate::error::DbResult;
use crate::fragment::{COMMA, Fragment, SINGLE, SUBQUERY};
use crate::value::Param;

/// One `VALUES` row: `({#}, ARRAY[{#,#}], ({#::#}))`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpression {
    inner: FragmentCollection,
}

impl ValueExpression {
    pub fn new() -> Self {
        Self {
            inner: FragmentCollection::new(", "),
        }
    }

    pub fn from_params(params: impl IntoIterator<Item = Param>) -> DbResult<Self> {
        let mut row = Self::new();
        for param in params {
            row.push(param)?;
        }
        Ok(row)
    }

    pub fn push(&mut self, param: impl Into<Param>) -> DbResult<&mut Self> {
        let param = param.into();
        let token = match param {
            Param::Scalar(_) => SINGLE.to_string(),
            Param::List(_) => format!("ARRAY[{}]", COMMA),
            Param::SubQuery(_) => format!("({})", SUBQUERY),
        };
        self.inner.append(Fragment::new(token, vec![param])?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn to_collection(&self) -> FragmentCollection {
        parenthesize(self.inner.clone())
    }
}

impl Default for ValueExpression {
    fn default() -> Self {
        Self::new()
    }
}
