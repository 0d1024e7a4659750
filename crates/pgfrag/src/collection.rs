//! Fragment collections and clause grammars.
//!
//! A [`FragmentCollection`] is an ordered tree of fragments joined by a glue
//! string. Flattening concatenates the children's text with the glue and
//! their parameters in append order, so the result is again a valid
//! [`Fragment`].
//!
//! The clause types in this module ([`ConditionCollection`],
//! [`AssignmentCollection`], [`SelectExpression`], ...) turn native
//! [`Item`]s into fragments, each with its own grammar. Keys that look like
//! identifiers are quoted; anything else is taken as trusted SQL. Values are
//! always bound.

use crate::error::{DbError, DbResult};
use crate::fragment::{Fragment, PreparedStatement, placeholders};
use crate::value::Param;

mod assignment;
mod condition;
mod order;
mod reference;
mod select;
mod values;


pub use assignment::AssignmentCollection;
pub use condition::{AnyConditionCollection, ConditionCollection};
pub use order::OrderCollection;
pub use reference::{
    SimpleColumnReference, SimpleTableReference, TableReference, TableWithColumnsReference,
    WithTableReference,
};
pub use select::SelectExpression;
pub use values::ValueExpression;

/// A child of a [`FragmentCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Fragment(Fragment),
    Collection(FragmentCollection),
}

impl Node {
    pub fn query(&self) -> String {
        match self {
            Node::Fragment(f) => f.query().to_string(),
            Node::Collection(c) => c.query(),
        }
    }

    fn collect_parameters(&self, out: &mut Vec<Param>) {
        match self {
            Node::Fragment(f) => out.extend(f.parameters().iter().cloned()),
            Node::Collection(c) => {
                for node in &c.fragments {
                    node.collect_parameters(out);
                }
            }
        }
    }
}

impl From<Fragment> for Node {
    fn from(f: Fragment) -> Self {
        Node::Fragment(f)
    }
}

impl From<FragmentCollection> for Node {
    fn from(c: FragmentCollection) -> Self {
        Node::Collection(c)
    }
}

/// Ordered fragments joined by `glue`.
///
/// A collection may carry a name so it can be found again inside a larger
/// tree with [`FragmentCollection::find_collection_by_name`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FragmentCollection {
    glue: String,
    fragments: Vec<Node>,
    name: Option<String>,
}

impl FragmentCollection {
    pub fn new(glue: impl Into<String>) -> Self {
        Self {
            glue: glue.into(),
            fragments: Vec::new(),
            name: None,
        }
    }

    /// Attach a name to this collection.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn glue(&self) -> &str {
        &self.glue
    }

    pub fn fragments(&self) -> &[Node] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn append(&mut self, node: impl Into<Node>) -> &mut Self {
        self.fragments.push(node.into());
        self
    }

    /// Append bare SQL text. Text containing placeholder tokens is rejected,
    /// since it would have nothing to bind.
    pub fn append_sql(&mut self, sql: impl Into<String>) -> DbResult<&mut Self> {
        let fragment = Fragment::raw(sql)?;
        Ok(self.append(fragment))
    }

    /// Children's text joined by the glue.
    pub fn query(&self) -> String {
        let parts: Vec<String> = self.fragments.iter().map(Node::query).collect();
        parts.join(&self.glue)
    }

    /// Children's parameters in append order.
    pub fn parameters(&self) -> Vec<Param> {
        let mut out = Vec::new();
        for node in &self.fragments {
            node.collect_parameters(&mut out);
        }
        out
    }

    pub fn to_fragment(&self) -> Fragment {
        Fragment::from_parts(self.query(), self.parameters())
    }

    pub fn into_fragment(self) -> Fragment {
        self.to_fragment()
    }

    pub fn prepared_statement(&self) -> PreparedStatement {
        self.to_fragment().prepared_statement()
    }

    /// Depth-first search for a collection named `name`, starting with `self`.
    pub fn find_collection_by_name(&self, name: &str) -> Option<&FragmentCollection> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.fragments.iter().find_map(|node| match node {
            Node::Collection(c) => c.find_collection_by_name(name),
            Node::Fragment(_) => None,
        })
    }

    pub fn find_collection_by_name_mut(&mut self, name: &str) -> Option<&mut FragmentCollection> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        for node in &mut self.fragments {
            if let Node::Collection(c) = node
                && let Some(found) = c.find_collection_by_name_mut(name)
            {
                return Some(found);
            }
        }
        None
    }
}

/// Wrap `node` as `(` node `)`.
pub fn parenthesize(node: impl Into<Node>) -> FragmentCollection {
    let mut c = FragmentCollection::new("");
    c.append(sql_text("("));
    c.append(node);
    c.append(sql_text(")"));
    c
}

/// Text generated by this crate that is known to contain no placeholders.
pub(crate) fn sql_text(sql: impl Into<String>) -> Fragment {
    Fragment::from_parts(sql.into(), Vec::new())
}

/// One native entry handed to a clause grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `key => value`: the key is an identifier (quoted) or a raw template.
    Pair(String, Param),
    /// Positional SQL text: an identifier, or trusted SQL used verbatim.
    Raw(String),
    /// Positional pre-built expression or sub-statement.
    Expr(Fragment),
    /// Entries joined by `OR`, in parentheses.
    Any(Vec<Item>),
    /// Entries joined by `AND`, in parentheses.
    All(Vec<Item>),
}

impl Item {
    pub fn pair(key: impl Into<String>, value: impl Into<Param>) -> Self {
        Item::Pair(key.into(), value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Item::Raw(sql.into())
    }

    pub fn expr(fragment: impl Into<Fragment>) -> Self {
        Item::Expr(fragment.into())
    }

    pub fn any<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        Item::Any(items.into_iter().map(Into::into).collect())
    }

    pub fn all<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        Item::All(items.into_iter().map(Into::into).collect())
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Item::Pair(..) => "keyed entry",
            Item::Raw(_) => "raw SQL",
            Item::Expr(_) => "expression",
            Item::Any(_) => "OR group",
            Item::All(_) => "AND group",
        }
    }
}

impl From<&str> for Item {
    fn from(sql: &str) -> Self {
        Item::Raw(sql.to_string())
    }
}

impl From<String> for Item {
    fn from(sql: String) -> Self {
        Item::Raw(sql)
    }
}

impl From<Fragment> for Item {
    fn from(f: Fragment) -> Self {
        Item::Expr(f)
    }
}

impl<K: Into<String>, V: Into<Param>> From<(K, V)> for Item {
    fn from((key, value): (K, V)) -> Self {
        Item::Pair(key.into(), value.into())
    }
}

/// A collection with a clause grammar for [`Item`]s.
pub trait ClauseCollection: Default + Clone {
    /// Render one entry and append it.
    fn append_item(&mut self, item: Item) -> DbResult<()>;

    /// Number of rendered entries.
    fn len(&self) -> usize;

    /// The rendered collection.
    fn into_collection(self) -> FragmentCollection;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_collection(&self) -> FragmentCollection {
        self.clone().into_collection()
    }

    fn extend_items<I>(&mut self, items: I) -> DbResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        for item in items {
            self.append_item(item.into())?;
        }
        Ok(())
    }

    fn from_items<I>(items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        let mut collection = Self::default();
        collection.extend_items(items)?;
        Ok(collection)
    }
}

/// Declare a clause collection: a glued [`FragmentCollection`] wrapper.
macro_rules! clause_collection {
    ($(#[$meta:meta])* $name:ident, $glue:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            inner: $crate::collection::FragmentCollection,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    inner: $crate::collection::FragmentCollection::new($glue),
                }
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl From<$name> for $crate::collection::FragmentCollection {
            fn from(c: $name) -> Self {
                $crate::collection::ClauseCollection::into_collection(c)
            }
        }

        impl From<$name> for $crate::collection::Node {
            fn from(c: $name) -> Self {
                $crate::collection::Node::Collection(c.into())
            }
        }
    };
}

pub(crate) use clause_collection;

/// Bind `param` to a raw key such as `"fieldA" = {#}` or `a BETWEEN {#} AND {#}`.
///
/// One placeholder takes the value as is. `n > 1` placeholders take a list of
/// exactly `n` values, one per placeholder.
pub(crate) fn bind_template(template: &str, param: Param) -> DbResult<Fragment> {
    let count = placeholders(template).len();
    match param {
        param if count == 1 => Fragment::new(template, vec![param]),
        Param::List(values) if count > 1 && values.len() == count => {
            Fragment::new(template, values.into_iter().map(Param::Scalar).collect())
        }
        Param::List(values) => Err(DbError::PlaceholderMismatch {
            placeholders: count,
            parameters: values.len(),
        }),
        _ => Err(DbError::PlaceholderMismatch {
            placeholders: count,
            parameters: 1,
        }),
    }
}

pub(crate) fn unsupported(clause: &str, item: &Item) -> DbError {
    DbError::invalid_clause(format!("{clause} does not accept {}", item.kind_name()))
}
