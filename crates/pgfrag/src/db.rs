//! Fluent statement builder.
//!
//! [`Db`] assembles a statement clause by clause. Every clause goes through
//! [`Db::apply`], a single match over the closed [`Clause`] enum; the fluent
//! methods and the free constructors ([`select`], [`insert_into`],
//! [`update`], [`delete_from`], [`with`]) only build the variant.
//!
//! Clauses listed in [`Slot`] are re-enterable: calling `where_` twice merges
//! both calls into one `WHERE ... AND ...`, with the keyword at the position
//! of the first call.
//!
//! ```ignore
//! use pgfrag::{items, select};
//!
//! let stmt = select(["id", "name"])?
//!     .from(["users"])?
//!     .where_(items! { "status" => "active" })?
//!     .where_(items! { "team_id" => vec![1, 2, 3] })?
//!     .prepare();
//! // SELECT "id", "name" FROM "users" WHERE "status" = $1 AND "team_id" IN ($2,$3,$4)
//! ```

use crate::adapter::Adapter;
use crate::collection::{
    AssignmentCollection, ClauseCollection, ConditionCollection, FragmentCollection, Item, Node,
    OrderCollection, SelectExpression, SimpleColumnReference, SimpleTableReference,
    TableReference, TableWithColumnsReference, ValueExpression, WithTableReference, parenthesize,
    sql_text,
};
use crate::error::{DbError, DbResult};
use crate::fragment::{Fragment, PreparedStatement};
use crate::monitor::{QueryContext, QueryResult};
use crate::row::Row;
use crate::value::{Param, Value};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;


/// Clauses that merge when applied more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    With,
    Values,
    Set,
    Where,
    GroupBy,
    Having,
    OrderBy,
    DoUpdateSet,
}

impl Slot {
    pub const fn keyword(self) -> &'static str {
        match self {
            Slot::With => "WITH",
            Slot::Values => "VALUES",
            Slot::Set => "SET",
            Slot::Where => "WHERE",
            Slot::GroupBy => "GROUP BY",
            Slot::Having => "HAVING",
            Slot::OrderBy => "ORDER BY",
            Slot::DoUpdateSet => "DO UPDATE SET",
        }
    }

    /// Name of the rendered body collection, for
    /// [`FragmentCollection::find_collection_by_name`].
    pub const fn name(self) -> &'static str {
        match self {
            Slot::With => "with",
            Slot::Values => "values",
            Slot::Set => "set",
            Slot::Where => "where",
            Slot::GroupBy => "group_by",
            Slot::Having => "having",
            Slot::OrderBy => "order_by",
            Slot::DoUpdateSet => "do_update_set",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// Every clause [`Db`] knows how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    With(Vec<Item>),
    Select(Vec<Item>),
    SelectDistinct(Vec<Item>),
    InsertInto { table: String, columns: Vec<String> },
    /// One row; repeated calls add rows.
    Values(Vec<Param>),
    Update(String),
    Set(Vec<Item>),
    DeleteFrom(String),
    From(Vec<Item>),
    Join {
        kind: JoinKind,
        table: Item,
        on: Vec<Item>,
    },
    Where(Vec<Item>),
    GroupBy(Vec<Item>),
    Having(Vec<Item>),
    OrderBy(Vec<Item>),
    Limit(i64),
    Offset(i64),
    /// Conflict target columns; empty for a bare `ON CONFLICT`.
    OnConflict(Vec<Item>),
    DoUpdateSet(Vec<Item>),
    DoNothing,
    Returning(Vec<Item>),
    Union(Fragment),
    UnionAll(Fragment),
    Raw(Fragment),
}

#[derive(Debug, Clone, PartialEq)]
enum SlotBody {
    With(WithTableReference),
    Values(Vec<ValueExpression>),
    Assignments(AssignmentCollection),
    Conditions(ConditionCollection),
    Columns(SimpleColumnReference),
    Order(OrderCollection),
}

impl SlotBody {
    fn empty(slot: Slot) -> Self {
        match slot {
            Slot::With => SlotBody::With(WithTableReference::new()),
            Slot::Values => SlotBody::Values(Vec::new()),
            Slot::Set | Slot::DoUpdateSet => SlotBody::Assignments(AssignmentCollection::new()),
            Slot::Where | Slot::Having => SlotBody::Conditions(ConditionCollection::new()),
            Slot::GroupBy => SlotBody::Columns(SimpleColumnReference::new()),
            Slot::OrderBy => SlotBody::Order(OrderCollection::new()),
        }
    }

    fn extend(&mut self, items: Vec<Item>) -> DbResult<()> {
        match self {
            SlotBody::With(c) => c.extend_items(items),
            SlotBody::Assignments(c) => c.extend_items(items),
            SlotBody::Conditions(c) => c.extend_items(items),
            SlotBody::Columns(c) => c.extend_items(items),
            SlotBody::Order(c) => c.extend_items(items),
            SlotBody::Values(_) => Err(DbError::invalid_clause("VALUES takes rows of parameters")),
        }
    }

    fn to_collection(&self) -> FragmentCollection {
        match self {
            SlotBody::With(c) => c.to_collection(),
            SlotBody::Assignments(c) => c.to_collection(),
            SlotBody::Conditions(c) => c.to_collection(),
            SlotBody::Columns(c) => c.to_collection(),
            SlotBody::Order(c) => c.to_collection(),
            SlotBody::Values(rows) => {
                let mut c = FragmentCollection::new(", ");
                for row in rows {
                    c.append(row.to_collection());
                }
                c
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Node(Node),
    Slot(Slot),
}

/// A statement under construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Db {
    parts: Vec<Part>,
    slots: HashMap<Slot, SlotBody>,
}

fn collect<I>(items: I) -> Vec<Item>
where
    I: IntoIterator,
    I::Item: Into<Item>,
{
    items.into_iter().map(Into::into).collect()
}

/// Build `C` from `items`, failing if nothing was given.
fn required<C: ClauseCollection>(keyword: &str, items: Vec<Item>) -> DbResult<C> {
    let collection = C::from_items(items)?;
    if collection.is_empty() {
        return Err(DbError::invalid_clause(format!(
            "{keyword} requires at least one entry"
        )));
    }
    Ok(collection)
}

fn keyword_clause(keyword: &str, body: impl Into<Node>) -> FragmentCollection {
    let mut clause = FragmentCollection::new(" ");
    clause.append(sql_text(keyword));
    clause.append(body);
    clause
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one clause.
    pub fn apply(mut self, clause: Clause) -> DbResult<Self> {
        match clause {
            Clause::With(items) => self.merge(Slot::With, items)?,
            Clause::Select(items) => {
                let body: SelectExpression = required("SELECT", items)?;
                self.push(keyword_clause("SELECT", body));
            }
            Clause::SelectDistinct(items) => {
                let body: SelectExpression = required("SELECT DISTINCT", items)?;
                self.push(keyword_clause("SELECT DISTINCT", body));
            }
            Clause::InsertInto { table, columns } => {
                let target = TableWithColumnsReference::new(&table, &columns)?;
                self.push(keyword_clause("INSERT INTO", target.to_collection()));
            }
            Clause::Values(params) => {
                let row = ValueExpression::from_params(params)?;
                if row.is_empty() {
                    return Err(DbError::invalid_clause("VALUES row is empty"));
                }
                if let SlotBody::Values(rows) = self.slot_body(Slot::Values) {
                    rows.push(row);
                }
            }
            Clause::Update(table) => {
                let target = SimpleTableReference::from_items([table])?;
                self.push(keyword_clause("UPDATE", target));
            }
            Clause::Set(items) => self.merge(Slot::Set, items)?,
            Clause::DeleteFrom(table) => {
                let target = SimpleTableReference::from_items([table])?;
                self.push(keyword_clause("DELETE FROM", target));
            }
            Clause::From(items) => {
                let body: TableReference = required("FROM", items)?;
                self.push(keyword_clause("FROM", body));
            }
            Clause::Join { kind, table, on } => {
                let mut join = keyword_clause(kind.keyword(), TableReference::from_items([table])?);
                match (kind, on.is_empty()) {
                    (JoinKind::Cross, true) => {}
                    (JoinKind::Cross, false) => {
                        return Err(DbError::invalid_clause("CROSS JOIN takes no ON conditions"));
                    }
                    (_, true) => {
                        return Err(DbError::invalid_clause(format!(
                            "{} requires ON conditions",
                            kind.keyword()
                        )));
                    }
                    (_, false) => {
                        join.append(sql_text("ON"));
                        join.append(ConditionCollection::from_items(on)?);
                    }
                }
                self.push(join);
            }
            Clause::Where(items) => self.merge(Slot::Where, items)?,
            Clause::GroupBy(items) => self.merge(Slot::GroupBy, items)?,
            Clause::Having(items) => self.merge(Slot::Having, items)?,
            Clause::OrderBy(items) => self.merge(Slot::OrderBy, items)?,
            Clause::Limit(n) => self.push(bounded("LIMIT", n)?),
            Clause::Offset(n) => self.push(bounded("OFFSET", n)?),
            Clause::OnConflict(items) => {
                if items.is_empty() {
                    self.push(sql_text("ON CONFLICT"));
                } else {
                    let target: SimpleColumnReference = required("ON CONFLICT", items)?;
                    self.push(keyword_clause("ON CONFLICT", parenthesize(target)));
                }
            }
            Clause::DoUpdateSet(items) => self.merge(Slot::DoUpdateSet, items)?,
            Clause::DoNothing => self.push(sql_text("DO NOTHING")),
            Clause::Returning(items) => {
                let body: SelectExpression = required("RETURNING", items)?;
                self.push(keyword_clause("RETURNING", body));
            }
            Clause::Union(other) => self.push(keyword_clause("UNION", other)),
            Clause::UnionAll(other) => self.push(keyword_clause("UNION ALL", other)),
            Clause::Raw(fragment) => self.push(fragment),
        }
        Ok(self)
    }

    fn push(&mut self, node: impl Into<Node>) {
        self.parts.push(Part::Node(node.into()));
    }

    /// The body for `slot`, creating it (and fixing its position) on first use.
    fn slot_body(&mut self, slot: Slot) -> &mut SlotBody {
        match self.slots.entry(slot) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                self.parts.push(Part::Slot(slot));
                e.insert(SlotBody::empty(slot))
            }
        }
    }

    /// Merge into a re-enterable clause. An empty call leaves the statement unchanged.
    fn merge(&mut self, slot: Slot, items: Vec<Item>) -> DbResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.slot_body(slot).extend(items)
    }

    pub fn with<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::With(collect(items)))
    }

    pub fn select<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Select(collect(items)))
    }

    pub fn select_distinct<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::SelectDistinct(collect(items)))
    }

    pub fn insert_into<I, S>(self, table: &str, columns: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(Clause::InsertInto {
            table: table.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    /// Add one `VALUES` row.
    pub fn values(self, row: Vec<Param>) -> DbResult<Self> {
        self.apply(Clause::Values(row))
    }

    pub fn update(self, table: &str) -> DbResult<Self> {
        self.apply(Clause::Update(table.to_string()))
    }

    pub fn set<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Set(collect(items)))
    }

    pub fn delete_from(self, table: &str) -> DbResult<Self> {
        self.apply(Clause::DeleteFrom(table.to_string()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::From(collect(items)))
    }

    pub fn join<I>(self, kind: JoinKind, table: impl Into<Item>, on: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Join {
            kind,
            table: table.into(),
            on: collect(on),
        })
    }

    pub fn inner_join<I>(self, table: impl Into<Item>, on: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn left_join<I>(self, table: impl Into<Item>, on: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.join(JoinKind::Left, table, on)
    }

    pub fn cross_join(self, table: impl Into<Item>) -> DbResult<Self> {
        self.join(JoinKind::Cross, table, Vec::<Item>::new())
    }

    /// `WHERE`; named with a trailing underscore since `where` is a keyword.
    pub fn where_<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Where(collect(items)))
    }

    pub fn group_by<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::GroupBy(collect(items)))
    }

    pub fn having<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Having(collect(items)))
    }

    pub fn order_by<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::OrderBy(collect(items)))
    }

    pub fn limit(self, n: i64) -> DbResult<Self> {
        self.apply(Clause::Limit(n))
    }

    pub fn offset(self, n: i64) -> DbResult<Self> {
        self.apply(Clause::Offset(n))
    }

    pub fn on_conflict<I>(self, columns: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::OnConflict(collect(columns)))
    }

    pub fn do_update_set<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::DoUpdateSet(collect(items)))
    }

    pub fn do_nothing(self) -> DbResult<Self> {
        self.apply(Clause::DoNothing)
    }

    pub fn returning<I>(self, items: I) -> DbResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.apply(Clause::Returning(collect(items)))
    }

    pub fn union(self, other: impl Into<Fragment>) -> DbResult<Self> {
        self.apply(Clause::Union(other.into()))
    }

    pub fn union_all(self, other: impl Into<Fragment>) -> DbResult<Self> {
        self.apply(Clause::UnionAll(other.into()))
    }

    /// Append a fragment verbatim.
    pub fn raw(self, fragment: impl Into<Fragment>) -> DbResult<Self> {
        self.apply(Clause::Raw(fragment.into()))
    }

    /// The statement as a collection tree, with each slot body named after
    /// its [`Slot::name`].
    pub fn to_collection(&self) -> FragmentCollection {
        let mut statement = FragmentCollection::new(" ");
        for part in &self.parts {
            match part {
                Part::Node(node) => {
                    statement.append(node.clone());
                }
                Part::Slot(slot) => {
                    if let Some(body) = self.slots.get(slot) {
                        let body = body.to_collection().named(slot.name());
                        statement.append(keyword_clause(slot.keyword(), body));
                    }
                }
            }
        }
        statement
    }

    pub fn to_fragment(&self) -> Fragment {
        self.to_collection().into_fragment()
    }

    pub fn into_fragment(self) -> Fragment {
        self.to_fragment()
    }

    /// Flatten with `$1, $2, ...` placeholders.
    pub fn prepare(&self) -> PreparedStatement {
        self.to_fragment().prepared_statement()
    }

    /// Flatten with the adapter's placeholder style.
    pub fn prepare_for<A: Adapter>(&self, adapter: &A) -> PreparedStatement {
        self.to_fragment()
            .prepared_statement_with(|index| adapter.enumerate_parameter(index))
    }

    /// Render with parameters inlined by the adapter's escaping. For logs and
    /// debugging only.
    pub fn to_literal_sql<A: Adapter>(&self, adapter: &A) -> DbResult<String> {
        self.to_fragment()
            .render_literal(|value| adapter.escape_value(value))
    }

    /// Execute and return the rows, at most `stop_after` of them.
    pub async fn commit<A: Adapter>(
        &self,
        adapter: &A,
        stop_after: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let statement = self.prepare_for(adapter);
        execute(adapter, &statement, stop_after).await
    }

    pub async fn as_table<A: Adapter>(&self, adapter: &A) -> DbResult<Vec<Row>> {
        self.commit(adapter, None).await
    }

    /// The first row, if any.
    pub async fn as_row<A: Adapter>(&self, adapter: &A) -> DbResult<Option<Row>> {
        let rows = self.commit(adapter, Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// The first column of the first row, if any.
    pub async fn as_value<A: Adapter>(&self, adapter: &A) -> DbResult<Option<Value>> {
        self.as_value_at(adapter, 0).await
    }

    /// Column `index` of the first row, if any.
    pub async fn as_value_at<A: Adapter>(
        &self,
        adapter: &A,
        index: usize,
    ) -> DbResult<Option<Value>> {
        let Some(row) = self.as_row(adapter).await? else {
            return Ok(None);
        };
        match row.get_index(index) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(DbError::decode(
                format!("#{index}"),
                format!("row has {} column(s)", row.len()),
            )),
        }
    }
}

fn bounded(keyword: &str, n: i64) -> DbResult<Fragment> {
    if n < 0 {
        return Err(DbError::invalid_clause(format!(
            "{keyword} must be non-negative, got {n}"
        )));
    }
    Fragment::bind(format!("{keyword} {{#}}"), n)
}

/// Run `statement`, notifying the adapter's hook before and after.
async fn execute<A: Adapter>(
    adapter: &A,
    statement: &PreparedStatement,
    stop_after: Option<usize>,
) -> DbResult<Vec<Row>> {
    let ctx = QueryContext::new(statement, stop_after);
    if let Some(hook) = adapter.hook() {
        hook.before_execute(&ctx);
    }

    let start = Instant::now();
    let result = adapter.execute(statement, stop_after).await;
    let elapsed = start.elapsed();

    if let Some(hook) = adapter.hook() {
        match &result {
            Ok(rows) => hook.after_execute(&ctx, elapsed, QueryResult::Rows(rows)),
            Err(err) => hook.after_execute(&ctx, elapsed, QueryResult::Error(err)),
        }
    }
    result
}

/// `SELECT ...`
pub fn select<I>(items: I) -> DbResult<Db>
where
    I: IntoIterator,
    I::Item: Into<Item>,
{
    Db::new().select(items)
}

/// `INSERT INTO table (columns)`
pub fn insert_into<I, S>(table: &str, columns: I) -> DbResult<Db>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Db::new().insert_into(table, columns)
}

/// `UPDATE table`
pub fn update(table: &str) -> DbResult<Db> {
    Db::new().update(table)
}

/// `DELETE FROM table`
pub fn delete_from(table: &str) -> DbResult<Db> {
    Db::new().delete_from(table)
}

/// `WITH name AS (...)`
pub fn with<I>(items: I) -> DbResult<Db>
where
    I: IntoIterator,
    I::Item: Into<Item>,
{
    Db::new().with(items)
}

impl From<Db> for Fragment {
    fn from(db: Db) -> Self {
        db.into_fragment()
    }
}

impl From<Db> for Node {
    fn from(db: Db) -> Self {
        Node::Fragment(db.into_fragment())
    }
}

impl From<Db> for Param {
    fn from(db: Db) -> Self {
        Param::SubQuery(Box::new(db.into_fragment()))
    }
}

impl From<Db> for Item {
    fn from(db: Db) -> Self {
        Item::Expr(db.into_fragment())
    }
}
