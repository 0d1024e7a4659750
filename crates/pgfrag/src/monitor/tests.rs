use super::*;
use crate::error::{DatabaseError, DbError};
use crate::fragment::Fragment;
use crate::params;
use crate::row::Row;
use crate::value::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn ctx(sql: &str) -> QueryContext {
    let statement = Fragment::raw(sql).unwrap().prepared_statement();
    QueryContext::new(&statement, None)
}

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select id from users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("INSERT INTO users VALUES (1)"), QueryType::Insert);
    assert_eq!(QueryType::from_sql("UPDATE users SET name = 'x'"), QueryType::Update);
    assert_eq!(QueryType::from_sql("DELETE FROM users"), QueryType::Delete);
    assert_eq!(QueryType::from_sql("CREATE TABLE t (id int)"), QueryType::Other);
    assert_eq!(
        QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"),
        QueryType::Select
    );
}

#[test]
fn test_query_type_skips_comments() {
    assert_eq!(
        QueryType::from_sql("-- fetch users\nSELECT * FROM users"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("/* audit */ DELETE FROM logs"),
        QueryType::Delete
    );
    assert_eq!(QueryType::from_sql("-- only a comment"), QueryType::Other);
}

#[test]
fn test_query_type_looks_through_ctes() {
    assert_eq!(
        QueryType::from_sql(r#"WITH "recent" AS (SELECT 1) SELECT * FROM "recent""#),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql(
            "WITH moved AS (DELETE FROM a RETURNING *) INSERT INTO b SELECT * FROM moved"
        ),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("WITH x AS (SELECT ')' AS p) UPDATE t SET v = 1"),
        QueryType::Update
    );
}

#[test]
fn test_context_from_statement() {
    let statement = Fragment::new("SELECT {#}, {#,#}", params![1, vec![2, 3]])
        .unwrap()
        .prepared_statement();
    let ctx = QueryContext::new(&statement, Some(1));
    assert_eq!(ctx.sql, "SELECT $1, $2,$3");
    assert_eq!(ctx.param_count(), 3);
    assert_eq!(ctx.query_type, QueryType::Select);
    assert_eq!(ctx.stop_after, Some(1));
}

#[test]
fn test_stats_hook() {
    let stats = StatsHook::new();
    let rows = vec![Row::new(vec!["n".into()], vec![Value::Int(1)])];
    let err = DbError::from_database_error(DatabaseError::new("42601", "syntax error"));

    stats.after_execute(
        &ctx("SELECT 1"),
        Duration::from_millis(2),
        QueryResult::Rows(&rows),
    );
    stats.after_execute(
        &ctx("INSERT INTO t VALUES (1)"),
        Duration::from_millis(7),
        QueryResult::Rows(&[]),
    );
    stats.after_execute(
        &ctx("SELEC 1"),
        Duration::from_millis(1),
        QueryResult::Error(&err),
    );

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 3);
    assert_eq!(snapshot.failed_queries, 1);
    assert_eq!(snapshot.rows_returned, 1);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.insert_count, 1);
    assert_eq!(snapshot.total_duration, Duration::from_millis(10));
    assert_eq!(snapshot.max_duration, Duration::from_millis(7));
    assert_eq!(
        snapshot.slowest_query.as_deref(),
        Some("INSERT INTO t VALUES (1)")
    );

    stats.reset();
    assert_eq!(stats.stats(), QueryStats::default());
}

#[derive(Default)]
struct CountingHook {
    before: AtomicUsize,
    after: AtomicUsize,
}

impl QueryHook for CountingHook {
    fn before_execute(&self, _ctx: &QueryContext) {
        self.before.fetch_add(1, Ordering::SeqCst);
    }

    fn after_execute(&self, _ctx: &QueryContext, _duration: Duration, _result: QueryResult<'_>) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_composite_hook_fans_out() {
    let first = Arc::new(CountingHook::default());
    let second = Arc::new(CountingHook::default());
    let composite = CompositeHook::new()
        .add_arc(first.clone())
        .add_arc(second.clone())
        .add(StatsHook::new());
    assert_eq!(composite.len(), 3);

    let ctx = ctx("SELECT 1");
    composite.before_execute(&ctx);
    composite.after_execute(&ctx, Duration::ZERO, QueryResult::Rows(&[]));

    for hook in [&first, &second] {
        assert_eq!(hook.before.load(Ordering::SeqCst), 1);
        assert_eq!(hook.after.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_query_result_display() {
    let err = DbError::invalid_clause("bad");
    assert_eq!(QueryResult::Rows(&[]).to_string(), "0 rows");
    assert_eq!(
        QueryResult::Error(&err).to_string(),
        "error: Invalid clause: bad"
    );
    assert!(QueryResult::Error(&err).is_error());
    assert_eq!(QueryResult::Error(&err).row_count(), 0);
}

#[cfg(feature = "tracing")]
#[test]
fn test_truncate_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
    assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
    // 'é' is two bytes; cutting inside it backs off to the boundary
    assert_eq!(truncate_sql_bytes("é", 1), "");
}

#[cfg(feature = "tracing")]
#[test]
fn test_tracing_hook_truncation() {
    let hook = TracingHook::new().max_sql_length(6);
    assert_eq!(hook.truncate_sql("SELECT 1"), "SELECT...");
    assert_eq!(hook.truncate_sql("SELE"), "SELE");
    assert_eq!(TracingHook::new().no_truncate().truncate_sql("SELECT 1"), "SELECT 1");

    // emitting without a subscriber is a no-op
    let ctx = ctx("SELECT 1");
    hook.before_execute(&ctx);
    hook.after_execute(&ctx, Duration::from_micros(5), QueryResult::Rows(&[]));
}
