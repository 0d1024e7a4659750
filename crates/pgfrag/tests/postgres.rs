use pgfrag::{
    AdapterConfig, DbError, DbResult, Fragment, Item, PgAdapter, StatsHook, Value, delete_from,
    insert_into, items, params, select, update,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

async fn connect(test: &str) -> DbResult<Option<PgAdapter>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };
    let config = AdapterConfig::from_url(&database_url)?.timezone("UTC");
    Ok(Some(PgAdapter::connect(config).await?))
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{nanos}", std::process::id())
}

#[tokio::test]
async fn columns_cast_to_native_values() -> DbResult<()> {
    let Some(adapter) = connect("columns_cast_to_native_values").await? else {
        return Ok(());
    };

    let row = pgfrag::Db::new()
        .raw(Fragment::new(
            r#"SELECT {#}::bool AS "b", {#}::int4 AS "i", {#}::float8 AS "f", {#}::jsonb AS "j", NULL::text AS "n""#,
            params![true, 42, 1.5, serde_json::json!({"a": [1, 2]})],
        )?)?
        .as_row(&adapter)
        .await?
        .expect("one row");

    assert_eq!(row.get("b"), Some(&Value::Bool(true)));
    assert_eq!(row.get("i"), Some(&Value::Int(42)));
    assert_eq!(row.get("f"), Some(&Value::Float(1.5)));
    assert_eq!(
        row.get("j"),
        Some(&Value::Json(serde_json::json!({"a": [1, 2]})))
    );
    assert_eq!(row.get("n"), Some(&Value::Null));
    Ok(())
}

#[tokio::test]
async fn duplicate_table_maps_to_typed_error() -> DbResult<()> {
    let Some(adapter) = connect("duplicate_table_maps_to_typed_error").await? else {
        return Ok(());
    };
    let table = unique_table("pgfrag_dup");
    let create = Fragment::raw(format!(r#"CREATE TEMP TABLE "{table}" (id int)"#))?;

    pgfrag::Db::new().raw(create.clone())?.commit(&adapter, None).await?;
    let err = pgfrag::Db::new()
        .raw(create)?
        .commit(&adapter, None)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::DuplicateTable(_)), "{err:?}");
    assert_eq!(err.code(), Some("42P07"));
    Ok(())
}

#[tokio::test]
async fn insert_update_select_delete_roundtrip() -> DbResult<()> {
    let Some(adapter) = connect("insert_update_select_delete_roundtrip").await? else {
        return Ok(());
    };
    let stats = Arc::new(StatsHook::new());
    let adapter = adapter.with_hook_arc(stats.clone());
    let table = unique_table("pgfrag_users");

    pgfrag::Db::new()
        .raw(Fragment::raw(format!(
            r#"CREATE TEMP TABLE "{table}" (id serial PRIMARY KEY, name text UNIQUE, tags text[], active bool NOT NULL DEFAULT true)"#
        ))?)?
        .commit(&adapter, None)
        .await?;

    let inserted = insert_into(&table, ["name", "tags"])?
        .values(params!["ada", vec!["math", "engines"]])?
        .values(params!["grace", None::<String>])?
        .returning(["id"])?
        .as_table(&adapter)
        .await?;
    assert_eq!(inserted.len(), 2);

    let upserted = insert_into(&table, ["name"])?
        .values(params!["ada"])?
        .on_conflict(["name"])?
        .do_update_set(["active = FALSE"])?
        .returning(["id", "active"])?
        .as_row(&adapter)
        .await?
        .expect("upserted row");
    assert_eq!(upserted.get("active"), Some(&Value::Bool(false)));

    update(&table)?
        .set(items! { "tags" => vec!["compilers"] })?
        .where_(items! { "name" => "grace" })?
        .commit(&adapter, None)
        .await?;

    let tags = select(["tags"])?
        .from([table.as_str()])?
        .where_(items! { "name" => "grace" })?
        .as_value(&adapter)
        .await?;
    assert_eq!(tags, Some(Value::Array(vec![Value::from("compilers")])));

    let names = select(["name"])?
        .from([table.as_str()])?
        .where_([Item::any(items! { "name" => "ada", "active" => true })])?
        .order_by(items! { "name" => "ASC" })?
        .as_table(&adapter)
        .await?;
    let names: Vec<_> = names.iter().map(|r| r.get_as::<String>("name")).collect::<DbResult<_>>()?;
    assert_eq!(names, vec!["ada", "grace"]);

    let missing = select(["id"])?
        .from([table.as_str()])?
        .where_(items! { "id" => Vec::<i64>::new() })?
        .as_row(&adapter)
        .await?;
    assert!(missing.is_none());

    let deleted = delete_from(&table)?
        .where_(items! { "name" => vec!["ada", "grace"] })?
        .returning(["name"])?
        .as_table(&adapter)
        .await?;
    assert_eq!(deleted.len(), 2);

    let snapshot = stats.stats();
    assert_eq!(snapshot.failed_queries, 0);
    assert_eq!(snapshot.insert_count, 2);
    assert_eq!(snapshot.delete_count, 1);
    Ok(())
}

#[tokio::test]
async fn literal_rendering_matches_bound_execution() -> DbResult<()> {
    let Some(adapter) = connect("literal_rendering_matches_bound_execution").await? else {
        return Ok(());
    };
    let db = select(items! { "quoted" => r"it's a \ test" })?;

    let literal = db.to_literal_sql(&adapter)?;
    assert_eq!(literal, r#"SELECT E'it''s a \\ test' AS "quoted""#);

    let bound = db.as_value(&adapter).await?;
    let inlined = pgfrag::Db::new()
        .raw(Fragment::raw(literal)?)?
        .as_value(&adapter)
        .await?;
    assert_eq!(bound, inlined);
    Ok(())
}

#[tokio::test]
async fn numeric_and_timestamp_text_bind_natively() -> DbResult<()> {
    let Some(adapter) = connect("numeric_and_timestamp_text_bind_natively").await? else {
        return Ok(());
    };

    let row = pgfrag::Db::new()
        .raw(Fragment::new(
            r#"SELECT {#}::numeric + {#} AS "total", sum(x::int8) AS "sum", {#}::timestamptz AS "at", {#}::date AS "day" FROM (VALUES (1), (2)) v(x)"#,
            params!["12.50", 1, "2024-01-01 10:00:00", "2024-01-01T23:30:00+00:00"],
        )?)?
        .as_row(&adapter)
        .await?
        .expect("one row");

    assert_eq!(row.get("total"), Some(&Value::from("13.50")));
    assert_eq!(row.get("sum"), Some(&Value::from("3")));
    assert_eq!(
        row.get("at"),
        Some(&Value::from("2024-01-01T10:00:00+00:00"))
    );
    assert_eq!(row.get("day"), Some(&Value::from("2024-01-01")));
    Ok(())
}
