mod common;

use async_trait::async_trait;
use common::{count_row, database, row};
use dblayer::{CacheDriver, Context, OrmError, Row, Value, args};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, PartialEq, dblayer::FromRow)]
struct User {
    id: i64,
    #[db(column = "user_name")]
    name: String,
    email: Option<String>,
}

#[tokio::test]
async fn get_maps_rows_through_derive() {
    let (db, state) = database("mysql");
    state.push_rows(vec![
        row(&[
            ("id", Value::Int(1)),
            ("user_name", Value::from("alice")),
            ("email", Value::Null),
        ]),
        row(&[
            ("id", Value::Int(2)),
            ("user_name", Value::from("bob")),
            ("email", Value::from("bob@example.com")),
        ]),
    ]);

    let users: Vec<User> = db
        .table("users")
        .where_("active = ?", args![true])
        .get()
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "alice");
    assert_eq!(users[0].email, None);
    assert_eq!(users[1].email.as_deref(), Some("bob@example.com"));
    assert_eq!(state.last().sql, "SELECT * FROM users WHERE active = ?");
    assert_eq!(state.last().args, args![true]);
}

#[tokio::test]
async fn first_with_no_match_is_none() {
    let (db, state) = database("mysql");
    let found: Option<Row> = db.table("users").where_id(99).first().await.unwrap();
    assert!(found.is_none());
    assert_eq!(state.last().sql, "SELECT * FROM users WHERE id = ? LIMIT 1");
}

#[tokio::test]
async fn postgres_statements_are_rebound() {
    let (db, state) = database("postgres");
    let _: Option<Row> = db
        .table("users")
        .where_("status = ?", args!["active"])
        .where_in("role", args!["admin", "editor"])
        .find(7)
        .await
        .unwrap();
    assert_eq!(
        state.last().sql,
        "SELECT * FROM users WHERE status = $1 AND role IN ($2, $3) AND id = $4 LIMIT 1"
    );
    assert_eq!(state.last().args, args!["active", "admin", "editor", 7]);
}

#[tokio::test]
async fn pluck_and_exists() {
    let (db, state) = database("sqlite");
    state.push_rows(vec![
        row(&[("email", Value::from("a@x.io"))]),
        row(&[("email", Value::from("b@x.io"))]),
    ]);
    let emails: Vec<String> = db.table("users").pluck("email").await.unwrap();
    assert_eq!(emails, vec!["a@x.io", "b@x.io"]);
    assert_eq!(state.last().sql, "SELECT email FROM users");

    state.push_rows(count_row(0));
    assert!(!db.table("users").where_id(1).exists().await.unwrap());
    assert_eq!(state.last().sql, "SELECT COUNT(*) FROM users WHERE id = ?");
}

#[tokio::test]
async fn aggregates_cast_and_return_none_on_null() {
    let (db, state) = database("postgres");
    state.push_rows(vec![row(&[("sum", Value::Float(42.5))])]);
    let total = db.table("orders").sum("amount").await.unwrap();
    assert_eq!(total, Some(42.5));
    assert_eq!(
        state.last().sql,
        "SELECT CAST(SUM(amount) AS DOUBLE PRECISION) FROM orders"
    );

    state.push_rows(vec![row(&[("max", Value::Null)])]);
    assert_eq!(db.table("orders").max("amount").await.unwrap(), None);
}

// ==================== pagination ====================

#[tokio::test]
async fn paginate_counts_then_fetches_the_page() {
    let (db, state) = database("mysql");
    state.push_rows(count_row(23));
    state.push_rows(vec![
        row(&[("id", Value::Int(21))]),
        row(&[("id", Value::Int(22))]),
        row(&[("id", Value::Int(23))]),
    ]);

    let page = db
        .table("users")
        .where_("active = ?", args![true])
        .latest("id")
        .paginate::<Row>(3, 10)
        .await
        .unwrap();

    assert_eq!(page.total, 23);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.current_page, 3);
    assert_eq!(page.data.len(), 3);
    assert!(!page.has_more_pages());

    let calls = state.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].sql, "SELECT COUNT(*) FROM users WHERE active = ?");
    assert_eq!(
        calls[1].sql,
        "SELECT * FROM users WHERE active = ? ORDER BY id DESC LIMIT 10 OFFSET 20"
    );
}

#[tokio::test]
async fn paginate_past_last_page_skips_the_data_query() {
    let (db, state) = database("mysql");
    state.push_rows(count_row(5));
    let page = db.table("users").paginate::<Row>(4, 10).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.last_page, 1);
    assert_eq!(state.calls().len(), 1);
}

#[tokio::test]
async fn paginate_clamps_page_and_size() {
    let (db, state) = database("mysql");
    state.push_rows(count_row(3));
    let page = db.table("users").paginate::<Row>(0, 0).await.unwrap();
    assert_eq!(page.current_page, 1);
    assert_eq!(page.per_page, 1);
    assert_eq!(page.last_page, 3);
    assert_eq!(state.last().sql, "SELECT * FROM users LIMIT 1 OFFSET 0");
}

#[tokio::test]
async fn paginate_empty_table() {
    let (db, state) = database("mysql");
    state.push_rows(count_row(0));
    let page = db.table("users").paginate::<Row>(1, 15).await.unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.last_page, 0);
    assert!(page.data.is_empty());
    assert_eq!(state.calls().len(), 1);
}

#[tokio::test]
async fn paginate_over_a_union_limits_the_combined_rows() {
    let (db, state) = database("postgres");
    state.push_rows(count_row(14));
    let active = db.table("users").select(&["id"]).where_("active = ?", args![true]);
    let archived = db.table("archived_users").select(&["id"]);
    let page = active
        .union_all(archived)
        .oldest("id")
        .paginate::<Row>(2, 5)
        .await
        .unwrap();
    assert_eq!(page.last_page, 3);

    let calls = state.calls();
    assert_eq!(
        calls[0].sql,
        "SELECT COUNT(*) FROM ((SELECT id FROM users WHERE active = $1) UNION ALL (SELECT id FROM archived_users)) AS sub"
    );
    assert_eq!(
        calls[1].sql,
        "(SELECT id FROM users WHERE active = $1) UNION ALL (SELECT id FROM archived_users) \
         ORDER BY id ASC LIMIT 5 OFFSET 5"
    );
}

// ==================== cache ====================

#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<Row>>>,
}

#[async_trait]
impl CacheDriver for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<Row>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, rows: Vec<Row>, _ttl: Duration) {
        self.entries.lock().unwrap().insert(key.to_string(), rows);
    }

    async fn forget(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[tokio::test]
async fn remembered_reads_hit_the_cache() {
    let (db, state) = database("mysql");
    db.set_cache(Arc::new(MemoryCache::default()));
    state.push_rows(vec![row(&[("id", Value::Int(1))])]);

    let query = db
        .table("users")
        .where_id(1)
        .remember(Duration::from_secs(60));
    let first: Vec<Row> = query.get().await.unwrap();
    let second: Vec<Row> = query.get().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(state.calls().len(), 1);

    // Different arguments, different key.
    let _: Vec<Row> = db
        .table("users")
        .where_id(2)
        .remember(Duration::from_secs(60))
        .get()
        .await
        .unwrap();
    assert_eq!(state.calls().len(), 2);
}

#[tokio::test]
async fn reads_without_remember_or_driver_always_execute() {
    let (db, state) = database("mysql");
    let query = db.table("users").remember(Duration::from_secs(60));
    let _: Vec<Row> = query.get().await.unwrap();
    let _: Vec<Row> = query.get().await.unwrap();
    assert_eq!(state.calls().len(), 2);

    db.set_cache(Arc::new(MemoryCache::default()));
    let plain = db.table("users");
    let _: Vec<Row> = plain.get().await.unwrap();
    let _: Vec<Row> = plain.get().await.unwrap();
    assert_eq!(state.calls().len(), 4);

    db.clear_cache();
    let _: Vec<Row> = query.get().await.unwrap();
    assert_eq!(state.calls().len(), 5);
}

// ==================== context ====================

#[tokio::test]
async fn deadline_surfaces_as_timeout() {
    let (db, state) = database("mysql");
    state.set_delay(Duration::from_millis(500));
    let ctx = Context::with_timeout(Duration::from_millis(20));
    let err = db.table("users").get_ctx::<Row>(&ctx).await.unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn cancellation_surfaces_as_cancelled() {
    let (db, state) = database("mysql");
    state.set_delay(Duration::from_millis(500));
    let (ctx, canceller) = Context::with_cancel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });
    let err = db.table("users").count_ctx(&ctx).await.unwrap_err();
    assert!(matches!(err, OrmError::Cancelled), "{err:?}");
}

#[tokio::test]
async fn expired_context_fails_before_dispatch() {
    let (db, state) = database("mysql");
    let (ctx, canceller) = Context::with_cancel();
    canceller.cancel();
    let err = db.table("users").get_ctx::<Row>(&ctx).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(state.calls().is_empty());
}

#[tokio::test]
async fn detached_builder_errors_are_returned_before_dispatch() {
    let (db, state) = database("mysql");
    let err = db
        .table("users")
        .order_by("id", "sideways")
        .get::<Row>()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)), "{err:?}");
    assert!(state.calls().is_empty());
}
