mod common;

use common::database;
use dblayer::{OrmError, Row, args};
use futures_util::FutureExt;

#[tokio::test]
async fn committed_writes_become_visible() {
    let (db, state) = database("mysql");
    let tx = db.begin().await.unwrap();
    tx.table("accounts").where_id(1).decrement("balance", 10).await.unwrap();
    tx.table("accounts").where_id(2).increment("balance", 10).await.unwrap();
    assert!(state.visible().is_empty());

    tx.commit().await.unwrap();
    assert_eq!(state.visible().len(), 2);
    assert_eq!(*state.commits.lock().unwrap(), 1);
    assert!(state.calls().iter().all(|c| c.in_transaction));
}

#[tokio::test]
async fn rolled_back_writes_stay_invisible() {
    let (db, state) = database("mysql");
    let tx = db.begin().await.unwrap();
    tx.table("users")
        .create_map(&dblayer::map! { "name" => "ghost" })
        .await
        .ok();
    tx.rollback().await.unwrap();

    assert!(state.visible().is_empty());
    assert_eq!(*state.rollbacks.lock().unwrap(), 1);
}

#[tokio::test]
async fn dropped_transaction_discards_its_work() {
    let (db, state) = database("mysql");
    {
        let tx = db.begin().await.unwrap();
        tx.raw("DELETE FROM sessions WHERE id = ?", args![1])
            .exec()
            .await
            .unwrap();
    }
    assert!(state.visible().is_empty());
    assert_eq!(*state.discarded.lock().unwrap(), 1);
    assert_eq!(*state.commits.lock().unwrap(), 0);
}

#[tokio::test]
async fn closure_commits_on_ok() {
    let (db, state) = database("postgres");
    let out = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.table("jobs")
                    .where_("state = ?", args!["queued"])
                    .update_map(&dblayer::map! { "state" => "running" })
                    .await
            })
        })
        .await
        .unwrap();
    assert_eq!(out, 1);
    assert_eq!(
        state.visible(),
        vec!["UPDATE jobs SET state = $1 WHERE state = $2".to_string()]
    );
    assert_eq!(*state.commits.lock().unwrap(), 1);
}

#[tokio::test]
async fn closure_rolls_back_and_returns_the_original_error() {
    let (db, state) = database("mysql");
    let err = db
        .transaction(|tx| {
            Box::pin(async move {
                tx.table("orders").where_id(1).delete().await?;
                tx.table("orders").delete().await?;
                Ok::<(), OrmError>(())
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OrmError::Validation(_)), "{err:?}");
    assert!(state.visible().is_empty());
    assert_eq!(*state.rollbacks.lock().unwrap(), 1);
    assert_eq!(*state.commits.lock().unwrap(), 0);
}

#[tokio::test]
async fn closure_rolls_back_before_resuming_a_panic() {
    let (db, state) = database("mysql");
    let result = std::panic::AssertUnwindSafe(db.transaction::<(), _>(|tx| {
        Box::pin(async move {
            tx.table("orders").where_id(1).delete().await?;
            if true {
                panic!("boom");
            }
            Ok::<(), OrmError>(())
        })
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert!(state.visible().is_empty());
    assert_eq!(*state.rollbacks.lock().unwrap(), 1);
}

#[tokio::test]
async fn with_transaction_routes_a_pool_builder_into_the_session() {
    let (db, state) = database("mysql");
    let tx = db.begin().await.unwrap();

    let base = db.table("users").where_("active = ?", args![true]);
    let _: Vec<Row> = base.clone().with_transaction(&tx).get().await.unwrap();
    let _: Vec<Row> = base.get().await.unwrap();
    tx.commit().await.unwrap();

    let calls = state.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].in_transaction);
    assert!(!calls[1].in_transaction);
    assert_eq!(calls[0].sql, calls[1].sql);
}

#[tokio::test]
async fn transaction_builders_report_their_binding() {
    let (db, _state) = database("sqlite");
    let tx = db.begin().await.unwrap();
    assert!(tx.table("users").conn().is_transaction());
    assert!(!db.table("users").conn().is_transaction());
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn schema_changes_run_in_order() {
    let (db, state) = database("postgres");
    db.create_table("posts", |t| {
        t.id();
        t.string("slug", 120);
        t.index("posts_slug_idx", ["slug"]);
    })
    .await
    .unwrap();
    db.drop_tables(["posts"]).if_exists().execute().await.unwrap();

    assert_eq!(
        state.visible(),
        vec![
            "CREATE TABLE posts (id BIGSERIAL NOT NULL PRIMARY KEY, slug VARCHAR(120) NOT NULL)"
                .to_string(),
            "CREATE INDEX posts_slug_idx ON posts (slug)".to_string(),
            "DROP TABLE IF EXISTS posts".to_string(),
        ]
    );
}
