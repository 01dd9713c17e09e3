//! # dblayer
//!
//! A fluent, dialect-aware SQL query builder for MySQL, PostgreSQL and SQLite.
//!
//! ## Features
//!
//! - **One builder, three dialects**: statements are written once with `?` placeholders and
//!   rebound for the backend right before dispatch
//! - **Positional safety**: arguments always follow placeholder order, including nested groups,
//!   sub-queries and unions
//! - **Transactions as values**: a [`Transaction`] is passed wherever a builder needs to run
//!   inside it; dropping it unfinished discards its work
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET, batch records must share keys
//! - **Schema builder**: `CREATE TABLE` and `ALTER TABLE` rendered per dialect
//! - **Cancellation**: every terminal has a `*_ctx` variant that honours a [`Context`]
//!
//! ## Query builder
//!
//! ```ignore
//! use dblayer::{Database, map};
//!
//! let db = Database::connect(&url).await?;
//!
//! // SELECT
//! let users: Vec<User> = db
//!     .table("users")
//!     .where_("status = ?", vec!["active".into()])
//!     .order_by("created_at", "DESC")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // INSERT
//! let id = db
//!     .table("users")
//!     .create_map(&map! { "username" => "alice", "email" => "alice@example.com" })
//!     .await?;
//!
//! // UPDATE / DELETE
//! db.table("users").where_id(id).update_map(&map! { "status" => "inactive" }).await?;
//! db.table("users").where_id(id).delete().await?;
//! ```
//!
//! ## Transactions
//!
//! ```ignore
//! db.transaction(|tx| Box::pin(async move {
//!     tx.table("accounts").where_id(1).decrement("balance", 10).await?;
//!     tx.table("accounts").where_id(2).increment("balance", 10).await?;
//!     Ok(())
//! }))
//! .await?;
//! ```

pub mod builder;
pub mod cache;
pub mod context;
pub mod database;
pub mod dialect;
pub mod error;
pub mod executor;
mod monitor;
pub mod named;
pub mod pagination;
pub mod predicate;
pub mod raw;
pub mod record;
pub mod row;
pub mod schema;
pub mod transaction;
pub mod value;

#[cfg(feature = "pool")]
pub mod pg;
#[cfg(feature = "pool")]
pub mod pool;

pub use builder::{Join, JoinKind, QueryBuilder};
pub use cache::CacheDriver;
pub use context::{Canceller, Context};
pub use database::Database;
pub use dialect::{DateField, DatePart, Dialect, Driver};
pub use error::{OrmError, OrmResult};
pub use executor::{Conn, ExecResult, Executor, Pool, Session};
pub use named::compile_named;
pub use pagination::Pagination;
pub use predicate::{Connector, Predicate, PredicateTree};
pub use raw::Raw;
pub use record::{Map, Record};
pub use row::{FromRow, Row};
pub use schema::{ColumnType, ForeignKeyAction, Schema};
pub use transaction::Transaction;
pub use value::{FromValue, Value};

pub use rust_decimal::Decimal;

#[cfg(feature = "pool")]
pub use pg::{PgPool, PgSession};
#[cfg(feature = "pool")]
pub use pool::{
    create_pool, create_pool_with_config, create_pool_with_manager_config, create_pool_with_tls,
};

#[cfg(feature = "derive")]
pub use dblayer_derive::{FromRow, Record};
