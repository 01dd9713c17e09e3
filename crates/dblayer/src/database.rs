//! The shared database handle.

use crate::builder::QueryBuilder;
use crate::cache::CacheDriver;
use crate::context::Context;
use crate::dialect::{Dialect, Driver, for_driver};
use crate::error::OrmResult;
use crate::executor::{Conn, Pool, Target};
use crate::raw::Raw;
use crate::schema::{DropTables, Schema, TruncateTables, table_ops};
use crate::transaction::Transaction;
use crate::value::Value;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

/// Entry point: a connection pool, the dialect selected for it and an optional cache.
///
/// Cloning is cheap; clones share the pool and cache.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    pool: Arc<dyn Pool>,
    driver: Driver,
    dialect: Arc<dyn Dialect>,
    cache: RwLock<Option<Arc<dyn CacheDriver>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.inner.driver)
            .field("cache", &self.cache().is_some())
            .finish()
    }
}

impl Database {
    /// Wrap a pool, selecting the dialect from its driver tag.
    pub fn new(pool: Arc<dyn Pool>) -> OrmResult<Self> {
        let driver: Driver = pool.driver().parse()?;
        let dialect = for_driver(driver.as_str())?;
        Ok(Self {
            inner: Arc::new(Inner {
                pool,
                driver,
                dialect,
                cache: RwLock::new(None),
            }),
        })
    }

    /// Wrap an existing `deadpool-postgres` pool.
    #[cfg(feature = "pool")]
    pub fn from_deadpool(pool: deadpool_postgres::Pool) -> OrmResult<Self> {
        Self::new(Arc::new(crate::pg::PgPool::new(pool)))
    }

    /// Create a PostgreSQL pool from a URL and check that it answers.
    #[cfg(feature = "pool")]
    pub async fn connect(database_url: &str) -> OrmResult<Self> {
        let db = Self::from_deadpool(crate::pool::create_pool(database_url)?)?;
        db.ping().await?;
        Ok(db)
    }

    pub fn driver(&self) -> Driver {
        self.inner.driver
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.inner.dialect
    }

    pub(crate) fn pool(&self) -> &dyn Pool {
        self.inner.pool.as_ref()
    }

    /// Execution context bound to the pool.
    pub fn conn(&self) -> Conn<'_> {
        Conn::new(Target::Pool(self), self.inner.dialect.clone())
    }

    pub fn table(&self, name: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self.conn(), name)
    }

    pub fn raw(&self, sql: impl Into<String>, args: Vec<Value>) -> Raw<'_> {
        Raw::new(self.conn(), sql, args)
    }

    pub async fn ping(&self) -> OrmResult<()> {
        self.ping_ctx(&Context::background()).await
    }

    pub async fn ping_ctx(&self, ctx: &Context) -> OrmResult<()> {
        ctx.run(self.inner.pool.ping()).await
    }

    // ==================== cache ====================

    pub fn set_cache(&self, driver: Arc<dyn CacheDriver>) {
        let mut slot = self.inner.cache.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(driver);
    }

    pub fn clear_cache(&self) {
        let mut slot = self.inner.cache.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub(crate) fn cache(&self) -> Option<Arc<dyn CacheDriver>> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // ==================== transactions ====================

    pub async fn begin(&self) -> OrmResult<Transaction> {
        self.begin_ctx(&Context::background()).await
    }

    pub async fn begin_ctx(&self, ctx: &Context) -> OrmResult<Transaction> {
        let session = ctx.run(self.inner.pool.begin()).await?;
        Ok(Transaction::new(session, self.inner.dialect.clone()))
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`. Rolls back and returns the error when it returns `Err`.
    /// If `f` panics, the transaction is rolled back and the panic resumes.
    ///
    /// ```ignore
    /// let id = db
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             let id = tx.table("orders").create(&order).await?;
    ///             tx.table("stock").where_("sku = ?", args![sku]).decrement("qty", 1).await?;
    ///             Ok(id)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<T, F>(&self, f: F) -> OrmResult<T>
    where
        F: for<'t> FnOnce(&'t Transaction) -> BoxFuture<'t, OrmResult<T>>,
    {
        self.transaction_ctx(&Context::background(), f).await
    }

    pub async fn transaction_ctx<T, F>(&self, ctx: &Context, f: F) -> OrmResult<T>
    where
        F: for<'t> FnOnce(&'t Transaction) -> BoxFuture<'t, OrmResult<T>>,
    {
        let tx = self.begin_ctx(ctx).await?;
        let outcome = AssertUnwindSafe(ctx.run(f(&tx))).catch_unwind().await;
        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await?;
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "dblayer.sql", error = %rollback_err, "rollback failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = rollback_err;
                }
                Err(err)
            }
            Err(panic) => {
                let _ = tx.rollback().await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    // ==================== schema ====================

    /// Create a table from the definition built by `f`.
    pub async fn create_table<F>(&self, name: impl Into<String>, f: F) -> OrmResult<()>
    where
        F: FnOnce(&mut Schema),
    {
        self.create_table_ctx(&Context::background(), name, f).await
    }

    pub async fn create_table_ctx<F>(&self, ctx: &Context, name: impl Into<String>, f: F) -> OrmResult<()>
    where
        F: FnOnce(&mut Schema),
    {
        let mut schema = Schema::create(name);
        f(&mut schema);
        self.apply_schema(ctx, &schema).await
    }

    /// Alter a table with the commands recorded by `f`.
    pub async fn update_table<F>(&self, name: impl Into<String>, f: F) -> OrmResult<()>
    where
        F: FnOnce(&mut Schema),
    {
        self.update_table_ctx(&Context::background(), name, f).await
    }

    pub async fn update_table_ctx<F>(&self, ctx: &Context, name: impl Into<String>, f: F) -> OrmResult<()>
    where
        F: FnOnce(&mut Schema),
    {
        let mut schema = Schema::alter(name);
        f(&mut schema);
        self.apply_schema(ctx, &schema).await
    }

    async fn apply_schema(&self, ctx: &Context, schema: &Schema) -> OrmResult<()> {
        let statements = schema.to_statements(self.inner.dialect.as_ref())?;
        table_ops::run_statements(&self.conn(), ctx, &statements).await
    }

    pub fn drop_tables<S: Into<String>>(&self, tables: impl IntoIterator<Item = S>) -> DropTables<'_> {
        DropTables::new(self.conn(), tables.into_iter().map(Into::into).collect())
    }

    pub fn truncate<S: Into<String>>(&self, tables: impl IntoIterator<Item = S>) -> TruncateTables<'_> {
        TruncateTables::new(self.conn(), tables.into_iter().map(Into::into).collect())
    }
}
