//! Execution seams and the execution context.
//!
//! Backends implement [`Executor`], [`Pool`] and [`Session`]. Builders never talk to those
//! traits directly; they go through [`Conn`], which resolves whether a statement runs on the
//! pool or inside a transaction, rebinds `?` placeholders for the active dialect, applies the
//! caller's [`Context`] and logs the statement.

use crate::cache;
use crate::context::Context;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::monitor::{ExecutorKind, log_statement};
use crate::named::compile_record;
use crate::record::Record;
use crate::row::Row;
use crate::transaction::Transaction;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Backend-reported id of the last inserted row, where the backend has one.
    pub last_insert_id: Option<i64>,
}

/// Anything that can run a statement with `?`-free, already rebound SQL.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>>;

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult>;
}

/// A pooled connection provider.
#[async_trait]
pub trait Pool: Executor {
    /// Backend family tag, e.g. `"postgres"`.
    fn driver(&self) -> &str;

    async fn ping(&self) -> OrmResult<()>;

    /// Acquire a dedicated connection and open a transaction on it.
    async fn begin(&self) -> OrmResult<Box<dyn Session>>;
}

/// One open transaction on a dedicated connection.
///
/// Dropping a session that was neither committed nor rolled back must discard its work.
#[async_trait]
pub trait Session: Executor {
    async fn commit(&mut self) -> OrmResult<()>;

    async fn rollback(&mut self) -> OrmResult<()>;
}

#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
    Pool(&'a Database),
    Transaction(&'a Transaction),
    Detached,
}

impl std::fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Target::Pool(_) => "Pool",
            Target::Transaction(_) => "Transaction",
            Target::Detached => "Detached",
        })
    }
}

/// Execution context: the resolved executor plus its dialect.
#[derive(Debug, Clone)]
pub struct Conn<'a> {
    target: Target<'a>,
    dialect: Arc<dyn Dialect>,
}

impl<'a> Conn<'a> {
    pub(crate) fn new(target: Target<'a>, dialect: Arc<dyn Dialect>) -> Self {
        Self { target, dialect }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self.target, Target::Transaction(_))
    }

    fn executor(&self) -> OrmResult<(&'a dyn Executor, ExecutorKind)> {
        match self.target {
            Target::Pool(db) => Ok((db.pool() as &dyn Executor, ExecutorKind::Pool)),
            Target::Transaction(tx) => Ok((tx.session()? as &dyn Executor, ExecutorKind::Transaction)),
            Target::Detached => Err(OrmError::NoExecutor(
                "builder is bound to neither a database nor a transaction".to_string(),
            )),
        }
    }

    // ==================== select ====================

    /// Run a query and return every row.
    pub async fn select(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.select_ctx(&Context::background(), sql, args).await
    }

    pub async fn select_ctx(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let (executor, kind) = self.executor()?;
        let sql = self.dialect.rebind(sql);
        let started = Instant::now();
        let result = ctx.run(executor.query(&sql, args)).await;
        log_statement(kind, &sql, args.len(), started.elapsed(), result.is_ok());
        result
    }

    /// Run a query and return the first row, if any.
    pub async fn get(&self, sql: &str, args: &[Value]) -> OrmResult<Option<Row>> {
        self.get_ctx(&Context::background(), sql, args).await
    }

    pub async fn get_ctx(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Option<Row>> {
        Ok(self.select_ctx(ctx, sql, args).await?.into_iter().next())
    }

    /// Read-through variant of [`Conn::select_ctx`].
    ///
    /// Only pooled reads are cached; inside a transaction, or with no cache driver
    /// configured on the database, the statement always runs.
    pub(crate) async fn select_cached(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[Value],
        ttl: Option<Duration>,
    ) -> OrmResult<Vec<Row>> {
        let (Target::Pool(db), Some(ttl)) = (self.target, ttl) else {
            return self.select_ctx(ctx, sql, args).await;
        };
        let Some(driver) = db.cache() else {
            return self.select_ctx(ctx, sql, args).await;
        };

        let key = cache::cache_key(sql, args)?;
        if let Some(rows) = driver.get(&key).await {
            return Ok(rows);
        }
        let rows = self.select_ctx(ctx, sql, args).await?;
        driver.set(&key, rows.clone(), ttl).await;
        Ok(rows)
    }

    // ==================== exec ====================

    /// Run a statement that returns no rows.
    pub async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.exec_ctx(&Context::background(), sql, args).await
    }

    pub async fn exec_ctx(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let (executor, kind) = self.executor()?;
        let sql = self.dialect.rebind(sql);
        let started = Instant::now();
        let result = ctx.run(executor.execute(&sql, args)).await;
        log_statement(kind, &sql, args.len(), started.elapsed(), result.is_ok());
        result
    }

    /// Run a statement with `:name` placeholders bound from a record.
    pub async fn named_exec<R: Record + ?Sized + Sync>(&self, sql: &str, record: &R) -> OrmResult<ExecResult> {
        self.named_exec_ctx(&Context::background(), sql, record).await
    }

    pub async fn named_exec_ctx<R: Record + ?Sized + Sync>(
        &self,
        ctx: &Context,
        sql: &str,
        record: &R,
    ) -> OrmResult<ExecResult> {
        let (sql, args) = compile_record(sql, record)?;
        self.exec_ctx(ctx, &sql, &args).await
    }
}
