//! PostgreSQL backend on `tokio-postgres` + `deadpool-postgres`.
//!
//! [`PgPool`] runs pooled statements; [`Pool::begin`] checks out a dedicated connection and
//! returns a [`PgSession`] that owns it until commit or rollback.

mod types;

use crate::error::{OrmError, OrmResult};
use crate::executor::{ExecResult, Executor, Pool, Session};
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool as DeadPool};
use tokio_postgres::types::ToSql;

use types::decode_row;

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

async fn query_on(client: &Object, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
    let rows = client.query(sql, &params(args)).await?;
    rows.iter().map(decode_row).collect()
}

async fn execute_on(client: &Object, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
    let rows_affected = client.execute(sql, &params(args)).await?;
    Ok(ExecResult {
        rows_affected,
        last_insert_id: None,
    })
}

/// Pooled PostgreSQL executor.
#[derive(Clone)]
pub struct PgPool {
    pool: DeadPool,
}

impl std::fmt::Debug for PgPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("PgPool")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl PgPool {
    pub fn new(pool: DeadPool) -> Self {
        Self { pool }
    }

    /// The underlying deadpool handle.
    pub fn inner(&self) -> &DeadPool {
        &self.pool
    }
}

#[async_trait]
impl Executor for PgPool {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let client = self.pool.get().await?;
        query_on(&client, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let client = self.pool.get().await?;
        execute_on(&client, sql, args).await
    }
}

#[async_trait]
impl Pool for PgPool {
    fn driver(&self) -> &str {
        "postgres"
    }

    async fn ping(&self) -> OrmResult<()> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn begin(&self) -> OrmResult<Box<dyn Session>> {
        let client = self.pool.get().await?;
        client.batch_execute("BEGIN").await?;
        Ok(Box::new(PgSession {
            client: Some(client),
        }))
    }
}

/// One open transaction holding a pooled connection.
///
/// The connection goes back to the pool after COMMIT or ROLLBACK. A session dropped while still
/// open detaches its connection from the pool instead, so the server discards the transaction
/// when the connection closes.
pub struct PgSession {
    client: Option<Object>,
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl PgSession {
    fn client(&self) -> OrmResult<&Object> {
        self.client
            .as_ref()
            .ok_or_else(|| OrmError::Connection("transaction already finished".to_string()))
    }

    async fn finish(&mut self, statement: &str) -> OrmResult<()> {
        let client = self
            .client
            .take()
            .ok_or_else(|| OrmError::Connection("transaction already finished".to_string()))?;
        match client.batch_execute(statement).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Connection state is unknown; keep it out of the pool.
                let _ = Object::take(client);
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl Executor for PgSession {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        query_on(self.client()?, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        execute_on(self.client()?, sql, args).await
    }
}

#[async_trait]
impl Session for PgSession {
    async fn commit(&mut self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "dblayer.sql", "detaching connection of unfinished transaction");
            drop(Object::take(client));
        }
    }
}
