//! Transaction scope.
//!
//! A [`Transaction`] owns one backend session for its lifetime. Builders created from it
//! run only on that session; they never fall back to the pool.
//!
//! ```ignore
//! let tx = db.begin().await?;
//! tx.table("accounts").where_("id = ?", args![1]).decrement("balance", 100).await?;
//! tx.table("accounts").where_("id = ?", args![2]).increment("balance", 100).await?;
//! tx.commit().await?;
//! ```
//!
//! Prefer [`Database::transaction`](crate::Database::transaction), which commits on `Ok`,
//! rolls back on `Err` and rolls back before re-raising a panic.

use crate::builder::QueryBuilder;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::executor::{Conn, Session, Target};
use crate::raw::Raw;
use crate::value::Value;
use std::sync::Arc;

/// An open transaction.
///
/// Dropping it without [`commit`](Transaction::commit) or [`rollback`](Transaction::rollback)
/// discards its work and logs a warning.
pub struct Transaction {
    session: Option<Box<dyn Session>>,
    dialect: Arc<dyn Dialect>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("dialect", &self.dialect.name())
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl Transaction {
    pub(crate) fn new(session: Box<dyn Session>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            session: Some(session),
            dialect,
        }
    }

    pub(crate) fn session(&self) -> OrmResult<&dyn Session> {
        self.session
            .as_deref()
            .ok_or_else(|| OrmError::NoExecutor("transaction already finished".to_string()))
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Execution context bound to this transaction's session.
    pub fn conn(&self) -> Conn<'_> {
        Conn::new(Target::Transaction(self), self.dialect.clone())
    }

    /// Query builder whose statements run inside this transaction.
    pub fn table(&self, name: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self.conn(), name)
    }

    pub fn raw(&self, sql: impl Into<String>, args: Vec<Value>) -> Raw<'_> {
        Raw::new(self.conn(), sql, args)
    }

    pub async fn commit(mut self) -> OrmResult<()> {
        match self.session.take() {
            Some(mut session) => session.commit().await,
            None => Err(OrmError::NoExecutor("transaction already finished".to_string())),
        }
    }

    pub async fn rollback(mut self) -> OrmResult<()> {
        match self.session.take() {
            Some(mut session) => session.rollback().await,
            None => Err(OrmError::NoExecutor("transaction already finished".to_string())),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "dblayer.sql",
                dialect = self.dialect.name(),
                "transaction dropped without commit or rollback; discarding"
            );
        }
    }
}
