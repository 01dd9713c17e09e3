//! Hand-written statements that still go through the execution context.

use crate::context::Context;
use crate::error::OrmResult;
use crate::executor::{Conn, ExecResult};
use crate::row::FromRow;
use crate::value::Value;

/// A raw SQL statement with `?` placeholders.
///
/// Placeholders are rebound for the active dialect like any built statement.
#[derive(Debug, Clone)]
#[must_use = "raw statements do nothing until executed"]
pub struct Raw<'a> {
    conn: Conn<'a>,
    sql: String,
    args: Vec<Value>,
}

impl<'a> Raw<'a> {
    pub(crate) fn new(conn: Conn<'a>, sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            conn,
            sql: sql.into(),
            args,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub async fn fetch_all<T: FromRow>(&self) -> OrmResult<Vec<T>> {
        self.fetch_all_ctx(&Context::background()).await
    }

    pub async fn fetch_all_ctx<T: FromRow>(&self, ctx: &Context) -> OrmResult<Vec<T>> {
        let rows = self.conn.select_ctx(ctx, &self.sql, &self.args).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// First row, if any.
    pub async fn get<T: FromRow>(&self) -> OrmResult<Option<T>> {
        self.get_ctx(&Context::background()).await
    }

    pub async fn get_ctx<T: FromRow>(&self, ctx: &Context) -> OrmResult<Option<T>> {
        match self.conn.get_ctx(ctx, &self.sql, &self.args).await? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn exec(&self) -> OrmResult<ExecResult> {
        self.exec_ctx(&Context::background()).await
    }

    pub async fn exec_ctx(&self, ctx: &Context) -> OrmResult<ExecResult> {
        self.conn.exec_ctx(ctx, &self.sql, &self.args).await
    }
}
