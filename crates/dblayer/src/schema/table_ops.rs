//! DROP TABLE and TRUNCATE builders.

use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::executor::Conn;

/// Run DDL statements one after another, stopping at the first failure.
pub(crate) async fn run_statements(conn: &Conn<'_>, ctx: &Context, statements: &[String]) -> OrmResult<()> {
    for sql in statements {
        conn.exec_ctx(ctx, sql, &[]).await?;
    }
    Ok(())
}

fn require_tables(op: &str, tables: &[String]) -> OrmResult<()> {
    if tables.is_empty() {
        return Err(OrmError::validation(format!("{op}: no tables given")));
    }
    Ok(())
}

/// `DROP TABLE` for one or more tables.
#[derive(Debug)]
#[must_use = "call .execute() to run the statement"]
pub struct DropTables<'a> {
    conn: Conn<'a>,
    tables: Vec<String>,
    if_exists: bool,
    cascade: bool,
}

impl<'a> DropTables<'a> {
    pub(crate) fn new(conn: Conn<'a>, tables: Vec<String>) -> Self {
        Self {
            conn,
            tables,
            if_exists: false,
            cascade: false,
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Also drop dependent objects. Ignored by backends without CASCADE.
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn to_statements(&self) -> Vec<String> {
        self.conn
            .dialect()
            .build_drop_tables(&self.tables, self.if_exists, self.cascade)
    }

    pub async fn execute(self) -> OrmResult<()> {
        self.execute_ctx(&Context::background()).await
    }

    pub async fn execute_ctx(self, ctx: &Context) -> OrmResult<()> {
        require_tables("drop tables", &self.tables)?;
        run_statements(&self.conn, ctx, &self.to_statements()).await
    }
}

/// Remove every row from one or more tables.
#[derive(Debug)]
#[must_use = "call .execute() to run the statement"]
pub struct TruncateTables<'a> {
    conn: Conn<'a>,
    tables: Vec<String>,
    restart_identity: bool,
    cascade: bool,
}

impl<'a> TruncateTables<'a> {
    pub(crate) fn new(conn: Conn<'a>, tables: Vec<String>) -> Self {
        Self {
            conn,
            tables,
            restart_identity: false,
            cascade: false,
        }
    }

    /// Reset identity sequences.
    pub fn restart_identity(mut self) -> Self {
        self.restart_identity = true;
        self
    }

    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn to_statements(&self) -> Vec<String> {
        self.conn
            .dialect()
            .build_truncate(&self.tables, self.restart_identity, self.cascade)
    }

    pub async fn execute(self) -> OrmResult<()> {
        self.execute_ctx(&Context::background()).await
    }

    pub async fn execute_ctx(self, ctx: &Context) -> OrmResult<()> {
        require_tables("truncate", &self.tables)?;
        run_statements(&self.conn, ctx, &self.to_statements()).await
    }
}
