//! SQL statement logging.
//!
//! Every statement dispatched by [`Conn`](crate::Conn) is reported here. With the `tracing`
//! feature enabled it becomes a `debug` event on target `dblayer.sql`:
//!
//! ```text
//! DEBUG dblayer.sql: sql executed executor="pool" args=2 elapsed_us=412 ok=true sql="SELECT * FROM users WHERE id = $1 LIMIT 1"
//! ```

use std::time::Duration;

/// Longest SQL prefix included in a log event.
pub const MAX_LOGGED_SQL: usize = 200;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Which executor a statement ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Pool,
    Transaction,
}

impl ExecutorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorKind::Pool => "pool",
            ExecutorKind::Transaction => "transaction",
        }
    }
}

pub(crate) fn log_statement(kind: ExecutorKind, sql: &str, args: usize, elapsed: Duration, ok: bool) {
    #[cfg(feature = "tracing")]
    {
        let shown = if sql.len() > MAX_LOGGED_SQL {
            format!("{}...", truncate_sql_bytes(sql, MAX_LOGGED_SQL))
        } else {
            sql.to_string()
        };
        tracing::debug!(
            target: "dblayer.sql",
            executor = kind.as_str(),
            args,
            elapsed_us = elapsed.as_micros() as u64,
            ok,
            sql = %shown,
            "sql executed"
        );
    }
    #[cfg(not(feature = "tracing"))]
    let _ = (kind, sql, args, elapsed, ok);
}
