#![allow(dead_code)]

//! Recording in-memory backend for integration tests.
//!
//! Every statement is recorded. Pool writes land in `visible` immediately; session writes
//! are buffered and only become visible on commit.

use async_trait::async_trait;
use dblayer::{Database, ExecResult, Executor, OrmResult, Pool, Row, Session, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
    pub in_transaction: bool,
}

#[derive(Default)]
pub struct State {
    pub calls: Mutex<Vec<Call>>,
    pub visible: Mutex<Vec<String>>,
    pub rows: Mutex<VecDeque<Vec<Row>>>,
    pub exec: Mutex<VecDeque<ExecResult>>,
    pub commits: Mutex<u32>,
    pub rollbacks: Mutex<u32>,
    pub discarded: Mutex<u32>,
    pub delay: Mutex<Option<Duration>>,
}

impl State {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Call {
        self.calls().pop().expect("no statement recorded")
    }

    pub fn visible(&self) -> Vec<String> {
        self.visible.lock().unwrap().clone()
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.rows.lock().unwrap().push_back(rows);
    }

    pub fn push_exec(&self, rows_affected: u64, last_insert_id: Option<i64>) {
        self.exec.lock().unwrap().push_back(ExecResult {
            rows_affected,
            last_insert_id,
        });
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn record(&self, sql: &str, args: &[Value], in_transaction: bool) {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
            in_transaction,
        });
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_rows(&self) -> Vec<Row> {
        self.rows.lock().unwrap().pop_front().unwrap_or_default()
    }

    fn next_exec(&self) -> ExecResult {
        self.exec.lock().unwrap().pop_front().unwrap_or(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

pub struct MockPool {
    driver: &'static str,
    state: Arc<State>,
}

#[async_trait]
impl Executor for MockPool {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.state.record(sql, args, false).await;
        Ok(self.state.next_rows())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.state.record(sql, args, false).await;
        self.state.visible.lock().unwrap().push(sql.to_string());
        Ok(self.state.next_exec())
    }
}

#[async_trait]
impl Pool for MockPool {
    fn driver(&self) -> &str {
        self.driver
    }

    async fn ping(&self) -> OrmResult<()> {
        Ok(())
    }

    async fn begin(&self) -> OrmResult<Box<dyn Session>> {
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            pending: Mutex::new(Vec::new()),
            finished: false,
        }))
    }
}

pub struct MockSession {
    state: Arc<State>,
    pending: Mutex<Vec<String>>,
    finished: bool,
}

#[async_trait]
impl Executor for MockSession {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.state.record(sql, args, true).await;
        Ok(self.state.next_rows())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.state.record(sql, args, true).await;
        self.pending.lock().unwrap().push(sql.to_string());
        Ok(self.state.next_exec())
    }
}

#[async_trait]
impl Session for MockSession {
    async fn commit(&mut self) -> OrmResult<()> {
        self.finished = true;
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        self.state.visible.lock().unwrap().extend(pending);
        *self.state.commits.lock().unwrap() += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finished = true;
        self.pending.lock().unwrap().clear();
        *self.state.rollbacks.lock().unwrap() += 1;
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.discarded.lock().unwrap() += 1;
        }
    }
}

/// A database over a fresh recording backend.
pub fn database(driver: &'static str) -> (Database, Arc<State>) {
    let state = Arc::new(State::default());
    let pool = MockPool {
        driver,
        state: state.clone(),
    };
    let db = Database::new(Arc::new(pool)).expect("known driver");
    (db, state)
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .fold(Row::new(), |row, (column, value)| row.with(*column, value.clone()))
}

pub fn count_row(n: i64) -> Vec<Row> {
    vec![row(&[("count", Value::Int(n))])]
}
