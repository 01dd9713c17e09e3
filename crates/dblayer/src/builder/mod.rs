//! Fluent query builder.
//!
//! A [`QueryBuilder`] is created from [`Database::table`](crate::Database::table) or
//! [`Transaction::table`](crate::Transaction::table), configured through chained calls and
//! consumed by a terminal operation (`get`, `first`, `create`, `update_map`, `delete`, ...).
//!
//! Statements are assembled with generic `?` placeholders; the execution context rebinds
//! them for the active dialect right before dispatch.
//!
//! ```ignore
//! use dblayer::{args, Database};
//!
//! let users: Vec<User> = db
//!     .table("users")
//!     .select(&["id", "name"])
//!     .where_("status = ?", args!["active"])
//!     .where_group(|g| {
//!         g.and("age > ?", args![18]);
//!         g.or("vip = ?", args![true]);
//!     })
//!     .order_by("id", "DESC")
//!     .limit(20)
//!     .get()
//!     .await?;
//! ```

mod dates;
mod read;
mod write;


use crate::error::{OrmError, OrmResult};
use crate::executor::Conn;
use crate::predicate::PredicateTree;
use crate::transaction::Transaction;
use crate::value::Value;
use std::time::Duration;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// One JOIN clause. Cross joins carry no condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub condition: Option<String>,
}

impl Join {
    fn to_sql(&self) -> String {
        match &self.condition {
            Some(on) if self.kind != JoinKind::Cross => {
                format!("{} {} ON {on}", self.kind.as_sql(), self.table)
            }
            _ => format!("{} {}", self.kind.as_sql(), self.table),
        }
    }
}

/// Construction error held until a terminal operation runs.
#[derive(Debug, Clone)]
enum BuildError {
    Invalid(String),
    Unsupported {
        dialect: &'static str,
        feature: String,
    },
}

impl From<BuildError> for OrmError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Invalid(message) => OrmError::Validation(message),
            BuildError::Unsupported { dialect, feature } => OrmError::Unsupported { dialect, feature },
        }
    }
}

/// A right-hand UNION operand, already rendered.
#[derive(Debug, Clone)]
struct Compound {
    all: bool,
    sql: String,
    args: Vec<Value>,
}

/// Builder for one statement against one table.
///
/// The builder is a value owned by its call chain. Terminal operations borrow it, so a
/// configured builder can be reused (e.g. `count` then `get`).
#[derive(Debug, Clone)]
#[must_use = "query builders do nothing until a terminal operation runs"]
pub struct QueryBuilder<'a> {
    conn: Conn<'a>,
    table: String,
    alias: Option<String>,
    columns: Vec<String>,
    column_args: Vec<Value>,
    joins: Vec<Join>,
    wheres: PredicateTree,
    group_by: Vec<String>,
    having: Vec<String>,
    having_args: Vec<Value>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    lock: Option<String>,
    unions: Vec<Compound>,
    cache_ttl: Option<Duration>,
    build_error: Option<BuildError>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(conn: Conn<'a>, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
            alias: None,
            columns: Vec::new(),
            column_args: Vec::new(),
            joins: Vec::new(),
            wheres: PredicateTree::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            having_args: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            unions: Vec::new(),
            cache_ttl: None,
            build_error: None,
        }
    }

    fn fail(mut self, err: BuildError) -> Self {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
        self
    }

    fn invalid(self, message: impl Into<String>) -> Self {
        self.fail(BuildError::Invalid(message.into()))
    }

    fn absorb_error(self, other: &QueryBuilder<'_>) -> Self {
        match &other.build_error {
            Some(err) => self.fail(err.clone()),
            None => self,
        }
    }

    pub(crate) fn check(&self) -> OrmResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    fn require_table(&self, op: &str) -> OrmResult<()> {
        if self.table.is_empty() {
            return Err(OrmError::validation(format!("{op}: no table selected")));
        }
        Ok(())
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn conn(&self) -> &Conn<'a> {
        &self.conn
    }

    /// Route every statement of this builder through `tx`.
    pub fn with_transaction<'b>(self, tx: &'b Transaction) -> QueryBuilder<'b>
    where
        'a: 'b,
    {
        let mut qb: QueryBuilder<'b> = self;
        qb.conn = tx.conn();
        qb
    }

    /// `FROM table AS alias`.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Cache the result of read operations for `ttl` when a cache driver is configured.
    pub fn remember(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    // ==================== columns ====================

    /// Replace the selected columns. An empty list selects `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.column_args.clear();
        self
    }

    /// Append a raw column expression with its own arguments.
    pub fn select_raw(mut self, expr: &str, args: Vec<Value>) -> Self {
        self.columns.push(expr.to_string());
        self.column_args.extend(args);
        self
    }

    /// Append `(subquery) AS alias` to the column list.
    pub fn select_sub(self, sub: QueryBuilder<'_>, alias: &str) -> Self {
        let this = self.absorb_error(&sub);
        let (sql, args) = sub.render_select_unchecked();
        this.select_raw(&format!("({sql}) AS {alias}"), args)
    }

    /// `expr OVER (PARTITION BY partition ORDER BY order) AS alias`.
    ///
    /// Empty `partition` or `order` drop the respective clause.
    pub fn window(mut self, func: &str, partition: &str, order: &str, alias: &str) -> Self {
        let mut over = Vec::new();
        if !partition.is_empty() {
            over.push(format!("PARTITION BY {partition}"));
        }
        if !order.is_empty() {
            over.push(format!("ORDER BY {order}"));
        }
        let mut column = format!("{func} OVER ({})", over.join(" "));
        if !alias.is_empty() {
            column.push_str(" AS ");
            column.push_str(alias);
        }
        self.columns.push(column);
        self
    }

    pub fn row_number(self, partition: &str, order: &str, alias: &str) -> Self {
        self.window("ROW_NUMBER()", partition, order, alias)
    }

    pub fn rank(self, partition: &str, order: &str, alias: &str) -> Self {
        self.window("RANK()", partition, order, alias)
    }

    pub fn dense_rank(self, partition: &str, order: &str, alias: &str) -> Self {
        self.window("DENSE_RANK()", partition, order, alias)
    }

    // ==================== WHERE ====================

    /// `AND clause`, with `?` placeholders bound from `args` in order.
    pub fn where_(mut self, clause: &str, args: Vec<Value>) -> Self {
        self.wheres.and(clause, args);
        self
    }

    /// `OR clause`.
    pub fn or_where(mut self, clause: &str, args: Vec<Value>) -> Self {
        self.wheres.or(clause, args);
        self
    }

    pub fn where_raw(self, sql: &str, args: Vec<Value>) -> Self {
        self.where_(sql, args)
    }

    pub fn or_where_raw(self, sql: &str, args: Vec<Value>) -> Self {
        self.or_where(sql, args)
    }

    pub fn where_id(self, id: impl Into<Value>) -> Self {
        self.where_("id = ?", vec![id.into()])
    }

    /// `AND (...)` built by `f`.
    pub fn where_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut PredicateTree),
    {
        self.wheres.and_group(f);
        self
    }

    /// `OR (...)` built by `f`.
    pub fn or_where_group<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut PredicateTree),
    {
        self.wheres.or_group(f);
        self
    }

    /// `column IN (?, ...)`. An empty list matches nothing.
    pub fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return self.where_("1 = 0", Vec::new());
        }
        let clause = format!("{column} IN ({})", placeholders(values.len()));
        self.where_(&clause, values)
    }

    /// `column NOT IN (?, ...)`. An empty list matches everything.
    pub fn where_not_in(self, column: &str, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return self.where_("1 = 1", Vec::new());
        }
        let clause = format!("{column} NOT IN ({})", placeholders(values.len()));
        self.where_(&clause, values)
    }

    pub fn where_null(self, column: &str) -> Self {
        self.where_(&format!("{column} IS NULL"), Vec::new())
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.where_(&format!("{column} IS NOT NULL"), Vec::new())
    }

    pub fn where_between(self, column: &str, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        self.where_(
            &format!("{column} BETWEEN ? AND ?"),
            vec![start.into(), end.into()],
        )
    }

    pub fn where_not_between(self, column: &str, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        self.where_(
            &format!("{column} NOT BETWEEN ? AND ?"),
            vec![start.into(), end.into()],
        )
    }

    /// `column op (subquery)`.
    pub fn where_sub_query(self, column: &str, op: &str, sub: QueryBuilder<'_>) -> Self {
        let this = self.absorb_error(&sub);
        let (sql, args) = sub.render_select_unchecked();
        this.where_(&format!("{column} {op} ({sql})"), args)
    }

    // ==================== joins ====================

    fn push_join(mut self, kind: JoinKind, table: &str, condition: Option<&str>) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            condition: condition.map(str::to_string),
        });
        self
    }

    /// `INNER JOIN table ON condition`.
    pub fn join(self, table: &str, condition: &str) -> Self {
        self.push_join(JoinKind::Inner, table, Some(condition))
    }

    pub fn left_join(self, table: &str, condition: &str) -> Self {
        self.push_join(JoinKind::Left, table, Some(condition))
    }

    pub fn right_join(self, table: &str, condition: &str) -> Self {
        self.push_join(JoinKind::Right, table, Some(condition))
    }

    pub fn cross_join(self, table: &str) -> Self {
        self.push_join(JoinKind::Cross, table, None)
    }

    // ==================== grouping & ordering ====================

    /// Replace the GROUP BY list.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Replace the HAVING clause.
    pub fn having(mut self, condition: &str) -> Self {
        self.having = vec![condition.to_string()];
        self.having_args.clear();
        self
    }

    /// Append `AND sql` to the HAVING clause.
    pub fn having_raw(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.having.push(sql.to_string());
        self.having_args.extend(args);
        self
    }

    /// `ORDER BY column direction`. Direction is `ASC` or `DESC`, case-insensitive.
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        let dir = direction.trim().to_ascii_uppercase();
        if dir != "ASC" && dir != "DESC" {
            return self.invalid(format!("invalid order direction: {direction}"));
        }
        self.order_by.push(format!("{column} {dir}"));
        self
    }

    pub fn latest(self, column: &str) -> Self {
        self.order_by(column, "DESC")
    }

    pub fn oldest(self, column: &str) -> Self {
        self.order_by(column, "ASC")
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ==================== locking ====================

    pub fn lock_for_update(mut self) -> Self {
        self.lock = Some("FOR UPDATE".to_string());
        self
    }

    pub fn lock_for_share(mut self) -> Self {
        self.lock = Some("FOR SHARE".to_string());
        self
    }

    fn lock_modifier(mut self, modifier: &str) -> Self {
        match self.lock.as_mut() {
            Some(lock) => {
                lock.push(' ');
                lock.push_str(modifier);
                self
            }
            None => self.invalid(format!(
                "{modifier} requires lock_for_update or lock_for_share"
            )),
        }
    }

    pub fn skip_locked(self) -> Self {
        self.lock_modifier("SKIP LOCKED")
    }

    pub fn no_wait(self) -> Self {
        self.lock_modifier("NOWAIT")
    }

    // ==================== composition ====================

    /// Wrap this query as a derived column: `SELECT (this) AS alias`.
    pub fn sub_query(self, alias: &str) -> QueryBuilder<'a> {
        let (sql, args) = self.render_select_unchecked();
        let mut sub = QueryBuilder::new(self.conn.clone(), String::new());
        sub.columns.push(format!("({sql}) AS {alias}"));
        sub.column_args = args;
        sub.build_error = self.build_error;
        sub
    }

    /// `this UNION other`.
    pub fn union(self, other: QueryBuilder<'_>) -> Self {
        self.push_compound(false, other)
    }

    /// `this UNION ALL other`.
    pub fn union_all(self, other: QueryBuilder<'_>) -> Self {
        self.push_compound(true, other)
    }

    fn push_compound(self, all: bool, other: QueryBuilder<'_>) -> Self {
        let mut this = self.absorb_error(&other);
        let (sql, args) = other.render_select_unchecked();
        this.unions.push(Compound { all, sql, args });
        this
    }

    // ==================== rendering ====================

    /// Render the SELECT statement with `?` placeholders.
    pub fn to_sql(&self) -> OrmResult<(String, Vec<Value>)> {
        self.check()?;
        self.require_table_or_columns()?;
        Ok(self.render_select_unchecked())
    }

    fn require_table_or_columns(&self) -> OrmResult<()> {
        if self.table.is_empty() && self.columns.is_empty() {
            return Err(OrmError::validation("select: no table or columns given"));
        }
        Ok(())
    }

    fn column_list(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        }
    }

    /// ` FROM table [AS alias] joins [WHERE ...]`
    fn render_from_where(&self, args: &mut Vec<Value>) -> String {
        let mut sql = String::new();
        if !self.table.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&self.table);
            if let Some(alias) = &self.alias {
                sql.push_str(" AS ");
                sql.push_str(alias);
            }
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql.push_str(&self.render_where(args));
        sql
    }

    /// ` WHERE ...`, or nothing when the tree renders empty. Args-only nodes still contribute.
    fn render_where(&self, args: &mut Vec<Value>) -> String {
        let clause = self.wheres.render_into(args);
        if clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {clause}")
        }
    }

    fn render_group_having(&self, args: &mut Vec<Value>) -> String {
        let mut sql = String::new();
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.join(" AND "));
            args.extend(self.having_args.iter().cloned());
        }
        sql
    }

    fn render_order_limit(&self) -> String {
        let mut sql = String::new();
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    fn render_lock(&self) -> String {
        match &self.lock {
            Some(lock) if self.conn.dialect().supports_row_locking() => format!(" {lock}"),
            _ => String::new(),
        }
    }

    /// `SELECT cols FROM ... WHERE ... GROUP BY ... HAVING ...` without ordering or limits.
    fn render_core(&self, args: &mut Vec<Value>) -> String {
        let mut sql = format!("SELECT {}", self.column_list());
        args.extend(self.column_args.iter().cloned());
        sql.push_str(&self.render_from_where(args));
        sql.push_str(&self.render_group_having(args));
        sql
    }

    /// Ordering and limits apply to the whole compound when unions are present.
    pub(crate) fn render_select_unchecked(&self) -> (String, Vec<Value>) {
        let mut args = Vec::new();
        let mut sql = self.render_core(&mut args);

        if self.unions.is_empty() {
            sql.push_str(&self.render_order_limit());
            sql.push_str(&self.render_lock());
            return (sql, args);
        }

        let wrap = self.conn.dialect().parenthesize_compound();
        let operand = |s: &str| if wrap { format!("({s})") } else { s.to_string() };
        let mut out = operand(&sql);
        for compound in &self.unions {
            out.push_str(if compound.all { " UNION ALL " } else { " UNION " });
            out.push_str(&operand(&compound.sql));
            args.extend(compound.args.iter().cloned());
        }
        out.push_str(&self.render_order_limit());
        (out, args)
    }

    /// Count statement: plain `COUNT(*)` over the filtered table, or a wrapped count when
    /// grouping or unions make the row count differ from the table's.
    pub(crate) fn render_count(&self) -> (String, Vec<Value>) {
        if !self.group_by.is_empty() || !self.unions.is_empty() || self.table.is_empty() {
            let mut inner = self.clone();
            inner.order_by.clear();
            inner.limit = None;
            inner.offset = None;
            inner.lock = None;
            let (sql, args) = inner.render_select_unchecked();
            return (format!("SELECT COUNT(*) FROM ({sql}) AS sub"), args);
        }
        self.render_scalar("COUNT(*)")
    }

    /// `SELECT expr FROM ... WHERE ...` ignoring columns, grouping and limits.
    pub(crate) fn render_scalar(&self, expr: &str) -> (String, Vec<Value>) {
        let mut args = Vec::new();
        let mut sql = format!("SELECT {expr}");
        sql.push_str(&self.render_from_where(&mut args));
        (sql, args)
    }

    pub(crate) fn where_sql(&self, args: &mut Vec<Value>) -> String {
        self.render_where(args)
    }

    pub(crate) fn has_where(&self) -> bool {
        !self.wheres.is_empty()
    }
}

/// `?, ?, ?`
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
