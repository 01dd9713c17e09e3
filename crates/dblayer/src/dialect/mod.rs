//! SQL dialects.
//!
//! A [`Dialect`] is selected once per [`Database`](crate::Database) from the backend tag
//! reported by the pool and shared by every builder created from it. It owns everything that
//! differs between backends:
//!
//! - placeholder rebinding (`?` → `$1`, ...), done right before dispatch
//! - `INSERT ... RETURNING id` support and last-insert-id fallbacks
//! - date/time function translation
//! - DDL type mapping and CREATE/ALTER rendering

mod date;
mod mysql;
mod postgres;
mod sqlite;

#[cfg(test)]
mod tests;

pub use date::{DateField, DatePart, mysql_to_postgres_format, mysql_to_strftime};
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{OrmError, OrmResult};
use crate::schema::{AlterCommand, ColumnDef, ColumnType, Index, IndexKind, Schema};
use crate::value::Value;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    MySql,
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn as_str(self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Dialect implementation for this backend.
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Driver::MySql => Arc::new(MysqlDialect),
            Driver::Postgres => Arc::new(PostgresDialect),
            Driver::Sqlite => Arc::new(SqliteDialect),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = OrmError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pgx" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(OrmError::Config(format!("unsupported database driver: {other}"))),
        }
    }
}

/// Select the dialect for a backend tag.
pub fn for_driver(tag: &str) -> OrmResult<Arc<dyn Dialect>> {
    Ok(tag.parse::<Driver>()?.dialect())
}

/// SQL expression together with the arguments its placeholders consume.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Backend capability interface.
///
/// Query-side methods return SQL fragments that use `?` placeholders; [`Dialect::rebind`]
/// converts the finished statement. DDL methods have shared defaults that individual
/// dialects override where their syntax differs.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn driver(&self) -> Driver;

    fn name(&self) -> &'static str {
        self.driver().as_str()
    }

    // ==================== statements ====================

    /// Convert `?` placeholders into the backend's native form.
    fn rebind(&self, sql: &str) -> String {
        sql.to_string()
    }

    /// Whether `INSERT ... RETURNING id` is available.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether `FOR UPDATE` / `FOR SHARE` suffixes are accepted.
    fn supports_row_locking(&self) -> bool {
        true
    }

    /// Whether each SELECT of a UNION may be wrapped in parentheses.
    fn parenthesize_compound(&self) -> bool {
        true
    }

    /// Identifiers produced by a multi-row INSERT, given the backend's reported
    /// last-insert id and affected row count. Assumes contiguous allocation.
    fn synthesize_ids(&self, last_insert_id: i64, rows: u64) -> Vec<i64> {
        (0..rows as i64).map(|i| last_insert_id + i).collect()
    }

    /// Cast an aggregate expression to a floating point type.
    fn float_cast(&self, expr: &str) -> String;

    // ==================== date functions ====================

    fn current_date(&self) -> &'static str;

    fn date_of(&self, column: &str) -> String {
        format!("DATE({column})")
    }

    fn time_of(&self, column: &str) -> String {
        format!("TIME({column})")
    }

    /// Integer-valued component of a date/time column.
    fn extract(&self, field: DateField, column: &str) -> String;

    /// `expr` shifted by a bound number of days (one `?`).
    fn add_days(&self, expr: &str) -> String;

    /// Whole days between two date expressions (`a - b`).
    fn date_diff(&self, a: &str, b: &str) -> String;

    /// Truncated column expression plus the operand to compare it against.
    fn date_trunc(&self, part: DatePart, column: &str, value: NaiveDateTime) -> (Fragment, Value);

    /// Column formatted with a MySQL-style pattern, translated to the backend's tokens.
    fn format_date(&self, column: &str, mysql_format: &str) -> Fragment;

    /// Column converted from UTC into the bound time zone.
    fn convert_timezone(&self, column: &str, zone: &str) -> OrmResult<Fragment>;

    /// Age of a date column in whole years.
    fn age_years(&self, column: &str) -> String;

    fn overlaps(&self, start1: &str, end1: &str, start2: &str, end2: &str) -> String {
        format!("({start1} <= {end2} AND {end1} >= {start2})")
    }

    /// Predicate that holds Monday through Friday.
    fn business_day(&self, column: &str) -> String;

    /// Minutes since midnight of a date/time column.
    fn minute_of_day(&self, column: &str) -> String;

    // ==================== DDL ====================

    /// Concrete SQL type for a column.
    fn column_type(&self, column: &ColumnDef) -> String;

    fn supports_fulltext_index(&self) -> bool {
        false
    }

    /// Keyword appended to auto-increment columns whose type does not imply it.
    fn auto_increment_keyword(&self) -> Option<&'static str> {
        None
    }

    /// Trailing column clause: an enum CHECK, or MySQL's inline COMMENT.
    fn column_suffix(&self, column: &ColumnDef) -> Option<String> {
        enum_check(column)
    }

    /// Single column definition as used by CREATE TABLE and ADD COLUMN.
    fn column_definition(&self, column: &ColumnDef) -> String {
        standard_column_definition(self, column)
    }

    /// Standalone `CREATE [UNIQUE] INDEX` statement.
    fn create_index(&self, table: &str, index: &Index) -> Option<String> {
        let unique = match index.kind {
            IndexKind::Plain => "",
            IndexKind::Unique => "UNIQUE ",
            IndexKind::FullText => {
                skipped(self.name(), "full-text index", &index.name);
                return None;
            }
        };
        Some(format!(
            "CREATE {unique}INDEX {} ON {table} ({})",
            index.name,
            index.columns.join(", ")
        ))
    }

    /// Render CREATE TABLE plus any statements that must follow it.
    fn build_create_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        Ok(create_table_with_indexes(self, schema))
    }

    /// Render the ALTER TABLE statements for `schema.commands()`.
    fn build_alter_table(&self, schema: &Schema) -> OrmResult<Vec<String>>;

    fn build_drop_tables(&self, tables: &[String], if_exists: bool, cascade: bool) -> Vec<String> {
        let mut sql = String::from("DROP TABLE ");
        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&tables.join(", "));
        if cascade {
            sql.push_str(" CASCADE");
        }
        vec![sql]
    }

    fn build_truncate(&self, tables: &[String], restart_identity: bool, cascade: bool) -> Vec<String>;
}

/// `CREATE [TEMPORARY] TABLE [IF NOT EXISTS] name (body)`
pub(crate) fn create_table_head(schema: &Schema, body: &[String]) -> String {
    let mut sql = String::from("CREATE ");
    if schema.is_temporary() {
        sql.push_str("TEMPORARY ");
    }
    sql.push_str("TABLE ");
    if schema.is_if_not_exists() {
        sql.push_str("IF NOT EXISTS ");
    }
    sql.push_str(schema.name());
    sql.push_str(" (");
    sql.push_str(&body.join(", "));
    sql.push(')');
    sql
}

/// PRIMARY KEY, UNIQUE and FOREIGN KEY clauses shared by every dialect.
pub(crate) fn table_constraints(schema: &Schema) -> Vec<String> {
    let mut out = Vec::new();
    if !schema.primary_key_columns().is_empty() {
        out.push(format!(
            "PRIMARY KEY ({})",
            schema.primary_key_columns().join(", ")
        ));
    }
    for (name, columns) in schema.unique_keys() {
        out.push(format!("CONSTRAINT {name} UNIQUE ({})", columns.join(", ")));
    }
    for fk in schema.foreign_keys() {
        out.push(fk.to_sql());
    }
    out
}

/// Resolve the column behind an ADD/MODIFY command.
pub(crate) fn command_column(schema: &Schema, idx: usize) -> OrmResult<&ColumnDef> {
    schema
        .columns()
        .get(idx)
        .ok_or_else(|| OrmError::Other(format!("alter command refers to missing column #{idx}")))
}

/// `name TYPE [NOT] NULL [DEFAULT ..] [auto] [PRIMARY KEY] [UNIQUE] [suffix]`
pub(crate) fn standard_column_definition<D: Dialect + ?Sized>(dialect: &D, column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", column.name(), dialect.column_type(column));
    sql.push_str(if column.is_nullable() {
        " NULL"
    } else {
        " NOT NULL"
    });
    if let Some(default) = column.default_value() {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default.to_sql());
    }
    if let Some(keyword) = dialect.auto_increment_keyword().filter(|_| column.is_auto_increment()) {
        sql.push(' ');
        sql.push_str(keyword);
    }
    if column.is_primary() {
        sql.push_str(" PRIMARY KEY");
    }
    if column.is_unique() {
        sql.push_str(" UNIQUE");
    }
    if let Some(suffix) = dialect.column_suffix(column) {
        sql.push(' ');
        sql.push_str(&suffix);
    }
    sql
}

/// CREATE TABLE followed by standalone CREATE INDEX statements.
pub(crate) fn create_table_with_indexes<D: Dialect + ?Sized>(dialect: &D, schema: &Schema) -> Vec<String> {
    let mut body: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| dialect.column_definition(c))
        .collect();
    body.extend(table_constraints(schema));

    let mut statements = vec![create_table_head(schema, &body)];
    for index in schema.indexes() {
        statements.extend(dialect.create_index(schema.name(), index));
    }
    statements
}

pub(crate) fn enum_check(column: &ColumnDef) -> Option<String> {
    match column.column_type() {
        ColumnType::Enum(values) => {
            let list: Vec<String> = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            Some(format!("CHECK ({} IN ({}))", column.name(), list.join(", ")))
        }
        _ => None,
    }
}

/// Rewrite `?` as `{prefix}1`, `{prefix}2`, ... leaving quoted literals alone.
pub(crate) fn rebind_numbered(sql: &str, prefix: char) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    n += 1;
                    out.push(prefix);
                    out.push_str(&n.to_string());
                }
                _ => out.push(ch),
            },
        }
    }
    out
}

pub(crate) fn skipped(dialect: &str, what: &str, detail: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(target: "dblayer.schema", dialect, what, detail, "option not supported; skipped");
    #[cfg(not(feature = "tracing"))]
    let _ = (dialect, what, detail);
}

/// Reject commands that cannot be expressed.
pub(crate) fn unsupported_command(dialect: &'static str, command: &AlterCommand) -> OrmError {
    let what = match command {
        AlterCommand::ModifyColumn(_) => "MODIFY COLUMN",
        AlterCommand::AddPrimaryKey(_) => "ADD PRIMARY KEY",
        AlterCommand::AddForeignKey(_) => "ADD FOREIGN KEY",
        AlterCommand::DropForeignKey(_) => "DROP FOREIGN KEY",
        _ => "ALTER operation",
    };
    OrmError::unsupported(dialect, what)
}
