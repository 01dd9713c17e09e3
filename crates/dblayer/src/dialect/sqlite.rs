use super::{
    DateField, DatePart, Dialect, Driver, Fragment, command_column, standard_column_definition,
    mysql_to_strftime, skipped, unsupported_command,
};
use crate::error::{OrmError, OrmResult};
use crate::schema::{AlterCommand, ColumnDef, ColumnType, Schema};
use crate::value::Value;
use chrono::NaiveDateTime;

/// SQLite 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

fn strftime_int(token: &str, column: &str) -> String {
    format!("CAST(strftime('{token}', {column}) AS INTEGER)")
}

impl Dialect for SqliteDialect {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn supports_row_locking(&self) -> bool {
        false
    }

    fn parenthesize_compound(&self) -> bool {
        false
    }

    /// `last_insert_rowid()` reports the final row of a multi-row insert.
    fn synthesize_ids(&self, last_insert_id: i64, rows: u64) -> Vec<i64> {
        let first = last_insert_id - rows as i64 + 1;
        (first..=last_insert_id).collect()
    }

    fn float_cast(&self, expr: &str) -> String {
        format!("CAST({expr} AS REAL)")
    }

    fn current_date(&self) -> &'static str {
        "DATE('now')"
    }

    fn extract(&self, field: DateField, column: &str) -> String {
        match field {
            DateField::Year => strftime_int("%Y", column),
            DateField::Month => strftime_int("%m", column),
            DateField::Day => strftime_int("%d", column),
            DateField::Hour => strftime_int("%H", column),
            DateField::Minute => strftime_int("%M", column),
            DateField::Second => strftime_int("%S", column),
            DateField::Weekday => strftime_int("%w", column),
            DateField::Week => strftime_int("%W", column),
            DateField::Quarter => format!("(({} + 2) / 3)", strftime_int("%m", column)),
        }
    }

    fn add_days(&self, expr: &str) -> String {
        format!("DATE({expr}, printf('%+d days', ?))")
    }

    fn date_diff(&self, a: &str, b: &str) -> String {
        format!("CAST(julianday({a}) - julianday({b}) AS INTEGER)")
    }

    fn date_trunc(&self, part: DatePart, column: &str, value: NaiveDateTime) -> (Fragment, Value) {
        let format = mysql_to_strftime(part.mysql_format());
        let operand = value.format(&format).to_string();
        (
            Fragment::new(format!("strftime(?, {column})"), vec![Value::Text(format)]),
            Value::Text(operand),
        )
    }

    fn format_date(&self, column: &str, mysql_format: &str) -> Fragment {
        Fragment::new(
            format!("strftime(?, {column})"),
            vec![Value::Text(mysql_to_strftime(mysql_format))],
        )
    }

    fn convert_timezone(&self, _column: &str, _zone: &str) -> OrmResult<Fragment> {
        Err(OrmError::unsupported(self.name(), "time zone conversion"))
    }

    fn age_years(&self, column: &str) -> String {
        format!("CAST((julianday('now') - julianday({column})) / 365.25 AS INTEGER)")
    }

    fn business_day(&self, column: &str) -> String {
        format!("strftime('%w', {column}) NOT IN ('0', '6')")
    }

    fn minute_of_day(&self, column: &str) -> String {
        format!(
            "({} * 60 + {})",
            strftime_int("%H", column),
            strftime_int("%M", column)
        )
    }

    // ==================== DDL ====================

    fn column_type(&self, column: &ColumnDef) -> String {
        match column.column_type() {
            ColumnType::BigIncrements
            | ColumnType::Increments
            | ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Boolean => "INTEGER".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Text | ColumnType::LongText | ColumnType::Json | ColumnType::Enum(_) => {
                "TEXT".to_string()
            }
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Float | ColumnType::Double => "REAL".to_string(),
            ColumnType::Decimal(..) => "NUMERIC".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Binary => "BLOB".to_string(),
        }
    }

    /// Auto-increment keys must be spelled `INTEGER PRIMARY KEY AUTOINCREMENT`.
    fn column_definition(&self, column: &ColumnDef) -> String {
        if column.is_auto_increment() && column.is_primary() {
            return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", column.name());
        }
        standard_column_definition(self, column)
    }

    /// One statement per operation; SQLite's ALTER TABLE accepts a single action.
    fn build_alter_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        let table = schema.name();
        let mut statements = Vec::new();
        for command in schema.commands() {
            match command {
                AlterCommand::AddColumn(idx) => {
                    let column = command_column(schema, *idx)?;
                    statements.push(format!(
                        "ALTER TABLE {table} ADD COLUMN {}",
                        self.column_definition(column)
                    ));
                }
                AlterCommand::DropColumn(name) => {
                    statements.push(format!("ALTER TABLE {table} DROP COLUMN {name}"));
                }
                AlterCommand::RenameColumn { from, to } => {
                    statements.push(format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}"));
                }
                AlterCommand::RenameTable(to) => {
                    statements.push(format!("ALTER TABLE {table} RENAME TO {to}"));
                }
                AlterCommand::AddIndex(index) => {
                    statements.extend(self.create_index(table, index));
                }
                AlterCommand::DropIndex(name) => statements.push(format!("DROP INDEX {name}")),
                AlterCommand::ChangeEngine(engine) => skipped(self.name(), "engine", engine),
                AlterCommand::ChangeCharset { charset, .. } => {
                    skipped(self.name(), "charset", charset)
                }
                other @ (AlterCommand::ModifyColumn(_)
                | AlterCommand::AddPrimaryKey(_)
                | AlterCommand::AddForeignKey(_)
                | AlterCommand::DropForeignKey(_)) => {
                    return Err(unsupported_command(self.name(), other));
                }
            }
        }
        Ok(statements)
    }

    fn build_drop_tables(&self, tables: &[String], if_exists: bool, _cascade: bool) -> Vec<String> {
        let exists = if if_exists { "IF EXISTS " } else { "" };
        tables
            .iter()
            .map(|table| format!("DROP TABLE {exists}{table}"))
            .collect()
    }

    /// SQLite has no TRUNCATE; an unqualified DELETE takes the truncate fast path.
    fn build_truncate(&self, tables: &[String], restart_identity: bool, _cascade: bool) -> Vec<String> {
        let mut statements: Vec<String> = tables
            .iter()
            .map(|table| format!("DELETE FROM {table}"))
            .collect();
        if restart_identity {
            let list: Vec<String> = tables.iter().map(|t| format!("'{t}'")).collect();
            statements.push(format!(
                "DELETE FROM sqlite_sequence WHERE name IN ({})",
                list.join(", ")
            ));
        }
        statements
    }
}
