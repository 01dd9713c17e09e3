use super::{
    DateField, DatePart, Dialect, Driver, Fragment, command_column, create_table_with_indexes,
    mysql_to_postgres_format, rebind_numbered, skipped,
};
use crate::error::OrmResult;
use crate::schema::{AlterCommand, ColumnDef, ColumnType, Schema};
use crate::value::Value;
use chrono::NaiveDateTime;

/// PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn rebind(&self, sql: &str) -> String {
        rebind_numbered(sql, '$')
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn float_cast(&self, expr: &str) -> String {
        format!("CAST({expr} AS DOUBLE PRECISION)")
    }

    fn current_date(&self) -> &'static str {
        "CURRENT_DATE"
    }

    fn date_of(&self, column: &str) -> String {
        format!("CAST({column} AS DATE)")
    }

    fn time_of(&self, column: &str) -> String {
        format!("CAST({column} AS TIME)")
    }

    fn extract(&self, field: DateField, column: &str) -> String {
        format!("CAST(EXTRACT({} FROM {column}) AS INTEGER)", field.keyword())
    }

    fn add_days(&self, expr: &str) -> String {
        format!("({expr} + CAST(? AS INTEGER) * INTERVAL '1 day')")
    }

    fn date_diff(&self, a: &str, b: &str) -> String {
        format!("DATE_PART('day', {a}::timestamp - {b}::timestamp)")
    }

    fn date_trunc(&self, part: DatePart, column: &str, value: NaiveDateTime) -> (Fragment, Value) {
        (
            Fragment::new(
                format!("DATE_TRUNC(?, {column})"),
                vec![Value::from(part.as_str())],
            ),
            Value::DateTime(part.truncate(value)),
        )
    }

    fn format_date(&self, column: &str, mysql_format: &str) -> Fragment {
        Fragment::new(
            format!("TO_CHAR({column}, ?)"),
            vec![Value::Text(mysql_to_postgres_format(mysql_format))],
        )
    }

    fn convert_timezone(&self, column: &str, zone: &str) -> OrmResult<Fragment> {
        Ok(Fragment::new(
            format!("({column} AT TIME ZONE ?)"),
            vec![Value::from(zone)],
        ))
    }

    fn age_years(&self, column: &str) -> String {
        format!("CAST(EXTRACT(YEAR FROM AGE({column})) AS INTEGER)")
    }

    fn overlaps(&self, start1: &str, end1: &str, start2: &str, end2: &str) -> String {
        format!("({start1}, {end1}) OVERLAPS ({start2}, {end2})")
    }

    fn business_day(&self, column: &str) -> String {
        format!("EXTRACT(DOW FROM {column}) BETWEEN 1 AND 5")
    }

    fn minute_of_day(&self, column: &str) -> String {
        format!(
            "CAST(EXTRACT(HOUR FROM {column}) * 60 + EXTRACT(MINUTE FROM {column}) AS INTEGER)"
        )
    }

    // ==================== DDL ====================

    fn column_type(&self, column: &ColumnDef) -> String {
        match column.column_type() {
            ColumnType::BigIncrements => "BIGSERIAL".to_string(),
            ColumnType::Increments => "SERIAL".to_string(),
            ColumnType::BigInteger if column.is_auto_increment() => "BIGSERIAL".to_string(),
            ColumnType::Integer if column.is_auto_increment() => "SERIAL".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::TinyInteger | ColumnType::SmallInteger => "SMALLINT".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Text | ColumnType::LongText => "TEXT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal(p, s) => format!("NUMERIC({p}, {s})"),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
            ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Binary => "BYTEA".to_string(),
            ColumnType::Enum(_) => "VARCHAR(255)".to_string(),
        }
    }

    fn build_create_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        let mut statements = create_table_with_indexes(self, schema);
        if let Some(comment) = schema.table_comment() {
            statements.push(format!(
                "COMMENT ON TABLE {} IS '{}'",
                schema.name(),
                comment.replace('\'', "''")
            ));
        }
        for column in schema.columns() {
            if let Some(comment) = column.comment_text() {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS '{}'",
                    schema.name(),
                    column.name(),
                    comment.replace('\'', "''")
                ));
            }
        }
        if schema.engine_name() != crate::schema::DEFAULT_ENGINE {
            skipped(self.name(), "engine", schema.engine_name());
        }
        Ok(statements)
    }

    /// Fragments that can share one ALTER TABLE are grouped; renames and index
    /// operations break the group and run as their own statements.
    fn build_alter_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        let table = schema.name();
        let mut statements = Vec::new();
        let mut group: Vec<String> = Vec::new();

        fn flush(table: &str, group: &mut Vec<String>, statements: &mut Vec<String>) {
            if !group.is_empty() {
                statements.push(format!("ALTER TABLE {table} {}", group.join(", ")));
                group.clear();
            }
        }

        for command in schema.commands() {
            match command {
                AlterCommand::AddColumn(idx) => {
                    let column = command_column(schema, *idx)?;
                    group.push(format!("ADD COLUMN {}", self.column_definition(column)));
                }
                AlterCommand::ModifyColumn(idx) => {
                    let column = command_column(schema, *idx)?;
                    let name = column.name();
                    group.push(format!(
                        "ALTER COLUMN {name} TYPE {}",
                        self.column_type(column)
                    ));
                    group.push(if column.is_nullable() {
                        format!("ALTER COLUMN {name} DROP NOT NULL")
                    } else {
                        format!("ALTER COLUMN {name} SET NOT NULL")
                    });
                    if let Some(default) = column.default_value() {
                        group.push(format!(
                            "ALTER COLUMN {name} SET DEFAULT {}",
                            default.to_sql()
                        ));
                    }
                }
                AlterCommand::DropColumn(name) => group.push(format!("DROP COLUMN {name}")),
                AlterCommand::AddPrimaryKey(columns) => {
                    group.push(format!("ADD PRIMARY KEY ({})", columns.join(", ")));
                }
                AlterCommand::AddForeignKey(idx) => {
                    if let Some(fk) = schema.foreign_keys().get(*idx) {
                        group.push(format!("ADD {}", fk.to_sql()));
                    }
                }
                AlterCommand::DropForeignKey(name) => {
                    group.push(format!("DROP CONSTRAINT {name}"));
                }
                AlterCommand::RenameColumn { from, to } => {
                    flush(table, &mut group, &mut statements);
                    statements.push(format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}"));
                }
                AlterCommand::RenameTable(to) => {
                    flush(table, &mut group, &mut statements);
                    statements.push(format!("ALTER TABLE {table} RENAME TO {to}"));
                }
                AlterCommand::AddIndex(index) => {
                    flush(table, &mut group, &mut statements);
                    statements.extend(self.create_index(table, index));
                }
                AlterCommand::DropIndex(name) => {
                    flush(table, &mut group, &mut statements);
                    statements.push(format!("DROP INDEX {name}"));
                }
                AlterCommand::ChangeEngine(engine) => skipped(self.name(), "engine", engine),
                AlterCommand::ChangeCharset { charset, .. } => {
                    skipped(self.name(), "charset", charset)
                }
            }
        }
        flush(table, &mut group, &mut statements);
        Ok(statements)
    }

    fn build_truncate(&self, tables: &[String], restart_identity: bool, cascade: bool) -> Vec<String> {
        let mut sql = format!("TRUNCATE TABLE {}", tables.join(", "));
        if restart_identity {
            sql.push_str(" RESTART IDENTITY");
        }
        if cascade {
            sql.push_str(" CASCADE");
        }
        vec![sql]
    }
}
