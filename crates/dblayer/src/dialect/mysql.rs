use super::{
    DateField, DatePart, Dialect, Driver, Fragment, command_column, create_table_head,
    mysql_to_strftime, table_constraints,
};
use crate::error::OrmResult;
use crate::schema::{AlterCommand, ColumnDef, ColumnType, Index, IndexKind, Schema};
use crate::value::Value;
use chrono::NaiveDateTime;

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    fn index_clause(index: &Index) -> String {
        let kind = match index.kind {
            IndexKind::Plain => "INDEX",
            IndexKind::Unique => "UNIQUE INDEX",
            IndexKind::FullText => "FULLTEXT INDEX",
        };
        format!("{kind} {} ({})", index.name, index.columns.join(", "))
    }

    fn table_options(schema: &Schema) -> String {
        let mut sql = format!(
            " ENGINE={} DEFAULT CHARSET={} COLLATE={}",
            schema.engine_name(),
            schema.charset_name(),
            schema.collation_name()
        );
        if let Some(comment) = schema.table_comment() {
            sql.push_str(&format!(" COMMENT='{}'", comment.replace('\'', "''")));
        }
        sql
    }

    fn column_with_position(&self, column: &ColumnDef) -> String {
        let mut sql = self.column_definition(column);
        if let Some(after) = column.after_column() {
            sql.push_str(" AFTER ");
            sql.push_str(after);
        }
        sql
    }
}

impl Dialect for MysqlDialect {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn float_cast(&self, expr: &str) -> String {
        format!("CAST({expr} AS DOUBLE)")
    }

    fn current_date(&self) -> &'static str {
        "CURDATE()"
    }

    fn extract(&self, field: DateField, column: &str) -> String {
        match field {
            DateField::Weekday => format!("(DAYOFWEEK({column}) - 1)"),
            DateField::Quarter => format!("QUARTER({column})"),
            DateField::Week => format!("WEEK({column}, 3)"),
            _ => format!("EXTRACT({} FROM {column})", field.keyword()),
        }
    }

    fn add_days(&self, expr: &str) -> String {
        format!("DATE_ADD({expr}, INTERVAL ? DAY)")
    }

    fn date_diff(&self, a: &str, b: &str) -> String {
        format!("DATEDIFF({a}, {b})")
    }

    fn date_trunc(&self, part: DatePart, column: &str, value: NaiveDateTime) -> (Fragment, Value) {
        let format = part.mysql_format();
        let operand = value.format(&mysql_to_strftime(format)).to_string();
        (
            Fragment::new(format!("DATE_FORMAT({column}, ?)"), vec![Value::from(format)]),
            Value::Text(operand),
        )
    }

    fn format_date(&self, column: &str, mysql_format: &str) -> Fragment {
        Fragment::new(
            format!("DATE_FORMAT({column}, ?)"),
            vec![Value::from(mysql_format)],
        )
    }

    fn convert_timezone(&self, column: &str, zone: &str) -> OrmResult<Fragment> {
        Ok(Fragment::new(
            format!("CONVERT_TZ({column}, 'UTC', ?)"),
            vec![Value::from(zone)],
        ))
    }

    fn age_years(&self, column: &str) -> String {
        format!("TIMESTAMPDIFF(YEAR, {column}, CURDATE())")
    }

    fn business_day(&self, column: &str) -> String {
        format!("WEEKDAY({column}) < 5")
    }

    fn minute_of_day(&self, column: &str) -> String {
        format!("(HOUR({column}) * 60 + MINUTE({column}))")
    }

    // ==================== DDL ====================

    fn column_type(&self, column: &ColumnDef) -> String {
        let base = match column.column_type() {
            ColumnType::BigIncrements | ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::Increments | ColumnType::Integer => "INT".to_string(),
            ColumnType::TinyInteger => "TINYINT".to_string(),
            ColumnType::SmallInteger => "SMALLINT".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::LongText => "LONGTEXT".to_string(),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Binary => "BLOB".to_string(),
            ColumnType::Enum(values) => {
                let list: Vec<String> = values
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                format!("ENUM({})", list.join(", "))
            }
        };
        if column.is_unsigned() {
            format!("{base} UNSIGNED")
        } else {
            base
        }
    }

    fn supports_fulltext_index(&self) -> bool {
        true
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    fn column_suffix(&self, column: &ColumnDef) -> Option<String> {
        column
            .comment_text()
            .map(|comment| format!("COMMENT '{}'", comment.replace('\'', "''")))
    }

    fn build_create_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        let mut body: Vec<String> = schema
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        body.extend(table_constraints(schema));
        body.extend(schema.indexes().iter().map(Self::index_clause));

        let mut sql = create_table_head(schema, &body);
        sql.push_str(&Self::table_options(schema));
        Ok(vec![sql])
    }

    fn build_alter_table(&self, schema: &Schema) -> OrmResult<Vec<String>> {
        let mut fragments = Vec::with_capacity(schema.commands().len());
        for command in schema.commands() {
            let fragment = match command {
                AlterCommand::AddColumn(idx) => {
                    format!(
                        "ADD COLUMN {}",
                        self.column_with_position(command_column(schema, *idx)?)
                    )
                }
                AlterCommand::ModifyColumn(idx) => format!(
                    "MODIFY COLUMN {}",
                    self.column_with_position(command_column(schema, *idx)?)
                ),
                AlterCommand::DropColumn(name) => format!("DROP COLUMN {name}"),
                AlterCommand::RenameColumn { from, to } => {
                    format!("RENAME COLUMN {from} TO {to}")
                }
                AlterCommand::AddIndex(index) => format!("ADD {}", Self::index_clause(index)),
                AlterCommand::DropIndex(name) => format!("DROP INDEX {name}"),
                AlterCommand::AddPrimaryKey(columns) => {
                    format!("ADD PRIMARY KEY ({})", columns.join(", "))
                }
                AlterCommand::AddForeignKey(idx) => match schema.foreign_keys().get(*idx) {
                    Some(fk) => format!("ADD {}", fk.to_sql()),
                    None => continue,
                },
                AlterCommand::DropForeignKey(name) => format!("DROP FOREIGN KEY {name}"),
                AlterCommand::RenameTable(to) => format!("RENAME TO {to}"),
                AlterCommand::ChangeEngine(engine) => format!("ENGINE={engine}"),
                AlterCommand::ChangeCharset { charset, collation } => match collation {
                    Some(collation) => {
                        format!("CONVERT TO CHARACTER SET {charset} COLLATE {collation}")
                    }
                    None => format!("CONVERT TO CHARACTER SET {charset}"),
                },
            };
            fragments.push(fragment);
        }
        if fragments.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "ALTER TABLE {} {}",
            schema.name(),
            fragments.join(", ")
        )])
    }

    fn build_truncate(&self, tables: &[String], _restart_identity: bool, _cascade: bool) -> Vec<String> {
        tables
            .iter()
            .map(|table| format!("TRUNCATE TABLE {table}"))
            .collect()
    }
}
