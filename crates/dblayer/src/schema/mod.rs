//! Schema (DDL) builder.
//!
//! A [`Schema`] is configured inside a closure passed to [`Database::create_table`] or
//! [`Database::update_table`] and then rendered by the active [`Dialect`]:
//!
//! ```ignore
//! db.create_table("users", |t| {
//!     t.id();
//!     t.string("email", 255).unique();
//!     t.integer("age").nullable();
//!     t.foreign_key("team_id", "teams", "id").on_delete(ForeignKeyAction::Cascade);
//!     t.timestamps();
//! })
//! .await?;
//!
//! db.update_table("users", |t| {
//!     t.string("nickname", 64).nullable().after("email");
//!     t.drop_column("age");
//!     t.rename_column("email", "email_address");
//! })
//! .await?;
//! ```
//!
//! [`Database::create_table`]: crate::Database::create_table
//! [`Database::update_table`]: crate::Database::update_table
//! [`Dialect`]: crate::dialect::Dialect

mod column;
pub(crate) mod table_ops;

#[cfg(test)]
mod tests;

pub use column::{
    ColumnDef, ColumnDefault, ColumnType, ForeignKey, ForeignKeyAction, Index, IndexKind, literal,
};
pub use table_ops::{DropTables, TruncateTables};

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};

pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_ci";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    Create,
    Alter,
}

/// One ALTER TABLE operation, kept in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterCommand {
    /// Index into [`Schema::columns`]
    AddColumn(usize),
    /// Index into [`Schema::columns`]
    ModifyColumn(usize),
    DropColumn(String),
    RenameColumn { from: String, to: String },
    AddIndex(Index),
    DropIndex(String),
    AddPrimaryKey(Vec<String>),
    /// Index into [`Schema::foreign_keys`]
    AddForeignKey(usize),
    DropForeignKey(String),
    RenameTable(String),
    ChangeEngine(String),
    ChangeCharset {
        charset: String,
        collation: Option<String>,
    },
}

/// Table definition for CREATE TABLE or a batch of ALTER TABLE operations.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    mode: SchemaMode,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    unique_keys: Vec<(String, Vec<String>)>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
    engine: String,
    charset: String,
    collation: String,
    comment: Option<String>,
    temporary: bool,
    if_not_exists: bool,
    commands: Vec<AlterCommand>,
}

impl Schema {
    /// Definition for `CREATE TABLE name`.
    pub fn create(name: impl Into<String>) -> Self {
        Self::with_mode(name, SchemaMode::Create)
    }

    /// Operations for `ALTER TABLE name`.
    pub fn alter(name: impl Into<String>) -> Self {
        Self::with_mode(name, SchemaMode::Alter)
    }

    fn with_mode(name: impl Into<String>, mode: SchemaMode) -> Self {
        Self {
            name: name.into(),
            mode,
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_keys: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            engine: DEFAULT_ENGINE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            collation: DEFAULT_COLLATION.to_string(),
            comment: None,
            temporary: false,
            if_not_exists: false,
            commands: Vec::new(),
        }
    }

    // ==================== accessors ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key
    }

    pub fn unique_keys(&self) -> &[(String, Vec<String>)] {
        &self.unique_keys
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn engine_name(&self) -> &str {
        &self.engine
    }

    pub fn charset_name(&self) -> &str {
        &self.charset
    }

    pub fn collation_name(&self) -> &str {
        &self.collation
    }

    pub fn table_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn is_if_not_exists(&self) -> bool {
        self.if_not_exists
    }

    pub fn commands(&self) -> &[AlterCommand] {
        &self.commands
    }

    // ==================== column types ====================

    fn push_column(&mut self, def: ColumnDef) -> &mut ColumnDef {
        let idx = self.columns.len();
        self.columns.push(def);
        if self.mode == SchemaMode::Alter {
            self.commands.push(AlterCommand::AddColumn(idx));
        }
        &mut self.columns[idx]
    }

    /// Column with an explicit type.
    pub fn column(&mut self, name: impl Into<String>, ty: ColumnType) -> &mut ColumnDef {
        self.push_column(ColumnDef::new(name, ty))
    }

    /// Auto-incrementing `id` primary key.
    pub fn id(&mut self) -> &mut ColumnDef {
        self.big_increments("id")
    }

    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::BigIncrements)
    }

    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Increments)
    }

    pub fn tiny_integer(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::TinyInteger)
    }

    pub fn small_integer(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::SmallInteger)
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::BigInteger)
    }

    pub fn string(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDef {
        self.column(name, ColumnType::String(length))
    }

    pub fn char(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDef {
        self.column(name, ColumnType::Char(length))
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Text)
    }

    pub fn long_text(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::LongText)
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Boolean)
    }

    pub fn float(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Float)
    }

    pub fn double(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Double)
    }

    pub fn decimal(&mut self, name: impl Into<String>, precision: u8, scale: u8) -> &mut ColumnDef {
        self.column(name, ColumnType::Decimal(precision, scale))
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Date)
    }

    pub fn time(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Time)
    }

    pub fn date_time(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::DateTime)
    }

    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Timestamp)
    }

    pub fn json(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Json)
    }

    pub fn uuid(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Uuid)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> &mut ColumnDef {
        self.column(name, ColumnType::Binary)
    }

    pub fn enumeration<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> &mut ColumnDef {
        let values = values.into_iter().map(Into::into).collect();
        self.column(name, ColumnType::Enum(values))
    }

    // ==================== composite helpers ====================

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
        self
    }

    /// Nullable `deleted_at` timestamp.
    pub fn soft_deletes(&mut self) -> &mut Self {
        self.timestamp("deleted_at").nullable();
        self
    }

    /// Polymorphic relation columns `{name}_id`, `{name}_type` and an index over both.
    pub fn morphs(&mut self, name: &str) -> &mut Self {
        let id_col = format!("{name}_id");
        let type_col = format!("{name}_type");
        self.big_integer(id_col.clone()).unsigned();
        self.string(type_col.clone(), 255);
        self.index(format!("{name}_index"), [id_col, type_col]);
        self
    }

    /// `created_by`/`updated_by`/`deleted_by` plus timestamps and soft deletes.
    pub fn audit(&mut self) -> &mut Self {
        self.big_integer("created_by").unsigned().nullable();
        self.big_integer("updated_by").unsigned().nullable();
        self.big_integer("deleted_by").unsigned().nullable();
        self.timestamps();
        self.soft_deletes();
        self
    }

    // ==================== keys and indexes ====================

    /// Table-level primary key.
    pub fn primary_key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        match self.mode {
            SchemaMode::Create => self.primary_key = columns,
            SchemaMode::Alter => self.commands.push(AlterCommand::AddPrimaryKey(columns)),
        }
        self
    }

    /// Named unique key.
    pub fn unique_key<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let name = name.into();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        match self.mode {
            SchemaMode::Create => self.unique_keys.push((name, columns)),
            SchemaMode::Alter => self.commands.push(AlterCommand::AddIndex(Index {
                name,
                columns,
                kind: IndexKind::Unique,
            })),
        }
        self
    }

    /// Unique index named `{table}_{columns}_unique`.
    pub fn unique_index<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = format!("{}_{}_unique", self.name, columns.join("_"));
        self.push_index(name, columns, IndexKind::Unique)
    }

    /// Plain secondary index.
    pub fn index<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_index(name.into(), columns, IndexKind::Plain)
    }

    /// Full-text index. Dialects without full-text indexes skip it.
    pub fn full_text<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_index(name.into(), columns, IndexKind::FullText)
    }

    fn push_index(&mut self, name: String, columns: Vec<String>, kind: IndexKind) -> &mut Self {
        let index = Index {
            name,
            columns,
            kind,
        };
        match self.mode {
            SchemaMode::Create => self.indexes.push(index),
            SchemaMode::Alter => self.commands.push(AlterCommand::AddIndex(index)),
        }
        self
    }

    /// Foreign key named `fk_{table}_{column}`.
    pub fn foreign_key(
        &mut self,
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> &mut ForeignKey {
        let column = column.into();
        let idx = self.foreign_keys.len();
        self.foreign_keys.push(ForeignKey {
            name: format!("fk_{}_{}", self.name, column),
            column,
            ref_table: ref_table.into(),
            ref_column: ref_column.into(),
            on_delete: None,
            on_update: None,
        });
        if self.mode == SchemaMode::Alter {
            self.commands.push(AlterCommand::AddForeignKey(idx));
        }
        &mut self.foreign_keys[idx]
    }

    // ==================== table options ====================

    pub fn engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.engine = engine.into();
        self
    }

    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    pub fn collate(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = collation.into();
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    // ==================== alter operations ====================

    pub fn drop_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::DropColumn(name.into()));
        self
    }

    /// Change the definition of an existing column.
    pub fn modify_column(&mut self, name: impl Into<String>, ty: ColumnType) -> &mut ColumnDef {
        let idx = self.columns.len();
        self.columns.push(ColumnDef::new(name, ty));
        self.commands.push(AlterCommand::ModifyColumn(idx));
        &mut self.columns[idx]
    }

    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Add an index while altering. `unique` selects a UNIQUE index.
    pub fn add_index<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
        unique: bool,
    ) -> &mut Self {
        let kind = if unique {
            IndexKind::Unique
        } else {
            IndexKind::Plain
        };
        self.commands.push(AlterCommand::AddIndex(Index {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            kind,
        }));
        self
    }

    pub fn drop_index(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::DropIndex(name.into()));
        self
    }

    pub fn drop_foreign_key(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::DropForeignKey(name.into()));
        self
    }

    pub fn rename_table(&mut self, to: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::RenameTable(to.into()));
        self
    }

    pub fn change_engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.commands.push(AlterCommand::ChangeEngine(engine.into()));
        self
    }

    pub fn change_charset(&mut self, charset: impl Into<String>, collation: Option<&str>) -> &mut Self {
        self.commands.push(AlterCommand::ChangeCharset {
            charset: charset.into(),
            collation: collation.map(str::to_string),
        });
        self
    }

    // ==================== rendering ====================

    /// Statements that apply this definition, in execution order.
    pub fn to_statements(&self, dialect: &dyn Dialect) -> OrmResult<Vec<String>> {
        match self.mode {
            SchemaMode::Create => {
                if self.columns.is_empty() {
                    return Err(OrmError::validation(format!(
                        "create table {}: no columns defined",
                        self.name
                    )));
                }
                dialect.build_create_table(self)
            }
            SchemaMode::Alter => dialect.build_alter_table(self),
        }
    }
}
