//! Column, index and foreign key definitions used by the schema builder.

use crate::value::Value;

/// Logical column type; each dialect maps it to a concrete SQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Auto-incrementing 64-bit key
    BigIncrements,
    /// Auto-incrementing 32-bit key
    Increments,
    TinyInteger,
    SmallInteger,
    Integer,
    BigInteger,
    String(u32),
    Char(u32),
    Text,
    LongText,
    Boolean,
    Float,
    Double,
    Decimal(u8, u8),
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
    Uuid,
    Binary,
    Enum(Vec<String>),
}

impl ColumnType {
    pub fn is_increments(&self) -> bool {
        matches!(self, ColumnType::BigIncrements | ColumnType::Increments)
    }
}

/// Column default.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// Rendered as a quoted literal
    Value(Value),
    /// Emitted verbatim, e.g. `CURRENT_TIMESTAMP`
    Raw(String),
}

impl ColumnDefault {
    pub fn to_sql(&self) -> String {
        match self {
            ColumnDefault::Value(v) => literal(v),
            ColumnDefault::Raw(expr) => expr.clone(),
        }
    }
}

/// A column being created or modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub(crate) name: String,
    pub(crate) ty: ColumnType,
    pub(crate) nullable: bool,
    pub(crate) default: Option<ColumnDefault>,
    pub(crate) unsigned: bool,
    pub(crate) auto_increment: bool,
    pub(crate) primary: bool,
    pub(crate) unique: bool,
    pub(crate) comment: Option<String>,
    pub(crate) after: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        let auto = ty.is_increments();
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            unsigned: auto,
            auto_increment: auto,
            primary: auto,
            unique: false,
            comment: None,
            after: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn default_value(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn after_column(&self) -> Option<&str> {
        self.after.as_deref()
    }

    // ==================== modifiers ====================

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    pub fn default_raw(&mut self, expr: impl Into<String>) -> &mut Self {
        self.default = Some(ColumnDefault::Raw(expr.into()));
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Column placement on ALTER (MySQL only).
    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Plain,
    Unique,
    FullText,
}

/// Named index over one or more columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: IndexKind,
}

/// Referential action for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ForeignKeyAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }
}

/// Foreign key constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub(crate) name: String,
    pub(crate) column: String,
    pub(crate) ref_table: String,
    pub(crate) ref_column: String,
    pub(crate) on_delete: Option<ForeignKeyAction>,
    pub(crate) on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_delete(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_update = Some(action);
        self
    }

    /// Override the generated constraint name.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// `CONSTRAINT name FOREIGN KEY (col) REFERENCES t (col) [ON DELETE ..] [ON UPDATE ..]`
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.name, self.column, self.ref_table, self.ref_column
        );
        if let Some(action) = self.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = self.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }
}

/// Render a value as an SQL literal for DDL defaults.
pub fn literal(value: &Value) -> String {
    fn quote(s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::Text(v) => quote(v),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
            format!("X'{hex}'")
        }
        Value::Date(v) => quote(&v.to_string()),
        Value::Time(v) => quote(&v.to_string()),
        Value::DateTime(v) => quote(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Timestamp(v) => quote(&v.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Json(v) => quote(&v.to_string()),
        Value::Uuid(v) => quote(&v.to_string()),
    }
}
