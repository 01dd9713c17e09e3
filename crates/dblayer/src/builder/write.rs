//! Write terminals: INSERT, UPDATE and DELETE.

use super::{QueryBuilder, placeholders};
use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::named::compile_record;
use crate::record::{Map, Record};
use crate::value::Value;

/// Records of a batch, each collected into a map once, with their shared sorted column set.
struct Batch {
    columns: Vec<String>,
    rows: Vec<Map>,
}

impl Batch {
    /// Every record must carry exactly the first record's keys.
    fn collect<R: Record>(records: &[R]) -> OrmResult<Self> {
        let rows: Vec<Map> = records
            .iter()
            .map(|r| r.columns_and_values().into_iter().collect())
            .collect();
        let columns: Vec<String> = rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default();
        for (idx, row) in rows.iter().enumerate().skip(1) {
            if !row.keys().eq(columns.iter()) {
                return Err(OrmError::validation(format!(
                    "batch record #{idx} has columns [{}], expected [{}]",
                    row.keys().cloned().collect::<Vec<_>>().join(", "),
                    columns.join(", ")
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn value(row: &Map, column: &str) -> Value {
        row.get(column).cloned().unwrap_or(Value::Null)
    }

    /// Row-major values for a multi-row VALUES list.
    fn values(&self) -> Vec<Value> {
        let mut args = Vec::with_capacity(self.rows.len() * self.columns.len());
        for row in &self.rows {
            args.extend(self.columns.iter().map(|c| Self::value(row, c)));
        }
        args
    }
}

impl<'a> QueryBuilder<'a> {
    fn insert_sql(&self, columns: &[String], rows: usize) -> String {
        let tuple = format!("({})", placeholders(columns.len()));
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            columns.join(", "),
            vec![tuple; rows].join(", ")
        )
    }

    // ==================== INSERT ====================

    /// Insert one record and return its generated id.
    pub async fn create<R: Record + ?Sized>(&self, record: &R) -> OrmResult<i64> {
        self.create_ctx(&Context::background(), record).await
    }

    pub async fn create_ctx<R: Record + ?Sized>(&self, ctx: &Context, record: &R) -> OrmResult<i64> {
        self.check()?;
        self.require_table("create")?;
        let (columns, args): (Vec<String>, Vec<Value>) = record.columns_and_values().into_iter().unzip();
        if columns.is_empty() {
            return Err(OrmError::validation("create: record has no columns"));
        }
        let mut sql = self.insert_sql(&columns, 1);

        if self.conn.dialect().supports_returning() {
            sql.push_str(" RETURNING id");
            let row = self
                .conn
                .get_ctx(ctx, &sql, &args)
                .await?
                .ok_or_else(|| OrmError::Other("insert returned no id".to_string()))?;
            return row.get_idx(0);
        }

        self.conn
            .exec_ctx(ctx, &sql, &args)
            .await?
            .last_insert_id
            .ok_or_else(|| OrmError::Other("backend reported no last insert id".to_string()))
    }

    /// Insert a map-based record and return its generated id.
    pub async fn create_map(&self, data: &Map) -> OrmResult<i64> {
        self.create_ctx(&Context::background(), data).await
    }

    pub async fn create_map_ctx(&self, ctx: &Context, data: &Map) -> OrmResult<i64> {
        self.create_ctx(ctx, data).await
    }

    /// Insert many records in one statement. Returns the affected row count.
    pub async fn batch_insert<R: Record>(&self, records: &[R]) -> OrmResult<u64> {
        self.batch_insert_ctx(&Context::background(), records).await
    }

    pub async fn batch_insert_ctx<R: Record>(&self, ctx: &Context, records: &[R]) -> OrmResult<u64> {
        self.check()?;
        self.require_table("batch insert")?;
        let batch = Batch::collect(records)?;
        if batch.is_empty() {
            return Ok(0);
        }
        let sql = self.insert_sql(&batch.columns, batch.rows.len());
        let args = batch.values();
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }

    /// Insert many records and return their generated ids in insertion order.
    ///
    /// Without `RETURNING`, ids are derived from the backend's last-insert id and assume
    /// the batch received a contiguous range. Concurrent writers can break that assumption.
    pub async fn bulk_insert<R: Record>(&self, records: &[R]) -> OrmResult<Vec<i64>> {
        self.bulk_insert_ctx(&Context::background(), records).await
    }

    pub async fn bulk_insert_ctx<R: Record>(&self, ctx: &Context, records: &[R]) -> OrmResult<Vec<i64>> {
        self.check()?;
        self.require_table("bulk insert")?;
        let batch = Batch::collect(records)?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let mut sql = self.insert_sql(&batch.columns, batch.rows.len());
        let args = batch.values();
        let dialect = self.conn.dialect().clone();

        if dialect.supports_returning() {
            sql.push_str(" RETURNING id");
            let rows = self.conn.select_ctx(ctx, &sql, &args).await?;
            return rows.iter().map(|row| row.get_idx(0)).collect();
        }

        let result = self.conn.exec_ctx(ctx, &sql, &args).await?;
        let last_id = result
            .last_insert_id
            .ok_or_else(|| OrmError::Other("backend reported no last insert id".to_string()))?;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "dblayer.sql",
            dialect = dialect.name(),
            table = %self.table,
            rows = result.rows_affected,
            "bulk insert ids synthesized from last insert id; assumes contiguous allocation"
        );
        Ok(dialect.synthesize_ids(last_id, result.rows_affected))
    }

    // ==================== UPDATE ====================

    fn update_sql(&self, sets: &str, args: &mut Vec<Value>) -> String {
        format!("UPDATE {} SET {sets}{}", self.table, self.where_sql(args))
    }

    /// Update matching rows from a record.
    ///
    /// `fields` selects the columns to write; an empty slice writes every mapped column.
    /// Returns the affected row count.
    pub async fn update<R: Record + ?Sized>(&self, record: &R, fields: &[&str]) -> OrmResult<u64> {
        self.update_ctx(&Context::background(), record, fields).await
    }

    pub async fn update_ctx<R: Record + ?Sized>(
        &self,
        ctx: &Context,
        record: &R,
        fields: &[&str],
    ) -> OrmResult<u64> {
        self.check()?;
        self.require_table("update")?;
        let columns: Vec<String> = if fields.is_empty() {
            record.columns()
        } else {
            fields.iter().map(|f| f.to_string()).collect()
        };
        if columns.is_empty() {
            return Err(OrmError::validation("update: no columns to set"));
        }
        let named: Vec<String> = columns.iter().map(|c| format!("{c} = :{c}")).collect();
        let (sets, mut args) = compile_record(&named.join(", "), record)?;
        let sql = self.update_sql(&sets, &mut args);
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }

    /// Update matching rows from column/value pairs.
    pub async fn update_map(&self, data: &Map) -> OrmResult<u64> {
        self.update_map_ctx(&Context::background(), data).await
    }

    pub async fn update_map_ctx(&self, ctx: &Context, data: &Map) -> OrmResult<u64> {
        self.check()?;
        self.require_table("update")?;
        if data.is_empty() {
            return Err(OrmError::validation("update: no columns to set"));
        }
        let sets: Vec<String> = data.keys().map(|c| format!("{c} = ?")).collect();
        let mut args: Vec<Value> = data.values().cloned().collect();
        let sql = self.update_sql(&sets.join(", "), &mut args);
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }

    /// Update many rows in one statement, matching each record on `key_column`.
    ///
    /// Renders one `CASE key WHEN ? THEN ? ... ELSE column END` per non-key column. The
    /// `ELSE` branch keeps the column's own type for backends that infer parameter types
    /// from context. Rows whose key is not in the batch are left untouched.
    pub async fn bulk_update<R: Record>(&self, records: &[R], key_column: &str) -> OrmResult<u64> {
        self.bulk_update_ctx(&Context::background(), records, key_column)
            .await
    }

    pub async fn bulk_update_ctx<R: Record>(
        &self,
        ctx: &Context,
        records: &[R],
        key_column: &str,
    ) -> OrmResult<u64> {
        self.check()?;
        self.require_table("bulk update")?;
        let batch = Batch::collect(records)?;
        if batch.is_empty() {
            return Ok(0);
        }
        if !batch.columns.iter().any(|c| c == key_column) {
            return Err(OrmError::validation(format!(
                "bulk update: records have no key column {key_column}"
            )));
        }
        let targets: Vec<&String> = batch.columns.iter().filter(|c| *c != key_column).collect();
        if targets.is_empty() {
            return Err(OrmError::validation("bulk update: no columns to set"));
        }

        let keys: Vec<Value> = batch.rows.iter().map(|r| Batch::value(r, key_column)).collect();
        let when = vec!["WHEN ? THEN ?"; batch.rows.len()].join(" ");

        let mut args = Vec::with_capacity(targets.len() * batch.rows.len() * 2 + keys.len());
        let mut cases = Vec::with_capacity(targets.len());
        for column in &targets {
            cases.push(format!("{column} = CASE {key_column} {when} ELSE {column} END"));
            for (row, key) in batch.rows.iter().zip(&keys) {
                args.push(key.clone());
                args.push(Batch::value(row, column));
            }
        }
        args.extend(keys.iter().cloned());

        let mut sql = format!(
            "UPDATE {} SET {} WHERE {key_column} IN ({})",
            self.table,
            cases.join(", "),
            placeholders(keys.len())
        );
        if self.has_where() {
            let clause = self.wheres.render_into(&mut args);
            if !clause.is_empty() {
                sql.push_str(&format!(" AND ({clause})"));
            }
        }
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }

    /// `column = column + amount` on matching rows.
    pub async fn increment(&self, column: &str, amount: impl Into<Value>) -> OrmResult<u64> {
        self.increment_ctx(&Context::background(), column, amount).await
    }

    pub async fn increment_ctx(&self, ctx: &Context, column: &str, amount: impl Into<Value>) -> OrmResult<u64> {
        self.step(ctx, column, "+", amount.into()).await
    }

    /// `column = column - amount` on matching rows.
    pub async fn decrement(&self, column: &str, amount: impl Into<Value>) -> OrmResult<u64> {
        self.decrement_ctx(&Context::background(), column, amount).await
    }

    pub async fn decrement_ctx(&self, ctx: &Context, column: &str, amount: impl Into<Value>) -> OrmResult<u64> {
        self.step(ctx, column, "-", amount.into()).await
    }

    async fn step(&self, ctx: &Context, column: &str, op: &str, amount: Value) -> OrmResult<u64> {
        self.check()?;
        self.require_table("update")?;
        let mut args = vec![amount];
        let sql = self.update_sql(&format!("{column} = {column} {op} ?"), &mut args);
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }

    // ==================== DELETE ====================

    /// Delete matching rows. Refuses to run without a WHERE clause.
    pub async fn delete(&self) -> OrmResult<u64> {
        self.delete_ctx(&Context::background()).await
    }

    pub async fn delete_ctx(&self, ctx: &Context) -> OrmResult<u64> {
        self.check()?;
        self.require_table("delete")?;
        if !self.has_where() {
            return Err(OrmError::validation(
                "delete without conditions is not allowed",
            ));
        }
        let mut args = Vec::new();
        let sql = format!("DELETE FROM {}{}", self.table, self.where_sql(&mut args));
        Ok(self.conn.exec_ctx(ctx, &sql, &args).await?.rows_affected)
    }
}
