//! Read terminals: get, first, find, pluck, aggregates and pagination.

use super::QueryBuilder;
use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::pagination::{Pagination, last_page, page_offset};
use crate::row::{FromRow, Row};
use crate::value::{FromValue, Value};

impl<'a> QueryBuilder<'a> {
    async fn fetch_rows(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.conn.select_cached(ctx, sql, args, self.cache_ttl).await
    }

    async fn fetch_scalar<T: FromValue>(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<T> {
        let rows = self.fetch_rows(ctx, sql, args).await?;
        let row = rows
            .first()
            .ok_or_else(|| OrmError::not_found("aggregate query returned no rows"))?;
        row.get_idx(0)
    }

    // ==================== rows ====================

    /// All matching rows.
    pub async fn get<T: FromRow>(&self) -> OrmResult<Vec<T>> {
        self.get_ctx(&Context::background()).await
    }

    pub async fn get_ctx<T: FromRow>(&self, ctx: &Context) -> OrmResult<Vec<T>> {
        let (sql, args) = self.to_sql()?;
        let rows = self.fetch_rows(ctx, &sql, &args).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// First matching row, or `None` when nothing matches.
    pub async fn first<T: FromRow>(&self) -> OrmResult<Option<T>> {
        self.first_ctx(&Context::background()).await
    }

    pub async fn first_ctx<T: FromRow>(&self, ctx: &Context) -> OrmResult<Option<T>> {
        let (sql, args) = self.clone().limit(1).to_sql()?;
        let rows = self.fetch_rows(ctx, &sql, &args).await?;
        rows.first().map(T::from_row).transpose()
    }

    /// Row with the given `id`.
    pub async fn find<T: FromRow>(&self, id: impl Into<Value>) -> OrmResult<Option<T>> {
        self.find_ctx(&Context::background(), id).await
    }

    pub async fn find_ctx<T: FromRow>(&self, ctx: &Context, id: impl Into<Value>) -> OrmResult<Option<T>> {
        self.clone().where_id(id).first_ctx(ctx).await
    }

    /// Values of a single column.
    pub async fn pluck<T: FromValue>(&self, column: &str) -> OrmResult<Vec<T>> {
        self.pluck_ctx(&Context::background(), column).await
    }

    pub async fn pluck_ctx<T: FromValue>(&self, ctx: &Context, column: &str) -> OrmResult<Vec<T>> {
        let (sql, args) = self.clone().select(&[column]).to_sql()?;
        let rows = self.fetch_rows(ctx, &sql, &args).await?;
        rows.iter().map(|row| row.get_idx(0)).collect()
    }

    // ==================== aggregates ====================

    pub async fn count(&self) -> OrmResult<u64> {
        self.count_ctx(&Context::background()).await
    }

    pub async fn count_ctx(&self, ctx: &Context) -> OrmResult<u64> {
        self.check()?;
        self.require_table_or_columns()?;
        let (sql, args) = self.render_count();
        self.fetch_scalar(ctx, &sql, &args).await
    }

    pub async fn exists(&self) -> OrmResult<bool> {
        self.exists_ctx(&Context::background()).await
    }

    pub async fn exists_ctx(&self, ctx: &Context) -> OrmResult<bool> {
        Ok(self.count_ctx(ctx).await? > 0)
    }

    async fn aggregate(&self, ctx: &Context, func: &str, column: &str) -> OrmResult<Option<f64>> {
        self.check()?;
        self.require_table(func)?;
        let expr = self.conn.dialect().float_cast(&format!("{func}({column})"));
        let (sql, args) = self.render_scalar(&expr);
        self.fetch_scalar(ctx, &sql, &args).await
    }

    /// `SUM(column)`; `None` when no rows match.
    pub async fn sum(&self, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(&Context::background(), "SUM", column).await
    }

    pub async fn sum_ctx(&self, ctx: &Context, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(ctx, "SUM", column).await
    }

    pub async fn avg(&self, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(&Context::background(), "AVG", column).await
    }

    pub async fn avg_ctx(&self, ctx: &Context, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(ctx, "AVG", column).await
    }

    pub async fn min(&self, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(&Context::background(), "MIN", column).await
    }

    pub async fn min_ctx(&self, ctx: &Context, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(ctx, "MIN", column).await
    }

    pub async fn max(&self, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(&Context::background(), "MAX", column).await
    }

    pub async fn max_ctx(&self, ctx: &Context, column: &str) -> OrmResult<Option<f64>> {
        self.aggregate(ctx, "MAX", column).await
    }

    // ==================== pagination ====================

    /// One page of results. `page` is 1-based; `page` and `per_page` below 1 are clamped to 1.
    ///
    /// Pages past the last one return empty `data`.
    pub async fn paginate<T: FromRow>(&self, page: u64, per_page: u64) -> OrmResult<Pagination<T>> {
        self.paginate_ctx(&Context::background(), page, per_page).await
    }

    pub async fn paginate_ctx<T: FromRow>(
        &self,
        ctx: &Context,
        page: u64,
        per_page: u64,
    ) -> OrmResult<Pagination<T>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = self.count_ctx(ctx).await?;
        let last_page = last_page(total, per_page);

        let data = if total == 0 || page > last_page {
            Vec::new()
        } else {
            self.clone()
                .limit(per_page)
                .offset(page_offset(page, per_page))
                .get_ctx(ctx)
                .await?
        };

        Ok(Pagination {
            data,
            total,
            per_page,
            current_page: page,
            last_page,
        })
    }
}
