//! Optional read-through cache for SELECT results.
//!
//! The crate ships no driver; plug one in with [`Database::set_cache`](crate::Database::set_cache)
//! and opt a query in with [`QueryBuilder::remember`](crate::QueryBuilder::remember).

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value store for cached result sets.
#[async_trait]
pub trait CacheDriver: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<Row>>;

    async fn set(&self, key: &str, rows: Vec<Row>, ttl: Duration);

    async fn forget(&self, key: &str);
}

/// Cache key for a rendered statement and its arguments.
pub fn cache_key(sql: &str, args: &[Value]) -> OrmResult<String> {
    Ok(format!("dblayer:{sql}:{}", serde_json::to_string(args)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_distinguishes_arguments() {
        let a = cache_key("SELECT * FROM t WHERE id = ?", &crate::args![1]).unwrap();
        let b = cache_key("SELECT * FROM t WHERE id = ?", &crate::args![2]).unwrap();
        let c = cache_key("SELECT * FROM t WHERE id = ?", &crate::args!["1"]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
