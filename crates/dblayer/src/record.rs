//! Persistable records.
//!
//! A [`Record`] exposes the columns a write should touch together with their values. It is
//! implemented by `#[derive(Record)]` for structs and by [`Map`] for ad-hoc key/value data.

use crate::value::Value;
use std::collections::BTreeMap;

/// Map-based record. Keys iterate sorted, which keeps batch column order deterministic.
pub type Map = BTreeMap<String, Value>;

/// Column/value extraction for writes.
///
/// The identity column is never part of the output; it is assigned by the backend and read
/// back through `RETURNING id` or the backend's last-insert-id.
///
/// # Example
///
/// ```ignore
/// use dblayer::Record;
///
/// #[derive(Record)]
/// struct User {
///     #[db(id)]
///     id: i64,
///     username: String,
///     #[db(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
pub trait Record {
    /// Persistable `(column, value)` pairs in declaration order.
    fn columns_and_values(&self) -> Vec<(String, Value)>;

    /// Column names only.
    fn columns(&self) -> Vec<String> {
        self.columns_and_values()
            .into_iter()
            .map(|(column, _)| column)
            .collect()
    }
}

impl Record for Map {
    fn columns_and_values(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn columns_and_values(&self) -> Vec<(String, Value)> {
        (**self).columns_and_values()
    }
}

/// Build a [`Map`] from `column => value` pairs.
///
/// ```ignore
/// let data = dblayer::map! { "name" => "alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! map {
    () => {
        $crate::Map::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Map::new();
        $(map.insert(::std::string::String::from($key), $crate::Value::from($value));)+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_records_are_sorted() {
        let data = crate::map! { "name" => "alice", "age" => 30 };
        assert_eq!(data.columns(), vec!["age".to_string(), "name".to_string()]);
        assert_eq!(
            data.columns_and_values()[0],
            ("age".to_string(), Value::Int(30))
        );
    }
}
