//! Backend-neutral result rows and row mapping traits

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One result row: column names in select order with their decoded values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Backends call this while decoding.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value of a column by name.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Decode a column by name.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        T::from_value(value.clone()).map_err(|e| with_column(e, column))
    }

    /// Decode a column by position.
    pub fn get_idx<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| OrmError::decode(idx.to_string(), "column index out of range"))?;
        let column = self.columns.get(idx).map(String::as_str).unwrap_or("");
        T::from_value(value.clone()).map_err(|e| with_column(e, column))
    }

    pub fn into_map(self) -> BTreeMap<String, Value> {
        self.columns.into_iter().zip(self.values).collect()
    }
}

fn with_column(err: OrmError, column: &str) -> OrmError {
    match err {
        OrmError::Decode { message, .. } => OrmError::decode(column, message),
        other => other,
    }
}

/// Trait for converting a result [`Row`] into a Rust type.
///
/// Usually derived with `#[derive(FromRow)]`.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

impl FromRow for BTreeMap<String, Value> {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone().into_map())
    }
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $t:ident),+) => {
        impl<$($t: FromValue),+> FromRow for ($($t,)+) {
            fn from_row(row: &Row) -> OrmResult<Self> {
                Ok(($(row.get_idx::<$t>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_by_name_and_index() {
        let row = Row::new().with("id", 7).with("name", "alice");
        assert_eq!(row.get::<i64>("id").unwrap(), 7);
        assert_eq!(row.get_idx::<String>(1).unwrap(), "alice");
        assert_eq!(row.columns(), ["id", "name"]);
    }

    #[test]
    fn decode_error_names_column() {
        let row = Row::new().with("id", "abc");
        match row.get::<i64>("id") {
            Err(OrmError::Decode { column, .. }) => assert_eq!(column, "id"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(row.get::<i64>("missing").is_err());
    }

    #[test]
    fn tuples_decode_positionally() {
        let row = Row::new().with("a", 1).with("b", "x");
        let (a, b): (i64, String) = FromRow::from_row(&row).unwrap();
        assert_eq!((a, b.as_str()), (1, "x"));
    }
}
