//! Conversions between [`Value`] and PostgreSQL wire types.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{FromValue, Value};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

type EncodeResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> EncodeResult {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql_checked(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from_f64(*v)
                    .ok_or_else(|| format!("float {v} has no numeric representation"))?
                    .to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Decimal(v) => match *ty {
                Type::FLOAT4 | Type::FLOAT8 => {
                    let float = v
                        .to_f64()
                        .ok_or_else(|| format!("decimal {v} does not fit a float"))?;
                    Value::Float(float).to_sql(ty, out)
                }
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => {
                if <String as ToSql>::accepts(ty) {
                    return v.to_sql_checked(ty, out);
                }
                match parse_text(v, ty)? {
                    Some(parsed) => parsed.to_sql(ty, out),
                    None => Err(wrong_type(self, ty)),
                }
            }
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Time(v) => v.to_sql_checked(ty, out),
            Value::DateTime(v) => match *ty {
                Type::TIMESTAMPTZ => v.and_utc().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
        }
    }

    // The server infers each parameter's type; `to_sql` rejects values that do not fit it.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn wrong_type(value: &Value, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot encode {} value as postgres type {ty}", value.kind()).into()
}

/// Parse a text argument bound to a non-text parameter. `None` when the type has no text form.
fn parse_text(text: &str, ty: &Type) -> OrmResult<Option<Value>> {
    let raw = || Value::Text(text.to_string());
    let parsed = match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 => Value::Int(i64::from_value(raw())?),
        Type::FLOAT4 | Type::FLOAT8 => Value::Float(f64::from_value(raw())?),
        Type::NUMERIC => Value::Decimal(Decimal::from_value(raw())?),
        Type::BOOL => match text {
            "t" | "true" | "1" => Value::Bool(true),
            "f" | "false" | "0" => Value::Bool(false),
            _ => return Err(OrmError::decode("", format!("invalid boolean {text:?}"))),
        },
        Type::DATE => Value::Date(NaiveDate::from_value(raw())?),
        Type::TIME => Value::Time(NaiveTime::from_value(raw())?),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => Value::DateTime(
            NaiveDateTime::from_value(raw())
                .or_else(|_| NaiveDate::from_value(raw()).map(|d| d.and_time(NaiveTime::default())))?,
        ),
        Type::JSON | Type::JSONB => Value::Json(serde_json::from_str(text)?),
        Type::UUID => Value::Uuid(uuid::Uuid::from_value(raw())?),
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

/// Decode one column as `Option<T>`, mapping SQL NULL to [`Value::Null`].
fn column<'a, T>(row: &'a tokio_postgres::Row, idx: usize, name: &str) -> OrmResult<Value>
where
    T: tokio_postgres::types::FromSql<'a> + Into<Value>,
{
    row.try_get::<_, Option<T>>(idx)
        .map(|v| v.map_or(Value::Null, Into::into))
        .map_err(|e| OrmError::decode(name, e.to_string()))
}

/// Convert a driver row into a [`Row`], keeping column order.
pub(crate) fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let value = match *col.type_() {
            Type::BOOL => column::<bool>(row, idx, name)?,
            Type::INT2 => column::<i16>(row, idx, name)?,
            Type::INT4 => column::<i32>(row, idx, name)?,
            Type::INT8 => column::<i64>(row, idx, name)?,
            Type::FLOAT4 => column::<f32>(row, idx, name)?,
            Type::FLOAT8 => column::<f64>(row, idx, name)?,
            Type::NUMERIC => column::<Decimal>(row, idx, name)?,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                column::<String>(row, idx, name)?
            }
            Type::BYTEA => column::<Vec<u8>>(row, idx, name)?,
            Type::DATE => column::<NaiveDate>(row, idx, name)?,
            Type::TIME => column::<NaiveTime>(row, idx, name)?,
            Type::TIMESTAMP => column::<NaiveDateTime>(row, idx, name)?,
            Type::TIMESTAMPTZ => column::<DateTime<Utc>>(row, idx, name)?,
            Type::JSON | Type::JSONB => column::<serde_json::Value>(row, idx, name)?,
            Type::UUID => column::<uuid::Uuid>(row, idx, name)?,
            ref other => {
                return Err(OrmError::decode(
                    name,
                    format!("unsupported column type {other}"),
                ));
            }
        };
        out.push(name, value);
    }
    Ok(out)
}
