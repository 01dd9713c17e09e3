//! Named placeholder compilation (`:name` → `?`).

use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::value::Value;

/// Rewrite `:name` placeholders into positional `?` and collect the values in order.
///
/// `::type` casts and anything inside single-quoted literals are left untouched. A name
/// that `lookup` cannot resolve is a validation error.
pub fn compile_named<F>(sql: &str, mut lookup: F) -> OrmResult<(String, Vec<Value>)>
where
    F: FnMut(&str) -> Option<Value>,
{
    let mut out = String::with_capacity(sql.len());
    let mut args = Vec::new();
    let mut chars = sql.char_indices().peekable();
    let mut in_quote = false;

    while let Some((i, ch)) = chars.next() {
        if ch == '\'' {
            in_quote = !in_quote;
            out.push(ch);
            continue;
        }
        if in_quote || ch != ':' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some((_, ':')) => {
                out.push_str("::");
                chars.next();
            }
            Some((_, c)) if c.is_ascii_alphabetic() || *c == '_' => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        end = j + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &sql[start..end];
                let value = lookup(name).ok_or_else(|| {
                    OrmError::validation(format!("no value bound for named parameter :{name}"))
                })?;
                out.push('?');
                args.push(value);
            }
            _ => out.push(ch),
        }
    }

    Ok((out, args))
}

/// Compile `sql` against the fields of a record.
pub fn compile_record<R: Record + ?Sized>(sql: &str, record: &R) -> OrmResult<(String, Vec<Value>)> {
    let pairs = record.columns_and_values();
    compile_named(sql, |name| {
        pairs
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_in_order_of_appearance() {
        let data = crate::map! { "a" => 1, "b" => "x" };
        let (sql, args) = compile_record("UPDATE t SET b = :b, a = :a WHERE a = :a", &data).unwrap();
        assert_eq!(sql, "UPDATE t SET b = ?, a = ? WHERE a = ?");
        assert_eq!(args, crate::args!["x", 1, 1]);
    }

    #[test]
    fn skips_casts_and_literals() {
        let data = crate::map! { "id" => 3 };
        let (sql, args) =
            compile_record("SELECT ':id', x::text FROM t WHERE id = :id", &data).unwrap();
        assert_eq!(sql, "SELECT ':id', x::text FROM t WHERE id = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = compile_named("a = :missing", |_| None).unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }
}
