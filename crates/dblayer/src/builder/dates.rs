//! Date and time predicates, rendered through the active dialect.

use super::{BuildError, QueryBuilder};
use crate::dialect::{DateField, DatePart};
use crate::error::OrmError;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

impl<'a> QueryBuilder<'a> {
    fn where_extract(self, field: DateField, column: &str, op: &str, value: i64) -> Self {
        let expr = self.conn.dialect().extract(field, column);
        self.where_(&format!("{expr} {op} ?"), vec![Value::Int(value)])
    }

    /// `DATE(column) op ?`
    pub fn where_date(self, column: &str, op: &str, value: NaiveDate) -> Self {
        let expr = self.conn.dialect().date_of(column);
        self.where_(&format!("{expr} {op} ?"), vec![value.into()])
    }

    pub fn where_between_dates(self, column: &str, start: NaiveDate, end: NaiveDate) -> Self {
        let expr = self.conn.dialect().date_of(column);
        self.where_(
            &format!("{expr} BETWEEN ? AND ?"),
            vec![start.into(), end.into()],
        )
    }

    pub fn where_date_time(self, column: &str, op: &str, value: NaiveDateTime) -> Self {
        self.where_(&format!("{column} {op} ?"), vec![value.into()])
    }

    pub fn where_between_date_time(self, column: &str, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.where_between(column, start, end)
    }

    pub fn where_year(self, column: &str, op: &str, year: i32) -> Self {
        self.where_extract(DateField::Year, column, op, i64::from(year))
    }

    pub fn where_month(self, column: &str, op: &str, month: u32) -> Self {
        self.where_extract(DateField::Month, column, op, i64::from(month))
    }

    pub fn where_day(self, column: &str, op: &str, day: u32) -> Self {
        self.where_extract(DateField::Day, column, op, i64::from(day))
    }

    /// Compare the time-of-day part of a column.
    pub fn where_time(self, column: &str, op: &str, value: NaiveTime) -> Self {
        let expr = self.conn.dialect().time_of(column);
        self.where_(&format!("{expr} {op} ?"), vec![value.into()])
    }

    pub fn where_current_date(self, column: &str, op: &str) -> Self {
        let dialect = self.conn.dialect().clone();
        let clause = format!(
            "{} {op} {}",
            dialect.date_of(column),
            dialect.current_date()
        );
        self.where_(&clause, Vec::new())
    }

    /// Rows dated within the last `days` days, today included.
    pub fn where_last_days(self, column: &str, days: i64) -> Self {
        let dialect = self.conn.dialect().clone();
        let clause = format!(
            "{} >= {}",
            dialect.date_of(column),
            dialect.add_days(dialect.current_date())
        );
        self.where_(&clause, vec![Value::Int(-days)])
    }

    /// Rows dated between today and `days` days from now.
    pub fn where_next_days(self, column: &str, days: i64) -> Self {
        let dialect = self.conn.dialect().clone();
        let date = dialect.date_of(column);
        let clause = format!(
            "({date} <= {} AND {date} >= {})",
            dialect.add_days(dialect.current_date()),
            dialect.current_date()
        );
        self.where_(&clause, vec![Value::Int(days)])
    }

    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub fn where_weekday(self, column: &str, op: &str, weekday: u32) -> Self {
        self.where_extract(DateField::Weekday, column, op, i64::from(weekday))
    }

    pub fn where_weekend(self, column: &str) -> Self {
        let expr = self.conn.dialect().extract(DateField::Weekday, column);
        self.where_(&format!("{expr} IN (0, 6)"), Vec::new())
    }

    pub fn where_quarter(self, column: &str, op: &str, quarter: u32) -> Self {
        self.where_extract(DateField::Quarter, column, op, i64::from(quarter))
    }

    /// ISO week number.
    pub fn where_week(self, column: &str, op: &str, week: u32) -> Self {
        self.where_extract(DateField::Week, column, op, i64::from(week))
    }

    /// Date range with inclusive (`BETWEEN`) or exclusive bounds.
    pub fn where_date_range(self, column: &str, start: NaiveDate, end: NaiveDate, inclusive: bool) -> Self {
        if inclusive {
            return self.where_between_dates(column, start, end);
        }
        let date = self.conn.dialect().date_of(column);
        self.where_(
            &format!("({date} > ? AND {date} < ?)"),
            vec![start.into(), end.into()],
        )
    }

    pub fn where_date_between_columns(self, column: &str, start_column: &str, end_column: &str) -> Self {
        let dialect = self.conn.dialect().clone();
        let clause = format!(
            "{} BETWEEN {} AND {}",
            dialect.date_of(column),
            dialect.date_of(start_column),
            dialect.date_of(end_column)
        );
        self.where_(&clause, Vec::new())
    }

    /// Age in whole years of a birth-date style column.
    pub fn where_age(self, column: &str, op: &str, age: u32) -> Self {
        let expr = self.conn.dialect().age_years(column);
        self.where_(&format!("{expr} {op} ?"), vec![Value::from(age)])
    }

    /// Whole days between two columns (`a - b`).
    pub fn where_date_diff(self, a: &str, b: &str, op: &str, days: i64) -> Self {
        let expr = self.conn.dialect().date_diff(a, b);
        self.where_(&format!("{expr} {op} ?"), vec![Value::Int(days)])
    }

    pub fn where_time_overlap(self, start1: &str, end1: &str, start2: &str, end2: &str) -> Self {
        let clause = self.conn.dialect().overlaps(start1, end1, start2, end2);
        self.where_(&clause, Vec::new())
    }

    /// Compare a column truncated to `part` against `value` truncated the same way.
    pub fn where_date_trunc(self, part: DatePart, column: &str, op: &str, value: NaiveDateTime) -> Self {
        let (fragment, operand) = self.conn.dialect().date_trunc(part, column, value);
        let mut args = fragment.args;
        args.push(operand);
        self.where_(&format!("{} {op} ?", fragment.sql), args)
    }

    /// Time of day between `start` and `end`, at minute precision.
    pub fn where_time_window(self, column: &str, start: NaiveTime, end: NaiveTime) -> Self {
        let expr = self.conn.dialect().minute_of_day(column);
        let minutes = |t: NaiveTime| Value::Int(i64::from(t.hour() * 60 + t.minute()));
        self.where_(
            &format!("{expr} BETWEEN ? AND ?"),
            vec![minutes(start), minutes(end)],
        )
    }

    /// Monday through Friday.
    pub fn where_business_days(self, column: &str) -> Self {
        let clause = self.conn.dialect().business_day(column);
        self.where_(&clause, Vec::new())
    }

    /// Compare a column formatted with a MySQL-style pattern (`%Y-%m`, ...).
    pub fn where_date_format(self, column: &str, format: &str, op: &str, value: &str) -> Self {
        let fragment = self.conn.dialect().format_date(column, format);
        let mut args = fragment.args;
        args.push(Value::from(value));
        self.where_(&format!("{} {op} ?", fragment.sql), args)
    }

    /// Compare a UTC column converted into `zone`.
    pub fn where_time_zone(self, column: &str, op: &str, value: NaiveDateTime, zone: &str) -> Self {
        match self.conn.dialect().convert_timezone(column, zone) {
            Ok(fragment) => {
                let mut args = fragment.args;
                args.push(value.into());
                self.where_(&format!("{} {op} ?", fragment.sql), args)
            }
            Err(OrmError::Unsupported { dialect, feature }) => {
                self.fail(BuildError::Unsupported { dialect, feature })
            }
            Err(other) => self.invalid(other.to_string()),
        }
    }
}
