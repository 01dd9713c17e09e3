//! Date/time vocabulary shared by the dialects.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Component pulled out of a date/time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Day of week, 0 = Sunday through 6 = Saturday.
    Weekday,
    Quarter,
    Week,
}

impl DateField {
    /// Keyword accepted by `EXTRACT(... FROM col)` on MySQL and PostgreSQL.
    pub fn keyword(self) -> &'static str {
        match self {
            DateField::Year => "YEAR",
            DateField::Month => "MONTH",
            DateField::Day => "DAY",
            DateField::Hour => "HOUR",
            DateField::Minute => "MINUTE",
            DateField::Second => "SECOND",
            DateField::Weekday => "DOW",
            DateField::Quarter => "QUARTER",
            DateField::Week => "WEEK",
        }
    }
}

/// Precision for truncated date comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatePart {
    /// Unit name understood by PostgreSQL `DATE_TRUNC`.
    pub fn as_str(self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
        }
    }

    /// MySQL `DATE_FORMAT` pattern that keeps exactly this precision.
    pub fn mysql_format(self) -> &'static str {
        match self {
            DatePart::Year => "%Y",
            DatePart::Month => "%Y-%m",
            DatePart::Day => "%Y-%m-%d",
            DatePart::Hour => "%Y-%m-%d %H",
            DatePart::Minute => "%Y-%m-%d %H:%i",
            DatePart::Second => "%Y-%m-%d %H:%i:%s",
        }
    }

    /// Zero every component finer than this part.
    pub fn truncate(self, value: NaiveDateTime) -> NaiveDateTime {
        let (y, mo, d) = (value.year(), value.month(), value.day());
        let (h, mi, s) = (value.hour(), value.minute(), value.second());
        let (mo, d, h, mi, s) = match self {
            DatePart::Year => (1, 1, 0, 0, 0),
            DatePart::Month => (mo, 1, 0, 0, 0),
            DatePart::Day => (mo, d, 0, 0, 0),
            DatePart::Hour => (mo, d, h, 0, 0),
            DatePart::Minute => (mo, d, h, mi, 0),
            DatePart::Second => (mo, d, h, mi, s),
        };
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .unwrap_or(value)
    }
}

const MYSQL_TO_POSTGRES: &[(char, &str)] = &[
    ('Y', "YYYY"),
    ('y', "YY"),
    ('m', "MM"),
    ('c', "FMMM"),
    ('d', "DD"),
    ('e', "FMDD"),
    ('H', "HH24"),
    ('h', "HH12"),
    ('i', "MI"),
    ('s', "SS"),
    ('S', "SS"),
    ('p', "AM"),
    ('M', "FMMonth"),
    ('b', "Mon"),
    ('W', "FMDay"),
    ('a', "Dy"),
    ('j', "DDD"),
    ('%', "%"),
];

const MYSQL_TO_STRFTIME: &[(char, &str)] = &[
    ('Y', "%Y"),
    ('y', "%y"),
    ('m', "%m"),
    ('d', "%d"),
    ('e', "%e"),
    ('H', "%H"),
    ('h', "%I"),
    ('i', "%M"),
    ('s', "%S"),
    ('S', "%S"),
    ('p', "%p"),
    ('M', "%B"),
    ('b', "%b"),
    ('W', "%A"),
    ('a', "%a"),
    ('j', "%j"),
    ('%', "%%"),
];

/// Translate a MySQL `DATE_FORMAT` pattern into PostgreSQL `TO_CHAR` tokens.
pub fn mysql_to_postgres_format(format: &str) -> String {
    convert(format, MYSQL_TO_POSTGRES)
}

/// Translate a MySQL `DATE_FORMAT` pattern into `strftime` tokens (SQLite and chrono).
pub fn mysql_to_strftime(format: &str) -> String {
    convert(format, MYSQL_TO_STRFTIME)
}

fn convert(format: &str, table: &[(char, &str)]) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(token) => match table.iter().find(|(t, _)| *t == token) {
                Some((_, replacement)) => out.push_str(replacement),
                None => {
                    out.push('%');
                    out.push(token);
                }
            },
            None => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_format_tokens() {
        assert_eq!(
            mysql_to_postgres_format("%Y-%m-%d %H:%i:%s"),
            "YYYY-MM-DD HH24:MI:SS"
        );
        assert_eq!(mysql_to_strftime("%Y-%m-%d %H:%i:%s"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(mysql_to_postgres_format("day %q"), "day %q");
    }

    #[test]
    fn truncates_to_part() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 42, 7)
            .unwrap();
        let month = DatePart::Month.truncate(value);
        assert_eq!(month.to_string(), "2024-03-01 00:00:00");
        let minute = DatePart::Minute.truncate(value);
        assert_eq!(minute.to_string(), "2024-03-15 10:42:00");
    }
}
