use super::*;
use chrono::NaiveDate;

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[test]
fn driver_tags_resolve() {
    assert_eq!("mysql".parse::<Driver>().unwrap(), Driver::MySql);
    assert_eq!("PostgreSQL".parse::<Driver>().unwrap(), Driver::Postgres);
    assert_eq!("sqlite3".parse::<Driver>().unwrap(), Driver::Sqlite);
    assert_eq!(for_driver("postgres").unwrap().driver(), Driver::Postgres);
}

#[test]
fn unknown_driver_is_config_error() {
    let err = for_driver("oracle").unwrap_err();
    assert!(matches!(err, OrmError::Config(_)), "{err:?}");
}

#[test]
fn rebind_per_dialect() {
    let sql = "SELECT * FROM t WHERE a = ? AND b IN (?, ?)";
    assert_eq!(MysqlDialect.rebind(sql), sql);
    assert_eq!(SqliteDialect.rebind(sql), sql);
    assert_eq!(
        PostgresDialect.rebind(sql),
        "SELECT * FROM t WHERE a = $1 AND b IN ($2, $3)"
    );
}

#[test]
fn rebind_leaves_quoted_question_marks() {
    assert_eq!(
        PostgresDialect.rebind("SELECT '?' AS q, \"a?\" FROM t WHERE x = ?"),
        "SELECT '?' AS q, \"a?\" FROM t WHERE x = $1"
    );
}

#[test]
fn capabilities() {
    assert!(PostgresDialect.supports_returning());
    assert!(!MysqlDialect.supports_returning());
    assert!(!SqliteDialect.supports_returning());

    assert!(MysqlDialect.supports_row_locking());
    assert!(!SqliteDialect.supports_row_locking());

    assert!(MysqlDialect.parenthesize_compound());
    assert!(!SqliteDialect.parenthesize_compound());

    assert!(MysqlDialect.supports_fulltext_index());
    assert!(!PostgresDialect.supports_fulltext_index());
}

#[test]
fn synthesized_ids_follow_backend_convention() {
    // MySQL reports the first id of the batch, SQLite the last.
    assert_eq!(MysqlDialect.synthesize_ids(10, 3), vec![10, 11, 12]);
    assert_eq!(SqliteDialect.synthesize_ids(12, 3), vec![10, 11, 12]);
    assert!(MysqlDialect.synthesize_ids(10, 0).is_empty());
}

#[test]
fn extract_weekday_is_zero_based_sunday() {
    assert_eq!(
        MysqlDialect.extract(DateField::Weekday, "created_at"),
        "(DAYOFWEEK(created_at) - 1)"
    );
    assert_eq!(
        PostgresDialect.extract(DateField::Weekday, "created_at"),
        "CAST(EXTRACT(DOW FROM created_at) AS INTEGER)"
    );
    assert_eq!(
        SqliteDialect.extract(DateField::Weekday, "created_at"),
        "CAST(strftime('%w', created_at) AS INTEGER)"
    );
}

#[test]
fn add_days_binds_one_argument() {
    for dialect in [Driver::MySql, Driver::Postgres, Driver::Sqlite] {
        let sql = dialect.dialect().add_days("CURRENT_DATE");
        assert_eq!(sql.matches('?').count(), 1, "{dialect}: {sql}");
    }
}

#[test]
fn date_trunc_operands() {
    let value = at(2024, 3, 15, 10, 42, 7);

    let (fragment, operand) = MysqlDialect.date_trunc(DatePart::Month, "created_at", value);
    assert_eq!(fragment.sql, "DATE_FORMAT(created_at, ?)");
    assert_eq!(fragment.args, vec![Value::from("%Y-%m")]);
    assert_eq!(operand, Value::from("2024-03"));

    let (fragment, operand) = PostgresDialect.date_trunc(DatePart::Day, "created_at", value);
    assert_eq!(fragment.sql, "DATE_TRUNC(?, created_at)");
    assert_eq!(fragment.args, vec![Value::from("day")]);
    assert_eq!(operand, Value::DateTime(at(2024, 3, 15, 0, 0, 0)));

    let (fragment, operand) = SqliteDialect.date_trunc(DatePart::Hour, "created_at", value);
    assert_eq!(fragment.sql, "strftime(?, created_at)");
    assert_eq!(fragment.args, vec![Value::from("%Y-%m-%d %H")]);
    assert_eq!(operand, Value::from("2024-03-15 10"));
}

#[test]
fn format_date_translates_tokens() {
    let pg = PostgresDialect.format_date("created_at", "%Y-%m");
    assert_eq!(pg.sql, "TO_CHAR(created_at, ?)");
    assert_eq!(pg.args, vec![Value::from("YYYY-MM")]);

    let sqlite = SqliteDialect.format_date("created_at", "%d/%m %H:%i");
    assert_eq!(sqlite.args, vec![Value::from("%d/%m %H:%M")]);

    let mysql = MysqlDialect.format_date("created_at", "%Y-%m");
    assert_eq!(mysql.args, vec![Value::from("%Y-%m")]);
}

#[test]
fn time_zone_conversion() {
    let mysql = MysqlDialect.convert_timezone("created_at", "Europe/Paris").unwrap();
    assert_eq!(mysql.sql, "CONVERT_TZ(created_at, 'UTC', ?)");

    let pg = PostgresDialect.convert_timezone("created_at", "Europe/Paris").unwrap();
    assert_eq!(pg.sql, "(created_at AT TIME ZONE ?)");
    assert_eq!(pg.args, vec![Value::from("Europe/Paris")]);

    let err = SqliteDialect
        .convert_timezone("created_at", "Europe/Paris")
        .unwrap_err();
    assert!(matches!(err, OrmError::Unsupported { .. }), "{err:?}");
}

#[test]
fn overlaps_default_and_postgres() {
    assert_eq!(
        MysqlDialect.overlaps("a_start", "a_end", "b_start", "b_end"),
        "(a_start <= b_end AND a_end >= b_start)"
    );
    assert_eq!(
        PostgresDialect.overlaps("a_start", "a_end", "b_start", "b_end"),
        "(a_start, a_end) OVERLAPS (b_start, b_end)"
    );
}

#[test]
fn float_casts() {
    assert_eq!(MysqlDialect.float_cast("SUM(x)"), "CAST(SUM(x) AS DOUBLE)");
    assert_eq!(
        PostgresDialect.float_cast("SUM(x)"),
        "CAST(SUM(x) AS DOUBLE PRECISION)"
    );
    assert_eq!(SqliteDialect.float_cast("SUM(x)"), "CAST(SUM(x) AS REAL)");
}
