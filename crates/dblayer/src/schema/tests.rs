use super::*;
use crate::dialect::{Driver, MysqlDialect, PostgresDialect, SqliteDialect};
use crate::executor::{Conn, Target};

fn users() -> Schema {
    let mut t = Schema::create("users");
    t.id();
    t.string("email", 255).unique();
    t.integer("age").nullable().default(18);
    t.timestamps();
    t
}

fn detached(driver: Driver) -> Conn<'static> {
    Conn::new(Target::Detached, driver.dialect())
}

// ==================== CREATE TABLE ====================

#[test]
fn mysql_create_table_with_options() {
    let sql = users().to_statements(&MysqlDialect).unwrap();
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE users (id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             email VARCHAR(255) NOT NULL UNIQUE, age INT NULL DEFAULT 18, \
             created_at TIMESTAMP NULL, updated_at TIMESTAMP NULL) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci"
                .to_string()
        ]
    );
}

#[test]
fn postgres_create_table_uses_serial_and_timestamptz() {
    let sql = users().to_statements(&PostgresDialect).unwrap();
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE users (id BIGSERIAL NOT NULL PRIMARY KEY, \
             email VARCHAR(255) NOT NULL UNIQUE, age INTEGER NULL DEFAULT 18, \
             created_at TIMESTAMPTZ NULL, updated_at TIMESTAMPTZ NULL)"
                .to_string()
        ]
    );
}

#[test]
fn sqlite_create_table_spells_autoincrement_key() {
    let sql = users().to_statements(&SqliteDialect).unwrap();
    assert_eq!(
        sql[0],
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         email VARCHAR(255) NOT NULL UNIQUE, age INTEGER NULL DEFAULT 18, \
         created_at DATETIME NULL, updated_at DATETIME NULL)"
    );
}

#[test]
fn create_without_columns_is_rejected() {
    let err = Schema::create("empty").to_statements(&MysqlDialect).unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)), "{err:?}");
}

#[test]
fn temporary_and_if_not_exists_prefix() {
    let mut t = Schema::create("scratch");
    t.temporary().if_not_exists();
    t.text("note");
    let sql = t.to_statements(&PostgresDialect).unwrap();
    assert_eq!(
        sql[0],
        "CREATE TEMPORARY TABLE IF NOT EXISTS scratch (note TEXT NOT NULL)"
    );
}

#[test]
fn indexes_inline_on_mysql_and_trailing_elsewhere() {
    let mut t = Schema::create("posts");
    t.id();
    t.text("body");
    t.string("slug", 120);
    t.index("posts_slug_idx", ["slug"]);
    t.full_text("posts_body_ft", ["body"]);

    let mysql = t.to_statements(&MysqlDialect).unwrap();
    assert_eq!(mysql.len(), 1);
    assert!(mysql[0].contains(", INDEX posts_slug_idx (slug)"), "{}", mysql[0]);
    assert!(mysql[0].contains(", FULLTEXT INDEX posts_body_ft (body)"), "{}", mysql[0]);

    // Full-text is skipped on PostgreSQL.
    let pg = t.to_statements(&PostgresDialect).unwrap();
    assert_eq!(pg.len(), 2);
    assert_eq!(pg[1], "CREATE INDEX posts_slug_idx ON posts (slug)");
}

#[test]
fn unique_index_name_is_generated() {
    let mut t = Schema::create("users");
    t.string("email", 255);
    t.unique_index(["email"]);
    let sql = t.to_statements(&SqliteDialect).unwrap();
    assert_eq!(sql[1], "CREATE UNIQUE INDEX users_email_unique ON users (email)");
}

#[test]
fn foreign_key_with_actions() {
    let mut t = Schema::create("members");
    t.big_integer("team_id").unsigned();
    t.foreign_key("team_id", "teams", "id")
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::SetNull);
    let sql = t.to_statements(&MysqlDialect).unwrap();
    assert!(
        sql[0].contains(
            "CONSTRAINT fk_members_team_id FOREIGN KEY (team_id) REFERENCES teams (id) \
             ON DELETE CASCADE ON UPDATE SET NULL"
        ),
        "{}",
        sql[0]
    );
}

#[test]
fn composite_primary_key_and_unique_key() {
    let mut t = Schema::create("role_user");
    t.big_integer("role_id");
    t.big_integer("user_id");
    t.primary_key(["role_id", "user_id"]);
    t.unique_key("role_user_unique", ["user_id", "role_id"]);
    let sql = t.to_statements(&PostgresDialect).unwrap();
    assert!(sql[0].contains("PRIMARY KEY (role_id, user_id)"), "{}", sql[0]);
    assert!(
        sql[0].contains("CONSTRAINT role_user_unique UNIQUE (user_id, role_id)"),
        "{}",
        sql[0]
    );
}

#[test]
fn enumeration_per_dialect() {
    let mut t = Schema::create("accounts");
    t.enumeration("status", ["active", "banned"]);

    let mysql = t.to_statements(&MysqlDialect).unwrap();
    assert!(mysql[0].contains("status ENUM('active', 'banned') NOT NULL"), "{}", mysql[0]);

    let pg = t.to_statements(&PostgresDialect).unwrap();
    assert!(
        pg[0].contains("status VARCHAR(255) NOT NULL CHECK (status IN ('active', 'banned'))"),
        "{}",
        pg[0]
    );
}

#[test]
fn column_definitions_share_one_layout() {
    let mut t = Schema::create("accounts");
    t.enumeration("status", ["active", "banned"]).nullable().default("active");
    t.string("nick", 32).unique().comment("it's shown");

    let sqlite = t.to_statements(&SqliteDialect).unwrap();
    assert!(
        sqlite[0].contains("status TEXT NULL DEFAULT 'active' CHECK (status IN ('active', 'banned'))"),
        "{}",
        sqlite[0]
    );
    let pg = t.to_statements(&PostgresDialect).unwrap();
    assert!(
        pg[0].contains("status VARCHAR(255) NULL DEFAULT 'active' CHECK (status IN ('active', 'banned'))"),
        "{}",
        pg[0]
    );
    assert!(pg[0].contains("nick VARCHAR(32) NOT NULL UNIQUE"), "{}", pg[0]);
    assert!(!pg[0].contains("COMMENT '"), "{}", pg[0]);

    let mysql = t.to_statements(&MysqlDialect).unwrap();
    assert!(!mysql[0].contains("CHECK"), "{}", mysql[0]);
    assert!(
        mysql[0].contains("nick VARCHAR(32) NOT NULL UNIQUE COMMENT 'it''s shown'"),
        "{}",
        mysql[0]
    );
}

#[test]
fn composite_helpers_add_expected_columns() {
    let mut t = Schema::create("comments");
    t.morphs("commentable");
    t.audit();

    let names: Vec<&str> = t.columns().iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        vec![
            "commentable_id",
            "commentable_type",
            "created_by",
            "updated_by",
            "deleted_by",
            "created_at",
            "updated_at",
            "deleted_at",
        ]
    );
    assert_eq!(t.indexes().len(), 1);
    assert_eq!(t.indexes()[0].name, "commentable_index");
}

#[test]
fn postgres_comments_become_statements() {
    let mut t = Schema::create("users");
    t.comment("people");
    t.string("name", 100).comment("display name");
    let sql = t.to_statements(&PostgresDialect).unwrap();
    assert_eq!(sql[1], "COMMENT ON TABLE users IS 'people'");
    assert_eq!(sql[2], "COMMENT ON COLUMN users.name IS 'display name'");
}

// ==================== ALTER TABLE ====================

fn alter_users() -> Schema {
    let mut t = Schema::alter("users");
    t.string("nickname", 64).nullable().after("email");
    t.drop_column("age");
    t.rename_column("email", "email_address");
    t
}

#[test]
fn mysql_folds_alter_into_one_statement() {
    let sql = alter_users().to_statements(&MysqlDialect).unwrap();
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE users ADD COLUMN nickname VARCHAR(64) NULL AFTER email, \
             DROP COLUMN age, RENAME COLUMN email TO email_address"
                .to_string()
        ]
    );
}

#[test]
fn postgres_groups_compatible_alter_fragments() {
    let sql = alter_users().to_statements(&PostgresDialect).unwrap();
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE users ADD COLUMN nickname VARCHAR(64) NULL, DROP COLUMN age".to_string(),
            "ALTER TABLE users RENAME COLUMN email TO email_address".to_string(),
        ]
    );
}

#[test]
fn sqlite_issues_one_statement_per_alter() {
    let sql = alter_users().to_statements(&SqliteDialect).unwrap();
    assert_eq!(sql.len(), 3);
    assert_eq!(sql[1], "ALTER TABLE users DROP COLUMN age");
}

#[test]
fn modify_column_per_dialect() {
    let mut t = Schema::alter("users");
    t.modify_column("age", ColumnType::BigInteger).nullable();

    let mysql = t.to_statements(&MysqlDialect).unwrap();
    assert_eq!(mysql[0], "ALTER TABLE users MODIFY COLUMN age BIGINT NULL");

    let pg = t.to_statements(&PostgresDialect).unwrap();
    assert_eq!(
        pg[0],
        "ALTER TABLE users ALTER COLUMN age TYPE BIGINT, ALTER COLUMN age DROP NOT NULL"
    );

    let err = t.to_statements(&SqliteDialect).unwrap_err();
    assert!(matches!(err, OrmError::Unsupported { dialect: "sqlite", .. }), "{err:?}");
}

#[test]
fn engine_and_charset_changes() {
    let mut t = Schema::alter("logs");
    t.change_engine("MyISAM");
    t.change_charset("latin1", Some("latin1_swedish_ci"));

    let mysql = t.to_statements(&MysqlDialect).unwrap();
    assert_eq!(
        mysql[0],
        "ALTER TABLE logs ENGINE=MyISAM, CONVERT TO CHARACTER SET latin1 COLLATE latin1_swedish_ci"
    );

    // Nothing to run on PostgreSQL; both options are skipped.
    assert!(t.to_statements(&PostgresDialect).unwrap().is_empty());
}

#[test]
fn index_operations_while_altering() {
    let mut t = Schema::alter("users");
    t.add_index("users_name_idx", ["name"], false);
    t.drop_index("users_old_idx");
    t.rename_table("people");

    assert_eq!(
        t.to_statements(&MysqlDialect).unwrap(),
        vec![
            "ALTER TABLE users ADD INDEX users_name_idx (name), DROP INDEX users_old_idx, RENAME TO people"
                .to_string()
        ]
    );
    assert_eq!(
        t.to_statements(&PostgresDialect).unwrap(),
        vec![
            "CREATE INDEX users_name_idx ON users (name)".to_string(),
            "DROP INDEX users_old_idx".to_string(),
            "ALTER TABLE users RENAME TO people".to_string(),
        ]
    );
}

// ==================== DROP / TRUNCATE ====================

#[test]
fn drop_tables_per_dialect() {
    let tables = vec!["a".to_string(), "b".to_string()];

    let pg = DropTables::new(detached(Driver::Postgres), tables.clone())
        .if_exists()
        .cascade();
    assert_eq!(pg.to_statements(), vec!["DROP TABLE IF EXISTS a, b CASCADE"]);

    let sqlite = DropTables::new(detached(Driver::Sqlite), tables).if_exists();
    assert_eq!(
        sqlite.to_statements(),
        vec!["DROP TABLE IF EXISTS a", "DROP TABLE IF EXISTS b"]
    );
}

#[test]
fn truncate_per_dialect() {
    let tables = vec!["users".to_string()];

    let pg = TruncateTables::new(detached(Driver::Postgres), tables.clone()).restart_identity();
    assert_eq!(pg.to_statements(), vec!["TRUNCATE TABLE users RESTART IDENTITY"]);

    let mysql = TruncateTables::new(detached(Driver::MySql), tables.clone()).cascade();
    assert_eq!(mysql.to_statements(), vec!["TRUNCATE TABLE users"]);

    let sqlite = TruncateTables::new(detached(Driver::Sqlite), tables).restart_identity();
    assert_eq!(
        sqlite.to_statements(),
        vec![
            "DELETE FROM users",
            "DELETE FROM sqlite_sequence WHERE name IN ('users')",
        ]
    );
}

#[tokio::test]
async fn empty_drop_is_rejected_before_dispatch() {
    let err = DropTables::new(detached(Driver::MySql), Vec::new())
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)), "{err:?}");
}
