//! Statement splitting and the continue-past-failure runner.

use async_trait::async_trait;
use std::sync::Mutex;
use unineeds::app::{run_migration, split_statements};
use unineeds::storage::SqlExecutor;

/// Records every statement and fails the ones containing `fail_on`.
struct RecordingExecutor {
    fail_on: &'static str,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute_sql(&self, sql: &str) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(sql.to_string());
        if sql.contains(self.fail_on) {
            anyhow::bail!("relation does not exist");
        }
        Ok(())
    }
}

#[test]
fn splits_on_top_level_semicolons() {
    let statements = split_statements("CREATE TABLE a (id int);\nINSERT INTO a VALUES (1);  \n\n SELECT 1");
    assert_eq!(
        statements,
        vec!["CREATE TABLE a (id int)", "INSERT INTO a VALUES (1)", "SELECT 1"]
    );
}

#[test]
fn semicolons_in_strings_and_identifiers_do_not_split() {
    let statements = split_statements(
        "INSERT INTO notes (body) VALUES ('a;b', 'it''s; fine');\nSELECT \"odd;name\" FROM t;",
    );
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0], "INSERT INTO notes (body) VALUES ('a;b', 'it''s; fine')");
    assert_eq!(statements[1], "SELECT \"odd;name\" FROM t");
}

#[test]
fn backslash_escapes_only_apply_to_e_strings() {
    let statements = split_statements(
        "INSERT INTO t VALUES (E'it\\'s; fine'); SELECT 1;\nINSERT INTO t VALUES (e'a\\\\;b', 'c\\');\nSELECT 2",
    );
    assert_eq!(
        statements,
        vec![
            "INSERT INTO t VALUES (E'it\\'s; fine')",
            "SELECT 1",
            "INSERT INTO t VALUES (e'a\\\\;b', 'c\\')",
            "SELECT 2",
        ]
    );

    // An identifier ending in e does not make the following literal an E-string.
    let statements = split_statements("SELECT type'x\\'; SELECT 3");
    assert_eq!(statements, vec!["SELECT type'x\\'", "SELECT 3"]);
}

#[test]
fn dollar_quoted_bodies_stay_whole() {
    let sql = "CREATE FUNCTION f() RETURNS trigger AS $$\nBEGIN\n  PERFORM 1;\n  RETURN NULL;\nEND;\n$$ LANGUAGE plpgsql;\n\
               DO $body$ BEGIN RAISE NOTICE 'x;y'; END $body$;\nSELECT $1";
    let statements = split_statements(sql);
    assert_eq!(statements.len(), 3);
    assert!(statements[0].starts_with("CREATE FUNCTION f()"));
    assert!(statements[0].ends_with("LANGUAGE plpgsql"));
    assert!(statements[1].starts_with("DO $body$"));
    assert_eq!(statements[2], "SELECT $1");
}

#[test]
fn comment_only_fragments_are_dropped() {
    let sql = "-- header; with a semicolon\n/* block; comment */\nCREATE TABLE a (id int); -- trailing\n/* nested /* ; */ still */;";
    let statements = split_statements(sql);
    assert_eq!(statements.len(), 1);
    assert!(statements[0].ends_with("CREATE TABLE a (id int)"));
    assert!(split_statements("  \n -- nothing here\n").is_empty());
}

#[tokio::test]
async fn failing_statement_does_not_stop_later_ones() {
    let executor = RecordingExecutor {
        fail_on: "missing_table",
        seen: Mutex::new(Vec::new()),
    };
    let sql = "CREATE TABLE a (id int);\nINSERT INTO missing_table VALUES (1);\nINSERT INTO a VALUES (2);";

    let report = run_migration(&executor, sql).await;

    assert_eq!(report.applied, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 2);
    assert!(report.failed[0].error.contains("does not exist"));
    assert_eq!(report.total(), 3);
    assert!(!report.is_clean());
    assert_eq!(executor.seen.lock().unwrap().len(), 3);
}

#[test]
fn shipped_migration_splits_cleanly() {
    let sql = include_str!("../migrations/20260101000000_marketplace.sql");
    let statements = split_statements(sql);
    assert!(statements.iter().any(|s| s.starts_with("CREATE OR REPLACE FUNCTION notify_row_change()")));
    assert_eq!(
        statements
            .iter()
            .filter(|s| s.contains("CREATE TABLE IF NOT EXISTS"))
            .count(),
        9
    );
    assert_eq!(
        statements
            .iter()
            .filter(|s| s.starts_with("CREATE TRIGGER"))
            .count(),
        7
    );
}
