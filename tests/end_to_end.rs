//! End-to-end tests through the umbrella crate.
//!
//! These walk a project through its life: create files, apply them, change
//! the directory, and reconcile again against a file-backed database.

use std::fs;

use pretty_assertions::assert_eq;
use rewind::migrate::{IdStrategy, MigrationFileManager};
use rewind::prelude::*;
use tempfile::TempDir;

fn fill(path: &std::path::Path, up: &str, down: &str) {
    fs::write(path, format!("-- migrate: up\n{}\n-- migrate: down\n{}\n", up, down))
        .expect("Failed to write migration");
}

async fn tables(engine: &SqliteEngine) -> Vec<String> {
    engine
        .call(|c| {
            let mut stmt = c.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .expect("Failed to list tables")
}

/// Test the user/product scenario from an empty database
#[tokio::test]
async fn test_project_lifecycle() {
    let project = TempDir::new().unwrap();
    let dir = project.path().join("migrations");
    let files = MigrationFileManager::new(&dir);

    let user = files.create("create user", IdStrategy::Sequential).unwrap();
    fill(&user, "CREATE TABLE user (id INTEGER PRIMARY KEY, email TEXT NOT NULL);", "DROP TABLE user;");
    let product = files.create("create product", IdStrategy::Sequential).unwrap();
    fill(&product, "CREATE TABLE product (id INTEGER PRIMARY KEY);", "DROP TABLE product;");

    assert_eq!(
        user.file_name().unwrap().to_str().unwrap(),
        "001_create_user.sql"
    );

    let config = SqliteConfig::file(project.path().join("app.db"));
    let migrator = Migrator::new(MigratorConfig::new().migrations_dir(&dir)).unwrap();

    let engine = SqliteEngine::open(config.clone()).await.unwrap();
    let report = engine.migrate(&migrator).await.unwrap();
    assert_eq!(report.applied, vec![1, 2]);
    assert_eq!(tables(&engine).await, vec!["__migration", "product", "user"]);
    engine.close().await.unwrap();

    // Reopen: nothing to do.
    let engine = SqliteEngine::open(config.clone()).await.unwrap();
    let status = engine.status(&migrator).await.unwrap();
    assert!(status.is_up_to_date());
    assert_eq!(status.applied.len(), 2);
    assert!(status.applied.iter().all(|m| m.applied_at.is_some()));

    // Replace the product migration with a newer one.
    let order = files.create("create order", IdStrategy::Sequential).unwrap();
    fill(&order, "CREATE TABLE \"order\" (id INTEGER PRIMARY KEY);", "DROP TABLE \"order\";");
    fs::remove_file(&product).unwrap();

    let plan = engine.plan(&migrator).await.unwrap();
    assert_eq!(plan.revert.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2]);
    assert_eq!(plan.apply.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3]);

    let report = engine.migrate(&migrator).await.unwrap();
    assert_eq!(report.reverted, vec![2]);
    assert_eq!(report.applied, vec![3]);
    assert_eq!(tables(&engine).await, vec!["__migration", "order", "user"]);
    engine.close().await.unwrap();
}

/// Test that a failure leaves a file-backed database exactly as it was
#[tokio::test]
async fn test_failure_is_atomic_across_reopen() {
    let project = TempDir::new().unwrap();
    let dir = project.path().join("migrations");
    fs::create_dir_all(&dir).unwrap();
    fill(&dir.join("1_a.sql"), "CREATE TABLE a (id INTEGER);", "DROP TABLE a;");
    fill(&dir.join("2_b.sql"), "CREATE TABLE b (id INTEGER);", "DROP TABLE b;");
    fill(&dir.join("3_c.sql"), "CREATE TABLE a (id INTEGER);", "SELECT 1;");

    let config = SqliteConfig::file(project.path().join("app.db"));
    let migrator = Migrator::new(MigratorConfig::new().migrations_dir(&dir)).unwrap();

    let engine = SqliteEngine::open(config.clone()).await.unwrap();
    let err = engine.migrate(&migrator).await.unwrap_err();
    let id = err.as_migration().and_then(MigrationError::migration_id);
    assert_eq!(id, Some(3));
    engine.close().await.unwrap();

    let engine = SqliteEngine::open(config).await.unwrap();
    assert!(tables(&engine).await.is_empty());
}
