use std::sync::Mutex;

use ragwire_surrealdb::{SurrealAuth, SurrealConfig};

/// Tests in this file mutate the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 6] = [
    "SURREALDB_URL",
    "SURREALDB_NS",
    "SURREALDB_DB",
    "SURREALDB_TABLE",
    "SURREALDB_USER",
    "SURREALDB_PASS",
];

fn clear() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn from_env_defaults() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();

    let config = SurrealConfig::from_env();
    assert_eq!(config.url, "http://localhost:8000");
    assert_eq!(config.namespace, "ns");
    assert_eq!(config.database, "db");
    assert_eq!(config.table, "documents");
    assert_eq!(config.auth, SurrealAuth::None);
    assert!(config.dimension.is_none());
}

#[test]
fn from_env_reads_every_variable() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();
    std::env::set_var("SURREALDB_URL", "https://db.example.com");
    std::env::set_var("SURREALDB_NS", "prod");
    std::env::set_var("SURREALDB_DB", "rag");
    std::env::set_var("SURREALDB_TABLE", "chunks");
    std::env::set_var("SURREALDB_USER", "root");
    std::env::set_var("SURREALDB_PASS", "secret");

    let config = SurrealConfig::from_env();
    clear();

    assert_eq!(config.url, "https://db.example.com");
    assert_eq!(config.namespace, "prod");
    assert_eq!(config.database, "rag");
    assert_eq!(config.table, "chunks");
    assert_eq!(
        config.auth,
        SurrealAuth::Basic {
            username: "root".to_string(),
            password: "secret".to_string(),
        }
    );
}

#[test]
fn from_env_needs_user_and_password_together() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();
    std::env::set_var("SURREALDB_USER", "root");

    let config = SurrealConfig::from_env();
    clear();

    assert_eq!(config.auth, SurrealAuth::None);
}
