//! Store, migration, and audit validation tests for gift-ledger-config.
// crates/gift-ledger-config/tests/store_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Boundary and cross-field checks for each config section.
// Purpose: Ensure invalid combinations are rejected before anything opens.
// =============================================================================

use std::path::PathBuf;

use gift_ledger_config::ConfigError;
use gift_ledger_config::LedgerConfig;
use gift_ledger_config::MAX_BATCH_SIZE;
use gift_ledger_config::StoreType;
use tempfile::TempDir;

type TestResult = Result<(), String>;

/// Assert that a validation result is an error containing a specific substring.
fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

fn sqlite_config(path: &str) -> LedgerConfig {
    let mut config = LedgerConfig::default();
    config.store.store_type = StoreType::Sqlite;
    config.store.path = Some(PathBuf::from(path));
    config
}

// ============================================================================
// SECTION: Store
// ============================================================================

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = LedgerConfig::default();
    config.store.path = Some(PathBuf::from("ledger.sqlite"));
    assert_invalid(config.validate(), "memory store must not set path")?;
    Ok(())
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = LedgerConfig::default();
    config.store.store_type = StoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")?;
    Ok(())
}

#[test]
fn sqlite_store_rejects_blank_path() -> TestResult {
    assert_invalid(sqlite_config("  ").validate(), "store.path must be non-empty")?;
    Ok(())
}

#[test]
fn sqlite_store_rejects_excessive_busy_timeout() -> TestResult {
    let mut config = sqlite_config("ledger.sqlite");
    config.store.busy_timeout_ms = 600_001;
    assert_invalid(config.validate(), "busy_timeout_ms must be at most")?;
    Ok(())
}

#[test]
fn sqlite_store_builds_store_config() -> TestResult {
    let config = sqlite_config("data/ledger.sqlite");
    config.validate().map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite().ok_or("expected sqlite config")?;
    if sqlite.path != PathBuf::from("data/ledger.sqlite") {
        return Err("path not carried over".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Migrations
// ============================================================================

#[test]
fn batch_size_zero_rejected() -> TestResult {
    let mut config = LedgerConfig::default();
    config.migrations.batch_size = 0;
    assert_invalid(config.validate(), "migrations.batch_size must be between")?;
    Ok(())
}

#[test]
fn batch_size_at_minimum_accepted() -> TestResult {
    let mut config = LedgerConfig::default();
    config.migrations.batch_size = 1;
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn batch_size_at_maximum_accepted() -> TestResult {
    let mut config = LedgerConfig::default();
    config.migrations.batch_size = MAX_BATCH_SIZE;
    config.validate().map_err(|err| err.to_string())?;
    let migrator = config.batch_migrator().map_err(|err| err.to_string())?;
    if migrator.batch_size() != MAX_BATCH_SIZE {
        return Err("migrator did not take configured batch size".to_string());
    }
    Ok(())
}

#[test]
fn batch_size_above_maximum_rejected() -> TestResult {
    let mut config = LedgerConfig::default();
    config.migrations.batch_size = MAX_BATCH_SIZE + 1;
    assert_invalid(config.validate(), "migrations.batch_size must be between")?;
    Ok(())
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[test]
fn audit_path_rejects_overlong_component() -> TestResult {
    let mut config = LedgerConfig::default();
    config.audit.enabled = true;
    config.audit.path = Some(PathBuf::from("a".repeat(256)));
    assert_invalid(config.validate(), "audit.path path component too long")?;
    Ok(())
}

#[test]
fn enabled_audit_file_is_created_by_sink() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("audit.jsonl");
    let mut config = LedgerConfig::default();
    config.audit.enabled = true;
    config.audit.path = Some(path.clone());
    config.validate().map_err(|err| err.to_string())?;
    config.audit.sink().map_err(|err| err.to_string())?;
    if !path.exists() {
        return Err("audit file was not created".to_string());
    }
    Ok(())
}

#[test]
fn enabled_audit_file_in_missing_directory_fails() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let mut config = LedgerConfig::default();
    config.audit.enabled = true;
    config.audit.path = Some(dir.path().join("missing").join("audit.jsonl"));
    match config.audit.sink() {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected io error".to_string()),
    }
}
