//! Integration tests for Capstack CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use capstack::cli::{
    Cli, CliError, Commands, ScoreKind, cmd_init, cmd_profile_import, cmd_profile_show,
    cmd_score, cmd_status, load_profile_input, render_score,
};
use capstack_core::storage::Store;
use capstack_core::{FinancialProfile, ScoringTables, UserId};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a profile JSON file.
fn create_profile_json(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("profile.json");
    let content = r#"{
        "monthlyIncome": 60000,
        "monthlyExpenses": 30000,
        "emergencyFund": 180000,
        "debtAmount": 0,
        "jobStabilityScore": 8,
        "riskTolerance": "high"
    }"#;
    std::fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// INIT / STATUS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();

    let result = cmd_init(&db_path, false);
    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
}

#[test]
fn test_init_succeeds_with_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    cmd_init(&db_path, false).unwrap();
    Store::open(&db_path)
        .unwrap()
        .put_profile(UserId(1), &FinancialProfile::fallback())
        .unwrap();

    assert!(cmd_init(&db_path, true).is_ok());
    let stats = Store::open(&db_path).unwrap().stats().unwrap();
    assert_eq!(stats.profiles, 0);
}

#[test]
fn test_status_requires_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("missing.redb");

    let result = cmd_status(&db_path, false);
    assert!(matches!(result, Err(CliError::MissingDatabase(_))));

    cmd_init(&db_path, false).unwrap();
    assert!(cmd_status(&db_path, true).is_ok());
}

// =============================================================================
// PROFILE COMMANDS
// =============================================================================

#[test]
fn test_profile_import_and_show() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let file = create_profile_json(&temp);
    cmd_init(&db_path, false).unwrap();

    assert!(cmd_profile_import(&db_path, UserId(4), &file).is_ok());
    assert!(cmd_profile_show(&db_path, UserId(4), false).is_ok());
    assert!(cmd_profile_show(&db_path, UserId(5), true).is_ok());

    let stored = load_profile_input(&db_path, Some(UserId(4)), None).unwrap();
    assert_eq!(stored.monthly_income, capstack_core::Decimal::from(60_000));
    assert_eq!(stored.age, 30);
}

#[test]
fn test_profile_import_rejects_oversized_amounts() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let file = temp.path().join("huge.json");
    std::fs::write(
        &file,
        r#"{"monthlyIncome": 60000, "monthlyExpenses": 30000, "emergencyFund": 1000000000000001}"#,
    )
    .unwrap();
    cmd_init(&db_path, false).unwrap();

    let result = cmd_profile_import(&db_path, UserId(4), &file);
    assert!(matches!(result, Err(CliError::Profile(_))));
    let stats = Store::open(&db_path).unwrap().stats().unwrap();
    assert_eq!(stats.profiles, 0);
}

#[test]
fn test_profile_import_rejects_invalid_json() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    let file = temp.path().join("bad.json");
    std::fs::write(&file, "{ not json").unwrap();
    cmd_init(&db_path, false).unwrap();

    let result = cmd_profile_import(&db_path, UserId(1), &file);
    assert!(matches!(result, Err(CliError::Json(_))));
}

#[test]
fn test_profile_input_defaults() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();

    let none = load_profile_input(&db_path, None, None).unwrap();
    assert_eq!(none, FinancialProfile::fallback());

    let unknown_user = load_profile_input(&db_path, Some(UserId(77)), None).unwrap();
    assert_eq!(unknown_user, FinancialProfile::fallback());
}

// =============================================================================
// SCORE COMMAND
// =============================================================================

#[test]
fn test_render_every_kind() {
    let tables = ScoringTables::standard();
    let profile = FinancialProfile::fallback();
    for kind in [
        ScoreKind::Health,
        ScoreKind::Survival,
        ScoreKind::Income,
        ScoreKind::Allocation,
        ScoreKind::Emergency,
        ScoreKind::Insights,
    ] {
        let text = render_score(kind, &profile, &tables, false).unwrap();
        assert!(!text.is_empty());
        let json = render_score(kind, &profile, &tables, true).unwrap();
        assert!(serde_json::from_str::<Value>(&json).is_ok());
    }
}

#[test]
fn test_render_health_json() {
    let tables = ScoringTables::standard();
    let profile = FinancialProfile::fallback();
    let json = render_score(ScoreKind::Health, &profile, &tables, true).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert!(value["totalScore"].as_u64().is_some_and(|s| s <= 100));
    assert!(value["grade"].is_string());
}

#[test]
fn test_render_insights_text_is_boxed() {
    let tables = ScoringTables::standard();
    let text = render_score(ScoreKind::Insights, &FinancialProfile::fallback(), &tables, false)
        .unwrap();
    assert!(text.contains("ALERTS"));
    assert!(text.contains("INSIGHTS"));
}

#[test]
fn test_cmd_score_prints() {
    let tables = ScoringTables::standard();
    let result = cmd_score(ScoreKind::Survival, &FinancialProfile::fallback(), &tables, false);
    assert!(result.is_ok());
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_score_command() {
    let cli = Cli::try_parse_from(["capstack", "score", "income", "--user", "3", "--json"]).unwrap();
    match cli.command {
        Commands::Score {
            kind, user, json, ..
        } => {
            assert_eq!(kind, ScoreKind::Income);
            assert_eq!(user, Some(3));
            assert!(json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_rejects_user_and_profile_together() {
    let result = Cli::try_parse_from([
        "capstack", "score", "health", "--user", "1", "--profile", "p.json",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_serve_flags() {
    let cli = Cli::try_parse_from([
        "capstack",
        "--database",
        "x.redb",
        "serve",
        "--port",
        "9000",
        "--token-secret",
        "0123456789abcdef",
        "--cors-origins",
        "http://a.test,http://b.test",
    ])
    .unwrap();
    assert_eq!(cli.database, PathBuf::from("x.redb"));
    match cli.command {
        Commands::Serve(config) => {
            assert_eq!(config.port, 9000);
            assert_eq!(config.cors_origins.len(), 2);
            assert!(config.secret().is_ok());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
