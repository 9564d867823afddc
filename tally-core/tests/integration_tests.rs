//! Integration tests for tally-core
//!
//! These tests verify the ledger engine end to end using real DuckDB.
//! Each test gets its own temp directory, so databases never interfere.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use tally_core::{Error, LedgerContext, TransactionFilter, TransactionKind};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a context with fast hashing parameters so tests don't pay the
/// production Argon2 cost on every login.
fn create_test_context(temp_dir: &TempDir) -> LedgerContext {
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{"hashing": {"timeCost": 1, "memoryCost": 8, "parallelism": 1}}"#,
    )
    .expect("Failed to write settings");
    LedgerContext::new(temp_dir.path()).expect("Failed to create context")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// Registration and Authentication
// ============================================================================

#[test]
fn test_register_login_logout() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    ctx.register("alice", "p@ss1").unwrap();

    let token = ctx.login("alice", "p@ss1").unwrap();
    assert!(ctx.list(token, None).unwrap().is_empty());

    ctx.logout(token);
    assert!(matches!(
        ctx.list(token, None),
        Err(Error::NotAuthenticated)
    ));
}

#[test]
fn test_duplicate_registration_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    ctx.register("alice", "p@ss1").unwrap();
    assert!(matches!(
        ctx.register("alice", "different"),
        Err(Error::DuplicateUsername)
    ));

    // Original credentials still work, the second attempt's never took
    assert!(ctx.login("alice", "p@ss1").is_ok());
    assert!(matches!(
        ctx.login("alice", "different"),
        Err(Error::AuthenticationFailed)
    ));
}

#[test]
fn test_register_returns_no_credential_material() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let account = ctx.register("alice", "p@ss1").unwrap();
    assert!(account.password_hash.is_empty());

    // The stored hash is untouched; credentials still verify
    assert!(ctx.login("alice", "p@ss1").is_ok());
}

#[test]
fn test_login_failures_are_indistinguishable() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();

    let bad_password = ctx.login("alice", "wrong").unwrap_err();
    let bad_username = ctx.login("bob", "p@ss1").unwrap_err();
    assert_eq!(bad_password.to_string(), bad_username.to_string());
}

#[test]
fn test_accounts_survive_reopening() {
    let temp_dir = TempDir::new().unwrap();
    {
        let ctx = create_test_context(&temp_dir);
        ctx.register("alice", "p@ss1").unwrap();
        let token = ctx.login("alice", "p@ss1").unwrap();
        ctx.append(token, date(2024, 1, 1), "Food", dec(2000), TransactionKind::Expense, "")
            .unwrap();
    }

    // Fresh context over the same data directory
    let ctx = create_test_context(&temp_dir);
    let token = ctx.login("alice", "p@ss1").unwrap();
    assert_eq!(ctx.current_balance(token).unwrap(), dec(-2000));
    assert_eq!(ctx.list(token, None).unwrap().len(), 1);
}

// ============================================================================
// Ledger Operations
// ============================================================================

#[test]
fn test_append_assigns_unique_increasing_ids() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    for i in 1..=5i64 {
        let tx = ctx
            .append(token, date(2024, 1, i as u32), "Food", dec(100), TransactionKind::Expense, "")
            .unwrap();
        assert_eq!(tx.seq, i);
    }
}

#[test]
fn test_round_trip_preserves_all_fields() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    let appended = ctx
        .append(
            token,
            date(2024, 6, 15),
            "Entertainment",
            dec(1250),
            TransactionKind::Expense,
            "cinema tickets",
        )
        .unwrap();

    let listed = ctx.list(token, None).unwrap();
    assert_eq!(listed.len(), 1);
    let stored = &listed[0];
    assert_eq!(stored.seq, appended.seq);
    assert_eq!(stored.date, date(2024, 6, 15));
    assert_eq!(stored.category, "Entertainment");
    assert_eq!(stored.amount, dec(1250));
    assert_eq!(stored.kind, TransactionKind::Expense);
    assert_eq!(stored.description, "cinema tickets");
}

#[test]
fn test_validation_boundaries() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    // Zero amount is fine and contributes zero
    ctx.append(token, date(2024, 1, 1), "Other", Decimal::ZERO, TransactionKind::Expense, "")
        .unwrap();
    assert_eq!(ctx.current_balance(token).unwrap(), Decimal::ZERO);

    // Negative amount is a validation rejection
    assert!(matches!(
        ctx.append(token, date(2024, 1, 1), "Other", dec(-1), TransactionKind::Expense, ""),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_list_filter_by_date_and_kind() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    ctx.append(token, date(2024, 1, 1), "Food", dec(2000), TransactionKind::Expense, "")
        .unwrap();
    ctx.append(token, date(2024, 1, 15), "Salary", dec(100000), TransactionKind::Income, "")
        .unwrap();
    ctx.append(token, date(2024, 2, 1), "Food", dec(3000), TransactionKind::Expense, "")
        .unwrap();

    let january_expenses = TransactionFilter {
        from_date: Some(date(2024, 1, 1)),
        to_date: Some(date(2024, 1, 31)),
        kind: Some(TransactionKind::Expense),
        ..Default::default()
    };
    let listed = ctx.list(token, Some(&january_expenses)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].date, date(2024, 1, 1));
}

// ============================================================================
// Derived Balances and Aggregates
// ============================================================================

/// The canonical scenario: alice spends 20.00 on food, earns 1000.00
#[test]
fn test_alice_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    ctx.append(token, date(2024, 1, 1), "Food", dec(2000), TransactionKind::Expense, "")
        .unwrap();
    ctx.append(token, date(2024, 1, 2), "Salary", dec(100000), TransactionKind::Income, "")
        .unwrap();

    // currentBalance = 980.00
    assert_eq!(ctx.current_balance(token).unwrap(), dec(98000));

    // byCategory = {Food: -20.00, Salary: 1000.00}
    let mut expected = BTreeMap::new();
    expected.insert("Food".to_string(), dec(-2000));
    expected.insert("Salary".to_string(), dec(100000));
    assert_eq!(ctx.by_category(token).unwrap(), expected);

    // timeSeries = [(2024-01-01, absent, 20.00), (2024-01-02, 1000.00, absent)]
    let series = ctx.time_series(token).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, date(2024, 1, 1));
    assert_eq!(series[0].income, None);
    assert_eq!(series[0].expense, Some(dec(2000)));
    assert_eq!(series[1].date, date(2024, 1, 2));
    assert_eq!(series[1].income, Some(dec(100000)));
    assert_eq!(series[1].expense, None);
}

#[test]
fn test_balance_is_exact_over_many_entries() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    // 0.10 three hundred times: a float fold would already have drifted
    for i in 0..300u32 {
        ctx.append(
            token,
            date(2024, 1, 1 + (i % 28)),
            "Other",
            dec(10),
            TransactionKind::Income,
            "",
        )
        .unwrap();
    }
    assert_eq!(ctx.current_balance(token).unwrap(), dec(3000)); // exactly 30.00
}

#[test]
fn test_half_cent_amounts_round_trip_consistently() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    // 10.005 rounds half away from zero to 10.01; the record returned by
    // append, the record read back, and the derived balance all agree
    let appended = ctx
        .append(
            token,
            date(2024, 1, 1),
            "Food",
            Decimal::new(10005, 3),
            TransactionKind::Income,
            "",
        )
        .unwrap();
    assert_eq!(appended.amount, dec(1001));

    let listed = ctx.list(token, None).unwrap();
    assert_eq!(listed[0].amount, appended.amount);
    assert_eq!(ctx.current_balance(token).unwrap(), dec(1001));
}

#[test]
fn test_two_accounts_never_mix() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    ctx.register("bob", "hunter2").unwrap();

    let alice = ctx.login("alice", "p@ss1").unwrap();
    let bob = ctx.login("bob", "hunter2").unwrap();

    // Interleave appends across the two ledgers
    ctx.append(alice, date(2024, 1, 1), "Salary", dec(50000), TransactionKind::Income, "")
        .unwrap();
    ctx.append(bob, date(2024, 1, 1), "Food", dec(1000), TransactionKind::Expense, "")
        .unwrap();
    ctx.append(alice, date(2024, 1, 2), "Food", dec(2500), TransactionKind::Expense, "")
        .unwrap();
    ctx.append(bob, date(2024, 1, 2), "Salary", dec(70000), TransactionKind::Income, "")
        .unwrap();

    assert_eq!(ctx.current_balance(alice).unwrap(), dec(47500));
    assert_eq!(ctx.current_balance(bob).unwrap(), dec(69000));

    // Each ledger's sequence starts at 1 independently
    assert_eq!(ctx.list(alice, None).unwrap()[0].seq, 1);
    assert_eq!(ctx.list(bob, None).unwrap()[0].seq, 1);
}

#[test]
fn test_reads_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let token = ctx.login("alice", "p@ss1").unwrap();

    ctx.append(token, date(2024, 1, 1), "Food", dec(2000), TransactionKind::Expense, "")
        .unwrap();

    assert_eq!(ctx.list(token, None).unwrap(), ctx.list(token, None).unwrap());
    assert_eq!(
        ctx.current_balance(token).unwrap(),
        ctx.current_balance(token).unwrap()
    );
}

// ============================================================================
// Event Log
// ============================================================================

#[test]
fn test_auth_failures_are_logged_without_user_data() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.register("alice", "p@ss1").unwrap();
    let _ = ctx.login("alice", "wrong");

    let entries = ctx.logging_service.recent(10).unwrap();
    let failure = entries
        .iter()
        .find(|e| e.event == "login_failed")
        .expect("login failure should be logged");
    assert_eq!(failure.error_kind.as_deref(), Some("authentication_failed"));
    // Privacy contract: no username, no password
    assert!(!format!("{:?}", failure).contains("alice"));
    assert!(!format!("{:?}", failure).contains("wrong"));
}
