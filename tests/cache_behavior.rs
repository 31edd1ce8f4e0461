//! Integration tests for the caching and reconciliation behavior that does
//! not need a database: the staleness policy, freshness labels, and the
//! assignable-user reconciliation planner.

use chrono::{DateTime, Duration, Utc};

use issuedeck_lib::config::ReconcileMode;
use issuedeck_lib::services::freshness::{FreshnessPolicy, freshness_in_words};
use issuedeck_lib::services::github::AssignableUser;
use issuedeck_lib::services::sync::{CachedAssignable, plan_assignable_users};

fn now() -> DateTime<Utc> {
    "2026-06-15T09:30:00Z".parse().unwrap()
}

fn fetched(login: &str) -> AssignableUser {
    AssignableUser {
        login: Some(login.to_string()),
        avatar_url: Some(format!("https://avatars.example.com/{}.png", login)),
    }
}

fn cached(login: &str) -> CachedAssignable {
    CachedAssignable {
        login: login.to_string(),
        avatar_url: None,
    }
}

#[test]
fn default_policy_uses_five_minute_window() {
    let policy = FreshnessPolicy::default();

    assert!(!policy.is_stale(Some(now() - Duration::seconds(300)), now()));
    assert!(policy.is_stale(Some(now() - Duration::seconds(301)), now()));
    assert!(policy.is_stale(None, now()));
}

#[test]
fn freshness_labels_match_policy_boundaries() {
    // A row the policy considers fresh still shows its true age.
    assert_eq!(
        freshness_in_words(Some(now() - Duration::seconds(299)), now()),
        "4 minutes ago"
    );
    assert_eq!(freshness_in_words(None, now()), "Never synced");
}

#[test]
fn additive_reconciliation_never_deletes() {
    let existing = vec![cached("departed-maintainer"), cached("alice")];
    let response = vec![fetched("alice"), fetched("bob")];

    let plan = plan_assignable_users(&existing, &response, ReconcileMode::Additive);

    assert!(plan.deletes.is_empty());
    let logins: Vec<&str> = plan.upserts.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(logins, vec!["alice", "bob"]);
}

#[test]
fn replace_reconciliation_removes_departed_logins() {
    let existing = vec![cached("departed-maintainer"), cached("alice")];
    let response = vec![fetched("alice"), fetched("bob")];

    let plan = plan_assignable_users(&existing, &response, ReconcileMode::Replace);

    assert_eq!(plan.deletes, vec!["departed-maintainer".to_string()]);
}

#[test]
fn deleted_accounts_are_never_persisted() {
    let response = vec![
        AssignableUser {
            login: None,
            avatar_url: None,
        },
        AssignableUser {
            login: Some("  ".to_string()),
            avatar_url: None,
        },
        fetched("alice"),
    ];

    let plan = plan_assignable_users(&[], &response, ReconcileMode::Replace);

    assert_eq!(plan.upserts.len(), 1);
    assert_eq!(plan.skipped_blank, 2);
}

#[test]
fn planning_same_response_twice_changes_nothing_new() {
    let response = vec![fetched("alice"), fetched("bob")];

    let first = plan_assignable_users(&[], &response, ReconcileMode::Replace);
    let state: Vec<CachedAssignable> = first
        .upserts
        .iter()
        .map(|(login, avatar_url)| CachedAssignable {
            login: login.clone(),
            avatar_url: avatar_url.clone(),
        })
        .collect();

    let second = plan_assignable_users(&state, &response, ReconcileMode::Replace);

    assert_eq!(second.upserts, first.upserts);
    assert!(second.deletes.is_empty());
}
