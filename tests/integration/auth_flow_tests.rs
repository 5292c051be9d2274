use canary_backend_lib::{auth::AuthService, clock::Clock, error::AppError};
use chrono::Duration;
use futures_util::future::join_all;
use std::collections::HashSet;

use crate::test_utils::setup_memory_env;

#[tokio::test]
async fn test_alice_login_logout_scenario() {
    let env = setup_memory_env();
    let auth = &env.auth;

    let alice = auth.create_user("alice", "s3cret").await.unwrap();
    let token = auth.login("alice", "s3cret").await.unwrap();

    let info = auth.validate_session(&token).await.unwrap();
    assert_eq!(info.username, "alice");
    assert_eq!(info.user_id, alice.id);

    auth.logout(&token).await.unwrap();
    assert!(matches!(
        auth.validate_session(&token).await,
        Err(AppError::InvalidSession)
    ));
}

#[tokio::test]
async fn test_created_users_authenticate() {
    let env = setup_memory_env();
    let pairs = [
        ("alice", "s3cret"),
        ("bob", "correct horse battery staple"),
        ("Carol", " leading space"),
        ("dave@example.com", "ünïcödé"),
    ];

    for (username, password) in pairs {
        env.auth.create_user(username, password).await.unwrap();
    }
    for (username, password) in pairs {
        let user = env.auth.authenticate(username, password).await.unwrap();
        assert_eq!(user.username, username);
    }
}

#[tokio::test]
async fn test_wrong_password_matches_unknown_user() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();

    for (username, password) in [("alice", "S3cret"), ("alice", ""), ("mallory", "s3cret"), ("", "")] {
        let err = env.auth.authenticate(username, password).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials), "{username}/{password}");
    }
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();

    assert!(env.auth.authenticate("Alice", "s3cret").await.is_err());
    env.auth.create_user("Alice", "other").await.unwrap();
}

#[tokio::test]
async fn test_duplicate_user_keeps_first_record() {
    let env = setup_memory_env();
    let first = env.auth.create_user("alice", "s3cret").await.unwrap();

    assert!(matches!(
        env.auth.create_user("alice", "hijack").await,
        Err(AppError::DuplicateUsername)
    ));

    let user = env.auth.authenticate("alice", "s3cret").await.unwrap();
    assert_eq!(user, first);
    assert!(env.auth.authenticate("alice", "hijack").await.is_err());
}

#[tokio::test]
async fn test_expired_session_rejected_before_sweep() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();
    let token = env.auth.login("alice", "s3cret").await.unwrap();

    env.clock.advance(Duration::days(30));
    assert!(matches!(
        env.auth.validate_session(&token).await,
        Err(AppError::InvalidSession)
    ));
    // Rejection does not delete
    assert_eq!(env.auth.sessions().session_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_end_session_twice_is_noop() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();
    let token = env.auth.login("alice", "s3cret").await.unwrap();

    env.auth.end_session(&token).await.unwrap();
    env.auth.end_session(&token).await.unwrap();
    assert!(env.auth.validate_session(&token).await.is_err());
}

#[tokio::test]
async fn test_sweep_removes_exactly_expired() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();

    let mut old_tokens = Vec::new();
    for _ in 0..3 {
        old_tokens.push(env.auth.login("alice", "s3cret").await.unwrap());
    }
    env.clock.advance(Duration::days(15));
    let fresh = env.auth.login("alice", "s3cret").await.unwrap();
    env.clock.advance(Duration::days(16));

    let now = env.clock.utc();
    assert_eq!(env.auth.sweep_expired(now).await.unwrap(), 3);
    assert_eq!(env.auth.sweep_expired(now).await.unwrap(), 0);

    assert!(env.auth.validate_session(&fresh).await.is_ok());
    for token in old_tokens {
        assert!(env.auth.validate_session(&token).await.is_err());
    }
}

#[tokio::test]
async fn test_concurrent_duplicate_creation_has_one_winner() {
    let env = setup_memory_env();

    let results = join_all((0..8).map(|i| {
        let auth = env.auth.clone();
        async move { auth.create_user("alice", &format!("pw-{i}")).await }
    }))
    .await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::DuplicateUsername)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
}

#[tokio::test]
async fn test_concurrent_logins_get_distinct_tokens() {
    let env = setup_memory_env();
    env.auth.create_user("alice", "s3cret").await.unwrap();

    let tokens: Vec<String> = join_all((0..16).map(|_| {
        let auth = env.auth.clone();
        async move { auth.login("alice", "s3cret").await.unwrap() }
    }))
    .await;

    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), tokens.len());
    for token in &tokens {
        assert!(env.auth.validate_session(token).await.is_ok());
    }
}
