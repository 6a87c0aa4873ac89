//! Session lifecycle: sliding expiry, revocation, sweeping.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use warden::{Role, SecurityConfig, SessionConfig, SqliteRepositoryProvider, Warden};
use warden_core::repositories::{SessionRepositoryProvider, SessionRepository};

async fn setup(
    config: SecurityConfig,
) -> (Warden<SqliteRepositoryProvider>, Arc<SqliteRepositoryProvider>) {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let provider = Arc::new(SqliteRepositoryProvider::new(pool));
    let warden = Warden::with_config(provider.clone(), config);
    warden.migrate().await.unwrap();
    (warden, provider)
}

#[tokio::test]
async fn test_token_round_trips_to_public_profile() {
    let (warden, _provider) = setup(SecurityConfig::default()).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();
    warden
        .create_user("alice", "unrelated1", Role::Requester)
        .await
        .unwrap();

    let bob_login = warden.login("bob", "correct123", "203.0.113.7").await.unwrap();
    let alice_login = warden
        .login("alice", "unrelated1", "203.0.113.8")
        .await
        .unwrap();

    let bob_user = warden
        .authenticate(&bob_login.session.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob_user, bob_login.user);

    // The unrelated session is untouched by bob's validation.
    let alice_user = warden
        .authenticate(&alice_login.session.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice_user.username, "alice");
}

#[tokio::test]
async fn test_validation_slides_the_stored_expiry() {
    let (warden, provider) = setup(SecurityConfig::default()).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();

    let login = warden.login("bob", "correct123", "203.0.113.7").await.unwrap();
    let token = login.session.token.clone();

    // Issued with one full window ahead of it.
    let window = Duration::minutes(30);
    assert_eq!(
        login.session.expires_at.timestamp(),
        (login.session.updated_at + window).timestamp()
    );

    warden.authenticate(&token).await.unwrap().unwrap();
    let first = provider
        .session()
        .find_by_token(&token)
        .await
        .unwrap()
        .unwrap();

    // Stored timestamps have second resolution; step past it before the
    // second validation so the slide is observable.
    tokio::time::sleep(StdDuration::from_millis(1100)).await;

    warden.authenticate(&token).await.unwrap().unwrap();
    let second = provider
        .session()
        .find_by_token(&token)
        .await
        .unwrap()
        .unwrap();

    assert!(second.expires_at > first.expires_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(
        second.expires_at.timestamp(),
        (second.updated_at + window).timestamp()
    );
}

#[tokio::test]
async fn test_idle_session_expires() {
    let config = SecurityConfig::default()
        .with_session(SessionConfig::default().with_slide_window(Duration::seconds(1)));
    let (warden, _provider) = setup(config).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();

    let login = warden.login("bob", "correct123", "203.0.113.7").await.unwrap();

    tokio::time::sleep(StdDuration::from_millis(2100)).await;

    assert!(
        warden
            .authenticate(&login.session.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_activity_keeps_a_short_session_alive() {
    let config = SecurityConfig::default()
        .with_session(SessionConfig::default().with_slide_window(Duration::seconds(2)));
    let (warden, _provider) = setup(config).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();

    let login = warden.login("bob", "correct123", "203.0.113.7").await.unwrap();

    // Keep touching the session at sub-window intervals; the slide carries it
    // well past its original two-second lifetime.
    for _ in 0..4 {
        tokio::time::sleep(StdDuration::from_millis(700)).await;
        assert!(
            warden
                .authenticate(&login.session.token)
                .await
                .unwrap()
                .is_some()
        );
    }
}

#[tokio::test]
async fn test_logout_revokes_and_is_idempotent() {
    let (warden, _provider) = setup(SecurityConfig::default()).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();

    let login = warden.login("bob", "correct123", "203.0.113.7").await.unwrap();
    let token = login.session.token.clone();

    warden.logout(&token).await.unwrap();
    assert!(warden.authenticate(&token).await.unwrap().is_none());

    // Logging out again is a no-op, not an error.
    warden.logout(&token).await.unwrap();
}

#[tokio::test]
async fn test_unknown_token_is_not_authenticated() {
    let (warden, _provider) = setup(SecurityConfig::default()).await;

    let result = warden
        .authenticate(&warden_core::SessionToken::new_random())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_sweep_removes_idle_sessions() {
    let config = SecurityConfig::default()
        .with_session(SessionConfig::default().with_slide_window(Duration::seconds(1)));
    let (warden, _provider) = setup(config).await;
    warden
        .create_user("bob", "correct123", Role::Agent)
        .await
        .unwrap();

    warden.login("bob", "correct123", "203.0.113.7").await.unwrap();
    warden.login("bob", "correct123", "203.0.113.7").await.unwrap();

    tokio::time::sleep(StdDuration::from_millis(2100)).await;

    let stats = warden.sweep_expired().await.unwrap();
    assert_eq!(stats.sessions_removed, 2);
    assert_eq!(stats.blocks_removed, 0);

    // A second sweep finds nothing left.
    let stats = warden.sweep_expired().await.unwrap();
    assert_eq!(stats.sessions_removed, 0);
}
