use super::*;
use crate::services::images::ImageFile;
use crate::state::test_helpers;

const HOUR: Duration = Duration::from_secs(3600);

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// SessionStore
// =============================================================================

#[tokio::test]
async fn create_then_validate_returns_operator() {
    let store = SessionStore::new(HOUR);
    let operator = Operator { username: "admin".into() };
    let token = store.create(operator.clone()).await;
    assert_eq!(store.validate(&token).await, Some(operator));
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let store = SessionStore::new(HOUR);
    assert!(store.validate("nope").await.is_none());
}

#[tokio::test]
async fn delete_ends_session_once() {
    let store = SessionStore::new(HOUR);
    let token = store.create(Operator { username: "admin".into() }).await;
    assert!(store.delete(&token).await);
    assert!(!store.delete(&token).await);
    assert!(store.validate(&token).await.is_none());
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let store = SessionStore::new(Duration::from_millis(20));
    let token = store.create(Operator { username: "admin".into() }).await;
    assert!(store.validate(&token).await.is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(store.validate(&token).await.is_none());
}

#[tokio::test]
async fn sweep_removes_only_expired_sessions() {
    let short = SessionStore::new(Duration::from_millis(20));
    let stale = short.create(Operator { username: "old".into() }).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert_eq!(short.sweep_expired().await, vec![stale.clone()]);
    assert!(short.sweep_expired().await.is_empty(), "second sweep finds nothing");
    assert!(!short.delete(&stale).await, "swept session is gone");

    let long = SessionStore::new(HOUR);
    let fresh = long.create(Operator { username: "new".into() }).await;
    assert!(long.sweep_expired().await.is_empty());
    assert!(long.validate(&fresh).await.is_some());
}

// =============================================================================
// expire_sessions
// =============================================================================

#[tokio::test]
async fn expiry_discards_draft_and_releases_preview() {
    let config = crate::config::Config { session_ttl: Duration::from_millis(20), ..test_helpers::test_config() };
    let state = AppState::from_config(config);
    let token = state.sessions.create(Operator { username: "admin".into() }).await;
    {
        let mut drafts = state.drafts.write().await;
        let draft = drafts.entry(token.clone()).or_default();
        draft.set_fields("Half written", "").unwrap();
        draft.select_file(&state.previews, &token, ImageFile::new("image/png", vec![1_u8; 8])).unwrap();
    }
    assert_eq!(state.previews.live_count(), 1);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(expire_sessions(&state).await, 1);

    assert!(state.drafts.read().await.get(&token).is_none());
    assert_eq!(state.previews.live_count(), 0);
    assert!(state.sessions.validate(&token).await.is_none());
}

#[tokio::test]
async fn expiry_keeps_live_sessions() {
    let state = test_helpers::test_app_state();
    let token = state.sessions.create(Operator { username: "admin".into() }).await;
    state.drafts.write().await.entry(token.clone()).or_default();

    assert_eq!(expire_sessions(&state).await, 0);
    assert!(state.drafts.read().await.contains_key(&token));
}
