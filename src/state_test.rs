use super::*;

#[tokio::test]
async fn from_config_seeds_notices_by_default() {
    let state = test_helpers::test_app_state();
    let notices = state.notices.list().await.unwrap();
    assert_eq!(notices.len(), 2);
    assert!(state.drafts.read().await.is_empty());
    assert!(state.feed_clients.read().await.is_empty());
    assert!(state.current_alert.read().await.is_none());
}

#[tokio::test]
async fn from_config_without_seed_starts_empty() {
    let config = Config { seed_notices: false, ..test_helpers::test_config() };
    let state = AppState::from_config(config);
    assert!(state.notices.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn clones_share_the_same_store() {
    let state = test_helpers::test_app_state();
    let other = state.clone();
    other.notices.remove("1").await.unwrap();
    assert_eq!(state.notices.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn configured_operator_can_log_in() {
    let state = test_helpers::test_app_state();
    let op = state
        .verifier
        .verify(test_helpers::TEST_USER, test_helpers::TEST_PASSWORD)
        .await
        .unwrap();
    assert!(op.is_some());
}

#[tokio::test]
async fn last_updated_starts_today() {
    let state = test_helpers::test_app_state();
    assert_eq!(*state.last_updated.read().await, today());
}
