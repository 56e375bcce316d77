/// The wagering client driving the fixture backend over real HTTP
mod common;

use common::{spawn_backend, test_state, TOKEN};
use shared::Credits;
use std::sync::Arc;
use std::time::Duration;
use wager_client::config::{HistoryConfig, WageringConfig};
use wager_client::executor::{HttpExecutor, ScriptedSpin};
use wager_client::{
    BetLifecycleState, FailureKind, GameClient, GameError, GameId, SessionError, SessionState,
};

fn client(base_url: &str, token: Option<&str>) -> GameClient {
    let executor = HttpExecutor::new(base_url, Duration::from_secs(5)).expect("Failed to build executor");
    let executor = match token {
        Some(token) => executor.with_token(token),
        None => executor,
    };
    GameClient::new(Arc::new(executor), &WageringConfig::default(), &HistoryConfig::default())
}

#[tokio::test]
async fn test_spin_round_trip() {
    let state = test_state();
    state.house.lock().script_spin(ScriptedSpin::win(1_000));
    let base_url = spawn_backend(state).await;
    let client = client(&base_url, Some(TOKEN));

    let session = client
        .ensure_session(&GameId::from("classic-fruits"), None)
        .await
        .expect("Failed to open session");
    assert_eq!(session.initial_balance, Credits::new(100));

    let state = client.spin(Credits::new(10), None).await.expect("Bet not admitted");

    let result = state.settled().expect("Bet should settle");
    assert_eq!(result.win_amount, Credits::new(1_000));
    assert_eq!(client.balance(), Some(Credits::new(1_090)));

    let history = client.load_history(1, 20, None).await.expect("Failed to load history");
    assert_eq!(history.items.len(), 1);
    assert_eq!(&history.items[0], result);
}

#[tokio::test]
async fn test_wallet_round_trip() {
    let base_url = spawn_backend(test_state()).await;
    let client = client(&base_url, Some(TOKEN));

    let wallet = client.refresh_wallet().await.expect("Failed to read wallet");
    assert_eq!(wallet.balance, Credits::new(100));

    client.deposit(Credits::new(50)).await.expect("Deposit failed");
    client.withdraw(Credits::new(30)).await.expect("Withdrawal failed");

    assert_eq!(client.balance(), Some(Credits::new(120)));
    let wallet = client.refresh_wallet().await.expect("Failed to read wallet");
    assert_eq!(wallet.balance, Credits::new(120));
    assert_eq!(wallet.total_withdraw, Credits::new(30));
}

#[tokio::test]
async fn test_expired_session_over_http() {
    let state = test_state();
    let house = state.house.clone();
    let base_url = spawn_backend(state).await;
    let client = client(&base_url, Some(TOKEN));
    let session = client
        .ensure_session(&GameId::from("classic-fruits"), None)
        .await
        .expect("Failed to open session");

    house.lock().expire_session(session.session_id.as_str());
    let state = client.spin(Credits::new(10), None).await.expect("Bet not admitted");

    assert_eq!(state, BetLifecycleState::Failed(FailureKind::SessionExpired));
    assert!(matches!(client.session_state(), SessionState::Invalid(_)));
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let base_url = spawn_backend(test_state()).await;
    let client = client(&base_url, Some("not-the-token"));

    let err = client
        .ensure_session(&GameId::from("classic-fruits"), None)
        .await
        .unwrap_err();

    match err {
        GameError::Session(SessionError::Rejected { code, .. }) => assert_eq!(code, "UNAUTHORIZED"),
        other => panic!("Expected rejected session, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_token_never_calls_backend() {
    let base_url = spawn_backend(test_state()).await;
    let client = client(&base_url, None);

    let err = client
        .ensure_session(&GameId::from("classic-fruits"), None)
        .await
        .unwrap_err();

    assert_eq!(err, GameError::Session(SessionError::Unauthenticated));
}

#[tokio::test]
async fn test_unreachable_backend_fails_as_network() {
    // Bind and drop to find a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    let client = client(&format!("http://{}", addr), Some(TOKEN));

    let err = client.refresh_wallet().await.unwrap_err();

    assert!(matches!(err, GameError::Network(_)));
}
