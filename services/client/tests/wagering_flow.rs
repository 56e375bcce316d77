/// End-to-end wagering flows against the in-memory fixture backend
use shared::Credits;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

use wager_client::config::{FixtureSettings, HistoryConfig, WageringConfig};
use wager_client::executor::{Endpoint, FixtureExecutor, FixtureFault, ScriptedSpin};
use wager_client::{
    BalanceSource, BetLifecycleState, FailureKind, GameClient, GameError, GameEvent, GameId,
    ReconciliationIssue, SessionError, SessionState, ValidationError,
};

const GAME: &str = "classic-fruits";

/// Client wired to a fixture backend the test can script
struct FlowContext {
    backend: Arc<FixtureExecutor>,
    client: GameClient,
}

impl FlowContext {
    fn with_balance(balance: i64) -> Self {
        let backend = Arc::new(FixtureExecutor::new(FixtureSettings {
            initial_balance: Credits::new(balance),
            ..FixtureSettings::default()
        }));
        let wagering = WageringConfig {
            result_poll_initial_ms: 5,
            result_poll_max_ms: 20,
            result_timeout_ms: 300,
        };
        let client = GameClient::new(backend.clone(), &wagering, &HistoryConfig { page_size: 3 });
        Self { backend, client }
    }

    async fn open(&self) {
        self.client
            .ensure_session(&GameId::from(GAME), None)
            .await
            .expect("Failed to open session");
    }

    async fn spin(&self, amount: i64) -> BetLifecycleState {
        self.client
            .spin(Credits::new(amount), None)
            .await
            .expect("Bet was not admitted")
    }

    /// A round played on the same wallet from another device
    fn play_elsewhere(&self) {
        self.backend.with_house(|house| {
            house.script_spin(ScriptedSpin::loss());
            house
                .record_round(GAME, Credits::new(1))
                .expect("Failed to record external round");
        });
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
}

#[tokio::test]
async fn losing_spin_shows_server_balance() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::loss());

    let state = ctx.spin(10).await;

    let result = state.settled().expect("Bet should settle");
    assert_eq!(result.win_amount, Credits::ZERO);
    assert_eq!(result.new_balance, Credits::new(90));

    let view = ctx.client.view();
    assert_eq!(view.balance, Some(Credits::new(90)));
    assert_eq!(view.win_amount, Credits::ZERO);
    assert!(!view.is_spinning);

    assert!(ctx.client.acknowledge());
    assert_eq!(ctx.client.bet_state(), BetLifecycleState::Idle);
}

#[tokio::test]
async fn jackpot_spin_shows_win_and_balance() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::win(1_000));

    ctx.spin(10).await;

    let view = ctx.client.view();
    assert_eq!(view.balance, Some(Credits::new(1_090)));
    assert_eq!(view.win_amount, Credits::new(1_000));
    assert_eq!(view.reels, vec!["seven", "seven", "seven"]);
}

#[tokio::test]
async fn timeout_fails_bet_and_allows_retry_after_ack() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.fail_next(Endpoint::PlaceBet, FixtureFault::Timeout);

    let state = ctx.spin(10).await;

    assert_eq!(state, BetLifecycleState::Failed(FailureKind::Network));
    assert_eq!(ctx.client.balance(), Some(Credits::new(100)));

    let blocked = ctx.client.spin(Credits::new(10), None).await;
    assert!(matches!(blocked, Err(GameError::ConcurrentBet { .. })));

    assert!(ctx.client.acknowledge());
    ctx.backend.script_spin(ScriptedSpin::loss());
    let retried = ctx.spin(10).await;
    assert!(retried.settled().is_some());
    assert_eq!(ctx.client.balance(), Some(Credits::new(90)));
}

#[tokio::test]
async fn only_first_of_concurrent_bets_is_admitted() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.set_latency(Duration::from_millis(50));
    ctx.backend.script_spin(ScriptedSpin::loss());

    let (a, b, c) = futures::join!(
        ctx.client.spin(Credits::new(10), None),
        ctx.client.spin(Credits::new(10), None),
        ctx.client.spin(Credits::new(10), None)
    );

    assert!(matches!(a, Ok(BetLifecycleState::Settled(_))));
    assert!(matches!(b, Err(GameError::ConcurrentBet { state: "placing" })));
    assert!(matches!(c, Err(GameError::ConcurrentBet { state: "placing" })));
    assert_eq!(ctx.backend.call_count(Endpoint::PlaceBet), 1);
}

#[tokio::test]
async fn invalid_stakes_never_reach_the_network() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    let calls = ctx.backend.total_calls();

    for amount in [0, -1, 101] {
        let err = ctx
            .client
            .spin(Credits::new(amount), None)
            .await
            .expect_err("Stake should be rejected");
        assert!(matches!(err, GameError::Validation(_)), "amount {}: {:?}", amount, err);
    }

    assert_eq!(ctx.backend.total_calls(), calls);
    assert_eq!(ctx.client.bet_state(), BetLifecycleState::Idle);
}

#[tokio::test]
async fn ended_session_rejects_bets_until_reopened() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;

    ctx.client.end_session().await;
    let err = ctx.client.spin(Credits::new(10), None).await.unwrap_err();
    assert!(matches!(err, GameError::Session(SessionError::Ended { .. })));
    assert_eq!(ctx.backend.call_count(Endpoint::PlaceBet), 0);

    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::loss());
    assert!(ctx.spin(10).await.settled().is_some());
}

#[tokio::test]
async fn abandoned_spin_still_settles() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::loss());
    ctx.backend.set_latency(Duration::from_millis(50));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        ctx.client.spin(Credits::new(10), None),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(ctx.client.bet_state().is_in_flight());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let result = ctx
        .client
        .bet_state()
        .settled()
        .cloned()
        .expect("Abandoned bet should still settle");
    assert_eq!(result.new_balance, Credits::new(90));
    assert_eq!(ctx.client.balance(), Some(Credits::new(90)));
    assert_eq!(ctx.backend.call_count(Endpoint::PlaceBet), 1);
}

#[tokio::test]
async fn ending_session_mid_bet_lets_the_bet_settle() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::loss());
    ctx.backend.set_latency(Duration::from_millis(50));

    let (state, _) = tokio::join!(ctx.client.spin(Credits::new(10), None), async {
        tokio::time::sleep(Duration::from_millis(25)).await;
        ctx.client.end_session().await;
    });

    let state = state.expect("Bet was not admitted");
    assert_eq!(state.settled().map(|r| r.new_balance), Some(Credits::new(90)));
    assert_eq!(ctx.client.balance(), Some(Credits::new(90)));
    assert!(matches!(ctx.client.session_state(), SessionState::Ended(_)));

    let err = ctx.client.spin(Credits::new(10), None).await.unwrap_err();
    assert!(matches!(err, GameError::Session(SessionError::Ended { .. })));
    assert_eq!(ctx.backend.call_count(Endpoint::PlaceBet), 1);
}

#[tokio::test]
async fn expired_session_requires_new_session() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    let session_id = match ctx.client.session_state() {
        SessionState::Active(session) => session.session_id,
        other => panic!("Expected active session, got {:?}", other),
    };
    ctx.backend
        .with_house(|house| house.expire_session(session_id.as_str()));

    let state = ctx.spin(10).await;

    assert_eq!(state, BetLifecycleState::Failed(FailureKind::SessionExpired));
    assert!(matches!(ctx.client.session_state(), SessionState::Invalid(_)));
    ctx.client.acknowledge();

    ctx.open().await;
    ctx.backend.script_spin(ScriptedSpin::loss());
    assert!(ctx.spin(10).await.settled().is_some());
}

#[tokio::test]
async fn balance_mismatch_warns_but_server_wins() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    let mut events = ctx.client.subscribe();
    ctx.backend
        .script_spin(ScriptedSpin::loss().reporting_balance(95));

    ctx.spin(10).await;

    assert_eq!(ctx.client.balance(), Some(Credits::new(95)));
    let warnings: Vec<ReconciliationIssue> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::ReconciliationWarning(warning) => Some(warning.issue),
            _ => None,
        })
        .collect();
    assert_eq!(
        warnings,
        vec![ReconciliationIssue::ArithmeticMismatch {
            expected: Credits::new(90),
            reported: Credits::new(95),
        }]
    );
}

#[tokio::test]
async fn settlement_updates_balance_before_history_and_state() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    let mut events = ctx.client.subscribe();
    ctx.backend.script_spin(ScriptedSpin::loss());

    ctx.spin(10).await;

    let events = drain(&mut events);
    let position = |pred: &dyn Fn(&GameEvent) -> bool| {
        events
            .iter()
            .position(|e| pred(e))
            .expect("Expected event missing")
    };
    let admitted = position(&|e| matches!(e, GameEvent::BetAdmitted { .. }));
    let accepted = position(&|e| matches!(e, GameEvent::BetAccepted { .. }));
    let balance = position(&|e| {
        matches!(
            e,
            GameEvent::BalanceChanged {
                source: BalanceSource::Settlement,
                ..
            }
        )
    });
    let history = position(&|e| matches!(e, GameEvent::HistoryInvalidated));
    let settled = position(&|e| matches!(e, GameEvent::BetSettled(_)));

    assert!(admitted < accepted && accepted < balance);
    assert!(balance < history && history < settled);
    assert!(ctx.client.history_is_stale());
}

#[tokio::test]
async fn history_refresh_is_idempotent() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    for _ in 0..4 {
        ctx.backend.script_spin(ScriptedSpin::loss());
        ctx.spin(1).await;
    }

    let first = ctx.client.load_history(1, 3, None).await.unwrap();
    let again = ctx.client.load_history(1, 3, None).await.unwrap();

    assert_eq!(first.items, again.items);
    assert_eq!(again.items.len(), 3);
    assert_eq!(again.total_count, 4);
}

#[tokio::test]
async fn history_pages_concatenate_without_duplicates() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    for _ in 0..5 {
        ctx.backend.script_spin(ScriptedSpin::loss());
        ctx.spin(1).await;
    }

    let first = ctx.client.load_history(1, 3, None).await.unwrap();
    ctx.play_elsewhere();
    ctx.play_elsewhere();
    let merged = ctx.client.load_more_history().await.unwrap();

    assert_eq!(merged.page, 2);
    assert_eq!(merged.items[..3], first.items[..]);
    let mut ids: Vec<&str> = merged.items.iter().map(|i| i.bet_id.as_str()).collect();
    let loaded = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), loaded);
    assert_eq!(loaded, 4);
}

#[tokio::test]
async fn settled_bet_makes_next_history_read_start_over() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    for _ in 0..4 {
        ctx.backend.script_spin(ScriptedSpin::loss());
        ctx.spin(1).await;
    }
    ctx.client.load_history(1, 3, None).await.unwrap();
    let history_calls = ctx.backend.call_count(Endpoint::BetHistory);

    ctx.backend.script_spin(ScriptedSpin::win(5));
    let state = ctx.spin(1).await;
    assert_eq!(ctx.backend.call_count(Endpoint::BetHistory), history_calls);

    let page = ctx.client.load_more_history().await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.items.first(), state.settled());
}

#[tokio::test]
async fn deferred_settlement_is_awaited() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend
        .with_house(|house| house.set_deferred_settlement(Some(1)));
    ctx.backend.script_spin(ScriptedSpin::win(20));

    let state = ctx.spin(10).await;

    assert_eq!(state.settled().map(|r| r.new_balance), Some(Credits::new(110)));
    assert!(ctx.backend.call_count(Endpoint::FetchBet) >= 2);
}

#[tokio::test]
async fn deferred_settlement_times_out_as_network_failure() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.backend
        .with_house(|house| house.set_deferred_settlement(Some(u32::MAX)));

    let state = ctx.spin(10).await;

    assert_eq!(state, BetLifecycleState::Failed(FailureKind::Network));
}

#[tokio::test]
async fn server_insufficient_funds_is_classified() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    // Drained from another device after the local balance was read
    ctx.backend.with_house(|house| {
        house
            .withdraw(&shared::api::WalletTransferRequest {
                amount: Credits::new(95),
            })
            .expect("Failed to drain wallet");
    });

    let state = ctx.spin(10).await;

    assert_eq!(state, BetLifecycleState::Failed(FailureKind::InsufficientFunds));
    assert_eq!(ctx.client.balance(), Some(Credits::new(100)));
}

#[tokio::test]
async fn unauthenticated_client_cannot_open_session() {
    let ctx = FlowContext::with_balance(100);
    ctx.backend.set_authenticated(false);

    let err = ctx
        .client
        .ensure_session(&GameId::from(GAME), None)
        .await
        .unwrap_err();

    assert_eq!(err, GameError::Session(SessionError::Unauthenticated));
    assert_eq!(ctx.backend.call_count(Endpoint::CreateSession), 0);
}

#[tokio::test]
async fn bet_above_local_balance_after_withdrawal_is_rejected() {
    let ctx = FlowContext::with_balance(100);
    ctx.open().await;
    ctx.client.withdraw(Credits::new(95)).await.unwrap();

    let err = ctx.client.spin(Credits::new(10), None).await.unwrap_err();

    assert!(matches!(
        err,
        GameError::Validation(ValidationError::InsufficientBalance { .. })
    ));
}
