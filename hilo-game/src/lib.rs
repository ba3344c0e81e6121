//! Higher/Lower wager game
//!
//! Players wager an amount, then repeatedly guess whether the next catalogue
//! item's metric is higher or lower than the current one. Reaching the win
//! threshold pays a multiplier on the wager; settlement runs against a
//! [`hilo_ledger::LedgerGateway`] when one is online.

pub mod catalogue;
pub mod deck;
pub mod engine;
pub mod error;
pub mod game;
pub mod rules;
pub mod settlement;

pub use catalogue::{Catalogue, CatalogueItem};
pub use deck::{Deck, DeckOrder};
pub use engine::{
    Direction, EnginePhase, GuessOutcome, RoundEngine, RoundState, TerminationReason,
};
pub use error::{GameError, Result};
pub use game::{HigherLowerGame, SessionState};
pub use rules::{GameRules, Multiplier, BASE_MULTIPLIER, MAX_ROUNDS, MULTIPLIER_STEP, WIN_THRESHOLD};
pub use settlement::{
    compute_payout, EffectKind, EffectReport, LedgerLink, ScoreBoard, SettlementCoordinator,
    SettlementOutcome,
};

/// Create a game over `catalogue` with the given rules, settling against the
/// ledger when `link` is present.
pub fn create_game(
    catalogue: Catalogue,
    order: DeckOrder,
    rules: GameRules,
    link: Option<LedgerLink>,
) -> Result<HigherLowerGame> {
    rules.validate()?;
    let deck = Deck::new(catalogue, order);
    Ok(HigherLowerGame::new(deck, SettlementCoordinator::new(rules, link)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use hilo_ledger::{
        establish, Amount, FunctionCall, GatewayConfig, LedgerError, LedgerGateway,
        LocalConnector, LocalLedger, Network, Receipt, ReceiptKind, ViewCall,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    const PLAYER: &str = "player.testnet";

    #[derive(Default)]
    struct RecordingGateway {
        account_id: Option<String>,
        stored_best: Mutex<Value>,
        paid: Mutex<Vec<(String, Amount)>>,
        transfers: AtomicUsize,
        persists: AtomicUsize,
        fail_views: bool,
        fail_transfers: bool,
        fail_persist: bool,
        gate: Option<Arc<Notify>>,
    }

    impl RecordingGateway {
        fn signed_in() -> Self {
            Self {
                account_id: Some(PLAYER.to_string()),
                ..Default::default()
            }
        }

        fn receipt(&self, kind: ReceiptKind) -> Receipt {
            Receipt {
                id: format!("rcpt-{}", self.transfers.load(Ordering::SeqCst)),
                signer_id: PLAYER.to_string(),
                kind,
                timestamp: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LedgerGateway for RecordingGateway {
        fn account_id(&self) -> Option<String> {
            self.account_id.clone()
        }

        async fn view_method(&self, call: ViewCall) -> hilo_ledger::Result<Value> {
            if self.fail_views {
                return Err(LedgerError::rpc("node unreachable"));
            }
            assert_eq!(call.method, settlement::GET_BEST_SCORE);
            Ok(self.stored_best.lock().clone())
        }

        async fn call_method(&self, call: FunctionCall) -> hilo_ledger::Result<Receipt> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.persists.fetch_add(1, Ordering::SeqCst);
            if self.fail_persist {
                return Err(LedgerError::rpc("contract rejected call"));
            }

            *self.stored_best.lock() = call.args["score"].clone();
            Ok(self.receipt(ReceiptKind::FunctionCall {
                contract_id: call.contract_id.unwrap_or_default(),
                method: call.method,
            }))
        }

        async fn transfer(&self, receiver_id: &str, amount: Amount) -> hilo_ledger::Result<Receipt> {
            self.transfers.fetch_add(1, Ordering::SeqCst);
            if self.fail_transfers {
                return Err(LedgerError::unavailable("wallet locked"));
            }

            self.paid.lock().push((receiver_id.to_string(), amount));
            Ok(self.receipt(ReceiptKind::Transfer {
                receiver_id: receiver_id.to_string(),
                amount,
            }))
        }
    }

    fn catalogue(items: &[(&str, u64)]) -> Catalogue {
        Catalogue::new(
            items
                .iter()
                .map(|(label, metric)| CatalogueItem::new(*label, *metric))
                .collect(),
        )
    }

    fn ascending(n: u64) -> Catalogue {
        Catalogue::new(
            (1..=n)
                .map(|i| CatalogueItem::new(format!("term-{}", i), i * 1_000))
                .collect(),
        )
    }

    fn online_game(
        catalogue: Catalogue,
        gateway: Arc<RecordingGateway>,
        config: &GatewayConfig,
    ) -> HigherLowerGame {
        create_game(
            catalogue,
            DeckOrder::AsListed,
            GameRules::default(),
            Some(LedgerLink::new(gateway, config)),
        )
        .unwrap()
    }

    /// Guess "higher" until the session ends.
    fn climb(game: &mut HigherLowerGame) {
        while !game.state().is_game_over {
            if game.make_guess(Direction::Higher) == GuessOutcome::Correct {
                game.next_round().unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_lower_then_lower_scenario() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        let mut game = online_game(
            catalogue(&[("A", 100), ("B", 50), ("C", 200)]),
            gateway.clone(),
            &GatewayConfig::default(),
        );

        game.accept_wager(HigherLowerGame::parse_wager("10").unwrap())
            .unwrap();
        game.start_game().unwrap();

        let round = game.round().unwrap();
        assert_eq!((round.left.label.as_str(), round.right.label.as_str()), ("A", "B"));
        assert_eq!(game.guess("lower").unwrap(), GuessOutcome::Correct);
        assert_eq!(game.state().score, 1);

        game.next_round().unwrap();
        let round = game.round().unwrap();
        assert_eq!((round.left.label.as_str(), round.right.label.as_str()), ("B", "C"));
        assert_eq!(game.guess("lower").unwrap(), GuessOutcome::Incorrect);

        let state = game.state();
        assert!(state.is_game_over);
        assert_eq!(state.score, 1);
        assert_eq!(state.termination, Some(TerminationReason::WrongGuess));

        let outcome = game.settle().unwrap();
        assert_eq!(outcome.payout, Amount::ZERO);
        assert!(!outcome.won);
        assert!(outcome.new_best_score);

        let reports = game.drain_settlement().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, EffectKind::BestScorePersist);
        assert!(reports[0].result.is_ok());
        assert_eq!(gateway.transfers.load(Ordering::SeqCst), 0);
        assert_eq!(*gateway.stored_best.lock(), json!(1));
    }

    #[tokio::test]
    async fn test_winning_session_pays_signed_in_account() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        let mut game = online_game(ascending(12), gateway.clone(), &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(10)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);

        let state = game.state();
        assert_eq!(state.score, 11);
        assert_eq!(state.termination, Some(TerminationReason::DeckExhausted));

        let outcome = game.settle().unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.payout, Amount::from_tokens(25));

        let reports = game.drain_settlement().await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.result.is_ok()));
        assert_eq!(
            *gateway.paid.lock(),
            vec![(PLAYER.to_string(), Amount::from_tokens(25))]
        );
        assert_eq!(game.settlement().score_board().confirmed_best, Some(11));
    }

    #[tokio::test]
    async fn test_round_limit_ends_session() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        let mut game = online_game(ascending(40), gateway, &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(1)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);

        let state = game.state();
        assert_eq!(state.score, MAX_ROUNDS);
        assert_eq!(state.termination, Some(TerminationReason::RoundLimit));
        assert_eq!(game.settle().unwrap().payout, "4.5".parse().unwrap());
        game.drain_settlement().await;
    }

    #[tokio::test]
    async fn test_double_settle_transfers_once() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        let mut game = online_game(ascending(12), gateway.clone(), &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(2)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);

        let first = game.settle().unwrap();
        let second = game.settle().unwrap();
        assert_eq!(first, second);

        game.drain_settlement().await;
        assert_eq!(gateway.transfers.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.persists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_ledger_calls_leave_outcome_intact() {
        let gateway = Arc::new(RecordingGateway {
            fail_transfers: true,
            fail_persist: true,
            ..RecordingGateway::signed_in()
        });
        let mut game = online_game(ascending(12), gateway, &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(4)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);

        let outcome = game.settle().unwrap();
        let reports = game.drain_settlement().await;

        assert!(reports.iter().any(|r| matches!(
            r.result,
            Err(GameError::SettlementTransferFailed(_))
        )));
        assert!(reports.iter().any(|r| matches!(
            r.result,
            Err(GameError::SettlementPersistFailed(_))
        )));

        assert_eq!(game.settle().unwrap(), outcome);
        assert_eq!(game.settlement().best_score(), 11);
        assert_eq!(game.settlement().score_board().confirmed_best, None);
    }

    #[tokio::test]
    async fn test_payout_without_account_is_reported() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut game = online_game(ascending(12), gateway.clone(), &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(1)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);
        game.settle().unwrap();

        let reports = game.drain_settlement().await;
        let transfer = reports
            .iter()
            .find(|r| r.kind == EffectKind::PayoutTransfer)
            .unwrap();
        assert!(matches!(
            transfer.result,
            Err(GameError::SettlementTransferFailed(_))
        ));
        assert_eq!(gateway.transfers.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_ledger_times_out() {
        let gateway = Arc::new(RecordingGateway {
            gate: Some(Arc::new(Notify::new())),
            ..RecordingGateway::signed_in()
        });
        let config = GatewayConfig {
            request_timeout: Duration::from_millis(50),
            ..GatewayConfig::default()
        };
        let mut game = online_game(
            catalogue(&[("A", 1), ("B", 2), ("C", 0)]),
            gateway,
            &config,
        );

        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        game.start_game().unwrap();
        game.guess("higher").unwrap();
        game.next_round().unwrap();
        game.guess("higher").unwrap();
        game.settle().unwrap();

        let reports = game.drain_settlement().await;
        assert_eq!(reports.len(), 1);
        match &reports[0].result {
            Err(GameError::SettlementPersistFailed(msg)) => assert!(msg.contains("no response")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    async fn let_tasks_run() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_slow_settlement_does_not_hold_next_session() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(RecordingGateway {
            gate: Some(gate.clone()),
            ..RecordingGateway::signed_in()
        });
        let mut game = online_game(
            catalogue(&[("A", 1), ("B", 2), ("C", 0)]),
            gateway.clone(),
            &GatewayConfig::default(),
        );

        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        let first = game.start_game().unwrap();
        game.guess("higher").unwrap();
        game.next_round().unwrap();
        game.guess("higher").unwrap();
        game.settle().unwrap();

        let_tasks_run().await;
        assert!(game.drain_finished_settlement().is_empty());
        assert_eq!(game.settlement().pending_effects(), 1);

        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        let second = game.start_game().unwrap();
        assert_eq!(second.phase, EnginePhase::AwaitingGuess);
        assert_eq!(gateway.persists.load(Ordering::SeqCst), 0);

        gate.notify_one();
        let_tasks_run().await;
        let reports = game.drain_finished_settlement();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].session_id, first.session_id);
        assert!(reports[0].result.is_ok());
        assert_eq!(game.settlement().pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_finished_settlement_calls_are_pruned() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        let mut game = online_game(ascending(12), gateway.clone(), &GatewayConfig::default());

        game.accept_wager(Amount::from_tokens(1)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);
        game.settle().unwrap();
        assert_eq!(game.settlement().pending_effects(), 2);

        let_tasks_run().await;
        assert_eq!(gateway.transfers.load(Ordering::SeqCst), 1);

        // same score again: a payout but no new best
        game.accept_wager(Amount::from_tokens(1)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);
        assert!(!game.settle().unwrap().new_best_score);
        assert_eq!(game.settlement().pending_effects(), 1);

        let reports = game.drain_settlement().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, EffectKind::PayoutTransfer);
        assert_eq!(gateway.paid.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_session_cannot_reconcile_new_session() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(RecordingGateway {
            gate: Some(gate.clone()),
            ..RecordingGateway::signed_in()
        });
        let mut game = online_game(
            catalogue(&[("A", 1), ("B", 2), ("C", 0)]),
            gateway.clone(),
            &GatewayConfig::default(),
        );

        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        let first = game.start_game().unwrap();
        game.guess("higher").unwrap();
        game.next_round().unwrap();
        game.guess("higher").unwrap();
        assert!(game.settle().unwrap().new_best_score);
        assert_eq!(game.settlement().pending_effects(), 1);

        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        let second = game.start_game().unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(second.score, 0);

        gate.notify_one();
        let reports = game.drain_settlement().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].session_id, first.session_id);
        assert!(reports[0].result.is_ok());

        let board = game.settlement().score_board();
        assert_eq!(board.session_id, Some(second.session_id));
        assert_eq!(board.best_score, 1);
        assert_eq!(board.confirmed_best, None);
        assert_eq!(game.state().score, 0);
    }

    #[tokio::test]
    async fn test_offline_session_settles_locally() {
        let mut game = create_game(
            ascending(12),
            DeckOrder::AsListed,
            GameRules::default(),
            None,
        )
        .unwrap();

        game.accept_wager(Amount::from_tokens(1)).unwrap();
        game.start_game().unwrap();
        climb(&mut game);

        let outcome = game.settle().unwrap();
        assert_eq!(outcome.payout, "2.5".parse().unwrap());
        assert_eq!(game.settlement().pending_effects(), 0);
        assert!(game.drain_settlement().await.is_empty());
        assert_eq!(game.load_best_score().await, 11);
    }

    #[tokio::test]
    async fn test_load_best_score_prefers_higher_value() {
        let gateway = Arc::new(RecordingGateway::signed_in());
        *gateway.stored_best.lock() = json!(7);
        let game = online_game(ascending(4), gateway.clone(), &GatewayConfig::default());

        assert_eq!(game.load_best_score().await, 7);
        assert_eq!(game.state().best_score, 7);

        *gateway.stored_best.lock() = json!("3");
        assert_eq!(game.load_best_score().await, 7);
        assert_eq!(game.settlement().score_board().confirmed_best, Some(3));
    }

    #[tokio::test]
    async fn test_load_best_score_falls_back() {
        let failing = Arc::new(RecordingGateway {
            fail_views: true,
            ..RecordingGateway::signed_in()
        });
        let game = online_game(ascending(4), failing, &GatewayConfig::default());
        assert_eq!(game.load_best_score().await, 0);

        let anonymous = Arc::new(RecordingGateway::default());
        let game = online_game(ascending(4), anonymous, &GatewayConfig::default());
        assert_eq!(game.load_best_score().await, 0);
    }

    #[test]
    fn test_create_game_rejects_bad_rules() {
        let rules = GameRules {
            max_rounds: 0,
            ..GameRules::default()
        };
        assert!(matches!(
            create_game(ascending(3), DeckOrder::AsListed, rules, None),
            Err(GameError::Rules(_))
        ));
    }

    #[tokio::test]
    async fn test_settles_against_local_ledger() {
        let temp_dir = tempdir().unwrap();
        let config = GatewayConfig::new(Network::Sandbox);

        let ledger = LocalLedger::open(temp_dir.path(), config.clone())
            .await
            .unwrap();
        ledger.sign_in(PLAYER).await.unwrap();
        drop(ledger);

        let status = establish(&LocalConnector::new(temp_dir.path()), &config).await;
        let link = LedgerLink::from_status(&status, &config);
        assert!(link.is_some());

        let mut game =
            create_game(ascending(12), DeckOrder::AsListed, GameRules::default(), link).unwrap();
        game.accept_wager(HigherLowerGame::parse_wager("0.5").unwrap())
            .unwrap();
        game.start_game().unwrap();
        climb(&mut game);
        game.settle().unwrap();

        let reports = game.drain_settlement().await;
        assert!(reports.iter().all(|r| r.result.is_ok()));

        let ledger = LocalLedger::open(temp_dir.path(), config).await.unwrap();
        assert_eq!(ledger.balance_of(PLAYER).await.unwrap(), "1.25".parse().unwrap());
        assert_eq!(game.load_best_score().await, 11);
    }
}
