use crate::engine::{Direction, EnginePhase, GuessOutcome, RoundEngine, RoundState, TerminationReason};
use crate::settlement::{EffectReport, SettlementCoordinator, SettlementOutcome};
use crate::{Deck, Result};
use hilo_ledger::Amount;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of a session for presentation and settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub score: u32,
    pub best_score: u32,
    pub round_index: u32,
    pub max_rounds: u32,
    pub is_game_over: bool,
    pub wager_amount: Option<Amount>,
    pub phase: EnginePhase,
    pub termination: Option<TerminationReason>,
}

impl SessionState {
    /// Best score including the session still in progress.
    pub fn display_best_score(&self) -> u32 {
        self.best_score.max(self.score)
    }
}

/// One player's table: a round engine plus the coordinator that settles its
/// sessions. Each `start_game` opens a new session with a fresh id.
#[derive(Debug)]
pub struct HigherLowerGame {
    id: Uuid,
    engine: RoundEngine,
    settlement: SettlementCoordinator,
}

impl HigherLowerGame {
    pub fn new(deck: Deck, settlement: SettlementCoordinator) -> Self {
        let max_rounds = settlement.rules().max_rounds;

        Self {
            id: Uuid::new_v4(),
            engine: RoundEngine::new(deck, max_rounds),
            settlement,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn settlement(&self) -> &SettlementCoordinator {
        &self.settlement
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.engine.round()
    }

    pub fn accept_wager(&mut self, amount: Amount) -> Result<()> {
        self.settlement.accept_wager(amount)
    }

    pub fn parse_wager(input: &str) -> Result<Amount> {
        SettlementCoordinator::parse_wager(input)
    }

    /// Start a session with the accepted wager and deal the first pair.
    pub fn start_game(&mut self) -> Result<SessionState> {
        let session_id = Uuid::new_v4();
        let wager = self.settlement.begin_session(session_id)?;
        self.id = session_id;

        self.engine.start_game()?;
        tracing::info!(
            "Session {} started with wager {} ({} items in deck)",
            session_id,
            wager,
            self.engine.deck().len()
        );

        Ok(self.state())
    }

    pub fn make_guess(&mut self, direction: Direction) -> GuessOutcome {
        let outcome = self.engine.make_guess(direction);

        match outcome {
            GuessOutcome::Correct => {
                tracing::debug!(
                    "Session {} round {} correct, score {}",
                    self.id,
                    self.engine.round_index(),
                    self.engine.score()
                );
            }
            GuessOutcome::Incorrect => {
                tracing::info!(
                    "Session {} ended on a wrong guess with score {}",
                    self.id,
                    self.engine.score()
                );
            }
            GuessOutcome::Ignored => {
                tracing::debug!("Session {} ignored guess {}", self.id, direction);
            }
        }

        outcome
    }

    /// Parse `"higher"` / `"lower"` and apply it.
    pub fn guess(&mut self, input: &str) -> Result<GuessOutcome> {
        let direction: Direction = input.parse()?;
        Ok(self.make_guess(direction))
    }

    pub fn next_round(&mut self) -> Result<EnginePhase> {
        let phase = self.engine.next_round()?;

        if phase == EnginePhase::GameOver {
            tracing::info!(
                "Session {} over ({:?}) with score {}",
                self.id,
                self.engine.termination(),
                self.engine.score()
            );
        }

        Ok(phase)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            session_id: self.id,
            score: self.engine.score(),
            best_score: self.settlement.best_score(),
            round_index: self.engine.round_index(),
            max_rounds: self.engine.max_rounds(),
            is_game_over: self.engine.is_game_over(),
            wager_amount: self.settlement.active_wager(),
            phase: self.engine.phase(),
            termination: self.engine.termination(),
        }
    }

    /// Settle the current session once it is over.
    pub fn settle(&mut self) -> Result<SettlementOutcome> {
        let state = self.state();
        self.settlement.settle(&state)
    }

    pub async fn load_best_score(&self) -> u32 {
        self.settlement.load_best_score(None).await
    }

    /// Reports of settlement calls that already completed, without waiting.
    pub fn drain_finished_settlement(&mut self) -> Vec<EffectReport> {
        self.settlement.drain_finished()
    }

    /// Wait for outstanding payout and best-score calls.
    pub async fn drain_settlement(&mut self) -> Vec<EffectReport> {
        self.settlement.drain().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalogue, CatalogueItem, DeckOrder, GameError, GameRules};

    fn game(items: &[(&str, u64)]) -> HigherLowerGame {
        let catalogue = Catalogue::new(
            items
                .iter()
                .map(|(label, metric)| CatalogueItem::new(*label, *metric))
                .collect(),
        );
        HigherLowerGame::new(
            Deck::new(catalogue, DeckOrder::AsListed),
            SettlementCoordinator::offline(GameRules::default()),
        )
    }

    #[test]
    fn test_start_requires_wager() {
        let mut game = game(&[("A", 1), ("B", 2)]);
        let id = game.id();

        assert!(matches!(game.start_game(), Err(GameError::WagerRequired)));
        assert_eq!(game.id(), id);
        assert_eq!(game.state().phase, EnginePhase::Idle);
    }

    #[test]
    fn test_each_session_gets_new_id_and_wager() {
        let mut game = game(&[("A", 100), ("B", 50), ("C", 200)]);

        game.accept_wager(Amount::from_tokens(3)).unwrap();
        let first = game.start_game().unwrap();
        assert_eq!(first.wager_amount, Some(Amount::from_tokens(3)));
        assert_eq!(game.guess("higher").unwrap(), GuessOutcome::Incorrect);
        game.settle().unwrap();

        assert!(matches!(game.start_game(), Err(GameError::WagerRequired)));

        game.accept_wager(Amount::from_tokens(1)).unwrap();
        let second = game.start_game().unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(second.score, 0);
        assert_eq!(second.wager_amount, Some(Amount::from_tokens(1)));
    }

    #[test]
    fn test_guess_rejects_unknown_direction() {
        let mut game = game(&[("A", 1), ("B", 2)]);
        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        game.start_game().unwrap();

        assert!(matches!(game.guess("sideways"), Err(GameError::InvalidGuess(_))));
        assert_eq!(game.state().phase, EnginePhase::AwaitingGuess);
    }

    #[test]
    fn test_display_best_score_tracks_live_score() {
        let mut game = game(&[("A", 1), ("B", 2), ("C", 3)]);
        game.accept_wager(Amount::ONE_YOCTO).unwrap();
        game.start_game().unwrap();

        assert_eq!(game.guess("higher").unwrap(), GuessOutcome::Correct);
        let state = game.state();
        assert_eq!(state.best_score, 0);
        assert_eq!(state.display_best_score(), 1);
    }
}
