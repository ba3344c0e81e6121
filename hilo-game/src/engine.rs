use crate::{CatalogueItem, Deck, GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "higher" => Ok(Direction::Higher),
            "lower" => Ok(Direction::Lower),
            _ => Err(GameError::InvalidGuess(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Higher => write!(f, "higher"),
            Direction::Lower => write!(f, "lower"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Idle,
    AwaitingGuess,
    RoundResolved,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    WrongGuess,
    RoundLimit,
    DeckExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Incorrect,
    /// Round already resolved or game over; nothing changed.
    Ignored,
}

/// The pair currently on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub left: CatalogueItem,
    pub right: CatalogueItem,
    pub round_index: u32,
    pub is_round_complete: bool,
    pub last_guess_correct: bool,
}

impl RoundState {
    /// Ties count as "not higher".
    pub fn is_higher(&self) -> bool {
        self.right.metric > self.left.metric
    }

    pub fn correct_direction(&self) -> Direction {
        if self.is_higher() {
            Direction::Higher
        } else {
            Direction::Lower
        }
    }
}

/// Round-by-round state machine:
/// `Idle -> AwaitingGuess -> RoundResolved -> (AwaitingGuess | GameOver)`.
#[derive(Debug)]
pub struct RoundEngine {
    deck: Deck,
    max_rounds: u32,
    phase: EnginePhase,
    round: Option<RoundState>,
    score: u32,
    round_index: u32,
    termination: Option<TerminationReason>,
}

impl RoundEngine {
    pub fn new(deck: Deck, max_rounds: u32) -> Self {
        Self {
            deck,
            max_rounds,
            phase: EnginePhase::Idle,
            round: None,
            score: 0,
            round_index: 0,
            termination: None,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == EnginePhase::GameOver
    }

    pub fn is_round_complete(&self) -> bool {
        self.round.as_ref().map_or(false, |r| r.is_round_complete)
    }

    pub fn last_guess_correct(&self) -> bool {
        self.round.as_ref().map_or(false, |r| r.last_guess_correct)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Reset the session, reshuffle, and open the first round.
    pub fn start_game(&mut self) -> Result<EnginePhase> {
        self.score = 0;
        self.round_index = 0;
        self.round = None;
        self.termination = None;
        self.phase = EnginePhase::Idle;
        self.deck.shuffle();

        tracing::debug!("Engine reset with {} items in the deck", self.deck.remaining());
        self.next_round()
    }

    pub fn next_round(&mut self) -> Result<EnginePhase> {
        match self.phase {
            EnginePhase::Idle | EnginePhase::RoundResolved => {}
            other => {
                return Err(GameError::InvalidState(format!(
                    "cannot advance round while {:?}",
                    other
                )));
            }
        }

        if self.round_index >= self.max_rounds {
            self.finish(TerminationReason::RoundLimit);
            return Ok(self.phase);
        }

        // the opening pair draws two items, later rounds carry `right` forward
        let needed = if self.round.is_some() { 1 } else { 2 };
        if self.deck.remaining() < needed {
            self.finish(TerminationReason::DeckExhausted);
            return Ok(self.phase);
        }

        let left = match self.round.take() {
            Some(previous) => previous.right,
            None => self.deck.draw()?,
        };
        let right = self.deck.draw()?;

        self.round_index += 1;
        self.round = Some(RoundState {
            left,
            right,
            round_index: self.round_index,
            is_round_complete: false,
            last_guess_correct: false,
        });
        self.phase = EnginePhase::AwaitingGuess;

        Ok(self.phase)
    }

    pub fn make_guess(&mut self, direction: Direction) -> GuessOutcome {
        if self.phase != EnginePhase::AwaitingGuess {
            return GuessOutcome::Ignored;
        }
        let Some(round) = self.round.as_mut() else {
            return GuessOutcome::Ignored;
        };
        if round.is_round_complete {
            return GuessOutcome::Ignored;
        }

        let correct = direction == round.correct_direction();
        round.is_round_complete = true;
        round.last_guess_correct = correct;

        if correct {
            self.score += 1;
            self.phase = EnginePhase::RoundResolved;
            GuessOutcome::Correct
        } else {
            self.finish(TerminationReason::WrongGuess);
            GuessOutcome::Incorrect
        }
    }

    fn finish(&mut self, reason: TerminationReason) {
        self.phase = EnginePhase::GameOver;
        self.termination = Some(reason);
        tracing::debug!(
            "Game over after {} rounds with score {} ({:?})",
            self.round_index,
            self.score,
            reason
        );
    }
}
