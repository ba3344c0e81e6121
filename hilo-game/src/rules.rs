use crate::{GameError, Result};
use hilo_ledger::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rounds per session before the game ends on its own.
pub const MAX_ROUNDS: u32 = 15;

/// Minimum score that pays out.
pub const WIN_THRESHOLD: u32 = 10;

/// Multiplier paid at exactly the win threshold (2x).
pub const BASE_MULTIPLIER: Multiplier = Multiplier::from_bps(20_000);

/// Added for every point above the win threshold (0.5x).
pub const MULTIPLIER_STEP: Multiplier = Multiplier::from_bps(5_000);

/// Payout multiplier in basis points, 10_000 = 1x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multiplier(u32);

impl Multiplier {
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    pub const fn bps(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 10_000;
        let frac = self.0 % 10_000;
        if frac == 0 {
            write!(f, "{}x", whole)
        } else {
            let digits = format!("{:04}", frac);
            write!(f, "{}.{}x", whole, digits.trim_end_matches('0'))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub max_rounds: u32,
    pub win_threshold: u32,
    pub base_multiplier: Multiplier,
    pub multiplier_step: Multiplier,
    pub min_wager: Amount,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            win_threshold: WIN_THRESHOLD,
            base_multiplier: BASE_MULTIPLIER,
            multiplier_step: MULTIPLIER_STEP,
            min_wager: Amount::ONE_YOCTO,
        }
    }
}

impl GameRules {
    /// Multiplier earned by `score`, or `None` below the win threshold.
    pub fn multiplier_for(&self, score: u32) -> Option<Multiplier> {
        if score < self.win_threshold {
            return None;
        }

        let extra = score - self.win_threshold;
        let bps = self
            .multiplier_step
            .bps()
            .saturating_mul(extra)
            .saturating_add(self.base_multiplier.bps());
        Some(Multiplier::from_bps(bps))
    }

    pub fn is_win(&self, score: u32) -> bool {
        score >= self.win_threshold
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(GameError::Rules("max_rounds must be greater than 0".to_string()));
        }

        if self.base_multiplier.bps() == 0 {
            return Err(GameError::Rules(
                "base_multiplier must be greater than 0".to_string(),
            ));
        }

        if self.min_wager.is_zero() {
            return Err(GameError::Rules("min_wager must be positive".to_string()));
        }

        Ok(())
    }
}
