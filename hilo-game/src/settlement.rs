//! Wager settlement.
//!
//! The coordinator turns a finished session into a payout and a best-score
//! update. Remote work (payout transfer, best-score write) runs on spawned
//! tasks tagged with the session id; its failures are logged and reported but
//! never change the settlement outcome.

use crate::game::SessionState;
use crate::rules::GameRules;
use crate::{GameError, Result};
use futures::future::join_all;
use futures::FutureExt;
use hilo_ledger::{
    Amount, FunctionCall, Gas, GatewayConfig, GatewayStatus, LedgerError, LedgerGateway, Receipt,
    ViewCall,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const GET_BEST_SCORE: &str = "getBestScore";
pub const SET_BEST_SCORE: &str = "setBestScore";

/// Payout for `score` on `wager`: nothing below the win threshold, otherwise
/// `wager * (base + step * (score - threshold))` rounded down to a base unit.
/// A payout that does not fit in an [`Amount`] is `InvalidWager`.
pub fn compute_payout(score: u32, wager: Amount, rules: &GameRules) -> Result<Amount> {
    match rules.multiplier_for(score) {
        Some(multiplier) => wager.checked_mul_bps(multiplier.bps()).ok_or_else(|| {
            GameError::InvalidWager(format!("payout of {} on {} overflows", multiplier, wager))
        }),
        None => Ok(Amount::ZERO),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub session_id: Uuid,
    pub score: u32,
    pub won: bool,
    pub payout: Amount,
    pub new_best_score: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    PayoutTransfer,
    BestScorePersist,
}

/// Result of one fire-and-forget settlement call.
#[derive(Debug)]
pub struct EffectReport {
    pub session_id: Uuid,
    pub kind: EffectKind,
    pub result: Result<Receipt>,
}

/// Best-score high-water mark shared with in-flight settlement tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    /// Session allowed to reconcile `confirmed_best`.
    pub session_id: Option<Uuid>,
    pub best_score: u32,
    /// Last value the ledger is known to hold.
    pub confirmed_best: Option<u32>,
}

/// Gateway handle plus the contract and timeout the coordinator calls it with.
#[derive(Clone)]
pub struct LedgerLink {
    gateway: Arc<dyn LedgerGateway>,
    contract_id: String,
    request_timeout: Duration,
    gas: Gas,
    deposit: Amount,
}

impl LedgerLink {
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: &GatewayConfig) -> Self {
        Self {
            gateway,
            contract_id: config.contract_id.clone(),
            request_timeout: config.request_timeout,
            gas: config.default_gas,
            deposit: config.default_deposit,
        }
    }

    pub fn from_status(status: &GatewayStatus, config: &GatewayConfig) -> Option<Self> {
        status.handle().map(|gateway| Self::new(gateway, config))
    }

}

#[derive(Debug)]
struct ActiveSession {
    id: Uuid,
    wager: Amount,
    settled: Option<SettlementOutcome>,
}

pub struct SettlementCoordinator {
    rules: GameRules,
    link: Option<LedgerLink>,
    board: Arc<RwLock<ScoreBoard>>,
    pending_wager: Option<Amount>,
    active: Option<ActiveSession>,
    effects: Vec<JoinHandle<EffectReport>>,
}

impl SettlementCoordinator {
    pub fn new(rules: GameRules, link: Option<LedgerLink>) -> Self {
        Self {
            rules,
            link,
            board: Arc::new(RwLock::new(ScoreBoard::default())),
            pending_wager: None,
            active: None,
            effects: Vec::new(),
        }
    }

    /// Coordinator with no gateway; settles locally only.
    pub fn offline(rules: GameRules) -> Self {
        Self::new(rules, None)
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn is_online(&self) -> bool {
        self.link.is_some()
    }

    pub fn account_id(&self) -> Option<String> {
        self.link.as_ref().and_then(|link| link.gateway.account_id())
    }

    pub fn best_score(&self) -> u32 {
        self.board.read().best_score
    }

    pub fn score_board(&self) -> ScoreBoard {
        self.board.read().clone()
    }

    pub fn pending_wager(&self) -> Option<Amount> {
        self.pending_wager
    }

    pub fn active_wager(&self) -> Option<Amount> {
        self.active.as_ref().map(|a| a.wager)
    }

    pub fn pending_effects(&self) -> usize {
        self.effects.len()
    }

    /// Parse player input such as `"2.5"` into a wager amount.
    pub fn parse_wager(input: &str) -> Result<Amount> {
        input
            .parse::<Amount>()
            .map_err(|e| GameError::InvalidWager(e.to_string()))
    }

    /// Record the wager for the next session.
    pub fn accept_wager(&mut self, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(GameError::InvalidWager("wager must be positive".to_string()));
        }
        if amount < self.rules.min_wager {
            return Err(GameError::InvalidWager(format!(
                "minimum wager is {}",
                self.rules.min_wager
            )));
        }
        // the top score's payout must fit, so every lower score's does too
        if let Some(top) = self.rules.multiplier_for(self.rules.max_rounds) {
            if amount.checked_mul_bps(top.bps()).is_none() {
                return Err(GameError::InvalidWager(format!(
                    "{} at {} exceeds the largest payable amount",
                    amount, top
                )));
            }
        }

        self.pending_wager = Some(amount);
        tracing::info!("Accepted wager of {}", amount);
        Ok(())
    }

    /// Bind the pending wager to a new session and make it the only session
    /// whose settlement tasks may reconcile the score board.
    pub fn begin_session(&mut self, session_id: Uuid) -> Result<Amount> {
        let wager = self.pending_wager.take().ok_or(GameError::WagerRequired)?;

        if let Some(previous) = &self.active {
            if previous.settled.is_none() {
                tracing::debug!("Session {} abandoned before settlement", previous.id);
            }
        }

        self.active = Some(ActiveSession {
            id: session_id,
            wager,
            settled: None,
        });
        self.board.write().session_id = Some(session_id);
        Ok(wager)
    }

    /// Settle a finished session. Repeated calls for the same session return
    /// the first outcome and start no new ledger calls.
    pub fn settle(&mut self, session: &SessionState) -> Result<SettlementOutcome> {
        if !session.is_game_over {
            return Err(GameError::InvalidState(format!(
                "session {} has not finished",
                session.session_id
            )));
        }

        let active = match self.active.as_mut() {
            Some(active) if active.id == session.session_id => active,
            _ => {
                return Err(GameError::InvalidState(format!(
                    "session {} is not the active session",
                    session.session_id
                )));
            }
        };

        if let Some(outcome) = &active.settled {
            tracing::debug!("Session {} already settled", session.session_id);
            return Ok(outcome.clone());
        }

        let payout = compute_payout(session.score, active.wager, &self.rules)?;
        let new_best_score = {
            let mut board = self.board.write();
            if session.score > board.best_score {
                board.best_score = session.score;
                true
            } else {
                false
            }
        };

        let outcome = SettlementOutcome {
            session_id: session.session_id,
            score: session.score,
            won: self.rules.is_win(session.score),
            payout,
            new_best_score,
        };
        active.settled = Some(outcome.clone());

        tracing::info!(
            "Session {} settled: score {}, {}, payout {}",
            outcome.session_id,
            outcome.score,
            if outcome.won { "won" } else { "lost" },
            outcome.payout
        );

        self.spawn_effects(&outcome);
        Ok(outcome)
    }

    fn spawn_effects(&mut self, outcome: &SettlementOutcome) {
        let wants_payout = !outcome.payout.is_zero();
        if !wants_payout && !outcome.new_best_score {
            return;
        }

        let Some(link) = self.link.clone() else {
            tracing::warn!(
                "Ledger offline, session {} settled locally only",
                outcome.session_id
            );
            return;
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(
                    "No async runtime, skipping ledger calls for session {}",
                    outcome.session_id
                );
                return;
            }
        };

        // finished calls already logged their result
        self.effects.retain(|handle| !handle.is_finished());

        let session_id = outcome.session_id;

        if wants_payout {
            let link = link.clone();
            let payout = outcome.payout;
            self.effects.push(runtime.spawn(async move {
                let result = send_payout(&link, payout).await;
                match &result {
                    Ok(receipt) => tracing::info!(
                        "Session {} payout of {} sent ({})",
                        session_id,
                        payout,
                        receipt.id
                    ),
                    Err(e) => tracing::warn!("Session {} payout not sent: {}", session_id, e),
                }
                EffectReport {
                    session_id,
                    kind: EffectKind::PayoutTransfer,
                    result,
                }
            }));
        }

        if outcome.new_best_score {
            let board = self.board.clone();
            let score = outcome.score;
            self.effects.push(runtime.spawn(async move {
                let result = persist_best_score(&link, score).await;
                match &result {
                    Ok(_) => {
                        let mut scores = board.write();
                        if scores.session_id == Some(session_id) {
                            scores.confirmed_best = Some(score);
                            tracing::info!("Session {} best score {} saved", session_id, score);
                        } else {
                            tracing::debug!(
                                "Ignoring best score confirmation from stale session {}",
                                session_id
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Session {} best score not saved: {}", session_id, e)
                    }
                }
                EffectReport {
                    session_id,
                    kind: EffectKind::BestScorePersist,
                    result,
                }
            }));
        }
    }

    /// Best-effort read of the account's best score. Falls back to the local
    /// high-water mark on any failure; never raises it above what either side
    /// has seen.
    pub async fn load_best_score(&self, account_id: Option<&str>) -> u32 {
        match self.fetch_best_score(account_id).await {
            Ok(Some(remote)) => {
                let mut scores = self.board.write();
                scores.best_score = scores.best_score.max(remote);
                scores.confirmed_best = Some(remote);
                tracing::info!("Loaded best score {} from ledger", remote);
                scores.best_score
            }
            Ok(None) => self.best_score(),
            Err(e) => {
                let local = self.best_score();
                tracing::warn!("Could not load best score, using {}: {}", local, e);
                local
            }
        }
    }

    async fn fetch_best_score(&self, account_id: Option<&str>) -> Result<Option<u32>> {
        let link = self
            .link
            .as_ref()
            .ok_or_else(|| GameError::GatewayUnavailable("ledger is offline".to_string()))?;

        let account_id = match account_id {
            Some(id) => id.to_string(),
            None => link.gateway.account_id().ok_or_else(|| {
                GameError::GatewayUnavailable("account identity not yet available".to_string())
            })?,
        };

        let call = ViewCall::new(GET_BEST_SCORE)
            .on_contract(&link.contract_id)
            .with_args(json!({ "account_id": account_id }));
        let value = with_timeout(link.request_timeout, link.gateway.view_method(call)).await?;

        parse_score(&value)
    }

    /// Reports of the settlement calls that have already completed. Never
    /// waits; calls still in flight stay pending.
    pub fn drain_finished(&mut self) -> Vec<EffectReport> {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|handle| handle.is_finished());
        self.effects = running;

        finished
            .into_iter()
            .filter_map(|handle| match handle.now_or_never() {
                Some(Ok(report)) => Some(report),
                Some(Err(e)) => {
                    tracing::warn!("Settlement task did not complete: {}", e);
                    None
                }
                None => None,
            })
            .collect()
    }

    /// Wait for in-flight settlement calls and collect their reports.
    pub async fn drain(&mut self) -> Vec<EffectReport> {
        let handles = std::mem::take(&mut self.effects);

        join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!("Settlement task did not complete: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for SettlementCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementCoordinator")
            .field("rules", &self.rules)
            .field("online", &self.link.is_some())
            .field("board", &*self.board.read())
            .field("pending_wager", &self.pending_wager)
            .field("active", &self.active)
            .field("pending_effects", &self.effects.len())
            .finish()
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = hilo_ledger::Result<T>>,
) -> hilo_ledger::Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| LedgerError::timeout(format!("no response after {:?}", limit)))?
}

async fn send_payout(link: &LedgerLink, payout: Amount) -> Result<Receipt> {
    let account_id = link.gateway.account_id().ok_or_else(|| {
        GameError::SettlementTransferFailed("no signed-in account to receive the payout".to_string())
    })?;

    with_timeout(link.request_timeout, link.gateway.transfer(&account_id, payout))
        .await
        .map_err(|e| GameError::SettlementTransferFailed(e.to_string()))
}

async fn persist_best_score(link: &LedgerLink, score: u32) -> Result<Receipt> {
    let call = FunctionCall::new(SET_BEST_SCORE)
        .on_contract(&link.contract_id)
        .with_args(json!({ "score": score }))
        .with_gas(link.gas)
        .with_deposit(link.deposit);

    with_timeout(link.request_timeout, link.gateway.call_method(call))
        .await
        .map_err(|e| GameError::SettlementPersistFailed(e.to_string()))
}

fn parse_score(value: &Value) -> Result<Option<u32>> {
    let score = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    score
        .map(Some)
        .ok_or_else(|| LedgerError::rpc(format!("unexpected best score value: {}", value)).into())
}
