use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits in one whole token.
pub const TOKEN_DECIMALS: usize = 24;

/// Base units (yocto) per whole token.
pub const YOCTO_PER_TOKEN: u128 = 1_000_000_000_000_000_000_000_000;

pub type Gas = u64;

/// 30 TGas, enough for a simple contract write.
pub const DEFAULT_GAS: Gas = 30_000_000_000_000;

/// Ledger amount in the ledger's native integer unit.
///
/// Serialized as a decimal token string (`"1.5"`) so config files stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const ONE_YOCTO: Amount = Amount(1);

    pub const fn from_yocto(yocto: u128) -> Self {
        Self(yocto)
    }

    /// Whole tokens. Overflows above ~3.4e14 tokens; see `checked_from_tokens`.
    pub const fn from_tokens(tokens: u64) -> Self {
        Self(tokens as u128 * YOCTO_PER_TOKEN)
    }

    pub const fn checked_from_tokens(tokens: u64) -> Option<Self> {
        match (tokens as u128).checked_mul(YOCTO_PER_TOKEN) {
            Some(yocto) => Some(Self(yocto)),
            None => None,
        }
    }

    pub const fn as_yocto(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Multiply by a basis-point ratio (10_000 = 1x), rounding down to the
    /// nearest base unit.
    pub fn checked_mul_bps(self, bps: u32) -> Option<Amount> {
        let bps = u128::from(bps);
        // split so only the whole part can overflow; the remainder term is < 10_000 * u32::MAX
        let whole = (self.0 / 10_000).checked_mul(bps)?;
        let part = (self.0 % 10_000) * bps / 10_000;
        whole.checked_add(part).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / YOCTO_PER_TOKEN;
        let frac = self.0 % YOCTO_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = TOKEN_DECIMALS);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(LedgerError::invalid_amount(format!("'{}' is not a number", s)));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(LedgerError::invalid_amount(format!(
                "'{}' is not a non-negative decimal",
                s
            )));
        }
        if frac.len() > TOKEN_DECIMALS {
            return Err(LedgerError::invalid_amount(format!(
                "'{}' has more than {} decimal places",
                s, TOKEN_DECIMALS
            )));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| LedgerError::invalid_amount(format!("'{}' is too large", s)))?
        };
        let frac: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = TOKEN_DECIMALS);
            padded
                .parse()
                .map_err(|_| LedgerError::invalid_amount(format!("'{}' is not a number", s)))?
        };

        whole
            .checked_mul(YOCTO_PER_TOKEN)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or_else(|| LedgerError::invalid_amount(format!("'{}' is too large", s)))
    }
}

impl TryFrom<String> for Amount {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// Account ids follow the NEAR naming rules: 2-64 chars of lowercase
/// alphanumerics separated by `-`, `_` or `.`.
pub fn validate_account_id(account_id: &str) -> Result<()> {
    let len_ok = (2..=64).contains(&account_id.len());
    let chars_ok = account_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let edges_ok = !account_id.starts_with(['-', '_', '.']) && !account_id.ends_with(['-', '_', '.']);

    if len_ok && chars_ok && edges_ok {
        Ok(())
    } else {
        Err(LedgerError::InvalidAccount(account_id.to_string()))
    }
}

/// Read-only contract call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewCall {
    pub contract_id: Option<String>,
    pub method: String,
    pub args: Value,
}

impl ViewCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            contract_id: None,
            method: method.into(),
            args: Value::Object(Default::default()),
        }
    }

    pub fn on_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

/// State-changing contract call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub contract_id: Option<String>,
    pub method: String,
    pub args: Value,
    pub gas: Gas,
    pub deposit: Amount,
}

impl FunctionCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            contract_id: None,
            method: method.into(),
            args: Value::Object(Default::default()),
            gas: DEFAULT_GAS,
            deposit: Amount::ZERO,
        }
    }

    pub fn on_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_gas(mut self, gas: Gas) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_deposit(mut self, deposit: Amount) -> Self {
        self.deposit = deposit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptKind {
    FunctionCall { contract_id: String, method: String },
    Transfer { receiver_id: String, amount: Amount },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub signer_id: String,
    pub kind: ReceiptKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}
