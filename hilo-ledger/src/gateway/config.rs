use crate::error::{LedgerError, Result};
use crate::types::{Amount, Gas, DEFAULT_GAS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
    Sandbox,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
            Network::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "sandbox" => Ok(Network::Sandbox),
            _ => Err(LedgerError::config(format!(
                "Invalid network: {}. Supported networks: testnet, mainnet, sandbox",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub network: Network,
    pub node_url: String,
    pub wallet_url: String,
    pub helper_url: String,
    pub explorer_url: String,
    pub contract_id: String,
    pub app_key_prefix: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub default_gas: Gas,
    pub default_deposit: Amount,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            node_url: "https://rpc.testnet.near.org".to_string(),
            wallet_url: "https://wallet.testnet.near.org".to_string(),
            helper_url: "https://helper.testnet.near.org".to_string(),
            explorer_url: "https://explorer.testnet.near.org".to_string(),
            contract_id: "guest-book.testnet".to_string(),
            app_key_prefix: "higher-lower-game".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            default_gas: DEFAULT_GAS,
            default_deposit: Amount::ZERO,
        }
    }
}

impl GatewayConfig {
    pub fn new(network: Network) -> Self {
        let mut config = Self::default();
        config.network = network;

        match network {
            Network::Testnet => {
                // keep defaults for testnet
            }
            Network::Mainnet => {
                config.node_url = "https://rpc.mainnet.near.org".to_string();
                config.wallet_url = "https://wallet.near.org".to_string();
                config.helper_url = "https://helper.mainnet.near.org".to_string();
                config.explorer_url = "https://explorer.near.org".to_string();
                config.contract_id = "guest-book.near".to_string();
            }
            Network::Sandbox => {
                config.node_url = "http://localhost:3030".to_string();
                config.wallet_url = "http://localhost:4000/wallet".to_string();
                config.helper_url = "http://localhost:3000".to_string();
                config.explorer_url = "http://localhost:9001".to_string();
                config.contract_id = "guest-book.test.near".to_string();
            }
        }

        config
    }

    pub fn with_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = contract_id.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_url.is_empty() {
            return Err(LedgerError::config("Node URL cannot be empty"));
        }

        if self.contract_id.is_empty() {
            return Err(LedgerError::config("Contract id cannot be empty"));
        }

        if self.app_key_prefix.is_empty() {
            return Err(LedgerError::config("App key prefix cannot be empty"));
        }

        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(LedgerError::config("Timeouts must be greater than 0"));
        }

        if self.default_gas == 0 {
            return Err(LedgerError::config("Default gas must be greater than 0"));
        }

        Ok(())
    }
}
