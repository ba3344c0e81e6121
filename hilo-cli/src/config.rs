use anyhow::Context;
use hilo_game::{Catalogue, GameRules};
use hilo_ledger::{GatewayConfig, Network};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hilo")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub network: Network,
    /// Score contract; the network default when absent.
    pub contract_id: Option<String>,
    pub rules: GameRules,
    /// JSON catalogue file; the built-in search terms when absent.
    pub catalogue: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            network: Network::Sandbox,
            contract_id: None,
            rules: GameRules::default(),
            catalogue: None,
        }
    }
}

impl CliConfig {
    /// Read `<data_dir>/config.json`, falling back to defaults when it is missing.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.rules.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(self.network);
        match &self.contract_id {
            Some(contract_id) => config.with_contract(contract_id),
            None => config,
        }
    }

    /// `override_path`, else the configured file, else the built-in list.
    pub fn catalogue(&self, override_path: Option<&Path>) -> anyhow::Result<Catalogue> {
        match override_path.or(self.catalogue.as_deref()) {
            Some(path) => Catalogue::from_json_file(path)
                .with_context(|| format!("loading catalogue {}", path.display())),
            None => Ok(Catalogue::builtin()),
        }
    }
}
