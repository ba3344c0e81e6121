use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One comparable entry: a label and the metric the player guesses against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogueItem {
    pub label: String,
    pub metric: u64,
}

impl CatalogueItem {
    pub fn new(label: impl Into<String>, metric: u64) -> Self {
        Self {
            label: label.into(),
            metric,
        }
    }
}

/// Immutable, cheaply clonable item list.
#[derive(Debug, Clone)]
pub struct Catalogue {
    items: Arc<[CatalogueItem]>,
}

impl Catalogue {
    pub fn new(items: Vec<CatalogueItem>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Search terms with average monthly search volumes.
    pub fn builtin() -> Self {
        const TERMS: &[(&str, u64)] = &[
            ("Facebook", 1_680_000_000),
            ("YouTube", 1_140_000_000),
            ("Weather", 995_000_000),
            ("Amazon", 782_000_000),
            ("Google", 681_000_000),
            ("Gmail", 574_000_000),
            ("Instagram", 552_000_000),
            ("Twitter", 436_000_000),
            ("Netflix", 412_000_000),
            ("Walmart", 339_000_000),
            ("Yahoo", 326_000_000),
            ("Hotmail", 274_000_000),
            ("eBay", 261_000_000),
            ("News", 247_000_000),
            ("Craigslist", 226_000_000),
            ("ESPN", 204_000_000),
            ("Fox News", 196_000_000),
            ("Minecraft", 173_000_000),
            ("CNN", 169_000_000),
            ("NFL", 151_000_000),
            ("Bitcoin", 135_000_000),
            ("Roblox", 124_000_000),
            ("Zoom", 114_000_000),
            ("PayPal", 102_000_000),
            ("Target", 92_000_000),
            ("NBA", 89_000_000),
            ("Spotify", 86_000_000),
            ("LinkedIn", 83_000_000),
            ("Twitch", 78_000_000),
            ("Home Depot", 74_000_000),
            ("Apple", 71_000_000),
            ("TikTok", 67_000_000),
            ("Reddit", 62_000_000),
            ("Costco", 58_000_000),
            ("GameStop", 42_000_000),
            ("Airbnb", 36_000_000),
            ("Zillow", 31_000_000),
            ("DoorDash", 28_000_000),
            ("Tesla", 26_000_000),
            ("Snapchat", 24_000_000),
            ("Robinhood", 19_000_000),
            ("Uber", 17_000_000),
            ("Disney+", 15_000_000),
            ("Coinbase", 13_000_000),
            ("NEAR Protocol", 820_000),
            ("Blockchain", 6_100_000),
            ("Smart Contract", 580_000),
            ("Web3", 2_700_000),
            ("NFT", 4_200_000),
            ("Crypto Wallet", 1_400_000),
        ];

        Self::new(
            TERMS
                .iter()
                .map(|(label, metric)| CatalogueItem::new(*label, *metric))
                .collect(),
        )
    }

    /// Load a JSON array of `{ "label": .., "metric": .. }` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let items: Vec<CatalogueItem> = serde_json::from_str(content)?;
        if items.len() < 2 {
            return Err(GameError::Catalogue(format!(
                "need at least 2 items, got {}",
                items.len()
            )));
        }
        Ok(Self::new(items))
    }

    pub fn items(&self) -> &[CatalogueItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&CatalogueItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
