use crate::{Catalogue, CatalogueItem, GameError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Where the draw order comes from.
#[derive(Debug, Clone)]
pub enum DeckOrder {
    /// Uniform Fisher-Yates permutation on every shuffle.
    Shuffled(StdRng),
    /// Catalogue order, for replays and tests.
    AsListed,
}

impl DeckOrder {
    pub fn random() -> Self {
        DeckOrder::Shuffled(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        DeckOrder::Shuffled(StdRng::seed_from_u64(seed))
    }
}

/// Draw order over an immutable catalogue: a permutation of indices plus a
/// cursor. Drawing only advances the cursor; nothing is removed.
#[derive(Debug, Clone)]
pub struct Deck {
    catalogue: Catalogue,
    order: Vec<usize>,
    cursor: usize,
    source: DeckOrder,
}

impl Deck {
    pub fn new(catalogue: Catalogue, source: DeckOrder) -> Self {
        let mut deck = Self {
            catalogue,
            order: Vec::new(),
            cursor: 0,
            source,
        };
        deck.shuffle();
        deck
    }

    /// Re-permute the full catalogue and rewind the cursor.
    pub fn shuffle(&mut self) {
        self.order = (0..self.catalogue.len()).collect();
        if let DeckOrder::Shuffled(rng) = &mut self.source {
            self.order.shuffle(rng);
        }
        self.cursor = 0;
    }

    pub fn draw(&mut self) -> Result<CatalogueItem> {
        let index = *self.order.get(self.cursor).ok_or(GameError::DeckExhausted)?;
        self.cursor += 1;

        self.catalogue
            .get(index)
            .cloned()
            .ok_or(GameError::DeckExhausted)
    }

    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Catalogue indices in draw order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}
