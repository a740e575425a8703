//! Deck × card incidence matrix
//!
//! Rows follow the corpus deck order (by name), columns follow the order of
//! the card universe handed to [`IncidenceMatrix::build`]. Each row is a
//! packed bit vector, so set intersection and union become word-wise
//! AND / OR with popcounts.

use std::collections::HashMap;

use crate::models::CardId;
use crate::services::corpus::CorpusIndex;
use crate::services::EngineResult;
use crate::storage::MetadataStore;

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-width binary row vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitRow {
    words: Vec<u64>,
    width: usize,
}

impl BitRow {
    pub fn zeros(width: usize) -> Self {
        Self {
            words: vec![0; width.div_ceil(WORD_BITS)],
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set(&mut self, column: usize) {
        debug_assert!(column < self.width);
        self.words[column / WORD_BITS] |= 1u64 << (column % WORD_BITS);
    }

    pub fn get(&self, column: usize) -> bool {
        column < self.width && self.words[column / WORD_BITS] & (1u64 << (column % WORD_BITS)) != 0
    }

    /// Number of set cells
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Size of the intersection with another row of the same width
    pub fn and_count(&self, other: &BitRow) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Size of the union with another row of the same width
    pub fn or_count(&self, other: &BitRow) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones() as usize)
            .sum()
    }
}

/// Builds the card universe the ranker compares decks over: every
/// non-basic card seen in the corpus that is not a land, in first-seen order.
pub fn nonland_universe(index: &CorpusIndex, metadata: &MetadataStore) -> EngineResult<Vec<CardId>> {
    let mut universe = Vec::new();
    for card in index.cards_in_order() {
        if !metadata.get(card)?.is_land() {
            universe.push(card.clone());
        }
    }
    Ok(universe)
}

/// Binary deck × card matrix over a fixed card universe
#[derive(Debug, Clone)]
pub struct IncidenceMatrix {
    deck_names: Vec<String>,
    columns: Vec<CardId>,
    column_index: HashMap<CardId, usize>,
    rows: Vec<BitRow>,
}

impl IncidenceMatrix {
    /// Builds one row per corpus deck and one column per universe card
    pub fn build(index: &CorpusIndex, universe: &[CardId]) -> Self {
        let mut columns = Vec::with_capacity(universe.len());
        let mut column_index = HashMap::with_capacity(universe.len());
        for card in universe {
            if !column_index.contains_key(card) {
                column_index.insert(card.clone(), columns.len());
                columns.push(card.clone());
            }
        }

        let mut deck_names = Vec::with_capacity(index.deck_count());
        let mut rows = Vec::with_capacity(index.deck_count());
        for deck in index.decks() {
            let mut row = BitRow::zeros(columns.len());
            for card in deck.cards() {
                if let Some(&column) = column_index.get(card) {
                    row.set(column);
                }
            }
            deck_names.push(deck.name.clone());
            rows.push(row);
        }

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            "Incidence matrix built"
        );

        Self {
            deck_names,
            columns,
            column_index,
            rows,
        }
    }

    /// Projects a decklist into the matrix column space.
    ///
    /// Cards outside the universe are ignored.
    pub fn project<'a, I>(&self, decklist: I) -> BitRow
    where
        I: IntoIterator<Item = &'a CardId>,
    {
        let mut row = BitRow::zeros(self.columns.len());
        for card in decklist {
            if let Some(&column) = self.column_index.get(card) {
                row.set(column);
            }
        }
        row
    }

    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    pub fn deck_names(&self) -> &[String] {
        &self.deck_names
    }

    pub fn columns(&self) -> &[CardId] {
        &self.columns
    }

    pub fn column_of(&self, card: &CardId) -> Option<usize> {
        self.column_index.get(card).copied()
    }

    /// Cell lookup by deck row and card column
    pub fn contains(&self, deck_index: usize, column: usize) -> bool {
        self.rows
            .get(deck_index)
            .is_some_and(|row| row.get(column))
    }
}
