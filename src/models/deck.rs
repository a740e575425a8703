use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use super::CardId;

/// Nested corpus as stored on disk: color bucket → archetype → deck name → cards
pub type RawCorpus = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<CardId>>>>;

/// Basic lands never take part in similarity or frequency computations
pub const BASIC_LANDS: [&str; 10] = [
    "Plains",
    "Island",
    "Swamp",
    "Mountain",
    "Forest",
    "Snow-Covered Plains",
    "Snow-Covered Island",
    "Snow-Covered Swamp",
    "Snow-Covered Mountain",
    "Snow-Covered Forest",
];

/// Checks a card against the basic land stoplist
pub fn is_basic_land(card: &CardId) -> bool {
    static STOPLIST: OnceLock<HashSet<CardId>> = OnceLock::new();
    STOPLIST
        .get_or_init(|| BASIC_LANDS.iter().map(|name| CardId::new(name)).collect())
        .contains(card)
}

/// Deduplicates a card list, dropping basic lands and keeping first-seen order
pub fn distinct_nonbasic(cards: &[CardId]) -> Vec<CardId> {
    let mut seen = HashSet::new();
    cards
        .iter()
        .filter(|card| !is_basic_land(card))
        .filter(|card| seen.insert((*card).clone()))
        .cloned()
        .collect()
}

/// A corpus deck with basic lands removed and duplicates collapsed
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub name: String,
    /// Declared color bucket key the deck was filed under
    pub colors: String,
    pub archetype: String,
    cards: Vec<CardId>,
    card_set: HashSet<CardId>,
}

impl Deck {
    pub fn new(name: String, colors: String, archetype: String, cards: &[CardId]) -> Self {
        let cards = distinct_nonbasic(cards);
        let card_set = cards.iter().cloned().collect();
        Self {
            name,
            colors,
            archetype,
            cards,
            card_set,
        }
    }

    /// Cards in first-seen order
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn card_set(&self) -> &HashSet<CardId> {
        &self.card_set
    }

    pub fn contains(&self, card: &CardId) -> bool {
        self.card_set.contains(card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
