use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{CardId, Deck, RawCorpus};

/// Deck counts for every card in the corpus, basic lands excluded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFrequencyTable {
    counts: HashMap<CardId, usize>,
    total_decks: usize,
}

impl CardFrequencyTable {
    /// Number of decks containing the card (0 for unknown cards)
    pub fn count(&self, card: &CardId) -> usize {
        self.counts.get(card).copied().unwrap_or(0)
    }

    pub fn contains(&self, card: &CardId) -> bool {
        self.counts.contains_key(card)
    }

    pub fn total_decks(&self) -> usize {
        self.total_decks
    }

    pub fn unique_cards(&self) -> usize {
        self.counts.len()
    }

    /// Share of all corpus decks playing the card; 0 for an empty corpus
    pub fn ratio(&self, card: &CardId) -> f64 {
        if self.total_decks == 0 {
            return 0.0;
        }
        self.count(card) as f64 / self.total_decks as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardId, usize)> {
        self.counts.iter().map(|(card, count)| (card, *count))
    }
}

/// Flattened, analysis-ready view of the corpus
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    decks: BTreeMap<String, Deck>,
    frequencies: CardFrequencyTable,
    color_counts: BTreeMap<String, usize>,
}

impl CorpusIndex {
    /// Flattens the nested corpus and derives the frequency aggregates.
    ///
    /// Deck names are unique across the index; a name filed under two
    /// buckets keeps the entry visited last (buckets in key order).
    pub fn build(raw: &RawCorpus) -> Self {
        let mut decks: BTreeMap<String, Deck> = BTreeMap::new();

        for (colors, archetypes) in raw {
            for (archetype, lists) in archetypes {
                for (name, cards) in lists {
                    let deck = Deck::new(name.clone(), colors.clone(), archetype.clone(), cards);
                    if let Some(previous) = decks.insert(name.clone(), deck) {
                        tracing::warn!(
                            deck = %name,
                            previous_colors = %previous.colors,
                            previous_archetype = %previous.archetype,
                            colors = %colors,
                            archetype = %archetype,
                            "Duplicate deck name, keeping the later entry"
                        );
                    }
                }
            }
        }

        let mut counts: HashMap<CardId, usize> = HashMap::new();
        let mut color_counts: BTreeMap<String, usize> = BTreeMap::new();

        for deck in decks.values() {
            for card in deck.cards() {
                *counts.entry(card.clone()).or_insert(0) += 1;
            }
            *color_counts.entry(deck.colors.clone()).or_insert(0) += 1;
        }

        let frequencies = CardFrequencyTable {
            counts,
            total_decks: decks.len(),
        };

        tracing::debug!(
            decks = frequencies.total_decks,
            unique_cards = frequencies.unique_cards(),
            buckets = color_counts.len(),
            "Corpus index built"
        );

        Self {
            decks,
            frequencies,
            color_counts,
        }
    }

    /// Decks ordered by name
    pub fn decks(&self) -> impl Iterator<Item = &Deck> {
        self.decks.values()
    }

    pub fn deck(&self, name: &str) -> Option<&Deck> {
        self.decks.get(name)
    }

    pub fn deck_count(&self) -> usize {
        self.decks.len()
    }

    pub fn frequencies(&self) -> &CardFrequencyTable {
        &self.frequencies
    }

    /// Deck count per declared color bucket key
    pub fn color_counts(&self) -> &BTreeMap<String, usize> {
        &self.color_counts
    }

    /// Every corpus card, first-seen order over decks in name order
    pub fn cards_in_order(&self) -> Vec<&CardId> {
        let mut seen = std::collections::HashSet::new();
        self.decks()
            .flat_map(|deck| deck.cards())
            .filter(|card| seen.insert(*card))
            .collect()
    }

    /// Representation overview of the corpus
    pub fn summary(&self) -> CorpusSummary {
        let mut cards: Vec<CardRepresentation> = self
            .frequencies
            .iter()
            .map(|(card, count)| CardRepresentation {
                card: card.clone(),
                count,
                ratio: self.frequencies.ratio(card),
            })
            .collect();
        cards.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.card.cmp(&b.card)));

        let featured = (1..=SUMMARY_HISTOGRAM_MAX)
            .map(|times| FeaturedCount {
                times,
                cards: cards.iter().filter(|c| c.count == times).count(),
            })
            .collect();

        CorpusSummary {
            total_decks: self.frequencies.total_decks(),
            unique_cards: self.frequencies.unique_cards(),
            cards,
            featured,
        }
    }
}

/// Largest "featured N times" bucket reported by the summary
const SUMMARY_HISTOGRAM_MAX: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRepresentation {
    pub card: CardId,
    pub count: usize,
    pub ratio: f64,
}

/// Number of cards that appear in exactly `times` decks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedCount {
    pub times: usize,
    pub cards: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusSummary {
    pub total_decks: usize,
    pub unique_cards: usize,
    /// Cards sorted by ascending deck count
    pub cards: Vec<CardRepresentation>,
    pub featured: Vec<FeaturedCount>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Builds a raw corpus from `(colors, archetype, deck, cards)` tuples
    pub(crate) fn raw_corpus(entries: &[(&str, &str, &str, &[&str])]) -> RawCorpus {
        let mut raw: RawCorpus = BTreeMap::new();
        for (colors, archetype, name, cards) in entries {
            raw.entry(colors.to_string())
                .or_default()
                .entry(archetype.to_string())
                .or_default()
                .insert(
                    name.to_string(),
                    cards.iter().map(|c| CardId::new(c)).collect(),
                );
        }
        raw
    }

    #[test]
    fn test_empty_corpus() {
        let index = CorpusIndex::build(&RawCorpus::new());
        assert_eq!(index.deck_count(), 0);
        assert_eq!(index.frequencies().total_decks(), 0);
        assert_eq!(index.frequencies().ratio(&CardId::new("Sol Ring")), 0.0);
        assert!(index.color_counts().is_empty());
    }

    #[test]
    fn test_frequency_counts_decks_not_copies() {
        let raw = raw_corpus(&[
            ("ub", "Turbo", "A", &["Sol Ring", "Sol Ring", "Island", "Mana Crypt"]),
            ("r", "Storm", "B", &["Sol Ring", "Mountain"]),
        ]);
        let index = CorpusIndex::build(&raw);
        let freq = index.frequencies();

        assert_eq!(freq.total_decks(), 2);
        assert_eq!(freq.count(&CardId::new("Sol Ring")), 2);
        assert_eq!(freq.count(&CardId::new("Mana Crypt")), 1);
        assert_eq!(freq.count(&CardId::new("Island")), 0);
        assert!(!freq.contains(&CardId::new("Mountain")));
        assert_eq!(freq.ratio(&CardId::new("Mana Crypt")), 0.5);
    }

    #[test]
    fn test_color_counts_follow_declared_buckets() {
        let raw = raw_corpus(&[
            ("ub", "Turbo", "A", &["Sol Ring"]),
            ("ub", "Stax", "B", &["Sol Ring"]),
            ("Colorless", "Artifacts", "C", &["Sol Ring"]),
        ]);
        let index = CorpusIndex::build(&raw);
        assert_eq!(index.color_counts().get("ub"), Some(&2));
        assert_eq!(index.color_counts().get("Colorless"), Some(&1));
    }

    #[test]
    fn test_name_collision_keeps_last_entry() {
        let raw = raw_corpus(&[
            ("g", "Elves", "Same Name", &["Llanowar Elves"]),
            ("u", "Tempo", "Same Name", &["Counterspell"]),
        ]);
        let index = CorpusIndex::build(&raw);

        assert_eq!(index.deck_count(), 1);
        let deck = index.deck("Same Name").unwrap();
        assert_eq!(deck.colors, "u");
        assert!(deck.contains(&CardId::new("Counterspell")));
        // Aggregates describe the surviving deck only
        assert_eq!(index.frequencies().count(&CardId::new("Llanowar Elves")), 0);
        assert_eq!(index.color_counts().values().sum::<usize>(), 1);
    }

    #[test]
    fn test_decks_iterate_in_name_order() {
        let raw = raw_corpus(&[
            ("w", "X", "Zeta", &["Swords to Plowshares"]),
            ("b", "Y", "Alpha", &["Dark Ritual"]),
        ]);
        let index = CorpusIndex::build(&raw);
        let names: Vec<&str> = index.decks().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(
            index.cards_in_order(),
            vec![&CardId::new("Dark Ritual"), &CardId::new("Swords to Plowshares")]
        );
    }

    #[test]
    fn test_summary_histogram() {
        let raw = raw_corpus(&[
            ("u", "A", "One", &["Sol Ring", "Brainstorm"]),
            ("u", "A", "Two", &["Sol Ring", "Ponder"]),
            ("u", "A", "Three", &["Sol Ring"]),
        ]);
        let summary = CorpusIndex::build(&raw).summary();

        assert_eq!(summary.total_decks, 3);
        assert_eq!(summary.unique_cards, 3);
        assert_eq!(summary.cards.last().unwrap().card, CardId::new("Sol Ring"));
        assert_eq!(summary.cards[0].card, CardId::new("Brainstorm"));
        assert_eq!(summary.featured.len(), 10);
        assert_eq!(summary.featured[0], FeaturedCount { times: 1, cards: 2 });
        assert_eq!(summary.featured[2], FeaturedCount { times: 3, cards: 1 });
    }
}
