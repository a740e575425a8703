use crate::models::{distinct_nonbasic, CardId, GeneralityEntry, GeneralityMean, GeneralityTag};
use crate::services::corpus::CorpusIndex;

/// Name under which the query deck appears in generality listings
pub const QUERY_DECK_NAME: &str = "Your deck";

/// Mean of the values, 0 when empty
pub fn arithmetic_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Geometric mean of non-negative values, 0 when empty or when any value is 0
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| *v <= 0.0) {
        return 0.0;
    }
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Scores how generic a decklist's card choices are relative to the corpus
pub struct GeneralityScorer<'a> {
    index: &'a CorpusIndex,
}

impl<'a> GeneralityScorer<'a> {
    pub fn new(index: &'a CorpusIndex) -> Self {
        Self { index }
    }

    /// Representation ratio of each non-basic card; unknown cards count as 0
    fn ratios(&self, decklist: &[CardId]) -> Vec<f64> {
        let frequencies = self.index.frequencies();
        distinct_nonbasic(decklist)
            .iter()
            .map(|card| frequencies.ratio(card))
            .collect()
    }

    pub fn arithmetic(&self, decklist: &[CardId]) -> f64 {
        arithmetic_mean(&self.ratios(decklist))
    }

    pub fn geometric(&self, decklist: &[CardId]) -> f64 {
        geometric_mean(&self.ratios(decklist))
    }

    pub fn score(&self, decklist: &[CardId], mean: GeneralityMean) -> f64 {
        match mean {
            GeneralityMean::Arithmetic => self.arithmetic(decklist),
            GeneralityMean::Geometric => self.geometric(decklist),
        }
    }

    /// Scores every corpus deck plus the query, sorted ascending by score.
    ///
    /// Ties keep corpus decks in name order, with the query after them.
    pub fn generality_info(&self, decklist: &[CardId], mean: GeneralityMean) -> Vec<GeneralityEntry> {
        let mut entries: Vec<GeneralityEntry> = self
            .index
            .decks()
            .map(|deck| GeneralityEntry {
                name: deck.name.clone(),
                score: self.score(deck.cards(), mean),
                tag: GeneralityTag::Corpus,
            })
            .collect();

        entries.push(GeneralityEntry {
            name: QUERY_DECK_NAME.to_string(),
            score: self.score(decklist, mean),
            tag: GeneralityTag::Query,
        });

        entries.sort_by(|a, b| a.score.total_cmp(&b.score));
        entries
    }
}
