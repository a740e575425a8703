use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Display;

use super::CardId;

/// Which partition of the card pool a recommendation draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMode {
    /// Nonland cards only
    #[default]
    Spells,
    /// Land cards only
    Lands,
}

impl RecommendationMode {
    pub fn from_land_flag(lands: bool) -> Self {
        if lands {
            RecommendationMode::Lands
        } else {
            RecommendationMode::Spells
        }
    }
}

/// A single ranked card suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// 1-based position in the final list
    pub rank: usize,
    pub card: CardId,
    pub name: String,
    /// Number of corpus decks playing the card
    pub count: usize,
    /// Number of corpus decks that could legally play the card
    pub max_inclusion: usize,
    /// Composite filter-ranking score
    pub score: f64,
    /// Geometric mean of the similarity votes
    pub synergy: f64,
}

impl Recommendation {
    pub fn synergy_label(&self) -> String {
        format!("{:.3}", self.synergy)
    }
}

/// Emits the raw fields plus `synergy_label`, the synergy rounded for display
impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Recommendation", 8)?;
        state.serialize_field("rank", &self.rank)?;
        state.serialize_field("card", &self.card)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("max_inclusion", &self.max_inclusion)?;
        state.serialize_field("score", &self.score)?;
        state.serialize_field("synergy", &self.synergy)?;
        state.serialize_field("synergy_label", &self.synergy_label())?;
        state.end()
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. {} ({}/{}) {:.3}",
            self.rank, self.name, self.count, self.max_inclusion, self.synergy
        )
    }
}

/// Averaging used when scoring decklist generality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneralityMean {
    #[default]
    Arithmetic,
    Geometric,
}

/// Marks where a generality entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneralityTag {
    Corpus,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralityEntry {
    pub name: String,
    pub score: f64,
    pub tag: GeneralityTag,
}
