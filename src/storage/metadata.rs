use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{CardId, CardMetadata, ColorIdentity};
use crate::services::{EngineError, EngineResult};

/// Lands whose color identity the card database reports too narrowly for
/// deckbuilding purposes: each fetches (or makes) lands of these colors.
pub const LAND_IDENTITY_FIXES: [(&str, &str); 11] = [
    ("Marsh Flats", "WB"),
    ("Verdant Catacombs", "BG"),
    ("Misty Rainforest", "UG"),
    ("Scalding Tarn", "UR"),
    ("Arid Mesa", "RW"),
    ("Wooded Foothills", "RG"),
    ("Windswept Heath", "GW"),
    ("Flooded Strand", "WU"),
    ("Polluted Delta", "UB"),
    ("Bloodstained Mire", "BR"),
    ("Urborg, Tomb of Yawgmoth", "B"),
];

/// Card object as returned by the card database, reduced to what we keep
#[derive(Debug, Clone, Deserialize)]
pub struct ScryfallCard {
    #[serde(default)]
    pub color_identity: ColorIdentity,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub cmc: f64,
}

/// Read-only card metadata lookup keyed by normalized card name
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    cards: HashMap<CardId, CardMetadata>,
}

impl MetadataStore {
    pub fn new(cards: HashMap<CardId, CardMetadata>) -> Self {
        Self { cards }
    }

    /// Builds the lookup from a full card-database dump keyed by display name
    pub fn from_scryfall(dump: HashMap<String, ScryfallCard>) -> Self {
        let cards = dump
            .into_iter()
            .map(|(display_name, card)| {
                let metadata = CardMetadata {
                    color_identity: card.color_identity,
                    type_line: card.type_line,
                    mana_value: card.cmc,
                    display_name: display_name.clone(),
                };
                (CardId::new(&display_name), metadata)
            })
            .collect();
        Self { cards }
    }

    /// Looks up a card; a miss is a fatal engine error
    pub fn get(&self, card: &CardId) -> EngineResult<&CardMetadata> {
        self.cards
            .get(card)
            .ok_or_else(|| EngineError::MissingMetadata(card.clone()))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Overwrites the color identity of the lands in [`LAND_IDENTITY_FIXES`].
    ///
    /// Returns how many cards were updated.
    pub fn apply_land_identity_fixes(&mut self) -> usize {
        let mut fixed = 0;
        for (name, letters) in LAND_IDENTITY_FIXES {
            let Ok(identity) = ColorIdentity::from_letters(letters) else {
                continue;
            };
            match self.cards.get_mut(&CardId::new(name)) {
                Some(metadata) => {
                    tracing::debug!(
                        card = name,
                        before = %metadata.color_identity,
                        after = %identity,
                        "Fixing land color identity"
                    );
                    metadata.color_identity = identity;
                    fixed += 1;
                }
                None => tracing::debug!(card = name, "Land not in metadata, skipping fix"),
            }
        }
        fixed
    }
}

impl FromIterator<(CardId, CardMetadata)> for MetadataStore {
    fn from_iter<T: IntoIterator<Item = (CardId, CardMetadata)>>(iter: T) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}
