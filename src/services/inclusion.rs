use crate::models::{CardId, ColorIdentity};
use crate::services::corpus::CorpusIndex;
use crate::services::{EngineError, EngineResult};
use crate::storage::MetadataStore;

/// Relates a card's popularity to the number of decks that could play it
pub struct InclusionModel<'a> {
    index: &'a CorpusIndex,
    metadata: &'a MetadataStore,
    /// Decks able to include a card, per card color identity
    legal_decks: [usize; ColorIdentity::COMBINATIONS],
}

impl<'a> InclusionModel<'a> {
    pub fn new(index: &'a CorpusIndex, metadata: &'a MetadataStore) -> Self {
        let buckets: Vec<(ColorIdentity, usize)> = index
            .color_counts()
            .iter()
            .map(|(key, count)| (ColorIdentity::from_bucket_key(key), *count))
            .collect();

        let mut legal_decks = [0; ColorIdentity::COMBINATIONS];
        for (slot, legal) in legal_decks.iter_mut().enumerate() {
            let identity = ColorIdentity::from_index(slot);
            *legal = buckets
                .iter()
                .filter(|(bucket, _)| bucket.contains_all(identity))
                .map(|(_, count)| count)
                .sum();
        }

        Self {
            index,
            metadata,
            legal_decks,
        }
    }

    /// Number of corpus decks whose declared colors cover `identity`
    pub fn max_inclusion_for(&self, identity: ColorIdentity) -> usize {
        self.legal_decks[identity.index()]
    }

    /// Number of corpus decks that could legally include the card
    pub fn max_inclusion(&self, card: &CardId) -> EngineResult<usize> {
        let identity = self.metadata.get(card)?.color_identity;
        Ok(self.max_inclusion_for(identity))
    }

    /// Share of all corpus decks playing the card
    pub fn representation_ratio(&self, card: &CardId) -> f64 {
        self.index.frequencies().ratio(card)
    }

    /// Share of the decks able to play the card that actually do
    pub fn inclusion_ratio(&self, card: &CardId) -> EngineResult<f64> {
        let max_inclusion = self.max_inclusion(card)?;
        if max_inclusion == 0 {
            return Err(EngineError::ZeroMaxInclusion(card.clone()));
        }
        Ok(self.index.frequencies().count(card) as f64 / max_inclusion as f64)
    }

    /// Union of the color identities of every card in a decklist
    pub fn deck_color_identity<'c, I>(&self, decklist: I) -> EngineResult<ColorIdentity>
    where
        I: IntoIterator<Item = &'c CardId>,
    {
        decklist
            .into_iter()
            .try_fold(ColorIdentity::COLORLESS, |identity, card| {
                Ok(identity.union(self.metadata.get(card)?.color_identity))
            })
    }
}
