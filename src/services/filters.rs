//! Candidate filters for the recommendation ranker
//!
//! Each filter is a small predicate object; chains are built with
//! [`CardFilter::and`] so the full rule set reads as one conjunction.

use std::collections::HashSet;

use crate::models::{CardId, CardMetadata, ColorIdentity, RecommendationMode};

/// A predicate over a candidate card and its metadata
pub trait CardFilter {
    fn admits(&self, card: &CardId, metadata: &CardMetadata) -> bool;

    /// Conjunction of this filter and another
    fn and<F: CardFilter>(self, other: F) -> And<Self, F>
    where
        Self: Sized,
    {
        And(self, other)
    }
}

/// Admits a card only if both inner filters do
#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

impl<A: CardFilter, B: CardFilter> CardFilter for And<A, B> {
    fn admits(&self, card: &CardId, metadata: &CardMetadata) -> bool {
        self.0.admits(card, metadata) && self.1.admits(card, metadata)
    }
}

/// Card color identity must fit inside the target identity
#[derive(Debug, Clone, Copy)]
pub struct ColorLegal(pub ColorIdentity);

impl CardFilter for ColorLegal {
    fn admits(&self, _card: &CardId, metadata: &CardMetadata) -> bool {
        self.0.contains_all(metadata.color_identity)
    }
}

/// Card must not be on the exclusion list
#[derive(Debug, Clone, Copy)]
pub struct NotExcluded<'a>(pub &'a HashSet<CardId>);

impl CardFilter for NotExcluded<'_> {
    fn admits(&self, card: &CardId, _metadata: &CardMetadata) -> bool {
        !self.0.contains(card)
    }
}

/// Card must belong to the land or nonland partition selected by the mode
#[derive(Debug, Clone, Copy)]
pub struct ModeFilter(pub RecommendationMode);

impl CardFilter for ModeFilter {
    fn admits(&self, _card: &CardId, metadata: &CardMetadata) -> bool {
        match self.0 {
            RecommendationMode::Lands => metadata.is_land(),
            RecommendationMode::Spells => !metadata.is_land(),
        }
    }
}

/// Builds the ranker's standard chain: legality, exclusion, then mode
pub fn recommendation_filter(
    identity: ColorIdentity,
    exclude: &HashSet<CardId>,
    mode: RecommendationMode,
) -> impl CardFilter + '_ {
    ColorLegal(identity)
        .and(NotExcluded(exclude))
        .and(ModeFilter(mode))
}
