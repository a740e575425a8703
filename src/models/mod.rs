pub mod card;
pub mod deck;
pub mod recommendation;

pub use card::{CardId, CardMetadata, Color, ColorIdentity, InvalidColor};
pub use deck::{distinct_nonbasic, is_basic_land, Deck, RawCorpus, BASIC_LANDS};
pub use recommendation::{
    GeneralityEntry, GeneralityMean, GeneralityTag, Recommendation, RecommendationMode,
};
