pub mod corpus;
pub mod filters;
pub mod generality;
pub mod inclusion;
pub mod matrix;
pub mod normalize;
pub mod ranker;
pub mod similarity;

use thiserror::Error;

use crate::models::CardId;

pub use corpus::{CardFrequencyTable, CorpusIndex, CorpusSummary};
pub use generality::GeneralityScorer;
pub use inclusion::InclusionModel;
pub use matrix::{BitRow, IncidenceMatrix};
pub use ranker::{Ranking, RecommendationQuery, Recommender, DEFAULT_SHORTLIST_SIZE};

/// Error types for the scoring engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("No card metadata for '{0}'")]
    MissingMetadata(CardId),
    #[error("No corpus deck can legally include '{0}'")]
    ZeroMaxInclusion(CardId),
}

pub type EngineResult<T> = Result<T, EngineError>;
