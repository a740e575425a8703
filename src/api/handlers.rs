use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::{
    CardId, ColorIdentity, GeneralityEntry, GeneralityMean, Recommendation, RecommendationMode,
};
use crate::services::normalize::parse_decklist_text;
use crate::services::similarity::set_jaccard;
use crate::services::{CorpusSummary, Ranking, RecommendationQuery};
use crate::storage::Snapshot;

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Decklist text, one "<qty> <card name>" per line
    #[serde(default)]
    pub decklist: String,
    /// Color letters, e.g. `["W", "U"]` or `["WU"]`
    pub identity: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Suggest lands instead of spells
    #[serde(default)]
    pub lands: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub decklist: String,
    pub identity: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralityRequest {
    #[serde(default)]
    pub decklist: String,
    #[serde(default)]
    pub mean: GeneralityMean,
}

#[derive(Debug, Deserialize)]
pub struct DeckPairQuery {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub decks: usize,
    pub cards: usize,
    pub loaded_at: DateTime<Utc>,
}

impl From<&Snapshot> for HealthResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            status: "healthy",
            decks: snapshot.index().deck_count(),
            cards: snapshot.index().frequencies().unique_cards(),
            loaded_at: snapshot.loaded_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub identity: ColorIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RecommendationMode>,
    pub recommendations: Vec<Recommendation>,
}

impl RankingResponse {
    fn new(ranking: Ranking, mode: Option<RecommendationMode>) -> Self {
        Self {
            identity: ranking.identity,
            mode,
            recommendations: ranking.recommendations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeckSimilarityResponse {
    pub a: String,
    pub b: String,
    pub similarity: f64,
}

// Helpers

fn parse_decklist(text: &str) -> AppResult<Vec<CardId>> {
    let cards: Vec<CardId> = parse_decklist_text(text)
        .iter()
        .map(|line| CardId::new(line))
        .collect();
    if cards.is_empty() {
        return Err(AppError::InvalidInput("No decklist provided".to_string()));
    }
    Ok(cards)
}

fn parse_identity(letters: Option<Vec<String>>) -> AppResult<Option<ColorIdentity>> {
    letters
        .map(|letters| {
            ColorIdentity::try_from(letters)
                .map_err(|e| AppError::InvalidInput(format!("Invalid color identity: {}", e)))
        })
        .transpose()
}

/// Runs CPU-bound engine work off the async runtime
async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from(state.snapshot.as_ref()))
}

/// Suggest cards to add to a deck
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RankingResponse>> {
    let query = RecommendationQuery {
        decklist: parse_decklist(&request.decklist)?,
        identity: parse_identity(request.identity)?,
        exclude: request.exclude.iter().map(|name| CardId::new(name)).collect(),
        mode: RecommendationMode::from_land_flag(request.lands),
    };

    tracing::info!(
        request_id = %request_id,
        cards = query.decklist.len(),
        excluded = query.exclude.len(),
        mode = ?query.mode,
        "Recommending cards"
    );

    let snapshot = Arc::clone(&state.snapshot);
    let shortlist_size = state.shortlist_size;
    let response = run_blocking(move || {
        let ranking = snapshot
            .recommender()
            .with_shortlist_size(shortlist_size)
            .recommend_ranking(&query)?;
        Ok(RankingResponse::new(ranking, Some(query.mode)))
    })
    .await?;

    tracing::info!(
        request_id = %request_id,
        identity = %response.identity,
        results = response.recommendations.len(),
        "Recommendations ready"
    );

    Ok(Json(response))
}

/// Score the cards already in a deck
pub async fn compare(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<CompareRequest>,
) -> AppResult<Json<RankingResponse>> {
    let decklist = parse_decklist(&request.decklist)?;
    let identity = parse_identity(request.identity)?;

    tracing::info!(request_id = %request_id, cards = decklist.len(), "Comparing deck to corpus");

    let snapshot = Arc::clone(&state.snapshot);
    let response = run_blocking(move || {
        let ranking = snapshot.recommender().compare_ranking(&decklist, identity)?;
        Ok(RankingResponse::new(ranking, None))
    })
    .await?;

    Ok(Json(response))
}

/// Rank a deck's generality against every corpus deck
pub async fn generality(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GeneralityRequest>,
) -> AppResult<Json<Vec<GeneralityEntry>>> {
    let decklist = parse_decklist(&request.decklist)?;
    let mean = request.mean;

    tracing::info!(request_id = %request_id, cards = decklist.len(), mean = ?mean, "Scoring generality");

    let snapshot = Arc::clone(&state.snapshot);
    let entries =
        run_blocking(move || Ok(snapshot.generality().generality_info(&decklist, mean))).await?;

    Ok(Json(entries))
}

/// Card representation statistics for the whole corpus
pub async fn corpus_summary(State(state): State<AppState>) -> AppResult<Json<CorpusSummary>> {
    let snapshot = Arc::clone(&state.snapshot);
    let summary = run_blocking(move || Ok(snapshot.index().summary())).await?;
    Ok(Json(summary))
}

/// Jaccard similarity between two corpus decks' non-basic card sets
pub async fn deck_similarity(
    State(state): State<AppState>,
    Query(pair): Query<DeckPairQuery>,
) -> AppResult<Json<DeckSimilarityResponse>> {
    let index = state.snapshot.index();
    let deck = |name: &str| {
        index
            .deck(name)
            .ok_or_else(|| AppError::NotFound(format!("Deck not found: {}", name)))
    };
    let similarity = set_jaccard(deck(&pair.a)?.card_set(), deck(&pair.b)?.card_set());

    Ok(Json(DeckSimilarityResponse {
        a: pair.a,
        b: pair.b,
        similarity,
    }))
}
