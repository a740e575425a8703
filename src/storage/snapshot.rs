use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::config::{Config, MetadataFormat};
use crate::error::AppResult;
use crate::models::{CardId, CardMetadata, RawCorpus};
use crate::services::{CorpusIndex, GeneralityScorer, Recommender};
use crate::storage::metadata::{MetadataStore, ScryfallCard};

/// Immutable view of the corpus and card metadata shared by all requests
#[derive(Debug)]
pub struct Snapshot {
    index: CorpusIndex,
    metadata: MetadataStore,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(raw: &RawCorpus, metadata: MetadataStore) -> Self {
        Self {
            index: CorpusIndex::build(raw),
            metadata,
            loaded_at: Utc::now(),
        }
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.index, &self.metadata)
    }

    pub fn generality(&self) -> GeneralityScorer<'_> {
        GeneralityScorer::new(&self.index)
    }
}

/// Where the corpus and card metadata come from
///
/// Sources only decode data; building the index is left to [`load_snapshot`]
/// so every source produces the same snapshot for the same input.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Nested `{colors: {archetype: {deck: [card, ...]}}}` corpus
    async fn load_corpus(&self) -> AppResult<RawCorpus>;

    /// Card metadata keyed by normalized card name
    async fn load_metadata(&self) -> AppResult<MetadataStore>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Reads the corpus and metadata from JSON files on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    corpus_path: PathBuf,
    metadata_path: PathBuf,
    format: MetadataFormat,
    fix_land_identities: bool,
}

impl JsonFileSource {
    pub fn new(corpus_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            metadata_path: metadata_path.into(),
            format: MetadataFormat::default(),
            fix_land_identities: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.corpus_path, &config.metadata_path)
            .with_format(config.metadata_format)
            .with_land_fixes(config.fix_land_identities)
    }

    pub fn with_format(mut self, format: MetadataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_land_fixes(mut self, enabled: bool) -> Self {
        self.fix_land_identities = enabled;
        self
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let bytes = tokio::fs::read(path).await?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read JSON file");
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait::async_trait]
impl SnapshotSource for JsonFileSource {
    async fn load_corpus(&self) -> AppResult<RawCorpus> {
        read_json(&self.corpus_path).await
    }

    async fn load_metadata(&self) -> AppResult<MetadataStore> {
        let mut store = match self.format {
            MetadataFormat::Lite => {
                let entries: HashMap<String, CardMetadata> = read_json(&self.metadata_path).await?;
                entries
                    .into_iter()
                    .map(|(key, metadata)| (CardId::new(&key), metadata))
                    .collect()
            }
            MetadataFormat::Scryfall => {
                let dump: HashMap<String, ScryfallCard> = read_json(&self.metadata_path).await?;
                MetadataStore::from_scryfall(dump)
            }
        };

        if self.fix_land_identities {
            let fixed = store.apply_land_identity_fixes();
            tracing::info!(fixed, "Applied land color identity fixes");
        }

        Ok(store)
    }

    fn name(&self) -> &'static str {
        "json_files"
    }
}

/// Loads both halves from a source and builds the snapshot
pub async fn load_snapshot(source: &dyn SnapshotSource) -> AppResult<Snapshot> {
    let (corpus, metadata) = tokio::try_join!(source.load_corpus(), source.load_metadata())?;
    let snapshot = Snapshot::new(&corpus, metadata);

    tracing::info!(
        source = source.name(),
        decks = snapshot.index().deck_count(),
        unique_cards = snapshot.index().frequencies().unique_cards(),
        metadata_entries = snapshot.metadata().len(),
        "Snapshot loaded"
    );

    Ok(snapshot)
}
