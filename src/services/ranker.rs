use std::collections::{HashMap, HashSet};

use crate::models::{distinct_nonbasic, CardId, ColorIdentity, Recommendation, RecommendationMode};
use crate::services::corpus::CorpusIndex;
use crate::services::filters::{recommendation_filter, CardFilter, ColorLegal};
use crate::services::generality::geometric_mean;
use crate::services::inclusion::InclusionModel;
use crate::services::matrix::{nonland_universe, IncidenceMatrix};
use crate::services::similarity::SimilarityEngine;
use crate::services::EngineResult;
use crate::storage::MetadataStore;

/// Number of candidates kept after composite ranking
pub const DEFAULT_SHORTLIST_SIZE: usize = 20;

const INCLUSION_WEIGHT: f64 = 0.5;
const REPRESENTATION_WEIGHT: f64 = 0.5;

/// Parameters of a single recommendation run
#[derive(Debug, Clone, Default)]
pub struct RecommendationQuery {
    pub decklist: Vec<CardId>,
    /// Target identity; derived from the decklist when absent
    pub identity: Option<ColorIdentity>,
    pub exclude: HashSet<CardId>,
    pub mode: RecommendationMode,
}

impl RecommendationQuery {
    pub fn new(decklist: Vec<CardId>) -> Self {
        Self {
            decklist,
            ..Default::default()
        }
    }

    pub fn with_identity(mut self, identity: ColorIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn excluding<I: IntoIterator<Item = CardId>>(mut self, cards: I) -> Self {
        self.exclude.extend(cards);
        self
    }

    pub fn with_mode(mut self, mode: RecommendationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A candidate card with its accumulated similarity votes
struct Candidate<'c> {
    card: &'c CardId,
    votes: Vec<f64>,
}

/// A candidate after scoring
struct Scored<'c> {
    card: &'c CardId,
    composite: f64,
    synergy: f64,
}

/// A ranked list together with the identity it was filtered by
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub identity: ColorIdentity,
    pub recommendations: Vec<Recommendation>,
}

/// Ranks cards for a query deck against the corpus
pub struct Recommender<'a> {
    index: &'a CorpusIndex,
    metadata: &'a MetadataStore,
    shortlist_size: usize,
}

impl<'a> Recommender<'a> {
    pub fn new(index: &'a CorpusIndex, metadata: &'a MetadataStore) -> Self {
        Self {
            index,
            metadata,
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
        }
    }

    pub fn with_shortlist_size(mut self, shortlist_size: usize) -> Self {
        self.shortlist_size = shortlist_size;
        self
    }

    /// Returns the explicit identity, or the union of the decklist's identities.
    ///
    /// Every decklist card is looked up either way, so an unknown card fails here.
    pub fn resolve_identity(
        &self,
        decklist: &[CardId],
        identity: Option<ColorIdentity>,
    ) -> EngineResult<ColorIdentity> {
        let derived = InclusionModel::new(self.index, self.metadata)
            .deck_color_identity(&distinct_nonbasic(decklist))?;
        Ok(identity.unwrap_or(derived))
    }

    /// Similarity of the query to every corpus deck, in deck-name order.
    ///
    /// Decks whose card set equals the query's are reported as `None`.
    fn deck_similarities(&self, query: &HashSet<CardId>, cards: &[CardId]) -> EngineResult<Vec<Option<f64>>> {
        let universe = nonland_universe(self.index, self.metadata)?;
        let matrix = IncidenceMatrix::build(self.index, &universe);
        let query_row = matrix.project(cards);
        let scores = SimilarityEngine::new(&matrix).scores(&query_row);

        Ok(self
            .index
            .decks()
            .zip(scores)
            .map(|(deck, score)| (deck.card_set() != query).then_some(score))
            .collect())
    }

    /// Suggests cards to add to the query deck
    pub fn recommend(&self, query: &RecommendationQuery) -> EngineResult<Vec<Recommendation>> {
        self.recommend_ranking(query).map(|ranking| ranking.recommendations)
    }

    /// [`Recommender::recommend`], also reporting the identity used
    pub fn recommend_ranking(&self, query: &RecommendationQuery) -> EngineResult<Ranking> {
        let cards = distinct_nonbasic(&query.decklist);
        let query_set: HashSet<CardId> = cards.iter().cloned().collect();
        let identity = self.resolve_identity(&cards, query.identity)?;
        let similarities = self.deck_similarities(&query_set, &cards)?;

        // Votes: each similar deck votes for the cards the query lacks
        let mut candidates: Vec<Candidate<'a>> = Vec::new();
        let mut positions: HashMap<&'a CardId, usize> = HashMap::new();
        for (deck, similarity) in self.index.decks().zip(similarities) {
            let Some(similarity) = similarity else {
                continue;
            };
            for card in deck.cards() {
                if query_set.contains(card) {
                    continue;
                }
                let slot = *positions.entry(card).or_insert_with(|| {
                    candidates.push(Candidate {
                        card,
                        votes: Vec::new(),
                    });
                    candidates.len() - 1
                });
                candidates[slot].votes.push(similarity);
            }
        }

        let inclusion = InclusionModel::new(self.index, self.metadata);
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            scored.push(Scored {
                card: candidate.card,
                composite: self.composite(&inclusion, candidate.card)?,
                synergy: geometric_mean(&candidate.votes),
            });
        }

        let filter = recommendation_filter(identity, &query.exclude, query.mode);
        let mut shortlist = Vec::new();
        for entry in scored {
            if filter.admits(entry.card, self.metadata.get(entry.card)?) {
                shortlist.push(entry);
            }
        }

        tracing::debug!(
            identity = %identity,
            mode = ?query.mode,
            candidates = candidates.len(),
            admitted = shortlist.len(),
            "Candidates scored and filtered"
        );

        shortlist.sort_by(|a, b| b.composite.total_cmp(&a.composite));
        shortlist.truncate(self.shortlist_size);
        shortlist.sort_by(|a, b| b.synergy.total_cmp(&a.synergy));

        Ok(Ranking {
            identity,
            recommendations: self.emit(&inclusion, shortlist)?,
        })
    }

    /// Scores the cards already in the query deck by how well they fit the
    /// decks most similar to it
    pub fn compare(
        &self,
        decklist: &[CardId],
        identity: Option<ColorIdentity>,
    ) -> EngineResult<Vec<Recommendation>> {
        self.compare_ranking(decklist, identity)
            .map(|ranking| ranking.recommendations)
    }

    /// [`Recommender::compare`], also reporting the identity used
    pub fn compare_ranking(
        &self,
        decklist: &[CardId],
        identity: Option<ColorIdentity>,
    ) -> EngineResult<Ranking> {
        let cards = distinct_nonbasic(decklist);
        let query_set: HashSet<CardId> = cards.iter().cloned().collect();
        let identity = self.resolve_identity(&cards, identity)?;
        let similarities = self.deck_similarities(&query_set, &cards)?;

        let mut votes: HashMap<&CardId, Vec<f64>> = HashMap::new();
        for (deck, similarity) in self.index.decks().zip(similarities) {
            let Some(similarity) = similarity else {
                continue;
            };
            for card in deck.cards().iter().filter(|c| query_set.contains(*c)) {
                votes.entry(card).or_default().push(similarity);
            }
        }

        let inclusion = InclusionModel::new(self.index, self.metadata);
        let legal = ColorLegal(identity);
        let mut scored = Vec::new();
        for card in &cards {
            if !legal.admits(card, self.metadata.get(card)?) {
                continue;
            }
            // Cards no other deck plays have no votes and score 0
            let synergy = votes.get(card).map_or(0.0, |v| geometric_mean(v));
            scored.push(Scored {
                card,
                composite: self.composite(&inclusion, card)?,
                synergy,
            });
        }
        scored.sort_by(|a, b| b.synergy.total_cmp(&a.synergy));

        Ok(Ranking {
            identity,
            recommendations: self.emit(&inclusion, scored)?,
        })
    }

    fn composite(&self, inclusion: &InclusionModel<'_>, card: &CardId) -> EngineResult<f64> {
        Ok(INCLUSION_WEIGHT * inclusion.inclusion_ratio(card)?
            + REPRESENTATION_WEIGHT * inclusion.representation_ratio(card))
    }

    fn emit(
        &self,
        inclusion: &InclusionModel<'_>,
        ranked: Vec<Scored<'_>>,
    ) -> EngineResult<Vec<Recommendation>> {
        let frequencies = self.index.frequencies();
        ranked
            .into_iter()
            .enumerate()
            .map(|(position, entry)| {
                Ok(Recommendation {
                    rank: position + 1,
                    card: entry.card.clone(),
                    name: self.metadata.get(entry.card)?.display_name.clone(),
                    count: frequencies.count(entry.card),
                    max_inclusion: inclusion.max_inclusion(entry.card)?,
                    score: entry.composite,
                    synergy: entry.synergy,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::corpus::tests::raw_corpus;
    use crate::services::EngineError;
    use crate::storage::metadata::tests::metadata;

    fn ids(names: &[&str]) -> Vec<CardId> {
        names.iter().map(|n| CardId::new(n)).collect()
    }

    fn fixture() -> (CorpusIndex, MetadataStore) {
        let raw = raw_corpus(&[
            (
                "ub",
                "Turbo",
                "Alpha",
                &["Sol Ring", "Brainstorm", "Dark Ritual", "Thassa's Oracle", "Polluted Delta", "Island"],
            ),
            (
                "ub",
                "Turbo",
                "Bravo",
                &["Sol Ring", "Brainstorm", "Dark Ritual", "Demonic Consultation", "Polluted Delta"],
            ),
            ("ub", "Stax", "Charlie", &["Sol Ring", "Brainstorm", "Rhystic Study", "Watery Grave"]),
            ("r", "Storm", "Delta", &["Sol Ring", "Lightning Bolt", "Mountain", "Bloodstained Mire"]),
            (
                "wubrg",
                "Control",
                "Echo",
                &["Sol Ring", "Brainstorm", "Swords to Plowshares", "Polluted Delta", "Command Tower"],
            ),
        ]);
        let store = metadata(&[
            ("Sol Ring", "", "Artifact"),
            ("Brainstorm", "U", "Instant"),
            ("Dark Ritual", "B", "Instant"),
            ("Thassa's Oracle", "U", "Creature — Merfolk Wizard"),
            ("Demonic Consultation", "B", "Instant"),
            ("Rhystic Study", "U", "Enchantment"),
            ("Lightning Bolt", "R", "Instant"),
            ("Swords to Plowshares", "W", "Instant"),
            ("Polluted Delta", "UB", "Land"),
            ("Watery Grave", "UB", "Land — Island Swamp"),
            ("Bloodstained Mire", "BR", "Land"),
            ("Command Tower", "", "Land"),
            ("Mind Over Matter", "U", "Enchantment"),
        ]);
        (CorpusIndex::build(&raw), store)
    }

    fn query() -> Vec<CardId> {
        ids(&["Sol Ring", "Brainstorm", "Dark Ritual", "Island"])
    }

    fn names(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_recommend_spells_within_derived_identity() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);

        let result = recommender.recommend(&RecommendationQuery::new(query())).unwrap();

        assert_eq!(
            names(&result),
            vec!["Thassa's Oracle", "Demonic Consultation", "Rhystic Study"]
        );
        let oracle = &result[0];
        assert_eq!(oracle.rank, 1);
        assert_eq!(oracle.count, 1);
        assert_eq!(oracle.max_inclusion, 4);
        assert!((oracle.score - 0.225).abs() < 1e-12);
        assert!((oracle.synergy - 0.75).abs() < 1e-9);
        assert_eq!(oracle.synergy_label(), "0.750");
        assert!((result[2].synergy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_lands_mode() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let request = RecommendationQuery::new(query()).with_mode(RecommendationMode::Lands);

        let result = recommender.recommend(&request).unwrap();

        assert_eq!(names(&result), vec!["Polluted Delta", "Watery Grave", "Command Tower"]);
        let expected_delta = (0.75f64 * 0.75 * 0.5).powf(1.0 / 3.0);
        assert!((result[0].synergy - expected_delta).abs() < 1e-9);
        assert_eq!(result[0].count, 3);
        assert_eq!(result[2].max_inclusion, 5);
    }

    #[test]
    fn test_shortlist_is_cut_by_composite_then_sorted_by_synergy() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store).with_shortlist_size(3);
        let request = RecommendationQuery::new(query()).with_identity(ColorIdentity::ALL);

        let result = recommender.recommend(&request).unwrap();

        // Composite keeps Swords (0.6), Bolt (0.35), Oracle (0.225); Consultation
        // ties Oracle but comes later. Synergy then reorders the three.
        assert_eq!(
            names(&result),
            vec!["Thassa's Oracle", "Swords to Plowshares", "Lightning Bolt"]
        );
        let ranks: Vec<usize> = result.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_excluded_cards_are_never_suggested() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);

        for excluded in ["Thassa's Oracle", "Rhystic Study", "Polluted Delta"] {
            for mode in [RecommendationMode::Spells, RecommendationMode::Lands] {
                let request = RecommendationQuery::new(query())
                    .excluding([CardId::new(excluded)])
                    .with_mode(mode);
                let result = recommender.recommend(&request).unwrap();
                assert!(result.iter().all(|r| r.card != CardId::new(excluded)));
            }
        }
    }

    #[test]
    fn test_land_and_spell_results_are_disjoint() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);

        for identity in [None, Some(ColorIdentity::ALL)] {
            let mut request = RecommendationQuery::new(query());
            request.identity = identity;
            let spells = recommender.recommend(&request).unwrap();
            let lands = recommender
                .recommend(&request.clone().with_mode(RecommendationMode::Lands))
                .unwrap();

            let spell_cards: HashSet<&CardId> = spells.iter().map(|r| &r.card).collect();
            assert!(lands.iter().all(|r| !spell_cards.contains(&r.card)));
            assert!(!lands.is_empty());
        }
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let request = RecommendationQuery::new(query()).with_identity(ColorIdentity::ALL);

        let render = |recs: Vec<Recommendation>| {
            recs.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("\n")
        };
        let first = render(recommender.recommend(&request).unwrap());
        let second = render(recommender.recommend(&request).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_query_card_without_metadata_is_fatal() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let mut decklist = query();
        decklist.push(CardId::new("Totally Unknown"));
        let request = RecommendationQuery::new(decklist).with_identity(ColorIdentity::ALL);

        assert_eq!(
            recommender.recommend(&request),
            Err(EngineError::MissingMetadata(CardId::new("Totally Unknown")))
        );
    }

    #[test]
    fn test_corpus_card_without_metadata_is_fatal() {
        let (index, _) = fixture();
        let store = metadata(&[("Sol Ring", "", "Artifact"), ("Brainstorm", "U", "Instant")]);
        let recommender = Recommender::new(&index, &store);

        let result = recommender.recommend(&RecommendationQuery::new(ids(&["Sol Ring"])));
        assert!(matches!(result, Err(EngineError::MissingMetadata(_))));
    }

    #[test]
    fn test_nothing_legal_yields_empty_result() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let request = RecommendationQuery::new(query())
            .with_identity(ColorIdentity::COLORLESS)
            .excluding(ids(&["Sol Ring"]));

        assert!(recommender.recommend(&request).unwrap().is_empty());
    }

    #[test]
    fn test_identical_corpus_deck_is_skipped() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        // Same cards as "Charlie", the only deck playing Rhystic Study
        let decklist = ids(&["Sol Ring", "Brainstorm", "Rhystic Study", "Watery Grave"]);

        let result = recommender.compare(&decklist, None).unwrap();

        let rhystic = result
            .iter()
            .find(|r| r.card == CardId::new("Rhystic Study"))
            .unwrap();
        assert_eq!(rhystic.synergy, 0.0);
        assert_eq!(rhystic.count, 1);
        assert_eq!(result.last().map(|r| r.synergy), Some(0.0));
    }

    #[test]
    fn test_two_deck_scenario_scores_zero_similarity() {
        let raw = raw_corpus(&[
            ("u", "A", "A", &["Sol Ring", "Island"]),
            ("r", "B", "B", &["Sol Ring", "Mountain"]),
        ]);
        let index = CorpusIndex::build(&raw);
        let store = metadata(&[("Sol Ring", "", "Artifact")]);
        let recommender = Recommender::new(&index, &store);

        let result = recommender
            .recommend(&RecommendationQuery::new(ids(&["Island"])))
            .unwrap();

        assert_eq!(names(&result), vec!["Sol Ring"]);
        assert_eq!(result[0].synergy, 0.0);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[0].max_inclusion, 2);
    }

    #[test]
    fn test_empty_decklist_scores_zero_synergy() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);

        let ranking = recommender
            .recommend_ranking(&RecommendationQuery::new(Vec::new()))
            .unwrap();
        assert_eq!(ranking.identity, ColorIdentity::COLORLESS);
        assert_eq!(names(&ranking.recommendations), vec!["Sol Ring"]);
        assert!(ranking.recommendations.iter().all(|r| r.synergy == 0.0));

        let lands = recommender
            .recommend(&RecommendationQuery::new(Vec::new()).with_mode(RecommendationMode::Lands))
            .unwrap();
        assert_eq!(names(&lands), vec!["Command Tower"]);
        assert!(lands.iter().all(|r| r.synergy == 0.0));

        // Basic lands alone leave nothing to compare
        assert!(recommender.compare(&[], None).unwrap().is_empty());
        assert!(recommender.compare(&ids(&["Island", "Swamp"]), None).unwrap().is_empty());
    }

    #[test]
    fn test_ranking_reports_resolved_identity() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);

        let derived = recommender
            .recommend_ranking(&RecommendationQuery::new(query()))
            .unwrap();
        assert_eq!(derived.identity, ColorIdentity::from_letters("UB").unwrap());
        assert_eq!(
            derived.recommendations,
            recommender.recommend(&RecommendationQuery::new(query())).unwrap()
        );

        let explicit = recommender
            .compare_ranking(&query(), Some(ColorIdentity::ALL))
            .unwrap();
        assert_eq!(explicit.identity, ColorIdentity::ALL);
        assert_eq!(explicit.recommendations.len(), 3);
    }

    #[test]
    fn test_compare_scores_existing_cards() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let mut decklist = query();
        decklist.push(CardId::new("Mind Over Matter"));

        let result = recommender.compare(&decklist, None).unwrap();

        assert_eq!(
            names(&result),
            vec!["Dark Ritual", "Brainstorm", "Sol Ring", "Mind Over Matter"]
        );
        assert!((result[0].synergy - 0.75).abs() < 1e-9);
        assert!((result[1].synergy - 0.375f64.sqrt()).abs() < 1e-9);
        let sol_ring = (0.75f64 * 0.75 * 0.5 * 0.25 * 0.5).powf(0.2);
        assert!((result[2].synergy - sol_ring).abs() < 1e-9);
        assert_eq!(result[3].synergy, 0.0);
        assert_eq!(result[3].count, 0);
    }

    #[test]
    fn test_compare_drops_off_identity_cards() {
        let (index, store) = fixture();
        let recommender = Recommender::new(&index, &store);
        let blue = ColorIdentity::from_letters("U").unwrap();

        let result = recommender.compare(&query(), Some(blue)).unwrap();
        assert_eq!(names(&result), vec!["Brainstorm", "Sol Ring"]);
    }
}
