use crate::attention::AttentionAnalyzer;
use crate::config::{AppConfig, EvolutionConfig};
use crate::embedding::{EmbeddingProvider, HashingEmbedder};
use crate::engines::generation::{EvolutionEngine, ProgressCallback};
use crate::error::{EvolvError, Result};
use crate::types::{AttentionReport, EvolutionStatus, Neighbor, PopulationEntry, PopulationSnapshot, Vector};
use crate::vector::{CorpusIndex, VectorIndex};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Stored target direction together with the strings it was built from
#[derive(Debug, Clone)]
pub struct Barycenter {
    pub texts: Vec<String>,
    pub vector: Vector,
}

#[derive(Default)]
struct SessionState {
    barycenter: Option<Barycenter>,
    engine: Option<EvolutionEngine>,
    corpus: Option<CorpusIndex>,
}

/// The single process-wide session behind the request layer.
///
/// Writers (set_barycenter, initialize, step, reset, load_corpus) hold the
/// write lock for their whole call; readers share the read lock. Each writer
/// computes its new state before taking ownership of the old one, so an error
/// never leaves a half-updated barycenter or population behind.
pub struct SessionController {
    index: VectorIndex,
    analyzer: AttentionAnalyzer,
    defaults: EvolutionConfig,
    state: RwLock<SessionState>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &AppConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Session controller using {} embeddings (dimension {})",
            provider.name(),
            provider.dimension()
        );
        Ok(Self {
            index: VectorIndex::new(provider, &config.embedding),
            analyzer: AttentionAnalyzer::new(&config.attention),
            defaults: config.evolution.clone(),
            state: RwLock::new(SessionState::default()),
        })
    }

    /// Controller backed by the built-in [`HashingEmbedder`].
    pub fn with_hashing_embedder(config: &AppConfig) -> Result<Self> {
        let provider = Arc::new(HashingEmbedder::new(config.embedding.dimension));
        Self::new(provider, config)
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn vector_index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn set_barycenter(&self, strings: Vec<String>) -> Result<()> {
        let mut state = self.write();
        let vector = self
            .index
            .with_pinned(&strings, || self.index.barycenter(&strings))?;
        log::info!("Barycenter set from {} strings", strings.len());
        state.barycenter = Some(Barycenter {
            texts: strings,
            vector,
        });
        Ok(())
    }

    pub fn barycenter(&self) -> Option<Barycenter> {
        self.read().barycenter.clone()
    }

    pub fn similarities(&self, strings: &[String]) -> Result<Vec<f64>> {
        let state = self.read();
        let barycenter = state.barycenter.as_ref().ok_or(EvolvError::NoBarycenter)?;
        self.index.similarities(strings, &barycenter.vector)
    }

    /// Replace any existing session with a freshly seeded population.
    ///
    /// The targets' barycenter also becomes the stored barycenter.
    pub fn initialize_evolution(
        &self,
        target_strings: Vec<String>,
        population_size: usize,
        step_generations: usize,
        output_length: usize,
    ) -> Result<PopulationSnapshot> {
        let config = self
            .defaults
            .for_session(population_size, step_generations, output_length);
        self.initialize_with_config(target_strings, config)
    }

    pub fn initialize_with_config(
        &self,
        target_strings: Vec<String>,
        config: EvolutionConfig,
    ) -> Result<PopulationSnapshot> {
        let mut state = self.write();
        let pinned = target_strings.clone();
        let engine = self.index.with_pinned(&pinned, || {
            EvolutionEngine::initialize(config, target_strings, &self.index, &self.analyzer)
        })?;

        let barycenter = Barycenter {
            texts: pinned,
            vector: engine.population().target_barycenter().to_vec(),
        };

        let snapshot = engine.snapshot();
        state.barycenter = Some(barycenter);
        state.engine = Some(engine);
        Ok(snapshot)
    }

    pub fn step_evolution(&self) -> Result<PopulationSnapshot> {
        let mut state = self.write();
        let engine = state.engine.as_mut().ok_or(EvolvError::NoActiveSession)?;
        engine.step(&self.index, &self.analyzer)
    }

    pub fn step_evolution_with<C: ProgressCallback + ?Sized>(&self, callback: &mut C) -> Result<PopulationSnapshot> {
        let mut state = self.write();
        let engine = state.engine.as_mut().ok_or(EvolvError::NoActiveSession)?;
        engine.step_with(&self.index, &self.analyzer, callback)
    }

    pub fn status(&self) -> Result<EvolutionStatus> {
        let state = self.read();
        let engine = state.engine.as_ref().ok_or(EvolvError::NoActiveSession)?;
        Ok(engine.status())
    }

    pub fn hall_of_fame(&self) -> Result<Vec<PopulationEntry>> {
        let state = self.read();
        let engine = state.engine.as_ref().ok_or(EvolvError::NoActiveSession)?;
        Ok(engine.hall_of_fame_entries())
    }

    pub fn analyze_attention(&self, text: &str) -> Result<AttentionReport> {
        let state = self.read();
        let barycenter = state.barycenter.as_ref().ok_or(EvolvError::NoBarycenter)?;
        self.analyzer.analyze(&self.index, text, &barycenter.vector)
    }

    /// Drop the evolution session. The stored barycenter and corpus stay.
    pub fn reset_evolution(&self) {
        let mut state = self.write();
        if state.engine.take().is_some() {
            log::info!("Evolution session reset");
        }
    }

    pub fn has_active_session(&self) -> bool {
        self.read().engine.is_some()
    }

    pub fn load_corpus(&self, texts: Vec<String>) -> Result<usize> {
        let mut state = self.write();
        let corpus = CorpusIndex::build(&self.index, texts)?;
        let len = corpus.len();
        state.corpus = Some(corpus);
        Ok(len)
    }

    /// The `k` corpus texts closest to `query`.
    pub fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        let state = self.read();
        let corpus = state.corpus.as_ref().ok_or(EvolvError::NoCorpus)?;
        let vector = self.index.embed_one(query)?;
        corpus.search(&vector, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> SessionController {
        let mut config = AppConfig::default();
        config.embedding.dimension = 128;
        config.evolution.seed = Some(3);
        SessionController::with_hashing_embedder(&config).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_requires_barycenter() {
        let session = controller();
        assert!(matches!(session.similarities(&strings(&["x"])), Err(EvolvError::NoBarycenter)));
        assert!(matches!(session.analyze_attention("x"), Err(EvolvError::NoBarycenter)));
    }

    #[test]
    fn test_failed_set_keeps_previous_barycenter() {
        let session = controller();
        session.set_barycenter(strings(&["kept"])).unwrap();
        assert!(matches!(session.set_barycenter(Vec::new()), Err(EvolvError::EmptyInput)));
        assert_eq!(session.barycenter().map(|b| b.texts), Some(strings(&["kept"])));
    }

    #[test]
    fn test_initialize_replaces_barycenter() {
        let session = controller();
        session.set_barycenter(strings(&["old target"])).unwrap();
        session.initialize_evolution(strings(&["new target"]), 10, 1, 10).unwrap();

        let barycenter = session.barycenter().unwrap();
        assert_eq!(barycenter.texts, strings(&["new target"]));
        assert!(session.vector_index().cache().is_pinned("new target"));
    }

    fn capped_controller(cache_capacity: usize) -> SessionController {
        let mut config = AppConfig::default();
        config.embedding.dimension = 64;
        config.embedding.cache_capacity = cache_capacity;
        config.evolution.seed = Some(5);
        SessionController::with_hashing_embedder(&config).unwrap()
    }

    #[test]
    fn test_barycenter_constituents_stay_cached_when_capped() {
        let session = capped_controller(2);
        let texts = strings(&["alpha one", "beta two", "gamma three"]);
        session.set_barycenter(texts.clone()).unwrap();

        let cache = session.vector_index().cache();
        for text in &texts {
            assert!(cache.is_pinned(text));
            assert!(cache.contains(text));
        }
    }

    #[test]
    fn test_initialize_targets_stay_cached_when_capped() {
        let session = capped_controller(5);
        session.initialize_evolution(strings(&["target text"]), 10, 1, 11).unwrap();
        session.step_evolution().unwrap();

        let cache = session.vector_index().cache();
        assert!(cache.is_pinned("target text"));
        assert!(cache.contains("target text"));
    }

    #[test]
    fn test_failed_initialize_restores_pins() {
        let session = capped_controller(4);
        session.set_barycenter(strings(&["first"])).unwrap();
        assert!(session.initialize_evolution(strings(&["second"]), 3, 1, 5).is_err());

        let cache = session.vector_index().cache();
        assert!(cache.is_pinned("first"));
        assert!(!cache.is_pinned("second"));
        assert!(cache.contains("first"));
    }

    #[test]
    fn test_new_barycenter_releases_old_pins() {
        let session = capped_controller(0);
        session.set_barycenter(strings(&["old"])).unwrap();
        session.set_barycenter(strings(&["new"])).unwrap();

        let cache = session.vector_index().cache();
        assert!(!cache.is_pinned("old"));
        assert!(cache.is_pinned("new"));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let session = controller();
        session.initialize_evolution(strings(&["abc"]), 10, 1, 3).unwrap();
        assert!(session.has_active_session());

        session.reset_evolution();
        session.reset_evolution();
        assert!(!session.has_active_session());
        assert!(session.barycenter().is_some());
        assert!(matches!(session.step_evolution(), Err(EvolvError::NoActiveSession)));
    }

    #[test]
    fn test_nearest_requires_corpus() {
        let session = controller();
        assert!(matches!(session.nearest("query", 3), Err(EvolvError::NoCorpus)));

        session.load_corpus(strings(&["red apple", "blue sky", "green apple"])).unwrap();
        let neighbors = session.nearest("apple", 2).unwrap();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.text.contains("apple")));
    }
}
