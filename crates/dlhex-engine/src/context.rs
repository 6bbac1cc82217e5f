//! Engine context: configuration, ontology table and open reasoners of one run

use crate::config::EngineConfig;
use crate::EngineError;
use dlhex_core::Symbol;
use dlhex_ontology::{CachedOntology, Classification, Ontology, OntologyCache, OntologyError, OntologyLoader};
use dlhex_reasoner::{DlReasoner, ReasonerProvider, SaturationProvider};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Counters of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Candidate models produced by the base solver
    pub candidates: usize,
    /// Candidates rejected by the post-check
    pub rejected: usize,
    pub accepted: usize,
    /// Queries sent to a DL reasoner
    pub oracle_calls: usize,
    /// Support sets learned over all DL atoms
    pub support_sets: usize,
    /// Nogoods learned from failed post-checks
    pub counterexamples: usize,
}

/// Shared state threaded through learning, encoding and verification
pub struct EngineContext {
    config: EngineConfig,
    loader: Box<dyn OntologyLoader>,
    provider: Box<dyn ReasonerProvider>,
    cache: OntologyCache,
    reasoners: HashMap<(Symbol, bool), Box<dyn DlReasoner>>,
    pub stats: EngineStats,
}

impl EngineContext {
    /// Context using the saturation reasoner
    pub fn new<L: OntologyLoader + 'static>(config: EngineConfig, loader: L) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            provider: Box::new(SaturationProvider),
            cache: OntologyCache::new(),
            reasoners: HashMap::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn with_provider<P: ReasonerProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Box::new(provider);
        self.reasoners.clear();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register an ontology without going through the loader
    pub fn insert_ontology(&mut self, ontology: Ontology) -> Arc<CachedOntology> {
        self.cache.insert(ontology)
    }

    /// Cached ontology, loaded on first use
    pub fn ontology(&mut self, name: &str) -> Result<Arc<CachedOntology>, EngineError> {
        let known = self.cache.get(name).is_some();
        let entry = self.cache.get_or_load(name, self.loader.as_ref())?;
        if !known {
            info!(
                "Loaded ontology {}: {} concepts, {} roles, {} individuals, {} assertions",
                name,
                entry.ontology().concepts.len(),
                entry.ontology().roles.len(),
                entry.ontology().individuals.len(),
                entry.ontology().abox.len()
            );
        }
        Ok(entry)
    }

    /// Reasoner for `ontology`, opened once per ABox mode and reused across queries
    pub fn reasoner(
        &mut self,
        ontology: &str,
        use_abox: bool,
    ) -> Result<&mut (dyn DlReasoner + 'static), EngineError> {
        let key = (Symbol::new(ontology), use_abox);
        if !self.reasoners.contains_key(&key) {
            let entry = self.ontology(ontology)?;
            let reasoner = self.provider.open(entry, use_abox)?;
            self.reasoners.insert(key.clone(), reasoner);
        }
        self.reasoners
            .get_mut(&key)
            .map(|r| r.as_mut())
            .ok_or_else(|| EngineError::Configuration(format!("no reasoner for {}", ontology)))
    }
}

/// Classification of a cached ontology
pub fn classification(entry: &CachedOntology) -> Result<&Classification, EngineError> {
    entry.classification().map_err(|e| match e {
        OntologyError::Classification(message) => EngineError::Classification(message),
        other => EngineError::OntologyLoad(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlhex_ontology::{Assertion, MemoryOntologyLoader};

    fn context() -> EngineContext {
        let loader = MemoryOntologyLoader::new().with(
            Ontology::new("family")
                .subclass("Person", "Animal")
                .fact(Assertion::concept("Person", "bob", false)),
        );
        EngineContext::new(EngineConfig::default(), loader)
    }

    #[test]
    fn test_ontology_is_loaded_once() {
        let mut ctx = context();
        let a = ctx.ontology("family").unwrap();
        let b = ctx.ontology("family").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(matches!(ctx.ontology("nope"), Err(EngineError::OntologyLoad(_))));
    }

    #[test]
    fn test_reasoners_per_abox_mode() {
        let mut ctx = context();
        assert!(ctx.reasoner("family", true).unwrap().is_consistent().unwrap());
        let with_abox = ctx.reasoner("family", true).unwrap().individuals();
        assert_eq!(with_abox, vec![Symbol::new("bob")]);
        let classification = classification(&ctx.ontology("family").unwrap()).map(|c| c.fact_count());
        assert!(classification.unwrap() > 0);
    }
}
