//! Ontology cache

use crate::classification::Classification;
use crate::loader::OntologyLoader;
use crate::model::{Abox, Assertion, Ontology, Position};
use crate::OntologyError;
use dlhex_core::Symbol;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Set of baseline assertions that cannot hold together.
///
/// Holds one assertion of an unsatisfiable name or two clashing assertions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AboxConflict {
    pub assertions: Vec<Assertion>,
}

/// Minimal conflicts among the assertions of `abox`
pub fn find_conflicts(abox: &Abox, classification: &Classification) -> Vec<AboxConflict> {
    let assertions: Vec<Assertion> = abox.assertions().collect();
    let mut by_position: BTreeMap<Position, Vec<(Symbol, usize)>> = BTreeMap::new();
    let mut unsatisfiable = BTreeSet::new();

    for (index, assertion) in assertions.iter().enumerate() {
        for label in assertion.labels() {
            if classification.is_unsatisfiable(label.name.as_str()) {
                unsatisfiable.insert(index);
            }
            by_position
                .entry(label.position)
                .or_default()
                .push((label.name, index));
        }
    }

    let mut conflicts = BTreeSet::new();
    for index in &unsatisfiable {
        conflicts.insert(AboxConflict {
            assertions: vec![assertions[*index].clone()],
        });
    }
    for labels in by_position.values() {
        for (i, (a, ia)) in labels.iter().enumerate() {
            for (b, ib) in &labels[i + 1..] {
                if ia == ib || unsatisfiable.contains(ia) || unsatisfiable.contains(ib) {
                    continue;
                }
                if classification.clash(a.as_str(), b.as_str()) {
                    let mut pair = vec![assertions[*ia].clone(), assertions[*ib].clone()];
                    pair.sort();
                    conflicts.insert(AboxConflict { assertions: pair });
                }
            }
        }
    }
    conflicts.into_iter().collect()
}

/// Loaded ontology with lazily computed classification and conflict table
#[derive(Debug)]
pub struct CachedOntology {
    ontology: Ontology,
    classification: OnceLock<Classification>,
    conflicts: OnceLock<Vec<AboxConflict>>,
}

impl CachedOntology {
    pub fn new(ontology: Ontology) -> Self {
        Self {
            ontology,
            classification: OnceLock::new(),
            conflicts: OnceLock::new(),
        }
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn name(&self) -> &Symbol {
        &self.ontology.name
    }

    /// Classification, computed on first use
    pub fn classification(&self) -> Result<&Classification, OntologyError> {
        if let Some(classification) = self.classification.get() {
            return Ok(classification);
        }
        let computed = Classification::compute(&self.ontology)?;
        Ok(self.classification.get_or_init(|| computed))
    }

    /// Conflicts among the baseline assertions, computed on first use
    pub fn abox_conflicts(&self) -> Result<&[AboxConflict], OntologyError> {
        if let Some(conflicts) = self.conflicts.get() {
            return Ok(conflicts);
        }
        let computed = find_conflicts(&self.ontology.abox, self.classification()?);
        if !computed.is_empty() {
            info!(
                "Baseline ABox of {} has {} conflicts",
                self.ontology.name,
                computed.len()
            );
        }
        Ok(self.conflicts.get_or_init(|| computed))
    }

    pub fn is_abox_consistent(&self) -> Result<bool, OntologyError> {
        Ok(self.abox_conflicts()?.is_empty())
    }
}

/// Append-only table of ontologies keyed by name
#[derive(Debug, Default)]
pub struct OntologyCache {
    entries: HashMap<Symbol, Arc<CachedOntology>>,
}

impl OntologyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `name`, loading it on first request
    pub fn get_or_load(
        &mut self,
        name: &str,
        loader: &dyn OntologyLoader,
    ) -> Result<Arc<CachedOntology>, OntologyError> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(Arc::clone(entry));
        }
        debug!("Loading ontology {}", name);
        let mut ontology = loader.load(name)?;
        ontology.name = Symbol::new(name);
        Ok(self.insert(ontology))
    }

    /// Register an already loaded ontology; an existing entry with the same name wins
    pub fn insert(&mut self, ontology: Ontology) -> Arc<CachedOntology> {
        let entry = self
            .entries
            .entry(ontology.name.clone())
            .or_insert_with(|| Arc::new(CachedOntology::new(ontology)));
        Arc::clone(entry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CachedOntology>> {
        self.entries.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
