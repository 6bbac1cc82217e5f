//! 飽和ベースの参照推論器
//!
//! 各個体・個体ペアのラベルを分類 (`sub`) の上位名で閉じ、補名の衝突で
//! 非整合を検出する。

use crate::oracle::{AxiomHandle, ConceptExpr, DlReasoner, ReasonerProvider, RoleExpr};
use crate::ReasonerError;
use dlhex_core::Symbol;
use dlhex_ontology::names::negate;
use dlhex_ontology::{Assertion, CachedOntology, Position};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Closed labels of every individual and pair
#[derive(Debug, Default)]
struct Saturation {
    labels: BTreeMap<Position, BTreeSet<Symbol>>,
    consistent: bool,
}

/// Reasoner that saturates labels under the ontology's classification.
///
/// The saturation is recomputed lazily after every change of the working ABox.
pub struct SaturationReasoner {
    ontology: Arc<CachedOntology>,
    baseline: Vec<Assertion>,
    asserted: BTreeMap<u64, Assertion>,
    next_handle: u64,
    saturation: Option<Saturation>,
}

impl SaturationReasoner {
    pub fn new(ontology: Arc<CachedOntology>, use_abox: bool) -> Self {
        let baseline = if use_abox {
            ontology.ontology().abox.assertions().collect()
        } else {
            Vec::new()
        };
        Self {
            ontology,
            baseline,
            asserted: BTreeMap::new(),
            next_handle: 0,
            saturation: None,
        }
    }

    fn saturate(&mut self) -> Result<&Saturation, ReasonerError> {
        if self.saturation.is_none() {
            let classification = self.ontology.classification()?;
            let mut labels: BTreeMap<Position, BTreeSet<Symbol>> = BTreeMap::new();
            for assertion in self.baseline.iter().chain(self.asserted.values()) {
                for label in assertion.labels() {
                    labels
                        .entry(label.position)
                        .or_default()
                        .extend(classification.supers(label.name.as_str()));
                }
            }

            let consistent = labels.values().all(|names| {
                names.iter().all(|name| {
                    !classification.is_unsatisfiable(name.as_str())
                        && !names.contains(&negate(name.as_str()))
                })
            });
            debug!(
                "Saturated {} positions of {} (consistent: {})",
                labels.len(),
                self.ontology.name(),
                consistent
            );
            self.saturation = Some(Saturation { labels, consistent });
        }
        self.saturation
            .as_ref()
            .ok_or_else(|| ReasonerError::Failed("saturation unavailable".to_string()))
    }
}

impl DlReasoner for SaturationReasoner {
    fn is_consistent(&mut self) -> Result<bool, ReasonerError> {
        Ok(self.saturate()?.consistent)
    }

    fn instances_of(&mut self, concept: &ConceptExpr) -> Result<Vec<Symbol>, ReasonerError> {
        let individuals = self.individuals();
        let name = concept.name();
        let saturation = self.saturate()?;
        if !saturation.consistent {
            return Ok(individuals);
        }
        Ok(individuals
            .into_iter()
            .filter(|x| {
                saturation
                    .labels
                    .get(&Position::Individual(x.clone()))
                    .map_or(false, |names| names.contains(&name))
            })
            .collect())
    }

    fn role_fillers(
        &mut self,
        individual: &Symbol,
        role: &RoleExpr,
    ) -> Result<Vec<Symbol>, ReasonerError> {
        let individuals = self.individuals();
        let saturation = self.saturate()?;
        if !saturation.consistent {
            return Ok(individuals);
        }
        Ok(individuals
            .into_iter()
            .filter(|y| {
                saturation
                    .labels
                    .get(&Position::Pair(individual.clone(), y.clone()))
                    .map_or(false, |names| names.contains(role.name()))
            })
            .collect())
    }

    fn assert(&mut self, axiom: Assertion) -> Result<AxiomHandle, ReasonerError> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.asserted.insert(handle, axiom);
        self.saturation = None;
        Ok(AxiomHandle(handle))
    }

    fn retract(&mut self, handle: AxiomHandle) -> Result<(), ReasonerError> {
        self.asserted
            .remove(&handle.0)
            .ok_or(ReasonerError::UnknownHandle(handle.0))?;
        self.saturation = None;
        Ok(())
    }

    fn individuals(&self) -> Vec<Symbol> {
        let mut out: BTreeSet<Symbol> = self.ontology.ontology().individuals.clone();
        for assertion in self.baseline.iter().chain(self.asserted.values()) {
            out.extend(assertion.individuals());
        }
        out.into_iter().collect()
    }
}

/// Provider of [`SaturationReasoner`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturationProvider;

impl ReasonerProvider for SaturationProvider {
    fn open(
        &self,
        ontology: Arc<CachedOntology>,
        use_abox: bool,
    ) -> Result<Box<dyn DlReasoner>, ReasonerError> {
        Ok(Box::new(SaturationReasoner::new(ontology, use_abox)))
    }
}
