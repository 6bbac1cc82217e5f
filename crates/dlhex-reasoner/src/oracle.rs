//! DL reasoner oracle interface

use crate::ReasonerError;
use dlhex_core::Symbol;
use dlhex_ontology::names::{self, EXISTS, NEGATION};
use dlhex_ontology::{Assertion, CachedOntology};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Concept expression accepted by [`DlReasoner::instances_of`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptExpr {
    /// `C`
    Atomic(Symbol),
    /// `¬C`
    Complement(Symbol),
    /// `∃R`
    Exists(Symbol),
    /// `¬∃R`
    NotExists(Symbol),
}

impl ConceptExpr {
    /// Expression for a DL name in label form (`C`, `¬C`, `∃R`, `¬∃R`)
    pub fn from_name(name: &str) -> Self {
        let negated = names::is_negated(name);
        let base = names::positive(name);
        match (names::existential_role(base), negated) {
            (Some(role), false) => ConceptExpr::Exists(Symbol::new(role)),
            (Some(role), true) => ConceptExpr::NotExists(Symbol::new(role)),
            (None, false) => ConceptExpr::Atomic(Symbol::new(base)),
            (None, true) => ConceptExpr::Complement(Symbol::new(base)),
        }
    }

    /// Label form of the expression
    pub fn name(&self) -> Symbol {
        match self {
            ConceptExpr::Atomic(c) => c.clone(),
            ConceptExpr::Complement(c) => Symbol::new(format!("{}{}", NEGATION, c)),
            ConceptExpr::Exists(r) => Symbol::new(format!("{}{}", EXISTS, r)),
            ConceptExpr::NotExists(r) => Symbol::new(format!("{}{}{}", NEGATION, EXISTS, r)),
        }
    }
}

/// Role expression accepted by [`DlReasoner::role_fillers`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleExpr {
    Named(Symbol),
}

impl RoleExpr {
    pub fn name(&self) -> &Symbol {
        match self {
            RoleExpr::Named(r) => r,
        }
    }
}

/// Handle returned by [`DlReasoner::assert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxiomHandle(pub u64);

/// Black-box DL reasoner over one ontology and a mutable working ABox
pub trait DlReasoner {
    fn is_consistent(&mut self) -> Result<bool, ReasonerError>;

    /// Individuals entailed to belong to `concept`, in ascending order
    fn instances_of(&mut self, concept: &ConceptExpr) -> Result<Vec<Symbol>, ReasonerError>;

    /// Individuals `y` with `role(individual, y)` entailed, in ascending order
    fn role_fillers(
        &mut self,
        individual: &Symbol,
        role: &RoleExpr,
    ) -> Result<Vec<Symbol>, ReasonerError>;

    /// Add an assertion to the working ABox
    fn assert(&mut self, axiom: Assertion) -> Result<AxiomHandle, ReasonerError>;

    /// Remove an assertion added by [`DlReasoner::assert`]
    fn retract(&mut self, handle: AxiomHandle) -> Result<(), ReasonerError>;

    /// Individuals known to the reasoner
    fn individuals(&self) -> Vec<Symbol>;
}

/// Opens reasoners for cached ontologies
pub trait ReasonerProvider {
    /// Reasoner over `ontology`, starting from its baseline ABox when `use_abox` is set
    /// and from an empty ABox otherwise
    fn open(
        &self,
        ontology: Arc<CachedOntology>,
        use_abox: bool,
    ) -> Result<Box<dyn DlReasoner>, ReasonerError>;
}
