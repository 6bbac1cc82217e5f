//! Support-set learning
//!
//! A support set of DL atom `k` is a nogood built from update facts
//! (input literals), at most one guard literal, and the replacement atom of
//! `k` with the polarity opposite to the value it forces. The sets are derived
//! from the classification only and hold for every ABox in which the guard does.

use crate::atom::{DlAtom, QueryShape, UpdateKind, UpdatePredicates};
use crate::config::LearningOptions;
use dlhex_core::{vocab, Atom, Literal, LiteralKind, Nogood, Symbol, Term};
use dlhex_ontology::names::{exists, is_negated, negate};
use dlhex_ontology::{Classification, Ontology};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Learned support sets of one DL atom
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportFamily {
    /// Index `k` of the replacement atoms `dlhex_e<k>` / `dlhex_ne<k>`
    pub index: usize,
    pub atom: DlAtom,
    /// Non-ground support sets, guard-free ones first
    pub sets: Vec<Nogood>,
    /// The sets decide the atom on their own
    pub complete: bool,
}

impl SupportFamily {
    /// Whether the sets force the atom true (`false` for `consDL`, whose sets force it false)
    pub fn supports_truth(&self) -> bool {
        self.atom.query != QueryShape::Consistent
    }

    /// Replacement atom the sets derive
    pub fn target(&self, args: Vec<Term>) -> Atom {
        if self.supports_truth() {
            Atom::new(vocab::replacement(self.index), args)
        } else {
            Atom::new(vocab::negated_replacement(self.index), args)
        }
    }

    /// Replacement atom contradicting the derived value
    pub fn opposite(&self, args: Vec<Term>) -> Atom {
        if self.supports_truth() {
            Atom::new(vocab::negated_replacement(self.index), args)
        } else {
            Atom::new(vocab::replacement(self.index), args)
        }
    }

    pub fn guard_free(&self) -> impl Iterator<Item = &Nogood> {
        self.sets.iter().filter(|s| s.is_guard_free())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Place {
    Individual(Term),
    Pair(Term, Term),
}

impl Place {
    fn is_individual(&self) -> bool {
        matches!(self, Place::Individual(_))
    }
}

/// Where a label can come from: an update predicate or a baseline assertion
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Input(UpdateKind, Symbol),
    /// Signed name of a baseline assertion
    Baseline { name: Symbol, role: bool },
}

impl Source {
    fn instantiate(&self, updates: &UpdatePredicates, x: &Term, y: &Term) -> (Literal, Vec<(Symbol, Place)>) {
        let ind = Place::Individual(x.clone());
        let pair = Place::Pair(x.clone(), y.clone());
        match self {
            Source::Input(kind, name) => {
                let mut args = vec![Term::Const(name.clone()), x.clone()];
                if kind.arity() == 3 {
                    args.push(y.clone());
                }
                let literal = Literal::pos(
                    Atom::new(updates.predicate(*kind).clone(), args),
                    LiteralKind::Input,
                );
                let labels = match kind {
                    UpdateKind::ConceptPlus => vec![(name.clone(), ind)],
                    UpdateKind::ConceptMinus => vec![(negate(name.as_str()), ind)],
                    UpdateKind::RolePlus => {
                        vec![(name.clone(), pair), (exists(name.as_str()), ind)]
                    }
                    UpdateKind::RoleMinus => vec![(negate(name.as_str()), pair)],
                };
                (literal, labels)
            }
            Source::Baseline { name, role } => {
                let mut args = vec![Term::Const(name.clone()), x.clone()];
                let mut labels = Vec::new();
                if *role {
                    args.push(y.clone());
                    labels.push((name.clone(), pair));
                    if !is_negated(name.as_str()) {
                        labels.push((exists(name.as_str()), ind));
                    }
                } else {
                    labels.push((name.clone(), ind));
                }
                let literal = Literal::pos(Atom::new(vocab::GUARD, args), LiteralKind::Guard);
                (literal, labels)
            }
        }
    }

    fn input_kind(&self) -> Option<UpdateKind> {
        match self {
            Source::Input(kind, _) => Some(*kind),
            Source::Baseline { .. } => None,
        }
    }
}

fn var(name: &str) -> Term {
    Term::var(name)
}

/// Derives the support sets of one DL atom from the classification
pub struct SupportSetLearner<'a> {
    index: usize,
    atom: &'a DlAtom,
    ontology: &'a Ontology,
    classification: &'a Classification,
    options: &'a LearningOptions,
    repair: bool,
    baseline_consistent: bool,
}

impl<'a> SupportSetLearner<'a> {
    pub fn new(
        index: usize,
        atom: &'a DlAtom,
        ontology: &'a Ontology,
        classification: &'a Classification,
        options: &'a LearningOptions,
    ) -> Self {
        Self {
            index,
            atom,
            ontology,
            classification,
            options,
            repair: false,
            baseline_consistent: true,
        }
    }

    /// Baseline assertions may be deleted, so baseline conflicts are repaired instead of learned
    pub fn repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    pub fn baseline_consistent(mut self, consistent: bool) -> Self {
        self.baseline_consistent = consistent;
        self
    }

    fn output(&self, args: Vec<Term>) -> Literal {
        let atom = Atom::new(vocab::replacement(self.index), args);
        match self.atom.query {
            // a consistency atom is forced false, so its sets contain it positively
            QueryShape::Consistent => Literal::pos(atom, LiteralKind::Output),
            _ => Literal::neg(atom, LiteralKind::Output),
        }
    }

    /// Literals concluding "the knowledge base is inconsistent"
    fn inconsistency(&self) -> Vec<Literal> {
        let outputs: Vec<Term> = ["O", "P"]
            .iter()
            .take(self.atom.output_arity())
            .map(|v| var(v))
            .collect();
        let mut literals: Vec<Literal> = outputs
            .iter()
            .map(|o| Literal::pos(Atom::new(vocab::DOM, vec![o.clone()]), LiteralKind::Auxiliary))
            .collect();
        literals.push(self.output(outputs));
        literals
    }

    fn baseline_sources(&self) -> BTreeSet<Source> {
        if !self.atom.use_abox {
            return BTreeSet::new();
        }
        self.ontology
            .abox
            .assertions()
            .map(|a| Source::Baseline {
                name: a.name(),
                role: matches!(a, dlhex_ontology::Assertion::Role(_)),
            })
            .collect()
    }

    fn input_sources(&self, maximal_input: &[Atom]) -> BTreeSet<Source> {
        maximal_input
            .iter()
            .filter_map(|fact| {
                let kind = self.atom.updates.kind_of(fact)?;
                let name = fact.args.first()?.as_const()?.clone();
                Some(Source::Input(kind, name))
            })
            .collect()
    }

    fn entailment_sets(&self, query: &Symbol, sources: &BTreeSet<Source>, out: &mut BTreeSet<Nogood>) {
        let updates = &self.atom.updates;
        let role_query = self.atom.output_arity() == 2;
        let (x, y) = if role_query {
            (var("O"), var("P"))
        } else {
            (var("O"), var("Y"))
        };
        for source in sources {
            let (literal, labels) = source.instantiate(updates, &x, &y);
            for (label, place) in labels {
                if place.is_individual() == role_query {
                    continue;
                }
                if self.classification.is_subsumed(label.as_str(), query.as_str()) {
                    let outputs = if role_query {
                        vec![x.clone(), y.clone()]
                    } else {
                        vec![x.clone()]
                    };
                    out.insert(
                        Nogood::new()
                            .with(literal.clone())
                            .with(self.output(outputs)),
                    );
                }
            }
        }
    }

    fn unsatisfiable(&self, label: &Symbol) -> bool {
        self.classification.is_unsatisfiable(label.as_str())
    }

    /// Sets concluding inconsistency from one source or two clashing ones
    fn inconsistency_sets(
        &self,
        inputs: &BTreeSet<Source>,
        baseline: &BTreeSet<Source>,
        out: &mut BTreeSet<Nogood>,
    ) {
        let updates = &self.atom.updates;
        let conclusion = self.inconsistency();
        let (x, y, z) = (var("X"), var("Y"), var("Z"));

        for source in inputs {
            let (literal, labels) = source.instantiate(updates, &x, &y);
            if labels.iter().any(|(l, _)| self.unsatisfiable(l)) {
                out.insert(
                    std::iter::once(literal)
                        .chain(conclusion.iter().cloned())
                        .collect(),
                );
            }
        }

        let inputs: Vec<&Source> = inputs.iter().collect();
        let mut pairs: Vec<(&Source, &Source)> = Vec::new();
        for (i, a) in inputs.iter().enumerate() {
            for b in &inputs[i + 1..] {
                pairs.push((*a, *b));
            }
            for b in baseline {
                pairs.push((*a, b));
            }
        }

        for (a, b) in pairs {
            for shared_pair in [false, true] {
                // individual labels meet at X; pair labels at (X,Y)
                let other = if shared_pair { &y } else { &z };
                let (la, labels_a) = a.instantiate(updates, &x, &y);
                let (lb, labels_b) = b.instantiate(updates, &x, other);
                let clash = labels_a.iter().any(|(na, pa)| {
                    pa.is_individual() != shared_pair
                        && !self.unsatisfiable(na)
                        && labels_b.iter().any(|(nb, pb)| {
                            pb.is_individual() != shared_pair
                                && !self.unsatisfiable(nb)
                                && self.classification.clash(na.as_str(), nb.as_str())
                        })
                });
                if clash {
                    out.insert(
                        [la, lb]
                            .into_iter()
                            .chain(conclusion.iter().cloned())
                            .collect(),
                    );
                }
            }
        }
    }

    /// Support sets for the atom given every update fact it may receive
    pub fn learn(&self, maximal_input: &[Atom]) -> SupportFamily {
        let mut family = SupportFamily {
            index: self.index,
            atom: self.atom.clone(),
            sets: Vec::new(),
            complete: false,
        };
        if !self.options.enabled {
            return family;
        }

        let query = self.atom.query.name();
        if let Some(name) = &query {
            let known = match &self.atom.query {
                QueryShape::Role { role } => self.ontology.is_role(role.as_str()),
                _ => self.ontology.knows(name.as_str()),
            };
            if !known {
                // the answer is always empty
                family.complete = true;
                return family;
            }
        }

        let inputs = self.input_sources(maximal_input);
        let baseline = self.baseline_sources();
        let mut sets = BTreeSet::new();

        if let Some(name) = &query {
            self.entailment_sets(name, &inputs, &mut sets);
            self.entailment_sets(name, &baseline, &mut sets);
        }
        self.inconsistency_sets(&inputs, &baseline, &mut sets);
        // with repair, baseline conflicts are removed by the repair itself
        if self.atom.use_abox && !self.repair && !self.baseline_consistent {
            sets.insert(self.inconsistency().into_iter().collect());
        }

        let mut sets: Vec<Nogood> = sets.into_iter().collect();
        sets.sort_by_key(|s| (!s.is_guard_free(), s.body_len()));
        let mut truncated = false;
        if let Some(max_size) = self.options.max_support_set_size {
            let before = sets.len();
            sets.retain(|s| s.body_len() <= max_size);
            truncated |= sets.len() != before;
        }
        if let Some(max_sets) = self.options.max_support_sets {
            truncated |= sets.len() > max_sets;
            sets.truncate(max_sets);
        }
        if truncated {
            warn!(
                "Support sets of {} truncated to {}; the atom will be verified",
                self.atom,
                sets.len()
            );
        }

        let covered: BTreeSet<UpdateKind> = sets
            .iter()
            .flat_map(|s| s.of_kind(LiteralKind::Input))
            .filter_map(|l| self.atom.updates.kind_of(&l.atom))
            .collect();
        let present: BTreeSet<UpdateKind> = inputs.iter().filter_map(Source::input_kind).collect();
        family.complete = !truncated && present.is_subset(&covered);
        family.sets = sets;

        debug!(
            "Learned {} support sets for {} (complete: {})",
            family.sets.len(),
            self.atom,
            family.complete
        );
        for set in &family.sets {
            debug!("  {}", set);
        }
        family
    }
}
