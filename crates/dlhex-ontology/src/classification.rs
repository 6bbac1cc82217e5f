//! Subsumption classification
//!
//! TBox から `sub/2`, `op/2`, `conf/2` の事実を生成し、3 つの固定ルール
//! (推移律・対偶・衝突) で閉包を計算する。

use crate::model::{Ontology, TBoxAxiom};
use crate::names::{exists, negate};
use crate::OntologyError;
use dlhex_asp::{BacktrackingSolver, BaseSolver, BodyLiteral, Program, Rule};
use dlhex_core::{Atom, Symbol, Term};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub const SUB: &str = "sub";
pub const OP: &str = "op";
pub const CONF: &str = "conf";

fn fact(predicate: &str, a: &Symbol, b: &Symbol) -> Rule {
    Rule::fact(Atom::ground(predicate, [a.clone(), b.clone()]))
}

fn pos(predicate: &str, a: &str, b: &str) -> BodyLiteral {
    BodyLiteral::Pos(Atom::new(predicate, vec![Term::var(a), Term::var(b)]))
}

fn head(predicate: &str, a: &str, b: &str) -> Atom {
    Atom::new(predicate, vec![Term::var(a), Term::var(b)])
}

/// Seed facts for one TBox axiom
pub fn seed_facts(axiom: &TBoxAxiom) -> Vec<Rule> {
    let complement = |name: &Symbol| {
        let neg = negate(name.as_str());
        vec![fact(OP, name, &neg), fact(OP, &neg, name), fact(SUB, name, name)]
    };
    match axiom {
        TBoxAxiom::DeclareClass(c) => complement(c),
        TBoxAxiom::DeclareRole(r) => {
            let mut rules = complement(r);
            rules.extend(complement(&exists(r.as_str())));
            rules
        }
        TBoxAxiom::SubClassOf(a, b) => vec![fact(SUB, a, b)],
        TBoxAxiom::SubPropertyOf(r, s) => vec![
            fact(SUB, r, s),
            fact(SUB, &exists(r.as_str()), &exists(s.as_str())),
        ],
        TBoxAxiom::DisjointClasses(a, b) | TBoxAxiom::DisjointProperties(a, b) => {
            vec![fact(SUB, a, &negate(b.as_str()))]
        }
        TBoxAxiom::Domain { role, concept } => vec![fact(SUB, &exists(role.as_str()), concept)],
    }
}

/// The three fixed classification rules
pub fn classification_rules() -> Vec<Rule> {
    vec![
        // sub(X,Z) :- sub(X,Y), sub(Y,Z).
        Rule::normal(head(SUB, "X", "Z"), vec![pos(SUB, "X", "Y"), pos(SUB, "Y", "Z")]),
        // sub(Y1,X1) :- sub(X,Y), op(X,X1), op(Y,Y1).
        Rule::normal(
            head(SUB, "Y1", "X1"),
            vec![pos(SUB, "X", "Y"), pos(OP, "X", "X1"), pos(OP, "Y", "Y1")],
        ),
        // conf(X,Y) :- op(X,Y), sub(X,Y).
        Rule::normal(head(CONF, "X", "Y"), vec![pos(OP, "X", "Y"), pos(SUB, "X", "Y")]),
    ]
}

/// Classification program of `ontology`: seeds for every declared name and axiom plus the rules
pub fn classification_program(ontology: &Ontology) -> Program {
    let mut program = Program::new();
    for concept in &ontology.concepts {
        program.extend(seed_facts(&TBoxAxiom::DeclareClass(concept.clone())));
    }
    for role in &ontology.roles {
        program.extend(seed_facts(&TBoxAxiom::DeclareRole(role.clone())));
    }
    for axiom in &ontology.tbox {
        program.extend(seed_facts(axiom));
    }
    program.extend(classification_rules());
    program
}

/// Closure of `sub`, `op` and `conf` over an ontology's names
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    supers: BTreeMap<Symbol, BTreeSet<Symbol>>,
    subs: BTreeMap<Symbol, BTreeSet<Symbol>>,
    complements: BTreeMap<Symbol, Symbol>,
    conflicts: BTreeSet<(Symbol, Symbol)>,
}

impl Classification {
    /// Evaluate the classification program; it must have exactly one answer set
    pub fn compute(ontology: &Ontology) -> Result<Self, OntologyError> {
        let program = classification_program(ontology);
        let ground = dlhex_asp::ground(&program)
            .map_err(|e| OntologyError::Classification(e.to_string()))?;
        let mut solver = BacktrackingSolver::new(ground);
        let model = solver
            .next_model()
            .map_err(|e| OntologyError::Classification(e.to_string()))?
            .ok_or_else(|| OntologyError::Classification("no answer set".to_string()))?;
        if solver
            .next_model()
            .map_err(|e| OntologyError::Classification(e.to_string()))?
            .is_some()
        {
            return Err(OntologyError::Classification(
                "more than one answer set".to_string(),
            ));
        }

        let mut classification = Classification::default();
        for atom in model.atoms(solver.table()) {
            let (a, b) = match atom.const_args().as_deref() {
                Some([a, b]) => (a.clone(), b.clone()),
                _ => continue,
            };
            match atom.predicate.as_str() {
                SUB => {
                    classification.subs.entry(b.clone()).or_default().insert(a.clone());
                    classification.supers.entry(a).or_default().insert(b);
                }
                OP => {
                    classification.complements.insert(a, b);
                }
                CONF => {
                    classification.conflicts.insert((a, b));
                }
                _ => {}
            }
        }
        info!(
            "Classified ontology {}: {} names, {} sub facts",
            ontology.name,
            classification.complements.len(),
            classification.fact_count()
        );
        Ok(classification)
    }

    /// `sub(a,b)`; every name is subsumed by itself
    pub fn is_subsumed(&self, a: &str, b: &str) -> bool {
        a == b || self.supers.get(a).map_or(false, |s| s.contains(b))
    }

    /// All `b` with `sub(a,b)`, including `a`
    pub fn supers(&self, a: &str) -> BTreeSet<Symbol> {
        let mut out = self.supers.get(a).cloned().unwrap_or_default();
        out.insert(Symbol::new(a));
        out
    }

    /// All `a` with `sub(a,b)`, including `b`
    pub fn subs(&self, b: &str) -> BTreeSet<Symbol> {
        let mut out = self.subs.get(b).cloned().unwrap_or_default();
        out.insert(Symbol::new(b));
        out
    }

    /// `op(a,b)`
    pub fn are_complements(&self, a: &str, b: &str) -> bool {
        self.complements.get(a).map_or(false, |c| c.as_str() == b)
    }

    /// `conf(a,b)`
    pub fn conflicts(&self, a: &str, b: &str) -> bool {
        self.conflicts.contains(&(Symbol::new(a), Symbol::new(b)))
    }

    /// Whether `a` and `b` cannot hold at the same position
    pub fn clash(&self, a: &str, b: &str) -> bool {
        self.is_subsumed(a, negate(b).as_str())
            || self.is_unsatisfiable(a)
            || self.is_unsatisfiable(b)
    }

    /// A name subsumed by its own complement
    pub fn is_unsatisfiable(&self, a: &str) -> bool {
        let complement = negate(a);
        self.conflicts(a, complement.as_str()) || self.is_subsumed(a, complement.as_str())
    }

    /// Number of `sub` facts
    pub fn fact_count(&self) -> usize {
        self.supers.values().map(BTreeSet::len).sum()
    }

    /// All `sub` pairs
    pub fn sub_facts(&self) -> impl Iterator<Item = (&Symbol, &Symbol)> {
        self.supers
            .iter()
            .flat_map(|(a, bs)| bs.iter().map(move |b| (a, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ontology;

    #[test]
    fn test_seed_facts_for_role() {
        let facts = seed_facts(&TBoxAxiom::DeclareRole("hasParent".into()));
        let shown: Vec<String> = facts.iter().map(|r| r.to_string()).collect();
        assert!(shown.contains(&"sub(hasParent,hasParent).".to_string()));
        assert!(shown.contains(&"op(\"∃hasParent\",\"¬∃hasParent\").".to_string()));
        assert_eq!(facts.len(), 6);
    }

    #[test]
    fn test_transitivity_and_contraposition() {
        let ontology = Ontology::new("t")
            .subclass("Student", "Person")
            .subclass("Person", "Animal");
        let c = Classification::compute(&ontology).unwrap();
        assert!(c.is_subsumed("Student", "Animal"));
        assert!(c.is_subsumed("¬Animal", "¬Student"));
        assert!(!c.is_subsumed("Animal", "Student"));
        assert!(c.supers("Student").contains("Animal"));
        assert!(c.subs("Animal").contains("Student"));
        assert!(c.are_complements("Person", "¬Person"));
    }

    #[test]
    fn test_disjointness_clash_is_symmetric() {
        let ontology = Ontology::new("t")
            .disjoint("Cat", "Dog")
            .subclass("Kitten", "Cat");
        let c = Classification::compute(&ontology).unwrap();
        assert!(c.clash("Cat", "Dog"));
        assert!(c.clash("Dog", "Cat"));
        assert!(c.clash("Kitten", "Dog"));
        assert!(!c.clash("Kitten", "Cat"));
        assert!(c.clash("Cat", "¬Cat"));
    }

    #[test]
    fn test_domain_and_subproperty() {
        let ontology = Ontology::new("t")
            .domain("hasParent", "Person")
            .subrole("hasMother", "hasParent");
        let c = Classification::compute(&ontology).unwrap();
        assert!(c.is_subsumed("∃hasParent", "Person"));
        assert!(c.is_subsumed("∃hasMother", "Person"));
        assert!(c.is_subsumed("hasMother", "hasParent"));
        assert!(c.is_subsumed("¬hasParent", "¬hasMother"));
    }

    #[test]
    fn test_unsatisfiable_name_conflicts_with_its_complement() {
        let ontology = Ontology::new("t")
            .subclass("Square", "Circle")
            .disjoint("Square", "Circle");
        let c = Classification::compute(&ontology).unwrap();
        assert!(c.is_unsatisfiable("Square"));
        assert!(c.conflicts("Square", "¬Square"));
        assert!(!c.is_unsatisfiable("Circle"));
    }
}
