//! オントロジーデータモデル

use crate::names;
use dlhex_core::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `C(x)` or `¬C(x)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptAssertion {
    pub concept: Symbol,
    pub individual: Symbol,
    #[serde(default)]
    pub negated: bool,
}

/// `R(x,y)` or `¬R(x,y)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleAssertion {
    pub role: Symbol,
    pub subject: Symbol,
    pub object: Symbol,
    #[serde(default)]
    pub negated: bool,
}

/// Where a label holds
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Individual(Symbol),
    Pair(Symbol, Symbol),
}

/// DL name holding at a position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub name: Symbol,
    pub position: Position,
}

/// ABox assertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assertion {
    Concept(ConceptAssertion),
    Role(RoleAssertion),
}

impl Assertion {
    pub fn concept<C: Into<Symbol>, I: Into<Symbol>>(concept: C, individual: I, negated: bool) -> Self {
        Assertion::Concept(ConceptAssertion {
            concept: concept.into(),
            individual: individual.into(),
            negated,
        })
    }

    pub fn role<R, S, O>(role: R, subject: S, object: O, negated: bool) -> Self
    where
        R: Into<Symbol>,
        S: Into<Symbol>,
        O: Into<Symbol>,
    {
        Assertion::Role(RoleAssertion {
            role: role.into(),
            subject: subject.into(),
            object: object.into(),
            negated,
        })
    }

    /// Signed DL name: `C`, `¬C`, `R` or `¬R`
    pub fn name(&self) -> Symbol {
        let (name, negated) = match self {
            Assertion::Concept(c) => (&c.concept, c.negated),
            Assertion::Role(r) => (&r.role, r.negated),
        };
        if negated {
            names::negate(name.as_str())
        } else {
            name.clone()
        }
    }

    /// Individuals mentioned by the assertion
    pub fn individuals(&self) -> Vec<Symbol> {
        match self {
            Assertion::Concept(c) => vec![c.individual.clone()],
            Assertion::Role(r) => vec![r.subject.clone(), r.object.clone()],
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Assertion::Concept(c) => Position::Individual(c.individual.clone()),
            Assertion::Role(r) => Position::Pair(r.subject.clone(), r.object.clone()),
        }
    }

    /// Labels the assertion puts on individuals and pairs.
    ///
    /// A positive role assertion `R(x,y)` also labels `x` with `∃R`.
    pub fn labels(&self) -> Vec<Label> {
        let mut labels = vec![Label {
            name: self.name(),
            position: self.position(),
        }];
        if let Assertion::Role(r) = self {
            if !r.negated {
                labels.push(Label {
                    name: names::exists(r.role.as_str()),
                    position: Position::Individual(r.subject.clone()),
                });
            }
        }
        labels
    }
}

impl std::fmt::Display for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assertion::Concept(c) => write!(f, "{}({})", self.name(), c.individual),
            Assertion::Role(r) => write!(f, "{}({},{})", self.name(), r.subject, r.object),
        }
    }
}

/// Assertional part of an ontology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abox {
    pub concepts: BTreeSet<ConceptAssertion>,
    pub roles: Vec<RoleAssertion>,
}

impl Abox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, assertion: Assertion) -> bool {
        match assertion {
            Assertion::Concept(c) => self.concepts.insert(c),
            Assertion::Role(r) => {
                if self.roles.contains(&r) {
                    false
                } else {
                    self.roles.push(r);
                    true
                }
            }
        }
    }

    pub fn remove(&mut self, assertion: &Assertion) -> bool {
        match assertion {
            Assertion::Concept(c) => self.concepts.remove(c),
            Assertion::Role(r) => {
                let before = self.roles.len();
                self.roles.retain(|x| x != r);
                self.roles.len() != before
            }
        }
    }

    pub fn contains(&self, assertion: &Assertion) -> bool {
        match assertion {
            Assertion::Concept(c) => self.concepts.contains(c),
            Assertion::Role(r) => self.roles.contains(r),
        }
    }

    pub fn len(&self) -> usize {
        self.concepts.len() + self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.roles.is_empty()
    }

    pub fn assertions(&self) -> impl Iterator<Item = Assertion> + '_ {
        self.concepts
            .iter()
            .cloned()
            .map(Assertion::Concept)
            .chain(self.roles.iter().cloned().map(Assertion::Role))
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.assertions().flat_map(|a| a.labels())
    }
}

impl FromIterator<Assertion> for Abox {
    fn from_iter<I: IntoIterator<Item = Assertion>>(iter: I) -> Self {
        let mut abox = Abox::new();
        for assertion in iter {
            abox.insert(assertion);
        }
        abox
    }
}

/// Terminological axiom
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TBoxAxiom {
    DeclareClass(Symbol),
    DeclareRole(Symbol),
    /// SubClassOf(C1 C2)
    SubClassOf(Symbol, Symbol),
    /// SubObjectPropertyOf(R1 R2)
    SubPropertyOf(Symbol, Symbol),
    DisjointClasses(Symbol, Symbol),
    DisjointProperties(Symbol, Symbol),
    /// ObjectPropertyDomain(R C)
    Domain { role: Symbol, concept: Symbol },
}

/// Ontology: signature, TBox and baseline ABox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ontology {
    /// Identity used by the cache (file name or path)
    pub name: Symbol,
    #[serde(default)]
    pub namespace: String,
    pub concepts: BTreeSet<Symbol>,
    pub roles: BTreeSet<Symbol>,
    pub individuals: BTreeSet<Symbol>,
    pub tbox: Vec<TBoxAxiom>,
    pub abox: Abox,
}

impl Ontology {
    pub fn new<S: Into<Symbol>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a TBox axiom and register the names it mentions
    pub fn add_axiom(&mut self, axiom: TBoxAxiom) {
        match &axiom {
            TBoxAxiom::DeclareClass(c) => {
                self.concepts.insert(c.clone());
            }
            TBoxAxiom::DeclareRole(r) => {
                self.roles.insert(r.clone());
            }
            TBoxAxiom::SubClassOf(a, b) | TBoxAxiom::DisjointClasses(a, b) => {
                self.concepts.insert(a.clone());
                self.concepts.insert(b.clone());
            }
            TBoxAxiom::SubPropertyOf(r, s) | TBoxAxiom::DisjointProperties(r, s) => {
                self.roles.insert(r.clone());
                self.roles.insert(s.clone());
            }
            TBoxAxiom::Domain { role, concept } => {
                self.roles.insert(role.clone());
                self.concepts.insert(concept.clone());
            }
        }
        if !self.tbox.contains(&axiom) {
            self.tbox.push(axiom);
        }
    }

    /// Add an ABox assertion and register its names and individuals
    pub fn add_assertion(&mut self, assertion: Assertion) {
        match &assertion {
            Assertion::Concept(c) => {
                self.concepts.insert(c.concept.clone());
            }
            Assertion::Role(r) => {
                self.roles.insert(r.role.clone());
            }
        }
        self.individuals.extend(assertion.individuals());
        self.abox.insert(assertion);
    }

    pub fn subclass<A: Into<Symbol>, B: Into<Symbol>>(mut self, a: A, b: B) -> Self {
        self.add_axiom(TBoxAxiom::SubClassOf(a.into(), b.into()));
        self
    }

    pub fn disjoint<A: Into<Symbol>, B: Into<Symbol>>(mut self, a: A, b: B) -> Self {
        self.add_axiom(TBoxAxiom::DisjointClasses(a.into(), b.into()));
        self
    }

    pub fn subrole<A: Into<Symbol>, B: Into<Symbol>>(mut self, r: A, s: B) -> Self {
        self.add_axiom(TBoxAxiom::SubPropertyOf(r.into(), s.into()));
        self
    }

    pub fn domain<A: Into<Symbol>, B: Into<Symbol>>(mut self, role: A, concept: B) -> Self {
        self.add_axiom(TBoxAxiom::Domain {
            role: role.into(),
            concept: concept.into(),
        });
        self
    }

    pub fn fact(mut self, assertion: Assertion) -> Self {
        self.add_assertion(assertion);
        self
    }

    pub fn is_concept(&self, name: &str) -> bool {
        self.concepts.contains(names::positive(name))
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.roles.contains(names::positive(name))
    }

    /// Whether `name` in any of its forms belongs to the signature
    pub fn knows(&self, name: &str) -> bool {
        let base = names::positive(name);
        match names::existential_role(base) {
            Some(role) => self.roles.contains(role),
            None => self.concepts.contains(base) || self.roles.contains(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_assertion_labels_subject_with_existential() {
        let assertion = Assertion::role("hasParent", "bob", "ann", false);
        let labels = assertion.labels();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name.as_str(), "hasParent");
        assert_eq!(labels[0].position, Position::Pair("bob".into(), "ann".into()));
        assert_eq!(labels[1].name.as_str(), "∃hasParent");
        assert_eq!(labels[1].position, Position::Individual("bob".into()));

        let negative = Assertion::role("hasParent", "bob", "ann", true);
        assert_eq!(negative.labels().len(), 1);
        assert_eq!(negative.name().as_str(), "¬hasParent");
    }

    #[test]
    fn test_abox_insert_remove() {
        let mut abox = Abox::new();
        let fact = Assertion::concept("Person", "bob", false);
        assert!(abox.insert(fact.clone()));
        assert!(!abox.insert(fact.clone()));
        assert!(abox.insert(Assertion::role("knows", "bob", "ann", false)));
        assert_eq!(abox.len(), 2);
        assert!(abox.remove(&fact));
        assert!(!abox.contains(&fact));
        assert_eq!(abox.len(), 1);
    }

    #[test]
    fn test_add_axiom_extracts_signature() {
        let ontology = Ontology::new("family")
            .subclass("Person", "Animal")
            .domain("hasParent", "Person")
            .fact(Assertion::role("hasParent", "bob", "ann", false));
        assert!(ontology.concepts.contains("Animal"));
        assert!(ontology.roles.contains("hasParent"));
        assert_eq!(ontology.individuals.len(), 2);
        assert!(ontology.knows("¬∃hasParent"));
        assert!(ontology.knows("¬Person"));
        assert!(!ontology.knows("Plant"));
    }

    #[test]
    fn test_assertion_display() {
        assert_eq!(Assertion::concept("Person", "bob", true).to_string(), "¬Person(bob)");
        assert_eq!(Assertion::role("knows", "a", "b", false).to_string(), "knows(a,b)");
    }
}
