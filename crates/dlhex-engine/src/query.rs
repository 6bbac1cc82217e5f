//! Direct evaluation of a DL atom against the reasoner

use crate::atom::{DlAtom, QueryShape, UpdateKind};
use crate::context::EngineContext;
use crate::EngineError;
use dlhex_core::{Atom, Symbol};
use dlhex_ontology::Assertion;
use dlhex_reasoner::{AboxExpansion, ConceptExpr, RoleExpr};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Output tuples of a DL atom
pub type Answer = BTreeSet<Vec<Symbol>>;

/// ABox seen by one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
    /// Assertions added by the update predicates
    pub updates: Vec<Assertion>,
    /// Replacement for the baseline ABox, e.g. after a repair
    pub retained: Option<Vec<Assertion>>,
}

impl QueryInput {
    pub fn new(updates: Vec<Assertion>) -> Self {
        Self {
            updates,
            retained: None,
        }
    }

    pub fn with_retained(mut self, retained: Vec<Assertion>) -> Self {
        self.retained = Some(retained);
        self
    }
}

/// Assertion added by an update fact, if `fact` is one of `atom`'s update facts
pub fn update_assertion(atom: &DlAtom, fact: &Atom) -> Option<(UpdateKind, Assertion)> {
    let kind = atom.updates.kind_of(fact)?;
    let args = fact.const_args()?;
    let assertion = match (kind, args.as_slice()) {
        (UpdateKind::ConceptPlus, [c, x]) => Assertion::concept(c.clone(), x.clone(), false),
        (UpdateKind::ConceptMinus, [c, x]) => Assertion::concept(c.clone(), x.clone(), true),
        (UpdateKind::RolePlus, [r, x, y]) => Assertion::role(r.clone(), x.clone(), y.clone(), false),
        (UpdateKind::RoleMinus, [r, x, y]) => Assertion::role(r.clone(), x.clone(), y.clone(), true),
        _ => return None,
    };
    Some((kind, assertion))
}

/// Assertions added by the update facts among `facts`
pub fn updates_of<'a, I>(atom: &DlAtom, facts: I) -> Vec<Assertion>
where
    I: IntoIterator<Item = &'a Atom>,
{
    facts
        .into_iter()
        .filter_map(|fact| update_assertion(atom, fact).map(|(_, a)| a))
        .collect()
}

pub(crate) fn all_tuples(domain: &BTreeSet<Symbol>, arity: usize) -> Answer {
    match arity {
        0 => std::iter::once(Vec::new()).collect(),
        1 => domain.iter().map(|x| vec![x.clone()]).collect(),
        _ => domain
            .iter()
            .flat_map(|x| domain.iter().map(move |y| vec![x.clone(), y.clone()]))
            .collect(),
    }
}

/// Answer of `atom` under `input`.
///
/// Tuples are restricted to `domain` (the reasoner's individuals when `None`);
/// an inconsistent knowledge base entails every tuple over it. A query name
/// outside the ontology's signature gives an empty answer.
pub fn evaluate(
    context: &mut EngineContext,
    atom: &DlAtom,
    input: &QueryInput,
    domain: Option<&BTreeSet<Symbol>>,
) -> Result<Answer, EngineError> {
    let entry = context.ontology(atom.ontology.as_str())?;
    if let Some(name) = atom.query.name() {
        let known = match &atom.query {
            QueryShape::Role { role } => entry.ontology().is_role(role.as_str()),
            _ => entry.ontology().knows(name.as_str()),
        };
        if !known {
            let error = EngineError::UnknownSymbol {
                ontology: atom.ontology.to_string(),
                symbol: name.to_string(),
            };
            warn!("{}; treating the answer as empty", error);
            return Ok(Answer::new());
        }
    }

    let (use_abox, axioms): (bool, Vec<Assertion>) = match (&input.retained, atom.use_abox) {
        (Some(retained), true) => (
            false,
            retained.iter().chain(&input.updates).cloned().collect(),
        ),
        _ => (atom.use_abox, input.updates.clone()),
    };

    let mut calls = 0usize;
    let answer = {
        let reasoner = context.reasoner(atom.ontology.as_str(), use_abox)?;
        let mut expansion = AboxExpansion::new(reasoner, axioms)?;
        let domain: BTreeSet<Symbol> = match domain {
            Some(d) => d.clone(),
            None => expansion.individuals().into_iter().collect(),
        };

        calls += 1;
        let consistent = expansion.is_consistent()?;
        match &atom.query {
            QueryShape::Consistent | QueryShape::Inconsistent => {
                let holds = consistent == (atom.query == QueryShape::Consistent);
                if holds {
                    all_tuples(&domain, 0)
                } else {
                    Answer::new()
                }
            }
            _ if !consistent => all_tuples(&domain, atom.output_arity()),
            QueryShape::Concept { .. } => {
                let name = atom.query.name().unwrap_or_default();
                calls += 1;
                expansion
                    .instances_of(&ConceptExpr::from_name(name.as_str()))?
                    .into_iter()
                    .filter(|x| domain.contains(x))
                    .map(|x| vec![x])
                    .collect()
            }
            QueryShape::Role { role } => {
                let expr = RoleExpr::Named(role.clone());
                let mut answer = Answer::new();
                for x in &domain {
                    calls += 1;
                    for y in expansion.role_fillers(x, &expr)? {
                        if domain.contains(&y) {
                            answer.insert(vec![x.clone(), y]);
                        }
                    }
                }
                answer
            }
        }
    };
    context.stats.oracle_calls += calls;
    debug!("Evaluated {}: {} tuples", atom, answer.len());
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::UpdatePredicates;
    use crate::config::EngineConfig;
    use dlhex_ontology::{MemoryOntologyLoader, Ontology};

    fn atom(query: QueryShape) -> DlAtom {
        DlAtom {
            ontology: "people".into(),
            updates: UpdatePredicates {
                concept_plus: "cp".into(),
                concept_minus: "cm".into(),
                role_plus: "rp".into(),
                role_minus: "rm".into(),
            },
            query,
            use_abox: true,
        }
    }

    fn context(ontology: Ontology) -> EngineContext {
        EngineContext::new(EngineConfig::default(), MemoryOntologyLoader::new().with(ontology))
    }

    fn people() -> Ontology {
        Ontology::new("people")
            .subclass("Person", "Animal")
            .subrole("hasMother", "hasParent")
            .fact(Assertion::concept("Person", "bob", false))
    }

    fn tuples(items: &[&[&str]]) -> Answer {
        items
            .iter()
            .map(|t| t.iter().map(|s| Symbol::new(*s)).collect())
            .collect()
    }

    #[test]
    fn test_concept_query_with_update() {
        let mut ctx = context(people());
        let q = atom(QueryShape::Concept {
            concept: "Animal".into(),
            negated: false,
        });
        let input = QueryInput::new(vec![Assertion::concept("Person", "ann", false)]);
        let answer = evaluate(&mut ctx, &q, &input, None).unwrap();
        assert_eq!(answer, tuples(&[&["ann"], &["bob"]]));

        // the update is gone afterwards
        let answer = evaluate(&mut ctx, &q, &QueryInput::default(), None).unwrap();
        assert_eq!(answer, tuples(&[&["bob"]]));
        assert!(ctx.stats.oracle_calls >= 4);
    }

    #[test]
    fn test_update_facts_become_assertions() {
        let q = atom(QueryShape::Consistent);
        let facts = vec![
            Atom::ground("cm", ["Person", "bob"]),
            Atom::ground("rp", ["hasMother", "bob", "eve"]),
            Atom::ground("other", ["x"]),
        ];
        let updates = updates_of(&q, &facts);
        assert_eq!(
            updates,
            vec![
                Assertion::concept("Person", "bob", true),
                Assertion::role("hasMother", "bob", "eve", false)
            ]
        );
    }

    #[test]
    fn test_consistency_atoms() {
        let mut ctx = context(people());
        let clash = QueryInput::new(vec![Assertion::concept("Person", "bob", true)]);
        let cons = atom(QueryShape::Consistent);
        let incons = atom(QueryShape::Inconsistent);
        assert!(evaluate(&mut ctx, &cons, &clash, None).unwrap().is_empty());
        assert_eq!(evaluate(&mut ctx, &incons, &clash, None).unwrap(), tuples(&[&[]]));
        assert_eq!(
            evaluate(&mut ctx, &cons, &QueryInput::default(), None).unwrap(),
            tuples(&[&[]])
        );
    }

    #[test]
    fn test_role_query_and_domain() {
        let mut ctx = context(people());
        let q = atom(QueryShape::Role {
            role: "hasParent".into(),
        });
        let input = QueryInput::new(vec![Assertion::role("hasMother", "bob", "eve", false)]);
        let answer = evaluate(&mut ctx, &q, &input, None).unwrap();
        assert_eq!(answer, tuples(&[&["bob", "eve"]]));

        let domain: BTreeSet<Symbol> = ["bob".into()].into_iter().collect();
        assert!(evaluate(&mut ctx, &q, &input, Some(&domain)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_query_name_is_empty() {
        let mut ctx = context(people());
        let q = atom(QueryShape::Concept {
            concept: "Plant".into(),
            negated: false,
        });
        assert!(evaluate(&mut ctx, &q, &QueryInput::default(), None).unwrap().is_empty());
    }

    #[test]
    fn test_retained_abox_replaces_the_baseline() {
        let mut ctx = context(people());
        let q = atom(QueryShape::Concept {
            concept: "Person".into(),
            negated: false,
        });
        let input = QueryInput::default().with_retained(Vec::new());
        let domain: BTreeSet<Symbol> = ["bob".into()].into_iter().collect();
        assert!(evaluate(&mut ctx, &q, &input, Some(&domain)).unwrap().is_empty());
    }
}
