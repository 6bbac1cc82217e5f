//! Post-check of candidate models against the reasoner

use crate::atom::UpdateKind;
use crate::context::EngineContext;
use crate::learner::SupportFamily;
use crate::query::{all_tuples, evaluate, update_assertion, QueryInput};
use crate::repair::bar_assertion;
use crate::EngineError;
use dlhex_core::{vocab, Atom, AtomId, AtomTable, GroundNogood, Interpretation, Symbol};
use dlhex_ontology::Assertion;
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of checking one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// The candidate guessed a wrong value; the nogood excludes every candidate
    /// repeating the same inputs, deletions and guess
    Rejected(GroundNogood),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Re-evaluates the DL atoms whose support families are incomplete
pub struct PostCheckVerifier<'a> {
    families: &'a [SupportFamily],
    domain: &'a BTreeSet<Symbol>,
    repair: bool,
}

impl<'a> PostCheckVerifier<'a> {
    pub fn new(families: &'a [SupportFamily], domain: &'a BTreeSet<Symbol>) -> Self {
        Self {
            families,
            domain,
            repair: false,
        }
    }

    /// Candidates carry deletions, so atoms are checked against the retained ABox
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Families the post-check has to evaluate
    pub fn pending(&self) -> impl Iterator<Item = &'a SupportFamily> {
        self.families.iter().filter(|f| !f.complete)
    }

    pub fn verify(
        &self,
        context: &mut EngineContext,
        table: &AtomTable,
        model: &Interpretation,
    ) -> Result<Verdict, EngineError> {
        for family in self.pending() {
            let atom = &family.atom;
            let mut relevant: Vec<AtomId> = UpdateKind::ALL
                .iter()
                .flat_map(|kind| table.by_predicate(atom.updates.predicate(*kind), kind.arity()))
                .copied()
                .collect();
            let updates: Vec<Assertion> = relevant
                .iter()
                .filter(|id| model.contains(**id))
                .filter_map(|id| update_assertion(atom, table.atom(*id)).map(|(_, a)| a))
                .collect();

            let mut input = QueryInput::new(updates);
            if self.repair && atom.use_abox {
                let bars: Vec<AtomId> = [(vocab::BAR_C, 3), (vocab::BAR_R, 4)]
                    .iter()
                    .flat_map(|(predicate, arity)| table.by_predicate(&Symbol::new(*predicate), *arity))
                    .copied()
                    .filter(|id| {
                        table.atom(*id).args.first().and_then(|t| t.as_const()) == Some(&atom.ontology)
                    })
                    .collect();
                let deleted: BTreeSet<Assertion> = bars
                    .iter()
                    .filter(|id| model.contains(**id))
                    .filter_map(|id| bar_assertion(table.atom(*id)).map(|(_, a)| a))
                    .collect();
                let entry = context.ontology(atom.ontology.as_str())?;
                let retained = entry
                    .ontology()
                    .abox
                    .assertions()
                    .filter(|a| !deleted.contains(a))
                    .collect();
                input = input.with_retained(retained);
                relevant.extend(bars);
            }

            let answer = evaluate(context, atom, &input, Some(self.domain))?;
            for tuple in all_tuples(self.domain, atom.output_arity()) {
                let output = table.get(&Atom::ground(vocab::replacement(family.index), tuple.iter().cloned()));
                let guessed = output.map_or(false, |id| model.contains(id));
                let entailed = answer.contains(&tuple);
                if guessed == entailed {
                    continue;
                }

                let mut literals: Vec<(AtomId, bool)> =
                    relevant.iter().map(|id| (*id, model.contains(*id))).collect();
                if let Some(id) = output {
                    literals.push((id, guessed));
                }
                debug!(
                    "Candidate guessed {} for {} on {:?}, reasoner says {}",
                    guessed, atom, tuple, entailed
                );
                context.stats.counterexamples += 1;
                return Ok(Verdict::Rejected(GroundNogood(literals)));
            }
        }
        Ok(Verdict::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{DlAtom, QueryShape, UpdatePredicates};
    use crate::config::EngineConfig;
    use crate::repair::bar_atom;
    use dlhex_ontology::{MemoryOntologyLoader, Ontology};

    fn family(complete: bool) -> SupportFamily {
        SupportFamily {
            index: 0,
            atom: DlAtom {
                ontology: "o".into(),
                updates: UpdatePredicates {
                    concept_plus: "cp".into(),
                    concept_minus: "cm".into(),
                    role_plus: "rp".into(),
                    role_minus: "rm".into(),
                },
                query: QueryShape::Concept {
                    concept: "Animal".into(),
                    negated: false,
                },
                use_abox: true,
            },
            sets: Vec::new(),
            complete,
        }
    }

    fn context() -> EngineContext {
        let ontology = Ontology::new("o")
            .subclass("Person", "Animal")
            .fact(Assertion::concept("Animal", "rex", false));
        EngineContext::new(EngineConfig::default(), MemoryOntologyLoader::new().with(ontology))
    }

    fn setup() -> (AtomTable, [AtomId; 5], BTreeSet<Symbol>) {
        let mut table = AtomTable::new();
        let ids = [
            table.intern(Atom::ground("cp", ["Person", "bob"])),
            table.intern(Atom::ground("dlhex_e0", ["bob"])),
            table.intern(Atom::ground("dlhex_ne0", ["bob"])),
            table.intern(Atom::ground("dlhex_e0", ["rex"])),
            table.intern(Atom::ground("dlhex_ne0", ["rex"])),
        ];
        let domain = ["bob".into(), "rex".into()].into_iter().collect();
        (table, ids, domain)
    }

    #[test]
    fn test_correct_guess_is_accepted() {
        let (table, [cp, e_bob, _, e_rex, _], domain) = setup();
        let families = vec![family(false)];
        let model: Interpretation = [cp, e_bob, e_rex].into_iter().collect();
        let mut ctx = context();
        let verdict = PostCheckVerifier::new(&families, &domain)
            .verify(&mut ctx, &table, &model)
            .unwrap();
        assert!(verdict.is_accepted());
        assert!(ctx.stats.oracle_calls > 0);
    }

    #[test]
    fn test_wrong_guess_gives_counterexample() {
        let (table, [cp, _, ne_bob, e_rex, _], domain) = setup();
        let families = vec![family(false)];
        let model: Interpretation = [cp, ne_bob, e_rex].into_iter().collect();
        let mut ctx = context();
        let verdict = PostCheckVerifier::new(&families, &domain)
            .verify(&mut ctx, &table, &model)
            .unwrap();
        let e_bob = table.get(&Atom::ground("dlhex_e0", ["bob"])).unwrap();
        assert_eq!(verdict, Verdict::Rejected(GroundNogood(vec![(cp, true), (e_bob, false)])));
        assert_eq!(ctx.stats.counterexamples, 1);
    }

    #[test]
    fn test_complete_families_are_skipped() {
        let (table, _, domain) = setup();
        let families = vec![family(true)];
        let mut ctx = context();
        let verdict = PostCheckVerifier::new(&families, &domain)
            .verify(&mut ctx, &table, &Interpretation::new())
            .unwrap();
        assert!(verdict.is_accepted());
        assert_eq!(ctx.stats.oracle_calls, 0);
    }

    #[test]
    fn test_deleted_assertions_are_not_retained() {
        let (mut table, [_, _, _, e_rex, ne_rex], domain) = setup();
        let bar = table.intern(bar_atom(&"o".into(), &Assertion::concept("Animal", "rex", false)));
        let families = vec![family(false)];
        let mut ctx = context();
        let verifier = PostCheckVerifier::new(&families, &domain).with_repair(true);

        let kept: Interpretation = [e_rex].into_iter().collect();
        assert!(verifier.verify(&mut ctx, &table, &kept).unwrap().is_accepted());

        let deleted: Interpretation = [bar, ne_rex].into_iter().collect();
        assert!(verifier.verify(&mut ctx, &table, &deleted).unwrap().is_accepted());

        let stale: Interpretation = [bar, e_rex].into_iter().collect();
        assert!(matches!(
            verifier.verify(&mut ctx, &table, &stale).unwrap(),
            Verdict::Rejected(nogood) if nogood.literals().contains(&(bar, true))
        ));
    }
}
