//! Repair encoding
//!
//! Turns support sets into `dlhex_supp<k>` rules with soundness and
//! completeness constraints. With repair enabled the baseline ABox becomes
//! `dlhex_abox_*` facts, guards become "asserted and not deleted", and every
//! asserted fact may be deleted (`dlhex_bar_*`) by a choice rule. Conflicts and
//! violated support sets force deletions; the configured limits bound them.

use crate::config::RepairOptions;
use crate::guard::{guard_assertion, resolve_instances, AboxSnapshot};
use crate::learner::SupportFamily;
use crate::EngineError;
use dlhex_asp::{Aggregate, AggregateElement, AggregateFunction, BodyLiteral, CompareOp, Program, Rule};
use dlhex_core::{vocab, Atom, LiteralKind, Nogood, Symbol, Term};
use dlhex_ontology::names;
use dlhex_ontology::{Assertion, CachedOntology};
use std::collections::BTreeMap;
use tracing::{debug, info};

fn assertion_args(ontology: &Symbol, assertion: &Assertion) -> Vec<Term> {
    let mut args = vec![Term::Const(ontology.clone()), Term::Const(assertion.name())];
    args.extend(assertion.individuals().into_iter().map(Term::Const));
    args
}

fn is_role(assertion: &Assertion) -> bool {
    matches!(assertion, Assertion::Role(_))
}

/// `dlhex_abox_c(O, N, x)` / `dlhex_abox_r(O, N, x, y)`
pub fn abox_atom(ontology: &Symbol, assertion: &Assertion) -> Atom {
    let predicate = if is_role(assertion) { vocab::ABOX_R } else { vocab::ABOX_C };
    Atom::new(predicate, assertion_args(ontology, assertion))
}

/// `dlhex_bar_c(O, N, x)` / `dlhex_bar_r(O, N, x, y)`
pub fn bar_atom(ontology: &Symbol, assertion: &Assertion) -> Atom {
    let predicate = if is_role(assertion) { vocab::BAR_R } else { vocab::BAR_C };
    Atom::new(predicate, assertion_args(ontology, assertion))
}

/// Ontology and assertion deleted by a ground bar atom
pub fn bar_assertion(atom: &Atom) -> Option<(Symbol, Assertion)> {
    let predicate = atom.predicate.as_str();
    if predicate != vocab::BAR_C && predicate != vocab::BAR_R {
        return None;
    }
    let args = atom.const_args()?;
    let (ontology, rest) = args.split_first()?;
    let guard = Atom::ground(vocab::GUARD, rest.iter().cloned());
    Some((ontology.clone(), guard_assertion(&guard)?))
}

/// Same arguments as `guard`, under another predicate and prefixed by the ontology
fn relabel(guard: &Atom, ontology: &Symbol, abox: bool) -> Atom {
    let role = guard.arity() == 3;
    let predicate = match (abox, role) {
        (true, false) => vocab::ABOX_C,
        (true, true) => vocab::ABOX_R,
        (false, false) => vocab::BAR_C,
        (false, true) => vocab::BAR_R,
    };
    let mut args = vec![Term::Const(ontology.clone())];
    args.extend(guard.args.iter().cloned());
    Atom::new(predicate, args)
}

fn output_args(set: &Nogood) -> Option<Vec<Term>> {
    set.of_kind(LiteralKind::Output).next().map(|l| l.atom.args.clone())
}

/// Body literals of a support set other than its output and guard
fn plain_body(set: &Nogood) -> Vec<BodyLiteral> {
    set.iter()
        .filter(|l| !matches!(l.kind, LiteralKind::Output | LiteralKind::Guard))
        .map(|l| {
            if l.positive {
                BodyLiteral::Pos(l.atom.clone())
            } else {
                BodyLiteral::Neg(l.atom.clone())
            }
        })
        .collect()
}

fn variables(arity: usize) -> Vec<Term> {
    (0..arity).map(|i| Term::var(format!("V{}", i))).collect()
}

fn count_above(elements: Vec<AggregateElement>, bound: usize) -> BodyLiteral {
    BodyLiteral::Aggregate(Aggregate {
        function: AggregateFunction::Count,
        elements,
        op: CompareOp::Gt,
        bound: i64::try_from(bound).unwrap_or(i64::MAX),
    })
}

/// Encodes support families, and with repair enabled the deletion search space
pub struct RepairEncoder<'a> {
    options: &'a RepairOptions,
}

impl<'a> RepairEncoder<'a> {
    pub fn new(options: &'a RepairOptions) -> Self {
        Self { options }
    }

    pub fn repair_enabled(&self) -> bool {
        self.options.enabled
    }

    /// Support rules and constraints of one DL atom.
    ///
    /// Without repair, guards are resolved against `baseline` here; with repair
    /// they stay in the program as `abox(g), not bar(g)`.
    pub fn encode_family(&self, family: &SupportFamily, baseline: &AboxSnapshot) -> Program {
        let mut program = Program::new();
        let support = vocab::support(family.index);
        let ontology = &family.atom.ontology;

        for set in &family.sets {
            let args = match output_args(set) {
                Some(args) => args,
                None => continue,
            };
            let head = Atom::new(support.clone(), args.clone());
            let guard = match set.guard() {
                None => {
                    program.push(Rule::normal(head, plain_body(set)));
                    continue;
                }
                Some(guard) => guard,
            };

            if self.options.enabled {
                let abox = relabel(&guard.atom, ontology, true);
                let bar = relabel(&guard.atom, ontology, false);
                let mut body = plain_body(set);
                body.push(BodyLiteral::Pos(abox.clone()));
                body.push(BodyLiteral::Neg(bar.clone()));
                program.push(Rule::normal(head, body));

                // the guarded assertion must go when the atom takes the other value
                let mut block = plain_body(set);
                block.push(BodyLiteral::Pos(abox));
                block.push(BodyLiteral::Pos(family.opposite(args)));
                program.push(Rule::normal(bar, block));
            } else {
                for instance in resolve_instances(set, baseline) {
                    if let Some(args) = output_args(&instance) {
                        program.push(Rule::normal(Atom::new(support.clone(), args), plain_body(&instance)));
                    }
                }
            }
        }

        let vars = variables(family.atom.output_arity());
        let supp = Atom::new(support, vars.clone());
        // a support set never holds against the value it forces
        program.push(Rule::constraint(vec![
            BodyLiteral::Pos(family.opposite(vars.clone())),
            BodyLiteral::Pos(supp.clone()),
        ]));
        if family.complete {
            program.push(Rule::constraint(vec![
                BodyLiteral::Pos(family.target(vars)),
                BodyLiteral::Neg(supp),
            ]));
        }
        debug!(
            "Encoded {} support sets of {} into {} rules",
            family.sets.len(),
            family.atom,
            program.len()
        );
        program
    }

    /// Baseline facts, deletion choices, forced deletions for baseline conflicts, limits and protections
    pub fn encode_repair(&self, ontologies: &[std::sync::Arc<CachedOntology>]) -> Result<Program, EngineError> {
        let mut program = Program::new();
        if !self.options.enabled {
            return Ok(program);
        }

        let mut all = Vec::new();
        for entry in ontologies {
            let name = entry.name().clone();
            for assertion in entry.ontology().abox.assertions() {
                program.push(Rule::fact(abox_atom(&name, &assertion)));
                all.push((name.clone(), assertion));
            }
            for (arity, abox, bar) in [(1, vocab::ABOX_C, vocab::BAR_C), (2, vocab::ABOX_R, vocab::BAR_R)] {
                let mut args = vec![Term::Const(name.clone())];
                args.extend(variables(arity + 1));
                program.push(Rule::choice(
                    vec![Atom::new(bar, args.clone())],
                    vec![BodyLiteral::Pos(Atom::new(abox, args))],
                ));
            }
            for conflict in entry.abox_conflicts()? {
                let heads = conflict
                    .assertions
                    .iter()
                    .map(|a| bar_atom(&name, a))
                    .collect();
                program.push(Rule::disjunctive(heads, Vec::new()));
            }
        }

        let element = |ontology: &Symbol, assertion: &Assertion| AggregateElement {
            terms: assertion_args(ontology, assertion),
            condition: vec![BodyLiteral::Pos(bar_atom(ontology, assertion))],
        };

        if let Some(max) = self.options.max_deletions {
            let elements = all.iter().map(|(o, a)| element(o, a)).collect();
            program.push(Rule::constraint(vec![count_above(elements, max)]));
        }

        let mut by_predicate: BTreeMap<(Symbol, Symbol), Vec<&Assertion>> = BTreeMap::new();
        for (ontology, assertion) in &all {
            let base = Symbol::new(names::positive(assertion.name().as_str()));
            by_predicate
                .entry((ontology.clone(), base))
                .or_default()
                .push(assertion);
        }

        for ((ontology, base), assertions) in &by_predicate {
            for assertion in assertions {
                let bar = BodyLiteral::Pos(bar_atom(ontology, assertion));
                program.push(Rule::normal(
                    Atom::ground(vocab::DELETED_PRED, [ontology.clone(), base.clone()]),
                    vec![bar.clone()],
                ));
                for individual in assertion.individuals() {
                    program.push(Rule::normal(
                        Atom::ground(vocab::DELETED_CONST, [individual.clone()]),
                        vec![bar.clone()],
                    ));
                    if !self.options.may_delete_constant(individual.as_str()) {
                        let protect = Atom::ground(vocab::PROTECT_CONST, [individual]);
                        program.push(Rule::fact(protect.clone()));
                        program.push(Rule::constraint(vec![bar.clone(), BodyLiteral::Pos(protect)]));
                    }
                }
                if !self.options.may_delete_predicate(base.as_str()) {
                    let protect = Atom::ground(vocab::PROTECT_PRED, [ontology.clone(), base.clone()]);
                    program.push(Rule::fact(protect.clone()));
                    program.push(Rule::constraint(vec![bar, BodyLiteral::Pos(protect)]));
                }
            }
            if let Some(max) = self.options.max_deletions_per_predicate {
                let elements = assertions.iter().map(|a| element(ontology, a)).collect();
                program.push(Rule::constraint(vec![count_above(elements, max)]));
            }
        }

        if let Some(max) = self.options.max_deleted_predicates {
            let element = AggregateElement {
                terms: vec![Term::var("O"), Term::var("P")],
                condition: vec![BodyLiteral::Pos(Atom::new(
                    vocab::DELETED_PRED,
                    vec![Term::var("O"), Term::var("P")],
                ))],
            };
            program.push(Rule::constraint(vec![count_above(vec![element], max)]));
        }
        if let Some(max) = self.options.max_deleted_constants {
            let element = AggregateElement {
                terms: vec![Term::var("X")],
                condition: vec![BodyLiteral::Pos(Atom::new(vocab::DELETED_CONST, vec![Term::var("X")]))],
            };
            program.push(Rule::constraint(vec![count_above(vec![element], max)]));
        }

        info!(
            "Repair encoding: {} deletable assertions, {} rules",
            all.len(),
            program.len()
        );
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{DlAtom, QueryShape, UpdatePredicates};
    use dlhex_core::Literal;
    use dlhex_ontology::Ontology;

    fn family(sets: Vec<Nogood>, complete: bool) -> SupportFamily {
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
            sets,
            complete,
        }
    }

    fn guarded() -> Nogood {
        Nogood::new()
            .with(Literal::pos(
                Atom::new(vocab::GUARD, vec![Term::constant("Person"), Term::var("O")]),
                LiteralKind::Guard,
            ))
            .with(Literal::neg(
                Atom::new("dlhex_e0", vec![Term::var("O")]),
                LiteralKind::Output,
            ))
    }

    fn lines(program: &Program) -> Vec<String> {
        program.rules.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_guard_resolved_against_baseline() {
        let options = RepairOptions::default();
        let baseline = AboxSnapshot::new(vec![
            Assertion::concept("Person", "bob", false),
            Assertion::concept("Person", "ann", true),
        ]);
        let program = RepairEncoder::new(&options).encode_family(&family(vec![guarded()], true), &baseline);
        let shown = lines(&program);
        assert!(shown.contains(&"dlhex_supp0(bob).".to_string()));
        assert!(!shown.iter().any(|l| l.contains("ann")));
        assert!(shown.contains(&":- dlhex_ne0(V0), dlhex_supp0(V0).".to_string()));
        assert!(shown.contains(&":- dlhex_e0(V0), not dlhex_supp0(V0).".to_string()));
    }

    #[test]
    fn test_incomplete_family_has_no_completeness_constraint() {
        let options = RepairOptions::default();
        let program = RepairEncoder::new(&options)
            .encode_family(&family(vec![guarded()], false), &AboxSnapshot::default());
        assert_eq!(lines(&program), vec![":- dlhex_ne0(V0), dlhex_supp0(V0)."]);
    }

    #[test]
    fn test_guard_becomes_repairable_in_repair_mode() {
        let options = RepairOptions {
            enabled: true,
            ..RepairOptions::default()
        };
        let program = RepairEncoder::new(&options)
            .encode_family(&family(vec![guarded()], true), &AboxSnapshot::default());
        let shown = lines(&program);
        assert!(shown.contains(
            &"dlhex_supp0(O) :- dlhex_abox_c(o,\"Person\",O), not dlhex_bar_c(o,\"Person\",O).".to_string()
        ));
        assert!(shown.contains(
            &"dlhex_bar_c(o,\"Person\",O) :- dlhex_abox_c(o,\"Person\",O), dlhex_ne0(O).".to_string()
        ));
    }

    #[test]
    fn test_repair_program_limits_and_protection() {
        let ontology = Ontology::new("o")
            .fact(Assertion::concept("Person", "bob", false))
            .fact(Assertion::concept("Person", "bob", true))
            .fact(Assertion::role("knows", "bob", "ann", false));
        let entry = std::sync::Arc::new(CachedOntology::new(ontology));
        let mut options = RepairOptions {
            enabled: true,
            max_deletions: Some(1),
            max_deleted_predicates: Some(1),
            ..RepairOptions::default()
        };
        options.denied_constants.insert("ann".into());
        let program = RepairEncoder::new(&options).encode_repair(&[entry]).unwrap();
        let shown = lines(&program);
        assert!(shown.contains(&"dlhex_abox_r(o,knows,bob,ann).".to_string()));
        assert!(shown.contains(
            &"dlhex_bar_c(o,\"Person\",bob) | dlhex_bar_c(o,\"¬Person\",bob).".to_string()
        ));
        assert!(shown.contains(&"dlhex_protect_const(ann).".to_string()));
        assert!(shown.contains(&"{dlhex_bar_r(o,V0,V1,V2)} :- dlhex_abox_r(o,V0,V1,V2).".to_string()));
        assert!(shown.iter().any(|l| l.starts_with(":- #count{") && l.ends_with("> 1.")));

        let models = dlhex_asp::solve_all(&program).unwrap();
        // exactly one of the two complementary assertions is deleted
        assert_eq!(models.len(), 2);

        options.max_deletions = Some(2);
        options.max_deleted_predicates = None;
        let entry = std::sync::Arc::new(CachedOntology::new(
            Ontology::new("o")
                .fact(Assertion::concept("Person", "bob", false))
                .fact(Assertion::role("knows", "bob", "carl", false)),
        ));
        let program = RepairEncoder::new(&options).encode_repair(&[entry]).unwrap();
        // any subset of a consistent ABox may still be deleted
        assert_eq!(dlhex_asp::solve_all(&program).unwrap().len(), 4);
    }

    #[test]
    fn test_bar_atom_round_trip() {
        let assertion = Assertion::role("knows", "bob", "ann", true);
        let bar = bar_atom(&"o".into(), &assertion);
        assert_eq!(bar_assertion(&bar), Some(("o".into(), assertion)));
        assert_eq!(bar_assertion(&Atom::prop("other")), None);
    }
}
