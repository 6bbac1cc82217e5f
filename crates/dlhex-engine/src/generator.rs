//! Guess-and-check model generation
//!
//! Every DL atom `k` is replaced by `dlhex_e<k>` and guessed against
//! `dlhex_ne<k>` over the domain. Learned support sets and the repair encoding
//! are added to the guessed program, the base solver enumerates candidates,
//! and the post-check confirms the atoms the support sets could not decide.

use crate::atom::{DlAtom, HexLiteral, HexProgram, HexRule};
use crate::context::{classification, EngineContext};
use crate::guard::AboxSnapshot;
use crate::learner::{SupportFamily, SupportSetLearner};
use crate::repair::{bar_assertion, RepairEncoder};
use crate::verify::{PostCheckVerifier, Verdict};
use crate::EngineError;
use dlhex_asp::{BacktrackingSolver, BaseSolver, BodyLiteral, Grounder, Program, Rule};
use dlhex_core::{vocab, Atom, AtomTable, Interpretation, Symbol, Term};
use dlhex_ontology::{Assertion, CachedOntology};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Phase of a [`ModelGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeneratorState {
    Init,
    Grounding,
    Solving,
    Verifying,
    /// The last candidate was returned to the caller
    Accepted,
    /// No candidates left
    Unsatisfiable,
    Failed,
}

/// Baseline assertion removed by a repair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Deletion {
    pub ontology: Symbol,
    pub assertion: Assertion,
}

/// Accepted model without auxiliary atoms, with the deletions it relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSet {
    pub atoms: Vec<Atom>,
    pub repair: Vec<Deletion>,
}

impl AnswerSet {
    fn from_model(table: &AtomTable, model: &Interpretation) -> Self {
        let mut atoms: Vec<Atom> = model
            .atoms(table)
            .filter(|a| !vocab::is_auxiliary(a.predicate.as_str()))
            .cloned()
            .collect();
        atoms.sort();
        let mut repair: Vec<Deletion> = model
            .atoms(table)
            .filter_map(bar_assertion)
            .map(|(ontology, assertion)| Deletion { ontology, assertion })
            .collect();
        repair.sort();
        Self { atoms, repair }
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.binary_search(atom).is_ok()
    }
}

impl std::fmt::Display for AnswerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.atoms.iter().join(", "))?;
        if !self.repair.is_empty() {
            let deleted = self
                .repair
                .iter()
                .map(|d| format!("{}:{}", d.ontology, d.assertion))
                .join(", ");
            write!(f, " without {{{}}}", deleted)?;
        }
        Ok(())
    }
}

/// Program and learned data fixed before grounding
struct Prepared {
    program: Program,
    families: Vec<SupportFamily>,
    domain: BTreeSet<Symbol>,
    repair: bool,
}

fn dom_facts(domain: &BTreeSet<Symbol>) -> impl Iterator<Item = Rule> + '_ {
    domain
        .iter()
        .map(|x| Rule::fact(Atom::ground(vocab::DOM, [x.clone()])))
}

/// `dlhex_e<k>(X..) | dlhex_ne<k>(X..) :- dlhex_dom(X), ...`
fn guess_rule(index: usize, arity: usize) -> Rule {
    let vars: Vec<Term> = (0..arity).map(|i| Term::var(format!("X{}", i))).collect();
    let body = vars
        .iter()
        .map(|v| BodyLiteral::Pos(Atom::new(vocab::DOM, vec![v.clone()])))
        .collect();
    Rule::disjunctive(
        vec![
            Atom::new(vocab::replacement(index), vars.clone()),
            Atom::new(vocab::negated_replacement(index), vars),
        ],
        body,
    )
}

/// Replace the DL atoms of `rule` by their replacement atoms
fn rewrite(rule: &HexRule, atoms: &[DlAtom]) -> Result<Rule, EngineError> {
    if let Some(reserved) = rule
        .head
        .atoms()
        .iter()
        .find(|a| vocab::is_auxiliary(a.predicate.as_str()))
    {
        return Err(EngineError::Configuration(format!(
            "reserved predicate {} in rule head: {}",
            reserved.predicate, rule
        )));
    }
    let mut body = Vec::with_capacity(rule.body.len());
    for literal in &rule.body {
        body.push(match literal {
            HexLiteral::Pos(atom) => BodyLiteral::Pos(atom.clone()),
            HexLiteral::Neg(atom) => BodyLiteral::Neg(atom.clone()),
            HexLiteral::Aggregate(aggregate) => BodyLiteral::Aggregate(aggregate.clone()),
            HexLiteral::Dl { atom, positive } => {
                let dl = DlAtom::from_invocation(atom)?;
                let index = atoms.iter().position(|a| *a == dl).ok_or_else(|| {
                    EngineError::Configuration(format!("unregistered DL atom {}", atom))
                })?;
                let replacement = Atom::new(vocab::replacement(index), atom.output.clone());
                if *positive {
                    BodyLiteral::Pos(replacement)
                } else {
                    BodyLiteral::Neg(replacement)
                }
            }
        });
    }
    Ok(Rule {
        head: rule.head.clone(),
        body,
    })
}

fn missing(what: &str) -> EngineError {
    EngineError::Configuration(format!("model generator has no {}", what))
}

/// Enumerates the answer sets of a program with DL atoms, one per call
pub struct ModelGenerator {
    program: HexProgram,
    state: GeneratorState,
    prepared: Option<Prepared>,
    solver: Option<BacktrackingSolver>,
    candidate: Option<Interpretation>,
    accepted: usize,
}

impl ModelGenerator {
    pub fn new(program: HexProgram) -> Self {
        Self {
            program,
            state: GeneratorState::Init,
            prepared: None,
            solver: None,
            candidate: None,
            accepted: 0,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Ground-ready program, once prepared
    pub fn encoded_program(&self) -> Option<&Program> {
        self.prepared.as_ref().map(|p| &p.program)
    }

    pub fn families(&self) -> &[SupportFamily] {
        self.prepared.as_ref().map_or(&[], |p| p.families.as_slice())
    }

    /// Next accepted answer set; `None` once the search space or `max_models` is exhausted.
    ///
    /// A reasoner error while verifying leaves the candidate pending for the next
    /// call; any other error fails the generator.
    pub fn next_model(&mut self, context: &mut EngineContext) -> Result<Option<AnswerSet>, EngineError> {
        let result = self.run(context);
        match &result {
            // the candidate stays pending and is verified again on the next call
            Err(EngineError::Reasoner(_)) if self.state == GeneratorState::Verifying => {}
            Err(_) => self.state = GeneratorState::Failed,
            Ok(_) => {}
        }
        result
    }

    fn run(&mut self, context: &mut EngineContext) -> Result<Option<AnswerSet>, EngineError> {
        loop {
            match self.state {
                GeneratorState::Init => {
                    self.prepared = Some(self.prepare(context)?);
                    self.state = GeneratorState::Grounding;
                }
                GeneratorState::Grounding => {
                    let prepared = self.prepared.as_ref().ok_or_else(|| missing("program"))?;
                    let ground = Grounder::new(&prepared.program).ground()?;
                    info!(
                        "Grounded program: {} atoms, {} rules",
                        ground.table.len(),
                        ground.rules.len()
                    );
                    self.solver = Some(BacktrackingSolver::new(ground));
                    self.state = GeneratorState::Solving;
                }
                GeneratorState::Solving | GeneratorState::Accepted => {
                    if let Some(max) = context.config().max_models {
                        if self.accepted >= max {
                            info!("Reached the limit of {} answer sets", max);
                            return Ok(None);
                        }
                    }
                    let solver = self.solver.as_mut().ok_or_else(|| missing("solver"))?;
                    match solver.next_model()? {
                        Some(model) => {
                            context.stats.candidates += 1;
                            self.candidate = Some(model);
                            self.state = GeneratorState::Verifying;
                        }
                        None => {
                            self.state = GeneratorState::Unsatisfiable;
                            let stats = &context.stats;
                            info!(
                                "Search finished with {} answer sets: {} candidates, {} rejected, {} oracle calls, {} support sets, {} counterexamples",
                                self.accepted,
                                stats.candidates,
                                stats.rejected,
                                stats.oracle_calls,
                                stats.support_sets,
                                stats.counterexamples
                            );
                            return Ok(None);
                        }
                    }
                }
                GeneratorState::Verifying => {
                    let prepared = self.prepared.as_ref().ok_or_else(|| missing("program"))?;
                    let solver = self.solver.as_mut().ok_or_else(|| missing("solver"))?;
                    let candidate = self.candidate.take().ok_or_else(|| missing("candidate"))?;
                    let verdict = match PostCheckVerifier::new(&prepared.families, &prepared.domain)
                        .with_repair(prepared.repair)
                        .verify(context, solver.table(), &candidate)
                    {
                        Ok(verdict) => verdict,
                        Err(e @ EngineError::Reasoner(_)) => {
                            warn!("Verification of candidate {} failed: {}", context.stats.candidates, e);
                            self.candidate = Some(candidate);
                            return Err(e);
                        }
                        Err(e) => return Err(e),
                    };
                    match verdict {
                        Verdict::Accepted => {
                            self.accepted += 1;
                            context.stats.accepted += 1;
                            self.state = GeneratorState::Accepted;
                            let answer = AnswerSet::from_model(solver.table(), &candidate);
                            info!("Answer set {}: {}", self.accepted, answer);
                            return Ok(Some(answer));
                        }
                        Verdict::Rejected(nogood) => {
                            context.stats.rejected += 1;
                            debug!("Rejected candidate; learned a nogood of {} literals", nogood.len());
                            solver.add_nogood(nogood);
                            self.state = GeneratorState::Solving;
                        }
                    }
                }
                GeneratorState::Unsatisfiable | GeneratorState::Failed => return Ok(None),
            }
        }
    }

    fn prepare(&self, context: &mut EngineContext) -> Result<Prepared, EngineError> {
        let config = context.config().clone();
        config.validate()?;
        let atoms = self.program.dl_atoms()?;

        let mut base = Program::new();
        for rule in &self.program.rules {
            base.push(rewrite(rule, &atoms)?);
        }
        for (index, atom) in atoms.iter().enumerate() {
            base.push(guess_rule(index, atom.output_arity()));
        }

        let mut entries: BTreeMap<Symbol, Arc<CachedOntology>> = BTreeMap::new();
        for atom in &atoms {
            if !entries.contains_key(&atom.ontology) {
                let entry = context.ontology(atom.ontology.as_str())?;
                entries.insert(atom.ontology.clone(), entry);
            }
        }
        let individuals: BTreeSet<Symbol> = entries
            .values()
            .flat_map(|e| e.ontology().individuals.iter().cloned())
            .collect();

        // every atom the update predicates can receive, over a generous domain
        let mut broad = individuals.clone();
        broad.extend(base.constants());
        let mut widened = base.clone();
        widened.extend(dom_facts(&broad));
        let possible = Grounder::new(&widened).possible_atoms()?;
        let maximal: Vec<Atom> = possible
            .iter()
            .map(|(_, atom)| atom)
            .filter(|fact| atoms.iter().any(|a| a.updates.kind_of(fact).is_some()))
            .cloned()
            .collect();

        let mut domain = individuals;
        for fact in &maximal {
            domain.extend(fact.args.iter().skip(1).filter_map(Term::as_const).cloned());
        }

        let mut families = Vec::with_capacity(atoms.len());
        for (index, atom) in atoms.iter().enumerate() {
            let entry = entries.get(&atom.ontology).ok_or_else(|| missing("ontology"))?;
            let classification = classification(entry)?;
            let family = SupportSetLearner::new(index, atom, entry.ontology(), classification, &config.learning)
                .repair(config.repair.enabled)
                .baseline_consistent(entry.is_abox_consistent()?)
                .learn(&maximal);
            context.stats.support_sets += family.sets.len();
            families.push(family);
        }

        let encoder = RepairEncoder::new(&config.repair);
        let mut program = base;
        program.extend(dom_facts(&domain));
        for family in &families {
            let entry = entries.get(&family.atom.ontology).ok_or_else(|| missing("ontology"))?;
            let baseline = if family.atom.use_abox {
                AboxSnapshot::from_abox(&entry.ontology().abox)
            } else {
                AboxSnapshot::default()
            };
            program.extend(encoder.encode_family(family, &baseline).rules);
        }
        let repairable: Vec<Arc<CachedOntology>> = entries
            .iter()
            .filter(|(name, _)| atoms.iter().any(|a| a.use_abox && &a.ontology == *name))
            .map(|(_, entry)| entry.clone())
            .collect();
        program.extend(encoder.encode_repair(&repairable)?.rules);

        info!(
            "Prepared {} DL atoms over {} individuals: {} support sets, {} to post-check, {} rules",
            atoms.len(),
            domain.len(),
            context.stats.support_sets,
            families.iter().filter(|f| !f.complete).count(),
            program.len()
        );
        debug!("Encoded program:\n{}", program);

        Ok(Prepared {
            program,
            families,
            domain,
            repair: encoder.repair_enabled(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{DlInvocation, DlKind};
    use crate::config::{EngineConfig, LearningOptions};
    use dlhex_asp::Head;
    use dlhex_ontology::{MemoryOntologyLoader, Ontology};
    use dlhex_reasoner::{
        AxiomHandle, ConceptExpr, DlReasoner, ReasonerError, ReasonerProvider, RoleExpr, SaturationProvider,
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    fn dl(kind: DlKind, query: Option<&str>, output: Vec<Term>) -> HexLiteral {
        let mut inputs: Vec<Term> = ["o", "cp", "cm", "rp", "rm"].iter().map(|s| Term::constant(*s)).collect();
        inputs.extend(query.map(Term::constant));
        HexLiteral::Dl {
            atom: DlInvocation { kind, inputs, output },
            positive: true,
        }
    }

    fn animals(config: EngineConfig) -> (HexProgram, EngineContext) {
        let ontology = Ontology::new("o")
            .subclass("Person", "Animal")
            .fact(Assertion::concept("Person", "bob", false));
        let program: HexProgram = vec![
            HexRule::fact(Atom::ground("cp", ["Person", "ann"])),
            HexRule::normal(
                Atom::new("animal", vec![Term::var("X")]),
                vec![dl(DlKind::Concept, Some("Animal"), vec![Term::var("X")])],
            ),
        ]
        .into_iter()
        .collect();
        let context = EngineContext::new(config, MemoryOntologyLoader::new().with(ontology));
        (program, context)
    }

    fn collect(program: HexProgram, context: &mut EngineContext) -> Vec<AnswerSet> {
        let mut generator = ModelGenerator::new(program);
        let mut answers = Vec::new();
        while let Some(answer) = generator.next_model(context).unwrap() {
            answers.push(answer);
        }
        assert_eq!(generator.state(), GeneratorState::Unsatisfiable);
        answers
    }

    #[test]
    fn test_complete_atom_needs_no_reasoner() {
        let (program, mut ctx) = animals(EngineConfig::default());
        let answers = collect(program, &mut ctx);
        assert_eq!(answers.len(), 1);
        assert!(answers[0].contains(&Atom::ground("animal", ["ann"])));
        assert!(answers[0].contains(&Atom::ground("animal", ["bob"])));
        assert!(answers[0].repair.is_empty());
        assert_eq!(ctx.stats.oracle_calls, 0);
        assert_eq!(ctx.stats.rejected, 0);
    }

    #[test]
    fn test_learning_disabled_gives_same_answers() {
        let (program, mut ctx) = animals(EngineConfig::default());
        let learned = collect(program, &mut ctx);

        let config = EngineConfig {
            learning: LearningOptions {
                enabled: false,
                ..LearningOptions::default()
            },
            ..EngineConfig::default()
        };
        let (program, mut ctx) = animals(config);
        assert_eq!(collect(program, &mut ctx), learned);
        assert!(ctx.stats.oracle_calls > 0);
    }

    #[test]
    fn test_consistency_atoms_on_inconsistent_abox() {
        let ontology = Ontology::new("o")
            .fact(Assertion::concept("Person", "bob", false))
            .fact(Assertion::concept("Person", "bob", true));
        let program: HexProgram = vec![
            HexRule::normal(Atom::prop("consistent"), vec![dl(DlKind::Consistent, None, vec![])]),
            HexRule::normal(Atom::prop("inconsistent"), vec![dl(DlKind::Inconsistent, None, vec![])]),
        ]
        .into_iter()
        .collect();
        let mut ctx = EngineContext::new(EngineConfig::default(), MemoryOntologyLoader::new().with(ontology));
        let answers = collect(program, &mut ctx);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].atoms, vec![Atom::prop("inconsistent")]);
    }

    #[test]
    fn test_reserved_head_is_rejected() {
        let program: HexProgram = vec![HexRule::fact(Atom::prop("dlhex_e0"))].into_iter().collect();
        let mut ctx = EngineContext::new(EngineConfig::default(), MemoryOntologyLoader::new());
        let mut generator = ModelGenerator::new(program);
        assert!(matches!(generator.next_model(&mut ctx), Err(EngineError::Configuration(_))));
        assert_eq!(generator.state(), GeneratorState::Failed);
        assert!(generator.next_model(&mut ctx).unwrap().is_none());
    }

    /// Saturation reasoner whose next consistency check fails while `fail` is set
    struct FlakyReasoner {
        inner: Box<dyn DlReasoner>,
        fail: Arc<AtomicBool>,
    }

    impl DlReasoner for FlakyReasoner {
        fn is_consistent(&mut self) -> Result<bool, ReasonerError> {
            if self.fail.swap(false, Ordering::SeqCst) {
                return Err(ReasonerError::Failed("connection reset".to_string()));
            }
            self.inner.is_consistent()
        }

        fn instances_of(&mut self, concept: &ConceptExpr) -> Result<Vec<Symbol>, ReasonerError> {
            self.inner.instances_of(concept)
        }

        fn role_fillers(&mut self, individual: &Symbol, role: &RoleExpr) -> Result<Vec<Symbol>, ReasonerError> {
            self.inner.role_fillers(individual, role)
        }

        fn assert(&mut self, axiom: Assertion) -> Result<AxiomHandle, ReasonerError> {
            self.inner.assert(axiom)
        }

        fn retract(&mut self, handle: AxiomHandle) -> Result<(), ReasonerError> {
            self.inner.retract(handle)
        }

        fn individuals(&self) -> Vec<Symbol> {
            self.inner.individuals()
        }
    }

    struct FlakyProvider(Arc<AtomicBool>);

    impl ReasonerProvider for FlakyProvider {
        fn open(&self, ontology: Arc<CachedOntology>, use_abox: bool) -> Result<Box<dyn DlReasoner>, ReasonerError> {
            Ok(Box::new(FlakyReasoner {
                inner: SaturationProvider.open(ontology, use_abox)?,
                fail: Arc::clone(&self.0),
            }))
        }
    }

    #[test]
    fn test_reasoner_failure_keeps_the_candidate() {
        let ontology = Ontology::new("o")
            .subclass("Person", "Animal")
            .fact(Assertion::concept("Person", "bob", false));
        let program: HexProgram = vec![
            HexRule::new(Head::Choice(vec![Atom::ground("cp", ["Person", "ann"])]), vec![]),
            HexRule::normal(
                Atom::new("q", vec![Term::var("X")]),
                vec![dl(DlKind::Concept, Some("Animal"), vec![Term::var("X")])],
            ),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig {
            learning: LearningOptions {
                enabled: false,
                ..LearningOptions::default()
            },
            ..EngineConfig::default()
        };
        let fail = Arc::new(AtomicBool::new(true));
        let mut ctx = EngineContext::new(config, MemoryOntologyLoader::new().with(ontology))
            .with_provider(FlakyProvider(Arc::clone(&fail)));

        let mut generator = ModelGenerator::new(program);
        assert!(matches!(generator.next_model(&mut ctx), Err(EngineError::Reasoner(_))));
        assert!(!fail.load(Ordering::SeqCst));
        assert_eq!(generator.state(), GeneratorState::Verifying);

        let mut answers = Vec::new();
        while let Some(answer) = generator.next_model(&mut ctx).unwrap() {
            answers.push(answer);
        }
        assert_eq!(generator.state(), GeneratorState::Unsatisfiable);
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a.contains(&Atom::ground("q", ["bob"]))));
        assert!(answers.iter().any(|a| a.contains(&Atom::ground("q", ["ann"]))));
        assert_eq!(ctx.stats.candidates, ctx.stats.accepted + ctx.stats.rejected);
    }

    #[test]
    fn test_guess_rule_shape() {
        assert_eq!(
            guess_rule(2, 2).to_string(),
            "dlhex_e2(X0,X1) | dlhex_ne2(X0,X1) :- dlhex_dom(X0), dlhex_dom(X1)."
        );
        assert_eq!(guess_rule(0, 0).to_string(), "dlhex_e0 | dlhex_ne0.");
    }
}
