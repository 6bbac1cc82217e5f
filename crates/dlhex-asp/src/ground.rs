//! Bottom-up grounding

use crate::program::{AggregateFunction, BodyLiteral, CompareOp, Head, Program, Rule};
use crate::AspError;
use dlhex_core::{Atom, AtomId, AtomTable, Bindings, Term};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroundHead {
    Disjunction(Vec<AtomId>),
    Choice(Vec<AtomId>),
}

/// One instance of an aggregate element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundElement {
    pub tuple: Vec<Term>,
    pub pos: Vec<AtomId>,
    pub neg: Vec<AtomId>,
}

impl GroundElement {
    /// Weight contributed under `#sum`; the first tuple term
    pub fn weight(&self) -> i64 {
        self.tuple.first().and_then(Term::as_int).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundAggregate {
    pub function: AggregateFunction,
    pub op: CompareOp,
    pub bound: i64,
    pub elements: Vec<GroundElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundRule {
    pub head: GroundHead,
    pub pos: Vec<AtomId>,
    pub neg: Vec<AtomId>,
    pub aggregates: Vec<GroundAggregate>,
}

impl GroundRule {
    pub fn is_constraint(&self) -> bool {
        matches!(&self.head, GroundHead::Disjunction(atoms) if atoms.is_empty())
    }
}

/// Ground rules together with the table of every atom that may become true
#[derive(Debug, Clone, Default)]
pub struct GroundProgram {
    pub table: AtomTable,
    pub rules: Vec<GroundRule>,
}

/// Instantiates a [`Program`] over the atoms it can possibly derive.
///
/// Possible atoms are computed by a fixpoint that ignores negation; every
/// rule is then instantiated by joining its positive body against that set.
/// Negative literals over impossible atoms are dropped since they always hold.
pub struct Grounder<'a> {
    program: &'a Program,
    table: AtomTable,
}

impl<'a> Grounder<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            table: AtomTable::new(),
        }
    }

    fn check(&self) -> Result<(), AspError> {
        for rule in &self.program.rules {
            if let Some(variable) = rule.unsafe_variables().into_iter().next() {
                return Err(AspError::Unsafe {
                    rule: rule.to_string(),
                    variable: variable.to_string(),
                });
            }
            let has_aggregate = rule
                .body
                .iter()
                .any(|l| matches!(l, BodyLiteral::Aggregate(_)));
            if has_aggregate && !rule.is_constraint() {
                return Err(AspError::Unsupported(format!(
                    "aggregates are only supported in constraints: {}",
                    rule
                )));
            }
        }
        Ok(())
    }

    fn saturate(&mut self) {
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let before = self.table.len();
            let program = self.program;
            for rule in &program.rules {
                if rule.head.atoms().is_empty() {
                    continue;
                }
                let heads: Vec<Atom> = join(&self.table, &positive_atoms(&rule.body), Bindings::new())
                    .iter()
                    .flat_map(|b| rule.head.atoms().iter().map(move |h| h.substitute(b)))
                    .collect();
                for head in heads {
                    self.table.intern(head);
                }
            }
            if self.table.len() == before {
                break;
            }
        }
        debug!("Possible atoms saturated after {} rounds: {} atoms", rounds, self.table.len());
    }

    /// Over-approximation of the atoms true in some answer set
    pub fn possible_atoms(mut self) -> Result<AtomTable, AspError> {
        self.check()?;
        self.saturate();
        Ok(self.table)
    }

    pub fn ground(mut self) -> Result<GroundProgram, AspError> {
        self.check()?;
        self.saturate();

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        let program = self.program;
        for rule in &program.rules {
            for bindings in join(&self.table, &positive_atoms(&rule.body), Bindings::new()) {
                let ground = self.instantiate(rule, &bindings)?;
                if seen.insert(ground.clone()) {
                    rules.push(ground);
                }
            }
        }
        debug!("Grounded {} rules over {} atoms", rules.len(), self.table.len());
        Ok(GroundProgram {
            table: self.table,
            rules,
        })
    }

    fn instantiate(&mut self, rule: &Rule, bindings: &Bindings) -> Result<GroundRule, AspError> {
        let head_ids: Vec<AtomId> = rule
            .head
            .atoms()
            .iter()
            .map(|h| self.table.intern(h.substitute(bindings)))
            .collect();
        let head = match rule.head {
            Head::Disjunction(_) => GroundHead::Disjunction(head_ids),
            Head::Choice(_) => GroundHead::Choice(head_ids),
        };

        let mut pos = Vec::new();
        let mut neg = Vec::new();
        let mut aggregates = Vec::new();
        for literal in &rule.body {
            match literal {
                BodyLiteral::Pos(atom) => {
                    if let Some(id) = self.table.get(&atom.substitute(bindings)) {
                        pos.push(id);
                    }
                }
                BodyLiteral::Neg(atom) => {
                    if let Some(id) = self.table.get(&atom.substitute(bindings)) {
                        neg.push(id);
                    }
                }
                BodyLiteral::Aggregate(aggregate) => {
                    let mut elements = Vec::new();
                    for element in &aggregate.elements {
                        let condition = positive_atoms(&element.condition);
                        for local in join(&self.table, &condition, bindings.clone()) {
                            let tuple: Vec<Term> =
                                element.terms.iter().map(|t| t.substitute(&local)).collect();
                            if let Some(t) = tuple.iter().find(|t| !t.is_ground()) {
                                return Err(AspError::Unsafe {
                                    rule: rule.to_string(),
                                    variable: t.to_string(),
                                });
                            }
                            if aggregate.function == AggregateFunction::Sum
                                && tuple.first().and_then(Term::as_int).is_none()
                            {
                                return Err(AspError::Unsupported(format!(
                                    "#sum element without integer weight in {}",
                                    rule
                                )));
                            }
                            let mut ground = GroundElement {
                                tuple,
                                pos: Vec::new(),
                                neg: Vec::new(),
                            };
                            for c in &element.condition {
                                match c {
                                    BodyLiteral::Pos(atom) => {
                                        if let Some(id) = self.table.get(&atom.substitute(&local)) {
                                            ground.pos.push(id);
                                        }
                                    }
                                    BodyLiteral::Neg(atom) => {
                                        if let Some(id) = self.table.get(&atom.substitute(&local)) {
                                            ground.neg.push(id);
                                        }
                                    }
                                    BodyLiteral::Aggregate(_) => {
                                        return Err(AspError::Unsupported(
                                            "nested aggregates".to_string(),
                                        ))
                                    }
                                }
                            }
                            elements.push(ground);
                        }
                    }
                    aggregates.push(GroundAggregate {
                        function: aggregate.function,
                        op: aggregate.op,
                        bound: aggregate.bound,
                        elements,
                    });
                }
            }
        }

        Ok(GroundRule {
            head,
            pos,
            neg,
            aggregates,
        })
    }
}

fn positive_atoms(body: &[BodyLiteral]) -> Vec<&Atom> {
    body.iter()
        .filter_map(|l| match l {
            BodyLiteral::Pos(atom) => Some(atom),
            _ => None,
        })
        .collect()
}

/// All extensions of `bindings` under which every pattern is an atom of `table`
fn join(table: &AtomTable, patterns: &[&Atom], bindings: Bindings) -> Vec<Bindings> {
    let mut frontier = vec![bindings];
    for pattern in patterns {
        let mut next = Vec::new();
        for current in &frontier {
            let instance = pattern.substitute(current);
            for id in table.candidates(&instance) {
                let mut extended = current.clone();
                if instance.match_ground(table.atom(*id), &mut extended) {
                    next.push(extended);
                }
            }
        }
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

/// Ground `program` in one call
pub fn ground(program: &Program) -> Result<GroundProgram, AspError> {
    Grounder::new(program).ground()
}
