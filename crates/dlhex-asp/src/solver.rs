//! Base solver over ground programs

use crate::ground::{GroundAggregate, GroundHead, GroundProgram};
use crate::program::AggregateFunction;
use crate::AspError;
use dlhex_core::{AtomId, AtomTable, GroundNogood, Interpretation};
use std::collections::BTreeMap;
use tracing::debug;

/// Source of candidate models that accepts learned nogoods between calls
pub trait BaseSolver {
    /// Atoms of the ground program
    fn table(&self) -> &AtomTable;

    /// Forbid every future model that satisfies all literals of `nogood`
    fn add_nogood(&mut self, nogood: GroundNogood);

    /// Next answer set not returned before, or `None` once the search space is exhausted
    fn next_model(&mut self) -> Result<Option<Interpretation>, AspError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub choices: u64,
    pub conflicts: u64,
    pub models: u64,
}

/// Normal rule obtained from shifting a ground rule
#[derive(Debug, Clone)]
struct NormalRule {
    head: Option<AtomId>,
    /// Head of a choice rule; derivable only when chosen
    choice: bool,
    pos: Vec<AtomId>,
    neg: Vec<AtomId>,
}

#[derive(Debug, Clone)]
struct AggregateConstraint {
    pos: Vec<AtomId>,
    neg: Vec<AtomId>,
    aggregates: Vec<GroundAggregate>,
}

type Assignment = Vec<Option<bool>>;

/// Bounds of the current partial assignment: atoms certainly true (`lower`)
/// and atoms possibly true (`upper`)
struct Bounds {
    lower: Vec<bool>,
    upper: Vec<bool>,
}

impl Bounds {
    fn certain(&self, (atom, positive): (AtomId, bool)) -> bool {
        if positive {
            self.lower[atom.index()]
        } else {
            !self.upper[atom.index()]
        }
    }

    fn possible(&self, (atom, positive): (AtomId, bool)) -> bool {
        if positive {
            self.upper[atom.index()]
        } else {
            !self.lower[atom.index()]
        }
    }
}

/// Depth-first search over the atoms that occur negatively or in choice heads.
///
/// Disjunctive heads are shifted, which is exact for head-cycle-free
/// programs. Every node is propagated with an alternating fixpoint of a lower
/// and an upper least model; once all branch atoms are assigned the two
/// coincide and the result is an answer set. Returned models are blocked.
pub struct BacktrackingSolver {
    table: AtomTable,
    rules: Vec<NormalRule>,
    /// Rules indexed by their positive body atoms
    watches: Vec<Vec<usize>>,
    aggregate_constraints: Vec<AggregateConstraint>,
    nogoods: Vec<GroundNogood>,
    branch_atoms: Vec<AtomId>,
    stack: Vec<Assignment>,
    started: bool,
    stats: SolverStats,
}

impl BacktrackingSolver {
    pub fn new(program: GroundProgram) -> Self {
        let GroundProgram { table, rules: ground_rules } = program;
        let n = table.len();
        let mut rules = Vec::new();
        let mut aggregate_constraints = Vec::new();
        let mut nogoods = Vec::new();
        let mut is_branch = vec![false; n];

        for rule in ground_rules {
            for id in &rule.neg {
                is_branch[id.index()] = true;
            }
            for aggregate in &rule.aggregates {
                for element in &aggregate.elements {
                    for id in &element.neg {
                        is_branch[id.index()] = true;
                    }
                }
            }
            match rule.head {
                GroundHead::Disjunction(heads) if heads.is_empty() => {
                    if rule.aggregates.is_empty() {
                        let literals = rule
                            .pos
                            .iter()
                            .map(|id| (*id, true))
                            .chain(rule.neg.iter().map(|id| (*id, false)))
                            .collect();
                        nogoods.push(GroundNogood(literals));
                    } else {
                        aggregate_constraints.push(AggregateConstraint {
                            pos: rule.pos,
                            neg: rule.neg,
                            aggregates: rule.aggregates,
                        });
                    }
                }
                GroundHead::Disjunction(heads) => {
                    for (i, head) in heads.iter().enumerate() {
                        let mut neg = rule.neg.clone();
                        for (j, other) in heads.iter().enumerate() {
                            if i != j {
                                neg.push(*other);
                                is_branch[other.index()] = true;
                            }
                        }
                        rules.push(NormalRule {
                            head: Some(*head),
                            choice: false,
                            pos: rule.pos.clone(),
                            neg,
                        });
                    }
                }
                GroundHead::Choice(heads) => {
                    for head in heads {
                        is_branch[head.index()] = true;
                        rules.push(NormalRule {
                            head: Some(head),
                            choice: true,
                            pos: rule.pos.clone(),
                            neg: rule.neg.clone(),
                        });
                    }
                }
            }
        }

        let mut watches = vec![Vec::new(); n];
        for (index, rule) in rules.iter().enumerate() {
            for id in &rule.pos {
                watches[id.index()].push(index);
            }
        }
        let branch_atoms: Vec<AtomId> = (0..n)
            .filter(|i| is_branch[*i])
            .map(|i| AtomId(i as u32))
            .collect();
        debug!(
            "Solver initialised: {} atoms, {} rules, {} branch atoms",
            n,
            rules.len(),
            branch_atoms.len()
        );

        Self {
            table,
            rules,
            watches,
            aggregate_constraints,
            nogoods,
            branch_atoms,
            stack: Vec::new(),
            started: false,
            stats: SolverStats::default(),
        }
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Least model of the rules whose negative body and choice condition are admitted
    fn least_model<N, C>(&self, neg_ok: N, choice_ok: C) -> Vec<bool>
    where
        N: Fn(AtomId) -> bool,
        C: Fn(AtomId) -> bool,
    {
        let n = self.table.len();
        let mut model = vec![false; n];
        let mut missing: Vec<usize> = Vec::with_capacity(self.rules.len());
        let mut queue = Vec::new();

        for rule in &self.rules {
            let active = rule.neg.iter().all(|a| neg_ok(*a))
                && rule.head.map_or(true, |h| !rule.choice || choice_ok(h));
            if active {
                missing.push(rule.pos.len());
                if rule.pos.is_empty() {
                    if let Some(h) = rule.head {
                        queue.push(h);
                    }
                }
            } else {
                missing.push(usize::MAX);
            }
        }

        while let Some(atom) = queue.pop() {
            if model[atom.index()] {
                continue;
            }
            model[atom.index()] = true;
            for &index in &self.watches[atom.index()] {
                if missing[index] == usize::MAX {
                    continue;
                }
                missing[index] -= 1;
                if missing[index] == 0 {
                    if let Some(h) = self.rules[index].head {
                        queue.push(h);
                    }
                }
            }
        }
        model
    }

    fn bounds(&self, assignment: &Assignment) -> Bounds {
        let mut upper = self.least_model(
            |a| assignment[a.index()] != Some(true),
            |h| assignment[h.index()] != Some(false),
        );
        loop {
            let lower = self.least_model(
                |a| assignment[a.index()] == Some(false) || !upper[a.index()],
                |h| assignment[h.index()] == Some(true),
            );
            let next_upper = self.least_model(
                |a| assignment[a.index()] != Some(true) && !lower[a.index()],
                |h| assignment[h.index()] != Some(false),
            );
            if next_upper == upper {
                return Bounds { lower, upper };
            }
            upper = next_upper;
        }
    }

    /// Value range of an aggregate under `bounds`
    fn aggregate_range(aggregate: &GroundAggregate, bounds: &Bounds) -> (i64, i64) {
        // tuple -> (certain, possible)
        let mut tuples: BTreeMap<&[dlhex_core::Term], (bool, bool, i64)> = BTreeMap::new();
        for element in &aggregate.elements {
            let literals = element
                .pos
                .iter()
                .map(|id| (*id, true))
                .chain(element.neg.iter().map(|id| (*id, false)));
            let certain = literals.clone().all(|l| bounds.certain(l));
            let possible = literals.clone().all(|l| bounds.possible(l));
            let entry = tuples
                .entry(element.tuple.as_slice())
                .or_insert((false, false, element.weight()));
            entry.0 |= certain;
            entry.1 |= possible;
        }

        let mut min = 0i64;
        let mut max = 0i64;
        for (certain, possible, weight) in tuples.into_values() {
            let weight = match aggregate.function {
                AggregateFunction::Count => 1,
                AggregateFunction::Sum => weight,
            };
            if weight >= 0 {
                if certain {
                    min += weight;
                }
                if possible {
                    max += weight;
                }
            } else {
                if possible {
                    min += weight;
                }
                if certain {
                    max += weight;
                }
            }
        }
        (min, max)
    }

    fn violates_aggregates(&self, bounds: &Bounds) -> bool {
        self.aggregate_constraints.iter().any(|constraint| {
            constraint.pos.iter().all(|id| bounds.lower[id.index()])
                && constraint.neg.iter().all(|id| !bounds.upper[id.index()])
                && constraint.aggregates.iter().all(|aggregate| {
                    let (min, max) = Self::aggregate_range(aggregate, bounds);
                    aggregate.op.holds_for_range(min, max, aggregate.bound)
                })
        })
    }

    /// Propagate `assignment` to a fixpoint; `None` on conflict
    fn propagate(&self, assignment: &mut Assignment) -> Option<Bounds> {
        loop {
            let bounds = self.bounds(assignment);
            let mut changed = false;

            for &atom in &self.branch_atoms {
                let i = atom.index();
                match assignment[i] {
                    Some(true) if !bounds.upper[i] => return None,
                    Some(false) if bounds.lower[i] => return None,
                    None if bounds.lower[i] => {
                        assignment[i] = Some(true);
                        changed = true;
                    }
                    None if !bounds.upper[i] => {
                        assignment[i] = Some(false);
                        changed = true;
                    }
                    _ => {}
                }
            }

            for nogood in &self.nogoods {
                let mut open = None;
                let mut open_count = 0;
                for &(atom, positive) in nogood.literals() {
                    if bounds.certain((atom, positive)) {
                        continue;
                    }
                    if !bounds.possible((atom, positive)) {
                        open_count = usize::MAX;
                        break;
                    }
                    open_count += 1;
                    open = Some((atom, positive));
                }
                match open_count {
                    0 => return None,
                    1 => {
                        if let Some((atom, positive)) = open {
                            if assignment[atom.index()].is_none() && self.is_branch(atom) {
                                assignment[atom.index()] = Some(!positive);
                                changed = true;
                            }
                        }
                    }
                    _ => {}
                }
            }

            if self.violates_aggregates(&bounds) {
                return None;
            }
            if !changed {
                return Some(bounds);
            }
        }
    }

    fn is_branch(&self, atom: AtomId) -> bool {
        self.branch_atoms.binary_search(&atom).is_ok()
    }
}

impl BaseSolver for BacktrackingSolver {
    fn table(&self) -> &AtomTable {
        &self.table
    }

    fn add_nogood(&mut self, nogood: GroundNogood) {
        self.nogoods.push(nogood);
    }

    fn next_model(&mut self) -> Result<Option<Interpretation>, AspError> {
        if !self.started {
            self.started = true;
            self.stack.push(vec![None; self.table.len()]);
        }

        while let Some(mut assignment) = self.stack.pop() {
            let bounds = match self.propagate(&mut assignment) {
                Some(bounds) => bounds,
                None => {
                    self.stats.conflicts += 1;
                    continue;
                }
            };

            let open = self
                .branch_atoms
                .iter()
                .copied()
                .find(|a| assignment[a.index()].is_none());
            match open {
                Some(atom) => {
                    self.stats.choices += 1;
                    let mut positive = assignment.clone();
                    positive[atom.index()] = Some(true);
                    self.stack.push(positive);
                    assignment[atom.index()] = Some(false);
                    self.stack.push(assignment);
                }
                None => {
                    let model: Interpretation = bounds
                        .lower
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| **v)
                        .map(|(i, _)| AtomId(i as u32))
                        .collect();
                    let block = self
                        .branch_atoms
                        .iter()
                        .map(|a| (*a, bounds.lower[a.index()]))
                        .collect();
                    self.nogoods.push(GroundNogood(block));
                    self.stats.models += 1;
                    return Ok(Some(model));
                }
            }
        }
        Ok(None)
    }
}
