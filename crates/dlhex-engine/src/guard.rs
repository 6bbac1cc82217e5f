//! Guard resolution against a live ABox
//!
//! A guard literal `dlhex_guard(N, x)` / `dlhex_guard(N, x, y)` stands for the
//! assertion `N(x)` / `N(x,y)` being present in the current ABox.

use dlhex_core::{vocab, Atom, Bindings, Literal, Nogood, Symbol, Term};
use dlhex_ontology::names;
use dlhex_ontology::{Abox, Assertion};
use std::collections::BTreeSet;
use tracing::debug;

/// Guard atom of an assertion
pub fn guard_atom(assertion: &Assertion) -> Atom {
    let mut args = vec![Term::Const(assertion.name())];
    args.extend(assertion.individuals().into_iter().map(Term::Const));
    Atom::new(vocab::GUARD, args)
}

/// Assertion tested by a ground guard atom
pub fn guard_assertion(atom: &Atom) -> Option<Assertion> {
    if atom.predicate.as_str() != vocab::GUARD {
        return None;
    }
    let args = atom.const_args()?;
    let (name, individuals) = args.split_first()?;
    let negated = names::is_negated(name.as_str());
    let base = Symbol::new(names::positive(name.as_str()));
    match individuals {
        [x] => Some(Assertion::concept(base, x.clone(), negated)),
        [x, y] => Some(Assertion::role(base, x.clone(), y.clone(), negated)),
        _ => None,
    }
}

/// ABox state a guard is checked against: a baseline with toggled assertions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AboxSnapshot {
    assertions: BTreeSet<Assertion>,
}

impl AboxSnapshot {
    pub fn new<I: IntoIterator<Item = Assertion>>(baseline: I) -> Self {
        Self {
            assertions: baseline.into_iter().collect(),
        }
    }

    pub fn from_abox(abox: &Abox) -> Self {
        Self::new(abox.assertions())
    }

    /// Apply a delta: present assertions are removed, absent ones added
    pub fn toggle(&mut self, assertion: Assertion) {
        if !self.assertions.remove(&assertion) {
            self.assertions.insert(assertion);
        }
    }

    pub fn with_deltas<I: IntoIterator<Item = Assertion>>(mut self, deltas: I) -> Self {
        for delta in deltas {
            self.toggle(delta);
        }
        self
    }

    pub fn contains(&self, assertion: &Assertion) -> bool {
        self.assertions.contains(assertion)
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter()
    }

    /// Guard atoms that hold in this snapshot
    pub fn guard_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.assertions.iter().map(guard_atom)
    }

    /// Whether a guard atom holds; variables are read existentially
    pub fn holds(&self, guard: &Atom) -> bool {
        if guard.is_ground() {
            return guard_assertion(guard).map_or(false, |a| self.contains(&a));
        }
        self.guard_atoms()
            .any(|candidate| guard.match_ground(&candidate, &mut Bindings::new()))
    }
}

/// Outcome of resolving a nogood's guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Whether the nogood applies in the snapshot
    pub keep: bool,
    /// The nogood without its guard literal
    pub reduced: Nogood,
}

/// Discharge the guard literal of `nogood` against `snapshot`.
///
/// Guard-free nogoods are kept unchanged. A satisfied guard is stripped;
/// an unsatisfied one discards the nogood. Variables of the guard are read
/// existentially, so they must not occur in other literals: such a nogood
/// needs one instance per matching assertion, which [`resolve_instances`]
/// produces, and is discarded here.
pub fn resolve(nogood: &Nogood, snapshot: &AboxSnapshot) -> Resolution {
    let guard: &Literal = match nogood.guard() {
        Some(guard) => guard,
        None => {
            return Resolution {
                keep: true,
                reduced: nogood.clone(),
            }
        }
    };
    let reduced = nogood.without(guard);
    let shared = guard.atom.variables().into_iter().any(|v| {
        reduced
            .iter()
            .any(|l| l.atom.args.contains(&Term::Var(v.clone())))
    });
    if shared {
        debug!("Guard {} shares variables with {}; nogood discarded", guard.atom, reduced);
    }
    let keep = !shared && snapshot.holds(&guard.atom) == guard.positive;
    Resolution { keep, reduced }
}

/// Guard-free instances of `nogood` that apply in `snapshot`.
///
/// A positive guard is matched against every assertion of the snapshot and
/// the bindings are carried into the other literals. Negative guards are
/// resolved as a whole.
pub fn resolve_instances(nogood: &Nogood, snapshot: &AboxSnapshot) -> Vec<Nogood> {
    let guard = match nogood.guard() {
        Some(guard) if guard.positive => guard,
        _ => {
            let resolution = resolve(nogood, snapshot);
            return if resolution.keep { vec![resolution.reduced] } else { Vec::new() };
        }
    };
    let mut instances = Vec::new();
    for candidate in snapshot.guard_atoms() {
        let mut bindings = Bindings::new();
        if !guard.atom.match_ground(&candidate, &mut bindings) {
            continue;
        }
        let resolution = resolve(&nogood.substitute(&bindings), snapshot);
        if resolution.keep && !instances.contains(&resolution.reduced) {
            instances.push(resolution.reduced);
        }
    }
    instances
}
