//! Tagged literals and nogoods

use crate::table::{AtomId, AtomTable};
use crate::term::{Atom, Bindings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role a literal plays inside a nogood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    /// Plain program atom
    Ordinary,
    /// Fact of one of a DL atom's update predicates
    Input,
    /// Replacement atom standing for the DL atom's value
    Output,
    /// Live ABox membership test, resolved outside the solver
    Guard,
    /// Engine-internal atom (domain, support, bar, ...)
    Auxiliary,
}

/// Atom with a polarity and a [`LiteralKind`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub atom: Atom,
    pub positive: bool,
    pub kind: LiteralKind,
}

impl Literal {
    pub fn new(atom: Atom, positive: bool, kind: LiteralKind) -> Self {
        Self {
            atom,
            positive,
            kind,
        }
    }

    pub fn pos(atom: Atom, kind: LiteralKind) -> Self {
        Self::new(atom, true, kind)
    }

    pub fn neg(atom: Atom, kind: LiteralKind) -> Self {
        Self::new(atom, false, kind)
    }

    pub fn is_guard(&self) -> bool {
        self.kind == LiteralKind::Guard
    }

    pub fn negated(&self) -> Self {
        Self {
            atom: self.atom.clone(),
            positive: !self.positive,
            kind: self.kind,
        }
    }

    pub fn substitute(&self, bindings: &Bindings) -> Self {
        Self {
            atom: self.atom.substitute(bindings),
            positive: self.positive,
            kind: self.kind,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.positive {
            write!(f, "T {}", self.atom)
        } else {
            write!(f, "F {}", self.atom)
        }
    }
}

/// Set of literals that must not hold simultaneously.
///
/// Literals are kept ordered so that equal nogoods compare and hash equal
/// regardless of construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nogood(BTreeSet<Literal>);

impl Nogood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, literal: Literal) -> bool {
        self.0.insert(literal)
    }

    pub fn with(mut self, literal: Literal) -> Self {
        self.0.insert(literal);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.0.iter()
    }

    pub fn contains(&self, literal: &Literal) -> bool {
        self.0.contains(literal)
    }

    /// First guard literal, if any
    pub fn guard(&self) -> Option<&Literal> {
        self.0.iter().find(|l| l.is_guard())
    }

    pub fn is_guard_free(&self) -> bool {
        self.guard().is_none()
    }

    /// Literals of one kind
    pub fn of_kind(&self, kind: LiteralKind) -> impl Iterator<Item = &Literal> {
        self.0.iter().filter(move |l| l.kind == kind)
    }

    /// Copy of this nogood without `literal`
    pub fn without(&self, literal: &Literal) -> Self {
        Nogood(self.0.iter().filter(|l| *l != literal).cloned().collect())
    }

    /// Size not counting the output literal
    pub fn body_len(&self) -> usize {
        self.0
            .iter()
            .filter(|l| l.kind != LiteralKind::Output)
            .count()
    }

    pub fn is_ground(&self) -> bool {
        self.0.iter().all(|l| l.atom.is_ground())
    }

    pub fn substitute(&self, bindings: &Bindings) -> Self {
        Nogood(self.0.iter().map(|l| l.substitute(bindings)).collect())
    }

    /// Translate into atom ids of `table`.
    ///
    /// Positive literals over unknown atoms can never hold, so the whole
    /// nogood is vacuous and `None` is returned; negative literals over
    /// unknown atoms always hold and are dropped.
    pub fn ground(&self, table: &AtomTable) -> Option<GroundNogood> {
        let mut literals = Vec::with_capacity(self.0.len());
        for literal in &self.0 {
            if !literal.atom.is_ground() {
                return None;
            }
            match table.get(&literal.atom) {
                Some(id) => literals.push((id, literal.positive)),
                None if literal.positive => return None,
                None => {}
            }
        }
        literals.sort();
        literals.dedup();
        Some(GroundNogood(literals))
    }
}

impl FromIterator<Literal> for Nogood {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        Nogood(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Nogood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, literal) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", literal)?;
        }
        write!(f, "}}")
    }
}

/// Nogood over atom ids, as consumed by a solver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundNogood(pub Vec<(AtomId, bool)>);

impl GroundNogood {
    pub fn literals(&self) -> &[(AtomId, bool)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
