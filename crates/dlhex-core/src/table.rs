//! Registry of ground atoms

use crate::symbol::Symbol;
use crate::term::{Atom, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense identifier of a ground atom inside an [`AtomTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub u32);

impl AtomId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bijection between ground atoms and [`AtomId`]s.
///
/// Atoms are indexed by predicate and by (predicate, first argument) so
/// that the grounder can join body atoms without scanning the whole table.
#[derive(Debug, Default, Clone)]
pub struct AtomTable {
    atoms: Vec<Atom>,
    ids: HashMap<Atom, AtomId>,
    by_predicate: HashMap<(Symbol, usize), Vec<AtomId>>,
    by_first_arg: HashMap<(Symbol, usize, Term), Vec<AtomId>>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ground atom, returning its id and whether it was new
    pub fn insert(&mut self, atom: Atom) -> (AtomId, bool) {
        debug_assert!(atom.is_ground(), "only ground atoms can be interned: {}", atom);
        if let Some(id) = self.ids.get(&atom) {
            return (*id, false);
        }
        let id = AtomId(self.atoms.len() as u32);
        let key = (atom.predicate.clone(), atom.arity());
        if let Some(first) = atom.args.first() {
            self.by_first_arg
                .entry((atom.predicate.clone(), atom.arity(), first.clone()))
                .or_insert_with(Vec::new)
                .push(id);
        }
        self.by_predicate.entry(key).or_insert_with(Vec::new).push(id);
        self.ids.insert(atom.clone(), id);
        self.atoms.push(atom);
        (id, true)
    }

    pub fn intern(&mut self, atom: Atom) -> AtomId {
        self.insert(atom).0
    }

    pub fn get(&self, atom: &Atom) -> Option<AtomId> {
        self.ids.get(atom).copied()
    }

    pub fn atom(&self, id: AtomId) -> &Atom {
        &self.atoms[id.index()]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// All atoms of the given predicate and arity
    pub fn by_predicate(&self, predicate: &Symbol, arity: usize) -> &[AtomId] {
        self.by_predicate
            .get(&(predicate.clone(), arity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All atoms of the given predicate and arity whose first argument is `first`
    pub fn by_first_arg(&self, predicate: &Symbol, arity: usize, first: &Term) -> &[AtomId] {
        self.by_first_arg
            .get(&(predicate.clone(), arity, first.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidate atoms that may unify with `pattern`
    pub fn candidates(&self, pattern: &Atom) -> &[AtomId] {
        match pattern.args.first() {
            Some(first) if first.is_ground() => {
                self.by_first_arg(&pattern.predicate, pattern.arity(), first)
            }
            _ => self.by_predicate(&pattern.predicate, pattern.arity()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| (AtomId(i as u32), atom))
    }
}
