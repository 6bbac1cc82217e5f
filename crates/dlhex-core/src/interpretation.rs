//! Packed interpretations over an [`AtomTable`]

use crate::symbol::Symbol;
use crate::table::{AtomId, AtomTable};
use crate::term::Atom;
use roaring::RoaringBitmap;

/// Set of true ground atoms, stored as a bitmap of [`AtomId`]s.
///
/// Membership is O(1) and iteration is in ascending id order, which is
/// also the order in which atoms were registered in the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpretation {
    bits: RoaringBitmap,
}

impl Interpretation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AtomId) -> bool {
        self.bits.insert(id.0)
    }

    pub fn remove(&mut self, id: AtomId) -> bool {
        self.bits.remove(id.0)
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.bits.contains(id.0)
    }

    pub fn len(&self) -> usize {
        self.bits.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.bits.iter().map(AtomId)
    }

    /// True atoms resolved through `table`
    pub fn atoms<'a>(&'a self, table: &'a AtomTable) -> impl Iterator<Item = &'a Atom> + 'a {
        self.iter().map(move |id| table.atom(id))
    }

    /// True atoms of one predicate
    pub fn with_predicate<'a>(
        &'a self,
        table: &'a AtomTable,
        predicate: &'a Symbol,
    ) -> impl Iterator<Item = &'a Atom> + 'a {
        self.atoms(table).filter(move |a| &a.predicate == predicate)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: &self.bits | &other.bits,
        }
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: &self.bits - &other.bits,
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits.is_subset(&other.bits)
    }
}

impl FromIterator<AtomId> for Interpretation {
    fn from_iter<I: IntoIterator<Item = AtomId>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().map(|id| id.0).collect(),
        }
    }
}

impl Extend<AtomId> for Interpretation {
    fn extend<I: IntoIterator<Item = AtomId>>(&mut self, iter: I) {
        self.bits.extend(iter.into_iter().map(|id| id.0));
    }
}
