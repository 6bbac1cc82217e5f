//! Scoped ABox expansion

use crate::oracle::{AxiomHandle, DlReasoner};
use crate::ReasonerError;
use dlhex_ontology::Assertion;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Working ABox extended by a set of assertions for the lifetime of the guard.
///
/// Dropping the guard retracts the assertions in reverse order, on every exit path.
pub struct AboxExpansion<'a> {
    reasoner: &'a mut dyn DlReasoner,
    handles: Vec<AxiomHandle>,
}

impl<'a> AboxExpansion<'a> {
    pub fn new<I>(reasoner: &'a mut dyn DlReasoner, axioms: I) -> Result<Self, ReasonerError>
    where
        I: IntoIterator<Item = Assertion>,
    {
        let mut expansion = Self {
            reasoner,
            handles: Vec::new(),
        };
        for axiom in axioms {
            // on failure the partially built guard is dropped and retracts what it added
            let handle = expansion.reasoner.assert(axiom)?;
            expansion.handles.push(handle);
        }
        Ok(expansion)
    }

    /// Number of assertions added
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<'a> Deref for AboxExpansion<'a> {
    type Target = dyn DlReasoner + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.reasoner
    }
}

impl<'a> DerefMut for AboxExpansion<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.reasoner
    }
}

impl Drop for AboxExpansion<'_> {
    fn drop(&mut self) {
        while let Some(handle) = self.handles.pop() {
            if let Err(e) = self.reasoner.retract(handle) {
                warn!("Failed to retract temporary assertion {:?}: {}", handle, e);
            }
        }
    }
}
