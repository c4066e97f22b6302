//! Construction chains used to detect circular references.
//!
//! A [`Chain`] records what is currently being built, in order. Entering
//! a name pushes it and returns a guard that pops it again on drop, so
//! the chain is cleaned up on success, on error and on unwind alike.
//! Entering a name that is already present reports the cycle instead.

use std::cell::RefCell;

use tracing::warn;

use crate::error::CircularReferenceError;

#[derive(Debug, Default)]
pub(crate) struct Chain {
    names: RefCell<Vec<String>>,
}

impl Chain {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `name`, or returns the cycle it would close.
    pub fn enter(&self, name: &str) -> Result<ChainGuard<'_>, CircularReferenceError> {
        if let Some(cycle) = self.cycle_through(name) {
            warn!(cycle = ?cycle.chain, "Circular reference detected");
            return Err(cycle);
        }

        self.names.borrow_mut().push(name.to_string());
        Ok(ChainGuard {
            chain: self,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.borrow().iter().any(|n| n == name)
    }

    /// The cycle `name` would close, if it is in the chain.
    pub fn cycle_through(&self, name: &str) -> Option<CircularReferenceError> {
        let names = self.names.borrow();
        let start = names.iter().position(|n| n == name)?;

        let mut chain: Vec<String> = names[start..].to_vec();
        chain.push(name.to_string());
        Some(CircularReferenceError { chain })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.names.borrow().is_empty()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<String> {
        self.names.borrow().clone()
    }
}

/// Removes its name from the chain when dropped.
#[derive(Debug)]
pub(crate) struct ChainGuard<'a> {
    chain: &'a Chain,
    name: String,
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        let mut names = self.chain.names.borrow_mut();
        if let Some(index) = names.iter().rposition(|n| *n == self.name) {
            names.remove(index);
        }
    }
}

/// What the construction lock protects: the classes whose constructors are
/// running and the identifiers being resolved, for the current call chain.
#[derive(Debug, Default)]
pub(crate) struct ConstructionState {
    pub building: Chain,
    pub resolving: Chain,
}
