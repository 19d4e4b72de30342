//! Module-error resolution.
//!
//! Module dispatch errors carry only a pallet index and an error index; the
//! human-readable description lives in chain metadata. The lookup is modeled
//! as a trait so the tracker can be exercised without a live chain
//! connection.

use std::collections::HashMap;

/// Resolved description of a module dispatch error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    /// Pallet (section) name, e.g. `Balances`.
    pub section: String,
    /// Error variant name, e.g. `InsufficientBalance`.
    pub name: String,
    /// Documentation string attached to the error variant.
    pub docs: String,
}

impl ErrorDetails {
    /// Render as `section.name: docs`.
    pub fn human_message(&self) -> String {
        format!("{}.{}: {}", self.section, self.name, self.docs)
    }
}

/// Lookup capability for module dispatch errors.
pub trait ErrorRegistry {
    /// Resolve a module error to its metadata description, if known.
    fn resolve(&self, pallet_index: u8, error_index: u8) -> Option<ErrorDetails>;
}

/// Map-backed registry for tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticErrorRegistry {
    entries: HashMap<(u8, u8), ErrorDetails>,
}

impl StaticErrorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an error description for `(pallet_index, error_index)`.
    pub fn with_error(
        mut self,
        pallet_index: u8,
        error_index: u8,
        section: &str,
        name: &str,
        docs: &str,
    ) -> Self {
        self.entries.insert(
            (pallet_index, error_index),
            ErrorDetails {
                section: section.to_string(),
                name: name.to_string(),
                docs: docs.to_string(),
            },
        );
        self
    }
}

impl ErrorRegistry for StaticErrorRegistry {
    fn resolve(&self, pallet_index: u8, error_index: u8) -> Option<ErrorDetails> {
        self.entries.get(&(pallet_index, error_index)).cloned()
    }
}
