//! Mock term provider for testing.
//!
//! Provides [`MockTermProvider`] for unit testing without a term file.

use std::sync::RwLock;

use crate::provider::{TermError, TermProvider};
use crate::term::{Term, TermCatalog};

/// Mock term provider for testing.
///
/// Stores terms in memory, each tagged with a scope. Language is ignored.
///
/// # Example
///
/// ```ignore
/// use gloss_terms::{MockTermProvider, TermProvider};
///
/// let provider = MockTermProvider::new()
///     .with_term(4, "Glossary")
///     .with_term(4, "API");
///
/// let catalog = provider.fetch_all(&[4], 0).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockTermProvider {
    terms: RwLock<Vec<(u32, Term)>>,
    calls: RwLock<usize>,
    fail: bool,
}

impl MockTermProvider {
    /// Create a new empty mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term with no payload in the given scope.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_term(self, scope: u32, name: impl Into<String>) -> Self {
        self.with(scope, Term::new(name))
    }

    /// Add a fully built term in the given scope.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with(self, scope: u32, term: Term) -> Self {
        self.terms.write().unwrap().push((scope, term));
        self
    }

    /// Make every fetch fail with an I/O error.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `fetch_all` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

impl TermProvider for MockTermProvider {
    fn fetch_all(&self, scope_ids: &[u32], _language: u32) -> Result<TermCatalog, TermError> {
        *self.calls.write().unwrap() += 1;
        if self.fail {
            return Err(TermError::Io(std::io::Error::other("mock failure")));
        }
        let catalog: TermCatalog = self
            .terms
            .read()
            .unwrap()
            .iter()
            .filter(|(scope, _)| scope_ids.contains(scope))
            .map(|(_, term)| term.clone())
            .collect();
        Ok(catalog.sorted_by_name_length())
    }
}
