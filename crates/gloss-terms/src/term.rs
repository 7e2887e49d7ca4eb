//! Term and term catalog types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A glossary entry matched against page text.
///
/// `name` is the canonical spelling. The matched spelling on a page may differ
/// in case; renderers receive it separately so the catalog is never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Display name matched case-insensitively in page text.
    pub name: String,
    /// Opaque render payload (description, tooltip text, link target, ...).
    #[serde(flatten)]
    pub payload: BTreeMap<String, serde_json::Value>,
}

impl Term {
    /// Create a term with an empty payload.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: BTreeMap::new(),
        }
    }

    /// Add a payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Get a payload field as a string, if present and a string.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(serde_json::Value::as_str)
    }

    /// Length of the name in characters.
    #[must_use]
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Ordered set of terms.
///
/// Order is matching priority: terms are applied one after another, each on
/// the output of the previous one, so earlier terms win overlapping text.
/// Duplicate names are allowed and matched independently.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermCatalog {
    terms: Vec<Term>,
}

impl TermCatalog {
    /// Create a catalog preserving the given order.
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// Reorder longest name first.
    ///
    /// The sort is stable, so terms with equal name length keep their
    /// relative order.
    #[must_use]
    pub fn sorted_by_name_length(mut self) -> Self {
        self.terms.sort_by_key(|term| std::cmp::Reverse(term.name_len()));
        self
    }

    /// Append a term with the lowest priority.
    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the catalog has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over terms in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    /// Terms in priority order.
    #[must_use]
    pub fn as_slice(&self) -> &[Term] {
        &self.terms
    }
}

impl FromIterator<Term> for TermCatalog {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TermCatalog {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl IntoIterator for TermCatalog {
    type Item = Term;
    type IntoIter = std::vec::IntoIter<Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}
