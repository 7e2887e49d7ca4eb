//! Term provider trait and error types.

use std::path::PathBuf;

use crate::term::TermCatalog;

/// Error returned when terms cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    /// Term file not found.
    #[error("Term file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error reading the term source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Term source could not be parsed.
    #[error("Invalid term file {}: {message}", path.display())]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Source of glossary terms.
///
/// Implementations filter by storage scope and language and return the
/// catalog ordered by name length, longest first.
pub trait TermProvider: Send + Sync {
    /// Fetch every term stored in one of `scope_ids` for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn fetch_all(&self, scope_ids: &[u32], language: u32) -> Result<TermCatalog, TermError>;
}

impl<T: TermProvider + ?Sized> TermProvider for &T {
    fn fetch_all(&self, scope_ids: &[u32], language: u32) -> Result<TermCatalog, TermError> {
        (**self).fetch_all(scope_ids, language)
    }
}

impl<T: TermProvider + ?Sized> TermProvider for std::sync::Arc<T> {
    fn fetch_all(&self, scope_ids: &[u32], language: u32) -> Result<TermCatalog, TermError> {
        (**self).fetch_all(scope_ids, language)
    }
}
