//! Error types for annotation runs.

use gloss_terms::TermError;

/// Why a run was skipped without touching the document.
///
/// Skips are expected outcomes of page gating, not failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// No target tags configured.
    #[error("no target tags configured")]
    NoTargetTags,
    /// Only normal pages (type 0) are annotated.
    #[error("page type {0} is not annotated")]
    PageType(u32),
    /// Glossary configuration is absent.
    #[error("glossary is not configured")]
    Unconfigured,
    /// No storage scope to load terms from.
    #[error("no term storage configured")]
    NoStorageScope,
    /// Page is excluded or not in the allow list.
    #[error("page {0} is not enabled for annotation")]
    PageNotAllowed(u32),
    /// Page is the glossary's own detail or list page.
    #[error("page {0} is a glossary page")]
    GlossaryPage(u32),
    /// The term catalog is empty.
    #[error("no terms to match")]
    NoTerms,
}

/// Error returned when an annotation run produces no output.
///
/// In every case the caller should serve the original markup.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    /// Page gating or missing configuration.
    #[error("Annotation skipped: {0}")]
    Skipped(#[from] SkipReason),
    /// Nothing to parse.
    #[error("Document is empty")]
    EmptyDocument,
    /// Parsed document has no body to walk.
    #[error("Document has no body element")]
    MissingBody,
    /// Terms could not be loaded.
    #[error("Failed to load terms: {0}")]
    Terms(#[from] TermError),
}

/// Error rewriting a single element. The element is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Node is not an element.
    #[error("node <{tag}> is not an element")]
    NotAnElement {
        /// Tag name, empty for non-element nodes.
        tag: String,
    },
    /// Element has no inner region between its tags.
    #[error("<{tag}> has no inner content")]
    NoInnerContent {
        /// Tag name.
        tag: String,
    },
    /// Annotated markup did not parse back into a single `<tag>` element.
    #[error("annotated <{tag}> did not reparse into the same element")]
    Reassembly {
        /// Tag name.
        tag: String,
    },
}
