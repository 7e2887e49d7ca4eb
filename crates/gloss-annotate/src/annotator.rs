//! Annotation pipeline.
//!
//! [`annotate`] runs one page against an already-loaded catalog:
//!
//! 1. Gate the page ([`MatchConfig::gate`]).
//! 2. Parse the markup into a [`Document`].
//! 3. Walk the target elements, skipping those under a forbidden parent.
//! 4. Rewrite each element's inner markup through the [`TermMatcher`].
//! 5. Serialize the document.
//!
//! [`Annotator`] adds the term provider in front of that pipeline and, through
//! [`Annotator::run`], the "serve the original markup on any problem" policy
//! expected by page renderers.

use std::borrow::Cow;

use gloss_terms::{Term, TermCatalog, TermProvider};

use crate::config::MatchConfig;
use crate::document::Document;
use crate::error::{AnnotateError, SkipReason};
use crate::matcher::TermMatcher;
use crate::render::WrapRenderer;
use crate::rewriter::rewrite_element;
use crate::walker::{RewriteStats, walk};

/// Result of a completed annotation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotated {
    /// Serialized document.
    pub html: String,
    /// Traversal counters.
    pub stats: RewriteStats,
}

/// Annotate `raw_html` with terms from `terms`.
///
/// # Errors
///
/// Returns [`AnnotateError::Skipped`] when gating rejects the page or the
/// catalog is empty, and [`AnnotateError::EmptyDocument`] or
/// [`AnnotateError::MissingBody`] when there is nothing to walk. Failures on
/// single elements or single occurrences are logged and do not abort the run.
pub fn annotate<R>(
    raw_html: &str,
    config: &MatchConfig,
    terms: &TermCatalog,
    renderer: &R,
) -> Result<Annotated, AnnotateError>
where
    R: WrapRenderer + ?Sized,
{
    config.gate()?;
    let matcher = TermMatcher::new(terms);
    if matcher.is_empty() {
        return Err(SkipReason::NoTerms.into());
    }
    if raw_html.trim().is_empty() {
        return Err(AnnotateError::EmptyDocument);
    }

    let mut doc = Document::parse(raw_html);
    if doc.parse_errors() > 0 {
        tracing::debug!(errors = doc.parse_errors(), "Recovered from markup errors");
    }
    let body = doc.body().ok_or(AnnotateError::MissingBody)?;

    let render = |term: &Term, matched: &str| match renderer.render(term, matched) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            tracing::warn!(term = %term.name, error = %e, "Failed to render term");
            None
        }
    };
    let forbidden = config.forbidden_parents();
    let stats = walk(&mut doc, body, &config.target_tags, &forbidden, |doc, id| {
        rewrite_element(doc, id, |inner| {
            matcher.parse(inner, config.max_replacements, render)
        })
    });

    tracing::info!(
        page = config.page.id,
        terms = matcher.len(),
        elements = stats.visited,
        rewritten = stats.rewritten,
        replacements = stats.replacements,
        "Annotated page"
    );

    Ok(Annotated {
        html: doc.serialize(),
        stats,
    })
}

/// Term annotation service for rendered pages.
///
/// Holds the term provider and renderer; per-page state lives in the
/// [`MatchConfig`] passed to each run, so one annotator can serve concurrent
/// runs.
#[derive(Debug)]
pub struct Annotator<P, R> {
    provider: P,
    renderer: R,
}

impl<P, R> Annotator<P, R>
where
    P: TermProvider,
    R: WrapRenderer,
{
    /// Create an annotator.
    pub fn new(provider: P, renderer: R) -> Self {
        Self { provider, renderer }
    }

    /// The term provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The wrap renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Annotate a page, returning the input unchanged when the run is skipped,
    /// fails or replaces nothing.
    pub fn run<'a>(&self, raw_html: &'a str, config: Option<&MatchConfig>) -> Cow<'a, str> {
        match self.try_run(raw_html, config) {
            Ok(annotated) if annotated.stats.replacements > 0 => Cow::Owned(annotated.html),
            Ok(_) => Cow::Borrowed(raw_html),
            Err(AnnotateError::Skipped(reason)) => {
                tracing::debug!(reason = %reason, "Annotation skipped");
                Cow::Borrowed(raw_html)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Annotation failed, serving original markup");
                Cow::Borrowed(raw_html)
            }
        }
    }

    /// Annotate a page, reporting why nothing was produced.
    ///
    /// A missing configuration is [`SkipReason::Unconfigured`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`annotate`], plus [`AnnotateError::Terms`] when
    /// the provider fails.
    pub fn try_run(
        &self,
        raw_html: &str,
        config: Option<&MatchConfig>,
    ) -> Result<Annotated, AnnotateError> {
        let config = config.ok_or(SkipReason::Unconfigured)?;
        config.gate()?;
        let terms = self
            .provider
            .fetch_all(&config.storage_scope, config.page.language)?;
        annotate(raw_html, config, &terms, &self.renderer)
    }
}
