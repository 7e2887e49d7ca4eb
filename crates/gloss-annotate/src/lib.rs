//! Glossary term annotation for rendered HTML pages.
//!
//! Given a rendered page and a catalog of known terms, this crate finds term
//! occurrences in the text of selected elements and replaces them with a
//! rendered wrap fragment (an `<abbr>` tooltip, a link to the glossary entry,
//! ...), leaving the rest of the markup intact.
//!
//! # Architecture
//!
//! - [`Annotator`]: loads terms through a [`TermProvider`](gloss_terms::TermProvider)
//!   and runs the pipeline, serving the input unchanged on any problem
//! - [`MatchConfig`]: per-run target tags, forbidden parents, replacement cap
//!   and page gating
//! - [`walker`]: visits target elements whose parent tag is allowed
//! - [`rewriter`]: rewrites one element's inner markup and grafts the result
//!   back into the tree
//! - [`matcher`]: boundary-aware, case-insensitive term matching over markup
//! - [`WrapRenderer`]: produces the fragment for one matched term, with
//!   [`TemplateRenderer`] backed by minijinja templates
//!
//! Links (`<a>`) are always forbidden parents, so existing links never get
//! nested wrap markup.
//!
//! # Example
//!
//! ```
//! use gloss_annotate::{FnRenderer, MatchConfig, PageContext, annotate};
//! use gloss_terms::{Term, TermCatalog};
//!
//! let terms: TermCatalog = [Term::new("Glossary")].into_iter().collect();
//! let config = MatchConfig::new(["p"], PageContext::new(1));
//! let renderer = FnRenderer::new(|_: &Term, matched: &str| format!("<dfn>{matched}</dfn>"));
//!
//! let result = annotate("<p>Learn about Glossary here.</p>", &config, &terms, &renderer).unwrap();
//! assert_eq!(result.html, "<p>Learn about <dfn>Glossary</dfn> here.</p>");
//! ```

mod annotator;
mod config;
mod document;
mod error;
pub mod matcher;
mod render;
pub mod rewriter;
pub mod walker;

pub use annotator::{Annotated, Annotator, annotate};
pub use config::{ALL_PAGES, ANCHOR_TAG, MatchConfig, PageContext, PageRules};
pub use document::{Document, DocumentKind};
pub use error::{AnnotateError, RewriteError, SkipReason};
pub use matcher::{Parsed, TermMatcher, TermPattern, parse};
pub use render::{DEFAULT_TEMPLATE, FnRenderer, RenderError, TemplateRenderer, WrapRenderer};
pub use walker::{RewriteStats, walk};
