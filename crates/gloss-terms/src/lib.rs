//! Glossary term catalog for gloss.
//!
//! This crate provides the [`Term`] and [`TermCatalog`] types matched against
//! rendered pages, plus the [`TermProvider`] trait used to load them. This
//! enables:
//!
//! - **Unit testing** without a term file on disk
//! - **Backend flexibility** (YAML files today, a database tomorrow)
//! - **Clean separation** between term storage and the annotation engine
//!
//! # Architecture
//!
//! The crate provides:
//! - [`TermProvider`] trait with a single `fetch_all()` method
//! - [`YamlTermProvider`] reading term records from a YAML file, with mtime caching
//! - [`MockTermProvider`] for testing (behind `mock` feature flag)
//!
//! Providers return catalogs ordered longest name first, so that a long
//! term ("API Gateway") is wrapped before a shorter term it contains ("API").
//!
//! # Example
//!
//! ```ignore
//! use gloss_terms::{TermProvider, YamlTermProvider};
//!
//! let provider = YamlTermProvider::new("terms.yaml");
//! let catalog = provider.fetch_all(&[4], 0)?;
//! for term in &catalog {
//!     println!("{}", term.name);
//! }
//! ```

#[cfg(feature = "mock")]
mod mock;
mod provider;
mod term;
mod yaml;

#[cfg(feature = "mock")]
pub use mock::MockTermProvider;
pub use provider::{TermError, TermProvider};
pub use term::{Term, TermCatalog};
pub use yaml::{TermRecord, YamlTermProvider};
