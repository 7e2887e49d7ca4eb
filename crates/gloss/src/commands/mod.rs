//! CLI command implementations.

pub(crate) mod annotate;
pub(crate) mod terms;

pub(crate) use annotate::AnnotateArgs;
pub(crate) use terms::TermsArgs;
