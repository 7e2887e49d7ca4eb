//! Wrap fragment rendering.
//!
//! A [`WrapRenderer`] turns one matched term occurrence into the markup that
//! replaces it. [`TemplateRenderer`] renders minijinja templates; any closure
//! can be used through [`FnRenderer`].
//!
//! Template context:
//!
//! | Name      | Value                                             |
//! |-----------|---------------------------------------------------|
//! | `name`    | matched text as it appears on the page (safe)     |
//! | `term`    | canonical term name                               |
//! | `options` | per-run options map                               |
//! | *payload* | every payload field of the term                   |

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use gloss_terms::Term;
use minijinja::{Environment, Value};

/// Key of the template available without any configuration.
pub const DEFAULT_TEMPLATE: &str = "abbr";

/// File name of the built-in template. The `.html` suffix turns on
/// auto-escaping.
const ABBR_FILE: &str = "abbr.html";

const ABBR_TEMPLATE: &str = r#"<abbr class="{{ options.class | default('glossary') }}"{% if description %} title="{{ description }}"{% endif %}>{{ name }}</abbr>"#;

/// Suffixes tried after the bare key when resolving a template.
const TEMPLATE_SUFFIXES: &[&str] = &["", ".html", ".jinja"];

/// Error rendering a wrap fragment.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template lookup, syntax or evaluation failed.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    /// Template directory could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No template is registered under the key.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

/// Produces the replacement markup for a matched term.
pub trait WrapRenderer: Send + Sync {
    /// Render `term`, matched on the page as `matched`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment cannot be produced. The occurrence is
    /// then left as plain text.
    fn render(&self, term: &Term, matched: &str) -> Result<String, RenderError>;
}

impl<T: WrapRenderer + ?Sized> WrapRenderer for &T {
    fn render(&self, term: &Term, matched: &str) -> Result<String, RenderError> {
        (**self).render(term, matched)
    }
}

impl<T: WrapRenderer + ?Sized> WrapRenderer for Arc<T> {
    fn render(&self, term: &Term, matched: &str) -> Result<String, RenderError> {
        (**self).render(term, matched)
    }
}

/// Renderer backed by a closure.
pub struct FnRenderer<F> {
    render: F,
}

impl<F> FnRenderer<F>
where
    F: Fn(&Term, &str) -> String + Send + Sync,
{
    /// Wrap a closure receiving the term and the matched text.
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> WrapRenderer for FnRenderer<F>
where
    F: Fn(&Term, &str) -> String + Send + Sync,
{
    fn render(&self, term: &Term, matched: &str) -> Result<String, RenderError> {
        Ok((self.render)(term, matched))
    }
}

/// Renderer using named minijinja templates.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
    template: String,
    options: BTreeMap<String, serde_json::Value>,
}

impl TemplateRenderer {
    /// Create a renderer with the built-in `abbr` template selected.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template(ABBR_FILE, ABBR_TEMPLATE)
            .unwrap_or_else(|e| tracing::error!(error = %e, "Built-in template is invalid"));
        Self {
            env,
            template: DEFAULT_TEMPLATE.to_owned(),
            options: BTreeMap::new(),
        }
    }

    /// Create a renderer that also loads templates from `dir` on demand.
    ///
    /// Templates are looked up by key, then by key with `.html` or `.jinja`
    /// appended. Templates registered with [`Self::with_template`] take
    /// precedence over files.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if `dir` is not a readable directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        if !std::fs::metadata(dir)?.is_dir() {
            return Err(RenderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", dir.display()),
            )));
        }
        let mut renderer = Self::new();
        renderer.env.set_loader(minijinja::path_loader(dir));
        Ok(renderer)
    }

    /// Register a template under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Template`] if the source does not compile.
    pub fn with_template(
        mut self,
        key: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, RenderError> {
        self.env.add_template_owned(key.into(), source.into())?;
        Ok(self)
    }

    /// Select the template used for rendering.
    #[must_use]
    pub fn select(mut self, key: impl Into<String>) -> Self {
        self.template = key.into();
        self
    }

    /// Set the options exposed to templates as `options`.
    #[must_use]
    pub fn with_options(mut self, options: BTreeMap<String, serde_json::Value>) -> Self {
        self.options = options;
        self
    }

    /// Key of the selected template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether a template resolves for `key`.
    pub fn has_template(&self, key: &str) -> bool {
        self.resolve(key).is_some()
    }

    fn resolve(&self, key: &str) -> Option<minijinja::Template<'_, '_>> {
        TEMPLATE_SUFFIXES
            .iter()
            .find_map(|suffix| self.env.get_template(&format!("{key}{suffix}")).ok())
    }

    fn context(&self, term: &Term, matched: &str) -> Value {
        let payload = term
            .payload
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)));
        let builtins = [
            ("name".to_owned(), Value::from_safe_string(matched.to_owned())),
            ("term".to_owned(), Value::from(term.name.clone())),
            ("options".to_owned(), Value::from_serialize(&self.options)),
        ];
        payload.chain(builtins).collect()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WrapRenderer for TemplateRenderer {
    fn render(&self, term: &Term, matched: &str) -> Result<String, RenderError> {
        let template = self
            .resolve(&self.template)
            .ok_or_else(|| RenderError::UnknownTemplate(self.template.clone()))?;
        Ok(template.render(self.context(term, matched))?)
    }
}
