//! Configuration management for gloss.
//!
//! Parses `gloss.toml` files with serde and discovers them in the working
//! directory and its parents. Command-line overrides are applied during load
//! via [`CliSettings`].
//!
//! ```toml
//! [parsing]
//! tags = ["p", "li"]
//! forbidden_parent_tags = ["h1"]
//! max_replacement_per_page = 3
//! pages = [0]
//! exclude_pages = []
//!
//! [glossary]
//! storage_pids = [4]
//! detail_page = 12
//! list_page = 11
//!
//! [terms]
//! file = "terms.yaml"
//!
//! [wrap]
//! template = "abbr"
//! templates_dir = "templates"
//! options = { class = "glossary" }
//! ```
//!
//! Without a `[glossary]` section annotation never runs.
//!
//! ## Environment Variable Expansion
//!
//! `terms.file` and `wrap.templates_dir` support `${VAR}` (error if unset) and
//! `${VAR:-default}`. Both are resolved relative to the config file.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the term file.
    pub terms_file: Option<PathBuf>,
    /// Override the wrap template key.
    pub template: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gloss.toml";

/// Tag that is never a target; links are always forbidden parents instead.
const ANCHOR_TAG: &str = "a";

const DEFAULT_MAX_REPLACEMENTS: i64 = 9999;
const DEFAULT_TERMS_FILE: &str = "terms.yaml";
const DEFAULT_TEMPLATE: &str = "abbr";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which elements and pages are annotated.
    pub parsing: ParsingConfig,
    /// Glossary storage and pages. Absent means annotation never runs.
    pub glossary: Option<GlossaryConfig>,
    terms: TermsConfigRaw,
    wrap: WrapConfigRaw,

    /// Resolved term source (set after loading).
    #[serde(skip)]
    pub terms_resolved: TermsConfig,
    /// Resolved wrap rendering settings (set after loading).
    #[serde(skip)]
    pub wrap_resolved: WrapConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// `[parsing]` section.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParsingConfig {
    /// Target tags, in processing order.
    pub tags: Vec<String>,
    /// Tags that may not be the immediate parent of a target element.
    pub forbidden_parent_tags: Vec<String>,
    /// Replacement cap per term and element.
    pub max_replacement_per_page: i64,
    /// Allowed page ids; `0` allows every page.
    pub pages: Vec<u32>,
    /// Excluded page ids, honored only with an explicit `pages` list.
    pub exclude_pages: Vec<u32>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            tags: vec!["p".to_owned()],
            forbidden_parent_tags: Vec::new(),
            max_replacement_per_page: DEFAULT_MAX_REPLACEMENTS,
            pages: vec![0],
            exclude_pages: Vec::new(),
        }
    }
}

/// `[glossary]` section.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct GlossaryConfig {
    /// Storage ids terms are loaded from.
    pub storage_pids: Vec<u32>,
    /// Page showing a single term.
    pub detail_page: Option<u32>,
    /// Page listing all terms.
    pub list_page: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TermsConfigRaw {
    file: Option<String>,
}

/// Resolved term source.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TermsConfig {
    /// YAML term file.
    pub file: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WrapConfigRaw {
    template: Option<String>,
    templates_dir: Option<String>,
    options: BTreeMap<String, serde_json::Value>,
}

/// Resolved wrap rendering settings.
#[derive(Debug, PartialEq)]
pub struct WrapConfig {
    /// Template key.
    pub template: String,
    /// Directory with additional templates.
    pub templates_dir: Option<PathBuf>,
    /// Options passed to templates.
    pub options: BTreeMap<String, serde_json::Value>,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_owned(),
            templates_dir: None,
            options: BTreeMap::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`terms.file`").
        field: String,
        /// Error message (e.g., "${`TERMS_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require every entry to be a plain tag name.
fn require_tag_names(tags: &[String], field: &str) -> Result<(), ConfigError> {
    for tag in tags {
        require_non_empty(tag, field)?;
        if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "{field} contains invalid tag name '{tag}'"
            )));
        }
    }
    Ok(())
}

/// Trim and lowercase tag names, dropping blanks and duplicates.
fn normalize_tags(tags: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags.drain(..) {
        let tag = tag.trim().to_ascii_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    *tags = seen;
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `gloss.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// an environment variable is missing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(file) = &settings.terms_file {
            self.terms_resolved.file.clone_from(file);
        }
        if let Some(template) = &settings.template {
            self.wrap_resolved.template.clone_from(template);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            parsing: ParsingConfig::default(),
            glossary: None,
            terms: TermsConfigRaw::default(),
            wrap: WrapConfigRaw::default(),
            terms_resolved: TermsConfig {
                file: base.join(DEFAULT_TERMS_FILE),
            },
            wrap_resolved: WrapConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.normalize();

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_tag_names(&self.parsing.tags, "parsing.tags")?;
        require_tag_names(
            &self.parsing.forbidden_parent_tags,
            "parsing.forbidden_parent_tags",
        )?;
        require_non_empty(&self.wrap_resolved.template, "wrap.template")?;
        if let Some(glossary) = &self.glossary
            && glossary.storage_pids.is_empty()
        {
            return Err(ConfigError::Validation(
                "glossary.storage_pids cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Normalize tag lists and drop the anchor tag from targets.
    fn normalize(&mut self) {
        normalize_tags(&mut self.parsing.tags);
        normalize_tags(&mut self.parsing.forbidden_parent_tags);

        if self.parsing.tags.iter().any(|tag| tag == ANCHOR_TAG) {
            tracing::warn!("Removing 'a' from parsing.tags; links are never annotated");
            self.parsing.tags.retain(|tag| tag != ANCHOR_TAG);
        }
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref file) = self.terms.file {
            self.terms.file = Some(expand::expand_env(file, "terms.file")?);
        }
        if let Some(ref dir) = self.wrap.templates_dir {
            self.wrap.templates_dir = Some(expand::expand_env(dir, "wrap.templates_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.terms_resolved = TermsConfig {
            file: config_dir.join(self.terms.file.as_deref().unwrap_or(DEFAULT_TERMS_FILE)),
        };
        self.wrap_resolved = WrapConfig {
            template: self
                .wrap
                .template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_owned()),
            templates_dir: self.wrap.templates_dir.as_ref().map(|d| config_dir.join(d)),
            options: self.wrap.options.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/site"));

        assert_eq!(config.parsing, ParsingConfig::default());
        assert_eq!(config.parsing.max_replacement_per_page, 9999);
        assert_eq!(config.parsing.pages, vec![0]);
        assert!(config.glossary.is_none());
        assert_eq!(config.terms_resolved.file, PathBuf::from("/site/terms.yaml"));
        assert_eq!(config.wrap_resolved.template, "abbr");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.parsing.tags, vec!["p"]);
        assert!(config.glossary.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[parsing]
tags = ["p", "li"]
forbidden_parent_tags = ["h1"]
max_replacement_per_page = 3
pages = [5, 6]
exclude_pages = [6]

[glossary]
storage_pids = [4]
detail_page = 12
list_page = 11

[terms]
file = "data/terms.yaml"

[wrap]
template = "link"
templates_dir = "templates"
options = { class = "tip", limit = 2 }
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/site"));

        assert_eq!(config.parsing.tags, vec!["p", "li"]);
        assert_eq!(config.parsing.forbidden_parent_tags, vec!["h1"]);
        assert_eq!(config.parsing.max_replacement_per_page, 3);
        assert_eq!(config.parsing.pages, vec![5, 6]);
        assert_eq!(config.parsing.exclude_pages, vec![6]);
        assert_eq!(
            config.glossary,
            Some(GlossaryConfig {
                storage_pids: vec![4],
                detail_page: Some(12),
                list_page: Some(11),
            })
        );
        assert_eq!(
            config.terms_resolved.file,
            PathBuf::from("/site/data/terms.yaml")
        );
        assert_eq!(config.wrap_resolved.template, "link");
        assert_eq!(
            config.wrap_resolved.templates_dir,
            Some(PathBuf::from("/site/templates"))
        );
        assert_eq!(
            config.wrap_resolved.options.get("class"),
            Some(&serde_json::json!("tip"))
        );
        assert_eq!(
            config.wrap_resolved.options.get("limit"),
            Some(&serde_json::json!(2))
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let (dir, path) = write_config(
            r#"
[parsing]
tags = [" P ", "LI", "p"]

[glossary]
storage_pids = [1, 2]
"#,
        );

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.parsing.tags, vec!["p", "li"]);
        assert_eq!(config.terms_resolved.file, dir.path().join("terms.yaml"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)), "got {err:?}");
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("[parsing\ntags = 1");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_load_drops_anchor_tag() {
        let (_dir, path) = write_config(
            r#"
[parsing]
tags = ["p", "A", "li"]
"#,
        );

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.parsing.tags, vec!["p", "li"]);
    }

    #[test]
    fn test_load_applies_cli_settings() {
        let (_dir, path) = write_config("[wrap]\ntemplate = \"abbr\"\n");
        let settings = CliSettings {
            terms_file: Some(PathBuf::from("/data/other.yaml")),
            template: Some("dfn".to_owned()),
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.terms_resolved.file, PathBuf::from("/data/other.yaml"));
        assert_eq!(config.wrap_resolved.template, "dfn");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/site"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.terms_resolved.file, PathBuf::from("/site/terms.yaml"));
        assert_eq!(config.wrap_resolved.template, "abbr");
    }

    #[test]
    fn test_expand_env_vars_terms_file() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("GLOSS_TEST_DATA_DIR", "/var/glossary");
        }
        let (_dir, path) = write_config("[terms]\nfile = \"${GLOSS_TEST_DATA_DIR}/terms.yaml\"\n");

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(
            config.terms_resolved.file,
            PathBuf::from("/var/glossary/terms.yaml")
        );
        unsafe {
            std::env::remove_var("GLOSS_TEST_DATA_DIR");
        }
    }

    #[test]
    fn test_expand_env_vars_missing() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("GLOSS_TEST_NO_TEMPLATES");
        }
        let (_dir, path) = write_config("[wrap]\ntemplates_dir = \"${GLOSS_TEST_NO_TEMPLATES}\"\n");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(
            matches!(err, ConfigError::EnvVar { ref field, .. } if field == "wrap.templates_dir"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_validate_default_config_passes() {
        Config::default_with_base(Path::new("/site")).validate().unwrap();
    }

    #[test]
    fn test_validate_invalid_tag_name() {
        let (_dir, path) = write_config("[parsing]\ntags = [\"p class\"]\n");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)), "got {err:?}");
        assert!(err.to_string().contains("parsing.tags"));
    }

    #[test]
    fn test_validate_empty_template() {
        let (_dir, path) = write_config("[wrap]\ntemplate = \"\"\n");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(err.to_string().contains("wrap.template cannot be empty"));
    }

    #[test]
    fn test_validate_glossary_requires_storage() {
        let (_dir, path) = write_config("[glossary]\nstorage_pids = []\ndetail_page = 3\n");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(err.to_string().contains("glossary.storage_pids"));
    }

    #[test]
    fn test_glossary_section_requires_storage_pids_key() {
        let result: Result<Config, _> = toml::from_str("[glossary]\ndetail_page = 3\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_forbidden_parents() {
        let mut config = Config::default_with_base(Path::new("/site"));
        config.parsing.forbidden_parent_tags = vec!["H1".to_owned(), " ".to_owned(), "h1".to_owned()];

        config.normalize();

        assert_eq!(config.parsing.forbidden_parent_tags, vec!["h1"]);
    }
}
