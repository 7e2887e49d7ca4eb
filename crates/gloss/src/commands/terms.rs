//! `gloss terms` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use gloss_config::{CliSettings, Config};
use gloss_terms::{TermCatalog, TermProvider, YamlTermProvider};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the terms command.
#[derive(Args)]
pub(crate) struct TermsArgs {
    /// Path to configuration file (default: auto-discover gloss.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Term file (overrides config).
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Language id used to select terms.
    #[arg(long, default_value_t = 0)]
    language: u32,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl TermsArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            terms_file: self.terms.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let glossary = config.glossary.as_ref().ok_or_else(|| {
            CliError::Validation("[glossary] section required in config".to_owned())
        })?;

        let provider = YamlTermProvider::new(config.terms_resolved.file.clone());
        let catalog = provider.fetch_all(&glossary.storage_pids, self.language)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(format_catalog(&catalog).as_bytes())?;

        output.info(&format!(
            "{} terms from {}",
            catalog.len(),
            provider.path().display()
        ));
        Ok(())
    }
}

/// One line per term in matching order, with its description when present.
fn format_catalog(catalog: &TermCatalog) -> String {
    let mut listing = String::new();
    for term in catalog {
        listing.push_str(&term.name);
        if let Some(description) = term.field("description") {
            listing.push('\t');
            listing.push_str(description);
        }
        listing.push('\n');
    }
    listing
}
