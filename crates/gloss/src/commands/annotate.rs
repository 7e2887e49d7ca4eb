//! `gloss annotate` command implementation.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use gloss_annotate::{
    AnnotateError, Annotator, MatchConfig, PageContext, PageRules, TemplateRenderer,
    WrapRenderer,
};
use gloss_config::{CliSettings, Config};
use gloss_terms::{TermProvider, YamlTermProvider};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the annotate command.
#[derive(Args)]
pub(crate) struct AnnotateArgs {
    /// HTML file to annotate, or `-` for stdin.
    input: PathBuf,

    /// Write the annotated page here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Id of the page being annotated.
    #[arg(long, env = "GLOSS_PAGE_ID")]
    page_id: u32,

    /// Page type; only type 0 is annotated.
    #[arg(long, default_value_t = 0)]
    page_type: u32,

    /// Language id used to select terms.
    #[arg(long, default_value_t = 0)]
    language: u32,

    /// Path to configuration file (default: auto-discover gloss.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Term file (overrides config).
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Wrap template key (overrides config).
    #[arg(long)]
    template: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl AnnotateArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            terms_file: self.terms.clone(),
            template: self.template.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let page = PageContext {
            id: self.page_id,
            page_type: self.page_type,
            language: self.language,
        };
        let run_config = match_config(&config, page);
        let renderer = build_renderer(&config)?;
        let provider = YamlTermProvider::new(config.terms_resolved.file.clone());
        let annotator = Annotator::new(provider, renderer);

        let html = read_input(&self.input)?;
        let annotated = annotate_page(&annotator, &html, run_config.as_ref(), &output);

        write_output(self.output.as_deref(), &annotated)?;
        if let Some(path) = &self.output {
            output.success(&format!("Written to {}", path.display()));
        }
        Ok(())
    }
}

/// Annotate one page, falling back to the input when the run fails.
///
/// Skips and failures, including an unreadable term file, are reported as
/// warnings; the page itself is always produced.
fn annotate_page<P, R>(
    annotator: &Annotator<P, R>,
    html: &str,
    config: Option<&MatchConfig>,
    output: &Output,
) -> String
where
    P: TermProvider,
    R: WrapRenderer,
{
    match annotator.try_run(html, config) {
        Ok(annotated) => {
            output.info(&format!(
                "Annotated {} occurrences in {} of {} elements",
                annotated.stats.replacements,
                annotated.stats.rewritten,
                annotated.stats.visited
            ));
            if annotated.stats.replacements > 0 {
                annotated.html
            } else {
                html.to_owned()
            }
        }
        Err(AnnotateError::Skipped(reason)) => {
            output.info(&format!("Page left unchanged: {reason}"));
            html.to_owned()
        }
        Err(e) => {
            output.warning(&format!("Page left unchanged: {e}"));
            html.to_owned()
        }
    }
}

/// Build the per-run match configuration.
///
/// Returns `None` without a `[glossary]` section, which skips annotation.
pub(crate) fn match_config(config: &Config, page: PageContext) -> Option<MatchConfig> {
    let glossary = config.glossary.as_ref()?;
    let parsing = &config.parsing;
    Some(
        MatchConfig::new(&parsing.tags, page)
            .with_forbidden_parents(&parsing.forbidden_parent_tags)
            .with_max_replacements(parsing.max_replacement_per_page)
            .with_storage_scope(glossary.storage_pids.clone())
            .with_rules(PageRules {
                allowed_pages: parsing.pages.clone(),
                excluded_pages: parsing.exclude_pages.clone(),
                detail_page: glossary.detail_page,
                list_page: glossary.list_page,
            }),
    )
}

/// Build the wrap renderer from `[wrap]` settings.
pub(crate) fn build_renderer(config: &Config) -> Result<TemplateRenderer, CliError> {
    let wrap = &config.wrap_resolved;
    let renderer = match &wrap.templates_dir {
        Some(dir) => TemplateRenderer::from_dir(dir)?,
        None => TemplateRenderer::new(),
    }
    .select(wrap.template.clone())
    .with_options(wrap.options.clone());

    if !renderer.has_template(&wrap.template) {
        return Err(CliError::Validation(format!(
            "Unknown wrap template: {}",
            wrap.template
        )));
    }
    Ok(renderer)
}

fn read_input(input: &Path) -> Result<String, CliError> {
    if input == Path::new("-") {
        let mut html = String::new();
        std::io::stdin().read_to_string(&mut html)?;
        return Ok(html);
    }
    Ok(std::fs::read_to_string(input)?)
}

fn write_output(path: Option<&Path>, html: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, html)?,
        None => std::io::stdout().lock().write_all(html.as_bytes())?,
    }
    Ok(())
}
