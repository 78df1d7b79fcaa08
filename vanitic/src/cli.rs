//! Command line surface of `vanitic`.
//!
//! All pipeline logic lives in `vanitic-core`; this module only turns
//! arguments and environment into [`Options`], wires up the real toolchain
//! and reports the outcome.
//!
//! Flags keep their historical Go-style single-dash spelling (`-src`,
//! `-out`, `-clean`); [`normalise_args`] rewrites those to the double-dash
//! form clap expects before parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use vanitic_core::config::{default_source_dir, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_DIR};
use vanitic_core::{generate, GenerateReport, Options, PageRenderer, ShellToolchain};

/// Long flags that may be written with a single dash.
const GO_STYLE_FLAGS: &[&str] = &["config", "src", "out", "clean", "git", "go"];

/// Generate Go vanity import path pages for a list of git repositories.
#[derive(Parser, Debug)]
#[clap(
    name = "vanitic",
    version,
    about = "Generate go-import/go-source vanity pages for a list of git repositories"
)]
pub struct Cli {
    /// Configuration file path.
    #[clap(
        short = 'c',
        long = "config",
        alias = "c",
        env = "VANITIC_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Directory where packages source code live [default: <temp dir>/vanitic].
    #[clap(long = "src", env = "VANITIC_SRC")]
    pub src: Option<PathBuf>,

    /// Directory where Go packages HTML files will be written.
    #[clap(long = "out", env = "VANITIC_OUT", default_value = DEFAULT_OUTPUT_DIR)]
    pub out: PathBuf,

    /// Remove output directory before generating files.
    ///
    /// Accepts `--clean`, `--clean=true` and `--clean=false`.
    #[clap(
        long = "clean",
        env = "VANITIC_CLEAN",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub clean: bool,

    /// git executable used to clone and update repositories.
    #[clap(long = "git", env = "VANITIC_GIT", default_value = "git")]
    pub git: String,

    /// go executable used to inspect modules.
    #[clap(long = "go", env = "VANITIC_GO", default_value = "go")]
    pub go: String,
}

impl Cli {
    /// Run options with every path cleaned.
    pub fn options(&self) -> Options {
        Options {
            config: self.config.clone(),
            source: self.src.clone().unwrap_or_else(default_source_dir),
            output: self.out.clone(),
            clean: self.clean,
        }
        .normalised()
    }
}

/// Rewrites `-src`, `-out=pkg` and friends to their `--` form. Arguments
/// after a bare `--` are left alone.
pub fn normalise_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match arg.to_str().and_then(go_style_rewrite) {
                Some(rewritten) => OsString::from(rewritten),
                None => arg,
            }
        })
        .collect()
}

fn go_style_rewrite(arg: &str) -> Option<String> {
    let rest = arg.strip_prefix('-').filter(|r| !r.starts_with('-'))?;
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    GO_STYLE_FLAGS
        .contains(&name)
        .then(|| format!("-{arg}"))
}

/// Runs one generation with the real `git` and `go` executables.
pub async fn run(cli: Cli) -> Result<GenerateReport> {
    let options = cli.options();
    options.trace_loaded();

    let renderer = PageRenderer::new().context("Failed to load page template")?;
    let toolchain = ShellToolchain::new(cli.git, cli.go);

    tracing::info!(command = "generate", "Starting generation");
    let report = generate(&options, &toolchain, &renderer)
        .await
        .context("Generation failed")?;

    for repo in &report.repositories {
        tracing::info!(
            repo_url = %repo.repo_url,
            module = %repo.module,
            pages = repo.pages.len(),
            "Generated repository pages"
        );
    }
    tracing::info!(
        command = "generate",
        repositories = report.repositories.len(),
        pages = report.page_count(),
        output = %options.output.display(),
        "Generation complete"
    );

    Ok(report)
}
