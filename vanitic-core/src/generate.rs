//! High-level pipeline: repository list → working copies → vanity pages.
//!
//! This module sequences a whole generation run:
//!   - Optionally wipes the output directory, then makes sure it exists
//!   - Reads the repository list (see [`crate::config::read_repository_urls`])
//!   - For each repository, in order: synchronises a working copy, resolves
//!     its module path, writes the module root page, then one page per
//!     package listed under the module
//!   - Returns a [`GenerateReport`] of every page written
//!
//! # Error Handling
//! Fail-fast: the first error of any step ends the run and is returned as a
//! [`GenerateError`]. Pages written before the failure stay on disk.
//!
//! # Concurrency
//! None. Repositories are handled strictly one after another and every
//! external command is awaited before the next one starts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{read_repository_urls, ConfigError, Options};
use crate::contract::{Toolchain, ToolchainError};
use crate::path::repository_dir_name;
use crate::render::{Package, PageRenderer, RenderError};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to prepare output directory {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("repository URL {0:?} has no usable directory name")]
    RepositoryUrl(String),
    #[error("failed to synchronise {repo_url}: {source}")]
    Synchronise {
        repo_url: String,
        #[source]
        source: ToolchainError,
    },
    #[error("failed to inspect module of {repo_url}: {source}")]
    Inspect {
        repo_url: String,
        #[source]
        source: ToolchainError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything a run wrote, per repository, in processing order.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub repositories: Vec<RepositoryReport>,
}

#[derive(Debug)]
pub struct RepositoryReport {
    pub repo_url: String,
    pub module: String,
    pub pages: Vec<PathBuf>,
}

impl GenerateReport {
    pub fn page_count(&self) -> usize {
        self.repositories.iter().map(|r| r.pages.len()).sum()
    }
}

/// Runs the whole pipeline for `options`.
pub async fn generate<T>(
    options: &Options,
    toolchain: &T,
    renderer: &PageRenderer,
) -> Result<GenerateReport, GenerateError>
where
    T: Toolchain + ?Sized,
{
    info!("[GENERATE] Starting generation run");

    prepare_output(&options.output, options.clean).await?;

    let repo_urls = read_repository_urls(&options.config)?;
    info!(repositories = repo_urls.len(), "[GENERATE] Repository list loaded");

    let mut report = GenerateReport::default();
    for repo_url in &repo_urls {
        let repo_report =
            generate_repository(repo_url, &options.source, &options.output, toolchain, renderer)
                .await?;
        report.repositories.push(repo_report);
    }

    info!(
        repositories = report.repositories.len(),
        pages = report.page_count(),
        "[GENERATE] Generation run complete"
    );
    Ok(report)
}

/// Removes `output` when `clean` is set, then creates it if absent.
pub async fn prepare_output(output: &Path, clean: bool) -> Result<(), GenerateError> {
    let output_err = |e: std::io::Error| GenerateError::Output {
        path: output.to_path_buf(),
        source: e,
    };

    if clean {
        match tokio::fs::remove_dir_all(output).await {
            Ok(()) => info!(path = %output.display(), "[GENERATE] Removed output directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %output.display(), "[GENERATE] No output directory to remove")
            }
            Err(e) => {
                error!(error = ?e, path = %output.display(), "[GENERATE][ERROR] Failed to remove output directory");
                return Err(output_err(e));
            }
        }
    }

    tokio::fs::create_dir_all(output).await.map_err(|e| {
        error!(error = ?e, path = %output.display(), "[GENERATE][ERROR] Failed to create output directory");
        output_err(e)
    })
}

async fn generate_repository<T>(
    repo_url: &str,
    staging: &Path,
    output: &Path,
    toolchain: &T,
    renderer: &PageRenderer,
) -> Result<RepositoryReport, GenerateError>
where
    T: Toolchain + ?Sized,
{
    let dir_name = repository_dir_name(repo_url).ok_or_else(|| {
        error!(repo_url, "[GENERATE][ERROR] Repository URL has no directory name");
        GenerateError::RepositoryUrl(repo_url.to_string())
    })?;
    let working_copy = staging.join(dir_name);

    // --- Step 1: Synchronise ---
    info!(repo_url, path = %working_copy.display(), "[GENERATE] Synchronising repository");
    toolchain
        .synchronise(repo_url, &working_copy)
        .await
        .map_err(|e| {
            error!(repo_url, error = ?e, "[GENERATE][ERROR] Synchronisation failed");
            GenerateError::Synchronise {
                repo_url: repo_url.to_string(),
                source: e,
            }
        })?;

    let inspect_err = |e: ToolchainError| {
        error!(repo_url, error = ?e, "[GENERATE][ERROR] Module inspection failed");
        GenerateError::Inspect {
            repo_url: repo_url.to_string(),
            source: e,
        }
    };

    // --- Step 2: Module root page ---
    let module = toolchain
        .list_module(&working_copy)
        .await
        .map_err(inspect_err)?;
    info!(repo_url, module = %module, "[GENERATE] Resolved module");

    let root = Package::module_root(repo_url, module);
    let mut pages = vec![renderer.write_page(output, &root).await?];

    // --- Step 3: One page per package ---
    let listings = toolchain
        .list_packages(&working_copy)
        .await
        .map_err(inspect_err)?;
    info!(repo_url, packages = listings.len(), "[GENERATE] Listed packages");

    for listing in listings {
        let package = root.sub_package(listing.import_path, listing.description);
        pages.push(renderer.write_page(output, &package).await?);
    }

    Ok(RepositoryReport {
        repo_url: repo_url.to_string(),
        module: root.module,
        pages,
    })
}
