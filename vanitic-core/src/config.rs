//! Run options and the repository list reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::path::clean_path;

/// Default location of the repository list, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".vanitic";

/// Default output directory for the generated pages.
pub const DEFAULT_OUTPUT_DIR: &str = "pkg";

/// Options for a single generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Repository list, one URL per line.
    pub config: PathBuf,
    /// Staging directory holding one working copy per repository.
    pub source: PathBuf,
    /// Root of the generated page tree.
    pub output: PathBuf,
    /// Remove `output` before generating.
    pub clean: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            source: default_source_dir(),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            clean: false,
        }
    }
}

impl Options {
    /// Lexically cleans every path so later joins never see `.` or `a/..`.
    pub fn normalised(self) -> Self {
        Self {
            config: clean_path(&self.config),
            source: clean_path(&self.source),
            output: clean_path(&self.output),
            clean: self.clean,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            config = %self.config.display(),
            source = %self.source.display(),
            output = %self.output.display(),
            clean = self.clean,
            "Loaded Options"
        );
        debug!(?self, "Options loaded (full debug)");
    }
}

/// `<system temp dir>/vanitic`
pub fn default_source_dir() -> PathBuf {
    std::env::temp_dir().join("vanitic")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open repository list {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line} of repository list {path:?}: {source}")]
    Scan {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// The underlying I/O error kind, e.g. `NotFound` for a missing list.
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            ConfigError::Read { source, .. } | ConfigError::Scan { source, .. } => source.kind(),
        }
    }
}

/// Reads the repository list at `path`.
///
/// Every line becomes one entry, in file order. Only the line terminator
/// (`\n` or `\r\n`) is stripped; blank lines are kept as empty entries.
pub fn read_repository_urls<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    info!(config_path = ?path, "Loading repository list from file");

    let file = File::open(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to open repository list");
        ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let mut urls = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            error!(error = ?e, config_path = ?path, line = index + 1, "Failed to read repository list");
            ConfigError::Scan {
                path: path.to_path_buf(),
                line: index + 1,
                source: e,
            }
        })?;
        debug!(repo_url = %line, "Parsed repository URL");
        urls.push(line);
    }

    info!(config_path = ?path, repositories = urls.len(), "Repository list read successfully");
    Ok(urls)
}
