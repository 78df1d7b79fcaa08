//! # contract: the seam between the pipeline and external tools
//!
//! The generator only needs three things from the outside world: a working
//! copy of each repository, the module path of that working copy, and the
//! packages beneath it. [`Toolchain`] captures exactly that capability set.
//!
//! - [`crate::toolchain::ShellToolchain`] implements it with `git` and `go`.
//! - Tests use the `mockall`-generated `MockToolchain`, exported through the
//!   default `test-export-mocks` feature so integration tests can reach it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

/// One line of package listing output: an import path and its synopsis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageListing {
    pub import_path: String,
    /// Possibly empty.
    pub description: String,
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: String },
    #[error("`{command}` produced non UTF-8 output")]
    Utf8 { command: String },
    #[error("failed to prepare {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// External tools the generator shells out to.
///
/// Implementations run one command at a time and block the pipeline until it
/// finishes; there is no timeout.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Make `dest` an up-to-date working copy of `source`: clone it when
    /// `dest` is absent, update it in place otherwise.
    async fn synchronise(&self, source: &str, dest: &Path) -> Result<(), ToolchainError>;

    /// Canonical module path of the working copy at `dir`, without
    /// surrounding whitespace.
    async fn list_module(&self, dir: &Path) -> Result<String, ToolchainError>;

    /// Every package under the module at `dir`.
    async fn list_packages(&self, dir: &Path) -> Result<Vec<PackageListing>, ToolchainError>;
}
