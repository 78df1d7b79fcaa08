//! vanitic-core: core logic library for vanitic.
//!
//! This crate holds the generation pipeline behind the `vanitic` binary:
//! reading the repository list, keeping working copies in sync, asking the
//! Go toolchain about modules and packages, and rendering one vanity import
//! page per package.
//!
//! # Usage
//! Build [`Options`], a [`PageRenderer`] and a [`Toolchain`] implementation
//! (normally [`ShellToolchain`]), then call [`generate`].

pub mod config;
pub mod contract;
pub mod generate;
pub mod inspect;
pub mod path;
pub mod render;
pub mod toolchain;

pub use config::{read_repository_urls, ConfigError, Options};
pub use contract::{PackageListing, Toolchain, ToolchainError};
pub use generate::{generate, GenerateError, GenerateReport, RepositoryReport};
pub use render::{Package, PageRenderer, RenderError};
pub use toolchain::ShellToolchain;
