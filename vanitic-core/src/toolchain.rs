//! `git` and `go` backed [`Toolchain`].
//!
//! Clone and pull output is streamed straight to the process's stdout and
//! stderr. `go list` output is captured for parsing while its stderr is
//! passed through for diagnostics.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::contract::{PackageListing, Toolchain, ToolchainError};
use crate::inspect::{parse_module, parse_package_listing, PACKAGE_LIST_FORMAT};

/// Runs the real `git` and `go` executables.
#[derive(Debug, Clone)]
pub struct ShellToolchain {
    git: String,
    go: String,
}

impl Default for ShellToolchain {
    fn default() -> Self {
        Self::new("git", "go")
    }
}

impl ShellToolchain {
    /// `git` and `go` name the executables to run, resolved through `PATH`
    /// unless given as paths.
    pub fn new(git: impl Into<String>, go: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            go: go.into(),
        }
    }

    async fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), ToolchainError> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolchainError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let mut cmd = Command::new(&self.git);
        cmd.arg("clone").arg(source).arg(dest);

        match run_streamed(&mut cmd).await {
            Ok(()) => {
                info!(repo_url = source, path = %dest.display(), "Successfully cloned git repository");
                Ok(())
            }
            Err(e) => {
                // The clone error is what gets reported; a failed cleanup only warns.
                match tokio::fs::remove_dir_all(dest).await {
                    Ok(()) => {
                        debug!(path = %dest.display(), "Removed partial clone");
                    }
                    Err(rm) if rm.kind() == ErrorKind::NotFound => {}
                    Err(rm) => {
                        warn!(
                            error = ?rm,
                            path = %dest.display(),
                            "Failed to remove partial clone"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn pull_repo(&self, source: &str, dest: &Path) -> Result<(), ToolchainError> {
        let mut cmd = Command::new(&self.git);
        // No refspec: merge whatever branch the clone tracks.
        cmd.arg("pull").current_dir(dest);

        run_streamed(&mut cmd).await?;
        info!(repo_url = source, path = %dest.display(), "Updated git repository");
        Ok(())
    }
}

#[async_trait]
impl Toolchain for ShellToolchain {
    async fn synchronise(&self, source: &str, dest: &Path) -> Result<(), ToolchainError> {
        if tokio::fs::metadata(dest).await.is_ok() {
            debug!(path = %dest.display(), "Working copy exists, pulling");
            self.pull_repo(source, dest).await
        } else {
            debug!(path = %dest.display(), "No working copy, cloning");
            self.clone_repo(source, dest).await
        }
    }

    async fn list_module(&self, dir: &Path) -> Result<String, ToolchainError> {
        let mut cmd = Command::new(&self.go);
        cmd.args(["list", "-m"]).current_dir(dir);

        let output = run_captured(&mut cmd).await?;
        let module = parse_module(&output);
        debug!(module = %module, path = %dir.display(), "Resolved module path");
        Ok(module)
    }

    async fn list_packages(&self, dir: &Path) -> Result<Vec<PackageListing>, ToolchainError> {
        let mut cmd = Command::new(&self.go);
        cmd.args(["list", "-f", PACKAGE_LIST_FORMAT, "./..."])
            .current_dir(dir);

        let output = run_captured(&mut cmd).await?;
        let packages = parse_package_listing(&output);
        debug!(packages = packages.len(), path = %dir.display(), "Listed packages");
        Ok(packages)
    }
}

fn command_line(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs `cmd` with stdout and stderr inherited.
async fn run_streamed(cmd: &mut Command) -> Result<(), ToolchainError> {
    let command = command_line(cmd);
    info!(command = %command, "Running");

    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;

    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => {
            error!(command = %command, "Command exited with non-zero code: {}", s);
            Err(ToolchainError::Exit {
                command,
                status: s.to_string(),
            })
        }
        Err(e) => {
            error!(error = ?e, command = %command, "Failed to launch process");
            Err(ToolchainError::Launch { command, source: e })
        }
    }
}

/// Runs `cmd` capturing stdout; stderr is inherited.
async fn run_captured(cmd: &mut Command) -> Result<String, ToolchainError> {
    let command = command_line(cmd);
    debug!(command = %command, "Running");

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .await;

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            error!(command = %command, "Command exited with non-zero code: {}", o.status);
            return Err(ToolchainError::Exit {
                command,
                status: o.status.to_string(),
            });
        }
        Err(e) => {
            error!(error = ?e, command = %command, "Failed to launch process");
            return Err(ToolchainError::Launch { command, source: e });
        }
    };

    String::from_utf8(output.stdout).map_err(|_| ToolchainError::Utf8 { command })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// Writes an executable `git` stand-in that leaves a partial clone behind.
    fn partial_clone_git(dir: &Path) -> std::path::PathBuf {
        let script = dir.join("fake-git");
        // Invoked as: fake-git clone <source> <dest>
        std::fs::write(
            &script,
            "#!/bin/sh\nmkdir -p \"$3/sub\" && echo partial > \"$3/sub/f\"\nexit 128\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[tokio::test]
    #[serial]
    async fn failed_clone_removes_partial_working_copy() {
        let tmp = tempdir().unwrap();
        let git = partial_clone_git(tmp.path());
        let staging = tmp.path().join("staging");
        let dest = staging.join("foo.git");
        let toolchain = ShellToolchain::new(git.to_string_lossy(), "go");

        let err = toolchain
            .synchronise("https://example.com/foo.git", &dest)
            .await
            .unwrap_err();

        match &err {
            ToolchainError::Exit { status, .. } => assert!(status.contains("128"), "got {status}"),
            other => panic!("expected exit error, got {other:?}"),
        }
        assert!(!dest.exists(), "partial clone should be removed");
        assert!(staging.is_dir());
    }

    #[tokio::test]
    #[serial]
    async fn failed_clone_leaves_no_working_copy() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("staging").join("foo.git");
        let toolchain = ShellToolchain::new("false", "go");

        let err = toolchain
            .synchronise("https://example.com/foo.git", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, ToolchainError::Exit { .. }), "got {err:?}");
        assert!(!dest.exists());
        assert!(tmp.path().join("staging").is_dir());
    }

    #[tokio::test]
    #[serial]
    async fn existing_working_copy_is_pulled_not_removed() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("foo.git");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("go.mod"), "module example.com/foo\n").unwrap();
        let toolchain = ShellToolchain::new("false", "go");

        let err = toolchain
            .synchronise("https://example.com/foo.git", &dest)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("pull"), "got {err}");
        assert!(dest.join("go.mod").exists());
    }

    #[tokio::test]
    #[serial]
    async fn missing_executable_is_a_launch_error() {
        let tmp = tempdir().unwrap();
        let toolchain = ShellToolchain::new("git", "vanitic-no-such-go-binary");

        let err = toolchain.list_module(tmp.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::Launch { .. }), "got {err:?}");

        let err = toolchain.list_packages(tmp.path()).await.unwrap_err();
        assert!(matches!(err, ToolchainError::Launch { .. }), "got {err:?}");
    }

    #[tokio::test]
    #[serial]
    async fn failing_go_list_is_an_exit_error() {
        let tmp = tempdir().unwrap();
        let toolchain = ShellToolchain::new("git", "false");

        let err = toolchain.list_module(tmp.path()).await.unwrap_err();
        assert!(err.to_string().contains("false list -m"), "got {err}");
    }

    #[test]
    fn command_line_joins_program_and_args() {
        let mut cmd = Command::new("go");
        cmd.args(["list", "-f", PACKAGE_LIST_FORMAT, "./..."]);
        assert_eq!(
            command_line(&cmd),
            "go list -f {{ .ImportPath }} {{ .Doc }} ./..."
        );
    }
}
