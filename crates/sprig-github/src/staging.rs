//! Job-scoped staging area and the external manifest-update tool.
//!
//! Each bump stages manifests into its own temporary directory, so
//! concurrent jobs never share working files. The update tool itself is a
//! black box that rewrites a version pin in place; we only enforce a
//! bounded timeout around it.

use std::process::Stdio;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use sprig_core::SprigError;

use crate::GithubResult;

/// Isolated working directory for one bump job
#[derive(Debug)]
pub struct StagingArea {
    // Held so the directory outlives the job that staged into it
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl StagingArea {
    /// Create a fresh staging directory
    pub fn new() -> GithubResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sprig-stage-")
            .tempdir()
            .map_err(|e| SprigError::io("Failed to create staging directory", e))?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| SprigError::ManifestTool {
                message: format!("Staging path is not UTF-8: {}", path.display()),
            })?;
        Ok(Self { _dir: dir, root })
    }

    /// Root of the staging directory
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write one staged file
    pub async fn write_file(&self, name: &str, contents: &[u8]) -> GithubResult<()> {
        let path = self.root.join(name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| SprigError::io(format!("Failed to write staged file {}", path), e))
    }

    /// Read one staged file back as UTF-8 text
    pub async fn read_file(&self, name: &str) -> GithubResult<String> {
        let path = self.root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SprigError::io(format!("Failed to read staged file {}", path), e))
    }
}

/// External manifest-update tool invocation
#[derive(Debug, Clone)]
pub struct ManifestUpdater {
    program: String,
    timeout: Duration,
}

impl ManifestUpdater {
    /// Wrap the given program ("npm" in production)
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rewrite the pin for `package` to `version` in the staged manifests.
    ///
    /// Runs `{program} install {package}@{version} --package-lock-only
    /// --cache {dir}` inside the staging directory. Nonzero exit and timeout
    /// expiry both fail the surrounding job, never the batch.
    pub async fn update(
        &self,
        staging_root: &Utf8Path,
        package: &str,
        version: &str,
    ) -> GithubResult<()> {
        let spec = format!("{}@{}", package, version);
        debug!(program = %self.program, %spec, dir = %staging_root, "running manifest update tool");

        let mut command = Command::new(&self.program);
        command
            .arg("install")
            .arg(&spec)
            .arg("--package-lock-only")
            .arg("--cache")
            .arg(staging_root.as_str())
            .current_dir(staging_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = async {
            command.output().await.map_err(|e| {
                SprigError::io(format!("Failed to spawn {}", self.program), e)
            })
        };

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SprigError::ManifestTool {
                    message: format!(
                        "{} timed out after {:?} updating {}",
                        self.program, self.timeout, spec
                    ),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SprigError::ManifestTool {
                message: format!(
                    "{} exited with {} updating {}: {}",
                    self.program,
                    output.status,
                    spec,
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }

    /// The wrapped program name
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staging_round_trip() {
        let staging = StagingArea::new().unwrap();
        staging
            .write_file("package.json", br#"{"name": "x"}"#)
            .await
            .unwrap();

        let contents = staging.read_file("package.json").await.unwrap();
        assert_eq!(contents, r#"{"name": "x"}"#);
    }

    #[tokio::test]
    async fn test_staging_areas_are_isolated() {
        let a = StagingArea::new().unwrap();
        let b = StagingArea::new().unwrap();
        assert_ne!(a.root(), b.root());

        a.write_file("package.json", b"{}").await.unwrap();
        assert!(b.read_file("package.json").await.is_err());
    }

    #[tokio::test]
    async fn test_updater_success_with_no_op_tool() {
        let staging = StagingArea::new().unwrap();
        // `true` accepts and ignores the npm-shaped arguments
        let updater = ManifestUpdater::new("true");

        updater
            .update(staging.root(), "@acme/lib", "1.2.3")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_updater_nonzero_exit_is_tool_failure() {
        let staging = StagingArea::new().unwrap();
        let updater = ManifestUpdater::new("false");

        let result = updater.update(staging.root(), "@acme/lib", "1.2.3").await;
        assert!(matches!(result, Err(SprigError::ManifestTool { .. })));
    }

    #[tokio::test]
    async fn test_updater_enforces_timeout() {
        let staging = StagingArea::new().unwrap();
        // A script that ignores its arguments and outlives the timeout
        let script = staging.root().join("slow.sh");
        tokio::fs::write(&script, "#!/bin/sh\nsleep 5\n").await.unwrap();
        let mut permissions = tokio::fs::metadata(&script).await.unwrap().permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(0o755);
        }
        tokio::fs::set_permissions(&script, permissions).await.unwrap();

        let updater =
            ManifestUpdater::new(script.as_str()).with_timeout(Duration::from_millis(100));

        let result = updater.update(staging.root(), "@acme/lib", "1.2.3").await;
        match result {
            Err(SprigError::ManifestTool { message }) => {
                assert!(message.contains("timed out"), "unexpected message: {}", message)
            }
            other => panic!("expected ManifestTool timeout, got {:?}", other),
        }
    }
}
