//! # sprig-cli
//!
//! Cross-repository dependency bump orchestrator CLI.
//!
//! This is the entry point that queue infrastructure (or an operator)
//! invokes with a batch of jobs. It sets up logging, loads configuration,
//! runs the batch processor, and reports the failed item identifiers so
//! only those get redelivered.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use sprig_core::RawJob;
use sprig_worker::{handle_batch, WorkerConfig};

/// Cross-repository dependency bump orchestrator
#[derive(Parser)]
#[command(name = "sprig", version, about = "Dependency bump orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a batch of queue jobs (JSON array of {id, body})
    Process {
        /// Batch file; stdin when omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Store one repository's manifest pins
    Store {
        repository: String,
        package_name: String,
        /// Dependencies payload as JSON ({"dependencies": {...}, "devDependencies": {...}})
        dependencies: String,
    },
    /// Bump every parent of a freshly published package
    Bump {
        package: String,
        version: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let batch = batch_from_command(cli.command)?;
    info!(jobs = batch.len(), "processing batch");

    let report = handle_batch(WorkerConfig::from_env(), &batch).await;

    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({ "failed": report.failed }))?
    );

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

/// Turn the invoked subcommand into a job batch
fn batch_from_command(command: Commands) -> anyhow::Result<Vec<RawJob>> {
    match command {
        Commands::Process { input } => read_batch(input),
        Commands::Store {
            repository,
            package_name,
            dependencies,
        } => {
            let dependencies: serde_json::Value = serde_json::from_str(&dependencies)
                .context("dependencies must be a JSON object")?;
            let body = serde_json::json!({
                "request_type": "store_dependency",
                "repository": repository,
                "package_name": package_name,
                "dependencies": dependencies,
            });
            Ok(vec![RawJob {
                id: "cli-store".to_string(),
                body: body.to_string(),
            }])
        }
        Commands::Bump { package, version } => {
            let body = serde_json::json!({
                "request_type": "bump_parents",
                "updated_package_name": package,
                "updated_package_version": version,
            });
            Ok(vec![RawJob {
                id: "cli-bump".to_string(),
                body: body.to_string(),
            }])
        }
    }
}

/// Read a batch from a file, or stdin when no file is given
fn read_batch(input: Option<PathBuf>) -> anyhow::Result<Vec<RawJob>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read batch from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&raw).context("Batch must be a JSON array of {id, body}")
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "sprig={level},sprig_worker={level},sprig_github={level},sprig_registry={level}"
        ))
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_read_batch_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "msg-1", "body": "{{}}"}}, {{"id": "msg-2", "body": "x"}}]"#
        )
        .unwrap();

        let batch = read_batch(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, "msg-1");
        assert_eq!(batch[1].body, "x");
    }

    #[test]
    fn test_store_command_builds_store_job() {
        let batch = batch_from_command(Commands::Store {
            repository: "widgets".to_string(),
            package_name: "@acme/widgets".to_string(),
            dependencies: r#"{"dependencies": {"@acme/lib": "1.0.0"}}"#.to_string(),
        })
        .unwrap();

        assert_eq!(batch.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&batch[0].body).unwrap();
        assert_eq!(body["request_type"], "store_dependency");
        assert_eq!(body["dependencies"]["dependencies"]["@acme/lib"], "1.0.0");
    }

    #[test]
    fn test_bump_command_builds_bump_job() {
        let batch = batch_from_command(Commands::Bump {
            package: "@acme/lib".to_string(),
            version: "1.2.0".to_string(),
        })
        .unwrap();

        let body: serde_json::Value = serde_json::from_str(&batch[0].body).unwrap();
        assert_eq!(body["request_type"], "bump_parents");
        assert_eq!(body["updated_package_name"], "@acme/lib");
        assert_eq!(body["updated_package_version"], "1.2.0");
    }

    #[test]
    fn test_malformed_dependencies_argument_is_rejected() {
        let result = batch_from_command(Commands::Store {
            repository: "widgets".to_string(),
            package_name: "@acme/widgets".to_string(),
            dependencies: "{not json".to_string(),
        });
        assert!(result.is_err());
    }
}
