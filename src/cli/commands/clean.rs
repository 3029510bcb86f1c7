//! Clean command implementation
//!
//! Handles `cadence clean`: removes build output and dependency folders
//! from the project root.

use std::io;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use cadence_command::{Command, CommandContext, CommandOutput};
use cadence_utils::error::TaskError;
use clap::Parser;
use tracing::{debug, info};

use super::{Parsed, parse_args, project_path};

#[derive(Parser, Debug, Default)]
#[command(about = "Remove build output and installed dependencies")]
struct CleanArgs {
    /// Build output directory to remove (default: config or "dist")
    #[arg(long)]
    output_path: Option<String>,

    /// Keep node_modules/
    #[arg(long)]
    skip_npm: bool,

    /// Keep bower_components/
    #[arg(long)]
    skip_bower: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CleanCommand;

#[async_trait]
impl Command for CleanCommand {
    fn name(&self) -> &str {
        "clean"
    }

    fn description(&self) -> &str {
        "Remove tmp/, the output directory and installed dependencies"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutput> {
        let args: CleanArgs = match parse_args(self.name(), &ctx.args)? {
            Parsed::Args(args) => args,
            Parsed::Help(help) => return Ok(CommandOutput::success().message(help)),
        };

        let output_path = args
            .output_path
            .unwrap_or_else(|| ctx.config.output_path().into_string());

        let mut targets = vec!["tmp".to_string(), output_path];
        if !args.skip_npm {
            targets.push("node_modules".to_string());
        }
        if !args.skip_bower {
            targets.push("bower_components".to_string());
        }

        let paths = targets
            .iter()
            .map(|target| project_path(ctx.project_root(), target))
            .collect::<Result<Vec<_>>>()?;

        let mut removed = Vec::new();
        for (target, path) in targets.iter().zip(&paths) {
            if remove(path).await? {
                ctx.ui.write_line(&format!("  removed {target}"));
                removed.push(target.as_str());
            } else {
                debug!(path = %path.display(), "Nothing to remove");
            }
        }

        info!(removed = ?removed, "Project cleaned");
        let message = if removed.is_empty() {
            "Nothing to clean.".to_string()
        } else {
            format!("Cleaned {}.", removed.join(", "))
        };
        Ok(CommandOutput::success().message(message))
    }
}

/// Remove a file or directory tree. Returns false when it did not exist.
async fn remove(path: &Path) -> Result<bool, TaskError> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(remove_failed(path, &e)),
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(remove_failed(path, &e)),
    }
}

fn remove_failed(path: &Path, e: &io::Error) -> TaskError {
    TaskError::RemoveFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
