//! Version command implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use cadence_command::{Command, CommandContext, CommandOutput};
use clap::Parser;
use serde::Serialize;

use super::{Parsed, parse_args};

#[derive(Parser, Debug)]
#[command(about = "Print the cadence version")]
struct VersionArgs {
    /// Emit a JSON object instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
}

const VERSION: VersionOutput = VersionOutput {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

#[derive(Debug, Default, Clone, Copy)]
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    fn name(&self) -> &str {
        "version"
    }

    fn description(&self) -> &str {
        "Print the cadence version"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<CommandOutput> {
        let message = match parse_args::<VersionArgs>(self.name(), &ctx.args)? {
            Parsed::Help(help) => help,
            Parsed::Args(args) if args.json => {
                serde_json::to_string(&VERSION).context("Failed to emit version JSON")?
            }
            Parsed::Args(_) => format!("{} {}", VERSION.name, VERSION.version),
        };
        Ok(CommandOutput::success().message(message))
    }
}
