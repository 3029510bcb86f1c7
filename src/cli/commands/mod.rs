//! Built-in commands
//!
//! Each command is a [`Command`] registered by name in
//! [`builtin_registry`]. Commands parse their own arguments (everything
//! after the command name) with clap.

mod clean;
mod install;
mod version;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use cadence_command::{Command, CommandRegistry};
use clap::Parser;
use clap::error::ErrorKind;

pub use clean::CleanCommand;
pub use install::InstallCommand;
pub use version::VersionCommand;

/// Registry holding `clean`, `install` and `version`.
#[must_use]
pub fn builtin_registry() -> CommandRegistry {
    CommandRegistry::new()
        .with("clean", || Arc::new(CleanCommand) as Arc<dyn Command>)
        .with("install", || Arc::new(InstallCommand::new()) as Arc<dyn Command>)
        .with("version", || Arc::new(VersionCommand) as Arc<dyn Command>)
}

/// Outcome of parsing a command's own arguments.
#[derive(Debug)]
pub(crate) enum Parsed<T> {
    Args(T),
    /// `--help` was requested; the rendered text.
    Help(String),
}

/// Parse a command's own arguments, using `name` as the program name in
/// usage messages.
pub(crate) fn parse_args<T: Parser>(name: &str, args: &[String]) -> Result<Parsed<T>> {
    let argv = std::iter::once(format!("cadence {name}")).chain(args.iter().cloned());
    match T::try_parse_from(argv) {
        Ok(parsed) => Ok(Parsed::Args(parsed)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => Ok(Parsed::Help(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Join `relative` onto `root`, refusing paths that could leave it.
pub(crate) fn project_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    if relative.trim().is_empty() {
        bail!("path must not be empty");
    }
    if rel.is_absolute() {
        bail!("path '{relative}' must be relative to the project root");
    }
    if rel
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir))
    {
        bail!("path '{relative}' must not leave the project root");
    }
    if rel.components().all(|c| matches!(c, Component::CurDir)) {
        bail!("path '{relative}' refers to the project root itself");
    }
    Ok(root.join(rel))
}
