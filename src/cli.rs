//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Loading and resolving the configuration
//! - Running the organizer with a console sink
//! - Listing categories and writing a starter configuration

use crate::config::{ConfigOverrides, OrganizerConfig, ResolvedConfig};
use crate::diagnostics::DiagnosticSink;
use crate::organizer::{DirectoryOrganizer, OrganizeReport, OrganizeRequest};
use crate::output::{self, ConsoleSink, OutputFormatter};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Sort a folder into category subfolders by file extension.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Configuration file (default: ./.dirsortrc.toml, then ~/.config/dirsort/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Subcommands besides the default organizing run.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the category table in lookup order
    Categories,
    /// Write the default configuration to a file
    Init {
        /// Where to write it (default: ~/.config/dirsort/config.toml)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options of an organizing run.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Folder to organize
    pub source: Option<PathBuf>,

    /// Root for categorized files (default: <SOURCE>/Organized)
    #[arg(long, value_name = "DIR")]
    pub organized: Option<PathBuf>,

    /// Root for moved subfolders (default: <SOURCE>/Unorganized)
    #[arg(long, value_name = "DIR")]
    pub unorganized: Option<PathBuf>,

    /// Date entries by creation time instead of modification time
    #[arg(long)]
    pub use_creation_date: bool,

    /// Re-date files that already start with a YYYY-MM-DD- prefix
    #[arg(long)]
    pub force_date: bool,

    /// Date-prefix subfolders too
    #[arg(long)]
    pub date_folders: bool,

    /// Show what would happen without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print every event, not just errors
    #[arg(short, long)]
    pub verbose: bool,

    /// Append errors to this log file (every event with --verbose)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source: self.source.clone(),
            organized: self.organized.clone(),
            unorganized: self.unorganized.clone(),
            use_creation_date: self.use_creation_date,
            force_date: self.force_date,
            date_folders: self.date_folders,
            dry_run: self.dry_run,
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone)]
pub enum OrganizeCommand {
    /// Organize the source folder.
    Organize(RunArgs),
    /// Print the effective category table.
    ListCategories,
    /// Write a starter configuration file.
    Init { path: Option<PathBuf>, force: bool },
}

impl From<Cli> for OrganizeCommand {
    fn from(cli: Cli) -> Self {
        match cli.command {
            Some(Commands::Categories) => OrganizeCommand::ListCategories,
            Some(Commands::Init { path, force }) => OrganizeCommand::Init { path, force },
            None => OrganizeCommand::Organize(cli.run),
        }
    }
}

/// Runs the CLI application from parsed arguments.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let config_path = cli.config.clone();
    run_cli_with_config(cli.into(), config_path.as_deref())
}

/// Runs a command with an optional configuration file.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{run_cli_with_config, OrganizeCommand, RunArgs};
/// use std::path::PathBuf;
///
/// let args = RunArgs {
///     source: Some(PathBuf::from("/home/me/Downloads")),
///     dry_run: true,
///     ..Default::default()
/// };
/// if let Err(e) = run_cli_with_config(OrganizeCommand::Organize(args), None) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli_with_config(
    command: OrganizeCommand,
    config_path: Option<&Path>,
) -> Result<(), String> {
    match command {
        OrganizeCommand::Organize(args) => organize(&args, config_path).map(|_| ()),
        OrganizeCommand::ListCategories => list_categories(config_path),
        OrganizeCommand::Init { path, force } => init_config(path, force),
    }
}

/// Organizes the source folder and prints the outcome.
///
/// This function:
/// 1. Loads the configuration and applies command-line overrides
/// 2. Installs the log file logger, if asked, and builds a console sink
/// 3. Runs one organizing pass
/// 4. Prints the summary, or the report as JSON
pub fn organize(args: &RunArgs, config_path: Option<&Path>) -> Result<OrganizeReport, String> {
    let config = OrganizerConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let resolved = config
        .resolve(&args.overrides())
        .map_err(|e| format!("Error in configuration: {}", e))?;

    if args.verbose {
        for (ext, winner, shadowed) in resolved.mapper.shadowed_extensions() {
            OutputFormatter::warning(&format!(
                "{} is listed under {} and {}; {} wins",
                ext,
                winner,
                shadowed.join(", "),
                winner
            ));
        }
    }

    if let Some(log_path) = &args.log_file {
        output::init_log_file(log_path, args.verbose)
            .map_err(|e| format!("Error opening log file {}: {}", log_path.display(), e))?;
    }

    let mut sink = ConsoleSink::new(args.verbose && !args.json);
    if args.json {
        sink = sink.without_progress();
    }

    if !args.json {
        let heading = format!("Organizing contents of: {}", resolved.source.display());
        if resolved.options.dry_run {
            OutputFormatter::dry_run_notice(&heading);
        } else {
            OutputFormatter::info(&heading);
        }
    }

    let report = run_organizer(&resolved, &sink)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        OutputFormatter::plain(&json);
        return Ok(report);
    }

    OutputFormatter::summary(&report);
    if !report.is_complete_success() {
        OutputFormatter::warning("Some entries could not be organized. Please review errors above.");
    } else if report.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
    Ok(report)
}

fn run_organizer(
    resolved: &ResolvedConfig,
    sink: &dyn DiagnosticSink,
) -> Result<OrganizeReport, String> {
    let request = OrganizeRequest::new(
        &resolved.source,
        &resolved.organized_root,
        &resolved.unorganized_root,
        resolved.mapper.clone(),
        sink,
    )
    .with_options(resolved.options);

    DirectoryOrganizer::new(&request)
        .run()
        .map_err(|e| format!("Error: {}", e))
}

/// Prints the effective category table and any shadowed extensions.
fn list_categories(config_path: Option<&Path>) -> Result<(), String> {
    let config = OrganizerConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let mapper = config
        .mapper()
        .map_err(|e| format!("Error in configuration: {}", e))?;

    OutputFormatter::category_table(&mapper);
    for (ext, winner, shadowed) in mapper.shadowed_extensions() {
        OutputFormatter::warning(&format!(
            "{} also listed under {}; {} wins",
            ext,
            shadowed.join(", "),
            winner
        ));
    }
    Ok(())
}

/// Writes the starter configuration.
fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), String> {
    let path = path
        .or_else(OrganizerConfig::user_config_path)
        .unwrap_or_else(|| PathBuf::from(".dirsortrc.toml"));

    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    OrganizerConfig::starter()
        .save(&path)
        .map_err(|e| format!("Error writing configuration: {}", e))?;
    OutputFormatter::success(&format!("Wrote configuration to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "dirsort",
            "/in",
            "--organized",
            "/out",
            "--force-date",
            "--dry-run",
        ])
        .expect("Failed to parse");

        let OrganizeCommand::Organize(args) = OrganizeCommand::from(cli) else {
            panic!("expected an organize command");
        };
        assert_eq!(args.source, Some(PathBuf::from("/in")));
        assert_eq!(args.organized, Some(PathBuf::from("/out")));
        assert!(args.force_date);
        assert!(args.dry_run);
        assert!(!args.date_folders);
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["dirsort", "categories", "--config", "c.toml"])
            .expect("Failed to parse");
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            OrganizeCommand::from(cli),
            OrganizeCommand::ListCategories
        ));

        let cli = Cli::try_parse_from(["dirsort", "init", "x.toml", "--force"])
            .expect("Failed to parse");
        assert!(matches!(
            OrganizeCommand::from(cli),
            OrganizeCommand::Init { force: true, .. }
        ));
    }

    #[test]
    fn test_overrides_from_args() {
        let args = RunArgs {
            source: Some(PathBuf::from("/in")),
            use_creation_date: true,
            ..Default::default()
        };
        let overrides = args.overrides();
        assert_eq!(overrides.source, Some(PathBuf::from("/in")));
        assert!(overrides.use_creation_date);
        assert!(!overrides.dry_run);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
