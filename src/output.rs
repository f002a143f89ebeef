//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking and the console diagnostic sink used while organizing.
//! Events also go to the `log` facade; [`init_log_file`] sends them to a file.

use crate::diagnostics::{DiagnosticSink, Level, OrganizeEvent};
use crate::file_category::FileMapper;
use crate::organizer::OrganizeReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use simplelog::{ConfigBuilder, LevelFilter, LevelPadding, WriteLogger, format_description};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar over the entries of one pass.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the end-of-run summary.
    pub fn summary(report: &OrganizeReport) {
        let title = if report.dry_run {
            "DRY RUN SUMMARY"
        } else {
            "SUMMARY"
        };
        Self::header(title);

        let verb = if report.dry_run { "to move" } else { "moved" };
        println!(
            "Files {}: {}",
            verb,
            report.files_moved.to_string().green().bold()
        );
        println!(
            "Folders {} to unorganized: {}",
            verb,
            report.folders_moved.to_string().green().bold()
        );
        if !report.skipped.is_empty() {
            println!("Left in place: {}", report.skipped.len());
        }
        if !report.failed.is_empty() {
            println!("Failed: {}", report.failed.len().to_string().red().bold());
        }
    }

    /// Prints the category table, in lookup order.
    pub fn category_table(mapper: &FileMapper) {
        Self::header("CATEGORIES");

        let width = mapper
            .categories()
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Extensions".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 14));
        for category in mapper.categories() {
            println!(
                "{:<width$} | {}",
                category.name,
                category.extensions.join(" "),
                width = width
            );
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// Level of the log file: errors only, everything when verbose.
pub fn log_file_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Error
    }
}

/// Installs the process-wide logger, appending to `path` as
/// `YYYY-MM-DD HH:MM:SS [LEVEL] message`. Creates the file and its folder.
///
/// Fails if the file cannot be opened or a logger is already installed.
pub fn init_log_file(path: &Path, verbose: bool) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut config = ConfigBuilder::new();
    config
        .set_time_format_custom(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .set_level_padding(LevelPadding::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off);
    // Stays on UTC if the local offset cannot be determined.
    let _ = config.set_time_offset_to_local();

    WriteLogger::init(log_file_level(verbose), config.build(), file).map_err(io::Error::other)
}

/// Diagnostic sink that writes to the terminal and the `log` facade.
///
/// Errors are always printed. Other events are printed only in verbose mode;
/// otherwise a progress bar tracks the pass. Every event is also logged at its
/// own level, so an installed logger decides what reaches the log file.
pub struct ConsoleSink {
    verbose: bool,
    show_progress: bool,
    progress: RefCell<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            show_progress: true,
            progress: RefCell::new(None),
        }
    }

    /// Never draws a progress bar, e.g. when stdout carries JSON.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn print(&self, event: &OrganizeEvent) {
        let line = match event.level() {
            Level::Error => format!("{} {}", "✗".red(), event),
            Level::Info => match event {
                OrganizeEvent::FolderCreated { .. } => event.to_string().cyan().to_string(),
                OrganizeEvent::Planned { .. } => format!("[DRY RUN] {}", event).yellow().to_string(),
                _ => format!("{} {}", "✓".green(), event),
            },
            Level::Debug => event.to_string().dimmed().to_string(),
        };

        match self.progress.borrow().as_ref() {
            Some(pb) => pb.println(line),
            None if event.level() == Level::Error => eprintln!("{}", line),
            None => println!("{}", line),
        }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn record(&self, event: &OrganizeEvent) {
        log::log!(log::Level::from(event.level()), "{}", event);

        match event {
            OrganizeEvent::ScanStarted { entries, .. } => {
                if self.verbose {
                    self.print(event);
                } else if self.show_progress {
                    *self.progress.borrow_mut() =
                        Some(OutputFormatter::create_progress_bar(*entries as u64));
                }
            }
            // Printed by the caller from the report.
            OrganizeEvent::Summary { .. } => {
                if let Some(pb) = self.progress.borrow_mut().take() {
                    pb.finish_and_clear();
                }
            }
            _ => {
                if self.verbose || event.level() == Level::Error {
                    self.print(event);
                }
                if event.is_entry_outcome()
                    && let Some(pb) = self.progress.borrow().as_ref()
                {
                    pb.inc(1);
                }
            }
        }
    }
}
