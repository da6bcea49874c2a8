//! Headless lap screen host.
//!
//! # Responsibility
//! - Drive the core lap screen from a terminal: open, tap, render, close.
//! - Keep output deterministic so scripts can consume it (`--json`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use laptimer_core::{
    default_log_level, init_logging, FileStoreOpener, LapView, LongTimeFormatter,
    ScreenController, ScreenError, SystemClock,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "laptimer", version, about = "Record and list lap times")]
struct Cli {
    /// Lap database file.
    #[arg(long, env = "LAPTIMER_DB_PATH", default_value_os_t = default_db_path())]
    db: PathBuf,

    /// Render times at this fixed offset east of UTC, in minutes, instead of
    /// local time.
    #[arg(long, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    /// Print the screen as JSON.
    #[arg(long)]
    json: bool,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "LAPTIMER_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the lap count and every lap, most recent first.
    Show,
    /// Record laps, then show the screen.
    Tap {
        /// Number of laps to record.
        #[arg(default_value_t = 1)]
        count: u32,
    },
}

#[derive(Debug, Default)]
struct TerminalView {
    title: String,
    rows: Vec<String>,
    errors: Vec<ScreenError>,
}

impl LapView for TerminalView {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_rows(&mut self, rows: &[String]) {
        self.rows = rows.to_vec();
    }

    fn show_error(&mut self, error: &ScreenError) {
        self.errors.push(error.clone());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    let formatter = match cli.utc_offset {
        Some(minutes) => LongTimeFormatter::from_offset_minutes(minutes)
            .with_context(|| format!("utc offset {minutes} minutes is out of range"))?,
        None => LongTimeFormatter::local(),
    };

    let view = Rc::new(RefCell::new(TerminalView::default()));
    let mut controller = ScreenController::new(
        FileStoreOpener::new(&cli.db),
        Rc::clone(&view),
        Rc::new(formatter),
        Rc::new(SystemClock),
    );
    if let Err(err) = controller.activate() {
        bail!("failed to open lap database `{}`: {err}", cli.db.display());
    }

    if let Command::Tap { count } = cli.command {
        for _ in 0..count {
            controller.tap();
        }
    }
    controller.deactivate();

    let view = view.borrow();
    if cli.json {
        let screen = serde_json::json!({
            "title": view.title,
            "rows": view.rows,
            "errors": view.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&screen)?);
    } else {
        print!("{}", render_text(&view.title, &view.rows));
    }

    for error in &view.errors {
        eprintln!("laptimer: {error}");
    }
    if let Some(summary) = error_summary(&view.errors) {
        bail!(summary);
    }
    Ok(())
}

/// One-line failure summary; write failures are counted apart from
/// screen errors such as unreadable storage.
fn error_summary(errors: &[ScreenError]) -> Option<String> {
    let failed_writes = errors
        .iter()
        .filter(|error| matches!(error, ScreenError::WriteFailed(_)))
        .count();
    let screen_errors = errors.len() - failed_writes;

    match (failed_writes, screen_errors) {
        (0, 0) => None,
        (writes, 0) => Some(format!("{writes} lap(s) could not be recorded")),
        (0, others) => Some(format!("lap screen reported {others} error(s)")),
        (writes, others) => Some(format!(
            "{writes} lap(s) could not be recorded; lap screen reported {others} other error(s)"
        )),
    }
}

fn render_text(title: &str, rows: &[String]) -> String {
    let mut out = format!("{title}\n");
    for row in rows {
        out.push_str("  ");
        out.push_str(row);
        out.push('\n');
    }
    out
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join("laptimer.sqlite3")
}
