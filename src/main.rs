//! Feedback Form - send a bug report, idea or comment
//!
//! Picks a category, optionally attaches a screenshot of the current screen, and posts
//! the comment to the feedback backend. Failures are logged and never crash the form.

mod api;
mod config;
mod feedback;
mod tui;

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::feedback::cli::SendArgs;
use crate::feedback::FeedbackCategory;

const LOG_ENV: &str = "FEEDBACK_FORM_LOG";

/// Feedback Form - tell us what is broken or what you would like to see
#[derive(Parser)]
#[command(name = "feedback-form")]
#[command(version)]
#[command(about = "Send feedback with an optional screenshot")]
struct Cli {
    /// Log debug details (or set FEEDBACK_FORM_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the feedback API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one feedback comment and exit
    Send {
        /// Category: bug, idea or other
        category: FeedbackCategory,

        /// Feedback text
        comment: String,

        /// Attach an existing image file as the screenshot
        #[arg(long, conflicts_with = "capture")]
        screenshot: Option<PathBuf>,

        /// Take a screenshot with the configured capture command
        #[arg(long)]
        capture: bool,
    },

    /// Open the interactive feedback form in the terminal
    Form {
        /// Category: bug, idea or other
        category: FeedbackCategory,
    },

    /// List feedback categories
    Categories,

    /// Show the configuration file path and effective settings
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            category,
            comment,
            screenshot,
            capture,
        } => {
            init_tracing(cli.verbose, None)?;
            let config = load_config(cli.api_url)?;
            let rt = tokio::runtime::Runtime::new()?;
            feedback::cli::run_send(
                &rt,
                &config,
                SendArgs {
                    category,
                    comment,
                    screenshot,
                    capture,
                },
            )?;
        }
        Commands::Form { category } => {
            if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
                bail!("The interactive form needs a terminal. Use `feedback-form send` instead.");
            }
            let log_path = config::log_path()?;
            init_tracing(cli.verbose, Some(log_path.as_path()))?;
            let config = load_config(cli.api_url)?;
            let rt = tokio::runtime::Runtime::new()?;

            match tui::run_tui(&rt, &config, category)? {
                tui::TuiExit::Sent => {
                    println!("{}", "✓ Feedback sent. Thank you.".bright_green())
                }
                tui::TuiExit::Canceled => println!("{}", "Feedback canceled.".bright_yellow()),
                tui::TuiExit::Quit => {}
            }
        }
        Commands::Categories => feedback::cli::print_categories(),
        Commands::Config { init } => {
            init_tracing(cli.verbose, None)?;
            let config = if init {
                Config::init()?
            } else {
                load_config(cli.api_url)?
            };
            println!(
                "{} {}",
                "Config file:".bright_white(),
                config::get_config_path()?
            );
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render config as TOML")?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn load_config(api_url: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = api_url {
        config.api.base_url = url;
    }
    Ok(config)
}

/// Logs go to stderr, or to `log_file` when the terminal is owned by the TUI.
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}
