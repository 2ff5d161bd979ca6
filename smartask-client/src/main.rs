//! smartask - SmartTask manager client
//!
//! Command-line host for the calendar and compare views: lists and renders
//! calendars, requests generation and analysis, and compares analysis
//! results of two calendars.

use anyhow::Result;
use clap::{Parser, Subcommand};
use smartask_common::config::{ClientConfig, ConfigOverrides};
use std::path::PathBuf;
use tracing::{debug, info};

mod commands;

/// Command-line arguments for smartask
#[derive(Parser, Debug)]
#[command(name = "smartask")]
#[command(about = "Client for the SmartTask scheduling backend")]
#[command(version)]
struct Args {
    /// Configuration file (default: <config dir>/smartask/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Result broadcast stream URL
    #[arg(long, global = true)]
    stream_url: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generated calendars
    #[command(subcommand)]
    Calendars(CalendarCommand),

    /// Analyze one calendar and print its KPI report
    Analyze {
        /// Calendar id
        id: String,
    },

    /// Analyze two calendars and print the metric differences
    Compare {
        /// Calendar id of side one
        one: String,
        /// Calendar id of side two
        two: String,
    },

    /// Background generation tasks, most recent first
    Tasks,

    /// Rule sets
    #[command(subcommand)]
    Rulesets(RuleSetCommand),

    /// Vacation templates
    #[command(subcommand)]
    Vacations(VacationCommand),

    /// Minimum-staffing templates
    #[command(subcommand)]
    Minimums(MinimumCommand),

    /// Employees
    #[command(subcommand)]
    Employees(ListCommand),

    /// Teams
    #[command(subcommand)]
    Teams(ListCommand),

    /// National public holidays of a year
    Holidays { year: i32 },
}

#[derive(Subcommand, Debug)]
pub enum CalendarCommand {
    List,

    /// Render a calendar as a table of abbreviated shift codes
    Show {
        id: String,
        /// Restrict to one month (1-12)
        #[arg(long)]
        month: Option<u32>,
        /// First day of the month range
        #[arg(long, requires = "month")]
        from: Option<u32>,
        /// Last day of the month range
        #[arg(long, requires = "month")]
        to: Option<u32>,
        /// Mark national holidays in the header
        #[arg(long)]
        holidays: bool,
    },

    /// Write a calendar's grid as CSV
    Export {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },

    /// Request generation of a new calendar
    Generate {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: String,
        /// Maximum solver duration
        #[arg(long)]
        max_duration: String,
        #[arg(long, default_value = "")]
        algorithm: String,
        #[arg(long)]
        team: Option<String>,
        /// First day (YYYY-MM-DD), default January 1st
        #[arg(long)]
        start: Option<chrono::NaiveDate>,
        /// Last day (YYYY-MM-DD), default December 31st
        #[arg(long)]
        end: Option<chrono::NaiveDate>,
        #[arg(long)]
        vacation_template: Option<String>,
        #[arg(long)]
        minimums: Option<String>,
    },

    /// Delete every stored calendar
    Clean {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RuleSetCommand {
    List,
    /// Rules the backend can evaluate
    Available,
    /// Create a rule set from a JSON draft file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum VacationCommand {
    List,
    /// Generate a random vacation template
    Random { name: String },
}

#[derive(Subcommand, Debug)]
pub enum MinimumCommand {
    List,
    Show { id: String },
    /// Upload a CSV file as a new template
    Import {
        name: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ClientConfig::resolve(&ConfigOverrides {
        config_path: args.config.clone(),
        base_url: args.base_url.clone(),
        stream_url: args.stream_url.clone(),
        log_level: args.log_level.clone(),
    });

    let default_directive: tracing_subscriber::filter::Directive = config
        .log_level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "smartask v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    debug!(base_url = %config.base_url, stream_url = %config.stream_url, "Configuration resolved");

    commands::run(args.command, &config).await
}
