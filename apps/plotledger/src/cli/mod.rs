//! # PlotLedger CLI Module
//!
//! This module implements the CLI interface for PlotLedger.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show ledger status
//! - `register-plot` - Register a new plot
//! - `schedule` - Create a plot's payment schedule
//! - `pay` - Record a payment against an installment
//! - `progress` - Show a plot's derived payment progress
//! - `documents` - Show a plot's document board
//! - `sweep` - Run the overdue sweep
//! - `cases` - List legal cases
//! - `audit` - Show recent audit entries
//! - `init` - Initialize new database

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use plotledger_core::LedgerError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// PlotLedger - Plot Sales Management Server
///
/// A deterministic plot-sales ledger: payment schedules, milestone
/// documents and legal cases, derived fresh from stored records.
#[derive(Parser, Debug)]
#[command(name = "plotledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the ledger database
    #[arg(short = 'D', long, global = true, default_value = "plotledger.redb")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Optional TOML config file with host/port/database overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show ledger status
    Status,

    /// Register a new plot
    RegisterPlot {
        /// Human-facing plot number, e.g. "HG-1-042"
        #[arg(short, long)]
        number: String,

        /// Plot area, e.g. "10 marla"
        #[arg(short, long)]
        area: String,

        /// Location within the development
        #[arg(short, long)]
        location: String,

        /// Total sale value in whole rupees
        #[arg(short = 'V', long)]
        value: i64,

        /// Registration date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Create a plot's payment schedule
    Schedule {
        /// Plot id
        #[arg(short, long)]
        plot: u64,

        /// Total obligation in whole rupees
        #[arg(short, long)]
        total: i64,

        /// Down payment in whole rupees
        #[arg(short, long, default_value = "0")]
        down: i64,

        /// Installment as "amount:YYYY-MM-DD" (repeatable)
        #[arg(short, long = "installment")]
        installments: Vec<String>,

        /// Creation date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record a payment against an installment
    Pay {
        /// Installment id
        #[arg(short, long)]
        installment: u64,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Optional receipt reference
        #[arg(short, long)]
        receipt: Option<String>,
    },

    /// Show a plot's derived payment progress
    Progress {
        /// Plot id
        #[arg(short, long)]
        plot: u64,
    },

    /// Show a plot's document board
    Documents {
        /// Plot id
        #[arg(short, long)]
        plot: u64,
    },

    /// Run the overdue sweep across every schedule
    Sweep {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List legal cases
    Cases,

    /// Show recent audit entries, newest first
    Audit {
        /// Maximum number of entries
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LedgerError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port, config }) => {
            cmd_server(&cli.database, backend, &host, port, config.as_deref()).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::RegisterPlot {
            number,
            area,
            location,
            value,
            date,
        }) => cmd_register_plot(
            &cli.database,
            backend,
            json_mode,
            &number,
            &area,
            &location,
            value,
            date,
        ),
        Some(Commands::Schedule {
            plot,
            total,
            down,
            installments,
            date,
        }) => cmd_schedule(
            &cli.database,
            backend,
            json_mode,
            plot,
            total,
            down,
            &installments,
            date,
        ),
        Some(Commands::Pay {
            installment,
            date,
            receipt,
        }) => cmd_pay(&cli.database, backend, json_mode, installment, date, receipt),
        Some(Commands::Progress { plot }) => cmd_progress(&cli.database, backend, json_mode, plot),
        Some(Commands::Documents { plot }) => {
            cmd_documents(&cli.database, backend, json_mode, plot)
        }
        Some(Commands::Sweep { date }) => cmd_sweep(&cli.database, backend, json_mode, date),
        Some(Commands::Cases) => cmd_cases(&cli.database, backend, json_mode),
        Some(Commands::Audit { limit }) => cmd_audit(&cli.database, backend, json_mode, limit),
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, backend, json_mode)
        }
    }
}
