//! # PlotLedger - Plot Sales Management Server
//!
//! The main binary for the PlotLedger deterministic plot-sales ledger.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for ledger operations
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! plotledger server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! plotledger status
//! plotledger register-plot -n HG-1-042 -a "10 marla" -l "Phase 1" -V 2000000
//! plotledger pay -i 3 --date 2024-03-01
//! ```

use clap::Parser;
use plotledger::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments first; --verbose feeds the log filter default.
    let cli = cli::Cli::parse();

    // Initialize tracing — PLOTLEDGER_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("PLOTLEDGER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_log_filter(cli.verbose).into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Default log filter when RUST_LOG is unset. --verbose raises the
/// application level to debug.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "plotledger=debug,tower_http=debug"
    } else {
        "plotledger=info,tower_http=debug"
    }
}

/// Print the PlotLedger startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ██╗      ██████╗ ████████╗██╗     ███████╗██████╗
  ██╔══██╗██║     ██╔═══██╗╚══██╔══╝██║     ██╔════╝██╔══██╗
  ██████╔╝██║     ██║   ██║   ██║   ██║     █████╗  ██║  ██║
  ██╔═══╝ ██║     ██║   ██║   ██║   ██║     ██╔══╝  ██║  ██║
  ██║     ███████╗╚██████╔╝   ██║   ███████╗███████╗██████╔╝
  ╚═╝     ╚══════╝ ╚═════╝    ╚═╝   ╚══════╝╚══════╝╚═════╝

  Plot Sales Management Server v{}

  Deterministic • Auditable • Integer-only
"#,
        env!("CARGO_PKG_VERSION")
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_raises_default_filter_to_debug() {
        assert!(default_log_filter(true).contains("plotledger=debug"));
        assert!(default_log_filter(false).contains("plotledger=info"));
    }
}
