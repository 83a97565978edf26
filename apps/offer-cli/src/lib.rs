//! # offer-cli: the `offer-desk` binary
//!
//! Command line front end for offer completion and article number
//! allocation.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Parse arguments (clap)                                             │
//! │  2. Initialize tracing (stderr, RUST_LOG aware)                        │
//! │  3. Load DeskConfig (file → env → validate)                            │
//! │  4. Apply command line overrides                                       │
//! │  5. Run the subcommand                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod config;
pub mod error;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so completed records can be piped from stdout.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug logs
/// - `RUST_LOG=offer_store=trace` - Trace for the counter store only
/// - Default: INFO, DEBUG for offer crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,offer=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
