//! The `fiscal` command-line application.
//!
//! Loads [`config::FiscalConfig`], wires the stores, encoder, extractor and
//! answer generator together, and dispatches the subcommands defined in
//! [`cli`].

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{init_logging, run};
pub use cli::CliArgs;
pub use config::FiscalConfig;
