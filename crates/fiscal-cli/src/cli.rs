//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Invoice ingestion and question answering over stored invoices.
#[derive(Parser, Debug)]
#[command(name = "fiscal", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "FISCAL_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract an invoice from its text, store it, and embed new entities.
    Ingest {
        /// File holding the invoice text, or `-` for stdin.
        file: String,
    },

    /// Answer a question about the stored invoices.
    Ask {
        /// The question.
        question: String,

        /// Retrieval strategy.
        #[arg(short, long, value_enum, default_value_t = Method::Embeddings)]
        method: Method,
    },

    /// Re-derive every embedding from the current relational rows.
    Rebuild,

    /// Delete every embedding and every relational row.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// List the expense categories.
    Categories,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Retrieval strategy for `ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Send the whole dataset as context.
    Simple,
    /// Send only the top-k most similar entities as context.
    Embeddings,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_defaults_to_embeddings() {
        let args = CliArgs::try_parse_from(["fiscal", "ask", "quem é 222"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Ask { ref question, method: Method::Embeddings } if question == "quem é 222"
        ));
    }

    #[test]
    fn test_parse_ask_simple() {
        let args =
            CliArgs::try_parse_from(["fiscal", "-v", "ask", "total?", "--method", "simple"])
                .unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Ask {
                method: Method::Simple,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_reset_requires_flag_value() {
        let args = CliArgs::try_parse_from(["fiscal", "reset"]).unwrap();
        assert!(matches!(args.command, Command::Reset { yes: false }));
        let args = CliArgs::try_parse_from(["fiscal", "reset", "--yes"]).unwrap();
        assert!(matches!(args.command, Command::Reset { yes: true }));
    }

    #[test]
    fn test_parse_config_show() {
        let args =
            CliArgs::try_parse_from(["fiscal", "--config", "/tmp/f.toml", "config", "show"])
                .unwrap();
        assert_eq!(args.config.as_deref(), Some("/tmp/f.toml"));
        assert!(matches!(
            args.command,
            Command::Config(ConfigCommand {
                command: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(CliArgs::try_parse_from(["fiscal"]).is_err());
    }
}
