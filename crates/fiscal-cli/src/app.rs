//! The `fiscal` application: logging, component wiring, and command
//! dispatch.

use fiscal_core::llm::{LlmProvider, create_provider};
use fiscal_core::{Error, Result};
use fiscal_extract::{Ingestor, InvoiceExtractor, KeywordClassifier};
use fiscal_rag::{AnswerGenerator, AnswerResult};
use fiscal_store::Database;
use fiscal_vector::{EntityEmbeddingStore, LlmDigestEncoder};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command, ConfigAction, Method};
use crate::config::FiscalConfig;
use crate::config_handlers;

/// Initialise tracing-based logging.
///
/// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity
/// flags. Library crates log through `log`; the subscriber picks those
/// records up as well.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The wired components behind the data commands.
struct Services {
    db: Database,
    generator: AnswerGenerator,
    ingestor: Ingestor,
}

impl Services {
    async fn connect(config: &FiscalConfig) -> Result<Self> {
        let llm = create_provider(&config.llm)?;
        Self::with_provider(config, llm).await
    }

    async fn with_provider(config: &FiscalConfig, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let db = Database::connect(&config.database).await?;

        let encoder = LlmDigestEncoder::new(llm.clone(), config.embedding.dimension)
            .with_summary_max_tokens(config.embedding.summary_max_tokens);
        let embeddings = EntityEmbeddingStore::new(db.pool().clone(), Arc::new(encoder)).await?;

        let generator =
            AnswerGenerator::new(db.clone(), embeddings.clone(), llm.clone(), &config.embedding)
                .with_llm_config(&config.llm);
        let extractor =
            InvoiceExtractor::new(llm, &config.extraction).with_llm_config(&config.llm);
        let ingestor = Ingestor::new(extractor, db.clone(), embeddings);

        Ok(Self {
            db,
            generator,
            ingestor,
        })
    }
}

/// Run one parsed command line.
pub async fn run(args: CliArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let config_path = args.config.as_deref();
    match args.command {
        Command::Config(config_cmd) => {
            config_handlers::handle_config_command(config_path, config_cmd.command)
        }
        Command::Categories => {
            let config = FiscalConfig::load(config_path)?;
            let classifier = KeywordClassifier::new(&config.extraction);
            print_json(&classifier.categories())
        }
        command => {
            let config = FiscalConfig::load(config_path)?;
            let services = Services::connect(&config).await?;
            run_data_command(&services, command).await
        }
    }
}

async fn run_data_command(services: &Services, command: Command) -> Result<()> {
    match command {
        Command::Ingest { file } => {
            let text = read_input(&file).await?;
            let report = services.ingestor.ingest_text(&text).await?;
            tracing::info!(
                movement = report.outcome.movement_id,
                created = report.outcome.created.len(),
                "invoice ingested"
            );
            print_json(&report)
        }
        Command::Ask { question, method } => {
            let result: AnswerResult = match method {
                Method::Simple => services.generator.answer_simple(&question).await?,
                Method::Embeddings => services.generator.answer_with_embeddings(&question).await?,
            };
            print_json(&result)
        }
        Command::Rebuild => {
            let count = services.generator.rebuild_all().await?;
            tracing::info!(count, "embeddings rebuilt");
            println!("{count}");
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(Error::invalid_data(
                    "reset deletes every stored invoice; pass --yes to confirm",
                ));
            }
            services.generator.reset_all().await?;
            services.db.reset_all().await?;
            tracing::info!("all data removed");
            Ok(())
        }
        Command::Categories | Command::Config(_) => Ok(()),
    }
}

async fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        Ok(tokio::fs::read_to_string(file).await?)
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
