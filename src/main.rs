use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use remedyrag::answer::{Answerer, prepare_query};
use remedyrag::config::{Config, EmbeddingProvider};
use remedyrag::embedder::{self, Embedder, download};
use remedyrag::generator::openai::OpenAiChat;
use remedyrag::index::{SqliteVecIndex, VectorIndex};
use remedyrag::ingest::core::Ingestor;
use remedyrag::secrets;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remedyrag", version, about = "Answer symptom questions from a local home-remedy index")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = remedyrag::config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a JSONL remedy file into the index
    Ingest {
        /// Line-delimited JSON file, one remedy per line
        file: PathBuf,
        /// Empty the index before ingesting
        #[arg(long)]
        reset: bool,
    },
    /// Answer a question from the indexed remedies
    Ask {
        question: String,
        /// Override the number of retrieved matches
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the assembled prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,
    },
    /// Download the embedding model files
    DownloadModel,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Command::Ingest { file, reset } => run_ingest(&config, &file, reset),
        Command::Ask {
            question,
            top_k,
            dry_run,
        } => run_ask(&config, &question, top_k, dry_run),
        Command::DownloadModel => {
            anyhow::ensure!(
                config.embedding.provider == EmbeddingProvider::Onnx,
                "the configured embedding provider does not use model files"
            );
            download::download_model_files(
                &config.embedding.model_name,
                &config.embedding.model_dir(),
            )
        }
    }
}

fn open_index(config: &Config) -> Result<SqliteVecIndex> {
    let embedder: Arc<dyn Embedder> = Arc::from(embedder::from_config(&config.embedding)?);
    SqliteVecIndex::open(config.index_path(), embedder)
        .with_context(|| format!("failed to open index at {}", config.index_dir))
}

fn run_ingest(config: &Config, file: &Path, reset: bool) -> Result<()> {
    let mut index = open_index(config)?;
    if reset {
        index.clear()?;
    }

    let result = Ingestor::new(&mut index, config.ingest_batch_size).ingest_file(file)?;

    println!(
        "indexed {} of {} lines ({} malformed, {} incomplete); index now holds {} documents",
        result.indexed,
        result.lines,
        result.malformed,
        result.incomplete,
        index.len()?
    );
    Ok(())
}

fn run_ask(config: &Config, question: &str, top_k: Option<usize>, dry_run: bool) -> Result<()> {
    let top_k = top_k.unwrap_or(config.top_k);
    anyhow::ensure!(top_k > 0, "--top-k must be positive");

    // A missing credential fails before the index is opened.
    let generator = if dry_run {
        None
    } else {
        let api_key = secrets::load_from_env(
            &config.generation.secrets_path_env,
            &config.generation.api_key_name,
        )?;
        Some(OpenAiChat::new(&config.generation, api_key)?)
    };

    let index = open_index(config)?;

    match generator {
        None => {
            let prepared = prepare_query(&index, question, top_k)?;
            println!("{}", prepared.prompt);
        }
        Some(generator) => {
            info!(model = generator.model(), top_k, "Answering question");
            let answer = Answerer::new(&index, &generator, top_k).answer(question)?;
            println!("{answer}");
        }
    }
    Ok(())
}
