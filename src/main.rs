use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_backends::{InferenceClient, InferenceConfig, PiperConfig, PiperSynthesizer};
use docqa_cli::{print_answer, review_file, run_chat, serve, AppState};
use docqa_core::{PipelineConfig, SpeechCapability};
use docqa_extract::DocumentExtractor;
use docqa_rag::{RetrievalPipeline, Session};
use docqa_review::{export_report, DEFAULT_REPORT_PATH};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a document and review it for policy keywords", long_about = None)]
struct Cli {
    /// Base URL of the embedding server (overrides DOCQA_EMBED_URL)
    #[arg(long, global = true)]
    embed_url: Option<String>,

    /// Base URL of the completion server (overrides DOCQA_LLM_URL)
    #[arg(long, global = true)]
    llm_url: Option<String>,

    /// Never synthesize spoken answers
    #[arg(long, global = true)]
    no_speech: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Interactive session (default)
    Chat,
    /// Index one file and answer one question
    Ask {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        question: String,
    },
    /// Flag obligation keywords and write a CSV report
    Review {
        path: PathBuf,
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // reviewing needs no model backends
    if let Commands::Review { path, output } = command {
        return review(&path, &output);
    }

    let inference = InferenceConfig::from_env()?
        .with_urls(cli.embed_url, cli.llm_url)
        .context("invalid backend configuration")?;
    let pipeline_config = PipelineConfig::from_env()?;

    let speech = if cli.no_speech {
        SpeechCapability::unavailable("disabled with --no-speech")
    } else {
        PiperSynthesizer::resolve(PiperConfig::from_env())
    };

    let client = Arc::new(InferenceClient::new(inference)?);
    let pipeline = RetrievalPipeline::new(client.clone(), client)
        .with_config(pipeline_config)
        .with_speech(speech);
    let mut session: Session = pipeline.new_session()?;
    info!(speech = ?pipeline.speech(), "pipeline ready");

    match command {
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", host, port))?;
            println!("{} http://{}", "Serving docqa on".green(), addr);
            serve(AppState::new(Arc::new(pipeline), session), addr).await?;
        }
        Commands::Chat => run_chat(&pipeline, &mut session).await?,
        Commands::Ask { file, question } => {
            let report = pipeline.ingest_file(&mut session, &file).await?;
            println!("{} {}", "✓".green(), report.summary());
            let answer = pipeline.answer(&session, &question).await?;
            print_answer(&answer);
        }
        Commands::Review { .. } => {}
    }

    Ok(())
}

fn review(path: &Path, output: &Path) -> Result<()> {
    let extractor = DocumentExtractor::new();
    let records = review_file(&extractor, path)?;
    export_report(&records, output)?;
    println!(
        "{} Flagged {} sentence(s). Report saved to {}.",
        "✓".green(),
        records.len(),
        output.display()
    );
    Ok(())
}
