//! Interactive chat loop

use colored::*;
use std::path::{Path, PathBuf};
use tracing::warn;

use docqa_core::Result;
use docqa_rag::{RetrievalPipeline, Session};
use docqa_review::{export_report, DEFAULT_REPORT_PATH};

use crate::review::review_file;
use crate::ui::{
    display_banner, handle_input_with_history, print_answer, print_error, print_help,
    print_success,
};

/// One parsed line of interactive input
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Upload(PathBuf),
    Ask(String),
    Review { path: PathBuf, output: PathBuf },
    Status,
    Help,
    Exit,
    Empty,
    Usage(&'static str),
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return ReplCommand::Empty;
        }

        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        match word.to_lowercase().as_str() {
            "exit" | "quit" if rest.is_empty() => ReplCommand::Exit,
            "help" if rest.is_empty() => ReplCommand::Help,
            "status" if rest.is_empty() => ReplCommand::Status,
            "upload" if rest.is_empty() => ReplCommand::Usage("upload <path>"),
            "upload" => ReplCommand::Upload(PathBuf::from(rest)),
            "ask" if rest.is_empty() => ReplCommand::Usage("ask <question>"),
            "ask" => ReplCommand::Ask(rest.to_string()),
            "review" if rest.is_empty() => ReplCommand::Usage("review <path> [output.csv]"),
            "review" => {
                let (path, output) = match rest.rsplit_once(char::is_whitespace) {
                    Some((path, output)) if output.to_lowercase().ends_with(".csv") => {
                        (path.trim(), output)
                    }
                    _ => (rest, DEFAULT_REPORT_PATH),
                };
                ReplCommand::Review {
                    path: PathBuf::from(path),
                    output: PathBuf::from(output),
                }
            }
            _ => ReplCommand::Ask(input.to_string()),
        }
    }
}

/// Run the interactive loop until the user exits
pub async fn run_chat(pipeline: &RetrievalPipeline, session: &mut Session) -> Result<()> {
    display_banner(pipeline.speech());

    let mut history = Vec::new();
    loop {
        let input = handle_input_with_history(&mut history).await?;

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => {
                println!("{}", "Goodbye!".green());
                break;
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Usage(usage) => println!("{} {}", "Usage:".yellow(), usage),
            ReplCommand::Status => print_status(session),
            ReplCommand::Upload(path) => upload(pipeline, session, &path).await,
            ReplCommand::Ask(question) => {
                println!("{}", "Searching the document...".blue());
                match pipeline.answer(&*session, &question).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => print_error(&e.to_string()),
                }
            }
            ReplCommand::Review { path, output } => review(pipeline, &path, &output).await,
        }
    }

    Ok(())
}

async fn upload(pipeline: &RetrievalPipeline, session: &mut Session, path: &Path) {
    println!("{} {}", "Indexing".blue(), path.display());
    match pipeline.ingest_file(session, path).await {
        Ok(report) => {
            print_success(&report.summary());
            if report.chunks_failed > 0 {
                println!(
                    "{}",
                    format!("{} chunk(s) could not be indexed and were skipped.", report.chunks_failed)
                        .yellow()
                );
            }
        }
        Err(e) => print_error(&e.to_string()),
    }
}

async fn review(pipeline: &RetrievalPipeline, path: &Path, output: &Path) {
    let extractor = pipeline.extractor().clone();
    let owned = path.to_path_buf();
    let reviewed = tokio::task::spawn_blocking(move || review_file(extractor.as_ref(), &owned)).await;

    let records = match reviewed {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return print_error(&e.to_string()),
        Err(e) => {
            warn!(error = %e, "review task failed");
            return print_error("Review failed. Check logs.");
        }
    };

    match export_report(&records, output) {
        Ok(()) => print_success(&format!(
            "Flagged {} sentence(s). Report saved to {}.",
            records.len(),
            output.display()
        )),
        Err(e) => print_error(&e.to_string()),
    }
}

fn print_status(session: &Session) {
    match (session.source(), session.loaded_at()) {
        (Some(source), Some(at)) => println!(
            "{} '{}' ({} chunks, indexed {})",
            "Loaded:".green(),
            source,
            session.chunk_count(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        _ => println!("{}", "No document loaded.".yellow()),
    }
}
