//! Terminal output and line input for the interactive session

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docqa_core::{Answer, Result, SpeechCapability};

const PROMPT: &str = "docqa>";

/// Display startup banner
pub fn display_banner(speech: &SpeechCapability) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(60, terminal_width.saturating_sub(4)).max(40);
    let inner = banner_width - 2;

    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "docqa - Document Question Answering";
    println!(
        "{}{}{}{}",
        "│  ".blue(),
        title.blue().bold(),
        " ".repeat(inner.saturating_sub(title.chars().count() + 2)),
        "│".blue()
    );
    println!("{}", empty_line.blue());

    let speech_line = if speech.is_available() {
        "Spoken answers: on".to_string()
    } else {
        "Spoken answers: off".to_string()
    };
    let lines = [
        "Upload a PDF, DOCX or TXT file and ask about it.",
        "Review a policy for obligation keywords.",
        "",
        speech_line.as_str(),
    ];
    for line in lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            let padding = " ".repeat(inner.saturating_sub(line.chars().count() + 2));
            println!("{}", format!("│  {}{}│", line, padding).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!("{}", "Tip: 'upload <path>' first, then type your question. 'help' lists commands.".dimmed());
    println!();
}

/// Restores cooked mode however the input loop exits
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn redraw(input: &str) -> Result<()> {
    print!("\r{} {}\x1b[K", PROMPT.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

fn byte_offset(input: &str, chars: usize) -> usize {
    input
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// Read one line, with ↑/↓ history when attached to a terminal
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // end of piped input
            return Ok("exit".to_string());
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    let raw = RawMode::enable()?;
    let mut input = String::new();
    let mut history_index: Option<usize> = None;
    let mut cursor = 0usize;

    redraw(&input)?;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                drop(raw);
                println!();
                return Ok("exit".to_string());
            }
            KeyCode::Enter => {
                drop(raw);
                println!();
                let line = input.trim().to_string();
                if !line.is_empty() {
                    history.push(line.clone());
                }
                return Ok(line);
            }
            KeyCode::Char(c) => {
                input.insert(byte_offset(&input, cursor), c);
                cursor += 1;
            }
            KeyCode::Backspace if cursor > 0 => {
                cursor -= 1;
                input.remove(byte_offset(&input, cursor));
            }
            KeyCode::Left if cursor > 0 => cursor -= 1,
            KeyCode::Right if cursor < input.chars().count() => cursor += 1,
            KeyCode::Up if !history.is_empty() => {
                let idx = match history_index {
                    None => history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                history_index = Some(idx);
                input = history[idx].clone();
                cursor = input.chars().count();
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    cursor = input.chars().count();
                }
            }
            KeyCode::Esc => {
                drop(raw);
                println!();
                return Ok(String::new());
            }
            _ => continue,
        }

        redraw(&input)?;
        let back = input.chars().count() - cursor;
        if back > 0 {
            print!("\x1b[{}D", back);
            io::stdout().flush()?;
        }
    }
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Extract, chunk and index a document", "upload <path>".green());
    println!("  {} - Ask about the indexed document", "ask <question>".green());
    println!("  {} - Flag obligation keywords and write a CSV report", "review <path> [output.csv]".green());
    println!("  {} - Show the loaded document", "status".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Anything else is treated as a question.".dimmed());
    println!();
    println!("{}", "Examples:".bold());
    println!("  upload ./handbook.pdf");
    println!("  Who must staff report incidents to?");
    println!("  review ./handbook.docx review_report.csv");
}

/// Print an answer with its supporting chunks
pub fn print_answer(answer: &Answer) {
    println!();
    println!("{} {}", "Answer:".green().bold(), answer.text);
    if let Some(audio) = &answer.audio {
        println!("{} {}", "Audio:".cyan(), audio.display());
    }
    if !answer.sources.is_empty() {
        println!("{}", format!("Context from {} chunk(s).", answer.sources.len()).dimmed());
    }
    println!();
}

pub fn print_error(message: &str) {
    println!("{} {}", "Error:".red().bold(), message);
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
