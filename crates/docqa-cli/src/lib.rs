//! Terminal and HTTP surfaces for docqa

mod repl;
mod review;
mod server;
mod ui;


pub use repl::{run_chat, ReplCommand};
pub use review::{review_bytes, review_file};
pub use server::{router, serve, AppState};
pub use ui::{display_banner, handle_input_with_history, print_answer, print_help};

// Re-export core types
pub use docqa_core::{Error, Result};
