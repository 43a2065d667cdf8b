//! Sentence-aligned text chunking

use regex::Regex;
use std::sync::LazyLock;

/// Default word budget per chunk
pub const DEFAULT_MAX_TOKENS: usize = 500;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex is valid"));

/// Split `text` into sentences ending at `.`, `!` or `?` followed by
/// whitespace. The punctuation stays with its sentence; the whitespace run
/// between sentences is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // the terminator is a single ASCII byte
        let end = m.start() + 1;
        sentences.push(&text[start..end]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Split `text` into chunks of whole sentences holding at most `max_tokens`
/// whitespace-delimited words each.
///
/// A sentence is never split: one that alone exceeds the budget becomes its
/// own oversized chunk. No returned chunk is empty.
pub fn split_text(text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0;

    for sentence in split_sentences(text) {
        let sentence_words = sentence.split_whitespace().count();

        if current_words + sentence_words > max_tokens && !current.is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_words = 0;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
        current_words += sentence_words;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_boundaries() {
        let sentences = split_sentences("Stop! Is it safe?  Yes.\nv1.2 is out. done");
        assert_eq!(
            sentences,
            vec!["Stop!", "Is it safe?", "Yes.", "v1.2 is out.", "done"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(split_text("", 10).is_empty());
        assert!(split_text("   \n\t ", 10).is_empty());
    }

    #[test]
    fn test_accumulates_until_budget() {
        let text = "One two three. Four five. Six seven eight nine. Ten.";
        let chunks = split_text(text, 5);
        assert_eq!(
            chunks,
            vec!["One two three. Four five.", "Six seven eight nine. Ten."]
        );
    }

    #[test]
    fn test_budget_is_inclusive() {
        let chunks = split_text("a b. c d.", 4);
        assert_eq!(chunks, vec!["a b. c d."]);
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long = "one two three four five six seven.";
        let text = format!("{} Short one.", long);
        let chunks = split_text(&text, 3);
        assert_eq!(chunks, vec![long.to_string(), "Short one.".to_string()]);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_chunks_reconstruct_sentences() {
        let text = "Alpha beta. Gamma delta epsilon! Zeta? Eta theta iota kappa. Lambda.";
        let chunks = split_text(text, 4);

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| split_sentences(c)).collect();
        assert_eq!(rejoined, split_sentences(text));

        for chunk in &chunks {
            let words = chunk.split_whitespace().count();
            let single_sentence = split_sentences(chunk).len() == 1;
            assert!(words <= 4 || single_sentence, "chunk over budget: {chunk}");
        }
    }
}
