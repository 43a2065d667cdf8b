//! Keyword-based policy sentence reviewer

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use docqa_core::{Error, Result};

/// Obligation words the reviewer looks for, in reporting order
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "must",
    "should",
    "report",
    "ensure",
    "immediately",
    "required",
    "mandatory",
];

const SUGGEST_CLARIFY: &str = "Clarify responsibility or action";
const SUGGEST_COMPLIANCE: &str = "Check policy compliance";

/// One line of the document that contains at least one keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedSentence {
    pub sentence: String,
    pub keywords: Vec<String>,
    pub suggestion: String,
}

impl FlaggedSentence {
    /// Matched keywords as a single comma separated cell
    pub fn keywords_found(&self) -> String {
        self.keywords.join(", ")
    }
}

/// Reviewer holding one compiled whole-word matcher per keyword
#[derive(Debug, Clone)]
pub struct PolicyReviewer {
    matchers: Vec<(String, Regex)>,
}

impl PolicyReviewer {
    pub fn new() -> Self {
        // the default keywords are plain words, so compilation cannot fail
        Self::with_keywords(DEFAULT_KEYWORDS).unwrap_or_else(|_| Self {
            matchers: Vec::new(),
        })
    }

    /// Build a reviewer for a custom keyword list, matched case-insensitively
    /// as whole words in the given order
    pub fn with_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let matchers = keywords
            .iter()
            .map(|kw| {
                let kw = kw.as_ref().trim().to_lowercase();
                let pattern = format!(r"\b{}\b", regex::escape(&kw));
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (kw.clone(), re))
                    .map_err(|e| Error::InvalidInput(format!("bad keyword '{}': {}", kw, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { matchers })
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(|(kw, _)| kw.as_str())
    }

    /// Flag every non-empty line that contains a keyword, in line order
    pub fn analyze(&self, text: &str) -> Vec<FlaggedSentence> {
        text.split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.review_line(line))
            .collect()
    }

    fn review_line(&self, line: &str) -> Option<FlaggedSentence> {
        let hits: Vec<String> = self
            .matchers
            .iter()
            .filter(|(_, re)| re.is_match(line))
            .map(|(kw, _)| kw.clone())
            .collect();

        if hits.is_empty() {
            return None;
        }

        let suggestion = if hits.iter().any(|kw| kw == "should") {
            SUGGEST_CLARIFY
        } else {
            SUGGEST_COMPLIANCE
        };

        Some(FlaggedSentence {
            sentence: line.to_string(),
            keywords: hits,
            suggestion: suggestion.to_string(),
        })
    }
}

impl Default for PolicyReviewer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_and_must_ask_for_clarification() {
        let flagged = PolicyReviewer::new().analyze("Managers should and must sign off.");
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].keywords, vec!["must", "should"]);
        assert_eq!(flagged[0].suggestion, "Clarify responsibility or action");
    }

    #[test]
    fn test_report_only_checks_compliance() {
        let flagged = PolicyReviewer::new().analyze("Please REPORT outages.");
        assert_eq!(flagged[0].keywords_found(), "report");
        assert_eq!(flagged[0].suggestion, "Check policy compliance");
    }

    #[test]
    fn test_no_keywords_no_record() {
        assert!(PolicyReviewer::new().analyze("The office is painted blue.").is_empty());
    }

    #[test]
    fn test_whole_words_only() {
        let reviewer = PolicyReviewer::new();
        assert!(reviewer.analyze("Mustard, reporters and shoulders.").is_empty());
        assert_eq!(reviewer.analyze("must-have items")[0].keywords, vec!["must"]);
    }

    #[test]
    fn test_custom_keywords_are_escaped() {
        let reviewer = PolicyReviewer::with_keywords(&["Shall", "c++"]).unwrap();
        assert_eq!(reviewer.keywords().collect::<Vec<_>>(), vec!["shall", "c++"]);
        assert_eq!(reviewer.analyze("You SHALL comply.")[0].keywords, vec!["shall"]);
    }
}
