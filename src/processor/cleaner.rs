use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::models::CommentRecord;
use crate::storage::CommentStore;

// Cleaned texts this short or shorter are dropped.
pub const MIN_CLEANED_CHARS: usize = 5;

const REPEAT_THRESHOLD: usize = 5;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"https?://\S+").unwrap();

    // CJK ideographs, ASCII alphanumerics, whitespace and a small punctuation set
    static ref DISALLOWED_REGEX: Regex =
        Regex::new(r#"[^\x{4e00}-\x{9fa5}a-zA-Z0-9\s，。！？；：（）"']"#).unwrap();
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub output_path: PathBuf,
    pub cleaned_count: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct CommentCleaner {
    min_chars: usize,
}

impl CommentCleaner {
    pub fn new() -> Self {
        Self {
            min_chars: MIN_CLEANED_CHARS,
        }
    }

    pub fn clean_text(&self, text: &str) -> String {
        let text = URL_REGEX.replace_all(text, "");
        let text = DISALLOWED_REGEX.replace_all(&text, "");
        let text = collapse_repeats(&text);
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn clean_record(&self, mut record: CommentRecord) -> Option<CommentRecord> {
        let cleaned = self.clean_text(&record.text);
        if cleaned.chars().count() <= self.min_chars {
            return None;
        }
        record.cleaned_text = Some(cleaned);
        Some(record)
    }

    pub fn clean_records(&self, records: Vec<CommentRecord>) -> Vec<CommentRecord> {
        records
            .into_iter()
            .filter_map(|r| self.clean_record(r))
            .collect()
    }

    pub fn process_file(&self, store: &CommentStore, input: &Path) -> Result<CleanOutcome> {
        let outcome = store.read_records::<CommentRecord>(input)?;
        let total = outcome.records.len();
        let cleaned = self.clean_records(outcome.records);

        let output_path = CommentStore::derived_path(input, "_cleaned");
        let cleaned_count = store.write_records(&output_path, &cleaned)?;

        tracing::info!(
            "Cleaned {} -> {} comment(s), {} dropped, {} malformed",
            total,
            cleaned_count,
            total - cleaned_count,
            outcome.skipped
        );

        Ok(CleanOutcome {
            output_path,
            cleaned_count,
            skipped: outcome.skipped,
        })
    }
}

impl Default for CommentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let keep = if run >= REPEAT_THRESHOLD { 1 } else { run };
        for _ in 0..keep {
            out.push(c);
        }
    }

    out
}
