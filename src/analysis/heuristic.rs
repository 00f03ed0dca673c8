use async_trait::async_trait;

use crate::analysis::strategy::AnalyzerStrategy;
use crate::error::Result;
use crate::models::Label;

// Chinese keywords match anywhere in the text.
const POSITIVE_WORDS: &[&str] = &[
    "好", "棒", "优秀", "喜欢", "赞", "精彩", "完美", "满意", "支持", "厉害",
];

const NEGATIVE_WORDS: &[&str] = &[
    "差", "糟糕", "垃圾", "失望", "讨厌", "不满", "反对", "无聊", "错误", "失败",
];

// English keywords only match whole words.
const POSITIVE_WORDS_EN: &[&str] = &[
    "good", "great", "excellent", "love", "awesome", "amazing", "perfect", "nice",
];

const NEGATIVE_WORDS_EN: &[&str] = &[
    "bad", "terrible", "awful", "boring", "hate", "disappointed", "worst", "wrong",
];

fn count_keywords(lower: &str, words: &[&str], english: &[&str]) -> usize {
    let mut tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.dedup();

    let substring_hits = words.iter().filter(|w| lower.contains(*w)).count();
    let word_hits = english.iter().filter(|w| tokens.contains(*w)).count();
    substring_hits + word_hits
}

#[derive(Debug, Clone)]
pub struct LocalAnalyzer {
    max_length: usize,
}

impl LocalAnalyzer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn summarize_one(&self, text: &str) -> String {
        if text.chars().count() <= self.max_length {
            return text.to_string();
        }
        let mut summary: String = text.chars().take(self.max_length).collect();
        summary.push_str("...");
        summary
    }

    pub fn classify_one(&self, text: &str) -> Label {
        let lower = text.to_lowercase();
        let positive = count_keywords(&lower, POSITIVE_WORDS, POSITIVE_WORDS_EN);
        let negative = count_keywords(&lower, NEGATIVE_WORDS, NEGATIVE_WORDS_EN);

        if positive > negative {
            if positive >= 2 {
                Label::Excellent
            } else {
                Label::Good
            }
        } else if negative > positive {
            Label::Poor
        } else {
            Label::Neutral
        }
    }

    pub fn summarize_all(&self, batch: &[String]) -> Vec<String> {
        batch.iter().map(|t| self.summarize_one(t)).collect()
    }

    pub fn classify_all(&self, batch: &[String]) -> Vec<Label> {
        batch.iter().map(|t| self.classify_one(t)).collect()
    }
}

impl Default for LocalAnalyzer {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl AnalyzerStrategy for LocalAnalyzer {
    async fn summarize(&self, batch: &[String]) -> Result<Vec<String>> {
        Ok(self.summarize_all(batch))
    }

    async fn classify(&self, batch: &[String]) -> Result<Vec<Label>> {
        Ok(self.classify_all(batch))
    }

    fn name(&self) -> &str {
        "local"
    }
}
