use serde::{Deserialize, Serialize};

use super::label::Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub likes: u64,
    // unix seconds
    #[serde(rename = "time", default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Label>,
}

impl CommentRecord {
    pub fn raw(
        id: impl Into<String>,
        text: impl Into<String>,
        user: impl Into<String>,
        likes: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            user: user.into(),
            likes,
            timestamp,
            cleaned_text: None,
            summary: None,
            classification: None,
        }
    }

    pub fn analysis_text(&self) -> &str {
        self.cleaned_text.as_deref().unwrap_or("")
    }
}
