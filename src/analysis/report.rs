use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::Label;
use crate::storage::CommentStore;

const SAMPLE_SUMMARIES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelHistogram {
    pub excellent: usize,
    pub good: usize,
    pub neutral: usize,
    pub poor: usize,
    pub unclear: usize,
}

impl LabelHistogram {
    pub fn add(&mut self, label: Label) {
        match label {
            Label::Excellent => self.excellent += 1,
            Label::Good => self.good += 1,
            Label::Neutral => self.neutral += 1,
            Label::Poor => self.poor += 1,
            Label::Unclear => self.unclear += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.neutral + self.poor + self.unclear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub classifications: LabelHistogram,
    pub total: usize,
    pub sample_summaries: Vec<String>,
}

impl ResultSummary {
    // Missing classifications count as unclear. Unknown label strings are skipped.
    pub fn from_file(store: &CommentStore, path: &Path) -> Result<Self> {
        let rows: Vec<Value> = store.read_records_strict(path)?;
        Ok(Self::from_rows(&rows))
    }

    pub fn from_rows(rows: &[Value]) -> Self {
        let mut classifications = LabelHistogram::default();
        let mut sample_summaries = Vec::new();

        for row in rows {
            match row.get("classification") {
                None | Some(Value::Null) => classifications.add(Label::Unclear),
                Some(Value::String(s)) => {
                    if let Some(label) = Label::parse(s) {
                        classifications.add(label);
                    }
                }
                Some(_) => {}
            }

            if sample_summaries.len() < SAMPLE_SUMMARIES {
                let summary = row
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                sample_summaries.push(summary);
            }
        }

        Self {
            total: classifications.total(),
            classifications,
            sample_summaries,
        }
    }
}
