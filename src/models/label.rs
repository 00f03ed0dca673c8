use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[serde(alias = "优")]
    Excellent,
    #[serde(alias = "良")]
    Good,
    #[serde(alias = "中")]
    Neutral,
    #[serde(alias = "差")]
    Poor,
    #[serde(alias = "不明意义")]
    Unclear,
}

// Checked in order against the start of a model output line.
const PREFIX_ALIASES: &[(&str, Label)] = &[
    ("不明意义", Label::Unclear),
    ("不明", Label::Unclear),
    ("excellent", Label::Excellent),
    ("neutral", Label::Neutral),
    ("unclear", Label::Unclear),
    ("good", Label::Good),
    ("poor", Label::Poor),
    ("优", Label::Excellent),
    ("良", Label::Good),
    ("中", Label::Neutral),
    ("差", Label::Poor),
];

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Excellent => "excellent",
            Label::Good => "good",
            Label::Neutral => "neutral",
            Label::Poor => "poor",
            Label::Unclear => "unclear",
        }
    }

    pub fn parse(value: &str) -> Option<Label> {
        match value.trim().to_lowercase().as_str() {
            "excellent" | "优" => Some(Label::Excellent),
            "good" | "良" => Some(Label::Good),
            "neutral" | "中" => Some(Label::Neutral),
            "poor" | "差" => Some(Label::Poor),
            "unclear" | "不明意义" => Some(Label::Unclear),
            _ => None,
        }
    }

    // Lenient: "优（非常正面）" and "Good - positive" both map, anything else is unclear.
    pub fn from_model_output(line: &str) -> Label {
        let normalized = line
            .trim()
            .trim_start_matches(|c: char| c == '*' || c == '-' || c.is_whitespace())
            .to_lowercase();

        PREFIX_ALIASES
            .iter()
            .find(|(alias, _)| normalized.starts_with(alias))
            .map(|(_, label)| *label)
            .unwrap_or(Label::Unclear)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
