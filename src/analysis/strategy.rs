use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::heuristic::LocalAnalyzer;
use crate::config::{EndpointConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::llm::parser::{fit_to_batch, parse_labels, parse_numbered_list};
use crate::llm::{BatchPrompt, ClaudeProvider, LLMProvider, OpenAIProvider};
use crate::models::Label;

#[async_trait]
pub trait AnalyzerStrategy: Send + Sync {
    async fn summarize(&self, batch: &[String]) -> Result<Vec<String>>;
    async fn classify(&self, batch: &[String]) -> Result<Vec<Label>>;

    fn batch_pause(&self) -> Duration {
        Duration::ZERO
    }

    fn name(&self) -> &str;
}

pub struct RemoteAnalyzer {
    provider: Arc<dyn LLMProvider>,
    fallback: LocalAnalyzer,
    max_length: usize,
    pause: Duration,
}

impl RemoteAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, max_length: usize, pause: Duration) -> Self {
        Self {
            provider,
            fallback: LocalAnalyzer::new(max_length),
            max_length,
            pause,
        }
    }

    pub async fn attempt_summarize(&self, batch: &[String]) -> Result<Vec<String>> {
        let request = BatchPrompt::summarize(batch, self.max_length).to_request();
        let response = self.provider.complete(request).await?;
        let parsed = parse_numbered_list(&response)?;
        if parsed.len() != batch.len() {
            tracing::debug!(
                "{} returned {} summaries for {} comments",
                self.provider.name(),
                parsed.len(),
                batch.len()
            );
        }
        Ok(fit_to_batch(parsed, batch.len(), |i| {
            self.fallback.summarize_one(&batch[i])
        }))
    }

    pub async fn attempt_classify(&self, batch: &[String]) -> Result<Vec<Label>> {
        let request = BatchPrompt::classify(batch).to_request();
        let response = self.provider.complete(request).await?;
        let parsed = parse_labels(&response)?;
        Ok(fit_to_batch(parsed, batch.len(), |i| {
            self.fallback.classify_one(&batch[i])
        }))
    }
}

#[async_trait]
impl AnalyzerStrategy for RemoteAnalyzer {
    async fn summarize(&self, batch: &[String]) -> Result<Vec<String>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        match self.attempt_summarize(batch).await {
            Ok(summaries) => Ok(summaries),
            Err(e) => {
                tracing::warn!(
                    "{} summarization failed, using local heuristic: {}",
                    self.provider.name(),
                    e
                );
                Ok(self.fallback.summarize_all(batch))
            }
        }
    }

    async fn classify(&self, batch: &[String]) -> Result<Vec<Label>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        match self.attempt_classify(batch).await {
            Ok(labels) => Ok(labels),
            Err(e) => {
                tracing::warn!(
                    "{} classification failed, using local heuristic: {}",
                    self.provider.name(),
                    e
                );
                Ok(self.fallback.classify_all(batch))
            }
        }
    }

    fn batch_pause(&self) -> Duration {
        self.pause
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    Local,
    Primary,
    Secondary,
}

impl FromStr for AnalyzerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" | "local" => Ok(AnalyzerKind::Local),
            "openai" | "primary" => Ok(AnalyzerKind::Primary),
            "other" | "secondary" | "claude" => Ok(AnalyzerKind::Secondary),
            other => Err(Error::Construction(format!(
                "Unsupported analyzer model: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerFactory {
    summary_max_length: usize,
    batch_pause: Duration,
    timeout: Duration,
    primary: EndpointConfig,
    secondary: EndpointConfig,
}

impl AnalyzerFactory {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            summary_max_length: config.summary_max_length,
            batch_pause: config.batch_pause,
            timeout: config.llm_timeout,
            primary: config.primary.clone(),
            secondary: config.secondary.clone(),
        }
    }

    // Remote variants without an api key fail before any work starts.
    pub fn build(&self, model: &str, api_key: Option<&str>) -> Result<Arc<dyn AnalyzerStrategy>> {
        let kind = AnalyzerKind::from_str(model)?;

        let analyzer: Arc<dyn AnalyzerStrategy> = match kind {
            AnalyzerKind::Local => Arc::new(LocalAnalyzer::new(self.summary_max_length)),
            AnalyzerKind::Primary => {
                let key = require_key(api_key, "openai")?;
                let provider = OpenAIProvider::new(
                    key,
                    Some(self.primary.model.clone()),
                    Some(self.primary.base_url.clone()),
                    self.timeout,
                )?;
                Arc::new(RemoteAnalyzer::new(
                    Arc::new(provider),
                    self.summary_max_length,
                    self.batch_pause,
                ))
            }
            AnalyzerKind::Secondary => {
                let key = require_key(api_key, "claude")?;
                let provider = ClaudeProvider::new(
                    key,
                    Some(self.secondary.model.clone()),
                    Some(self.secondary.base_url.clone()),
                    self.timeout,
                )?;
                Arc::new(RemoteAnalyzer::new(
                    Arc::new(provider),
                    self.summary_max_length,
                    self.batch_pause,
                ))
            }
        };

        tracing::info!("Built {} analyzer for model '{}'", analyzer.name(), model);
        Ok(analyzer)
    }
}

fn require_key(api_key: Option<&str>, variant: &str) -> Result<String> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(Error::Construction(format!(
            "The {} analyzer requires an API key",
            variant
        ))),
    }
}
