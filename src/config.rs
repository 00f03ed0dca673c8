use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::crawler::CrawlMode;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub crawl_mode: CrawlMode,
    pub crawl_page_delay_ms: u64,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub summary_max_length: usize,
    pub openai_base_url: String,
    pub openai_model: String,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/comments"),
            bind_addr: "0.0.0.0:8000".to_string(),
            crawl_mode: CrawlMode::Live,
            crawl_page_delay_ms: 1_000,
            batch_size: 10,
            batch_pause_ms: 500,
            summary_max_length: 20,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            anthropic_base_url: "https://api.anthropic.com/v1".to_string(),
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            llm_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let crawl_mode = match env::var("CRAWL_MODE") {
            Ok(v) => CrawlMode::from_str(&v)?,
            Err(_) => defaults.crawl_mode,
        };

        let batch_size = parse_var("ANALYSIS_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(Error::Config(
                "ANALYSIS_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            bind_addr,
            crawl_mode,
            crawl_page_delay_ms: parse_var("CRAWL_PAGE_DELAY_MS", defaults.crawl_page_delay_ms)?,
            batch_size,
            batch_pause_ms: parse_var("ANALYSIS_PAUSE_MS", defaults.batch_pause_ms)?,
            summary_max_length: parse_var("SUMMARY_MAX_LENGTH", defaults.summary_max_length)?,
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            anthropic_model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", name, v))),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub summary_max_length: usize,
    pub llm_timeout: Duration,
    pub primary: EndpointConfig,
    pub secondary: EndpointConfig,
    pub show_progress: bool,
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            batch_size: config.batch_size,
            batch_pause: Duration::from_millis(config.batch_pause_ms),
            summary_max_length: config.summary_max_length,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            primary: EndpointConfig {
                base_url: config.openai_base_url.clone(),
                model: config.openai_model.clone(),
            },
            secondary: EndpointConfig {
                base_url: config.anthropic_base_url.clone(),
                model: config.anthropic_model.clone(),
            },
            show_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_from_defaults() {
        let config = Config::default();
        let pipeline = PipelineConfig::from(&config);
        assert_eq!(pipeline.batch_size, 10);
        assert_eq!(pipeline.batch_pause, Duration::from_millis(500));
        assert_eq!(pipeline.summary_max_length, 20);
        assert_eq!(pipeline.primary.model, "gpt-3.5-turbo");
        assert!(!pipeline.show_progress);
    }
}
