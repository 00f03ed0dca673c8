pub mod bilibili;
pub mod fallback;
pub mod rate_limiter;
pub mod synthetic;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{CommentOrigin, CommentRecord};

pub use bilibili::BilibiliClient;
pub use fallback::FallbackSource;
pub use rate_limiter::RateLimiter;
pub use synthetic::SyntheticSource;

#[derive(Debug, Clone)]
pub struct FetchedComments {
    pub comments: Vec<CommentRecord>,
    pub origin: CommentOrigin,
}

// May fail, and may return fewer comments than requested.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_comments(&self, resource_id: &str, limit: usize) -> Result<FetchedComments>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    Live,
    Synthetic,
    LiveWithFallback,
}

impl FromStr for CrawlMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(CrawlMode::Live),
            "synthetic" => Ok(CrawlMode::Synthetic),
            "live-with-fallback" | "fallback" => Ok(CrawlMode::LiveWithFallback),
            other => Err(Error::Config(format!("Unknown crawl mode: {}", other))),
        }
    }
}

pub fn build_source(mode: CrawlMode, page_delay: Duration) -> Result<Arc<dyn CommentSource>> {
    let source: Arc<dyn CommentSource> = match mode {
        CrawlMode::Live => Arc::new(BilibiliClient::new(page_delay)?),
        CrawlMode::Synthetic => Arc::new(SyntheticSource::new()),
        CrawlMode::LiveWithFallback => Arc::new(FallbackSource::new(
            BilibiliClient::new(page_delay)?,
            SyntheticSource::new(),
        )),
    };
    tracing::info!("Using comment source: {}", source.name());
    Ok(source)
}
