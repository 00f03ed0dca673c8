pub mod analysis;
pub mod api;
pub mod config;
pub mod crawler;
pub mod error;
pub mod llm;
pub mod models;
pub mod processor;
pub mod storage;
pub mod tasks;

pub use analysis::{
    AnalyzeParams, AnalyzerFactory, AnalyzerStrategy, BatchAnalysisEngine, CommentPipeline,
    CrawlParams, ResultSummary,
};
pub use config::{Config, PipelineConfig};
pub use crawler::{build_source, CommentSource, CrawlMode};
pub use error::{Error, Result};
pub use llm::{ClaudeProvider, LLMProvider, OpenAIProvider};
pub use processor::CommentCleaner;
pub use storage::CommentStore;
pub use tasks::{TaskOrchestrator, TaskRegistry};
