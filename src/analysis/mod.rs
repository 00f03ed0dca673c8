pub mod engine;
pub mod heuristic;
pub mod pipeline;
pub mod report;
pub mod strategy;

pub use engine::BatchAnalysisEngine;
pub use heuristic::LocalAnalyzer;
pub use pipeline::{AnalyzeParams, CommentPipeline, CrawlParams, LogReporter, StageReporter};
pub use report::{LabelHistogram, ResultSummary};
pub use strategy::{AnalyzerFactory, AnalyzerKind, AnalyzerStrategy, RemoteAnalyzer};
