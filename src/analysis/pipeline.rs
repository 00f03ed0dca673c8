use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::analysis::engine::BatchAnalysisEngine;
use crate::analysis::strategy::AnalyzerFactory;
use crate::config::PipelineConfig;
use crate::crawler::CommentSource;
use crate::error::{Error, Result};
use crate::models::{AnalyzeOutcome, CommentRecord, CrawlOutcome, TaskStatus};
use crate::processor::CommentCleaner;
use crate::storage::CommentStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlParams {
    pub resource_id: String,
    pub max_comments: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeParams {
    pub file_path: PathBuf,
    pub api_key: Option<String>,
    pub model: String,
}

#[async_trait]
pub trait StageReporter: Send + Sync {
    async fn stage(&self, status: TaskStatus, progress: u8);
}

pub struct LogReporter;

#[async_trait]
impl StageReporter for LogReporter {
    async fn stage(&self, status: TaskStatus, progress: u8) {
        tracing::info!(%status, progress, "Stage changed");
    }
}

pub struct CommentPipeline {
    source: Arc<dyn CommentSource>,
    store: CommentStore,
    cleaner: CommentCleaner,
    analyzers: AnalyzerFactory,
    config: PipelineConfig,
    path_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl CommentPipeline {
    pub fn new(source: Arc<dyn CommentSource>, config: PipelineConfig) -> Self {
        Self {
            source,
            store: CommentStore::new(&config.data_dir),
            cleaner: CommentCleaner::new(),
            analyzers: AnalyzerFactory::new(&config),
            config,
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    // Guards are taken input before output. Derived paths only ever extend
    // their input's stem, so two runs can never wait on each other in a cycle.
    async fn lock_paths(&self, paths: &[&Path]) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::with_capacity(paths.len());
        for path in paths {
            let lock = self
                .path_locks
                .lock()
                .await
                .entry(path.to_path_buf())
                .or_default()
                .clone();
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    pub async fn crawl(
        &self,
        params: &CrawlParams,
        reporter: &dyn StageReporter,
    ) -> Result<CrawlOutcome> {
        reporter.stage(TaskStatus::Crawling, 25).await;

        tracing::info!(
            "Fetching up to {} comment(s) for {} from {}",
            params.max_comments,
            params.resource_id,
            self.source.name()
        );
        let fetched = self
            .source
            .fetch_comments(&params.resource_id, params.max_comments)
            .await?;
        let origin = fetched.origin;
        let mut comments = fetched.comments;
        comments.truncate(params.max_comments);

        let raw_path = self.store.raw_path(&params.resource_id);
        let cleaned_path = CommentStore::derived_path(&raw_path, "_cleaned");
        // held until the cleaned generation is on disk
        let _guards = self.lock_paths(&[&raw_path, &cleaned_path]).await;

        let comment_count = {
            let store = self.store.clone();
            let path = raw_path.clone();
            tokio::task::spawn_blocking(move || store.write_records(&path, &comments)).await??
        };
        tracing::info!("Saved {} raw comment(s) to {}", comment_count, raw_path.display());

        reporter.stage(TaskStatus::Processing, 50).await;

        let cleaned = {
            let store = self.store.clone();
            let cleaner = self.cleaner.clone();
            let path = raw_path.clone();
            tokio::task::spawn_blocking(move || cleaner.process_file(&store, &path)).await??
        };

        Ok(CrawlOutcome {
            file_path: cleaned.output_path.display().to_string(),
            raw_file_path: raw_path.display().to_string(),
            comment_count,
            cleaned_count: cleaned.cleaned_count,
            origin,
        })
    }

    pub async fn analyze(
        &self,
        params: &AnalyzeParams,
        reporter: &dyn StageReporter,
    ) -> Result<AnalyzeOutcome> {
        let input = params.file_path.clone();
        if !tokio::fs::try_exists(&input).await.unwrap_or(false) {
            return Err(Error::FileNotFound(input.display().to_string()));
        }

        let analyzer = self
            .analyzers
            .build(&params.model, params.api_key.as_deref())?;

        reporter.stage(TaskStatus::Analyzing, 30).await;

        let output_path = CommentStore::derived_path(&input, "_analyzed");
        let _guards = self.lock_paths(&[&input, &output_path]).await;

        let records = {
            let store = self.store.clone();
            let path = input.clone();
            tokio::task::spawn_blocking(move || load_analyzable(&store, &path)).await??
        };

        let engine = BatchAnalysisEngine::new(analyzer, self.config.batch_size)
            .with_progress(self.config.show_progress);
        let analyzed = engine.run(records).await?;

        let analyzed_count = {
            let store = self.store.clone();
            let path = output_path.clone();
            tokio::task::spawn_blocking(move || store.write_records(&path, &analyzed)).await??
        };
        tracing::info!(
            "Wrote {} analyzed comment(s) to {}",
            analyzed_count,
            output_path.display()
        );

        Ok(AnalyzeOutcome {
            result_file: output_path.display().to_string(),
            analyzed_count,
        })
    }
}

// Records with no cleaned text are left out of analysis.
fn load_analyzable(store: &CommentStore, path: &Path) -> Result<Vec<CommentRecord>> {
    let outcome = store.read_records::<CommentRecord>(path)?;
    let total = outcome.records.len();
    let records: Vec<CommentRecord> = outcome
        .records
        .into_iter()
        .filter(|r| !r.analysis_text().trim().is_empty())
        .collect();
    if records.len() < total {
        tracing::debug!(
            "{} record(s) in {} have no cleaned text",
            total - records.len(),
            path.display()
        );
    }
    Ok(records)
}
