use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::strategy::AnalyzerStrategy;
use crate::error::Result;
use crate::models::CommentRecord;

pub struct BatchAnalysisEngine {
    analyzer: Arc<dyn AnalyzerStrategy>,
    batch_size: usize,
    show_progress: bool,
}

impl BatchAnalysisEngine {
    pub fn new(analyzer: Arc<dyn AnalyzerStrategy>, batch_size: usize) -> Self {
        Self {
            analyzer,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    // Output order equals input order. The first failing batch aborts the run.
    pub async fn run(&self, records: Vec<CommentRecord>) -> Result<Vec<CommentRecord>> {
        let total_batches = records.len().div_ceil(self.batch_size);
        let pb = self.progress_bar(total_batches as u64);
        let pause = self.analyzer.batch_pause();

        tracing::info!(
            "Analyzing {} comment(s) in {} batch(es) with {}",
            records.len(),
            total_batches,
            self.analyzer.name()
        );

        let mut enriched = Vec::with_capacity(records.len());
        let mut remaining = records.into_iter();
        let mut batch_index = 0;

        loop {
            let batch: Vec<CommentRecord> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }

            if batch_index > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            let texts: Vec<String> = batch
                .iter()
                .map(|r| r.analysis_text().to_string())
                .collect();

            let summaries = self.analyzer.summarize(&texts).await?;
            let labels = self.analyzer.classify(&texts).await?;

            if summaries.len() < batch.len() || labels.len() < batch.len() {
                tracing::warn!(
                    "Batch {} got {} summaries and {} labels for {} comments",
                    batch_index + 1,
                    summaries.len(),
                    labels.len(),
                    batch.len()
                );
            }

            for (i, mut record) in batch.into_iter().enumerate() {
                record.summary = summaries.get(i).cloned();
                record.classification = labels.get(i).copied();
                enriched.push(record);
            }

            batch_index += 1;
            pb.inc(1);
        }

        pb.finish_with_message("Analysis complete");
        Ok(enriched)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
