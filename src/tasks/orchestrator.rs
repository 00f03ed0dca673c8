use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::analysis::{AnalyzeParams, CommentPipeline, CrawlParams, StageReporter};
use crate::error::Result;
use crate::models::{Task, TaskKind, TaskResult, TaskStatus};
use crate::tasks::registry::TaskRegistry;

struct RegistryReporter {
    registry: TaskRegistry,
    task_id: String,
}

#[async_trait]
impl StageReporter for RegistryReporter {
    async fn stage(&self, status: TaskStatus, progress: u8) {
        tracing::info!(task_id = %self.task_id, %status, progress, "Task advanced");
        self.registry.advance(&self.task_id, status, progress).await;
    }
}

#[derive(Clone)]
pub struct TaskOrchestrator {
    registry: TaskRegistry,
    pipeline: Arc<CommentPipeline>,
}

impl TaskOrchestrator {
    pub fn new(registry: TaskRegistry, pipeline: Arc<CommentPipeline>) -> Self {
        Self { registry, pipeline }
    }

    pub fn pipeline(&self) -> &CommentPipeline {
        &self.pipeline
    }

    pub async fn start_crawl(&self, params: CrawlParams) -> Task {
        let task = self.registry.create(TaskKind::Crawl).await;
        tracing::info!(
            task_id = %task.task_id,
            resource_id = %params.resource_id,
            max_comments = params.max_comments,
            "Crawl task accepted"
        );

        let pipeline = self.pipeline.clone();
        let reporter = self.reporter(&task.task_id);
        self.spawn(task.task_id.clone(), async move {
            let outcome = pipeline.crawl(&params, &reporter).await?;
            Ok(TaskResult::Crawl(outcome))
        });

        task
    }

    pub async fn start_analyze(&self, params: AnalyzeParams) -> Task {
        let task = self.registry.create(TaskKind::Analyze).await;
        tracing::info!(
            task_id = %task.task_id,
            file_path = %params.file_path.display(),
            model = %params.model,
            "Analyze task accepted"
        );

        let pipeline = self.pipeline.clone();
        let reporter = self.reporter(&task.task_id);
        self.spawn(task.task_id.clone(), async move {
            let outcome = pipeline.analyze(&params, &reporter).await?;
            Ok(TaskResult::Analyze(outcome))
        });

        task
    }

    pub async fn status(&self, task_id: &str) -> Result<Task> {
        self.registry.get(task_id).await
    }

    pub async fn list(&self) -> Vec<Task> {
        self.registry.list().await
    }

    fn reporter(&self, task_id: &str) -> RegistryReporter {
        RegistryReporter {
            registry: self.registry.clone(),
            task_id: task_id.to_string(),
        }
    }

    // Panics in the inner task surface as a JoinError and still fail the task.
    fn spawn<F>(&self, task_id: String, work: F)
    where
        F: Future<Output = Result<TaskResult>> + Send + 'static,
    {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(work).await {
                Ok(result) => result,
                Err(join_error) => Err(join_error.into()),
            };

            match outcome {
                Ok(result) => {
                    registry.complete(&task_id, result).await;
                    tracing::info!(task_id = %task_id, "Task completed");
                }
                Err(e) => {
                    tracing::error!(task_id = %task_id, error = %e, "Task failed");
                    registry.fail(&task_id, e.to_string()).await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PipelineConfig};
    use crate::crawler::{CommentSource, FetchedComments, SyntheticSource};
    use crate::error::Error;
    use crate::models::{CommentOrigin, CommentRecord};
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn orchestrator(source: Arc<dyn CommentSource>, dir: &Path) -> TaskOrchestrator {
        let mut config = PipelineConfig::from(&Config::default());
        config.data_dir = dir.to_path_buf();
        config.primary.base_url = "http://127.0.0.1:9".to_string();
        config.batch_pause = Duration::ZERO;
        config.llm_timeout = Duration::from_secs(2);
        TaskOrchestrator::new(
            TaskRegistry::new(),
            Arc::new(CommentPipeline::new(source, config)),
        )
    }

    async fn wait_terminal(orchestrator: &TaskOrchestrator, task_id: &str) -> Task {
        for _ in 0..500 {
            let task = orchestrator.status(task_id).await.unwrap();
            if task.status.is_terminal() {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} did not finish", task_id);
    }

    // blocks inside the fetch until released
    struct GatedSource {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl CommentSource for GatedSource {
        async fn fetch_comments(&self, resource_id: &str, limit: usize) -> Result<FetchedComments> {
            self.gate.notified().await;
            Ok(FetchedComments {
                comments: SyntheticSource::with_base_time(0).generate(resource_id, limit),
                origin: CommentOrigin::Live,
            })
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl CommentSource for PanickingSource {
        async fn fetch_comments(&self, _resource_id: &str, _limit: usize) -> Result<FetchedComments> {
            panic!("parser bug");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn crawl(resource_id: &str, max_comments: usize) -> CrawlParams {
        CrawlParams {
            resource_id: resource_id.to_string(),
            max_comments,
        }
    }

    #[tokio::test]
    async fn test_crawl_task_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let orchestrator = orchestrator(Arc::new(GatedSource { gate: gate.clone() }), dir.path());

        let accepted = orchestrator.start_crawl(crawl("BV1gate", 12)).await;
        assert_eq!(accepted.status, TaskStatus::Running);
        assert_eq!(accepted.progress, 0);

        let mut observed = orchestrator.status(&accepted.task_id).await.unwrap();
        for _ in 0..100 {
            if observed.status == TaskStatus::Crawling {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            observed = orchestrator.status(&accepted.task_id).await.unwrap();
        }
        assert_eq!(observed.status, TaskStatus::Crawling);
        assert_eq!(observed.progress, 25);

        gate.notify_one();
        let done = wait_terminal(&orchestrator, &accepted.task_id).await;
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.progress, 100);
        match done.result {
            Some(TaskResult::Crawl(outcome)) => {
                assert_eq!(outcome.comment_count, 12);
                assert!(outcome.cleaned_count <= outcome.comment_count);
                assert_eq!(outcome.origin, CommentOrigin::Live);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(SyntheticSource::new()), dir.path());
        assert!(matches!(
            orchestrator.status("task_nope").await,
            Err(Error::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_panicking_work_marks_task_failed() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(PanickingSource), dir.path());

        let accepted = orchestrator.start_crawl(crawl("BV1", 5)).await;
        let done = wait_terminal(&orchestrator, &accepted.task_id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert_eq!(done.progress, 0);
        assert!(done.error.is_some());
    }

    #[tokio::test]
    async fn test_analyze_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(SyntheticSource::new()), dir.path());

        let accepted = orchestrator
            .start_analyze(AnalyzeParams {
                file_path: dir.path().join("missing_cleaned.jsonl"),
                api_key: None,
                model: "default".to_string(),
            })
            .await;
        let done = wait_terminal(&orchestrator, &accepted.task_id).await;
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.unwrap_or_default().contains("missing_cleaned.jsonl"));
    }

    fn write_cleaned(dir: &Path, texts: &[&str]) -> PathBuf {
        let path = dir.join("remote_cleaned.jsonl");
        let records: Vec<CommentRecord> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut r = CommentRecord::raw(i.to_string(), *t, "u", 0, 0);
                r.cleaned_text = Some(t.to_string());
                r
            })
            .collect();
        crate::storage::CommentStore::new(dir)
            .write_records(&path, &records)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_unreachable_remote_analyzer_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(SyntheticSource::new()), dir.path());
        let input = write_cleaned(dir.path(), &["很好很棒的视频", "太无聊了很失望", "讲解通俗易懂"]);

        let accepted = orchestrator
            .start_analyze(AnalyzeParams {
                file_path: input,
                api_key: Some("sk-test".to_string()),
                model: "openai".to_string(),
            })
            .await;
        let done = wait_terminal(&orchestrator, &accepted.task_id).await;

        assert_eq!(done.status, TaskStatus::Completed, "error: {:?}", done.error);
        match done.result {
            Some(TaskResult::Analyze(outcome)) => assert_eq!(outcome.analyzed_count, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(SyntheticSource::new()), dir.path());

        let accepted = futures::future::join_all(
            (0..5).map(|i| orchestrator.start_crawl(crawl(&format!("BV{}", i), 10 + i))),
        )
        .await;

        for (i, task) in accepted.iter().enumerate() {
            let done = wait_terminal(&orchestrator, &task.task_id).await;
            match done.result {
                Some(TaskResult::Crawl(outcome)) => {
                    assert_eq!(outcome.comment_count, 10 + i);
                    assert!(outcome.raw_file_path.ends_with(&format!("BV{}_raw.jsonl", i)));
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
        assert_eq!(orchestrator.list().await.len(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_crawls_of_same_id_report_what_is_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(Arc::new(SyntheticSource::new()), dir.path());

        let first = orchestrator.start_crawl(crawl("BVsame", 3000)).await;
        let second = orchestrator.start_crawl(crawl("BVsame", 10)).await;

        let mut outcomes = Vec::new();
        for task_id in [&first.task_id, &second.task_id] {
            let task = wait_terminal(&orchestrator, task_id).await;
            assert_eq!(task.status, TaskStatus::Completed, "error: {:?}", task.error);
            match task.result {
                Some(TaskResult::Crawl(outcome)) => {
                    assert!(outcome.cleaned_count <= outcome.comment_count);
                    outcomes.push(outcome);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
        assert_eq!(outcomes[0].file_path, outcomes[1].file_path);
        assert_eq!(outcomes[0].comment_count, 3000);
        assert_eq!(outcomes[1].comment_count, 10);

        // both files on disk come from the same run
        let raw_lines = std::fs::read_to_string(&outcomes[0].raw_file_path).unwrap().lines().count();
        let cleaned_lines = std::fs::read_to_string(&outcomes[0].file_path).unwrap().lines().count();
        assert!(outcomes
            .iter()
            .any(|o| o.comment_count == raw_lines && o.cleaned_count == cleaned_lines));
    }
}
