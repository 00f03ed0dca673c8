use std::path::{Component, PathBuf};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::{AnalyzeParams, CrawlParams, ResultSummary};
use crate::api::error::ApiError;
use crate::error::Error;
use crate::models::{Task, TaskResult, TaskStatus};
use crate::tasks::TaskOrchestrator;

const DEFAULT_MAX_COMMENTS: usize = 10_000;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: TaskOrchestrator,
}

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    #[serde(alias = "bvid")]
    pub resource_id: String,
    #[serde(default = "default_max_comments")]
    pub max_comments: usize,
}

fn default_max_comments() -> usize {
    DEFAULT_MAX_COMMENTS
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub file_path: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            status: task.status,
            progress: task.progress,
            result: task.result,
            error: task.error,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crawl", post(start_crawl))
        .route("/analyze", post(start_analyze))
        .route("/task/:task_id", get(task_status))
        .route("/tasks", get(list_tasks))
        .route("/results/*file_path", get(results))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn start_crawl(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let resource_id = request.resource_id.trim();
    if resource_id.is_empty() {
        return Err(Error::InvalidRequest("resource_id must not be empty".to_string()).into());
    }
    if request.max_comments == 0 {
        return Err(Error::InvalidRequest("max_comments must be at least 1".to_string()).into());
    }

    let task = state
        .orchestrator
        .start_crawl(CrawlParams {
            resource_id: resource_id.to_string(),
            max_comments: request.max_comments,
        })
        .await;
    Ok(Json(task.into()))
}

async fn start_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let file_path = request.file_path.trim();
    if file_path.is_empty() {
        return Err(Error::InvalidRequest("file_path must not be empty".to_string()).into());
    }

    let task = state
        .orchestrator
        .start_analyze(AnalyzeParams {
            file_path: PathBuf::from(file_path),
            api_key: request.api_key,
            model: request.model,
        })
        .await;
    Ok(Json(task.into()))
}

async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.orchestrator.status(&task_id).await?;
    Ok(Json(task.into()))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskResponse>> {
    let tasks = state.orchestrator.list().await;
    Json(tasks.into_iter().map(TaskResponse::from).collect())
}

async fn results(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<Json<ResultSummary>, ApiError> {
    let path = checked_path(&file_path)?;
    let store = state.orchestrator.pipeline().store().clone();
    let summary = tokio::task::spawn_blocking(move || ResultSummary::from_file(&store, &path))
        .await
        .map_err(Error::from)??;
    Ok(Json(summary))
}

// Only relative paths below the working directory are served.
fn checked_path(raw: &str) -> Result<PathBuf, Error> {
    let path = PathBuf::from(raw.trim());
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidRequest("file_path must not be empty".to_string()));
    }
    if path.is_absolute() || path.has_root() {
        return Err(Error::InvalidRequest(format!(
            "file_path must be relative: {}",
            raw
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::InvalidRequest(format!(
            "file_path must not contain '..': {}",
            raw
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CommentPipeline;
    use crate::config::{Config, PipelineConfig};
    use crate::crawler::SyntheticSource;
    use crate::tasks::TaskRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(data_dir: &std::path::Path) -> Router {
        let mut config = PipelineConfig::from(&Config::default());
        config.data_dir = data_dir.to_path_buf();
        let pipeline = CommentPipeline::new(Arc::new(SyntheticSource::new()), config);
        router(AppState {
            orchestrator: TaskOrchestrator::new(TaskRegistry::new(), Arc::new(pipeline)),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_crawl_accepts_and_is_pollable() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, body) = send(
            app.clone(),
            post_json("/crawl", json!({ "bvid": "BV1xx411c7mD", "max_comments": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["progress"], 0);

        let task_id = body["task_id"].as_str().unwrap().to_string();
        let mut last = Value::Null;
        for _ in 0..200 {
            let (status, body) = send(app.clone(), get(&format!("/task/{}", task_id))).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == "completed" {
                last = body;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(last["progress"], 100);
        assert_eq!(last["result"]["comment_count"], 20);
        assert_eq!(last["result"]["origin"], "synthetic");

        let (_, listed) = send(app, get("/tasks")).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_request_validation() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, body) = send(app.clone(), post_json("/crawl", json!({ "resource_id": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("resource_id"));

        let (status, _) = send(
            app.clone(),
            post_json("/crawl", json!({ "resource_id": "BV1", "max_comments": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app.clone(), post_json("/analyze", json!({ "file_path": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app, get("/results/a/../../etc/passwd")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_task_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path()), get("/task/task_unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("task_unknown"));
    }

    #[tokio::test]
    async fn test_results_histogram_and_errors() {
        // relative to the working directory, like paths returned by tasks
        let dir = tempfile::tempdir_in(".").unwrap();
        let rel = PathBuf::from(dir.path().file_name().unwrap());
        let app = app(dir.path());

        let lines: Vec<String> = ["excellent", "good", "good", "poor"]
            .iter()
            .map(|l| json!({ "text": "t", "summary": l, "classification": l }).to_string())
            .collect();
        std::fs::write(dir.path().join("ok_analyzed.jsonl"), lines.join("\n")).unwrap();
        std::fs::write(dir.path().join("bad_analyzed.jsonl"), "{not json}\n").unwrap();

        let uri = format!("/results/{}/ok_analyzed.jsonl", rel.display());
        let (status, body) = send(app.clone(), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["classifications"],
            json!({ "excellent": 1, "good": 2, "neutral": 0, "poor": 1, "unclear": 0 })
        );
        assert_eq!(body["total"], 4);
        assert_eq!(body["sample_summaries"].as_array().map(Vec::len), Some(4));

        let uri = format!("/results/{}/missing.jsonl", rel.display());
        let (status, _) = send(app.clone(), get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/results/{}/bad_analyzed.jsonl", rel.display());
        let (status, _) = send(app, get(&uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_checked_path_rejects_rooted_paths() {
        assert!(checked_path("/etc/passwd").is_err());
        assert!(checked_path("a/../b").is_err());
        assert!(checked_path("  ").is_err());
        assert_eq!(
            checked_path("data/BV1_analyzed.jsonl").unwrap(),
            PathBuf::from("data/BV1_analyzed.jsonl")
        );
    }

    #[tokio::test]
    async fn test_results_rejects_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path()), get("/results/%2Fetc%2Fpasswd")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("relative"));
    }

    #[tokio::test]
    async fn test_failed_task_reports_null_result() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let missing = dir.path().join("missing_cleaned.jsonl");

        let (status, body) = send(
            app.clone(),
            post_json("/analyze", json!({ "file_path": missing.display().to_string() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fields = body.as_object().unwrap();
        assert!(fields.contains_key("result"));
        assert!(body["result"].is_null());
        assert!(!fields.contains_key("error"));

        let task_id = body["task_id"].as_str().unwrap().to_string();
        let mut last = Value::Null;
        for _ in 0..200 {
            let (_, body) = send(app.clone(), get(&format!("/task/{}", task_id))).await;
            if body["status"] == "failed" {
                last = body;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(last["status"], "failed");
        assert_eq!(last["progress"], 0);
        assert!(last.as_object().unwrap().contains_key("result"));
        assert!(last["result"].is_null());
        assert!(last["error"].as_str().is_some());
    }
}
