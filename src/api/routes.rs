//! API routes
//!
//! /api/tasks is plain CRUD over the ledger; /api/chat runs the resolver and
//! always answers 200 once a message is present.

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::command::{CommandExecutor, ExecutionResult};
use crate::core::types::{Priority, TaskFilter, TaskId};
use crate::llm::parser::ChatResponse;
use crate::llm::prompt::PromptContext;
use crate::store::{NewTask, Task, TaskPatch};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Quest Routes
// ============================================================================

pub fn task_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub priority: Option<String>,
    /// Absent leaves the date alone; `null` or `""` clears it
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    pub completed: Option<bool>,
}

/// Distinguishes an explicit `null` from a missing field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, ApiError> {
    raw.map(|p| p.parse::<Priority>().map_err(ApiError::bad_request))
        .transpose()
}

// Non-numeric ids can never exist, so they are reported as missing
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse::<u64>()
        .map(TaskId)
        .map_err(|_| ApiError::not_found("Task not found"))
}

async fn list_tasks(
    State(state): State<AppStateArc>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let Query(params) = params?;
    let filter = match params.filter.as_deref() {
        Some(raw) => raw.parse::<TaskFilter>().map_err(ApiError::bad_request)?,
        None => TaskFilter::All,
    };

    Ok(Json(TaskListResponse {
        tasks: state.store.list(filter, today()),
    }))
}

async fn create_task(
    State(state): State<AppStateArc>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(req) = body?;
    let description = req
        .description
        .ok_or_else(|| ApiError::bad_request("Description is required"))?;
    let priority = parse_priority(req.priority.as_deref())?;

    let task = state.store.create(NewTask {
        description,
        priority,
        due_date: req.due_date,
    })?;
    tracing::info!(id = %task.id, "Quest created");

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

async fn update_task(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_task_id(&id)?;
    // Unknown ids are a 404 even when the body is also bad
    state.store.get(id)?;
    let Json(req) = body?;
    let patch = TaskPatch {
        description: req.description,
        priority: parse_priority(req.priority.as_deref())?,
        due_date: req.due_date,
        completed: req.completed,
    };

    let task = state.store.update(id, patch)?;
    Ok(Json(TaskResponse { task }))
}

async fn delete_task(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;
    if !state.store.delete(id) {
        return Err(ApiError::not_found("Task not found"));
    }
    tracing::info!(id = %id, "Quest erased");
    Ok(Json(serde_json::json!({ "result": true })))
}

// ============================================================================
// Chat Routes
// ============================================================================

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new().route("/api/chat", post(chat))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    /// Apply the resolved action to the ledger before answering
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    #[serde(flatten)]
    pub response: ChatResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
}

async fn chat(
    State(state): State<AppStateArc>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(req) = body?;
    let message = req
        .message
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let context = PromptContext::new(today());
    let response = state.resolver.resolve(&message, &context).await;

    let execution = req
        .apply
        .then(|| CommandExecutor::execute(&state.store, &response.json, context.today));

    Ok(Json(ChatReply {
        response,
        execution,
    }))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tasks: usize,
    pub model: bool,
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tasks: state.store.len(),
        model: state.resolver.has_model(),
    })
}
