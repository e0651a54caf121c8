/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks` - List tasks with owner and collaborators expanded
/// - `POST   /api/tasks` - Create a task owned by the caller
/// - `GET    /api/tasks/:id` - Get a task
/// - `PUT    /api/tasks/:id` - Update a task (owner or collaborator)
/// - `DELETE /api/tasks/:id` - Delete a task (owner only)
///
/// Reads are open to anonymous callers.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, ApiJson, Caller},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use taskhub_shared::{
    auth::access::{authorize_task, authorize_task_create, TaskAction},
    error::ServiceError,
    models::{
        task::{normalize_collaborators, CreateTask, Task, TaskPriority, TaskStatus, TaskSummary, UpdateTask},
        user::UserSummary,
    },
    store::Store,
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
///
/// Any `owner` in the body is ignored; the caller becomes the owner.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "A Task name is required"))]
    pub name: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub collaborators: Vec<Uuid>,
}

/// Update task request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, message = "A Task name is required"))]
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_completed: Option<bool>,

    /// Replaces the collaborator set
    pub collaborators: Option<Vec<Uuid>>,
}

/// Fails with a validation error naming the first collaborator that is not a user
pub(crate) async fn ensure_users_exist(store: &dyn Store, ids: &[Uuid]) -> ApiResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found = store.find_users(ids).await?;

    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|u| u.id == **id)) {
        return Err(ServiceError::invalid(
            "collaborators",
            format!("Collaborator {} does not exist", missing),
        )
        .into());
    }

    Ok(())
}

async fn load_task(state: &AppState, id: Uuid, not_found: String) -> ApiResult<Task> {
    state.store.find_task(id).await?.ok_or(ApiError::NotFound(not_found))
}

/// List all tasks
///
/// Sorted by status, then priority, then id. Owner and collaborators are
/// expanded to `{id, username, email}`.
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskSummary>>> {
    let tasks = state.store.list_tasks().await?;

    let mut ids: Vec<Uuid> = tasks.iter().flat_map(Task::members).collect();
    ids.sort_unstable();
    ids.dedup();

    let users: HashMap<Uuid, UserSummary> = state
        .store
        .find_users(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    let summaries = tasks
        .into_iter()
        .map(|task| TaskSummary::expand(task, |id| users.get(&id).cloned()))
        .collect();

    Ok(Json(summaries))
}

/// Get a single task
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    let task = load_task(&state, id, format!("No task with id: {} found", id)).await?;

    Ok(Json(task))
}

/// Create a task
///
/// # Errors
///
/// - `400 Bad Request`: missing name, malformed body, unknown collaborator
/// - `401 Unauthorized`: no valid token
pub async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(mut req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let owner_id = authorize_task_create(Some(caller.context()))?;

    req.name = req.name.trim().to_string();
    req.validate()?;

    let collaborators = normalize_collaborators(owner_id, &req.collaborators);
    ensure_users_exist(state.store.as_ref(), &collaborators).await?;

    let task = state
        .store
        .create_task(CreateTask {
            owner_id,
            name: req.name,
            status: req.status,
            priority: req.priority,
            is_completed: req.is_completed,
            collaborators,
        })
        .await?;

    tracing::info!(task_id = %task.id, user_id = %owner_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
///
/// The owner can never be changed. Collaborators added here gain the task on
/// their task list; collaborators removed lose it.
///
/// # Errors
///
/// - `400 Bad Request`: blank name, malformed body, unknown collaborator
/// - `401 Unauthorized`: caller is neither owner nor collaborator
/// - `404 Not Found`: no such task
pub async fn update_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(mut req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id)?;
    let task = load_task(&state, id, format!("No task with id: {} found to update", id)).await?;

    if let Err(denied) = authorize_task(Some(caller.context()), &task, TaskAction::Update) {
        tracing::warn!(task_id = %id, user_id = %caller.user_id, "Task update denied");
        return Err(denied.into());
    }

    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    let collaborators = req
        .collaborators
        .map(|c| normalize_collaborators(task.owner_id, &c));
    if let Some(collaborators) = &collaborators {
        ensure_users_exist(state.store.as_ref(), collaborators).await?;
    }

    let updated = state
        .store
        .update_task(
            id,
            UpdateTask {
                name: req.name,
                status: req.status,
                priority: req.priority,
                is_completed: req.is_completed,
                collaborators,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No task with id: {} found to update", id)))?;

    tracing::info!(task_id = %id, user_id = %caller.user_id, "Task updated");

    Ok(Json(updated))
}

/// Delete a task
///
/// # Errors
///
/// - `401 Unauthorized`: caller is not the owner
/// - `404 Not Found`: no such task
pub async fn delete_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let task = load_task(&state, id, format!("No task with id: {} found to delete", id)).await?;

    if let Err(denied) = authorize_task(Some(caller.context()), &task, TaskAction::Delete) {
        tracing::warn!(task_id = %id, user_id = %caller.user_id, "Task delete denied");
        return Err(denied.into());
    }

    if !state.store.delete_task(id).await? {
        return Err(ApiError::NotFound(format!("No task with id: {} found to delete", id)));
    }

    tracing::info!(task_id = %id, user_id = %caller.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
