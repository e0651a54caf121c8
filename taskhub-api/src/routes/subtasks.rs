/// Subtask endpoints
///
/// Subtasks live inside their parent task, so every handler loads the task,
/// edits its subtask list in memory, and saves the list back.
///
/// # Endpoints
///
/// - `POST   /api/tasks/:taskId/subtasks`
/// - `PUT    /api/tasks/:taskId/subtasks/:subtaskId`
/// - `DELETE /api/tasks/:taskId/subtasks/:subtaskId`
///
/// Checks run in a fixed order: the task must exist (404), then the subtask
/// (404), then the caller must own or collaborate on the task (401).

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
use taskhub_shared::{
    auth::access::{authorize_task, TaskAction},
    models::task::{CreateSubtask, Task, UpdateSubtask},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubtaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "A Subtask name is needed"))]
    pub name: String,

    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubtaskRequest {
    #[validate(length(min = 1, message = "A Subtask name is needed"))]
    pub name: Option<String>,
    pub is_completed: Option<bool>,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn subtask_not_found() -> ApiError {
    ApiError::NotFound("Subtask not found".to_string())
}

async fn load_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    state.store.find_task(id).await?.ok_or_else(task_not_found)
}

fn authorize(caller: &Caller, task: &Task, action: TaskAction) -> ApiResult<()> {
    authorize_task(Some(caller.context()), task, action).map_err(|denied| {
        tracing::warn!(task_id = %task.id, user_id = %caller.user_id, ?action, "Subtask change denied");
        ApiError::from(denied)
    })
}

async fn save(state: &AppState, task: Task) -> ApiResult<Task> {
    state
        .store
        .save_subtasks(task.id, task.subtasks)
        .await?
        .ok_or_else(task_not_found)
}

/// Add a subtask; responds with the updated task
pub async fn create_subtask(
    State(state): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
    ApiJson(mut req): ApiJson<CreateSubtaskRequest>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id)?;
    let mut task = load_task(&state, task_id).await?;
    authorize(&caller, &task, TaskAction::CreateSubtask)?;

    req.name = req.name.trim().to_string();
    req.validate()?;

    let subtask_id = task.add_subtask(CreateSubtask {
        name: req.name,
        is_completed: req.is_completed,
    });

    let task = save(&state, task).await?;
    tracing::info!(task_id = %task_id, subtask_id = %subtask_id, "Subtask created");

    Ok(Json(task))
}

/// Update a subtask; responds with the updated task
pub async fn update_subtask(
    State(state): State<AppState>,
    caller: Caller,
    Path((task_id, subtask_id)): Path<(String, String)>,
    ApiJson(mut req): ApiJson<UpdateSubtaskRequest>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id)?;
    let subtask_id = parse_id(&subtask_id)?;

    let mut task = load_task(&state, task_id).await?;
    if task.subtask(subtask_id).is_none() {
        return Err(subtask_not_found());
    }
    authorize(&caller, &task, TaskAction::UpdateSubtask)?;

    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    task.update_subtask(
        subtask_id,
        UpdateSubtask {
            name: req.name,
            is_completed: req.is_completed,
        },
    );

    let task = save(&state, task).await?;
    tracing::info!(task_id = %task_id, subtask_id = %subtask_id, "Subtask updated");

    Ok(Json(task))
}

/// Remove a subtask
pub async fn delete_subtask(
    State(state): State<AppState>,
    caller: Caller,
    Path((task_id, subtask_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let task_id = parse_id(&task_id)?;
    let subtask_id = parse_id(&subtask_id)?;

    let mut task = load_task(&state, task_id).await?;
    if task.subtask(subtask_id).is_none() {
        return Err(subtask_not_found());
    }
    authorize(&caller, &task, TaskAction::DeleteSubtask)?;

    task.remove_subtask(subtask_id);
    save(&state, task).await?;
    tracing::info!(task_id = %task_id, subtask_id = %subtask_id, "Subtask deleted");

    Ok(StatusCode::NO_CONTENT)
}
