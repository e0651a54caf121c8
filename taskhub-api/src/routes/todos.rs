/// Todo endpoints
///
/// # Endpoints
///
/// - `GET    /api/todos` - List todos
/// - `POST   /api/todos` - Create a todo owned by the caller
/// - `GET    /api/todos/:id` - Get a todo
/// - `PUT    /api/todos/:id` - Update (owner only)
/// - `DELETE /api/todos/:id` - Delete (owner only)

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
    auth::access::require_ownership,
    models::todo::{CreateTodo, Todo, UpdateTodo},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "A Todo Item name is required"))]
    pub name: String,

    pub priority: Option<String>,

    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[validate(length(min = 1, message = "A Todo Item name is required"))]
    pub name: Option<String>,
    pub priority: Option<String>,
    pub is_completed: Option<bool>,
}

/// List todos: completed first, then by priority (missing first), name, id
pub async fn list_todos(State(state): State<AppState>) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(state.store.list_todos().await?))
}

/// Get a single todo
pub async fn get_todo(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Todo>> {
    let id = parse_id(&id)?;
    let todo = state
        .store
        .find_todo(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No todo item with id: {} found", id)))?;

    Ok(Json(todo))
}

/// Create a todo
pub async fn create_todo(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(mut req): ApiJson<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    req.name = req.name.trim().to_string();
    req.validate()?;

    let todo = state
        .store
        .create_todo(CreateTodo {
            owner_id: caller.user_id,
            name: req.name,
            priority: req.priority,
            is_completed: req.is_completed,
        })
        .await?;

    tracing::info!(todo_id = %todo.id, user_id = %caller.user_id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// Update a todo
///
/// # Errors
///
/// - `401 Unauthorized`: caller does not own the todo
/// - `404 Not Found`: no such todo
pub async fn update_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(mut req): ApiJson<UpdateTodoRequest>,
) -> ApiResult<Json<Todo>> {
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound(format!("No todo item with id: {} found to update", id));

    let todo = state.store.find_todo(id).await?.ok_or_else(not_found)?;
    if let Err(denied) = require_ownership(Some(caller.context()), todo.owner_id, "item", "update") {
        tracing::warn!(todo_id = %id, user_id = %caller.user_id, "Todo update denied");
        return Err(denied.into());
    }

    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    let todo = state
        .store
        .update_todo(
            id,
            UpdateTodo {
                name: req.name,
                priority: req.priority,
                is_completed: req.is_completed,
            },
        )
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(todo))
}

/// Delete a todo
pub async fn delete_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound(format!("No todo item with id: {} found to delete", id));

    let todo = state.store.find_todo(id).await?.ok_or_else(not_found)?;
    if let Err(denied) = require_ownership(Some(caller.context()), todo.owner_id, "item", "delete") {
        tracing::warn!(todo_id = %id, user_id = %caller.user_id, "Todo delete denied");
        return Err(denied.into());
    }

    if !state.store.delete_todo(id).await? {
        return Err(not_found());
    }

    tracing::info!(todo_id = %id, user_id = %caller.user_id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
