//! Task handlers

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::error::{Error, Result};
use crate::extract::{parse_id, JsonBody};
use crate::ids::ObjectId;
use crate::models::{CreateTask, Task, TaskChanges};
use crate::pagination::{self, PageQuery, PageRequest, TaskPage};
use crate::state::AppState;
use crate::store::{DocumentStore, Filter, FindOptions};

/// Response body of a successful create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    pub message: String,
    pub task_id: ObjectId,
}

/// `GET /api/v1/tasks?page=&limit=`
pub async fn list_tasks<S: DocumentStore>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<TaskPage>> {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_default();
    let request = PageRequest::from_query(&PageQuery::from_pairs(pairs));

    let page = pagination::list_tasks(state.tasks(), request).await?;

    tracing::info!(
        page = page.page,
        limit = page.limit,
        total = page.total,
        "Tasks fetched successfully"
    );
    Ok(Json(page))
}

/// `POST /api/v1/tasks`
pub async fn create_task<S: DocumentStore>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<CreateTask>,
) -> Result<(StatusCode, Json<TaskCreated>)> {
    let task = request.into_task().map_err(|message| {
        tracing::error!("Error validating task: {}", message);
        Error::BadRequest(message)
    })?;

    let task_id = state
        .tasks()
        .insert_one(&task)
        .await
        .map_err(|e| Error::store("Failed to create task", e))?;

    tracing::info!(task_id = %task_id, "Task created successfully");
    Ok((
        StatusCode::CREATED,
        Json(TaskCreated {
            message: "Task created successfully".to_string(),
            task_id,
        }),
    ))
}

/// `GET /api/v1/tasks/{taskId}`
pub async fn get_task<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>> {
    let task_id = parse_id(&task_id, "task")?;

    let task = state
        .tasks()
        .find_one(&task_id)
        .await
        .map_err(|e| Error::store("Failed to fetch task", e))?
        .ok_or_else(|| {
            tracing::error!(task_id = %task_id, "Task not found");
            Error::NotFound("Task not found".to_string())
        })?;

    tracing::info!(task_id = %task_id, "Task fetched successfully");
    Ok(Json(task))
}

/// `GET /api/v1/tasks/user/{userId}`
pub async fn list_user_tasks<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Task>>> {
    let user_id = parse_id(&user_id, "user")?;

    let tasks = state
        .tasks()
        .find(&Filter::eq("userId", user_id.to_hex()), FindOptions::default())
        .await
        .map_err(|e| Error::store("Failed to fetch user tasks", e))?;

    tracing::info!(user_id = %user_id, count = tasks.len(), "User tasks fetched successfully");
    Ok(Json(tasks))
}

/// `PUT /api/v1/tasks/{taskId}`
pub async fn update_task<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(task_id): Path<String>,
    JsonBody(changes): JsonBody<TaskChanges>,
) -> Result<Json<MessageResponse>> {
    let task_id = parse_id(&task_id, "task")?;

    let result = state
        .tasks()
        .update_one(&task_id, &changes)
        .await
        .map_err(|e| Error::store("Failed to update task", e))?;

    if result.matched_count == 0 {
        tracing::error!(task_id = %task_id, "Task not found");
        return Err(Error::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, "Task updated successfully");
    Ok(Json(MessageResponse::new("Task updated successfully")))
}

/// `DELETE /api/v1/tasks/{taskId}`
pub async fn delete_task<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let task_id = parse_id(&task_id, "task")?;

    let result = state
        .tasks()
        .delete_one(&task_id)
        .await
        .map_err(|e| Error::store("Failed to delete task", e))?;

    if result.deleted_count == 0 {
        tracing::error!(task_id = %task_id, "Task not found");
        return Err(Error::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, "Task deleted successfully");
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
