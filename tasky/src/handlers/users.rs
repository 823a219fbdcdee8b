//! User handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::error::{Error, Result};
use crate::extract::{parse_id, JsonBody};
use crate::ids::ObjectId;
use crate::models::{User, UserChanges, UserResponse};
use crate::state::AppState;
use crate::store::{DocumentStore, Filter, FindOptions};

/// Response body of `GET /api/v1/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<UserResponse>,
    pub count: usize,
}

/// Response body of a successful create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub message: String,
    pub user_id: ObjectId,
}

/// `GET /api/v1/users`
pub async fn list_users<S: DocumentStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<UserList>> {
    let users: Vec<UserResponse> = state
        .users()
        .find(&Filter::all(), FindOptions::default())
        .await
        .map_err(|e| Error::store("Failed to fetch users", e))?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    tracing::info!(count = users.len(), "All users fetched successfully");
    Ok(Json(UserList {
        count: users.len(),
        users,
    }))
}

/// `POST /api/v1/users`
pub async fn create_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    JsonBody(request): JsonBody<UserChanges>,
) -> Result<(StatusCode, Json<UserCreated>)> {
    let user = User::from(request);

    let user_id = state
        .users()
        .insert_one(&user)
        .await
        .map_err(|e| Error::store("Failed to create user", e))?;

    tracing::info!(user_id = %user_id, "User created successfully");
    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "User created successfully".to_string(),
            user_id,
        }),
    ))
}

/// `GET /api/v1/users/{userId}`
pub async fn get_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user_id = parse_id(&user_id, "user")?;

    let user = state
        .users()
        .find_one(&user_id)
        .await
        .map_err(|e| Error::store("Failed to fetch user", e))?
        .ok_or_else(|| {
            tracing::error!(user_id = %user_id, "User not found");
            Error::NotFound("User not found".to_string())
        })?;

    tracing::info!(user_id = %user_id, "User fetched successfully");
    Ok(Json(UserResponse::from(user)))
}

/// `PUT /api/v1/users/{userId}`
pub async fn update_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    JsonBody(changes): JsonBody<UserChanges>,
) -> Result<Json<MessageResponse>> {
    let user_id = parse_id(&user_id, "user")?;

    let result = state
        .users()
        .update_one(&user_id, &changes)
        .await
        .map_err(|e| Error::store("Failed to update user", e))?;

    if result.matched_count == 0 {
        tracing::error!(user_id = %user_id, "User not found");
        return Err(Error::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user_id, "User updated successfully");
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// `DELETE /api/v1/users/{userId}`
///
/// The user's tasks are left in place.
pub async fn delete_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let user_id = parse_id(&user_id, "user")?;

    let result = state
        .users()
        .delete_one(&user_id)
        .await
        .map_err(|e| Error::store("Failed to delete user", e))?;

    if result.deleted_count == 0 {
        tracing::error!(user_id = %user_id, "User not found");
        return Err(Error::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user_id, "User deleted successfully");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
