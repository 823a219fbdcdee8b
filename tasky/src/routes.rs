//! Route table
//!
//! ```text
//! GET    /                           welcome text
//! GET    /api/v1/health              {status: "UP", version}
//! GET    /api/v1/readyz              {status: "READY"} | 503 {status: "DOWN", error}
//! GET    /api/v1/healthz             {status: "ALIVE"}
//! GET    /api/v1/users               {users, count}
//! POST   /api/v1/users               201 {message, userId}
//! GET    /api/v1/users/{userId}      user without password
//! PUT    /api/v1/users/{userId}      {message}
//! DELETE /api/v1/users/{userId}      {message}
//! GET    /api/v1/tasks               {tasks, page, limit, total}
//! POST   /api/v1/tasks               201 {message, taskId}
//! GET    /api/v1/tasks/{taskId}      task
//! PUT    /api/v1/tasks/{taskId}      {message}
//! DELETE /api/v1/tasks/{taskId}      {message}
//! GET    /api/v1/tasks/user/{userId} [task, ...]
//! ```
//!
//! The collection routes also answer with a trailing slash.

use axum::{routing::get, Router};

use crate::{
    handlers::{tasks, users},
    health,
    state::AppState,
    store::DocumentStore,
};

/// Prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router
pub fn router<S: DocumentStore>(state: AppState<S>) -> Router {
    let users_root = get(users::list_users::<S>).post(users::create_user::<S>);
    let tasks_root = get(tasks::list_tasks::<S>).post(tasks::create_task::<S>);

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/readyz", get(health::readiness::<S>))
        .route("/healthz", get(health::liveness))
        .route("/users", users_root.clone())
        .route("/users/", users_root)
        .route(
            "/users/{userId}",
            get(users::get_user::<S>)
                .put(users::update_user::<S>)
                .delete(users::delete_user::<S>),
        )
        .route("/tasks", tasks_root.clone())
        .route("/tasks/", tasks_root)
        .route(
            "/tasks/{taskId}",
            get(tasks::get_task::<S>)
                .put(tasks::update_task::<S>)
                .delete(tasks::delete_task::<S>),
        )
        .route("/tasks/user/{userId}", get(tasks::list_user_tasks::<S>));

    Router::new()
        .route("/", get(health::welcome))
        .nest(API_PREFIX, api)
        .with_state(state)
}
