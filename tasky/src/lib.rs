//! # tasky
//!
//! Task-management REST API: CRUD over users and tasks stored in a document
//! database, liveness/readiness probes and a paged task listing.
//!
//! ## Features
//!
//! - **Document store**: SurrealDB over `ws://`, `http://` or in-memory `mem://`
//! - **Middleware stack**: request IDs, sensitive header masking, tracing, panic recovery,
//!   body size limit, request timeout
//! - **Configuration**: layered TOML files and environment variables
//! - **Graceful shutdown**: SIGTERM and SIGINT drain in-flight requests
//!
//! ## Example
//!
//! ```rust,no_run
//! use tasky::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = SurrealStore::connect(&config.store).await?;
//!     let app = router(AppState::new(config.clone(), store));
//!
//!     Server::new(config).serve(app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod pagination;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

/// Commonly used items
pub mod prelude {
    pub use crate::config::{Config, LogFormat, MiddlewareConfig, ServiceConfig, StoreConfig};
    pub use crate::error::{Error, ErrorResponse, Result, StoreError, StoreErrorKind, StoreOperation};
    pub use crate::ids::{ObjectId, RequestId};
    pub use crate::models::{CreateTask, Task, TaskChanges, User, UserChanges, UserResponse};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{PageQuery, PageRequest, TaskPage, MAX_PAGINATION_LIMIT};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{Collections, DocumentStore, SurrealStore};
}
