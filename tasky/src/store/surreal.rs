//! SurrealDB-backed [`DocumentStore`]
//!
//! Supports runtime protocol selection via URL scheme:
//! - `ws://` / `wss://` - WebSocket connections
//! - `http://` / `https://` - HTTP connections
//! - `mem://` - In-memory database (for testing)
//!
//! Each collection is a table; a document is stored as the record
//! `<collection>:⟨<object id hex>⟩` with its fields as content.
//!
//! Both tables are schemafull. [`SCHEMA`] is applied on every connect and
//! rejects documents with missing or ill-typed fields.

use serde::{de::IgnoredAny, Deserialize, Serialize};
use std::time::Duration;

use super::{DeleteResult, Document, DocumentStore, Filter, FindOptions, UpdateResult};
use crate::config::StoreConfig;
use crate::error::{sanitize_url, StoreError, StoreErrorKind, StoreOperation, StoreResult};
use crate::ids::ObjectId;

/// Table, field and index definitions for `users` and `tasks`
///
/// Every statement is `IF NOT EXISTS`, so applying it to an existing
/// database is a no-op.
pub const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS users SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON TABLE users TYPE string;
DEFINE FIELD IF NOT EXISTS email ON TABLE users TYPE string;
DEFINE FIELD IF NOT EXISTS password ON TABLE users TYPE string;

DEFINE TABLE IF NOT EXISTS tasks SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS title ON TABLE tasks TYPE string;
DEFINE FIELD IF NOT EXISTS description ON TABLE tasks TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS completed ON TABLE tasks TYPE bool DEFAULT false;
DEFINE FIELD IF NOT EXISTS userId ON TABLE tasks TYPE string
    ASSERT string::len($value) = 24 AND string::is::hexadecimal($value);
DEFINE INDEX IF NOT EXISTS tasks_user_id ON TABLE tasks FIELDS userId;
"#;

/// SurrealDB client type alias using the `Any` engine for runtime protocol selection
pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// A connected SurrealDB client
#[derive(Clone)]
pub struct SurrealStore {
    client: SurrealClient,
}

impl SurrealStore {
    /// Connect with retries and exponential backoff, then verify the connection
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let mut attempt = 0;

        loop {
            match Self::try_connect(config).await {
                Ok(store) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Store connection established after {} attempt(s)",
                            attempt + 1
                        );
                    } else {
                        tracing::info!(
                            "Store connected: url={}, ns={}, db={}",
                            sanitize_url(&config.url),
                            config.namespace,
                            config.database
                        );
                    }
                    return Ok(store);
                }
                Err(e) => {
                    attempt += 1;

                    if attempt > config.max_retries || !e.is_retriable() {
                        tracing::error!(
                            "Failed to connect to the store after {} attempt(s): {}",
                            attempt,
                            e
                        );
                        return Err(e);
                    }

                    let delay = backoff(config.retry_delay(), attempt);
                    tracing::warn!(
                        "Store connection attempt {} failed: {}. Retrying in {:?}...",
                        attempt,
                        e,
                        delay
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Single connection attempt
    async fn try_connect(config: &StoreConfig) -> StoreResult<Self> {
        tracing::debug!("Connecting to store: {}", sanitize_url(&config.url));

        let client = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .map_err(|e| connect_error(&e))?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client
                .signin(surrealdb::opt::auth::Root { username, password })
                .await
                .map_err(|e| connect_error(&e))?;
        }

        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| connect_error(&e))?;

        let store = Self { client };
        store.ping().await?;
        store.define_schema().await?;
        Ok(store)
    }

    /// Apply [`SCHEMA`] to the selected namespace and database
    async fn define_schema(&self) -> StoreResult<()> {
        self.client
            .query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .map_err(|e| store_error(StoreOperation::DefineSchema, &e))?;
        tracing::debug!("Store schema defined for users and tasks");
        Ok(())
    }
}

/// `base * 2^(attempt - 1)`, saturating
fn backoff(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(multiplier)
}

/// Categorize a driver error by its message
fn categorize(err: &surrealdb::Error) -> StoreErrorKind {
    let message = err.to_string().to_lowercase();

    if message.contains("auth")
        || message.contains("credentials")
        || message.contains("signin")
        || message.contains("not allowed")
    {
        StoreErrorKind::Authentication
    } else if message.contains("connect")
        || message.contains("network")
        || message.contains("dns")
        || message.contains("refused")
        || message.contains("closed")
    {
        StoreErrorKind::ConnectionFailed
    } else if message.contains("timeout") || message.contains("timed out") {
        StoreErrorKind::Timeout
    } else if message.contains("deserializ")
        || message.contains("serializ")
        || message.contains("invalid type")
        || message.contains("missing field")
    {
        StoreErrorKind::Serialization
    } else if message.contains("parse") || message.contains("syntax") {
        StoreErrorKind::QueryFailed
    } else {
        StoreErrorKind::Other
    }
}

fn store_error(operation: StoreOperation, err: &surrealdb::Error) -> StoreError {
    StoreError::new(operation, categorize(err), err.to_string())
}

fn connect_error(err: &surrealdb::Error) -> StoreError {
    match categorize(err) {
        StoreErrorKind::Authentication => StoreError::new(
            StoreOperation::Connect,
            StoreErrorKind::Authentication,
            err.to_string(),
        ),
        _ => StoreError::connection_failed(err.to_string()),
    }
}

fn to_content<V: Serialize>(operation: StoreOperation, value: &V) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::serialization(operation, e.to_string()))
}

/// `record::id(id) AS id, <fields>` for a document type
fn projection<T: Document>() -> String {
    std::iter::once("record::id(id) AS id")
        .chain(T::FIELDS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field names come from [`Document::FIELDS`] constants, values are bound
fn where_clause(filter: &Filter) -> String {
    match filter.condition() {
        Some((field, _)) => format!(" WHERE {} = $value", field),
        None => String::new(),
    }
}

impl DocumentStore for SurrealStore {
    async fn ping(&self) -> StoreResult<()> {
        self.client
            .health()
            .await
            .map_err(|e| store_error(StoreOperation::Ping, &e))
    }

    async fn insert_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
        document: &T,
    ) -> StoreResult<()> {
        let content = to_content(StoreOperation::Insert, document)?;
        self.client
            .query("CREATE type::thing($tb, $id) CONTENT $content RETURN NONE")
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_hex()))
            .bind(("content", content))
            .await
            .and_then(|response| response.check())
            .map_err(|e| store_error(StoreOperation::Insert, &e))?;
        Ok(())
    }

    async fn find_one<T: Document>(
        &self,
        collection: &str,
        id: &ObjectId,
    ) -> StoreResult<Option<T>> {
        let sql = format!("SELECT {} FROM type::thing($tb, $id)", projection::<T>());
        let mut response = self
            .client
            .query(sql)
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_hex()))
            .await
            .map_err(|e| store_error(StoreOperation::Find, &e))?;
        response
            .take::<Option<T>>(0)
            .map_err(|e| store_error(StoreOperation::Find, &e))
    }

    async fn find<T: Document>(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<T>> {
        let mut sql = format!(
            "SELECT {} FROM type::table($tb){} ORDER BY id ASC",
            projection::<T>(),
            where_clause(filter)
        );
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {}", limit.min(i64::MAX as u64)));
        }
        if options.skip > 0 {
            sql.push_str(&format!(" START {}", options.skip.min(i64::MAX as u64)));
        }

        let mut query = self.client.query(sql).bind(("tb", collection.to_string()));
        if let Some((_, value)) = filter.condition() {
            query = query.bind(("value", value.to_string()));
        }

        let mut response = query
            .await
            .map_err(|e| store_error(StoreOperation::Find, &e))?;
        response
            .take::<Vec<T>>(0)
            .map_err(|e| store_error(StoreOperation::Find, &e))
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let sql = format!(
            "SELECT count() AS total FROM type::table($tb){} GROUP ALL",
            where_clause(filter)
        );

        let mut query = self.client.query(sql).bind(("tb", collection.to_string()));
        if let Some((_, value)) = filter.condition() {
            query = query.bind(("value", value.to_string()));
        }

        let mut response = query
            .await
            .map_err(|e| store_error(StoreOperation::Count, &e))?;
        let row = response
            .take::<Option<CountRow>>(0)
            .map_err(|e| store_error(StoreOperation::Count, &e))?;
        Ok(row.map(|row| row.total).unwrap_or_default())
    }

    async fn update_one<C: Serialize + Send + Sync>(
        &self,
        collection: &str,
        id: &ObjectId,
        changes: &C,
    ) -> StoreResult<UpdateResult> {
        let changes = to_content(StoreOperation::Update, changes)?;
        let mut response = self
            .client
            .query("UPDATE type::thing($tb, $id) MERGE $changes RETURN id")
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_hex()))
            .bind(("changes", changes))
            .await
            .map_err(|e| store_error(StoreOperation::Update, &e))?;
        let updated = response
            .take::<Vec<IgnoredAny>>(0)
            .map_err(|e| store_error(StoreOperation::Update, &e))?;
        Ok(UpdateResult {
            matched_count: updated.len() as u64,
        })
    }

    async fn delete_one(&self, collection: &str, id: &ObjectId) -> StoreResult<DeleteResult> {
        let mut response = self
            .client
            .query("DELETE type::thing($tb, $id) RETURN BEFORE")
            .bind(("tb", collection.to_string()))
            .bind(("id", id.to_hex()))
            .await
            .map_err(|e| store_error(StoreOperation::Delete, &e))?;
        let deleted = response
            .take::<Vec<IgnoredAny>>(0)
            .map_err(|e| store_error(StoreOperation::Delete, &e))?;
        Ok(DeleteResult {
            deleted_count: deleted.len() as u64,
        })
    }
}
