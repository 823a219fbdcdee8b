//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::models::{Task, User};
use crate::store::{CollectionHandle, Collections, DocumentStore, SurrealStore};

/// Application state shared across handlers
///
/// Generic over the store so handlers can be driven by an in-process store
/// in tests; production uses [`SurrealStore`].
#[derive(Clone)]
pub struct AppState<S = SurrealStore>
where
    S: DocumentStore,
{
    config: Arc<Config>,
    store: S,
    collections: Collections<S>,
}

impl<S: DocumentStore> AppState<S> {
    /// Build the state around a connected store, resolving every collection
    pub fn new(config: Config, store: S) -> Self {
        let collections = Collections::resolve(&store, config.store.operation_timeout());
        Self {
            config: Arc::new(config),
            store,
            collections,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the store client
    pub fn store(&self) -> &S {
        &self.store
    }

    /// `users` collection
    pub fn users(&self) -> &CollectionHandle<S, User> {
        &self.collections.users
    }

    /// `tasks` collection
    pub fn tasks(&self) -> &CollectionHandle<S, Task> {
        &self.collections.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_state_shares_config() {
        let mut config = Config::default();
        config.service.name = "state-test".to_string();

        let state = AppState::new(config, MemoryStore::new());
        let cloned = state.clone();

        assert_eq!(cloned.config().service.name, "state-test");
        assert_eq!(cloned.tasks().name(), "tasks");
        assert_eq!(cloned.users().name(), "users");
    }
}
