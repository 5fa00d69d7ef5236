//! Live driver instances, one per caller session.
//!
//! A driver owns one set of credentials and its connection state, so sessions are
//! never shared across credentials: each `open` instantiates a fresh driver.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cloud_orchestrator_provider::{Driver, DriverCredentials, DriverOptions, ProviderKey};

use crate::error::{CoreError, CoreResult};
use crate::registry::DriverRegistry;

/// An open session as listed by [`SessionStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub key: ProviderKey,
}

/// Session store trait
///
/// Holds driver instances by session id. [`InMemorySessionStore`] is the default
/// implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a driver under `session_id`, replacing any previous one.
    async fn insert(&self, session_id: String, key: ProviderKey, driver: Driver);

    /// Drop the session. Returns whether it existed.
    async fn remove(&self, session_id: &str) -> bool;

    async fn get(&self, session_id: &str) -> Option<Driver>;

    async fn list(&self) -> Vec<SessionInfo>;
}

/// In-memory session store
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, (ProviderKey, Driver)>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session_id: String, key: ProviderKey, driver: Driver) {
        self.sessions.write().await.insert(session_id, (key, driver));
    }

    async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    async fn get(&self, session_id: &str) -> Option<Driver> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|(_, driver)| driver.clone())
    }

    async fn list(&self) -> Vec<SessionInfo> {
        let mut out: Vec<_> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, (key, _))| SessionInfo {
                id: id.clone(),
                key: key.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

/// Opens driver sessions through a registry and keeps them in a store.
pub struct SessionManager {
    registry: DriverRegistry,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    #[must_use]
    pub fn new(registry: DriverRegistry, store: Arc<dyn SessionStore>) -> Self {
        Self { registry, store }
    }

    /// Manager over an [`InMemorySessionStore`].
    #[must_use]
    pub fn in_memory(registry: DriverRegistry) -> Self {
        Self::new(registry, Arc::new(InMemorySessionStore::new()))
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Instantiate the driver registered for `key` and store it under a new session id.
    ///
    /// With `validate` set, the credentials are checked against the vendor first and
    /// rejected credentials fail with `InvalidCredentials`.
    pub async fn open(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
        validate: bool,
    ) -> CoreResult<String> {
        let driver = self.registry.instantiate(key, credentials, options).await?;
        if validate && !driver.validate_credentials().await? {
            log::warn!("Credentials rejected by {key}");
            return Err(CoreError::Provider(
                cloud_orchestrator_provider::ProviderError::InvalidCredentials {
                    provider: driver.id().to_string(),
                    raw_message: None,
                },
            ));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        log::info!("Opened session {session_id} for {key}");
        self.store.insert(session_id.clone(), key.clone(), driver).await;
        Ok(session_id)
    }

    pub async fn driver(&self, session_id: &str) -> CoreResult<Driver> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))
    }

    pub async fn close(&self, session_id: &str) -> CoreResult<()> {
        if self.store.remove(session_id).await {
            log::info!("Closed session {session_id}");
            Ok(())
        } else {
            Err(CoreError::SessionNotFound(session_id.to_string()))
        }
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.store.list().await
    }
}
