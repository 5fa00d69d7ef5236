//! Provider key → driver class registry.
//!
//! A key maps to a `(module locator, class name)` pair. Modules come from lazy
//! loaders registered under their locator; a module is built on first use and
//! cached afterwards. Entries are overwritten, never removed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use cloud_orchestrator_provider::{
    builtin_modules, AutoScaleDriver, DnsDriver, Driver, DriverClass, DriverCredentials,
    DriverFamily, DriverModule, DriverOptions, ModuleLoader, NodeDriver, ProviderKey,
    ProviderMetadata, StorageDriver,
};

use crate::error::{CoreError, CoreResult, DriverLoadError};
use crate::table::{DriverEntry, DEFAULT_DRIVERS};

/// Where a key points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    locator: String,
    class_name: String,
}

/// A registry row as reported by [`DriverRegistry::list_providers`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredProvider {
    pub key: ProviderKey,
    pub locator: String,
    pub class_name: String,
}

#[derive(Default)]
struct State {
    entries: HashMap<ProviderKey, Target>,
    loaders: HashMap<String, ModuleLoader>,
    modules: HashMap<String, Arc<DriverModule>>,
}

/// Process-wide driver registry, owned by the composition root.
///
/// Reads run concurrently; registrations are serialized by the lock.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    state: Arc<RwLock<State>>,
}

impl DriverRegistry {
    /// Empty registry: no keys, no module loaders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`DEFAULT_DRIVERS`] and the loaders of every module compiled
    /// into `cloud-orchestrator-provider`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_table(DEFAULT_DRIVERS)
    }

    /// Registry built from a static table plus the built-in module loaders.
    #[must_use]
    pub fn with_table(table: &[DriverEntry]) -> Self {
        let mut state = State::default();
        for (locator, loader) in builtin_modules() {
            state.loaders.insert(locator.to_string(), loader);
        }
        for (key, locator, class_name) in table {
            state.entries.insert(
                key.clone(),
                Target {
                    locator: (*locator).to_string(),
                    class_name: (*class_name).to_string(),
                },
            );
        }
        log::debug!(
            "Driver registry initialized: {} keys, {} modules",
            state.entries.len(),
            state.loaders.len()
        );
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Register a lazy module initializer under `locator`.
    ///
    /// The loader runs on the first resolution that needs it. Replacing a loader
    /// drops the module cached for that locator.
    pub async fn register_module<F>(&self, locator: impl Into<String>, loader: F)
    where
        F: Fn() -> cloud_orchestrator_provider::Result<DriverModule> + Send + Sync + 'static,
    {
        let locator = locator.into();
        let mut state = self.state.write().await;
        if state.loaders.insert(locator.clone(), Arc::new(loader)).is_some() {
            log::info!("Replaced driver module loader {locator}");
        } else {
            log::debug!("Registered driver module loader {locator}");
        }
        state.modules.remove(&locator);
    }

    /// Resolve `key` to its driver class, loading its module if needed.
    pub async fn get_driver(&self, key: &ProviderKey) -> CoreResult<DriverClass> {
        let target = self
            .state
            .read()
            .await
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::ProviderNotFound(key.clone()))?;
        self.resolve(key, &target).await
    }

    /// Point `key` at `class_name` inside `locator` and resolve it immediately.
    ///
    /// Last write wins. If the new target does not resolve, the previous entry
    /// (or the absence of one) is restored and the resolution error is returned.
    pub async fn set_driver(
        &self,
        key: ProviderKey,
        locator: impl Into<String>,
        class_name: impl Into<String>,
    ) -> CoreResult<DriverClass> {
        let target = Target {
            locator: locator.into(),
            class_name: class_name.into(),
        };

        let previous = self
            .state
            .write()
            .await
            .entries
            .insert(key.clone(), target.clone());

        match self.resolve(&key, &target).await {
            Ok(class) => {
                match &previous {
                    Some(old) if *old != target => log::info!(
                        "Driver {key} changed from {}::{} to {}::{}",
                        old.locator,
                        old.class_name,
                        target.locator,
                        target.class_name
                    ),
                    Some(_) => {}
                    None => log::info!(
                        "Driver {key} registered as {}::{}",
                        target.locator,
                        target.class_name
                    ),
                }
                Ok(class)
            }
            Err(e) => {
                log::warn!("Rejected driver {key}: {e}");
                let mut state = self.state.write().await;
                // Only roll back if nobody registered something else meanwhile.
                if state.entries.get(&key) == Some(&target) {
                    match previous {
                        Some(old) => {
                            state.entries.insert(key, old);
                        }
                        None => {
                            state.entries.remove(&key);
                        }
                    }
                }
                Err(e)
            }
        }
    }

    /// Registered keys, optionally restricted to one family, sorted by key.
    pub async fn list_providers(&self, family: Option<DriverFamily>) -> Vec<RegisteredProvider> {
        let state = self.state.read().await;
        let mut rows: Vec<_> = state
            .entries
            .iter()
            .filter(|(key, _)| family.is_none_or(|f| key.family() == f))
            .map(|(key, target)| RegisteredProvider {
                key: key.clone(),
                locator: target.locator.clone(),
                class_name: target.class_name.clone(),
            })
            .collect();
        rows.sort_by_key(|row| row.key.to_string());
        rows
    }

    /// Metadata of every registered key that currently resolves, sorted by key.
    ///
    /// The metadata `key` is rewritten to the registry key, so classes registered
    /// under extra keys are reported under those keys.
    pub async fn provider_metadata(&self) -> Vec<ProviderMetadata> {
        let mut out = Vec::new();
        for row in self.list_providers(None).await {
            match self.get_driver(&row.key).await {
                Ok(class) => {
                    let mut metadata = class.metadata().clone();
                    metadata.key = row.key;
                    out.push(metadata);
                }
                Err(e) => log::debug!("Skipping {} in metadata listing: {e}", row.key),
            }
        }
        out
    }

    /// Resolve `key` and instantiate its class with `credentials`.
    pub async fn instantiate(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> CoreResult<Driver> {
        let class = self.get_driver(key).await?;
        Ok(class.instantiate(credentials, options)?)
    }

    pub async fn create_node_driver(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> CoreResult<Arc<dyn NodeDriver>> {
        expect_family(key, DriverFamily::Compute)?;
        let driver = self.instantiate(key, credentials, options).await?;
        let actual = driver.family();
        driver
            .into_compute()
            .ok_or_else(|| mismatch(key, DriverFamily::Compute, actual))
    }

    pub async fn create_storage_driver(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> CoreResult<Arc<dyn StorageDriver>> {
        expect_family(key, DriverFamily::Storage)?;
        let driver = self.instantiate(key, credentials, options).await?;
        let actual = driver.family();
        driver
            .into_storage()
            .ok_or_else(|| mismatch(key, DriverFamily::Storage, actual))
    }

    pub async fn create_dns_driver(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> CoreResult<Arc<dyn DnsDriver>> {
        expect_family(key, DriverFamily::Dns)?;
        let driver = self.instantiate(key, credentials, options).await?;
        let actual = driver.family();
        driver
            .into_dns()
            .ok_or_else(|| mismatch(key, DriverFamily::Dns, actual))
    }

    pub async fn create_autoscale_driver(
        &self,
        key: &ProviderKey,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> CoreResult<Arc<dyn AutoScaleDriver>> {
        expect_family(key, DriverFamily::AutoScale)?;
        let driver = self.instantiate(key, credentials, options).await?;
        let actual = driver.family();
        driver
            .into_autoscale()
            .ok_or_else(|| mismatch(key, DriverFamily::AutoScale, actual))
    }

    async fn resolve(&self, key: &ProviderKey, target: &Target) -> CoreResult<DriverClass> {
        let module = self.load_module(&target.locator).await?;
        let class = module
            .class(&target.class_name)
            .cloned()
            .ok_or_else(|| DriverLoadError::ClassNotFound {
                locator: target.locator.clone(),
                class_name: target.class_name.clone(),
            })?;
        if class.family() != key.family() {
            return Err(mismatch(key, key.family(), class.family()));
        }
        Ok(class)
    }

    async fn load_module(&self, locator: &str) -> CoreResult<Arc<DriverModule>> {
        let loader = {
            let state = self.state.read().await;
            if let Some(module) = state.modules.get(locator) {
                return Ok(Arc::clone(module));
            }
            state.loaders.get(locator).cloned()
        };
        let loader = loader.ok_or_else(|| DriverLoadError::ModuleLoad {
            locator: locator.to_string(),
            reason: "no module registered at this locator".to_string(),
        })?;

        // Loaders are synchronous and cheap; run outside the lock.
        let module = loader().map_err(|e| DriverLoadError::ModuleLoad {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;
        log::debug!("Loaded driver module {locator}");

        let mut state = self.state.write().await;
        let module = state
            .modules
            .entry(locator.to_string())
            .or_insert_with(|| Arc::new(module));
        Ok(Arc::clone(module))
    }
}

fn mismatch(key: &ProviderKey, expected: DriverFamily, actual: DriverFamily) -> CoreError {
    CoreError::FamilyMismatch {
        key: key.clone(),
        expected,
        actual,
    }
}

fn expect_family(key: &ProviderKey, expected: DriverFamily) -> CoreResult<()> {
    if key.family() == expected {
        Ok(())
    } else {
        Err(mismatch(key, expected, key.family()))
    }
}
