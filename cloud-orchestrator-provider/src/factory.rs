//! Driver classes, driver modules and the instantiated [`Driver`] handle.
//!
//! A [`DriverModule`] is what a module locator resolves to: a table of named
//! [`DriverClass`]es. A class carries its metadata and a constructor for one driver
//! family. Instantiating a class with credentials yields a [`Driver`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
#[cfg(any(
    feature = "dummy",
    feature = "digitalocean",
    feature = "local-storage",
    feature = "cloudflare",
    feature = "softlayer"
))]
use crate::provider_keys::locators;
use crate::traits::{AutoScaleDriver, DnsDriver, NodeDriver, ProviderDriver, StorageDriver};
use crate::types::{DriverCredentials, DriverFamily, DriverOptions, ProviderMetadata};

type Constructor<T> =
    Arc<dyn Fn(DriverCredentials, &DriverOptions) -> Result<Arc<T>> + Send + Sync>;

/// Family-specific driver constructor.
#[derive(Clone)]
pub enum DriverConstructor {
    Compute(Constructor<dyn NodeDriver>),
    Storage(Constructor<dyn StorageDriver>),
    Dns(Constructor<dyn DnsDriver>),
    AutoScale(Constructor<dyn AutoScaleDriver>),
}

impl DriverConstructor {
    pub fn family(&self) -> DriverFamily {
        match self {
            Self::Compute(_) => DriverFamily::Compute,
            Self::Storage(_) => DriverFamily::Storage,
            Self::Dns(_) => DriverFamily::Dns,
            Self::AutoScale(_) => DriverFamily::AutoScale,
        }
    }
}

/// A resolvable driver class.
#[derive(Clone)]
pub struct DriverClass {
    name: String,
    metadata: ProviderMetadata,
    constructor: DriverConstructor,
}

impl std::fmt::Debug for DriverClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverClass")
            .field("name", &self.name)
            .field("family", &self.family())
            .field("key", &self.metadata.key)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DriverClass {
    /// Two classes are the same when they share a name and a constructor.
    fn eq(&self, other: &Self) -> bool {
        let same_ctor = match (&self.constructor, &other.constructor) {
            (DriverConstructor::Compute(a), DriverConstructor::Compute(b)) => Arc::ptr_eq(a, b),
            (DriverConstructor::Storage(a), DriverConstructor::Storage(b)) => Arc::ptr_eq(a, b),
            (DriverConstructor::Dns(a), DriverConstructor::Dns(b)) => Arc::ptr_eq(a, b),
            (DriverConstructor::AutoScale(a), DriverConstructor::AutoScale(b)) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        };
        same_ctor && self.name == other.name
    }
}

impl DriverClass {
    pub fn new(
        name: impl Into<String>,
        metadata: ProviderMetadata,
        constructor: DriverConstructor,
    ) -> Self {
        Self {
            name: name.into(),
            metadata,
            constructor,
        }
    }

    /// Compute class from a constructor function.
    pub fn compute<F>(name: impl Into<String>, metadata: ProviderMetadata, ctor: F) -> Self
    where
        F: Fn(DriverCredentials, &DriverOptions) -> Result<Arc<dyn NodeDriver>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, metadata, DriverConstructor::Compute(Arc::new(ctor)))
    }

    /// Storage class from a constructor function.
    pub fn storage<F>(name: impl Into<String>, metadata: ProviderMetadata, ctor: F) -> Self
    where
        F: Fn(DriverCredentials, &DriverOptions) -> Result<Arc<dyn StorageDriver>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, metadata, DriverConstructor::Storage(Arc::new(ctor)))
    }

    /// DNS class from a constructor function.
    pub fn dns<F>(name: impl Into<String>, metadata: ProviderMetadata, ctor: F) -> Self
    where
        F: Fn(DriverCredentials, &DriverOptions) -> Result<Arc<dyn DnsDriver>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, metadata, DriverConstructor::Dns(Arc::new(ctor)))
    }

    /// Autoscale class from a constructor function.
    pub fn autoscale<F>(name: impl Into<String>, metadata: ProviderMetadata, ctor: F) -> Self
    where
        F: Fn(DriverCredentials, &DriverOptions) -> Result<Arc<dyn AutoScaleDriver>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, metadata, DriverConstructor::AutoScale(Arc::new(ctor)))
    }

    /// Class name inside its module (e.g. `"DigitalOceanNodeDriver"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> DriverFamily {
        self.constructor.family()
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// Check the credential fields, then construct a driver instance.
    pub fn instantiate(
        &self,
        credentials: DriverCredentials,
        options: &DriverOptions,
    ) -> Result<Driver> {
        DriverCredentials::from_map(&self.metadata, &credentials.to_map()).map_err(|e| {
            ProviderError::InvalidParameter {
                provider: self.metadata.key.name().to_string(),
                param: "credentials".to_string(),
                detail: e.to_string(),
            }
        })?;

        log::debug!("Instantiating {} ({})", self.name, self.metadata.key);
        Ok(match &self.constructor {
            DriverConstructor::Compute(ctor) => Driver::Compute(ctor(credentials, options)?),
            DriverConstructor::Storage(ctor) => Driver::Storage(ctor(credentials, options)?),
            DriverConstructor::Dns(ctor) => Driver::Dns(ctor(credentials, options)?),
            DriverConstructor::AutoScale(ctor) => Driver::AutoScale(ctor(credentials, options)?),
        })
    }
}

/// A live driver instance of any family.
#[derive(Clone)]
pub enum Driver {
    Compute(Arc<dyn NodeDriver>),
    Storage(Arc<dyn StorageDriver>),
    Dns(Arc<dyn DnsDriver>),
    AutoScale(Arc<dyn AutoScaleDriver>),
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Driver({}:{})", self.family(), self.id())
    }
}

impl Driver {
    pub fn family(&self) -> DriverFamily {
        match self {
            Self::Compute(_) => DriverFamily::Compute,
            Self::Storage(_) => DriverFamily::Storage,
            Self::Dns(_) => DriverFamily::Dns,
            Self::AutoScale(_) => DriverFamily::AutoScale,
        }
    }

    fn common(&self) -> &dyn ProviderDriver {
        match self {
            Self::Compute(d) => &**d,
            Self::Storage(d) => &**d,
            Self::Dns(d) => &**d,
            Self::AutoScale(d) => &**d,
        }
    }

    pub fn id(&self) -> &'static str {
        self.common().id()
    }

    pub async fn validate_credentials(&self) -> Result<bool> {
        self.common().validate_credentials().await
    }

    pub fn into_compute(self) -> Option<Arc<dyn NodeDriver>> {
        match self {
            Self::Compute(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_storage(self) -> Option<Arc<dyn StorageDriver>> {
        match self {
            Self::Storage(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_dns(self) -> Option<Arc<dyn DnsDriver>> {
        match self {
            Self::Dns(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_autoscale(self) -> Option<Arc<dyn AutoScaleDriver>> {
        match self {
            Self::AutoScale(d) => Some(d),
            _ => None,
        }
    }
}

/// A loaded driver module: class name to class.
#[derive(Debug, Clone, Default)]
pub struct DriverModule {
    classes: HashMap<String, DriverClass>,
}

impl DriverModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, replacing any class with the same name.
    #[must_use]
    pub fn with_class(mut self, class: DriverClass) -> Self {
        self.classes.insert(class.name().to_string(), class);
        self
    }

    pub fn class(&self, name: &str) -> Option<&DriverClass> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &DriverClass> {
        self.classes.values()
    }
}

/// Lazy initializer producing a module on first use.
pub type ModuleLoader = Arc<dyn Fn() -> Result<DriverModule> + Send + Sync>;

#[cfg(any(
    feature = "dummy",
    feature = "digitalocean",
    feature = "local-storage",
    feature = "cloudflare",
    feature = "softlayer"
))]
fn loader(build: fn() -> DriverModule) -> ModuleLoader {
    Arc::new(move || Ok::<_, ProviderError>(build()))
}

/// Loaders for every driver module compiled into this crate.
pub fn builtin_modules() -> Vec<(&'static str, ModuleLoader)> {
    #[allow(unused_mut)]
    let mut modules: Vec<(&'static str, ModuleLoader)> = Vec::new();
    #[cfg(feature = "dummy")]
    modules.push((locators::DUMMY, loader(crate::providers::dummy::module)));
    #[cfg(feature = "digitalocean")]
    modules.push((
        locators::DIGITAL_OCEAN,
        loader(crate::providers::digitalocean::module),
    ));
    #[cfg(feature = "local-storage")]
    modules.push((locators::LOCAL_STORAGE, loader(crate::providers::local::module)));
    #[cfg(feature = "cloudflare")]
    modules.push((locators::CLOUDFLARE, loader(crate::providers::cloudflare::module)));
    #[cfg(feature = "softlayer")]
    modules.push((locators::SOFTLAYER, loader(crate::providers::softlayer::module)));
    modules
}

/// Returns metadata for all drivers enabled via feature flags.
///
/// Useful for building dynamic UIs that enumerate available providers
/// and their required credential fields.
pub fn get_all_provider_metadata() -> Vec<ProviderMetadata> {
    builtin_modules()
        .into_iter()
        .filter_map(|(locator, load)| match load() {
            Ok(module) => Some(module),
            Err(e) => {
                log::warn!("Skipping driver module {locator}: {e}");
                None
            }
        })
        .flat_map(|module| {
            let mut metadata: Vec<_> = module.classes().map(|c| c.metadata().clone()).collect();
            metadata.sort_by_key(|m| m.key.to_string());
            metadata
        })
        .collect()
}
