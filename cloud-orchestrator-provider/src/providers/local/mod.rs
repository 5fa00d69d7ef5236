//! Local filesystem storage driver
//!
//! Containers are directories directly below the root; objects are files inside them,
//! with `/` in object names mapped to subdirectories. Writes go to a temporary file that
//! is renamed into place, so readers never observe a partial object. Multipart uploads
//! keep their parts under `<root>/.multipart/<upload id>/` until completed or aborted.

mod provider;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::factory::{DriverClass, DriverModule};
use crate::provider_keys;
use crate::providers::common::metadata;
use crate::traits::StorageDriver;
use crate::types::{DriverCredentials, DriverOptions, FieldType, ProviderMetadata};

pub const CLASS_NAME: &str = "LocalStorageDriver";

const PROVIDER: &str = "local";
const MULTIPART_DIR: &str = ".multipart";

/// Object storage on the local filesystem.
pub struct LocalStorageDriver {
    root: PathBuf,
}

impl LocalStorageDriver {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(invalid("key", "root directory must not be empty"));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata() -> ProviderMetadata {
        metadata(
            provider_keys::storage::LOCAL,
            "Local filesystem",
            "Containers and objects stored as directories and files",
            None,
            &[("key", "Root directory", FieldType::Text)],
        )
    }

    fn container_path(&self, container: &str) -> Result<PathBuf> {
        check_segment("container", container)?;
        if container.starts_with('.') {
            return Err(invalid(
                "container",
                format!("container name '{container}' must not start with '.'"),
            ));
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, name: &str) -> Result<PathBuf> {
        let mut path = self.container_path(container)?;
        for segment in name.split('/') {
            check_segment("name", segment)?;
            // dot entries are reserved for temp files and upload state
            if segment.starts_with('.') {
                return Err(invalid(
                    "name",
                    format!("object name '{name}' has a segment starting with '.'"),
                ));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn upload_dir(&self, upload_id: &str) -> Result<PathBuf> {
        check_segment("upload_id", upload_id)?;
        Ok(self.root.join(MULTIPART_DIR).join(upload_id))
    }
}

fn check_segment(param: &str, segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['/', '\\'])
    {
        return Err(invalid(param, format!("invalid path segment '{segment}'")));
    }
    Ok(())
}

fn invalid(param: &str, detail: impl Into<String>) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: PROVIDER.to_string(),
        param: param.to_string(),
        detail: detail.into(),
    }
}

/// 将 I/O 错误映射为统一错误类型
fn io_error(err: &std::io::Error, resource: &str, id: &str) -> ProviderError {
    match err.kind() {
        ErrorKind::NotFound => ProviderError::not_found(PROVIDER, resource, id),
        ErrorKind::AlreadyExists => ProviderError::ResourceExists {
            provider: PROVIDER.to_string(),
            resource: resource.to_string(),
            name: id.to_string(),
            raw_message: Some(err.to_string()),
        },
        ErrorKind::PermissionDenied => ProviderError::PermissionDenied {
            provider: PROVIDER.to_string(),
            raw_message: Some(err.to_string()),
        },
        _ => ProviderError::IoError {
            provider: PROVIDER.to_string(),
            detail: format!("{resource} '{id}': {err}"),
        },
    }
}

/// Module table for `local`.
pub fn module() -> DriverModule {
    DriverModule::new().with_class(DriverClass::storage(
        CLASS_NAME,
        LocalStorageDriver::metadata(),
        |credentials: DriverCredentials, _: &DriverOptions| {
            let driver: Arc<dyn StorageDriver> = Arc::new(LocalStorageDriver::new(credentials.key)?);
            Ok(driver)
        },
    ))
}
