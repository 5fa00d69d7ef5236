//! LocalStorageDriver trait 实现

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::error::{ProviderError, Result};
use crate::providers::common::sha256_hex;
use crate::traits::{ProviderDriver, StorageDriver};
use crate::types::{Container, Extra, MultipartUpload, StoredObject, UploadedPart};

use super::{LocalStorageDriver, PROVIDER, invalid, io_error};

impl LocalStorageDriver {
    async fn require_container(&self, container: &str) -> Result<PathBuf> {
        let path = self.container_path(container)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(ProviderError::not_found(PROVIDER, "container", container)),
            Err(e) => Err(io_error(&e, "container", container)),
        }
    }

    fn stored_object(container: &str, name: &str, size: u64, hash: Option<String>) -> StoredObject {
        StoredObject {
            name: name.to_string(),
            container: container.to_string(),
            size,
            hash,
            extra: Extra::new(),
        }
    }

    /// 写入临时文件后 rename，避免读到半个对象
    async fn write_atomic(&self, path: &Path, data: &[u8], id: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| invalid("name", format!("'{id}' has no parent directory")))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(&e, "object", id))?;

        let tmp = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, data)
            .await
            .map_err(|e| io_error(&e, "object", id))?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(&e, "object", id));
        }
        Ok(())
    }

    /// 删除对象后清理空的中间目录（不会删除容器目录本身）
    async fn prune_empty_dirs(container_dir: &Path, object_path: &Path) {
        let mut dir = object_path.parent();
        while let Some(d) = dir {
            if d == container_dir || fs::remove_dir(d).await.is_err() {
                break;
            }
            dir = d.parent();
        }
    }

    /// 递归列出容器内的文件，返回 (相对名称, 大小)
    async fn walk(container_dir: &Path, container: &str) -> Result<Vec<(String, u64)>> {
        let mut files = Vec::new();
        let mut pending = vec![(container_dir.to_path_buf(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| io_error(&e, "container", container))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(&e, "container", container))?
            {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if file_name.starts_with('.') {
                    continue;
                }
                let name = format!("{prefix}{file_name}");
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| io_error(&e, "object", &name))?;
                if meta.is_dir() {
                    pending.push((entry.path(), format!("{name}/")));
                } else {
                    files.push((name, meta.len()));
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl ProviderDriver for LocalStorageDriver {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match fs::metadata(self.root()).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&e, "root", &self.root().display().to_string())),
        }
    }
}

#[async_trait]
impl StorageDriver for LocalStorageDriver {
    async fn list_containers(&self) -> Result<Vec<Container>> {
        let root = self.root().display().to_string();
        let mut entries = match fs::read_dir(self.root()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&e, "root", &root)),
        };

        let mut containers = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&e, "root", &root))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| io_error(&e, "container", &name))?
                .is_dir();
            if is_dir && !name.starts_with('.') {
                containers.push(Container {
                    name,
                    extra: Extra::new(),
                });
            }
        }
        containers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(containers)
    }

    async fn get_container(&self, name: &str) -> Result<Container> {
        let path = self.require_container(name).await?;
        let mut extra = Extra::new();
        extra.insert(
            "path".to_string(),
            Value::String(path.display().to_string()),
        );
        Ok(Container {
            name: name.to_string(),
            extra,
        })
    }

    async fn create_container(&self, name: &str) -> Result<Container> {
        let path = self.container_path(name)?;
        fs::create_dir_all(self.root())
            .await
            .map_err(|e| io_error(&e, "root", &self.root().display().to_string()))?;
        fs::create_dir(&path)
            .await
            .map_err(|e| io_error(&e, "container", name))?;
        log::info!("[local] Created container {}", path.display());
        Ok(Container {
            name: name.to_string(),
            extra: Extra::new(),
        })
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        let path = self.require_container(name).await?;
        match fs::remove_dir(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => Err(invalid(
                "container",
                format!("container '{name}' is not empty"),
            )),
            Err(e) => Err(io_error(&e, "container", name)),
        }
    }

    async fn list_container_objects(&self, container: &str) -> Result<Vec<StoredObject>> {
        let dir = self.require_container(container).await?;
        let files = Self::walk(&dir, container).await?;
        Ok(files
            .into_iter()
            .map(|(name, size)| Self::stored_object(container, &name, size, None))
            .collect())
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<StoredObject> {
        let data = self.download_object(container, name).await?;
        Ok(Self::stored_object(
            container,
            name,
            data.len() as u64,
            Some(sha256_hex(&data)),
        ))
    }

    async fn upload_object(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
    ) -> Result<StoredObject> {
        self.require_container(container).await?;
        let path = self.object_path(container, name)?;
        let id = format!("{container}/{name}");
        self.write_atomic(&path, data, &id).await?;
        log::debug!("[local] Wrote {} bytes to {id}", data.len());
        Ok(Self::stored_object(
            container,
            name,
            data.len() as u64,
            Some(sha256_hex(data)),
        ))
    }

    async fn download_object(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        self.require_container(container).await?;
        let path = self.object_path(container, name)?;
        fs::read(&path)
            .await
            .map_err(|e| io_error(&e, "object", &format!("{container}/{name}")))
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        let dir = self.require_container(container).await?;
        let path = self.object_path(container, name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| io_error(&e, "object", &format!("{container}/{name}")))?;
        Self::prune_empty_dirs(&dir, &path).await;
        Ok(())
    }

    async fn initiate_multipart_upload(
        &self,
        container: &str,
        name: &str,
    ) -> Result<MultipartUpload> {
        self.require_container(container).await?;
        self.object_path(container, name)?;

        let id = uuid::Uuid::new_v4().to_string();
        let dir = self.upload_dir(&id)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&e, "multipart upload", &id))?;
        Ok(MultipartUpload {
            id,
            container: container.to_string(),
            object_name: name.to_string(),
        })
    }

    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: u32,
        data: Vec<u8>,
    ) -> Result<UploadedPart> {
        let dir = self.upload_dir(&upload.id)?;
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(ProviderError::not_found(
                PROVIDER,
                "multipart upload",
                &upload.id,
            ));
        }
        fs::write(dir.join(format!("part-{part_number:05}")), &data)
            .await
            .map_err(|e| io_error(&e, "multipart upload", &upload.id))?;
        Ok(UploadedPart {
            part_number,
            size: data.len() as u64,
            hash: sha256_hex(&data),
        })
    }

    async fn complete_multipart_upload(
        &self,
        upload: &MultipartUpload,
        parts: &[UploadedPart],
    ) -> Result<StoredObject> {
        let dir = self.upload_dir(&upload.id)?;
        let mut data = Vec::new();
        for part in parts {
            let bytes = fs::read(dir.join(format!("part-{:05}", part.part_number)))
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => invalid(
                        "parts",
                        format!("part {} was never uploaded", part.part_number),
                    ),
                    _ => io_error(&e, "multipart upload", &upload.id),
                })?;
            data.extend_from_slice(&bytes);
        }

        let object = self
            .upload_object(&upload.container, &upload.object_name, &data)
            .await?;
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| io_error(&e, "multipart upload", &upload.id))?;
        Ok(object)
    }

    async fn abort_multipart_upload(&self, upload: &MultipartUpload) -> Result<()> {
        let dir = self.upload_dir(&upload.id)?;
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| io_error(&e, "multipart upload", &upload.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerPoolConfig;
    use crate::providers::local::MULTIPART_DIR;

    fn driver(dir: &tempfile::TempDir) -> LocalStorageDriver {
        LocalStorageDriver::new(dir.path()).unwrap()
    }

    #[tokio::test]
    async fn nested_object_names_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(&dir);
        driver.create_container("photos").await.unwrap();

        driver
            .upload_object("photos", "2024/03/cat.jpg", b"meow")
            .await
            .unwrap();
        driver.upload_object("photos", "dog.jpg", b"woof").await.unwrap();

        let names: Vec<_> = driver
            .list_container_objects("photos")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["2024/03/cat.jpg", "dog.jpg"]);

        driver.delete_object("photos", "2024/03/cat.jpg").await.unwrap();
        assert!(!dir.path().join("photos/2024").exists());
        driver.delete_object("photos", "dog.jpg").await.unwrap();
        driver.delete_container("photos").await.unwrap();
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(&dir);
        driver.create_container("c").await.unwrap();
        for name in ["../escape", "a//b", "/abs", ".", ".env", "a/.cfg"] {
            assert!(matches!(
                driver.upload_object("c", name, b"x").await,
                Err(ProviderError::InvalidParameter { .. })
            ));
        }
        assert!(driver.create_container(".multipart").await.is_err());

        assert!(driver.list_container_objects("c").await.unwrap().is_empty());
        driver.delete_container("c").await.unwrap();
    }

    #[tokio::test]
    async fn missing_things_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(&dir);
        assert!(matches!(
            driver.get_container("nope").await,
            Err(ProviderError::ResourceNotFound { .. })
        ));
        driver.create_container("c").await.unwrap();
        assert!(matches!(
            driver.download_object("c", "nope").await,
            Err(ProviderError::ResourceNotFound { .. })
        ));
        assert!(matches!(
            driver.create_container("c").await,
            Err(ProviderError::ResourceExists { .. })
        ));
    }

    #[tokio::test]
    async fn multipart_upload_leaves_no_parts_behind() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(&dir);
        driver.create_container("big").await.unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(4096 + 17).collect();

        let object = driver
            .upload_object_multipart("big", "blob.bin", &data, 1024, &WorkerPoolConfig::default())
            .await
            .unwrap();

        assert_eq!(object.size, data.len() as u64);
        assert_eq!(driver.download_object("big", "blob.bin").await.unwrap(), data);
        let leftovers = std::fs::read_dir(dir.path().join(MULTIPART_DIR))
            .unwrap()
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn validate_credentials_checks_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(driver(&dir).validate_credentials().await.unwrap());
        let missing = LocalStorageDriver::new(dir.path().join("missing")).unwrap();
        assert!(!missing.validate_credentials().await.unwrap());
    }
}
