use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::bucket::UploadBucket;
use super::error::StorageError;
use super::traits::{StoredUpload, UploadStore};

/// Filesystem-backed upload store.
///
/// Files live at `{upload_dir}/{bucket dir}/{stem}_{token}.{ext}` and are
/// referenced publicly as `{public_prefix}/{bucket dir}/{file name}`.
pub struct FilesystemUploadStore {
    upload_dir: PathBuf,
    public_prefix: String,
}

impl FilesystemUploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn bucket_dir(&self, bucket: UploadBucket) -> PathBuf {
        self.upload_dir.join(bucket.dir_name())
    }

    /// Map a public reference onto its bucket and on-disk path.
    fn resolve(&self, public_path: &str) -> Result<(UploadBucket, PathBuf), StorageError> {
        let rest = public_path
            .strip_prefix(&self.public_prefix)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| {
                StorageError::InvalidPath(format!("'{public_path}' is outside the upload prefix"))
            })?;

        let (dir, file) = rest.split_once('/').ok_or_else(|| {
            StorageError::InvalidPath(format!("'{public_path}' has no bucket directory"))
        })?;

        let bucket = UploadBucket::from_dir_name(dir)
            .ok_or_else(|| StorageError::InvalidPath(format!("unknown bucket '{dir}'")))?;

        if !is_flat_file_name(file) {
            return Err(StorageError::InvalidPath(format!(
                "'{file}' is not a plain file name"
            )));
        }

        Ok((bucket, self.bucket_dir(bucket).join(file)))
    }
}

fn is_flat_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
        && !name.contains("..")
}

fn unique_file_name(stem: &str, extension: &str) -> String {
    let token = uuid::Uuid::new_v4().simple();
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        format!("{stem}_{token}")
    } else {
        format!("{stem}_{token}.{extension}")
    }
}

#[async_trait]
impl UploadStore for FilesystemUploadStore {
    async fn put(
        &self,
        bucket: UploadBucket,
        stem: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredUpload, StorageError> {
        let dir = self.bucket_dir(bucket);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::DirectoryCreation {
                path: dir.clone(),
                source,
            })?;

        let file_name = unique_file_name(stem, extension);
        let final_path = dir.join(&file_name);
        let temp_path = dir.join(format!(".{file_name}.part"));

        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            drop(file);
            fs::rename(&temp_path, &final_path).await
        }
        .await;

        if let Err(e) = write {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(bucket = %bucket, file = %file_name, size = data.len(), "Stored upload");

        Ok(StoredUpload {
            public_path: format!("{}/{}/{}", self.public_prefix, bucket.dir_name(), file_name),
            file_name,
            size: data.len() as u64,
        })
    }

    async fn get(&self, public_path: &str) -> Result<Vec<u8>, StorageError> {
        let (_, path) = self.resolve(public_path)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(public_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, public_path: &str) -> Result<bool, StorageError> {
        let (_, path) = self.resolve(public_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn bucket_of(&self, public_path: &str) -> Option<UploadBucket> {
        self.resolve(public_path).ok().map(|(bucket, _)| bucket)
    }
}
