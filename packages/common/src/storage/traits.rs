use async_trait::async_trait;

use super::bucket::UploadBucket;
use super::error::StorageError;

/// A file persisted by an [`UploadStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredUpload {
    /// Public reference, e.g. `/uploads/hackathon_media/media_4_<token>.mp4`.
    pub public_path: String,
    /// Generated file name inside the bucket directory.
    pub file_name: String,
    /// Size of the stored file in bytes.
    pub size: u64,
}

/// Bucketed storage for user uploads that are later served back by path.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store `data` under a unique name `{stem}_{token}.{extension}` in `bucket`.
    ///
    /// The bucket directory is created on demand; failing to create it is fatal.
    async fn put(
        &self,
        bucket: UploadBucket,
        stem: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredUpload, StorageError>;

    /// Read a stored file back by its public reference.
    async fn get(&self, public_path: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete a stored file by its public reference.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, public_path: &str) -> Result<bool, StorageError>;

    /// The bucket a public reference points into, if it is a managed one.
    fn bucket_of(&self, public_path: &str) -> Option<UploadBucket>;
}
