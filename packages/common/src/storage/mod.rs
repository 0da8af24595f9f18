mod bucket;
mod error;
mod traits;

pub mod filesystem;

pub use bucket::UploadBucket;
pub use error::StorageError;
pub use traits::{StoredUpload, UploadStore};
