use std::path::PathBuf;

use serde::Deserialize;

/// Upload storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per upload bucket. Default: "./public/uploads".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// URL prefix under which uploads are served. Default: "/uploads".
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Maximum accepted request body in bytes. Default: 32 MiB.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./public/uploads")
}
fn default_public_prefix() -> String {
    "/uploads".into()
}
fn default_max_request_size() -> usize {
    32 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_prefix: default_public_prefix(),
            max_request_size: default_max_request_size(),
        }
    }
}
