use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical destination of an uploaded file.
///
/// Each bucket maps to one directory below the public upload root, so stored
/// references look like `/uploads/hackathon_banners/banner_3_<token>.png`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadBucket {
    /// Images pasted into the rich-text editor.
    Tinymce,
    /// Contest banner images.
    Banner,
    /// Contest media (images and videos).
    Media,
    /// Problem attachments of any type.
    Attachment,
}

impl UploadBucket {
    pub const ALL: [UploadBucket; 4] = [
        UploadBucket::Tinymce,
        UploadBucket::Banner,
        UploadBucket::Media,
        UploadBucket::Attachment,
    ];

    /// Directory name below the upload root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Tinymce => "tinymce",
            Self::Banner => "hackathon_banners",
            Self::Media => "hackathon_media",
            Self::Attachment => "problem_attachments",
        }
    }

    /// Prefix of generated file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Tinymce => "tinymce",
            Self::Banner => "banner",
            Self::Media => "media",
            Self::Attachment => "attachment",
        }
    }

    pub fn from_dir_name(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.dir_name() == dir)
    }
}

impl fmt::Display for UploadBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}
