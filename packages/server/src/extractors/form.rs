use std::collections::HashMap;

use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use crate::error::AppError;
use crate::upload::UploadedFile;

/// Submitted form fields, from either a multipart or a URL-encoded body.
///
/// Parts carrying a file name are collected as files; an unfilled file input
/// is treated as absent. Any other part is read as text. Rejections become
/// `AppError::Validation`.
#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Raw text value, if the field was submitted.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Trimmed text value; absent and blank fields are `None`.
    pub fn non_blank(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Untrimmed text value; absent and blank fields are `None`.
    pub fn raw_non_blank(&self, name: &str) -> Option<String> {
        self.text(name)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }

    /// Checkbox semantics: absent means unchecked.
    pub fn checked(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("1" | "on" | "true" | "yes")
        )
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    #[cfg(test)]
    pub(crate) fn from_texts(pairs: &[(&str, &str)]) -> Self {
        Self {
            texts: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(texts) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(FormData {
                texts,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                if let Some(file) = UploadedFile::from_field(field).await? {
                    form.files.insert(name, file);
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
                form.texts.insert(name, text);
            }
        }

        Ok(form)
    }
}
