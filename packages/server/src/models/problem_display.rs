use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::contest::ContestSummary;
use super::display::json_list;
use super::shared::validate_max_len;
use crate::entity::problem_display_data;
use crate::error::AppError;
use crate::extractors::form::FormData;
use crate::session::Flash;

pub const FIELD_DISPLAY_NAME: &str = "display_name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_IMAGE_URL: &str = "image_url";
pub const FIELD_META_DATA: &str = "meta_data";
pub const FIELD_ATTACHMENT_FILE: &str = "attachment_file";
pub const FIELD_ATTACHMENT_LINK: &str = "attachment_link";
pub const FIELD_REMOVE_ATTACHMENT: &str = "remove_attachment";

/// What a problem display submission asks for.
#[derive(Debug, PartialEq)]
pub enum ProblemDisplaySubmission {
    /// Drop the attachment at this position.
    RemoveAttachment(usize),
    Save(ProblemDisplayForm),
}

#[derive(Debug, Default, PartialEq)]
pub struct ProblemDisplayForm {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub meta_data: Option<Value>,
    pub attachment_link: Option<String>,
}

impl ProblemDisplaySubmission {
    /// Parse and validate the text fields of a submission.
    pub fn from_form(form: &FormData) -> Result<Self, AppError> {
        if let Some(raw) = form.text(FIELD_REMOVE_ATTACHMENT) {
            let index = raw.trim().parse::<usize>().map_err(|_| {
                AppError::Validation(format!("Invalid attachment index '{}'", raw.trim()))
            })?;
            return Ok(Self::RemoveAttachment(index));
        }

        let meta_data = match form.non_blank(FIELD_META_DATA) {
            Some(raw) => Some(
                serde_json::from_str::<Value>(&raw)
                    .map_err(|e| AppError::Validation(format!("Metadata is not valid JSON: {e}")))?,
            ),
            None => None,
        };

        let parsed = ProblemDisplayForm {
            display_name: form.non_blank(FIELD_DISPLAY_NAME),
            description: form.raw_non_blank(FIELD_DESCRIPTION),
            image_url: form.non_blank(FIELD_IMAGE_URL),
            meta_data,
            attachment_link: form.non_blank(FIELD_ATTACHMENT_LINK),
        };
        validate_problem_display_form(&parsed)?;
        Ok(Self::Save(parsed))
    }
}

pub fn validate_problem_display_form(form: &ProblemDisplayForm) -> Result<(), AppError> {
    validate_max_len(form.display_name.as_deref(), "Display name", 255)?;
    validate_max_len(form.image_url.as_deref(), "Image URL", 255)?;
    validate_max_len(form.attachment_link.as_deref(), "Attachment link", 2048)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemDisplayDataResponse {
    #[schema(example = 12)]
    pub problem_id: i32,
    #[schema(example = "P1")]
    pub display_name: Option<String>,
    /// HTML.
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// `{name, url, type, uploadedAt}` records in upload order.
    pub attachments: Vec<Value>,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<problem_display_data::Model> for ProblemDisplayDataResponse {
    fn from(m: problem_display_data::Model) -> Self {
        Self {
            problem_id: m.problem_id,
            attachments: json_list(m.attachments.as_ref()),
            display_name: m.display_name,
            description: m.description,
            image_url: m.image_url,
            meta_data: m.meta_data,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemSummary {
    pub id: i32,
    pub name: String,
    pub shortname: String,
    pub time_limit: f64,
    pub memory_limit: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemDisplayView {
    pub flashes: Vec<Flash>,
    pub contest: ContestSummary,
    pub problem: ProblemSummary,
    pub display_data: ProblemDisplayDataResponse,
}
