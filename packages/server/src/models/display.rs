use serde::Serialize;
use serde_json::Value;

use super::contest::ContestSummary;
use super::phase::PhaseResponse;
use super::shared::validate_max_len;
use crate::entity::contest_display_data;
use crate::error::AppError;
use crate::extractors::form::FormData;
use crate::session::Flash;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_SUBTITLE: &str = "subtitle";
pub const FIELD_BANNER_URL: &str = "banner_url";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_ALLOW_PHASE: &str = "allow_phase";
pub const FIELD_BANNER_FILE: &str = "banner_file";
pub const FIELD_MEDIA_FILE: &str = "media_file";

/// Text part of a contest display submission. Files are read separately.
#[derive(Debug, Default, PartialEq)]
pub struct ContestDisplayForm {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub banner_url: Option<String>,
    pub description: Option<String>,
    pub allow_phase: bool,
}

impl ContestDisplayForm {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            title: form.non_blank(FIELD_TITLE),
            subtitle: form.non_blank(FIELD_SUBTITLE),
            banner_url: form.non_blank(FIELD_BANNER_URL),
            description: form.raw_non_blank(FIELD_DESCRIPTION),
            allow_phase: form.checked(FIELD_ALLOW_PHASE),
        }
    }
}

pub fn validate_contest_display_form(form: &ContestDisplayForm) -> Result<(), AppError> {
    validate_max_len(form.title.as_deref(), "Title", 255)?;
    validate_max_len(form.subtitle.as_deref(), "Subtitle", 255)?;
    validate_max_len(form.banner_url.as_deref(), "Banner URL", 255)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestDisplayDataResponse {
    #[schema(example = "Spring Hackathon")]
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[schema(example = "/uploads/hackathon_banners/banner_1_0d9f6c1e.png")]
    pub banner_url: Option<String>,
    /// HTML.
    pub description: Option<String>,
    /// Free-form records. An empty list is presented as a single blank entry
    /// for editing.
    pub meta_data: Vec<Value>,
    pub allow_phase: bool,
}

impl From<&contest_display_data::Model> for ContestDisplayDataResponse {
    fn from(m: &contest_display_data::Model) -> Self {
        let mut meta_data = json_list(m.meta_data.as_ref());
        if meta_data.is_empty() {
            meta_data.push(serde_json::json!({ "": "" }));
        }
        Self {
            title: m.title.clone(),
            subtitle: m.subtitle.clone(),
            banner_url: m.banner_url.clone(),
            description: m.description.clone(),
            meta_data,
            allow_phase: m.allow_phase,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestDisplayView {
    pub flashes: Vec<Flash>,
    pub contest: ContestSummary,
    pub display_data: ContestDisplayDataResponse,
    pub phases: Vec<PhaseResponse>,
    /// Embed snippet for the most recent media upload, shown once.
    pub media_snippet: Option<String>,
}

/// Elements of a stored JSON list. A missing or null value reads as empty;
/// any other value becomes the sole element so appending never drops it.
pub fn json_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}
