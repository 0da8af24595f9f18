//! JSON interchange format for a contest's display data and phases.
//!
//! Key names (`contest`, `displayData`, `phases` and their nested fields) are
//! stable: an exported document imports back unchanged.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::{
    double_option, epoch_seconds, validate_max_len, validate_phase_name, validate_phase_order,
    validate_phase_window,
};
use crate::entity::{contest, contest_display_data, phase};

#[derive(Serialize, utoipa::ToSchema)]
pub struct DisplayExport {
    pub contest: ContestExport,
    #[serde(rename = "displayData")]
    pub display_data: Option<DisplayDataExport>,
    pub phases: Vec<PhaseExport>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestExport {
    pub id: i32,
    pub name: String,
    pub shortname: String,
    /// RFC 3339.
    #[schema(example = "2026-10-17T10:30:00+00:00")]
    pub starttime: String,
    #[schema(example = "2026-10-17T13:30:00+00:00")]
    pub endtime: String,
}

impl From<contest::Model> for ContestExport {
    fn from(m: contest::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            shortname: m.shortname,
            starttime: m.start_time.to_rfc3339(),
            endtime: m.end_time.to_rfc3339(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DisplayDataExport {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(rename = "bannerUrl")]
    pub banner_url: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "metaData")]
    pub meta_data: Option<Value>,
    #[serde(rename = "allowPhase")]
    pub allow_phase: bool,
}

impl From<contest_display_data::Model> for DisplayDataExport {
    fn from(m: contest_display_data::Model) -> Self {
        Self {
            title: m.title,
            subtitle: m.subtitle,
            banner_url: m.banner_url,
            description: m.description,
            meta_data: m.meta_data,
            allow_phase: m.allow_phase,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhaseExport {
    pub name: String,
    pub starttime: Option<f64>,
    pub endtime: Option<f64>,
    pub description: Option<String>,
    pub allow_submit: bool,
    pub allow_manual_judge: bool,
    pub allow_automatic_judge: bool,
    pub phase_order: i32,
    pub metadata: Option<Value>,
}

impl From<phase::Model> for PhaseExport {
    fn from(m: phase::Model) -> Self {
        Self {
            name: m.name,
            starttime: m.start_time,
            endtime: m.end_time,
            description: m.description,
            allow_submit: m.allow_submit,
            allow_manual_judge: m.allow_manual_judge,
            allow_automatic_judge: m.allow_automatic_judge,
            phase_order: m.phase_order,
            metadata: m.metadata,
        }
    }
}

/// Why an uploaded document cannot be imported.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImportError {
    #[error("Invalid JSON file.")]
    InvalidJson,
    #[error("Invalid import file: {0}")]
    Invalid(String),
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default, rename = "displayData")]
    display_data: Option<Value>,
    #[serde(default)]
    phases: Option<Value>,
}

#[derive(Deserialize)]
struct RawDisplayData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default, rename = "bannerUrl")]
    banner_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "metaData")]
    meta_data: Option<Value>,
    #[serde(default, rename = "allowPhase", deserialize_with = "double_option")]
    allow_phase: Option<Option<bool>>,
}

#[derive(Deserialize)]
struct RawPhase {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    starttime: Option<f64>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    endtime: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    allow_submit: Option<bool>,
    #[serde(default)]
    allow_manual_judge: Option<bool>,
    #[serde(default)]
    allow_automatic_judge: Option<bool>,
    #[serde(default)]
    phase_order: Option<i32>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Display data values to write. Text fields missing from the document are
/// written as empty strings; `allow_phase` is only written when present.
#[derive(Debug, PartialEq)]
pub struct DisplayUpsert {
    pub title: String,
    pub subtitle: String,
    pub banner_url: Option<String>,
    pub description: String,
    pub meta_data: Value,
    pub allow_phase: Option<bool>,
}

#[derive(Debug, PartialEq)]
pub struct NewPhase {
    pub name: String,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub description: Option<String>,
    pub allow_submit: bool,
    pub allow_manual_judge: bool,
    pub allow_automatic_judge: bool,
    pub phase_order: i32,
    pub metadata: Option<Value>,
}

/// A fully validated import, ready to apply.
#[derive(Debug, PartialEq)]
pub struct ImportPlan {
    pub display: Option<DisplayUpsert>,
    /// Replaces every existing phase of the contest.
    pub phases: Vec<NewPhase>,
}

/// Parse and validate an uploaded export document.
pub fn parse_import(bytes: &[u8]) -> Result<ImportPlan, ImportError> {
    let root: Value = serde_json::from_slice(bytes).map_err(|_| ImportError::InvalidJson)?;
    if is_empty_value(&root) {
        return Err(ImportError::InvalidJson);
    }
    let raw: RawDocument = serde_json::from_value(root)
        .map_err(|e| ImportError::Invalid(format!("document: {e}")))?;

    let display = match raw.display_data {
        Some(v) if !is_empty_value(&v) => {
            let d: RawDisplayData = serde_json::from_value(v)
                .map_err(|e| ImportError::Invalid(format!("displayData: {e}")))?;
            let invalid = |e: crate::error::AppError| {
                ImportError::Invalid(format!("displayData: {}", e.user_message()))
            };
            validate_max_len(d.title.as_deref(), "Title", 255).map_err(invalid)?;
            validate_max_len(d.subtitle.as_deref(), "Subtitle", 255).map_err(invalid)?;
            validate_max_len(d.banner_url.as_deref(), "Banner URL", 255).map_err(invalid)?;
            Some(DisplayUpsert {
                title: d.title.unwrap_or_default(),
                subtitle: d.subtitle.unwrap_or_default(),
                banner_url: d.banner_url,
                description: d.description.unwrap_or_default(),
                meta_data: d.meta_data.unwrap_or_else(|| Value::Array(Vec::new())),
                allow_phase: d.allow_phase.map(|v| v.unwrap_or(false)),
            })
        }
        _ => None,
    };

    let raw_phases: Vec<RawPhase> = match raw.phases {
        Some(v) if !is_empty_value(&v) => serde_json::from_value(v)
            .map_err(|e| ImportError::Invalid(format!("phases: {e}")))?,
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut phases = Vec::with_capacity(raw_phases.len());
    for (i, p) in raw_phases.into_iter().enumerate() {
        let phase = NewPhase {
            name: p.name.unwrap_or_default(),
            start_time: p.starttime,
            end_time: p.endtime,
            description: p.description,
            allow_submit: p.allow_submit.unwrap_or(false),
            allow_manual_judge: p.allow_manual_judge.unwrap_or(false),
            allow_automatic_judge: p.allow_automatic_judge.unwrap_or(false),
            phase_order: p.phase_order.unwrap_or(1),
            metadata: p.metadata,
        };

        let invalid = |e: crate::error::AppError| {
            ImportError::Invalid(format!("phase #{}: {}", i + 1, e.user_message()))
        };
        validate_phase_name(&phase.name).map_err(invalid)?;
        validate_phase_order(phase.phase_order).map_err(invalid)?;
        validate_phase_window(phase.start_time, phase.end_time).map_err(invalid)?;
        if !seen.insert(phase.phase_order) {
            return Err(ImportError::Invalid(format!(
                "phase #{}: duplicate phase_order {}",
                i + 1,
                phase.phase_order
            )));
        }
        phases.push(phase);
    }

    Ok(ImportPlan { display, phases })
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Number(_) => false,
    }
}
