use serde::{Deserialize, Serialize};

use super::contest::ContestSummary;
use super::shared::{
    double_option, epoch_seconds, validate_phase_name, validate_phase_order,
    validate_phase_window,
};
use crate::entity::phase;
use crate::error::AppError;
use crate::session::Flash;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePhaseRequest {
    #[schema(example = "Final Round")]
    pub name: String,
    /// Epoch seconds (number or numeric string).
    #[serde(default, deserialize_with = "epoch_seconds")]
    #[schema(value_type = Option<f64>, example = 1792236600.0)]
    pub start_time: Option<f64>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    #[schema(value_type = Option<f64>, example = 1792247400.0)]
    pub end_time: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub allow_submit: bool,
    #[serde(default)]
    pub allow_manual_judge: bool,
    #[serde(default)]
    pub allow_automatic_judge: bool,
    /// Defaults to one past the current highest order.
    #[schema(example = 2)]
    pub phase_order: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdatePhaseRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub start_time: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub end_time: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub allow_submit: Option<bool>,
    pub allow_manual_judge: Option<bool>,
    pub allow_automatic_judge: Option<bool>,
    pub phase_order: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Option<serde_json::Value>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhaseResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Default Phase")]
    pub name: String,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub description: Option<String>,
    pub allow_submit: bool,
    pub allow_manual_judge: bool,
    pub allow_automatic_judge: bool,
    #[schema(example = 1)]
    pub phase_order: i32,
    pub metadata: Option<serde_json::Value>,
}

impl From<phase::Model> for PhaseResponse {
    fn from(m: phase::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            start_time: m.start_time,
            end_time: m.end_time,
            description: m.description,
            allow_submit: m.allow_submit,
            allow_manual_judge: m.allow_manual_judge,
            allow_automatic_judge: m.allow_automatic_judge,
            phase_order: m.phase_order,
            metadata: m.metadata,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhasesView {
    pub flashes: Vec<Flash>,
    pub contest: ContestSummary,
    /// Whether multi-phase configuration is enabled; when off only the first
    /// phase is listed.
    pub allow_phase: bool,
    pub phases: Vec<PhaseResponse>,
}

pub fn validate_create_phase(req: &CreatePhaseRequest) -> Result<(), AppError> {
    validate_phase_name(&req.name)?;
    validate_phase_window(req.start_time, req.end_time)?;
    if let Some(order) = req.phase_order {
        validate_phase_order(order)?;
    }
    Ok(())
}

/// Validate an update against the current start/end of the phase.
pub fn validate_update_phase(
    req: &UpdatePhaseRequest,
    current_window: (Option<f64>, Option<f64>),
) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_phase_name(name)?;
    }
    if let Some(order) = req.phase_order {
        validate_phase_order(order)?;
    }
    let start = req.start_time.unwrap_or(current_window.0);
    let end = req.end_time.unwrap_or(current_window.1);
    validate_phase_window(start, end)
}
