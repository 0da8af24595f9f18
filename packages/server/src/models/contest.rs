use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::contest;
use crate::session::Flash;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestSummary {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "New Hackathon 2026-10-17 09:30")]
    pub name: String,
    #[schema(example = "hackathon_1792229400")]
    pub shortname: String,
    pub activate_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub enabled: bool,
    pub allow_submit: bool,
}

impl From<contest::Model> for ContestSummary {
    fn from(m: contest::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            shortname: m.shortname,
            activate_time: m.activate_time,
            start_time: m.start_time,
            end_time: m.end_time,
            enabled: m.enabled,
            allow_submit: m.allow_submit,
        }
    }
}

/// One row of the hackathon overview, linking to its display configuration.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonListItem {
    #[serde(flatten)]
    pub contest: ContestSummary,
    #[schema(example = "/jury/hackathon/1/display")]
    pub display_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonIndexView {
    pub flashes: Vec<Flash>,
    pub contests: Vec<HackathonListItem>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestProblemItem {
    #[schema(example = 12)]
    pub problem_id: i32,
    #[schema(example = "P1")]
    pub shortname: String,
    #[schema(example = "New Problem 2026-10-17 09:30")]
    pub name: String,
    /// Seconds.
    #[schema(example = 2.0)]
    pub time_limit: f64,
    /// Kilobytes.
    #[schema(example = 262144)]
    pub memory_limit: i32,
    pub display_name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContestProblemsView {
    pub flashes: Vec<Flash>,
    pub contest: ContestSummary,
    pub problems: Vec<ContestProblemItem>,
}
