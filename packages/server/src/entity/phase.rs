use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A time-bounded sub-period of a contest.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "contest_phase_order")]
    pub contest_id: i32,
    #[sea_orm(belongs_to, from = "contest_id", to = "id", on_delete = "Cascade")]
    pub contest: HasOne<super::contest::Entity>,

    pub name: String,

    pub start_time: Option<f64>, // epoch seconds
    pub end_time: Option<f64>,   // epoch seconds

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(default_value = false)]
    pub allow_submit: bool,
    #[sea_orm(default_value = false)]
    pub allow_manual_judge: bool,
    #[sea_orm(default_value = false)]
    pub allow_automatic_judge: bool,

    #[sea_orm(unique_key = "contest_phase_order")]
    pub phase_order: i32,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,

    #[sea_orm(has_many)]
    pub phase_problems: HasMany<super::phase_problem::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
