use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Presentation data for a problem, one row per problem.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "problem_display_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id", on_delete = "Cascade")]
    pub problem: HasOne<super::problem::Entity>,

    pub display_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>, // HTML
    pub image_url: Option<String>,

    /// Array of `{name, url, type, uploadedAt}` records.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub attachments: Option<Json>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta_data: Option<Json>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
