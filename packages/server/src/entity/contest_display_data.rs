use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Presentation data for a contest, one row per contest.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest_display_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub contest_id: i32,
    #[sea_orm(belongs_to, from = "contest_id", to = "id", on_delete = "Cascade")]
    pub contest: HasOne<super::contest::Entity>,

    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Local upload reference or external URL.
    pub banner_url: Option<String>,

    /// HTML.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Ordered list of loosely-typed records, e.g. appended media entries.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta_data: Option<Json>,

    #[sea_orm(default_value = false)]
    pub allow_phase: bool,
}

impl ActiveModelBehavior for ActiveModel {}
