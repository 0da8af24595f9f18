use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub shortname: String,

    pub activate_time: DateTimeUtc,
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    #[sea_orm(default_value = true)]
    pub enabled: bool,
    #[sea_orm(default_value = true)]
    pub allow_submit: bool,

    #[sea_orm(has_one)]
    pub display_data: HasOne<super::contest_display_data::Entity>,

    #[sea_orm(has_many)]
    pub phases: HasMany<super::phase::Entity>,

    #[sea_orm(has_many, via = "contest_problem")]
    pub problems: HasMany<super::problem::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
