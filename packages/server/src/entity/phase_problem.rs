use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phase_problem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub phase_id: i32,
    #[sea_orm(belongs_to, from = "phase_id", to = "id", on_delete = "Cascade")]
    pub phase: HasOne<super::phase::Entity>,

    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id", on_delete = "Cascade")]
    pub problem: HasOne<super::problem::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
