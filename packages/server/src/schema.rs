use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{contest_problem, phase};

/// Ensure composite lookup indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Phase listing: WHERE contest_id = ? ORDER BY phase_order
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_phase_contest_order")
        .table(phase::Entity)
        .col(phase::Column::ContestId)
        .col(phase::Column::PhaseOrder)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_phase_contest_order exists"),
        Err(e) => tracing::warn!("Failed to create index idx_phase_contest_order: {}", e),
    }

    // Problem tab: WHERE contest_id = ? ORDER BY shortname
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_contest_problem_shortname")
        .table(contest_problem::Entity)
        .col(contest_problem::Column::ContestId)
        .col(contest_problem::Column::Shortname)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_contest_problem_shortname exists"),
        Err(e) => tracing::warn!("Failed to create index idx_contest_problem_shortname: {}", e),
    }

    Ok(())
}
