use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;

use crate::entity::{
    contest, contest_display_data, contest_problem, phase, problem, problem_display_data,
};
use crate::error::AppError;

pub const DEFAULT_PHASE_NAME: &str = "Default Phase";

/// Look up a contest by ID, returning 404 if not found.
pub async fn find_contest<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found.".into()))
}

/// Look up a problem of a contest together with its contest shortname.
pub async fn find_contest_problem<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
    problem_id: i32,
) -> Result<(problem::Model, contest_problem::Model), AppError> {
    let not_found = || AppError::NotFound("Problem not found.".into());
    let link = contest_problem::Entity::find_by_id((contest_id, problem_id))
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let problem = problem::Entity::find_by_id(problem_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    Ok((problem, link))
}

/// Fetch a contest's display data, creating an empty record on first access.
pub async fn ensure_contest_display_data<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
) -> Result<contest_display_data::Model, AppError> {
    if let Some(existing) = contest_display_data::Entity::find_by_id(contest_id)
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let blank = contest_display_data::ActiveModel {
        contest_id: Set(contest_id),
        title: Set(None),
        subtitle: Set(None),
        banner_url: Set(None),
        description: Set(None),
        meta_data: Set(None),
        allow_phase: Set(false),
    };
    // A concurrent first view may have created it already.
    contest_display_data::Entity::insert(blank)
        .on_conflict(
            OnConflict::column(contest_display_data::Column::ContestId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    contest_display_data::Entity::find_by_id(contest_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("display data vanished after insert".into()))
}

/// Fetch a problem's display data, creating an empty record on first access.
pub async fn ensure_problem_display_data<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
) -> Result<problem_display_data::Model, AppError> {
    if let Some(existing) = problem_display_data::Entity::find_by_id(problem_id)
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let blank = problem_display_data::ActiveModel {
        problem_id: Set(problem_id),
        display_name: Set(None),
        description: Set(None),
        image_url: Set(None),
        attachments: Set(None),
        meta_data: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    problem_display_data::Entity::insert(blank)
        .on_conflict(
            OnConflict::column(problem_display_data::Column::ProblemId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    problem_display_data::Entity::find_by_id(problem_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("display data vanished after insert".into()))
}

/// Phases of a contest ordered by `phase_order`.
pub async fn list_phases<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
) -> Result<Vec<phase::Model>, AppError> {
    Ok(phase::Entity::find()
        .filter(phase::Column::ContestId.eq(contest_id))
        .order_by_asc(phase::Column::PhaseOrder)
        .all(db)
        .await?)
}

/// List phases, creating the default phase if the contest has none.
pub async fn ensure_default_phase<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
) -> Result<Vec<phase::Model>, AppError> {
    let phases = list_phases(db, contest_id).await?;
    if !phases.is_empty() {
        return Ok(phases);
    }

    let default_phase = phase::ActiveModel {
        contest_id: Set(contest_id),
        name: Set(DEFAULT_PHASE_NAME.to_string()),
        start_time: Set(None),
        end_time: Set(None),
        description: Set(None),
        allow_submit: Set(true),
        allow_manual_judge: Set(true),
        allow_automatic_judge: Set(true),
        phase_order: Set(1),
        metadata: Set(None),
        ..Default::default()
    };
    // The (contest_id, phase_order) key makes a concurrent duplicate a no-op.
    phase::Entity::insert(default_phase)
        .on_conflict(
            OnConflict::columns([phase::Column::ContestId, phase::Column::PhaseOrder])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    info!(contest_id, "Created default phase");

    list_phases(db, contest_id).await
}

/// One past the highest `phase_order` in the contest, or 1 when empty.
pub async fn next_phase_order<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
) -> Result<i32, AppError> {
    let max: Option<i32> = phase::Entity::find()
        .filter(phase::Column::ContestId.eq(contest_id))
        .select_only()
        .column_as(phase::Column::PhaseOrder.max(), "max_order")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    Ok(max.map_or(1, |m| m + 1))
}

/// Whether another phase of the contest already uses `order`.
pub async fn phase_order_taken<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
    order: i32,
    excluding: Option<i32>,
) -> Result<bool, AppError> {
    let mut query = phase::Entity::find()
        .filter(phase::Column::ContestId.eq(contest_id))
        .filter(phase::Column::PhaseOrder.eq(order));
    if let Some(id) = excluding {
        query = query.filter(phase::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn count_contest_problems<C: ConnectionTrait>(
    db: &C,
    contest_id: i32,
) -> Result<u64, AppError> {
    Ok(contest_problem::Entity::find()
        .filter(contest_problem::Column::ContestId.eq(contest_id))
        .count(db)
        .await?)
}

/// `base`, or `base_2`, `base_3`, ... if taken.
pub async fn unique_contest_shortname<C: ConnectionTrait>(
    db: &C,
    base: &str,
) -> Result<String, AppError> {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while contest::Entity::find()
        .filter(contest::Column::Shortname.eq(candidate.as_str()))
        .count(db)
        .await?
        > 0
    {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

/// Save changes to a problem display record, refreshing `updated_at`.
pub async fn touch_problem_display<C: ConnectionTrait>(
    db: &C,
    mut active: problem_display_data::ActiveModel,
) -> Result<problem_display_data::Model, AppError> {
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}
