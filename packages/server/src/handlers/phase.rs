use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};

use super::{HACKATHON_INDEX, WorkflowError, flash_redirect, or_redirect, phases_path};
use crate::entity::{contest_display_data, phase};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::phase::{
    CreatePhaseRequest, PhaseResponse, PhasesView, UpdatePhaseRequest, validate_create_phase,
    validate_update_phase,
};
use crate::session::{FlashLevel, Session};
use crate::state::AppState;
use crate::utils::contest::{
    ensure_contest_display_data, find_contest, list_phases, next_phase_order, phase_order_taken,
};

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/enable-phases",
    tag = "Hackathon Phases",
    operation_id = "enablePhases",
    summary = "Enable multi-phase configuration",
    description = "Sets `allowPhase` on the contest's display data. Existing phases are left as they are.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 303, description = "Redirect to the phase list"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session), fields(contest_id))]
pub async fn enable_phases(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
) -> Result<Response, WorkflowError> {
    auth_user.require_jury()?;

    or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;

    let display = ensure_contest_display_data(&state.db, contest_id).await?;
    if display.allow_phase {
        return Ok(flash_redirect(
            &session,
            FlashLevel::Info,
            "Phases are already enabled.",
            &phases_path(contest_id),
        ));
    }

    let mut active: contest_display_data::ActiveModel = display.into();
    active.allow_phase = Set(true);
    active.update(&state.db).await?;
    info!(contest_id, "Enabled phases");

    Ok(flash_redirect(
        &session,
        FlashLevel::Success,
        "Phases have been enabled for this contest.",
        &phases_path(contest_id),
    ))
}

#[utoipa::path(
    get,
    path = "/jury/hackathon/{contest_id}/phases",
    tag = "Hackathon Phases",
    operation_id = "listPhases",
    summary = "List a contest's phases",
    description = "Phases by `phase_order`. While phases are not enabled for the contest only the \
        first phase is listed.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Phase list", body = PhasesView),
        (status = 303, description = "Contest not found, redirect to the overview"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session), fields(contest_id))]
pub async fn list_contest_phases(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
) -> Result<Json<PhasesView>, WorkflowError> {
    auth_user.require_jury()?;

    let contest = or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;
    let display = contest_display_data::Entity::find_by_id(contest_id)
        .one(&state.db)
        .await?;
    let mut phases = list_phases(&state.db, contest_id).await?;

    if let Some(ref d) = display
        && !d.allow_phase
    {
        phases.truncate(1);
    }

    Ok(Json(PhasesView {
        flashes: session.take_flashes(),
        contest: contest.into(),
        allow_phase: display.is_some_and(|d| d.allow_phase),
        phases: phases.into_iter().map(PhaseResponse::from).collect(),
    }))
}

async fn find_phase(
    state: &AppState,
    contest_id: i32,
    phase_id: i32,
) -> Result<phase::Model, AppError> {
    phase::Entity::find_by_id(phase_id)
        .filter(phase::Column::ContestId.eq(contest_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Phase not found".into()))
}

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/phases",
    tag = "Hackathon Phases",
    operation_id = "createPhase",
    summary = "Create a phase",
    description = "Adds a phase to the contest. `phase_order` defaults to one past the highest \
        existing order and must be unique within the contest. A second phase can only be added \
        once phases are enabled.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    request_body = CreatePhaseRequest,
    responses(
        (status = 201, description = "Phase created", body = PhaseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "phase_order already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contest_id))]
pub async fn create_phase(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
    AppJson(payload): AppJson<CreatePhaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_jury()?;
    validate_create_phase(&payload)?;

    find_contest(&state.db, contest_id).await?;

    let existing = list_phases(&state.db, contest_id).await?;
    if !existing.is_empty() {
        let allow_phase = contest_display_data::Entity::find_by_id(contest_id)
            .one(&state.db)
            .await?
            .is_some_and(|d| d.allow_phase);
        if !allow_phase {
            return Err(AppError::Validation(
                "Phases are not enabled for this contest".into(),
            ));
        }
    }

    let phase_order = match payload.phase_order {
        Some(order) => {
            if phase_order_taken(&state.db, contest_id, order, None).await? {
                return Err(AppError::Conflict(format!(
                    "phase_order {order} is already used in this contest"
                )));
            }
            order
        }
        None => next_phase_order(&state.db, contest_id).await?,
    };

    let model = phase::ActiveModel {
        contest_id: Set(contest_id),
        name: Set(payload.name.trim().to_string()),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        description: Set(payload.description),
        allow_submit: Set(payload.allow_submit),
        allow_manual_judge: Set(payload.allow_manual_judge),
        allow_automatic_judge: Set(payload.allow_automatic_judge),
        phase_order: Set(phase_order),
        metadata: Set(payload.metadata),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    info!(contest_id, phase_id = model.id, phase_order, "Created phase");

    Ok((StatusCode::CREATED, Json(PhaseResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/jury/hackathon/{contest_id}/phases/{phase_id}",
    tag = "Hackathon Phases",
    operation_id = "updatePhase",
    summary = "Update a phase",
    description = "Partial update. Nullable fields set to `null` are cleared; absent fields are kept.",
    params(
        ("contest_id" = i32, Path, description = "Contest ID"),
        ("phase_id" = i32, Path, description = "Phase ID"),
    ),
    request_body = UpdatePhaseRequest,
    responses(
        (status = 200, description = "Phase updated", body = PhaseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Phase not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "phase_order already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contest_id, phase_id))]
pub async fn update_phase(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((contest_id, phase_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdatePhaseRequest>,
) -> Result<Json<PhaseResponse>, AppError> {
    auth_user.require_jury()?;

    let existing = find_phase(&state, contest_id, phase_id).await?;
    validate_update_phase(&payload, (existing.start_time, existing.end_time))?;

    if let Some(order) = payload.phase_order
        && order != existing.phase_order
        && phase_order_taken(&state.db, contest_id, order, Some(phase_id)).await?
    {
        return Err(AppError::Conflict(format!(
            "phase_order {order} is already used in this contest"
        )));
    }

    let mut active: phase::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(start) = payload.start_time {
        active.start_time = Set(start);
    }
    if let Some(end) = payload.end_time {
        active.end_time = Set(end);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(v) = payload.allow_submit {
        active.allow_submit = Set(v);
    }
    if let Some(v) = payload.allow_manual_judge {
        active.allow_manual_judge = Set(v);
    }
    if let Some(v) = payload.allow_automatic_judge {
        active.allow_automatic_judge = Set(v);
    }
    if let Some(order) = payload.phase_order {
        active.phase_order = Set(order);
    }
    if let Some(metadata) = payload.metadata {
        active.metadata = Set(metadata);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(PhaseResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/jury/hackathon/{contest_id}/phases/{phase_id}",
    tag = "Hackathon Phases",
    operation_id = "deletePhase",
    summary = "Delete a phase",
    params(
        ("contest_id" = i32, Path, description = "Contest ID"),
        ("phase_id" = i32, Path, description = "Phase ID"),
    ),
    responses(
        (status = 204, description = "Phase deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Phase not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contest_id, phase_id))]
pub async fn delete_phase(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((contest_id, phase_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    auth_user.require_jury()?;

    let existing = find_phase(&state, contest_id, phase_id).await?;
    phase::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    info!(contest_id, phase_id, "Deleted phase");

    Ok(StatusCode::NO_CONTENT)
}
