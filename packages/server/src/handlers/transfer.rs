use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use tracing::{error, info, instrument};

use super::{HACKATHON_INDEX, WorkflowError, display_path, flash_redirect, or_redirect};
use crate::entity::{contest, contest_display_data, phase};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::FormData;
use crate::models::transfer::{
    ContestExport, DisplayDataExport, DisplayExport, ImportPlan, PhaseExport, parse_import,
};
use crate::session::{FlashLevel, Session};
use crate::state::AppState;
use crate::utils::contest::{ensure_contest_display_data, find_contest, list_phases};

#[utoipa::path(
    get,
    path = "/jury/hackathon/{contest_id}/export-display",
    tag = "Hackathon Transfer",
    operation_id = "exportContestDisplay",
    summary = "Download display data and phases as JSON",
    description = "Returns `contest_display_export_{id}.json` with top-level keys `contest`, \
        `displayData` (null if never configured) and `phases` (by `phase_order`).",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Export document", body = DisplayExport, content_type = "application/json"),
        (status = 404, description = "Contest not found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contest_id))]
pub async fn export_display(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
) -> Result<Response, AppError> {
    auth_user.require_jury()?;

    let Some(contest) = contest::Entity::find_by_id(contest_id).one(&state.db).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Contest not found" })),
        )
            .into_response());
    };

    let display_data = contest_display_data::Entity::find_by_id(contest_id)
        .one(&state.db)
        .await?
        .map(DisplayDataExport::from);
    let phases = list_phases(&state.db, contest_id)
        .await?
        .into_iter()
        .map(PhaseExport::from)
        .collect();

    let document = DisplayExport {
        contest: ContestExport::from(contest),
        display_data,
        phases,
    };
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::Internal(format!("Failed to encode export: {e}")))?;
    let disposition = format!("attachment; filename=\"contest_display_export_{contest_id}.json\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/import-display",
    tag = "Hackathon Transfer",
    operation_id = "importContestDisplay",
    summary = "Replace display data and phases from an export document",
    description = "Reads the `import_file` part. Display data is upserted when present \
        (`allowPhase` only when the key exists); all existing phases are replaced by the \
        document's phases. Nothing is written unless the whole document is valid.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    request_body(content_type = "multipart/form-data", description = "Export document upload"),
    responses(
        (status = 303, description = "Redirect to the display configuration with the outcome"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session, form), fields(contest_id))]
pub async fn import_display(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
    form: FormData,
) -> Result<Response, WorkflowError> {
    auth_user.require_jury()?;

    or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;
    let back = display_path(contest_id);

    let Some(file) = form.file("import_file") else {
        return Ok(flash_redirect(
            &session,
            FlashLevel::Danger,
            "No file uploaded or upload error.",
            &back,
        ));
    };

    let plan = match parse_import(&file.bytes) {
        Ok(plan) => plan,
        Err(e) => return Ok(flash_redirect(&session, FlashLevel::Danger, e.to_string(), &back)),
    };

    let phase_count = plan.phases.len();
    match apply_import(&state.db, contest_id, plan).await {
        Ok(()) => {
            info!(contest_id, phase_count, "Imported display configuration");
            Ok(flash_redirect(
                &session,
                FlashLevel::Success,
                "Import successful.",
                &back,
            ))
        }
        Err(e) => {
            error!(contest_id, error = %e.user_message(), "Import failed");
            Ok(flash_redirect(
                &session,
                FlashLevel::Danger,
                format!("Import failed: {}", e.user_message()),
                &back,
            ))
        }
    }
}

/// Upsert display data and replace all phases in one transaction.
async fn apply_import(
    db: &DatabaseConnection,
    contest_id: i32,
    plan: ImportPlan,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    if let Some(d) = plan.display {
        let existing = ensure_contest_display_data(&txn, contest_id).await?;
        let mut active: contest_display_data::ActiveModel = existing.into();
        active.title = Set(Some(d.title));
        active.subtitle = Set(Some(d.subtitle));
        active.banner_url = Set(d.banner_url);
        active.description = Set(Some(d.description));
        active.meta_data = Set(Some(d.meta_data));
        if let Some(allow) = d.allow_phase {
            active.allow_phase = Set(allow);
        }
        active.update(&txn).await?;
    }

    phase::Entity::delete_many()
        .filter(phase::Column::ContestId.eq(contest_id))
        .exec(&txn)
        .await?;

    if !plan.phases.is_empty() {
        let rows = plan.phases.into_iter().map(|p| phase::ActiveModel {
            contest_id: Set(contest_id),
            name: Set(p.name),
            start_time: Set(p.start_time),
            end_time: Set(p.end_time),
            description: Set(p.description),
            allow_submit: Set(p.allow_submit),
            allow_manual_judge: Set(p.allow_manual_judge),
            allow_automatic_judge: Set(p.allow_automatic_judge),
            phase_order: Set(p.phase_order),
            metadata: Set(p.metadata),
            ..Default::default()
        });
        phase::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(())
}
