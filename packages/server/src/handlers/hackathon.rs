use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use common::storage::UploadBucket;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use super::{HACKATHON_INDEX, WorkflowError, display_path, flash_redirect, or_redirect};
use crate::entity::{contest, contest_display_data};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::FormData;
use crate::models::contest::{ContestSummary, HackathonIndexView, HackathonListItem};
use crate::models::display::{
    ContestDisplayDataResponse, ContestDisplayForm, ContestDisplayView, FIELD_BANNER_FILE,
    FIELD_MEDIA_FILE, json_list, validate_contest_display_form,
};
use crate::models::phase::PhaseResponse;
use crate::session::{FlashLevel, Session};
use crate::state::AppState;
use crate::upload::{MediaKind, UploadPolicy, discard_uploads, store_upload};
use crate::utils::contest::{
    ensure_contest_display_data, ensure_default_phase, find_contest, unique_contest_shortname,
};

/// Session key for the embed snippet of the last media upload.
pub const MEDIA_SNIPPET_KEY: &str = "media_snippet";

#[utoipa::path(
    get,
    path = "/jury/hackathon",
    tag = "Hackathon",
    operation_id = "listHackathons",
    summary = "List contests",
    description = "Lists all contests, latest start first, each with a link to its display configuration.",
    responses(
        (status = 200, description = "Contest overview", body = HackathonIndexView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session))]
pub async fn list_hackathons(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<HackathonIndexView>, AppError> {
    auth_user.require_jury()?;

    let contests = contest::Entity::find()
        .order_by_desc(contest::Column::StartTime)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| HackathonListItem {
            display_url: display_path(c.id),
            contest: ContestSummary::from(c),
        })
        .collect();

    Ok(Json(HackathonIndexView {
        flashes: session.take_flashes(),
        contests,
    }))
}

#[utoipa::path(
    get,
    path = "/jury/hackathon/quick-add",
    tag = "Hackathon",
    operation_id = "quickAddHackathon",
    summary = "Create a contest with default values",
    description = "Creates a contest named after the current time, starting in one hour and \
        ending in four, then redirects to its display configuration.",
    responses(
        (status = 303, description = "Redirect to the new contest's display configuration"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session))]
pub async fn quick_add_hackathon(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    auth_user.require_jury()?;

    let now = Utc::now();
    let shortname =
        unique_contest_shortname(&state.db, &format!("hackathon_{}", now.timestamp())).await?;

    let new_contest = contest::ActiveModel {
        name: Set(format!("New Hackathon {}", now.format("%Y-%m-%d %H:%M"))),
        shortname: Set(shortname),
        activate_time: Set(now),
        start_time: Set(now + Duration::hours(1)),
        end_time: Set(now + Duration::hours(4)),
        enabled: Set(true),
        allow_submit: Set(true),
        created_at: Set(now),
        ..Default::default()
    };
    let created = new_contest.insert(&state.db).await?;
    info!(contest_id = created.id, shortname = %created.shortname, "Quick-added contest");

    Ok(flash_redirect(
        &session,
        FlashLevel::Success,
        "Hackathon contest created!",
        &display_path(created.id),
    ))
}

#[utoipa::path(
    get,
    path = "/jury/hackathon/{contest_id}/display",
    tag = "Hackathon",
    operation_id = "getContestDisplay",
    summary = "View a contest's display configuration",
    description = "Returns the contest's display data and phases. Display data and a default phase \
        are created on first access. A media snippet from the previous save is included once.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Display configuration", body = ContestDisplayView),
        (status = 303, description = "Contest not found, redirect to the overview"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session), fields(contest_id))]
pub async fn get_display(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
) -> Result<Json<ContestDisplayView>, WorkflowError> {
    auth_user.require_jury()?;

    let contest = or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;
    let display = ensure_contest_display_data(&state.db, contest_id).await?;
    let phases = ensure_default_phase(&state.db, contest_id).await?;

    Ok(Json(ContestDisplayView {
        media_snippet: session.take_once(MEDIA_SNIPPET_KEY),
        flashes: session.take_flashes(),
        contest: contest.into(),
        display_data: ContestDisplayDataResponse::from(&display),
        phases: phases.into_iter().map(PhaseResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/display",
    tag = "Hackathon",
    operation_id = "saveContestDisplay",
    summary = "Save a contest's display configuration",
    description = "Full-form submission: `title`, `subtitle`, `banner_url`, `description`, \
        `allow_phase` (checkbox) and optional `banner_file` / `media_file` parts. An uploaded \
        banner replaces `banner_url`; an uploaded media file is appended to the metadata list. \
        Upload and save failures are reported on the next view.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    request_body(content_type = "multipart/form-data", description = "Display form"),
    responses(
        (status = 303, description = "Redirect back to the display configuration"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session, form), fields(contest_id))]
pub async fn save_display(
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

    let fields = ContestDisplayForm::from_form(&form);
    validate_contest_display_form(&fields)?;
    let banner_file = form.file(FIELD_BANNER_FILE);
    let media_file = form.file(FIELD_MEDIA_FILE);
    if let Some(file) = banner_file {
        UploadPolicy::BANNER.check(file).map_err(AppError::from)?;
    }
    if let Some(file) = media_file {
        UploadPolicy::MEDIA.check(file).map_err(AppError::from)?;
    }

    let display = ensure_contest_display_data(&state.db, contest_id).await?;
    let mut banner_url = fields.banner_url;
    let mut meta_data: Option<Vec<Value>> = None;
    // Files written by this request, and the banner they make obsolete.
    let mut stored: Vec<String> = Vec::new();
    let mut replaced_banner: Option<String> = None;
    let mut snippet: Option<String> = None;

    if banner_file.is_some() {
        match store_upload(&*state.uploads, UploadPolicy::BANNER, Some(contest_id), banner_file)
            .await
        {
            Ok(saved) => {
                replaced_banner = display.banner_url.clone().filter(|previous| {
                    state.uploads.bucket_of(previous) == Some(UploadBucket::Banner)
                });
                stored.push(saved.url.clone());
                banner_url = Some(saved.url);
            }
            Err(e) => {
                warn!(contest_id, error = %e, "Banner upload failed");
                session.flash(FlashLevel::Danger, format!("Banner upload failed: {e}"));
            }
        }
    }

    if media_file.is_some() {
        match store_upload(&*state.uploads, UploadPolicy::MEDIA, Some(contest_id), media_file)
            .await
        {
            Ok(saved) => {
                let kind = MediaKind::of(&saved.mime_type);
                let mut list = json_list(display.meta_data.as_ref());
                list.push(json!({
                    "type": "media",
                    "path": saved.url,
                    "mediaType": kind.as_str(),
                    "uploadedAt": Utc::now().to_rfc3339(),
                }));
                meta_data = Some(list);
                snippet = Some(kind.snippet(&saved.url));
                stored.push(saved.url);
            }
            Err(e) => {
                warn!(contest_id, error = %e, "Media upload failed");
                session.flash(FlashLevel::Danger, format!("Media upload failed: {e}"));
            }
        }
    }

    let mut active: contest_display_data::ActiveModel = display.into();
    active.title = Set(fields.title);
    active.subtitle = Set(fields.subtitle);
    active.banner_url = Set(banner_url);
    active.description = Set(fields.description);
    active.allow_phase = Set(fields.allow_phase);
    if let Some(list) = meta_data {
        active.meta_data = Set(Some(Value::Array(list)));
    }

    match active.update(&state.db).await {
        Ok(_) => {
            if let Some(previous) = replaced_banner
                && let Err(e) = state.uploads.delete(&previous).await
            {
                warn!(contest_id, previous, error = %e, "Failed to delete previous banner");
                session.flash(FlashLevel::Warning, "Could not delete previous banner image.");
            }
            if let Some(snippet) = snippet {
                session.put_once(MEDIA_SNIPPET_KEY, snippet);
            }
            session.flash(FlashLevel::Success, "Display data saved.");
        }
        Err(e) => {
            error!(contest_id, error = %e, "Failed to save display data");
            discard_uploads(&*state.uploads, &stored).await;
            session.flash(
                FlashLevel::Danger,
                format!("Failed to save display data: {e}"),
            );
        }
    }

    Ok(Redirect::to(&display_path(contest_id)).into_response())
}
