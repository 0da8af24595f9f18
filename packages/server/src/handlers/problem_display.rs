use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::{
    HACKATHON_INDEX, WorkflowError, flash_redirect, or_redirect, problem_display_path,
    problems_path,
};
use crate::entity::{contest_problem, problem, problem_display_data};
use crate::error::ErrorBody;
use crate::extractors::auth::AuthUser;
use crate::extractors::form::FormData;
use crate::models::contest::{ContestProblemItem, ContestProblemsView};
use crate::models::display::json_list;
use crate::models::problem_display::{
    FIELD_ATTACHMENT_FILE, ProblemDisplayDataResponse, ProblemDisplaySubmission,
    ProblemDisplayView, ProblemSummary,
};
use crate::models::shared::validate_max_len;
use crate::session::{FlashLevel, Session};
use crate::state::AppState;
use crate::upload::{UploadPolicy, UploadedFile, discard_uploads, store_upload};
use crate::utils::attachments::{AttachmentRecord, remove_at};
use crate::utils::contest::{
    count_contest_problems, ensure_problem_display_data, find_contest, find_contest_problem,
    touch_problem_display,
};

const DEFAULT_TIME_LIMIT: f64 = 2.0;
const DEFAULT_MEMORY_LIMIT: i32 = 262_144;

#[utoipa::path(
    get,
    path = "/jury/hackathon/{contest_id}/problems",
    tag = "Hackathon Problems",
    operation_id = "listContestProblems",
    summary = "List a contest's problems",
    description = "Returns the contest's problems ordered by shortname.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Problem list", body = ContestProblemsView),
        (status = 303, description = "Contest not found, redirect to the overview"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session), fields(contest_id))]
pub async fn list_problems(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path(contest_id): Path<i32>,
) -> Result<Json<ContestProblemsView>, WorkflowError> {
    auth_user.require_jury()?;

    let contest = or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;

    let rows = contest_problem::Entity::find()
        .filter(contest_problem::Column::ContestId.eq(contest_id))
        .order_by_asc(contest_problem::Column::Shortname)
        .find_also_related(problem::Entity)
        .all(&state.db)
        .await?;

    let problem_ids: Vec<i32> = rows.iter().map(|(cp, _)| cp.problem_id).collect();
    let display_names: HashMap<i32, Option<String>> = problem_display_data::Entity::find()
        .filter(problem_display_data::Column::ProblemId.is_in(problem_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|d| (d.problem_id, d.display_name))
        .collect();

    let problems = rows
        .into_iter()
        .filter_map(|(cp, p)| {
            let p = p?;
            Some(ContestProblemItem {
                problem_id: p.id,
                shortname: cp.shortname,
                name: p.name,
                time_limit: p.time_limit,
                memory_limit: p.memory_limit,
                display_name: display_names.get(&p.id).cloned().flatten(),
            })
        })
        .collect();

    Ok(Json(ContestProblemsView {
        flashes: session.take_flashes(),
        contest: contest.into(),
        problems,
    }))
}

/// Placeholder statement for a freshly added problem.
fn description_template(name: &str) -> String {
    format!(
        "<h2>{}</h2>\n\
         <p><strong>Description:</strong><br>Describe the problem statement here. Explain what the task is and any background information.</p>\n\
         <p><strong>Input</strong><br>Describe the input format and constraints.</p>\n\
         <p><strong>Output</strong><br>Describe the output format and requirements.</p>\n\
         <p><strong>Sample Input</strong><br><pre>1 2 3\n4 5 6</pre></p>\n\
         <p><strong>Sample Output</strong><br><pre>6\n15</pre></p>",
        escape_html(name)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// `explicit` if given, otherwise `P{existing + 1}`.
pub fn next_problem_shortname(explicit: Option<String>, existing: u64) -> String {
    explicit.unwrap_or_else(|| format!("P{}", existing + 1))
}

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/problems/quickadd",
    tag = "Hackathon Problems",
    operation_id = "quickAddProblem",
    summary = "Create a problem with default values",
    description = "Creates a problem (2 s, 256 MiB) with a templated description and links it to \
        the contest. Optional fields: `shortname` (defaults to `P{n+1}`), `name`, and an \
        `attachment` file part. A failed attachment upload does not prevent creation.",
    params(("contest_id" = i32, Path, description = "Contest ID")),
    request_body(content_type = "multipart/form-data", description = "Quick-add form"),
    responses(
        (status = 303, description = "Redirect to the problem list"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session, form), fields(contest_id))]
pub async fn quick_add_problem(
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

    let explicit_shortname = form.non_blank("shortname");
    let explicit_name = form.non_blank("name");
    validate_max_len(explicit_shortname.as_deref(), "Shortname", 255)?;
    validate_max_len(explicit_name.as_deref(), "Name", 255)?;

    let now = Utc::now();
    let existing = count_contest_problems(&state.db, contest_id).await?;
    let shortname = next_problem_shortname(explicit_shortname, existing);
    let name =
        explicit_name.unwrap_or_else(|| format!("New Problem {}", now.format("%Y-%m-%d %H:%M")));

    let mut attachments = Vec::new();
    let mut stored = Vec::new();
    if let Some(file) = form.file("attachment") {
        match store_upload(
            &*state.uploads,
            UploadPolicy::ATTACHMENT,
            Some(contest_id),
            Some(file),
        )
        .await
        {
            Ok(saved) => {
                stored.push(saved.url.clone());
                attachments.push(attachment_from_upload(file, saved));
            }
            Err(e) => {
                warn!(contest_id, error = %e, "Attachment upload failed");
                session.flash(FlashLevel::Danger, format!("Attachment upload failed: {e}"));
            }
        }
    }

    let quick = QuickProblem {
        contest_id,
        name,
        shortname,
        attachments,
        now,
    };
    let problem_id = match insert_quick_problem(&state.db, &quick).await {
        Ok(id) => id,
        Err(e) => {
            error!(contest_id, error = %e, "Failed to quick-add problem");
            discard_uploads(&*state.uploads, &stored).await;
            return Err(e.into());
        }
    };
    info!(contest_id, problem_id, shortname = %quick.shortname, "Quick-added problem");

    Ok(flash_redirect(
        &session,
        FlashLevel::Success,
        "Problem added!",
        &problems_path(contest_id),
    ))
}

struct QuickProblem {
    contest_id: i32,
    name: String,
    shortname: String,
    attachments: Vec<Value>,
    now: DateTime<Utc>,
}

/// Insert the problem, its contest link and its display data in one transaction.
async fn insert_quick_problem(db: &DatabaseConnection, p: &QuickProblem) -> Result<i32, DbErr> {
    let txn = db.begin().await?;

    let created = problem::ActiveModel {
        name: Set(p.name.clone()),
        time_limit: Set(DEFAULT_TIME_LIMIT),
        memory_limit: Set(DEFAULT_MEMORY_LIMIT),
        created_at: Set(p.now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    contest_problem::ActiveModel {
        contest_id: Set(p.contest_id),
        problem_id: Set(created.id),
        shortname: Set(p.shortname.clone()),
    }
    .insert(&txn)
    .await?;

    problem_display_data::ActiveModel {
        problem_id: Set(created.id),
        display_name: Set(Some(p.shortname.clone())),
        description: Set(Some(description_template(&p.name))),
        image_url: Set(None),
        attachments: Set(
            (!p.attachments.is_empty()).then(|| Value::Array(p.attachments.clone())),
        ),
        meta_data: Set(None),
        created_at: Set(p.now),
        updated_at: Set(p.now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(created.id)
}

fn attachment_from_upload(file: &UploadedFile, saved: crate::upload::SavedUpload) -> Value {
    let name = file
        .file_name
        .clone()
        .unwrap_or_else(|| saved.file_name.clone());
    AttachmentRecord::file(name, saved.url, saved.mime_type).into_value()
}

#[utoipa::path(
    get,
    path = "/jury/hackathon/{contest_id}/problems/{problem_id}/edit-display",
    tag = "Hackathon Problems",
    operation_id = "getProblemDisplay",
    summary = "View a problem's display configuration",
    description = "Returns the problem's display data, creating an empty record on first access.",
    params(
        ("contest_id" = i32, Path, description = "Contest ID"),
        ("problem_id" = i32, Path, description = "Problem ID"),
    ),
    responses(
        (status = 200, description = "Problem display configuration", body = ProblemDisplayView),
        (status = 303, description = "Contest or problem not found, redirect to a parent view"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session), fields(contest_id, problem_id))]
pub async fn get_problem_display(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path((contest_id, problem_id)): Path<(i32, i32)>,
) -> Result<Json<ProblemDisplayView>, WorkflowError> {
    auth_user.require_jury()?;

    let contest = or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;
    let (problem, link) = or_redirect(
        find_contest_problem(&state.db, contest_id, problem_id).await,
        &session,
        &problems_path(contest_id),
    )?;
    let display = ensure_problem_display_data(&state.db, problem_id).await?;

    Ok(Json(ProblemDisplayView {
        flashes: session.take_flashes(),
        contest: contest.into(),
        problem: ProblemSummary {
            id: problem.id,
            name: problem.name,
            shortname: link.shortname,
            time_limit: problem.time_limit,
            memory_limit: problem.memory_limit,
        },
        display_data: ProblemDisplayDataResponse::from(display),
    }))
}

#[utoipa::path(
    post,
    path = "/jury/hackathon/{contest_id}/problems/{problem_id}/edit-display",
    tag = "Hackathon Problems",
    operation_id = "saveProblemDisplay",
    summary = "Save a problem's display configuration",
    description = "Either removes one attachment (`remove_attachment` = index) or saves the form: \
        `display_name`, `description`, `image_url`, `meta_data` (JSON), plus an optional \
        `attachment_file` part and `attachment_link` URL, appended in that order.",
    params(
        ("contest_id" = i32, Path, description = "Contest ID"),
        ("problem_id" = i32, Path, description = "Problem ID"),
    ),
    request_body(content_type = "multipart/form-data", description = "Problem display form"),
    responses(
        (status = 303, description = "Redirect back to the problem display configuration"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, session, form), fields(contest_id, problem_id))]
pub async fn save_problem_display(
    auth_user: AuthUser,
    session: Session,
    State(state): State<AppState>,
    Path((contest_id, problem_id)): Path<(i32, i32)>,
    form: FormData,
) -> Result<Response, WorkflowError> {
    auth_user.require_jury()?;

    or_redirect(
        find_contest(&state.db, contest_id).await,
        &session,
        HACKATHON_INDEX,
    )?;
    or_redirect(
        find_contest_problem(&state.db, contest_id, problem_id).await,
        &session,
        &problems_path(contest_id),
    )?;

    let submission = ProblemDisplaySubmission::from_form(&form)?;
    let display = ensure_problem_display_data(&state.db, problem_id).await?;
    let mut attachments = json_list(display.attachments.as_ref());
    let back = problem_display_path(contest_id, problem_id);

    let fields = match submission {
        ProblemDisplaySubmission::RemoveAttachment(index) => {
            if remove_at(&mut attachments, index) {
                let mut active: problem_display_data::ActiveModel = display.into();
                active.attachments = Set(Some(Value::Array(attachments)));
                touch_problem_display(&state.db, active).await?;
                session.flash(FlashLevel::Success, "Attachment removed.");
            }
            return Ok(Redirect::to(&back).into_response());
        }
        ProblemDisplaySubmission::Save(fields) => fields,
    };

    if let Some(file) = form.file(FIELD_ATTACHMENT_FILE) {
        match store_upload(
            &*state.uploads,
            UploadPolicy::ATTACHMENT,
            Some(problem_id),
            Some(file),
        )
        .await
        {
            Ok(saved) => attachments.push(attachment_from_upload(file, saved)),
            Err(e) => {
                warn!(problem_id, error = %e, "Attachment upload failed");
                session.flash(FlashLevel::Danger, format!("Attachment upload failed: {e}"));
            }
        }
    }
    if let Some(link) = fields.attachment_link {
        attachments.push(AttachmentRecord::link(link).into_value());
    }

    let mut active: problem_display_data::ActiveModel = display.into();
    active.display_name = Set(fields.display_name);
    active.description = Set(fields.description);
    active.image_url = Set(fields.image_url);
    active.meta_data = Set(fields.meta_data);
    active.attachments = Set(Some(Value::Array(attachments)));

    match touch_problem_display(&state.db, active).await {
        Ok(_) => session.flash(FlashLevel::Success, "Problem display data saved."),
        Err(e) => {
            error!(problem_id, error = %e.user_message(), "Failed to save problem display data");
            session.flash(
                FlashLevel::Danger,
                format!("Failed to save problem display data: {}", e.user_message()),
            );
        }
    }

    Ok(Redirect::to(&back).into_response())
}
