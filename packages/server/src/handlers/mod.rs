pub mod hackathon;
pub mod phase;
pub mod problem_display;
pub mod transfer;
pub mod upload;

use axum::response::{IntoResponse, Redirect, Response};

use crate::error::AppError;
use crate::session::{FlashLevel, Session};

pub const HACKATHON_INDEX: &str = "/jury/hackathon";

pub fn display_path(contest_id: i32) -> String {
    format!("{HACKATHON_INDEX}/{contest_id}/display")
}

pub fn problems_path(contest_id: i32) -> String {
    format!("{HACKATHON_INDEX}/{contest_id}/problems")
}

pub fn problem_display_path(contest_id: i32, problem_id: i32) -> String {
    format!("{HACKATHON_INDEX}/{contest_id}/problems/{problem_id}/edit-display")
}

pub fn phases_path(contest_id: i32) -> String {
    format!("{HACKATHON_INDEX}/{contest_id}/phases")
}

/// Failure of a form workflow.
///
/// Lookups that miss are reported on the next rendered view and redirect to a
/// safe parent; everything else renders as an `AppError` body.
pub enum WorkflowError {
    Redirect(Response),
    App(AppError),
}

impl From<AppError> for WorkflowError {
    fn from(err: AppError) -> Self {
        WorkflowError::App(err)
    }
}

impl From<sea_orm::DbErr> for WorkflowError {
    fn from(err: sea_orm::DbErr) -> Self {
        WorkflowError::App(err.into())
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        match self {
            WorkflowError::Redirect(res) => res,
            WorkflowError::App(err) => err.into_response(),
        }
    }
}

/// Queue a flash message and redirect with `303 See Other`.
pub fn flash_redirect(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    session.flash(level, message);
    Redirect::to(to).into_response()
}

/// Map `NotFound` to a danger flash plus a redirect to `fallback`.
pub fn or_redirect<T>(
    result: Result<T, AppError>,
    session: &Session,
    fallback: &str,
) -> Result<T, WorkflowError> {
    match result {
        Ok(v) => Ok(v),
        Err(AppError::NotFound(msg)) => Err(WorkflowError::Redirect(flash_redirect(
            session,
            FlashLevel::Danger,
            msg,
            fallback,
        ))),
        Err(e) => Err(WorkflowError::App(e)),
    }
}
