use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::FormData;
use crate::state::AppState;
use crate::upload::{UploadPolicy, store_upload};

pub fn upload_body_limit(max_request_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_request_size)
}

/// Response shape expected by the rich-text editor's image uploader.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EditorImageResponse {
    #[schema(example = "/uploads/tinymce/tinymce_5f0c6d0e9a2b4c1d8e7f6a5b4c3d2e1f.png")]
    pub location: String,
}

#[utoipa::path(
    post,
    path = "/jury/upload-image-endpoint",
    tag = "Uploads",
    operation_id = "uploadEditorImage",
    summary = "Upload an image for the rich-text editor",
    description = "Stores the `file` part (png, jpeg, gif, webp or svg) and returns its public location.",
    request_body(content_type = "multipart/form-data", description = "Image upload"),
    responses(
        (status = 200, description = "Image stored", body = EditorImageResponse),
        (status = 400, description = "Missing or unsupported file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form))]
pub async fn upload_editor_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<EditorImageResponse>, AppError> {
    auth_user.require_jury()?;

    let saved = store_upload(
        &*state.uploads,
        UploadPolicy::EDITOR_IMAGE,
        None,
        form.file("file"),
    )
    .await?;

    Ok(Json(EditorImageResponse {
        location: saved.url,
    }))
}

#[utoipa::path(
    get,
    path = "/uploads/{bucket}/{file}",
    tag = "Uploads",
    operation_id = "getUploadedFile",
    summary = "Download an uploaded file",
    params(
        ("bucket" = String, Path, description = "Bucket directory, e.g. `hackathon_banners`"),
        ("file" = String, Path, description = "Stored file name"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid path (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path((bucket, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let prefix = state.config.storage.public_prefix.trim_end_matches('/');
    let public_path = format!("{prefix}/{bucket}/{file}");
    let content = state.uploads.get(&public_path).await?;

    let mime = mime_guess::from_path(&file).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
