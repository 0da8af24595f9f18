use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes(public_prefix: &str, max_request_size: usize) -> Router<AppState> {
    let uploads_path = format!("{}/{{bucket}}/{{file}}", public_prefix.trim_end_matches('/'));

    Router::new()
        .nest("/jury/hackathon", hackathon_routes(max_request_size))
        .route(
            "/jury/upload-image-endpoint",
            post(handlers::upload::upload_editor_image)
                .layer(handlers::upload::upload_body_limit(max_request_size)),
        )
        .route(&uploads_path, get(handlers::upload::serve_upload))
}

fn hackathon_routes(max_request_size: usize) -> Router<AppState> {
    let forms = Router::new()
        .route(
            "/{contest_id}/display",
            get(handlers::hackathon::get_display).post(handlers::hackathon::save_display),
        )
        .route(
            "/{contest_id}/problems/quickadd",
            post(handlers::problem_display::quick_add_problem),
        )
        .route(
            "/{contest_id}/problems/{problem_id}/edit-display",
            get(handlers::problem_display::get_problem_display)
                .post(handlers::problem_display::save_problem_display),
        )
        .route(
            "/{contest_id}/import-display",
            post(handlers::transfer::import_display),
        )
        .layer(handlers::upload::upload_body_limit(max_request_size));

    Router::new()
        .route("/", get(handlers::hackathon::list_hackathons))
        .route("/quick-add", get(handlers::hackathon::quick_add_hackathon))
        .route(
            "/{contest_id}/problems",
            get(handlers::problem_display::list_problems),
        )
        .route(
            "/{contest_id}/export-display",
            get(handlers::transfer::export_display),
        )
        .route(
            "/{contest_id}/enable-phases",
            post(handlers::phase::enable_phases),
        )
        .route(
            "/{contest_id}/phases",
            get(handlers::phase::list_contest_phases).post(handlers::phase::create_phase),
        )
        .route(
            "/{contest_id}/phases/{phase_id}",
            patch(handlers::phase::update_phase).delete(handlers::phase::delete_phase),
        )
        .merge(forms)
}
