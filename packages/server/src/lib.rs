pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod schema;
pub mod session;
pub mod state;
pub mod upload;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hackathon Configuration API",
        version = "1.0.0",
        description = "Jury tooling for hackathon contests: display data, phases, problem \
            presentation and configuration transfer"
    ),
    paths(
        handlers::hackathon::list_hackathons,
        handlers::hackathon::quick_add_hackathon,
        handlers::hackathon::get_display,
        handlers::hackathon::save_display,
        handlers::problem_display::list_problems,
        handlers::problem_display::quick_add_problem,
        handlers::problem_display::get_problem_display,
        handlers::problem_display::save_problem_display,
        handlers::transfer::export_display,
        handlers::transfer::import_display,
        handlers::phase::enable_phases,
        handlers::phase::list_contest_phases,
        handlers::phase::create_phase,
        handlers::phase::update_phase,
        handlers::phase::delete_phase,
        handlers::upload::upload_editor_image,
        handlers::upload::serve_upload,
    ),
    tags(
        (name = "Hackathon", description = "Contest overview, quick-add and display configuration"),
        (name = "Hackathon Problems", description = "Contest problems and their display data"),
        (name = "Hackathon Transfer", description = "JSON export and import of display configuration"),
        (name = "Hackathon Phases", description = "Contest phase management"),
        (name = "Uploads", description = "Editor image uploads and stored file access"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(cfg.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let storage = &state.config.storage;
    let router = routes::routes(&storage.public_prefix, storage.max_request_size);
    let cors = cors_layer(&state.config.server.cors);

    router
        .layer(middleware::from_fn(session::session_layer))
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}
