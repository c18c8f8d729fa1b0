// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    handlers::{admin, auth, categories, posts},
    middleware::{require_admin, require_authenticated},
    openapi::ApiDoc,
    state::AppState,
};

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, posts, categories, admin).
/// * Serves uploaded files under `/uploads` and the API docs under `/swagger-ui`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Protected account routes
        .merge(
            Router::new()
                .route("/me", get(auth::me).put(auth::update_me))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_authenticated,
                )),
        );

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/{slug}", get(posts::get_post))
        .route("/{slug}/views", post(posts::record_view));

    let category_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/{id}", get(categories::get_category));

    let admin_routes = Router::new()
        .route("/posts", get(admin::list_posts).post(admin::create_post))
        .route(
            "/posts/{id}",
            get(admin::get_post)
                .put(admin::update_post)
                .delete(admin::delete_post),
        )
        .route("/posts/{id}/status", patch(admin::set_post_status))
        .route(
            "/media",
            post(admin::upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Token check and admin flag check in one step
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", uploads)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
