use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::{AppError, ErrorBody},
    models::category::{Category, LangParams},
    services::registry::CategoryRegistry,
};

/// All categories in the requested language (`?lang=ar`); unknown languages fall back to English.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    params(("lang" = Option<String>, Query, description = "`en` or `ar`")),
    responses((status = 200, description = "Catalog", body = [Category]))
)]
pub async fn list_categories(
    State(registry): State<Arc<CategoryRegistry>>,
    Query(params): Query<LangParams>,
) -> impl IntoResponse {
    Json(registry.categories_for(params.locale()))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path), ("lang" = Option<String>, Query)),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Unknown id", body = ErrorBody),
    )
)]
pub async fn get_category(
    State(registry): State<Arc<CategoryRegistry>>,
    Path(id): Path<String>,
    Query(params): Query<LangParams>,
) -> Result<impl IntoResponse, AppError> {
    registry
        .find_category(&id, params.locale())
        .map(Json)
        .ok_or(AppError::NotFound(format!("Category '{}' not found", id)))
}
