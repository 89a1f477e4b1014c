use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::intake::IntakePipeline;
use crate::models::*;
use crate::storage::{RequestStore, ServiceCatalog};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Read-only services catalog.
    pub catalog: Arc<dyn ServiceCatalog>,
    /// Service request collection.
    pub store: Arc<dyn RequestStore>,
    /// Submission pipeline over `catalog` and `store`.
    pub intake: IntakePipeline,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn ServiceCatalog>,
        store: Arc<dyn RequestStore>,
    ) -> Self {
        let intake = IntakePipeline::new(catalog.clone(), store.clone());
        Self {
            config,
            catalog,
            store,
            intake,
        }
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "brokerage-intake-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Picks the locale for a request: explicit `?locale=`, then the first
/// `Accept-Language` tag, then the configured default.
pub fn request_locale(query: Option<&str>, headers: &HeaderMap, default: &str) -> String {
    let explicit = query
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty());

    explicit
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|tag| tag.split(';').next())
                .and_then(|tag| tag.trim().split('-').next())
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty() && tag != "*")
        })
        .unwrap_or_else(|| default.to_string())
}

/// POST /api/v1/requests
///
/// Public form endpoint. The body is an arbitrary JSON object; its shape is
/// decided by the target service's request kind.
pub async fn submit_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<SubmitQuery>, QueryRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("Unreadable submission body: {}", e.body_text());
        AppError::BadRequest("Request body must be a JSON object".to_string())
    })?;

    let locale = request_locale(query.locale.as_deref(), &headers, &state.config.default_locale);
    tracing::info!("POST /requests - locale: {}", locale);

    let record = state.intake.submit(payload, &locale).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            request_id: record.id.clone(),
            request: record,
        }),
    ))
}

/// GET /api/v1/services
///
/// Active catalog entries with names resolved for the caller's locale.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<SubmitQuery>, QueryRejection>,
) -> Result<Json<Vec<ServiceView>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let locale = request_locale(query.locale.as_deref(), &headers, &state.config.default_locale);

    let services = state
        .catalog
        .active_services()
        .await
        .context("listing services")?;

    Ok(Json(services.iter().map(|s| s.view(&locale)).collect()))
}

// ============ Admin ============

/// Checks the admin token from `X-Admin-Token` or `Authorization: Bearer`.
pub fn require_admin(headers: &HeaderMap, config: &Config) -> Result<(), AppError> {
    let Some(ref expected) = config.admin_token else {
        return Err(AppError::InternalError(
            "ADMIN_TOKEN is not configured".to_string(),
        ));
    };

    let token = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("Missing admin token".to_string()))?;

    // Constant-time comparison to prevent timing attacks
    if !constant_time_compare(token, expected) {
        tracing::warn!("Invalid admin token received");
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

fn request_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse(raw).ok_or_else(|| AppError::BadRequest("Invalid request id".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Service request not found".to_string())
}

/// GET /api/v1/admin/requests
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    filter: Result<Query<RequestFilter>, QueryRejection>,
) -> Result<Json<RequestPage>, AppError> {
    require_admin(&headers, &state.config)?;
    let Query(filter) = filter.map_err(|e| AppError::BadRequest(e.body_text()))?;

    tracing::info!("GET /admin/requests - filter: {:?}", filter);
    let page = state.store.list(&filter).await?;

    tracing::debug!(
        "Returning {} of {} requests (page {}/{})",
        page.requests.len(),
        page.pagination.total,
        page.pagination.page,
        page.pagination.pages
    );
    Ok(Json(page))
}

/// GET /api/v1/admin/requests/:id
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ServiceRequestRecord>, AppError> {
    require_admin(&headers, &state.config)?;
    let id = request_id(&id)?;

    let record = state.store.find(&id).await?.ok_or_else(not_found)?;
    Ok(Json(record))
}

/// PATCH /api/v1/admin/requests/:id
///
/// Changes `status` and/or `adminNotes`. Status changes must follow the
/// request lifecycle.
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    update: Result<Json<AdminUpdate>, JsonRejection>,
) -> Result<Json<ServiceRequestRecord>, AppError> {
    require_admin(&headers, &state.config)?;
    let id = request_id(&id)?;
    let Json(update) = update.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut record = state.store.find(&id).await?.ok_or_else(not_found)?;
    let previous = record.request.status;
    record.request.apply_admin_update(&update, Utc::now())?;

    if !state.store.replace(&record).await? {
        return Err(not_found());
    }

    tracing::info!(
        "✓ Request {} updated ({} -> {})",
        record.id,
        previous,
        record.request.status
    );
    Ok(Json(record))
}

/// DELETE /api/v1/admin/requests/:id
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&headers, &state.config)?;
    let id = request_id(&id)?;

    if !state.store.delete(&id).await? {
        return Err(not_found());
    }

    tracing::info!("✓ Request {} deleted", id);
    Ok(Json(json!({ "success": true })))
}
