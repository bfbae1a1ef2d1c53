//! HTTP API handlers.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;
use utoipa::ToSchema;

use super::error::{ApiError, ErrorEnvelope};
use crate::account::{Account, AccountId, AccountPayload};
use crate::store::SharedStore;

/// Service name reported by the index endpoint.
pub const SERVICE_NAME: &str = "Account REST API Service";

/// Only media type accepted for request bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record store backend.
    pub store: SharedStore,
    /// Base for `Location` headers; derived from `Host` when `None`.
    pub public_url: Option<Url>,
    /// Prometheus recorder handle, if one is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state around a store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            public_url: None,
            metrics: None,
        }
    }

    /// Use a fixed base URL for `Location` headers.
    pub fn with_public_url(mut self, url: Url) -> Self {
        self.public_url = Some(url);
        self
    }

    /// Expose a Prometheus recorder on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Base URL for `Location` headers: `public_url` when configured,
    /// otherwise `http://{Host}`.
    ///
    /// A `Host` header that is not a bare authority falls back to
    /// `localhost`, so the only failure is a misconfigured `public_url`.
    fn location_base(&self, headers: &HeaderMap) -> Result<Url, ApiError> {
        if let Some(url) = &self.public_url {
            if url.cannot_be_a_base() {
                error!(url = %url, "PUBLIC_URL cannot be used as a base URL");
                return Err(ApiError::Internal(
                    "Failed to build resource location".to_string(),
                ));
            }
            return Ok(url.clone());
        }

        let from_host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .and_then(|host| match Url::parse(&format!("http://{host}")) {
                Ok(url) if is_bare_authority(&url) => Some(url),
                _ => {
                    warn!(host, "Ignoring unusable Host header");
                    None
                }
            });

        match from_host {
            Some(url) => Ok(url),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| {
                error!(error = %e, "Failed to parse default base URL");
                ApiError::Internal("Failed to build resource location".to_string())
            }),
        }
    }
}

/// Base used when the request carries no usable `Host` header.
const DEFAULT_BASE_URL: &str = "http://localhost";

fn is_bare_authority(url: &Url) -> bool {
    url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none()
}

/// Absolute URL of account `id` under `base`.
fn account_location(mut base: Url, id: AccountId) -> String {
    if let Ok(mut segments) = base.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["accounts", id.to_string().as_str()]);
    }
    base.into()
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "OK".
    pub status: String,
}

/// Index response.
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexResponse {
    pub name: String,
    pub version: String,
}

/// Reject requests whose `Content-Type` is not exactly `media_type`.
pub fn check_content_type(headers: &HeaderMap, media_type: &str) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if content_type == Some(media_type) {
        return Ok(());
    }

    warn!(content_type = ?content_type, "Invalid Content-Type");
    Err(ApiError::UnsupportedMediaType(format!(
        "Content-Type must be {media_type}"
    )))
}

/// Unwrap an `{id}` path segment; anything but an integer is a missing
/// resource.
fn account_id(path: Result<Path<AccountId>, PathRejection>) -> Result<AccountId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::NotFound(rejection.body_text()))
}

fn not_found(id: AccountId) -> ApiError {
    ApiError::NotFound(format!("Account with id [{id}] could not be found."))
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

/// Index handler - service name and version.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service identity", body = IndexResponse))
)]
pub async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    request_body(content = AccountPayload, content_type = "application/json"),
    responses(
        (status = 201, description = "Account created", body = Account,
            headers(("Location" = String, description = "URL of the new account"))),
        (status = 400, description = "Invalid account data", body = ErrorEnvelope),
        (status = 413, description = "Request body too large", body = ErrorEnvelope),
        (status = 415, description = "Content-Type is not application/json", body = ErrorEnvelope)
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to create an Account");
    check_content_type(&headers, JSON_MEDIA_TYPE)?;

    let payload = AccountPayload::from_json(&body?)?;
    let base = state.location_base(&headers)?;
    let account = state.store.create(payload).await?;
    let location = account_location(base, account.id);

    info!(id = account.id, "Account created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(account),
    ))
}

/// List all accounts.
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    responses((status = 200, description = "All accounts", body = [Account]))
)]
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    info!("Request to list all Accounts");
    let accounts = state.store.all().await?;
    Ok(Json(accounts))
}

/// Read one account.
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "The account", body = Account),
        (status = 404, description = "No such account", body = ErrorEnvelope)
    )
)]
pub async fn read_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<Account>, ApiError> {
    let id = account_id(path)?;
    info!(id, "Request to read Account");

    let account = state.store.find(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(account))
}

/// Update an account. Existence is checked before the request body.
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    request_body(content = AccountPayload, content_type = "application/json"),
    responses(
        (status = 200, description = "Updated account", body = Account),
        (status = 400, description = "Invalid account data", body = ErrorEnvelope),
        (status = 404, description = "No such account", body = ErrorEnvelope),
        (status = 413, description = "Request body too large", body = ErrorEnvelope),
        (status = 415, description = "Content-Type is not application/json", body = ErrorEnvelope)
    )
)]
pub async fn update_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Account>, ApiError> {
    let id = account_id(path)?;
    info!(id, "Request to update Account");

    let mut account = state.store.find(id).await?.ok_or_else(|| not_found(id))?;
    check_content_type(&headers, JSON_MEDIA_TYPE)?;

    let payload = AccountPayload::from_json(&body?)?;
    account.apply(payload);
    let account = state.store.update(&account).await?;
    Ok(Json(account))
}

/// Delete an account. Succeeds whether or not it exists.
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    responses((status = 204, description = "Account no longer exists"))
)]
pub async fn delete_account(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = account_id(path)?;
    info!(id, "Request to delete Account");

    if state.store.delete(id).await? {
        info!(id, "Account deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Prometheus exposition of service metrics.
pub async fn render_metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("Metrics recorder is not installed".to_string()))
}

/// Fallback for unknown paths.
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("The requested URL {} was not found on the server.", uri.path()))
}

/// Fallback for verbs a known path does not support.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!(
        "The method {method} is not allowed for the requested URL {}.",
        uri.path()
    ))
}
