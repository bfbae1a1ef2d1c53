//! OpenAPI description of the account API.

use axum::Json;
use utoipa::OpenApi;

use super::error::ErrorEnvelope;
use super::handlers::{self, HealthResponse, IndexResponse};
use crate::account::{Account, AccountPayload};

/// OpenAPI document for every public endpoint.
#[derive(OpenApi)]
#[openapi(
    info(title = "Account REST API Service"),
    paths(
        handlers::index,
        handlers::health,
        handlers::list_accounts,
        handlers::create_account,
        handlers::read_account,
        handlers::update_account,
        handlers::delete_account,
    ),
    components(schemas(Account, AccountPayload, ErrorEnvelope, HealthResponse, IndexResponse)),
    tags((name = "accounts", description = "Account lifecycle"))
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
