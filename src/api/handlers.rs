//! API request handlers
//!
//! Handlers for all REST API endpoints. Each one parses its request, calls a
//! single registry operation and maps the outcome to a status code.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::AppState;
use crate::error::{Missing, SheetError, SheetResult};
use crate::types::{AuditReport, Column, Scalar, SheetId, SheetSnapshot};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            kind: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn err(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
            kind: Some(kind.into()),
        }
    }
}

//==============================================================================
// Errors
//==============================================================================

/// Failure of a request, rendered as an `ApiResponse` error body
#[derive(Debug)]
pub enum ApiError {
    Sheet { status: StatusCode, error: SheetError },
    /// Body or path could not be parsed into the expected request shape
    InvalidRequest(String),
}

impl ApiError {
    /// Errors from a cell write. The column comes from the request body, so an
    /// unknown column is a bad request rather than a missing resource.
    pub fn from_write(error: SheetError) -> Self {
        let status = match &error {
            SheetError::NotFound(Missing::Column(_)) => StatusCode::BAD_REQUEST,
            other => status_for(other),
        };
        ApiError::Sheet { status, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Sheet { status, .. } => *status,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Sheet { error, .. } => error.kind(),
            ApiError::InvalidRequest(_) => "InvalidRequest",
        }
    }
}

fn status_for(error: &SheetError) -> StatusCode {
    match error {
        SheetError::NotFound(_) => StatusCode::NOT_FOUND,
        SheetError::Inconsistent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SheetError::InvalidSchema(_)
        | SheetError::InvalidFormula(_)
        | SheetError::MissingSource(_)
        | SheetError::CircularDependency(_)
        | SheetError::InvalidType { .. } => StatusCode::BAD_REQUEST,
    }
}

impl From<SheetError> for ApiError {
    fn from(error: SheetError) -> Self {
        ApiError::Sheet {
            status: status_for(&error),
            error,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Sheet { error, .. } => error.to_string(),
            ApiError::InvalidRequest(message) => message.clone(),
        };
        let body = ApiResponse::err(self.kind(), message);
        (self.status(), Json(body)).into_response()
    }
}

//==============================================================================
// Info Endpoints
//==============================================================================

/// Root endpoint response
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Lookup Sheets API Server".to_string(),
        version: state.version.clone(),
        description: "Typed in-memory sheets with lookup formulas".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new("POST", "/sheet", "Create a sheet from a column list"),
            EndpointInfo::new("GET", "/sheets", "List all sheets"),
            EndpointInfo::new("GET", "/sheet/:sheet_id", "Get a sheet with its cells"),
            EndpointInfo::new("DELETE", "/sheet/:sheet_id", "Delete a sheet"),
            EndpointInfo::new("PUT", "/sheet/:sheet_id/cell", "Set a literal or lookup cell"),
            EndpointInfo::new(
                "GET",
                "/sheet/:sheet_id/cell/:column/:row/audit",
                "Show a cell's lookup chain and dependents",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: i64,
    pub sheets: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: uptime.num_seconds(),
        sheets: state.registry.len(),
    }))
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["sheets", "lookup", "propagation", "audit"]
            .into_iter()
            .map(String::from)
            .collect(),
    }))
}

//==============================================================================
// Sheet Endpoints
//==============================================================================

/// One column in a create request; the type is checked by the core
#[derive(Debug, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TryFrom<ColumnSpec> for Column {
    type Error = SheetError;

    fn try_from(spec: ColumnSpec) -> SheetResult<Self> {
        Ok(Column::new(spec.name, spec.kind.parse()?))
    }
}

/// Create sheet request
#[derive(Debug, Deserialize)]
pub struct CreateSheetRequest {
    pub columns: Vec<ColumnSpec>,
}

/// Create sheet response
#[derive(Debug, Serialize)]
pub struct CreateSheetResponse {
    #[serde(rename = "sheetId")]
    pub sheet_id: SheetId,
}

/// POST /sheet - Create a sheet
pub async fn create_sheet(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSheetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreateSheetResponse>>), ApiError> {
    let Json(req) = payload?;
    let columns = req
        .columns
        .into_iter()
        .map(Column::try_from)
        .collect::<SheetResult<Vec<_>>>()?;

    let sheet_id = state.registry.create_sheet(columns)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CreateSheetResponse { sheet_id })),
    ))
}

/// GET /sheets - All sheets
pub async fn list_sheets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.registry.list_sheets()))
}

/// GET /sheet/:sheet_id - One sheet
pub async fn get_sheet(
    State(state): State<Arc<AppState>>,
    Path(sheet_id): Path<String>,
) -> Result<Json<ApiResponse<SheetSnapshot>>, ApiError> {
    let snapshot = state.registry.get_sheet(&SheetId::from(sheet_id))?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// DELETE /sheet/:sheet_id - Discard a sheet
pub async fn delete_sheet(
    State(state): State<Arc<AppState>>,
    Path(sheet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete_sheet(&SheetId::from(sheet_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set cell request
#[derive(Debug, Deserialize)]
pub struct SetCellRequest {
    pub column: String,
    pub row: u64,
    pub value: Scalar,
}

/// PUT /sheet/:sheet_id/cell - Set or overwrite a cell
pub async fn set_cell(
    State(state): State<Arc<AppState>>,
    Path(sheet_id): Path<String>,
    payload: Result<Json<SetCellRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    state
        .registry
        .set_cell(&SheetId::from(sheet_id), &req.column, req.row, req.value)
        .map_err(ApiError::from_write)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /sheet/:sheet_id/cell/:column/:row/audit - Dependency audit
pub async fn audit_cell(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, u64)>, PathRejection>,
) -> Result<Json<ApiResponse<AuditReport>>, ApiError> {
    let Path((sheet_id, column, row)) = path?;
    let report = state
        .registry
        .audit_cell(&SheetId::from(sheet_id), &column, row)?;
    Ok(Json(ApiResponse::ok(report)))
}
