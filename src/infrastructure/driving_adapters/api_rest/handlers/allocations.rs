//! Allocation Handlers
//!
//! HTTP handlers for the CIDR registry.
//! All endpoints require JWT authentication.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::domain::models::allocation::{AllocateCidrData, AllocationOutcome, NetworkId, RegisterCidrData};
use crate::infrastructure::driving_adapters::api_rest::dto::allocation::{
    AllocateCidrDto, AllocationPageDto, AllocationResponseDto, CheckOverlapsDto, ListAllocationsQuery,
    OverlapReportDto, RegisterCidrDto,
};
use crate::infrastructure::driving_adapters::api_rest::middleware::auth::JwtAuth;
use crate::infrastructure::driving_adapters::api_rest::AppState;
use crate::shared::errors::{ApiError, UseCaseError};

/// Create the router for allocation endpoints
///
/// All routes require JWT authentication via the `JwtAuth` extractor.
/// The `add_config_extension` middleware injects the config into request extensions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(allocate_cidr).get(list_active_allocations))
        .route("/register", post(register_cidr))
        .route("/overlaps", post(check_overlaps))
        .route("/:network_id", get(lookup_cidr).delete(release_cidr))
}

/// 201 for a fresh allocation, 200 when the network already held one
fn outcome_response(outcome: AllocationOutcome) -> (StatusCode, Json<AllocationResponseDto>) {
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(AllocationResponseDto::from(outcome.allocation)))
}

/// POST /allocations - Allocate the lowest free block of the requested size
///
/// # Responses
///
/// * 201 Created - Block allocated
/// * 200 OK - Network already held a block; it is returned unchanged
/// * 400 Bad Request - Validation error or prefix outside the pool bounds
/// * 401 Unauthorized - Missing or invalid JWT token
/// * 409 Conflict - Pool exhausted for that size
/// * 503 Service Unavailable - Commit conflicts exceeded the retry budget, or the store is down
#[axum::debug_handler]
async fn allocate_cidr(
    JwtAuth(caller): JwtAuth,
    State(state): State<AppState>,
    Json(dto): Json<AllocateCidrDto>,
) -> Result<(StatusCode, Json<AllocationResponseDto>), ApiError> {
    dto.validate()?;
    let data = AllocateCidrData::try_from(dto)?;

    tracing::debug!(caller = %caller.id, network_id = %data.network_id, "Allocate requested");
    let outcome = state.allocate_cidr_use_case.execute(data).await?;

    Ok(outcome_response(outcome))
}

/// POST /allocations/register - Record a block the network already uses
///
/// # Responses
///
/// * 201 Created - Block recorded
/// * 200 OK - Same block was already recorded for the network
/// * 400 Bad Request - Validation error
/// * 401 Unauthorized - Missing or invalid JWT token
/// * 409 Conflict - Block overlaps another network, or the network holds a different block
#[axum::debug_handler]
async fn register_cidr(
    JwtAuth(caller): JwtAuth,
    State(state): State<AppState>,
    Json(dto): Json<RegisterCidrDto>,
) -> Result<(StatusCode, Json<AllocationResponseDto>), ApiError> {
    dto.validate()?;
    let data = RegisterCidrData::try_from(dto)?;

    tracing::debug!(caller = %caller.id, network_id = %data.network_id, "Register requested");
    let outcome = state.register_cidr_use_case.execute(data).await?;

    Ok(outcome_response(outcome))
}

/// POST /allocations/overlaps - Check candidate blocks against active allocations
///
/// # Responses
///
/// * 200 OK - One report per candidate, in request order
/// * 400 Bad Request - Validation error
/// * 401 Unauthorized - Missing or invalid JWT token
#[axum::debug_handler]
async fn check_overlaps(
    _auth: JwtAuth,
    State(state): State<AppState>,
    Json(dto): Json<CheckOverlapsDto>,
) -> Result<Json<Vec<OverlapReportDto>>, ApiError> {
    dto.validate()?;
    let candidates = dto.to_blocks()?;

    let reports = state.check_overlaps_use_case.execute(candidates).await?;

    Ok(Json(reports.into_iter().map(OverlapReportDto::from).collect()))
}

/// GET /allocations - Page through active allocations by allocation time
///
/// # Responses
///
/// * 200 OK - `{items, nextCursor}`; `nextCursor` is null on the last page
/// * 400 Bad Request - Malformed cursor or limit outside 1..=1000
/// * 401 Unauthorized - Missing or invalid JWT token
#[axum::debug_handler]
async fn list_active_allocations(
    _auth: JwtAuth,
    State(state): State<AppState>,
    Query(query): Query<ListAllocationsQuery>,
) -> Result<Json<AllocationPageDto>, ApiError> {
    let after = query.cursor()?;

    let page = state
        .list_active_allocations_use_case
        .execute(after, query.limit())
        .await?;

    Ok(Json(AllocationPageDto::from(page)))
}

/// GET /allocations/:network_id - The block a network currently holds
///
/// # Responses
///
/// * 200 OK - Active allocation found
/// * 401 Unauthorized - Missing or invalid JWT token
/// * 404 Not Found - Network holds no active block
#[axum::debug_handler]
async fn lookup_cidr(
    _auth: JwtAuth,
    State(state): State<AppState>,
    Path(network_id): Path<String>,
) -> Result<Json<AllocationResponseDto>, ApiError> {
    let network_id = NetworkId::try_from(network_id)?;

    let allocation = state
        .lookup_cidr_use_case
        .execute(&network_id)
        .await?
        .ok_or_else(|| UseCaseError::NotFound {
            resource: "Allocation".to_string(),
            id: network_id.to_string(),
        })?;

    Ok(Json(AllocationResponseDto::from(allocation)))
}

/// DELETE /allocations/:network_id - Release a network's block
///
/// # Responses
///
/// * 204 No Content - Block released
/// * 401 Unauthorized - Missing or invalid JWT token
/// * 404 Not Found - Network holds no active block
#[axum::debug_handler]
async fn release_cidr(
    JwtAuth(caller): JwtAuth,
    State(state): State<AppState>,
    Path(network_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let network_id = NetworkId::try_from(network_id)?;

    tracing::debug!(caller = %caller.id, network_id = %network_id, "Release requested");
    state.release_cidr_use_case.execute(&network_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
