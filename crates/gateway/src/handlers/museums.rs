//! Partner museum and loan request handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{LoanRequest, LoanRequestFilter, MuseumInput, NewLoanRequest, PartnerMuseum, RequestDecision},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: RequestDecision,
}

pub async fn list_museums(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<PartnerMuseum>>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.museums().await?))
}

pub async fn get_museum(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PartnerMuseum>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.museum(id).await?))
}

pub async fn create_museum(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<MuseumInput>,
) -> Result<(StatusCode, Json<PartnerMuseum>)> {
    auth.require(Capability::ManageLoans)?;

    let museum = state.catalog.create_museum(input).await?;
    Ok((StatusCode::CREATED, Json(museum)))
}

pub async fn update_museum(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<MuseumInput>,
) -> Result<Json<PartnerMuseum>> {
    auth.require(Capability::ManageLoans)?;
    Ok(Json(state.catalog.update_museum(id, input).await?))
}

pub async fn delete_museum(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require(Capability::ManageLoans)?;

    state.catalog.delete_museum(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<LoanRequestFilter>,
) -> Result<Json<Vec<LoanRequest>>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.loan_requests(filter).await?))
}

pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<NewLoanRequest>,
) -> Result<(StatusCode, Json<LoanRequest>)> {
    auth.require(Capability::ManageLoans)?;

    let request = state.catalog.create_loan_request(input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn decide_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<LoanRequest>> {
    auth.require(Capability::ManageLoans)?;

    let request = state.catalog.decide_loan_request(id, body.decision).await?;

    tracing::info!(
        request_id = %id,
        status = request.status().as_str(),
        "Loan request decided"
    );

    Ok(Json(request))
}
