//! Loan (cession) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{Loan, LoanFilter, NewLoan},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub returned_on: NaiveDate,
}

pub async fn list_loans(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<LoanFilter>,
) -> Result<Json<Vec<Loan>>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.loans(filter).await?))
}

pub async fn get_loan(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Loan>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.loan(id).await?))
}

pub async fn create_loan(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<NewLoan>,
) -> Result<(StatusCode, Json<Loan>)> {
    auth.require(Capability::ManageLoans)?;

    let loan = state.catalog.create_loan(input).await?;

    tracing::info!(
        loan_id = %loan.id,
        museum_id = %loan.museum_id,
        artworks = loan.artwork_ids.len(),
        request_id = %auth.request_id,
        "Loan agreed"
    );

    Ok((StatusCode::CREATED, Json(loan)))
}

pub async fn return_loan(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<ReturnRequest>,
) -> Result<Json<Loan>> {
    auth.require(Capability::ManageLoans)?;
    Ok(Json(state.catalog.return_from_loan(id, request.returned_on).await?))
}
