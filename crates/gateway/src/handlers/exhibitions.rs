//! Exhibition handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{Exhibition, ExhibitionInput},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    /// Defaults to today (UTC)
    pub today: Option<NaiveDate>,
}

/// Exhibitions are public
pub async fn list_exhibitions(State(state): State<AppState>) -> Result<Json<Vec<Exhibition>>> {
    Ok(Json(state.catalog.exhibitions().await?))
}

pub async fn current_exhibitions(
    State(state): State<AppState>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<Vec<Exhibition>>> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.catalog.current_exhibitions(today).await?))
}

pub async fn get_exhibition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Exhibition>> {
    Ok(Json(state.catalog.exhibition(id).await?))
}

pub async fn create_exhibition(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<ExhibitionInput>,
) -> Result<(StatusCode, Json<Exhibition>)> {
    auth.require(Capability::ManageLoans)?;

    let exhibition = state.catalog.create_exhibition(input).await?;
    Ok((StatusCode::CREATED, Json(exhibition)))
}

pub async fn update_exhibition(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<ExhibitionInput>,
) -> Result<Json<Exhibition>> {
    auth.require(Capability::ManageLoans)?;
    Ok(Json(state.catalog.update_exhibition(id, input).await?))
}

pub async fn delete_exhibition(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require(Capability::ManageLoans)?;

    state.catalog.delete_exhibition(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
