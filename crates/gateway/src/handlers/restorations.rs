//! Restoration workflow handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{NewRestoration, Restoration, RestorationFilter, RestorationStatus},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    pub team: BTreeSet<Uuid>,
}

#[derive(Serialize)]
pub struct RestorationResponse {
    pub id: Uuid,
    pub artwork_id: Uuid,
    pub team: BTreeSet<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: RestorationStatus,
    pub damage_report: String,
    pub restoration_type: String,
}

impl From<Restoration> for RestorationResponse {
    fn from(r: Restoration) -> Self {
        Self {
            id: r.id,
            end_date: r.end_date(),
            status: r.status(),
            artwork_id: r.artwork_id,
            team: r.team,
            start_date: r.start_date,
            damage_report: r.damage_report,
            restoration_type: r.restoration_type,
        }
    }
}

pub async fn list_restorations(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<RestorationFilter>,
) -> Result<Json<Vec<RestorationResponse>>> {
    auth.require(Capability::ViewCatalog)?;

    let restorations = state.catalog.restorations(filter).await?;
    Ok(Json(restorations.into_iter().map(Into::into).collect()))
}

pub async fn get_restoration(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RestorationResponse>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.restoration(id).await?.into()))
}

/// Send an artwork to restoration with a team
pub async fn begin_restoration(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<NewRestoration>,
) -> Result<(StatusCode, Json<RestorationResponse>)> {
    auth.require(Capability::ManageRestorations)?;

    let restoration = state.catalog.begin_restoration(input).await?;

    tracing::info!(
        restoration_id = %restoration.id,
        artwork_id = %restoration.artwork_id,
        request_id = %auth.request_id,
        "Restoration opened"
    );

    Ok((StatusCode::CREATED, Json(restoration.into())))
}

pub async fn complete_restoration(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<RestorationResponse>> {
    auth.require(Capability::ManageRestorations)?;

    let restoration = state.catalog.complete_restoration(id, request.end_date).await?;
    Ok(Json(restoration.into()))
}

pub async fn change_team(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<TeamRequest>,
) -> Result<Json<RestorationResponse>> {
    auth.require(Capability::ManageRestorations)?;

    let restoration = state.catalog.change_restoration_team(id, request.team).await?;
    Ok(Json(restoration.into()))
}

pub async fn clear_team(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RestorationResponse>> {
    auth.require(Capability::ManageRestorations)?;

    let restoration = state.catalog.clear_restoration_team(id).await?;
    Ok(Json(restoration.into()))
}
