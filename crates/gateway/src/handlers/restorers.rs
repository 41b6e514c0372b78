//! Restorer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{Availability, ArtworkKind, EmploymentState, Restorer, RestorerFilter, RestorerInput},
    errors::Result,
};

/// A restorer with the derived availability column
#[derive(Serialize)]
pub struct RestorerResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_names: String,
    pub email: String,
    pub phone: Option<String>,
    pub employment: EmploymentState,
    pub specialty: ArtworkKind,
    pub occupied: bool,
    pub availability: Availability,
}

impl From<Restorer> for RestorerResponse {
    fn from(r: Restorer) -> Self {
        Self {
            id: r.id,
            occupied: r.occupied(),
            availability: r.availability(),
            first_name: r.first_name,
            last_names: r.last_names,
            email: r.email,
            phone: r.phone,
            employment: r.employment,
            specialty: r.specialty,
        }
    }
}

pub async fn list_restorers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<RestorerFilter>,
) -> Result<Json<Vec<RestorerResponse>>> {
    auth.require(Capability::ViewCatalog)?;

    let restorers = state.catalog.restorers(filter).await?;
    Ok(Json(restorers.into_iter().map(Into::into).collect()))
}

pub async fn get_restorer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RestorerResponse>> {
    auth.require(Capability::ViewCatalog)?;
    Ok(Json(state.catalog.restorer(id).await?.into()))
}

pub async fn create_restorer(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<RestorerInput>,
) -> Result<(StatusCode, Json<RestorerResponse>)> {
    auth.require(Capability::EditCatalog)?;

    let restorer = state.catalog.create_restorer(input).await?;
    Ok((StatusCode::CREATED, Json(restorer.into())))
}

pub async fn update_restorer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<RestorerInput>,
) -> Result<Json<RestorerResponse>> {
    auth.require(Capability::EditCatalog)?;
    Ok(Json(state.catalog.update_restorer(id, input).await?.into()))
}

pub async fn delete_restorer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require(Capability::EditCatalog)?;

    state.catalog.delete_restorer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
