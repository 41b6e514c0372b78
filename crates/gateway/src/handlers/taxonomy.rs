//! Lookup table handlers (rooms, periods, styles, techniques, materials)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{TaxonomyEntry, TaxonomyInput, TaxonomyKind},
    errors::Result,
};

/// Lookup tables are public; visitors filter the gallery with them
pub async fn list_entries(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<TaxonomyEntry>>> {
    let kind: TaxonomyKind = kind.parse()?;
    Ok(Json(state.catalog.taxonomy_entries(kind).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kind): Path<String>,
    Json(input): Json<TaxonomyInput>,
) -> Result<(StatusCode, Json<TaxonomyEntry>)> {
    auth.require(Capability::EditCatalog)?;
    let kind: TaxonomyKind = kind.parse()?;

    let entry = state.catalog.create_taxonomy_entry(kind, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn rename_entry(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(input): Json<TaxonomyInput>,
) -> Result<Json<TaxonomyEntry>> {
    auth.require(Capability::EditCatalog)?;
    let kind: TaxonomyKind = kind.parse()?;
    state.catalog.taxonomy_entry(kind, id).await?;

    Ok(Json(state.catalog.rename_taxonomy_entry(id, input).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<StatusCode> {
    auth.require(Capability::EditCatalog)?;
    let kind: TaxonomyKind = kind.parse()?;
    state.catalog.taxonomy_entry(kind, id).await?;

    state.catalog.delete_taxonomy_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
