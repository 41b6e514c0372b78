//! Visitor-facing endpoints; no token needed

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::Paging;
use crate::AppState;
use museo_common::{
    auth::Role,
    domain::{ArtworkFilter, ArtworkView, Exhibition, Page},
    errors::Result,
};

#[derive(Serialize)]
pub struct HomeResponse {
    pub exhibitions: Vec<Exhibition>,
    pub recent_artworks: Vec<ArtworkView>,
}

/// Artworks on display, filtered like the staff search
pub async fn gallery(
    State(state): State<AppState>,
    Query(filter): Query<ArtworkFilter>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<ArtworkView>>> {
    let page = state.catalog.public_gallery(filter, paging.offset).await?;
    Ok(Json(page.map(|a| ArtworkView::project(&a, Role::Public))))
}

pub async fn artwork(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtworkView>> {
    let artwork = state.catalog.public_artwork(id).await?;
    Ok(Json(ArtworkView::project(&artwork, Role::Public)))
}

pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let home = state.catalog.home().await?;

    Ok(Json(HomeResponse {
        exhibitions: home.exhibitions,
        recent_artworks: home
            .recent_artworks
            .iter()
            .map(|a| ArtworkView::project(a, Role::Public))
            .collect(),
    }))
}
