//! Staff reports

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{MaintenanceEntry, ValuationReport},
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct MaintenanceQuery {
    /// Defaults to today (UTC)
    pub today: Option<NaiveDate>,
}

/// Artworks overdue for restoration
pub async fn maintenance(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<Vec<MaintenanceEntry>>> {
    auth.require(Capability::ViewCatalog)?;

    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.catalog.maintenance_report(today).await?))
}

pub async fn valuation(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ValuationReport>> {
    auth.require(Capability::ViewValuation)?;
    Ok(Json(state.catalog.valuation_report().await?))
}
