//! Role-dependent views of catalog entities.
//!
//! The catalog always hands out full entities; this is where fields are
//! withheld from callers whose role may not see them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::artwork::{Artwork, ArtworkKind, ArtworkState};
use crate::auth::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtworkView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation: Option<Decimal>,
    pub creation_date: String,
    pub museum_entry_date: NaiveDate,
    pub state: ArtworkState,
    pub state_label: &'static str,
    pub kind: ArtworkKind,
    pub technique_ids: BTreeSet<Uuid>,
    pub material_ids: BTreeSet<Uuid>,
    pub period_id: Uuid,
    pub room_id: Uuid,
    pub style_ids: BTreeSet<Uuid>,
    pub image: Option<String>,
}

impl ArtworkView {
    pub fn project(artwork: &Artwork, role: Role) -> Self {
        Self {
            id: artwork.id,
            title: artwork.title.clone(),
            author: artwork.author.clone(),
            valuation: role.can_see_valuation().then_some(artwork.valuation),
            creation_date: artwork.creation_date.clone(),
            museum_entry_date: artwork.museum_entry_date,
            state: artwork.state,
            state_label: artwork.state.label(),
            kind: artwork.kind,
            technique_ids: artwork.technique_ids.clone(),
            material_ids: artwork.material_ids.clone(),
            period_id: artwork.period_id,
            room_id: artwork.room_id,
            style_ids: artwork.style_ids.clone(),
            image: artwork.image.clone(),
        }
    }
}
