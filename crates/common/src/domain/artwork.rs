//! Artwork entity, its lifecycle states and classification rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::catalog::Catalog;
use super::taxonomy::TaxonomyKind;
use super::violations::Violations;
use crate::errors::{AppError, Result};

/// Where an artwork currently is.
///
/// Only the restoration and loan operations move an artwork between
/// states; catalog edits never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkState {
    OnDisplay,
    InRestoration,
    OnLoan,
    InStorage,
}

impl ArtworkState {
    pub const ALL: [ArtworkState; 4] = [
        ArtworkState::OnDisplay,
        ArtworkState::InRestoration,
        ArtworkState::OnLoan,
        ArtworkState::InStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkState::OnDisplay => "on_display",
            ArtworkState::InRestoration => "in_restoration",
            ArtworkState::OnLoan => "on_loan",
            ArtworkState::InStorage => "in_storage",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtworkState::OnDisplay => "On display",
            ArtworkState::InRestoration => "In restoration",
            ArtworkState::OnLoan => "On loan",
            ArtworkState::InStorage => "In storage",
        }
    }
}

impl Default for ArtworkState {
    fn default() -> Self {
        ArtworkState::InStorage
    }
}

impl fmt::Display for ArtworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArtworkState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        ArtworkState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown artwork state '{}'", s),
            })
    }
}

/// Painting or sculpture; also a restorer's specialty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkKind {
    Painting,
    Sculpture,
}

impl ArtworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkKind::Painting => "painting",
            ArtworkKind::Sculpture => "sculpture",
        }
    }
}

impl fmt::Display for ArtworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtworkKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "painting" => Ok(ArtworkKind::Painting),
            "sculpture" => Ok(ArtworkKind::Sculpture),
            _ => Err(AppError::InvalidFormat {
                message: format!("unknown artwork kind '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artwork {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub valuation: Decimal,
    /// Free text, e.g. "c. 1503" or "unknown"
    pub creation_date: String,
    pub museum_entry_date: NaiveDate,
    pub(crate) state: ArtworkState,
    pub kind: ArtworkKind,
    pub technique_ids: BTreeSet<Uuid>,
    pub material_ids: BTreeSet<Uuid>,
    pub period_id: Uuid,
    pub room_id: Uuid,
    pub style_ids: BTreeSet<Uuid>,
    /// Stored image path; uploads are handled elsewhere
    pub image: Option<String>,
}

impl Artwork {
    pub fn state(&self) -> ArtworkState {
        self.state
    }

    /// Whether the artwork points at the given lookup entry
    pub fn references(&self, entry_id: Uuid) -> bool {
        self.room_id == entry_id
            || self.period_id == entry_id
            || self.style_ids.contains(&entry_id)
            || self.technique_ids.contains(&entry_id)
            || self.material_ids.contains(&entry_id)
    }
}

/// Catalog data supplied by staff when creating or editing an artwork
#[derive(Debug, Clone, Deserialize)]
pub struct ArtworkInput {
    pub title: String,
    pub author: String,
    pub valuation: Decimal,
    #[serde(default)]
    pub creation_date: String,
    pub museum_entry_date: NaiveDate,
    pub kind: ArtworkKind,
    #[serde(default)]
    pub technique_ids: BTreeSet<Uuid>,
    #[serde(default)]
    pub material_ids: BTreeSet<Uuid>,
    pub period_id: Uuid,
    pub room_id: Uuid,
    pub style_ids: BTreeSet<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Paintings carry techniques and no materials; sculptures the reverse.
/// Every broken rule is recorded.
pub fn check_classification(
    kind: ArtworkKind,
    technique_ids: &BTreeSet<Uuid>,
    material_ids: &BTreeSet<Uuid>,
    violations: &mut Violations,
) {
    match kind {
        ArtworkKind::Painting => {
            if !material_ids.is_empty() {
                violations.validation(Some("material_ids"), "a painting cannot have sculpture materials");
            }
            if technique_ids.is_empty() {
                violations.validation(Some("technique_ids"), "a painting needs at least one technique");
            }
        }
        ArtworkKind::Sculpture => {
            if !technique_ids.is_empty() {
                violations.validation(Some("technique_ids"), "a sculpture cannot have painting techniques");
            }
            if material_ids.is_empty() {
                violations.validation(Some("material_ids"), "a sculpture needs at least one material");
            }
        }
    }
}

impl Catalog {
    /// Register a new artwork; it starts in storage
    pub fn create_artwork(&mut self, input: ArtworkInput) -> Result<Artwork> {
        self.check_artwork_input(&input, None)?;

        let artwork = Artwork {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            author: input.author.trim().to_string(),
            valuation: input.valuation,
            creation_date: input.creation_date.trim().to_string(),
            museum_entry_date: input.museum_entry_date,
            state: ArtworkState::default(),
            kind: input.kind,
            technique_ids: input.technique_ids,
            material_ids: input.material_ids,
            period_id: input.period_id,
            room_id: input.room_id,
            style_ids: input.style_ids,
            image: input.image,
        };
        self.put_artwork(artwork.clone());

        tracing::info!(artwork_id = %artwork.id, title = %artwork.title, kind = %artwork.kind, "Artwork created");
        Ok(artwork)
    }

    /// Replace the catalog data of an artwork; its state is left untouched.
    /// The kind is locked while a restoration of the artwork is open.
    pub fn update_artwork(&mut self, id: Uuid, input: ArtworkInput) -> Result<Artwork> {
        let mut artwork = self.require_artwork(id)?.clone();
        self.check_artwork_input(&input, Some(&artwork))?;

        artwork.title = input.title.trim().to_string();
        artwork.author = input.author.trim().to_string();
        artwork.valuation = input.valuation;
        artwork.creation_date = input.creation_date.trim().to_string();
        artwork.museum_entry_date = input.museum_entry_date;
        artwork.kind = input.kind;
        artwork.technique_ids = input.technique_ids;
        artwork.material_ids = input.material_ids;
        artwork.period_id = input.period_id;
        artwork.room_id = input.room_id;
        artwork.style_ids = input.style_ids;
        artwork.image = input.image;
        self.put_artwork(artwork.clone());

        tracing::info!(artwork_id = %id, "Artwork updated");
        Ok(artwork)
    }

    /// Delete an artwork together with the records that depend on it.
    ///
    /// Its restorations go (team occupancy is recomputed), it leaves every
    /// loan and exhibition roster, and loans left without artworks go too.
    pub fn delete_artwork(&mut self, id: Uuid) -> Result<()> {
        self.require_artwork(id)?;

        let restoration_ids: Vec<Uuid> = self
            .restorations
            .values()
            .filter(|r| r.artwork_id == id)
            .map(|r| r.id)
            .collect();
        for restoration_id in restoration_ids {
            self.drop_restoration(restoration_id);
        }

        let loans: Vec<_> = self
            .loans
            .values()
            .filter(|l| l.artwork_ids.contains(&id))
            .cloned()
            .collect();
        for mut loan in loans {
            loan.artwork_ids.remove(&id);
            if loan.artwork_ids.is_empty() {
                self.remove_loan(loan.id);
            } else {
                self.put_loan(loan);
            }
        }

        let exhibitions: Vec<_> = self
            .exhibitions
            .values()
            .filter(|e| e.artwork_ids.contains(&id))
            .cloned()
            .collect();
        for mut exhibition in exhibitions {
            exhibition.artwork_ids.remove(&id);
            self.put_exhibition(exhibition);
        }

        self.remove_artwork(id);
        tracing::info!(artwork_id = %id, "Artwork deleted");
        Ok(())
    }

    /// Move an artwork to a new lifecycle state. Restricted to the
    /// restoration and loan operations of this crate.
    pub(super) fn set_artwork_state(&mut self, id: Uuid, state: ArtworkState) {
        if let Some(mut artwork) = self.artworks.get(&id).cloned() {
            if artwork.state != state {
                tracing::debug!(artwork_id = %id, from = %artwork.state, to = %state, "Artwork state changed");
                artwork.state = state;
                self.put_artwork(artwork);
            }
        }
    }

    /// End date of the most recently finished restoration, or the museum
    /// entry date when the artwork was never restored
    pub fn last_restoration_or_entry_date(&self, artwork: &Artwork) -> NaiveDate {
        self.restorations
            .values()
            .filter(|r| r.artwork_id == artwork.id)
            .filter_map(|r| r.end_date())
            .max()
            .unwrap_or(artwork.museum_entry_date)
    }

    /// Whole years (365.25 days each) since the reference date above
    pub fn years_since_last_restoration(&self, artwork: &Artwork, today: NaiveDate) -> i64 {
        let reference = self.last_restoration_or_entry_date(artwork);
        let days = (today - reference).num_days();
        (days as f64 / 365.25).floor() as i64
    }

    fn check_artwork_input(&self, input: &ArtworkInput, current: Option<&Artwork>) -> Result<()> {
        let except = current.map(|a| a.id);
        let mut violations = Violations::new();

        // The open team was chosen for the current kind
        if let Some(current) = current {
            let in_restoration = self
                .restorations
                .values()
                .any(|r| r.artwork_id == current.id && r.is_active());
            if input.kind != current.kind && in_restoration {
                violations.conflict(
                    Some("kind"),
                    format!("'{}' cannot change kind while it is being restored", current.title),
                );
            }
        }

        let title = input.title.trim();
        if title.is_empty() {
            violations.validation(Some("title"), "must not be empty");
        } else if self.artworks.values().any(|a| {
            Some(a.id) != except && a.title.to_lowercase() == title.to_lowercase()
        }) {
            violations.conflict(Some("title"), format!("an artwork titled '{}' already exists", title));
        }

        if input.author.trim().is_empty() {
            violations.validation(Some("author"), "must not be empty");
        }

        if input.valuation.is_sign_negative() {
            violations.validation(Some("valuation"), "must not be negative");
        }

        check_classification(input.kind, &input.technique_ids, &input.material_ids, &mut violations);

        self.check_taxonomy_ref(input.room_id, TaxonomyKind::Room, "room_id", &mut violations);
        self.check_taxonomy_ref(input.period_id, TaxonomyKind::Period, "period_id", &mut violations);

        if input.style_ids.is_empty() {
            violations.validation(Some("style_ids"), "at least one style is required");
        }
        for id in &input.style_ids {
            self.check_taxonomy_ref(*id, TaxonomyKind::Style, "style_ids", &mut violations);
        }
        for id in &input.technique_ids {
            self.check_taxonomy_ref(*id, TaxonomyKind::Technique, "technique_ids", &mut violations);
        }
        for id in &input.material_ids {
            self.check_taxonomy_ref(*id, TaxonomyKind::Material, "material_ids", &mut violations);
        }

        violations.finish()
    }
}
