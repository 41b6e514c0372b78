//! Exhibitions: curated groups of artworks shown for a period

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::catalog::Catalog;
use super::dates::DateRange;
use super::violations::Violations;
use crate::errors::Result;

/// Smallest number of artworks an exhibition may show
pub const MIN_EXHIBITION_ARTWORKS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exhibition {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub period: DateRange,
    pub artwork_ids: BTreeSet<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExhibitionInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub artwork_ids: BTreeSet<Uuid>,
}

impl Catalog {
    pub fn create_exhibition(&mut self, input: ExhibitionInput) -> Result<Exhibition> {
        let period = self.check_exhibition_input(&input, None)?;

        let exhibition = Exhibition {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            image: input.image,
            period,
            artwork_ids: input.artwork_ids,
        };
        self.put_exhibition(exhibition.clone());

        tracing::info!(
            exhibition_id = %exhibition.id,
            name = %exhibition.name,
            artworks = exhibition.artwork_ids.len(),
            "Exhibition created"
        );
        Ok(exhibition)
    }

    pub fn update_exhibition(&mut self, id: Uuid, input: ExhibitionInput) -> Result<Exhibition> {
        let mut exhibition = self.require_exhibition(id)?.clone();
        let period = self.check_exhibition_input(&input, Some(id))?;

        exhibition.name = input.name.trim().to_string();
        exhibition.description = input.description.trim().to_string();
        exhibition.image = input.image;
        exhibition.period = period;
        exhibition.artwork_ids = input.artwork_ids;
        self.put_exhibition(exhibition.clone());

        tracing::info!(exhibition_id = %id, "Exhibition updated");
        Ok(exhibition)
    }

    pub fn delete_exhibition(&mut self, id: Uuid) -> Result<()> {
        self.require_exhibition(id)?;
        self.remove_exhibition(id);
        tracing::info!(exhibition_id = %id, "Exhibition deleted");
        Ok(())
    }

    /// Every exhibition, latest start first
    pub fn list_exhibitions(&self) -> Vec<&Exhibition> {
        let mut exhibitions: Vec<_> = self.exhibitions.values().collect();
        exhibitions.sort_by(|a, b| b.period.start.cmp(&a.period.start));
        exhibitions
    }

    /// Exhibitions open on `today`, both ends inclusive
    pub fn list_current_exhibitions(&self, today: NaiveDate) -> Vec<&Exhibition> {
        self.list_exhibitions()
            .into_iter()
            .filter(|e| e.period.start <= today && today <= e.period.end)
            .collect()
    }

    /// Validate an exhibition submission, returning its period.
    ///
    /// The size rule and each artwork's clash with another exhibition are
    /// all reported together.
    fn check_exhibition_input(&self, input: &ExhibitionInput, except: Option<Uuid>) -> Result<DateRange> {
        let period = DateRange::new(input.start_date, input.end_date);
        let mut violations = Violations::new();

        if input.name.trim().is_empty() {
            violations.validation(Some("name"), "must not be empty");
        }
        if !period.is_well_formed() {
            violations.validation(Some("end_date"), "end date precedes the start date");
        }
        if input.artwork_ids.len() < MIN_EXHIBITION_ARTWORKS {
            violations.validation(
                Some("artwork_ids"),
                format!(
                    "an exhibition needs at least {} artworks, got {}",
                    MIN_EXHIBITION_ARTWORKS,
                    input.artwork_ids.len()
                ),
            );
        }

        for artwork_id in &input.artwork_ids {
            let Some(artwork) = self.artworks.get(artwork_id) else {
                violations.validation(Some("artwork_ids"), format!("unknown artwork {}", artwork_id));
                continue;
            };
            if !period.is_well_formed() {
                continue;
            }
            for other in self.exhibitions.values() {
                if Some(other.id) == except || !other.artwork_ids.contains(artwork_id) {
                    continue;
                }
                if other.period.overlaps(&period) {
                    violations.conflict(
                        Some("artwork_ids"),
                        format!(
                            "'{}' is already shown in '{}' during {}",
                            artwork.title, other.name, other.period
                        ),
                    );
                }
            }
        }

        violations.finish()?;
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::Fixture;
    use crate::errors::ViolationKind;

    fn input(fx: &Fixture, name: &str, ids: &[Uuid], start: u32, end: u32) -> ExhibitionInput {
        ExhibitionInput {
            name: name.into(),
            description: "Colección permanente".into(),
            image: None,
            start_date: fx.day(start),
            end_date: fx.day(end),
            artwork_ids: ids.iter().copied().collect(),
        }
    }

    #[test]
    fn two_artworks_fail_and_three_succeed() {
        let mut fx = Fixture::new();
        let a = fx.painting("A");
        let b = fx.painting("B");
        let c = fx.sculpture("C");

        let err = fx
            .catalog
            .create_exhibition(input(&fx, "Pareja", &[a.id, b.id], 1, 10))
            .unwrap_err();
        assert!(err.is_validation());

        let exhibition = fx
            .catalog
            .create_exhibition(input(&fx, "Trío", &[a.id, b.id, c.id], 1, 10))
            .unwrap();
        assert_eq!(exhibition.artwork_ids.len(), 3);
    }

    #[test]
    fn overlapping_artworks_are_all_reported() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = ["A", "B", "C", "D"].iter().map(|t| fx.painting(t).id).collect();
        fx.catalog
            .create_exhibition(input(&fx, "Primera", &ids[..3], 1, 10))
            .unwrap();

        let err = fx
            .catalog
            .create_exhibition(input(&fx, "Segunda", &ids[1..], 5, 15))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            err.violations()
                .iter()
                .filter(|v| v.kind == ViolationKind::Conflict)
                .count(),
            2
        );
    }

    #[test]
    fn consecutive_exhibitions_may_share_artworks() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = ["A", "B", "C"].iter().map(|t| fx.painting(t).id).collect();
        fx.catalog
            .create_exhibition(input(&fx, "Primera", &ids, 1, 10))
            .unwrap();
        assert!(fx
            .catalog
            .create_exhibition(input(&fx, "Segunda", &ids, 10, 20))
            .is_ok());
    }

    #[test]
    fn update_ignores_its_own_period() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = ["A", "B", "C"].iter().map(|t| fx.painting(t).id).collect();
        let exhibition = fx
            .catalog
            .create_exhibition(input(&fx, "Primera", &ids, 1, 10))
            .unwrap();

        let updated = fx
            .catalog
            .update_exhibition(exhibition.id, input(&fx, "Primera bis", &ids, 2, 12))
            .unwrap();
        assert_eq!(updated.name, "Primera bis");
        assert_eq!(updated.period.end, fx.day(12));
    }

    #[test]
    fn exhibitions_do_not_change_artwork_state() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = ["A", "B", "C"].iter().map(|t| fx.painting(t).id).collect();
        fx.catalog
            .create_exhibition(input(&fx, "Primera", &ids, 1, 10))
            .unwrap();
        let changes = fx.catalog.take_changes();
        assert!(changes.artworks.is_empty());
    }

    #[test]
    fn current_exhibitions_include_both_ends() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = ["A", "B", "C"].iter().map(|t| fx.painting(t).id).collect();
        let exhibition = fx
            .catalog
            .create_exhibition(input(&fx, "Primera", &ids, 5, 10))
            .unwrap();

        assert!(fx.catalog.list_current_exhibitions(fx.day(4)).is_empty());
        assert_eq!(fx.catalog.list_current_exhibitions(fx.day(10))[0].id, exhibition.id);

        fx.catalog.delete_exhibition(exhibition.id).unwrap();
        assert!(fx.catalog.list_exhibitions().is_empty());
    }
}
