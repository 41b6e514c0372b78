//! Loans (cessions) of artworks to partner museums

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::artwork::ArtworkState;
use super::catalog::Catalog;
use super::dates::{DateRange, DATE_FORMAT};
use super::violations::Violations;
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub id: Uuid,
    pub artwork_ids: BTreeSet<Uuid>,
    pub museum_id: Uuid,
    pub period: DateRange,
    pub(crate) returned_on: Option<NaiveDate>,
}

impl Loan {
    pub fn returned_on(&self) -> Option<NaiveDate> {
        self.returned_on
    }

    pub fn is_outstanding(&self) -> bool {
        self.returned_on.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLoan {
    pub artwork_ids: BTreeSet<Uuid>,
    pub museum_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanFilter {
    pub museum_id: Option<Uuid>,
    pub artwork_id: Option<Uuid>,
    pub outstanding: Option<bool>,
}

impl Catalog {
    /// Lend a set of artworks to a partner museum.
    ///
    /// No artwork may be in restoration, and no artwork may already be lent
    /// for an overlapping period. Every offending artwork is reported.
    /// On success each artwork is marked as on loan.
    pub fn create_loan(&mut self, input: NewLoan) -> Result<Loan> {
        let museum_name = self.require_museum(input.museum_id)?.name.clone();
        let period = DateRange::new(input.start_date, input.end_date);
        let mut violations = Violations::new();

        if input.artwork_ids.is_empty() {
            violations.validation(Some("artwork_ids"), "a loan needs at least one artwork");
        }
        if !period.is_well_formed() {
            violations.validation(Some("end_date"), "end date precedes the start date");
        }

        for artwork_id in &input.artwork_ids {
            let Some(artwork) = self.artworks.get(artwork_id) else {
                violations.validation(Some("artwork_ids"), format!("unknown artwork {}", artwork_id));
                continue;
            };

            if artwork.state == ArtworkState::InRestoration {
                violations.conflict(
                    Some("artwork_ids"),
                    format!("'{}' is in restoration and cannot be lent", artwork.title),
                );
            }

            if !period.is_well_formed() {
                continue;
            }
            for other in self.loans.values() {
                if other.artwork_ids.contains(artwork_id) && other.period.overlaps(&period) {
                    let destination = self
                        .museums
                        .get(&other.museum_id)
                        .map(|m| m.name.as_str())
                        .unwrap_or("another museum");
                    violations.conflict(
                        Some("artwork_ids"),
                        format!(
                            "'{}' is already lent to {} for {}",
                            artwork.title, destination, other.period
                        ),
                    );
                }
            }
        }

        violations.finish()?;

        let loan = Loan {
            id: Uuid::new_v4(),
            artwork_ids: input.artwork_ids,
            museum_id: input.museum_id,
            period,
            returned_on: None,
        };
        self.put_loan(loan.clone());
        for artwork_id in &loan.artwork_ids {
            self.set_artwork_state(*artwork_id, ArtworkState::OnLoan);
        }

        tracing::info!(
            loan_id = %loan.id,
            museum = %museum_name,
            artworks = loan.artwork_ids.len(),
            period = %loan.period,
            "Loan created"
        );
        Ok(loan)
    }

    /// Record the return of a loan.
    ///
    /// Each artwork still marked as on loan goes back to storage unless
    /// another outstanding loan for it has not ended by the return date.
    pub fn return_from_loan(&mut self, id: Uuid, returned_on: NaiveDate) -> Result<Loan> {
        let mut loan = self.require_loan(id)?.clone();
        let mut violations = Violations::new();

        if let Some(previous) = loan.returned_on {
            violations.conflict(
                None,
                format!("loan was already returned on {}", previous.format(DATE_FORMAT)),
            );
        } else if returned_on < loan.period.start {
            violations.validation(Some("returned_on"), "return date precedes the start of the loan");
        }
        violations.finish()?;

        loan.returned_on = Some(returned_on);
        self.put_loan(loan.clone());

        for artwork_id in &loan.artwork_ids {
            let still_lent = self.loans.values().any(|other| {
                other.id != id
                    && other.is_outstanding()
                    && other.artwork_ids.contains(artwork_id)
                    && other.period.end > returned_on
            });
            let on_loan = self
                .artworks
                .get(artwork_id)
                .map_or(false, |a| a.state == ArtworkState::OnLoan);
            if on_loan && !still_lent {
                self.set_artwork_state(*artwork_id, ArtworkState::InStorage);
            }
        }

        tracing::info!(loan_id = %id, returned_on = %returned_on, "Loan returned");
        Ok(loan)
    }

    /// Loans matching the filter, latest start first
    pub fn list_loans(&self, filter: &LoanFilter) -> Vec<&Loan> {
        let mut loans: Vec<_> = self
            .loans
            .values()
            .filter(|l| filter.museum_id.map_or(true, |id| l.museum_id == id))
            .filter(|l| filter.artwork_id.map_or(true, |id| l.artwork_ids.contains(&id)))
            .filter(|l| filter.outstanding.map_or(true, |o| l.is_outstanding() == o))
            .collect();
        loans.sort_by(|a, b| b.period.start.cmp(&a.period.start));
        loans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, ViolationKind};
    use crate::domain::testing::Fixture;

    #[test]
    fn touching_loans_are_accepted_and_overlapping_ones_rejected() {
        let mut fx = Fixture::new();
        let x = fx.painting("X");
        let museum = fx.museum("Uffizi");
        fx.loan(&[x.id], museum, 1, 10);

        // Same-day handoff
        let l2 = fx.catalog.create_loan(fx.loan_input(&[x.id], museum, 10, 20));
        assert!(l2.is_ok());

        let mut fx = Fixture::new();
        let x = fx.painting("X");
        let museum = fx.museum("Uffizi");
        fx.loan(&[x.id], museum, 1, 10);
        let err = fx
            .catalog
            .create_loan(fx.loan_input(&[x.id], museum, 9, 20))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn created_loan_marks_every_artwork_on_loan() {
        let mut fx = Fixture::new();
        let a = fx.painting("A");
        let b = fx.sculpture("B");
        let museum = fx.museum("Tate");

        let loan = fx.loan(&[a.id, b.id], museum, 1, 10);
        assert!(loan.is_outstanding());
        for id in [a.id, b.id] {
            assert_eq!(fx.catalog.artwork(id).unwrap().state(), ArtworkState::OnLoan);
        }
    }

    #[test]
    fn every_blocked_artwork_is_reported() {
        let mut fx = Fixture::new();
        let museum = fx.museum("Tate");
        let lent = fx.painting("Prestada");
        let restored = fx.painting("En taller");
        let free = fx.painting("Libre");
        let ana = fx.painter_restorer("Ana");
        fx.loan(&[lent.id], museum, 1, 10);
        fx.begin(restored.id, &[ana.id]);
        fx.catalog.take_changes();

        let err = fx
            .catalog
            .create_loan(fx.loan_input(&[lent.id, restored.id, free.id], museum, 5, 15))
            .unwrap_err();

        assert_eq!(err.violations().len(), 2);
        assert!(err.violations().iter().all(|v| v.kind == ViolationKind::Conflict));
        assert_eq!(fx.catalog.artwork(free.id).unwrap().state(), ArtworkState::InStorage);
        assert!(fx.catalog.pending_changes().is_empty());
    }

    #[test]
    fn malformed_loans_are_invalid() {
        let mut fx = Fixture::new();
        let museum = fx.museum("Tate");
        let err = fx
            .catalog
            .create_loan(fx.loan_input(&[], museum, 10, 5))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn unknown_destination_is_not_found() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Viajera");
        let err = fx
            .catalog
            .create_loan(fx.loan_input(&[artwork.id], Uuid::new_v4(), 1, 5))
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn return_puts_artworks_back_in_storage() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Viajera");
        let museum = fx.museum("Tate");
        let loan = fx.loan(&[artwork.id], museum, 1, 10);

        let returned = fx.catalog.return_from_loan(loan.id, fx.day(10)).unwrap();
        assert_eq!(returned.returned_on(), Some(fx.day(10)));
        assert_eq!(fx.catalog.artwork(artwork.id).unwrap().state(), ArtworkState::InStorage);

        let err = fx.catalog.return_from_loan(loan.id, fx.day(11)).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn return_keeps_artworks_covered_by_a_following_loan() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Viajera");
        let museum = fx.museum("Tate");
        let first = fx.loan(&[artwork.id], museum, 1, 10);
        fx.loan(&[artwork.id], museum, 10, 20);

        fx.catalog.return_from_loan(first.id, fx.day(10)).unwrap();
        assert_eq!(fx.catalog.artwork(artwork.id).unwrap().state(), ArtworkState::OnLoan);
    }

    #[test]
    fn return_keeps_artworks_booked_on_a_later_loan() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Viajera");
        let ana = fx.painter_restorer("Ana");
        let museum = fx.museum("Tate");
        let early = fx.loan(&[artwork.id], museum, 1, 5);
        fx.loan(&[artwork.id], museum, 6, 9);

        fx.catalog.return_from_loan(early.id, fx.day(5)).unwrap();
        fx.catalog.take_changes();
        assert_eq!(fx.catalog.artwork(artwork.id).unwrap().state(), ArtworkState::OnLoan);

        let err = fx
            .catalog
            .begin_restoration(fx.restoration_input(artwork.id, &[ana.id]))
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(fx.catalog.pending_changes().is_empty());
    }

    #[test]
    fn loans_are_filtered_by_artwork_and_outstanding() {
        let mut fx = Fixture::new();
        let a = fx.painting("A");
        let b = fx.painting("B");
        let museum = fx.museum("Tate");
        let early = fx.loan(&[a.id], museum, 1, 5);
        let late = fx.loan(&[a.id, b.id], museum, 6, 9);
        fx.catalog.return_from_loan(early.id, fx.day(5)).unwrap();

        let for_a: Vec<_> = fx
            .catalog
            .list_loans(&LoanFilter {
                artwork_id: Some(a.id),
                ..Default::default()
            })
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(for_a, vec![late.id, early.id]);

        let outstanding = fx.catalog.list_loans(&LoanFilter {
            outstanding: Some(true),
            ..Default::default()
        });
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].id, late.id);
    }
}
