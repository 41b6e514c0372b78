//! Read-only aggregates over the artwork set

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::artwork::ArtworkState;
use super::catalog::Catalog;

/// An artwork that has gone too long without restoration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceEntry {
    pub artwork_id: Uuid,
    pub title: String,
    pub state: ArtworkState,
    pub reference_date: NaiveDate,
    pub years_since_restoration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuationReport {
    pub total: Decimal,
    pub artworks: usize,
}

impl Catalog {
    /// Artworks whose last restoration (or museum entry) is at least
    /// `threshold_years` old on `today`, most neglected first
    pub fn maintenance_report(&self, today: NaiveDate, threshold_years: i64) -> Vec<MaintenanceEntry> {
        let mut entries: Vec<_> = self
            .artworks
            .values()
            .map(|artwork| MaintenanceEntry {
                artwork_id: artwork.id,
                title: artwork.title.clone(),
                state: artwork.state,
                reference_date: self.last_restoration_or_entry_date(artwork),
                years_since_restoration: self.years_since_last_restoration(artwork, today),
            })
            .filter(|entry| entry.years_since_restoration >= threshold_years)
            .collect();
        entries.sort_by(|a, b| {
            b.years_since_restoration
                .cmp(&a.years_since_restoration)
                .then_with(|| a.title.cmp(&b.title))
        });
        entries
    }

    /// Sum of all valuations; zero for an empty catalog
    pub fn total_valuation(&self) -> Decimal {
        self.artworks.values().map(|a| a.valuation).sum()
    }

    pub fn valuation_report(&self) -> ValuationReport {
        ValuationReport {
            total: self.total_valuation(),
            artworks: self.artworks.len(),
        }
    }

    /// Number of artworks in each state, every state listed
    pub fn state_counts(&self) -> Vec<(ArtworkState, usize)> {
        ArtworkState::ALL
            .into_iter()
            .map(|state| {
                let count = self.artworks.values().filter(|a| a.state == state).count();
                (state, count)
            })
            .collect()
    }

    pub fn occupied_restorers(&self) -> usize {
        self.restorers.values().filter(|r| r.occupied).count()
    }
}
