//! Shared fixture for the domain unit tests.
//!
//! Every helper that mutates the catalog drains the pending change set, so
//! a test only sees the changes made by the operation under test.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::artwork::{Artwork, ArtworkInput, ArtworkKind};
use super::catalog::Catalog;
use super::loan::{Loan, NewLoan};
use super::museum::MuseumInput;
use super::restoration::{NewRestoration, Restoration};
use super::restorer::{EmploymentState, Restorer, RestorerInput};
use super::taxonomy::{TaxonomyInput, TaxonomyKind};

pub struct Fixture {
    pub catalog: Catalog,
    pub room: Uuid,
    pub period: Uuid,
    pub style: Uuid,
    pub oil: Uuid,
    pub marble: Uuid,
    restorers_created: usize,
}

impl Fixture {
    pub fn new() -> Self {
        let mut catalog = Catalog::new();
        let mut entry = |kind, name| {
            catalog
                .create_taxonomy_entry(kind, TaxonomyInput::named(name))
                .unwrap()
                .id
        };
        let room = entry(TaxonomyKind::Room, "Sala 12");
        let period = entry(TaxonomyKind::Period, "Siglo XIX");
        let style = entry(TaxonomyKind::Style, "Impresionismo");
        let oil = entry(TaxonomyKind::Technique, "Óleo sobre lienzo");
        let marble = entry(TaxonomyKind::Material, "Mármol");
        catalog.take_changes();

        Self {
            catalog,
            room,
            period,
            style,
            oil,
            marble,
            restorers_created: 0,
        }
    }

    pub fn day(&self, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    pub fn painting_input(&self, title: &str) -> ArtworkInput {
        ArtworkInput {
            title: title.to_string(),
            author: "Autor desconocido".to_string(),
            valuation: Decimal::new(1_500_000, 2),
            creation_date: "c. 1890".to_string(),
            museum_entry_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            kind: ArtworkKind::Painting,
            technique_ids: BTreeSet::from([self.oil]),
            material_ids: BTreeSet::new(),
            period_id: self.period,
            room_id: self.room,
            style_ids: BTreeSet::from([self.style]),
            image: None,
        }
    }

    pub fn sculpture_input(&self, title: &str) -> ArtworkInput {
        ArtworkInput {
            kind: ArtworkKind::Sculpture,
            technique_ids: BTreeSet::new(),
            material_ids: BTreeSet::from([self.marble]),
            ..self.painting_input(title)
        }
    }

    pub fn painting(&mut self, title: &str) -> Artwork {
        let artwork = self.catalog.create_artwork(self.painting_input(title)).unwrap();
        self.catalog.take_changes();
        artwork
    }

    pub fn sculpture(&mut self, title: &str) -> Artwork {
        let artwork = self.catalog.create_artwork(self.sculpture_input(title)).unwrap();
        self.catalog.take_changes();
        artwork
    }

    pub fn painter_restorer(&mut self, name: &str) -> Restorer {
        self.restorer(name, ArtworkKind::Painting)
    }

    pub fn sculptor_restorer(&mut self, name: &str) -> Restorer {
        self.restorer(name, ArtworkKind::Sculpture)
    }

    fn restorer(&mut self, name: &str, specialty: ArtworkKind) -> Restorer {
        self.restorers_created += 1;
        let input = RestorerInput {
            first_name: name.to_string(),
            last_names: format!("{} Restauro", name),
            email: format!("{}.{}@museo.org", name.to_lowercase(), self.restorers_created),
            phone: None,
            employment: EmploymentState::Active,
            specialty,
        };
        let restorer = self.catalog.create_restorer(input).unwrap();
        self.catalog.take_changes();
        restorer
    }

    pub fn restoration_input(&self, artwork_id: Uuid, team: &[Uuid]) -> NewRestoration {
        NewRestoration {
            artwork_id,
            team: team.iter().copied().collect(),
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            damage_report: "Craquelado en la esquina inferior".to_string(),
            restoration_type: "Limpieza".to_string(),
        }
    }

    pub fn begin(&mut self, artwork_id: Uuid, team: &[Uuid]) -> Restoration {
        let restoration = self
            .catalog
            .begin_restoration(self.restoration_input(artwork_id, team))
            .unwrap();
        self.catalog.take_changes();
        restoration
    }

    pub fn museum(&mut self, name: &str) -> Uuid {
        let input = MuseumInput {
            name: name.to_string(),
            country: "Francia".to_string(),
            city: "París".to_string(),
            catalog_url: "https://catalog.example.org/collection".to_string(),
            phones: vec!["+33 1 40 20 50 50".to_string()],
            emails: vec!["prestamos@example.org".to_string()],
        };
        let museum = self.catalog.create_museum(input).unwrap();
        self.catalog.take_changes();
        museum.id
    }

    pub fn loan_input(&self, artwork_ids: &[Uuid], museum_id: Uuid, start: u32, end: u32) -> NewLoan {
        NewLoan {
            artwork_ids: artwork_ids.iter().copied().collect(),
            museum_id,
            start_date: self.day(start),
            end_date: self.day(end),
        }
    }

    pub fn loan(&mut self, artwork_ids: &[Uuid], museum_id: Uuid, start: u32, end: u32) -> Loan {
        let loan = self
            .catalog
            .create_loan(self.loan_input(artwork_ids, museum_id, start, end))
            .unwrap();
        self.catalog.take_changes();
        loan
    }
}
