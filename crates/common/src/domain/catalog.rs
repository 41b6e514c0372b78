//! The catalog aggregate: an in-memory snapshot of every entity plus the
//! record of what a unit of work changed.
//!
//! Domain operations (`impl Catalog` blocks in the sibling modules) run
//! their checks first and only then mutate through the `put_*`/`remove_*`
//! helpers below, which also record the touched entity in the pending
//! [`ChangeSet`]. The service hands that change set to the store.

use std::collections::BTreeMap;
use uuid::Uuid;

use super::artwork::Artwork;
use super::exhibition::Exhibition;
use super::loan::Loan;
use super::museum::{LoanRequest, PartnerMuseum};
use super::restoration::Restoration;
use super::restorer::Restorer;
use super::taxonomy::TaxonomyEntry;
use crate::errors::{AppError, Result};

/// Entities written or deleted by one unit of work.
///
/// `Some(entity)` is an upsert, `None` a deletion.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub taxonomy: BTreeMap<Uuid, Option<TaxonomyEntry>>,
    pub artworks: BTreeMap<Uuid, Option<Artwork>>,
    pub restorers: BTreeMap<Uuid, Option<Restorer>>,
    pub restorations: BTreeMap<Uuid, Option<Restoration>>,
    pub loans: BTreeMap<Uuid, Option<Loan>>,
    pub exhibitions: BTreeMap<Uuid, Option<Exhibition>>,
    pub museums: BTreeMap<Uuid, Option<PartnerMuseum>>,
    pub loan_requests: BTreeMap<Uuid, Option<LoanRequest>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of touched entities
    pub fn len(&self) -> usize {
        self.taxonomy.len()
            + self.artworks.len()
            + self.restorers.len()
            + self.restorations.len()
            + self.loans.len()
            + self.exhibitions.len()
            + self.museums.len()
            + self.loan_requests.len()
    }
}

/// Snapshot of the whole catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(super) taxonomy: BTreeMap<Uuid, TaxonomyEntry>,
    pub(super) artworks: BTreeMap<Uuid, Artwork>,
    pub(super) restorers: BTreeMap<Uuid, Restorer>,
    pub(super) restorations: BTreeMap<Uuid, Restoration>,
    pub(super) loans: BTreeMap<Uuid, Loan>,
    pub(super) exhibitions: BTreeMap<Uuid, Exhibition>,
    pub(super) museums: BTreeMap<Uuid, PartnerMuseum>,
    pub(super) loan_requests: BTreeMap<Uuid, LoanRequest>,
    pending: ChangeSet,
}

fn apply_to<T>(target: &mut BTreeMap<Uuid, T>, changes: BTreeMap<Uuid, Option<T>>) {
    for (id, change) in changes {
        match change {
            Some(entity) => {
                target.insert(id, entity);
            }
            None => {
                target.remove(&id);
            }
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from loaded rows (every entry an upsert)
    pub fn from_changes(changes: ChangeSet) -> Self {
        let mut catalog = Self::default();
        catalog.apply(changes);
        catalog
    }

    /// Apply a committed change set without recording it as pending
    pub fn apply(&mut self, changes: ChangeSet) {
        apply_to(&mut self.taxonomy, changes.taxonomy);
        apply_to(&mut self.artworks, changes.artworks);
        apply_to(&mut self.restorers, changes.restorers);
        apply_to(&mut self.restorations, changes.restorations);
        apply_to(&mut self.loans, changes.loans);
        apply_to(&mut self.exhibitions, changes.exhibitions);
        apply_to(&mut self.museums, changes.museums);
        apply_to(&mut self.loan_requests, changes.loan_requests);
    }

    /// Changes recorded since the last call
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_changes(&self) -> &ChangeSet {
        &self.pending
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn artwork(&self, id: Uuid) -> Option<&Artwork> {
        self.artworks.get(&id)
    }

    pub fn artworks(&self) -> impl Iterator<Item = &Artwork> {
        self.artworks.values()
    }

    pub fn require_artwork(&self, id: Uuid) -> Result<&Artwork> {
        self.artworks
            .get(&id)
            .ok_or_else(|| AppError::not_found("artwork", id))
    }

    pub fn restorer(&self, id: Uuid) -> Option<&Restorer> {
        self.restorers.get(&id)
    }

    pub fn restorers(&self) -> impl Iterator<Item = &Restorer> {
        self.restorers.values()
    }

    pub fn require_restorer(&self, id: Uuid) -> Result<&Restorer> {
        self.restorers
            .get(&id)
            .ok_or_else(|| AppError::not_found("restorer", id))
    }

    pub fn restoration(&self, id: Uuid) -> Option<&Restoration> {
        self.restorations.get(&id)
    }

    pub fn restorations(&self) -> impl Iterator<Item = &Restoration> {
        self.restorations.values()
    }

    pub fn require_restoration(&self, id: Uuid) -> Result<&Restoration> {
        self.restorations
            .get(&id)
            .ok_or_else(|| AppError::not_found("restoration", id))
    }

    pub fn loan(&self, id: Uuid) -> Option<&Loan> {
        self.loans.get(&id)
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    pub fn require_loan(&self, id: Uuid) -> Result<&Loan> {
        self.loans.get(&id).ok_or_else(|| AppError::not_found("loan", id))
    }

    pub fn exhibition(&self, id: Uuid) -> Option<&Exhibition> {
        self.exhibitions.get(&id)
    }

    pub fn exhibitions(&self) -> impl Iterator<Item = &Exhibition> {
        self.exhibitions.values()
    }

    pub fn require_exhibition(&self, id: Uuid) -> Result<&Exhibition> {
        self.exhibitions
            .get(&id)
            .ok_or_else(|| AppError::not_found("exhibition", id))
    }

    pub fn museum(&self, id: Uuid) -> Option<&PartnerMuseum> {
        self.museums.get(&id)
    }

    pub fn museums(&self) -> impl Iterator<Item = &PartnerMuseum> {
        self.museums.values()
    }

    pub fn require_museum(&self, id: Uuid) -> Result<&PartnerMuseum> {
        self.museums
            .get(&id)
            .ok_or_else(|| AppError::not_found("museum", id))
    }

    pub fn loan_request(&self, id: Uuid) -> Option<&LoanRequest> {
        self.loan_requests.get(&id)
    }

    pub fn loan_requests(&self) -> impl Iterator<Item = &LoanRequest> {
        self.loan_requests.values()
    }

    pub fn require_loan_request(&self, id: Uuid) -> Result<&LoanRequest> {
        self.loan_requests
            .get(&id)
            .ok_or_else(|| AppError::not_found("loan request", id))
    }

    // ------------------------------------------------------------------
    // Tracked writes
    // ------------------------------------------------------------------

    pub(super) fn put_taxonomy(&mut self, entry: TaxonomyEntry) {
        self.pending.taxonomy.insert(entry.id, Some(entry.clone()));
        self.taxonomy.insert(entry.id, entry);
    }

    pub(super) fn remove_taxonomy(&mut self, id: Uuid) {
        self.pending.taxonomy.insert(id, None);
        self.taxonomy.remove(&id);
    }

    pub(super) fn put_artwork(&mut self, artwork: Artwork) {
        self.pending.artworks.insert(artwork.id, Some(artwork.clone()));
        self.artworks.insert(artwork.id, artwork);
    }

    pub(super) fn remove_artwork(&mut self, id: Uuid) {
        self.pending.artworks.insert(id, None);
        self.artworks.remove(&id);
    }

    pub(super) fn put_restorer(&mut self, restorer: Restorer) {
        self.pending.restorers.insert(restorer.id, Some(restorer.clone()));
        self.restorers.insert(restorer.id, restorer);
    }

    pub(super) fn remove_restorer(&mut self, id: Uuid) {
        self.pending.restorers.insert(id, None);
        self.restorers.remove(&id);
    }

    pub(super) fn put_restoration(&mut self, restoration: Restoration) {
        self.pending
            .restorations
            .insert(restoration.id, Some(restoration.clone()));
        self.restorations.insert(restoration.id, restoration);
    }

    pub(super) fn remove_restoration(&mut self, id: Uuid) {
        self.pending.restorations.insert(id, None);
        self.restorations.remove(&id);
    }

    pub(super) fn put_loan(&mut self, loan: Loan) {
        self.pending.loans.insert(loan.id, Some(loan.clone()));
        self.loans.insert(loan.id, loan);
    }

    pub(super) fn remove_loan(&mut self, id: Uuid) {
        self.pending.loans.insert(id, None);
        self.loans.remove(&id);
    }

    pub(super) fn put_exhibition(&mut self, exhibition: Exhibition) {
        self.pending
            .exhibitions
            .insert(exhibition.id, Some(exhibition.clone()));
        self.exhibitions.insert(exhibition.id, exhibition);
    }

    pub(super) fn remove_exhibition(&mut self, id: Uuid) {
        self.pending.exhibitions.insert(id, None);
        self.exhibitions.remove(&id);
    }

    pub(super) fn put_museum(&mut self, museum: PartnerMuseum) {
        self.pending.museums.insert(museum.id, Some(museum.clone()));
        self.museums.insert(museum.id, museum);
    }

    pub(super) fn remove_museum(&mut self, id: Uuid) {
        self.pending.museums.insert(id, None);
        self.museums.remove(&id);
    }

    pub(super) fn put_loan_request(&mut self, request: LoanRequest) {
        self.pending
            .loan_requests
            .insert(request.id, Some(request.clone()));
        self.loan_requests.insert(request.id, request);
    }
}
