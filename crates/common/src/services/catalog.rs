//! Catalog service
//!
//! Runs every domain mutation as one unit of work:
//! 1. Take the writer lock
//! 2. Load a snapshot from the store
//! 3. Run the operation (all checks, then all writes)
//! 4. Commit the recorded change set
//!
//! A rejected operation commits nothing.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::db::CatalogStore;
use crate::domain::{
    Artwork, ArtworkFilter, ArtworkInput, ArtworkState, Catalog, Exhibition, ExhibitionInput, Loan, LoanFilter,
    LoanRequest, LoanRequestFilter, MaintenanceEntry, MuseumInput, NewLoan, NewLoanRequest,
    NewRestoration, Page, PartnerMuseum, RequestDecision, Restoration, RestorationFilter, Restorer,
    RestorerFilter, RestorerInput, TaxonomyEntry, TaxonomyInput, TaxonomyKind, ValuationReport,
};
use crate::errors::{AppError, Result};
use crate::metrics;

/// Exhibitions and recent arrivals for the landing page
#[derive(Debug, Clone)]
pub struct HomeView {
    pub exhibitions: Vec<Exhibition>,
    pub recent_artworks: Vec<Artwork>,
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    writer: Mutex<()>,
    settings: CatalogConfig,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, settings: CatalogConfig) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
            settings,
        }
    }

    pub fn settings(&self) -> &CatalogConfig {
        &self.settings
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Run a read against a fresh snapshot
    pub async fn read<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Catalog) -> Result<T> + Send,
    {
        let catalog = self.store.load().await?;
        query(&catalog)
    }

    /// Run a mutation as one unit of work
    pub async fn mutate<T, F>(&self, operation: &'static str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Catalog) -> Result<T> + Send,
        T: Send,
    {
        let _writer = self.writer.lock().await;
        let mut catalog = self.store.load().await?;

        let value = match apply(&mut catalog) {
            Ok(value) => value,
            Err(err) => {
                metrics::record_mutation(operation, false);
                metrics::record_violations(err.violations());
                tracing::warn!(
                    operation,
                    violations = err.violations().len(),
                    error = %err,
                    "Mutation rejected"
                );
                return Err(err);
            }
        };

        let changes = catalog.take_changes();
        let touched = changes.len();
        let start = Instant::now();
        self.store.commit(changes).await?;
        metrics::record_commit(start.elapsed().as_secs_f64());

        metrics::record_mutation(operation, true);
        metrics::record_catalog_state(&catalog);
        tracing::debug!(operation, touched, "Mutation committed");
        Ok(value)
    }

    // ========================================================================
    // Taxonomy
    // ========================================================================

    pub async fn taxonomy_entries(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>> {
        self.read(|c| Ok(c.taxonomy_entries(kind).into_iter().cloned().collect()))
            .await
    }

    /// An entry, provided it belongs to `kind`
    pub async fn taxonomy_entry(&self, kind: TaxonomyKind, id: Uuid) -> Result<TaxonomyEntry> {
        self.read(|c| {
            c.taxonomy_entry(id)
                .filter(|e| e.kind == kind)
                .cloned()
                .ok_or_else(|| AppError::not_found(kind.as_str(), id))
        })
        .await
    }

    pub async fn create_taxonomy_entry(&self, kind: TaxonomyKind, input: TaxonomyInput) -> Result<TaxonomyEntry> {
        self.mutate("create_taxonomy_entry", |c| c.create_taxonomy_entry(kind, input))
            .await
    }

    pub async fn rename_taxonomy_entry(&self, id: Uuid, input: TaxonomyInput) -> Result<TaxonomyEntry> {
        self.mutate("rename_taxonomy_entry", |c| c.rename_taxonomy_entry(id, input))
            .await
    }

    pub async fn delete_taxonomy_entry(&self, id: Uuid) -> Result<()> {
        self.mutate("delete_taxonomy_entry", |c| c.delete_taxonomy_entry(id))
            .await
    }

    // ========================================================================
    // Artworks
    // ========================================================================

    pub async fn artwork(&self, id: Uuid) -> Result<Artwork> {
        self.read(|c| c.require_artwork(id).cloned()).await
    }

    pub async fn search_artworks(&self, filter: ArtworkFilter, offset: usize, limit: usize) -> Result<Page<Artwork>> {
        self.read(|c| Ok(c.search_artworks(&filter, offset, limit).map(Clone::clone)))
            .await
    }

    pub async fn public_gallery(&self, filter: ArtworkFilter, offset: usize) -> Result<Page<Artwork>> {
        let limit = self.settings.default_page_size;
        self.read(|c| Ok(c.public_gallery(&filter, offset, limit).map(Clone::clone)))
            .await
    }

    /// A displayed artwork, as visitors may see it
    pub async fn public_artwork(&self, id: Uuid) -> Result<Artwork> {
        self.read(|c| {
            c.artwork(id)
                .filter(|a| a.state() == ArtworkState::OnDisplay)
                .cloned()
                .ok_or_else(|| AppError::not_found("artwork", id))
        })
        .await
    }

    pub async fn home(&self) -> Result<HomeView> {
        let limit = self.settings.recent_artworks_limit;
        self.read(|c| {
            let home = c.home_page(limit);
            Ok(HomeView {
                exhibitions: home.exhibitions.into_iter().cloned().collect(),
                recent_artworks: home.recent_artworks.into_iter().cloned().collect(),
            })
        })
        .await
    }

    pub async fn create_artwork(&self, input: ArtworkInput) -> Result<Artwork> {
        self.mutate("create_artwork", |c| c.create_artwork(input)).await
    }

    pub async fn update_artwork(&self, id: Uuid, input: ArtworkInput) -> Result<Artwork> {
        self.mutate("update_artwork", |c| c.update_artwork(id, input)).await
    }

    pub async fn delete_artwork(&self, id: Uuid) -> Result<()> {
        self.mutate("delete_artwork", |c| c.delete_artwork(id)).await
    }

    // ========================================================================
    // Restorers and restorations
    // ========================================================================

    pub async fn restorers(&self, filter: RestorerFilter) -> Result<Vec<Restorer>> {
        self.read(|c| Ok(c.list_restorers(&filter).into_iter().cloned().collect()))
            .await
    }

    pub async fn restorer(&self, id: Uuid) -> Result<Restorer> {
        self.read(|c| c.require_restorer(id).cloned()).await
    }

    pub async fn create_restorer(&self, input: RestorerInput) -> Result<Restorer> {
        self.mutate("create_restorer", |c| c.create_restorer(input)).await
    }

    pub async fn update_restorer(&self, id: Uuid, input: RestorerInput) -> Result<Restorer> {
        self.mutate("update_restorer", |c| c.update_restorer(id, input)).await
    }

    pub async fn delete_restorer(&self, id: Uuid) -> Result<()> {
        self.mutate("delete_restorer", |c| c.delete_restorer(id)).await
    }

    pub async fn restorations(&self, filter: RestorationFilter) -> Result<Vec<Restoration>> {
        self.read(|c| Ok(c.list_restorations(&filter).into_iter().cloned().collect()))
            .await
    }

    pub async fn restoration(&self, id: Uuid) -> Result<Restoration> {
        self.read(|c| c.require_restoration(id).cloned()).await
    }

    pub async fn begin_restoration(&self, input: NewRestoration) -> Result<Restoration> {
        self.mutate("begin_restoration", |c| c.begin_restoration(input)).await
    }

    pub async fn complete_restoration(&self, id: Uuid, end_date: NaiveDate) -> Result<Restoration> {
        self.mutate("complete_restoration", |c| c.complete_restoration(id, end_date))
            .await
    }

    pub async fn change_restoration_team(&self, id: Uuid, team: BTreeSet<Uuid>) -> Result<Restoration> {
        self.mutate("change_restoration_team", |c| c.change_restoration_team(id, team))
            .await
    }

    pub async fn clear_restoration_team(&self, id: Uuid) -> Result<Restoration> {
        self.mutate("clear_restoration_team", |c| c.clear_restoration_team(id))
            .await
    }

    // ========================================================================
    // Loans and exhibitions
    // ========================================================================

    pub async fn loans(&self, filter: LoanFilter) -> Result<Vec<Loan>> {
        self.read(|c| Ok(c.list_loans(&filter).into_iter().cloned().collect()))
            .await
    }

    pub async fn loan(&self, id: Uuid) -> Result<Loan> {
        self.read(|c| c.require_loan(id).cloned()).await
    }

    pub async fn create_loan(&self, input: NewLoan) -> Result<Loan> {
        self.mutate("create_loan", |c| c.create_loan(input)).await
    }

    pub async fn return_from_loan(&self, id: Uuid, returned_on: NaiveDate) -> Result<Loan> {
        self.mutate("return_from_loan", |c| c.return_from_loan(id, returned_on))
            .await
    }

    pub async fn exhibitions(&self) -> Result<Vec<Exhibition>> {
        self.read(|c| Ok(c.list_exhibitions().into_iter().cloned().collect()))
            .await
    }

    pub async fn current_exhibitions(&self, today: NaiveDate) -> Result<Vec<Exhibition>> {
        self.read(|c| Ok(c.list_current_exhibitions(today).into_iter().cloned().collect()))
            .await
    }

    pub async fn exhibition(&self, id: Uuid) -> Result<Exhibition> {
        self.read(|c| c.require_exhibition(id).cloned()).await
    }

    pub async fn create_exhibition(&self, input: ExhibitionInput) -> Result<Exhibition> {
        self.mutate("create_exhibition", |c| c.create_exhibition(input)).await
    }

    pub async fn update_exhibition(&self, id: Uuid, input: ExhibitionInput) -> Result<Exhibition> {
        self.mutate("update_exhibition", |c| c.update_exhibition(id, input))
            .await
    }

    pub async fn delete_exhibition(&self, id: Uuid) -> Result<()> {
        self.mutate("delete_exhibition", |c| c.delete_exhibition(id)).await
    }

    // ========================================================================
    // Partner museums and loan requests
    // ========================================================================

    pub async fn museums(&self) -> Result<Vec<PartnerMuseum>> {
        self.read(|c| Ok(c.list_museums().into_iter().cloned().collect()))
            .await
    }

    pub async fn museum(&self, id: Uuid) -> Result<PartnerMuseum> {
        self.read(|c| c.require_museum(id).cloned()).await
    }

    pub async fn create_museum(&self, input: MuseumInput) -> Result<PartnerMuseum> {
        self.mutate("create_museum", |c| c.create_museum(input)).await
    }

    pub async fn update_museum(&self, id: Uuid, input: MuseumInput) -> Result<PartnerMuseum> {
        self.mutate("update_museum", |c| c.update_museum(id, input)).await
    }

    pub async fn delete_museum(&self, id: Uuid) -> Result<()> {
        self.mutate("delete_museum", |c| c.delete_museum(id)).await
    }

    pub async fn loan_requests(&self, filter: LoanRequestFilter) -> Result<Vec<LoanRequest>> {
        self.read(|c| Ok(c.list_loan_requests(&filter).into_iter().cloned().collect()))
            .await
    }

    pub async fn create_loan_request(&self, input: NewLoanRequest) -> Result<LoanRequest> {
        self.mutate("create_loan_request", |c| c.create_loan_request(input))
            .await
    }

    pub async fn decide_loan_request(&self, id: Uuid, decision: RequestDecision) -> Result<LoanRequest> {
        self.mutate("decide_loan_request", |c| c.decide_loan_request(id, decision))
            .await
    }

    // ========================================================================
    // Reports
    // ========================================================================

    /// Uses the configured threshold
    pub async fn maintenance_report(&self, today: NaiveDate) -> Result<Vec<MaintenanceEntry>> {
        let threshold = self.settings.maintenance_threshold_years;
        self.read(|c| Ok(c.maintenance_report(today, threshold))).await
    }

    pub async fn valuation_report(&self) -> Result<ValuationReport> {
        self.read(|c| Ok(c.valuation_report())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::domain::{ArtworkKind, EmploymentState};
    use rust_decimal::Decimal;

    async fn service() -> (CatalogService, Uuid, Uuid, Uuid, Uuid) {
        let service = CatalogService::new(Arc::new(MemoryStore::new()), CatalogConfig::default());
        let room = service
            .create_taxonomy_entry(TaxonomyKind::Room, TaxonomyInput::named("Sala 1"))
            .await
            .unwrap();
        let period = service
            .create_taxonomy_entry(TaxonomyKind::Period, TaxonomyInput::named("Barroco"))
            .await
            .unwrap();
        let style = service
            .create_taxonomy_entry(TaxonomyKind::Style, TaxonomyInput::named("Tenebrismo"))
            .await
            .unwrap();
        let oil = service
            .create_taxonomy_entry(TaxonomyKind::Technique, TaxonomyInput::named("Óleo"))
            .await
            .unwrap();
        (service, room.id, period.id, style.id, oil.id)
    }

    fn painting(title: &str, room: Uuid, period: Uuid, style: Uuid, oil: Uuid) -> ArtworkInput {
        ArtworkInput {
            title: title.into(),
            author: "Caravaggio".into(),
            valuation: Decimal::new(250_000, 0),
            creation_date: "1599".into(),
            museum_entry_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            kind: ArtworkKind::Painting,
            technique_ids: BTreeSet::from([oil]),
            material_ids: BTreeSet::new(),
            period_id: period,
            room_id: room,
            style_ids: BTreeSet::from([style]),
            image: None,
        }
    }

    fn restorer(name: &str) -> RestorerInput {
        RestorerInput {
            first_name: name.into(),
            last_names: "Merisi".into(),
            email: format!("{}@museo.org", name.to_lowercase()),
            phone: None,
            employment: EmploymentState::Active,
            specialty: ArtworkKind::Painting,
        }
    }

    #[tokio::test]
    async fn restoration_lifecycle_is_persisted() {
        let (service, room, period, style, oil) = service().await;
        let artwork = service
            .create_artwork(painting("Judith", room, period, style, oil))
            .await
            .unwrap();
        let ana = service.create_restorer(restorer("Ana")).await.unwrap();

        let restoration = service
            .begin_restoration(NewRestoration {
                artwork_id: artwork.id,
                team: BTreeSet::from([ana.id]),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                damage_report: "Barniz oxidado".into(),
                restoration_type: "Limpieza".into(),
            })
            .await
            .unwrap();
        assert_eq!(service.artwork(artwork.id).await.unwrap().state(), ArtworkState::InRestoration);
        assert!(service.restorer(ana.id).await.unwrap().occupied());

        service
            .complete_restoration(restoration.id, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(service.artwork(artwork.id).await.unwrap().state(), ArtworkState::OnDisplay);
        assert!(!service.restorer(ana.id).await.unwrap().occupied());
    }

    #[tokio::test]
    async fn rejected_mutations_commit_nothing() {
        let (service, room, period, style, oil) = service().await;
        service
            .create_artwork(painting("Judith", room, period, style, oil))
            .await
            .unwrap();

        let mut duplicate = painting("JUDITH", room, period, style, oil);
        duplicate.valuation = Decimal::new(-1, 0);
        let err = service.create_artwork(duplicate).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.violations().len(), 2);

        let page = service
            .search_artworks(ArtworkFilter::default(), 0, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn gallery_hides_artworks_not_on_display() {
        let (service, room, period, style, oil) = service().await;
        let artwork = service
            .create_artwork(painting("Judith", room, period, style, oil))
            .await
            .unwrap();

        let gallery = service.public_gallery(ArtworkFilter::default(), 0).await.unwrap();
        assert_eq!(gallery.total, 0);
        assert_eq!(gallery.limit, 9);
        assert!(service.public_artwork(artwork.id).await.is_err());
    }

    #[tokio::test]
    async fn valuation_report_sums_all_artworks() {
        let (service, room, period, style, oil) = service().await;
        assert_eq!(service.valuation_report().await.unwrap().total, Decimal::ZERO);

        service
            .create_artwork(painting("Judith", room, period, style, oil))
            .await
            .unwrap();
        service
            .create_artwork(painting("Medusa", room, period, style, oil))
            .await
            .unwrap();

        let report = service.valuation_report().await.unwrap();
        assert_eq!(report.total, Decimal::new(500_000, 0));
        assert_eq!(report.artworks, 2);
    }
}
