//! Catalog domain core
//!
//! Every mutation is an operation on [`Catalog`]. Operations check all of
//! their rules first, collecting every violation, and only then write. The
//! writes they make (artwork state, restorer occupancy and the records
//! themselves) are gathered in a [`ChangeSet`] that storage applies as one
//! unit.

pub mod artwork;
pub mod catalog;
pub mod dates;
pub mod exhibition;
pub mod loan;
pub mod museum;
pub mod projection;
pub mod query;
pub mod reports;
pub mod restoration;
pub mod restorer;
pub mod taxonomy;
pub mod violations;

#[cfg(test)]
pub(crate) mod testing;

pub use artwork::{check_classification, Artwork, ArtworkInput, ArtworkKind, ArtworkState};
pub use catalog::{Catalog, ChangeSet};
pub use dates::DateRange;
pub use exhibition::{Exhibition, ExhibitionInput, MIN_EXHIBITION_ARTWORKS};
pub use loan::{Loan, LoanFilter, NewLoan};
pub use museum::{
    LoanRequest, LoanRequestFilter, MuseumInput, NewLoanRequest, PartnerMuseum, RequestDecision,
    RequestStatus,
};
pub use projection::ArtworkView;
pub use query::{ArtworkFilter, HomePage, Page};
pub use reports::{MaintenanceEntry, ValuationReport};
pub use restoration::{NewRestoration, Restoration, RestorationFilter, RestorationStatus};
pub use restorer::{
    recompute_occupancy, Availability, EmploymentState, Restorer, RestorerFilter, RestorerInput,
};
pub use taxonomy::{TaxonomyEntry, TaxonomyInput, TaxonomyKind};
pub use violations::Violations;
