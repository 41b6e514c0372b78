//! Partner museums and the loan requests they send

use chrono::NaiveDate;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

use super::catalog::Catalog;
use super::dates::DateRange;
use super::violations::Violations;
use crate::errors::{AppError, Result};

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[\d\s]+$").expect("phone pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerMuseum {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub city: String,
    pub catalog_url: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MuseumInput {
    pub name: String,
    pub country: String,
    pub city: String,
    pub catalog_url: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(AppError::InvalidFormat {
                message: format!("unknown request status '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestDecision {
    Approve,
    Reject,
}

/// A partner museum asking to borrow works. Requested titles are free
/// text and are not matched against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanRequest {
    pub id: Uuid,
    pub museum_id: Uuid,
    pub requested_artworks: Vec<String>,
    pub period: DateRange,
    pub(crate) status: RequestStatus,
    pub notes: Option<String>,
}

impl LoanRequest {
    pub fn status(&self) -> RequestStatus {
        self.status
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLoanRequest {
    pub museum_id: Uuid,
    pub requested_artworks: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanRequestFilter {
    pub status: Option<RequestStatus>,
    pub museum_id: Option<Uuid>,
}

fn cleaned(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl Catalog {
    pub fn create_museum(&mut self, input: MuseumInput) -> Result<PartnerMuseum> {
        self.check_museum_input(&input, None)?;

        let museum = PartnerMuseum {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            country: input.country.trim().to_string(),
            city: input.city.trim().to_string(),
            catalog_url: input.catalog_url.trim().to_string(),
            phones: cleaned(&input.phones),
            emails: cleaned(&input.emails),
        };
        self.put_museum(museum.clone());

        tracing::info!(museum_id = %museum.id, name = %museum.name, "Partner museum created");
        Ok(museum)
    }

    /// Phones and emails are replaced as a whole
    pub fn update_museum(&mut self, id: Uuid, input: MuseumInput) -> Result<PartnerMuseum> {
        let mut museum = self.require_museum(id)?.clone();
        self.check_museum_input(&input, Some(id))?;

        museum.name = input.name.trim().to_string();
        museum.country = input.country.trim().to_string();
        museum.city = input.city.trim().to_string();
        museum.catalog_url = input.catalog_url.trim().to_string();
        museum.phones = cleaned(&input.phones);
        museum.emails = cleaned(&input.emails);
        self.put_museum(museum.clone());

        Ok(museum)
    }

    /// Refused while loans or loan requests point at the museum
    pub fn delete_museum(&mut self, id: Uuid) -> Result<()> {
        let museum = self.require_museum(id)?;

        let mut violations = Violations::new();
        let loans = self.loans.values().filter(|l| l.museum_id == id).count();
        if loans > 0 {
            violations.conflict(
                None,
                format!("{} is the destination of {} loan(s)", museum.name, loans),
            );
        }
        let requests = self
            .loan_requests
            .values()
            .filter(|r| r.museum_id == id)
            .count();
        if requests > 0 {
            violations.conflict(
                None,
                format!("{} has {} loan request(s) on file", museum.name, requests),
            );
        }
        violations.finish()?;

        self.remove_museum(id);
        tracing::info!(museum_id = %id, "Partner museum deleted");
        Ok(())
    }

    /// Museums ordered by name
    pub fn list_museums(&self) -> Vec<&PartnerMuseum> {
        let mut museums: Vec<_> = self.museums.values().collect();
        museums.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        museums
    }

    pub fn create_loan_request(&mut self, input: NewLoanRequest) -> Result<LoanRequest> {
        self.require_museum(input.museum_id)?;
        let period = DateRange::new(input.start_date, input.end_date);
        let requested = cleaned(&input.requested_artworks);

        let mut violations = Violations::new();
        if requested.is_empty() {
            violations.validation(Some("requested_artworks"), "at least one artwork must be requested");
        }
        if !period.is_well_formed() {
            violations.validation(Some("end_date"), "end date precedes the start date");
        }
        violations.finish()?;

        let request = LoanRequest {
            id: Uuid::new_v4(),
            museum_id: input.museum_id,
            requested_artworks: requested,
            period,
            status: RequestStatus::Pending,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
        };
        self.put_loan_request(request.clone());

        tracing::info!(request_id = %request.id, museum_id = %request.museum_id, "Loan request received");
        Ok(request)
    }

    /// Approve or reject a pending request; decisions are final
    pub fn decide_loan_request(&mut self, id: Uuid, decision: RequestDecision) -> Result<LoanRequest> {
        let mut request = self.require_loan_request(id)?.clone();

        let mut violations = Violations::new();
        if request.status != RequestStatus::Pending {
            violations.conflict(
                Some("status"),
                format!("request was already {}", request.status.as_str()),
            );
        }
        violations.finish()?;

        request.status = match decision {
            RequestDecision::Approve => RequestStatus::Approved,
            RequestDecision::Reject => RequestStatus::Rejected,
        };
        self.put_loan_request(request.clone());

        tracing::info!(request_id = %id, status = request.status.as_str(), "Loan request decided");
        Ok(request)
    }

    /// Requests matching the filter, earliest requested start first
    pub fn list_loan_requests(&self, filter: &LoanRequestFilter) -> Vec<&LoanRequest> {
        let mut requests: Vec<_> = self
            .loan_requests
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.museum_id.map_or(true, |id| r.museum_id == id))
            .collect();
        requests.sort_by(|a, b| a.period.start.cmp(&b.period.start));
        requests
    }

    fn check_museum_input(&self, input: &MuseumInput, except: Option<Uuid>) -> Result<()> {
        let mut violations = Violations::new();

        let name = input.name.trim();
        if name.is_empty() {
            violations.validation(Some("name"), "must not be empty");
        } else if self.museums.values().any(|m| {
            Some(m.id) != except && m.name.to_lowercase() == name.to_lowercase()
        }) {
            violations.conflict(Some("name"), format!("a museum named '{}' already exists", name));
        }
        if input.country.trim().is_empty() {
            violations.validation(Some("country"), "must not be empty");
        }
        if input.city.trim().is_empty() {
            violations.validation(Some("city"), "must not be empty");
        }
        if !input.catalog_url.trim().to_string().validate_url() {
            violations.validation(Some("catalog_url"), "must be a valid URL");
        }

        let phones = cleaned(&input.phones);
        if phones.is_empty() {
            violations.validation(Some("phones"), "at least one phone number is required");
        }
        for phone in &phones {
            if !phone_pattern().is_match(phone) {
                violations.validation(Some("phones"), format!("'{}' is not a phone number", phone));
            }
        }

        let emails = cleaned(&input.emails);
        if emails.is_empty() {
            violations.validation(Some("emails"), "at least one email address is required");
        }
        for email in &emails {
            if !email.validate_email() {
                violations.validation(Some("emails"), format!("'{}' is not a valid email address", email));
            }
        }

        violations.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::Fixture;

    fn museum_input(name: &str) -> MuseumInput {
        MuseumInput {
            name: name.into(),
            country: "Italia".into(),
            city: "Firenze".into(),
            catalog_url: "https://www.uffizi.it/collezione".into(),
            phones: vec!["+39 055 294883".into()],
            emails: vec!["info@uffizi.it".into()],
        }
    }

    #[test]
    fn museum_contacts_are_validated() {
        let mut catalog = Catalog::new();
        let mut input = museum_input("Uffizi");
        input.phones = vec!["call me".into()];
        input.emails = vec![];
        input.catalog_url = "uffizi".into();

        let err = catalog.create_museum(input).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn museum_names_are_unique() {
        let mut catalog = Catalog::new();
        catalog.create_museum(museum_input("Uffizi")).unwrap();
        let err = catalog.create_museum(museum_input("UFFIZI")).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn update_replaces_contacts() {
        let mut catalog = Catalog::new();
        let museum = catalog.create_museum(museum_input("Uffizi")).unwrap();

        let mut input = museum_input("Uffizi");
        input.phones = vec!["055 1234".into(), "  ".into()];
        let updated = catalog.update_museum(museum.id, input).unwrap();
        assert_eq!(updated.phones, vec!["055 1234".to_string()]);
    }

    #[test]
    fn museums_with_loans_cannot_be_deleted() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Viajera");
        let museum = fx.museum("Uffizi");
        let idle = fx.museum("Prado");
        fx.loan(&[artwork.id], museum, 1, 5);

        assert!(fx.catalog.delete_museum(museum).unwrap_err().is_conflict());
        fx.catalog.delete_museum(idle).unwrap();
        assert!(fx.catalog.museum(idle).is_none());
    }

    #[test]
    fn requests_are_decided_once() {
        let mut fx = Fixture::new();
        let museum = fx.museum("Uffizi");
        let request = fx
            .catalog
            .create_loan_request(NewLoanRequest {
                museum_id: museum,
                requested_artworks: vec!["La Primavera".into(), " ".into()],
                start_date: fx.day(1),
                end_date: fx.day(20),
                notes: None,
            })
            .unwrap();
        assert_eq!(request.status(), RequestStatus::Pending);
        assert_eq!(request.requested_artworks.len(), 1);

        let approved = fx
            .catalog
            .decide_loan_request(request.id, RequestDecision::Approve)
            .unwrap();
        assert_eq!(approved.status(), RequestStatus::Approved);

        let err = fx
            .catalog
            .decide_loan_request(request.id, RequestDecision::Reject)
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(fx.catalog.delete_museum(museum).unwrap_err().is_conflict());
    }

    #[test]
    fn empty_requests_are_invalid() {
        let mut fx = Fixture::new();
        let museum = fx.museum("Uffizi");
        let err = fx
            .catalog
            .create_loan_request(NewLoanRequest {
                museum_id: museum,
                requested_artworks: vec![],
                start_date: fx.day(10),
                end_date: fx.day(1),
                notes: None,
            })
            .unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn requests_filter_by_status() {
        let mut fx = Fixture::new();
        let museum = fx.museum("Uffizi");
        for title in ["Venus", "Medusa"] {
            fx.catalog
                .create_loan_request(NewLoanRequest {
                    museum_id: museum,
                    requested_artworks: vec![title.into()],
                    start_date: fx.day(1),
                    end_date: fx.day(2),
                    notes: Some("urgente".into()),
                })
                .unwrap();
        }
        let pending = fx.catalog.list_loan_requests(&LoanRequestFilter {
            status: Some(RequestStatus::Pending),
            museum_id: Some(museum),
        });
        assert_eq!(pending.len(), 2);
    }
}
