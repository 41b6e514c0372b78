//! Restorers and their derived occupancy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::ValidateEmail;

use super::artwork::ArtworkKind;
use super::catalog::Catalog;
use super::restoration::Restoration;
use super::violations::Violations;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentState {
    Active,
    Inactive,
}

impl EmploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentState::Active => "active",
            EmploymentState::Inactive => "inactive",
        }
    }
}

impl Default for EmploymentState {
    fn default() -> Self {
        EmploymentState::Active
    }
}

impl FromStr for EmploymentState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(EmploymentState::Active),
            "inactive" => Ok(EmploymentState::Inactive),
            _ => Err(AppError::InvalidFormat {
                message: format!("unknown employment state '{}'", s),
            }),
        }
    }
}

/// Availability as shown to staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Inactive,
    InRestoration,
    Free,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Availability::Inactive => "Inactive",
            Availability::InRestoration => "In restoration",
            Availability::Free => "Free",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restorer {
    pub id: Uuid,
    pub first_name: String,
    pub last_names: String,
    pub email: String,
    pub phone: Option<String>,
    pub employment: EmploymentState,
    pub specialty: ArtworkKind,
    /// Cached projection of the restoration records; see [`recompute_occupancy`]
    pub(crate) occupied: bool,
}

impl Restorer {
    pub fn occupied(&self) -> bool {
        self.occupied
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_names)
    }

    pub fn availability(&self) -> Availability {
        match (self.employment, self.occupied) {
            (EmploymentState::Inactive, _) => Availability::Inactive,
            (EmploymentState::Active, true) => Availability::InRestoration,
            (EmploymentState::Active, false) => Availability::Free,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestorerInput {
    pub first_name: String,
    pub last_names: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub employment: EmploymentState,
    pub specialty: ArtworkKind,
}

/// A restorer is occupied iff some restoration without an end date has
/// them on its team
pub fn recompute_occupancy<'a, I>(restorer_id: Uuid, restorations: I) -> bool
where
    I: IntoIterator<Item = &'a Restoration>,
{
    restorations
        .into_iter()
        .any(|r| r.is_active() && r.team.contains(&restorer_id))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestorerFilter {
    pub employment: Option<EmploymentState>,
    pub occupied: Option<bool>,
    pub specialty: Option<ArtworkKind>,
}

impl Catalog {
    pub fn create_restorer(&mut self, input: RestorerInput) -> Result<Restorer> {
        self.check_restorer_input(&input, None)?;

        let restorer = Restorer {
            id: Uuid::new_v4(),
            first_name: input.first_name.trim().to_string(),
            last_names: input.last_names.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            employment: input.employment,
            specialty: input.specialty,
            occupied: false,
        };
        self.put_restorer(restorer.clone());

        tracing::info!(restorer_id = %restorer.id, specialty = %restorer.specialty, "Restorer created");
        Ok(restorer)
    }

    /// Edit a restorer's record; occupancy is never taken from the caller
    pub fn update_restorer(&mut self, id: Uuid, input: RestorerInput) -> Result<Restorer> {
        let mut restorer = self.require_restorer(id)?.clone();
        self.check_restorer_input(&input, Some(id))?;

        restorer.first_name = input.first_name.trim().to_string();
        restorer.last_names = input.last_names.trim().to_string();
        restorer.email = input.email.trim().to_string();
        restorer.phone = input.phone.filter(|p| !p.trim().is_empty());
        restorer.employment = input.employment;
        restorer.specialty = input.specialty;
        self.put_restorer(restorer.clone());

        Ok(restorer)
    }

    /// Refused while any restoration lists the restorer
    pub fn delete_restorer(&mut self, id: Uuid) -> Result<()> {
        let restorer = self.require_restorer(id)?;

        let mut violations = Violations::new();
        if self.restorations.values().any(|r| r.team.contains(&id)) {
            violations.conflict(
                None,
                format!("{} is part of at least one restoration team", restorer.full_name()),
            );
        }
        violations.finish()?;

        self.remove_restorer(id);
        Ok(())
    }

    /// Restorers ordered by last names, then first name
    pub fn list_restorers(&self, filter: &RestorerFilter) -> Vec<&Restorer> {
        let mut restorers: Vec<_> = self
            .restorers
            .values()
            .filter(|r| filter.employment.map_or(true, |e| r.employment == e))
            .filter(|r| filter.occupied.map_or(true, |o| r.occupied == o))
            .filter(|r| filter.specialty.map_or(true, |s| r.specialty == s))
            .collect();
        restorers.sort_by(|a, b| {
            (a.last_names.to_lowercase(), a.first_name.to_lowercase())
                .cmp(&(b.last_names.to_lowercase(), b.first_name.to_lowercase()))
        });
        restorers
    }

    /// Rewrite the cached occupancy of each given restorer from the full
    /// restoration history
    pub(super) fn refresh_occupancy<I>(&mut self, restorer_ids: I)
    where
        I: IntoIterator<Item = Uuid>,
    {
        for id in restorer_ids {
            let occupied = recompute_occupancy(id, self.restorations.values());
            if let Some(mut restorer) = self.restorers.get(&id).cloned() {
                if restorer.occupied != occupied {
                    restorer.occupied = occupied;
                    self.put_restorer(restorer);
                }
            }
        }
    }

    fn check_restorer_input(&self, input: &RestorerInput, except: Option<Uuid>) -> Result<()> {
        let mut violations = Violations::new();

        if input.first_name.trim().is_empty() {
            violations.validation(Some("first_name"), "must not be empty");
        }
        if input.last_names.trim().is_empty() {
            violations.validation(Some("last_names"), "must not be empty");
        }

        let email = input.email.trim().to_string();
        if !email.validate_email() {
            violations.validation(Some("email"), format!("'{}' is not a valid email address", email));
        } else if self.restorers.values().any(|r| {
            Some(r.id) != except && r.email.eq_ignore_ascii_case(&email)
        }) {
            violations.conflict(Some("email"), format!("'{}' is already used by another restorer", email));
        }

        violations.finish()
    }
}
