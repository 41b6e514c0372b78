//! Restoration workflow: starting, re-staffing and completing restorations
//!
//! Every path that changes a team roster or closes a restoration ends by
//! recomputing the occupancy of the restorers involved, inside the same
//! unit of work as the change itself.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::artwork::{Artwork, ArtworkState};
use super::catalog::Catalog;
use super::dates::DATE_FORMAT;
use super::restorer::EmploymentState;
use super::violations::Violations;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorationStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restoration {
    pub id: Uuid,
    pub artwork_id: Uuid,
    pub team: BTreeSet<Uuid>,
    pub start_date: NaiveDate,
    pub(crate) end_date: Option<NaiveDate>,
    pub damage_report: String,
    pub restoration_type: String,
}

impl Restoration {
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Open until an end date is recorded
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn status(&self) -> RestorationStatus {
        if self.is_active() {
            RestorationStatus::Active
        } else {
            RestorationStatus::Completed
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRestoration {
    pub artwork_id: Uuid,
    pub team: BTreeSet<Uuid>,
    pub start_date: NaiveDate,
    pub damage_report: String,
    pub restoration_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestorationFilter {
    pub artwork_id: Option<Uuid>,
    pub status: Option<RestorationStatus>,
    pub restorer_id: Option<Uuid>,
}

impl Catalog {
    /// Open a restoration of an artwork with the given team.
    ///
    /// The artwork must be neither in restoration nor on loan. Each team
    /// member must exist, be employed, be free and share the artwork's
    /// kind as specialty. All problems are reported together.
    pub fn begin_restoration(&mut self, input: NewRestoration) -> Result<Restoration> {
        let artwork = self.require_artwork(input.artwork_id)?.clone();
        let mut violations = Violations::new();

        if matches!(artwork.state, ArtworkState::InRestoration | ArtworkState::OnLoan) {
            violations.conflict(
                Some("artwork_id"),
                format!(
                    "cannot start a restoration of '{}' while it is {}",
                    artwork.title,
                    artwork.state.label().to_lowercase()
                ),
            );
        }
        if input.damage_report.trim().is_empty() {
            violations.validation(Some("damage_report"), "must not be empty");
        }
        if input.restoration_type.trim().is_empty() {
            violations.validation(Some("restoration_type"), "must not be empty");
        }
        if input.team.is_empty() {
            violations.validation(Some("team"), "a restoration needs at least one restorer");
        }
        self.check_team_candidates(&artwork, input.team.iter().copied(), None, &mut violations);

        violations.finish()?;

        let restoration = Restoration {
            id: Uuid::new_v4(),
            artwork_id: artwork.id,
            team: input.team,
            start_date: input.start_date,
            end_date: None,
            damage_report: input.damage_report.trim().to_string(),
            restoration_type: input.restoration_type.trim().to_string(),
        };
        self.put_restoration(restoration.clone());
        self.set_artwork_state(artwork.id, ArtworkState::InRestoration);
        self.refresh_occupancy(restoration.team.iter().copied());

        tracing::info!(
            restoration_id = %restoration.id,
            artwork_id = %artwork.id,
            team_size = restoration.team.len(),
            "Restoration started"
        );
        Ok(restoration)
    }

    /// Close a restoration. The artwork goes back on display and each team
    /// member stays occupied only if another open restoration still lists
    /// them. Completion is final.
    pub fn complete_restoration(&mut self, id: Uuid, end_date: NaiveDate) -> Result<Restoration> {
        let mut restoration = self.require_restoration(id)?.clone();
        let mut violations = Violations::new();

        if let Some(ended) = restoration.end_date {
            violations.conflict(
                Some("end_date"),
                format!("restoration was already completed on {}", ended.format(DATE_FORMAT)),
            );
        } else if end_date < restoration.start_date {
            violations.validation(
                Some("end_date"),
                format!(
                    "end date precedes the start date {}",
                    restoration.start_date.format(DATE_FORMAT)
                ),
            );
        }
        violations.finish()?;

        restoration.end_date = Some(end_date);
        self.put_restoration(restoration.clone());
        self.set_artwork_state(restoration.artwork_id, ArtworkState::OnDisplay);
        self.refresh_occupancy(restoration.team.iter().copied());

        tracing::info!(
            restoration_id = %id,
            artwork_id = %restoration.artwork_id,
            end_date = %end_date,
            "Restoration completed"
        );
        Ok(restoration)
    }

    /// Replace the roster of a restoration. Newcomers go through the same
    /// eligibility checks as at creation; current members are exempt from
    /// the occupancy check.
    pub fn change_restoration_team(&mut self, id: Uuid, team: BTreeSet<Uuid>) -> Result<Restoration> {
        let mut restoration = self.require_restoration(id)?.clone();
        let artwork = self.require_artwork(restoration.artwork_id)?.clone();

        let added: BTreeSet<Uuid> = team.difference(&restoration.team).copied().collect();
        let removed: BTreeSet<Uuid> = restoration.team.difference(&team).copied().collect();

        let mut violations = Violations::new();
        if team.is_empty() {
            violations.validation(Some("team"), "a restoration needs at least one restorer");
        }
        self.check_team_candidates(&artwork, added.iter().copied(), Some(&restoration), &mut violations);
        violations.finish()?;

        restoration.team = team;
        self.put_restoration(restoration.clone());
        self.on_team_membership_changed(id, &added, &removed);

        Ok(restoration)
    }

    /// Empty the roster of a restoration, releasing everyone on it
    pub fn clear_restoration_team(&mut self, id: Uuid) -> Result<Restoration> {
        let mut restoration = self.require_restoration(id)?.clone();
        let removed = std::mem::take(&mut restoration.team);

        self.put_restoration(restoration.clone());
        self.on_team_membership_changed(id, &BTreeSet::new(), &removed);

        Ok(restoration)
    }

    /// Reaction to any roster change: everyone now on the roster and
    /// everyone just removed gets their occupancy recomputed from all
    /// restorations
    pub fn on_team_membership_changed(
        &mut self,
        restoration_id: Uuid,
        added: &BTreeSet<Uuid>,
        removed: &BTreeSet<Uuid>,
    ) {
        let roster = self
            .restorations
            .get(&restoration_id)
            .map(|r| r.team.clone())
            .unwrap_or_default();

        self.refresh_occupancy(roster.iter().chain(removed.iter()).copied());

        tracing::debug!(
            restoration_id = %restoration_id,
            added = added.len(),
            removed = removed.len(),
            "Restoration team changed"
        );
    }

    /// Restorations matching the filter, most recently started first
    pub fn list_restorations(&self, filter: &RestorationFilter) -> Vec<&Restoration> {
        let mut restorations: Vec<_> = self
            .restorations
            .values()
            .filter(|r| filter.artwork_id.map_or(true, |id| r.artwork_id == id))
            .filter(|r| filter.status.map_or(true, |s| r.status() == s))
            .filter(|r| filter.restorer_id.map_or(true, |id| r.team.contains(&id)))
            .collect();
        restorations.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        restorations
    }

    /// Remove a restoration as part of deleting its artwork
    pub(super) fn drop_restoration(&mut self, id: Uuid) {
        if let Some(restoration) = self.restorations.get(&id).cloned() {
            self.remove_restoration(id);
            self.refresh_occupancy(restoration.team);
        }
    }

    fn check_team_candidates<I>(
        &self,
        artwork: &Artwork,
        candidates: I,
        restoration: Option<&Restoration>,
        violations: &mut Violations,
    ) where
        I: IntoIterator<Item = Uuid>,
    {
        for id in candidates {
            let Some(restorer) = self.restorers.get(&id) else {
                violations.validation(Some("team"), format!("unknown restorer {}", id));
                continue;
            };
            let name = restorer.full_name();

            if restorer.employment == EmploymentState::Inactive {
                violations.validation(Some("team"), format!("{} is not an active restorer", name));
            }

            let already_on_team = restoration.map_or(false, |r| r.team.contains(&id));
            if restorer.occupied && !already_on_team {
                violations.conflict(
                    Some("team"),
                    format!("{} is already working on another restoration", name),
                );
            }

            if restorer.specialty != artwork.kind {
                violations.validation(
                    Some("team"),
                    format!(
                        "{} specialises in {} and cannot restore a {}",
                        name, restorer.specialty, artwork.kind
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artwork::ArtworkKind;
    use crate::domain::restorer::{recompute_occupancy, RestorerInput};
    use crate::domain::testing::Fixture;
    use crate::errors::ViolationKind;

    #[test]
    fn starry_night_scenario() {
        let mut fx = Fixture::new();
        let starry = fx.painting("Starry Night");
        let alice = fx.painter_restorer("Alice");
        assert_eq!(starry.state(), ArtworkState::InStorage);
        assert!(!alice.occupied());

        let restoration = fx
            .catalog
            .begin_restoration(fx.restoration_input(starry.id, &[alice.id]))
            .unwrap();
        assert!(restoration.is_active());
        assert_eq!(fx.catalog.artwork(starry.id).unwrap().state(), ArtworkState::InRestoration);
        assert!(fx.catalog.restorer(alice.id).unwrap().occupied());

        let bob = fx.painter_restorer("Bob");
        let err = fx
            .catalog
            .begin_restoration(fx.restoration_input(starry.id, &[bob.id]))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn loaned_artwork_cannot_enter_restoration_regardless_of_team() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Prestada");
        let museum = fx.museum("Prado");
        fx.loan(&[artwork.id], museum, 1, 10);
        let ana = fx.painter_restorer("Ana");

        let err = fx
            .catalog
            .begin_restoration(fx.restoration_input(artwork.id, &[ana.id]))
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(!fx.catalog.restorer(ana.id).unwrap().occupied());
    }

    #[test]
    fn every_team_problem_is_reported_and_nothing_changes() {
        let mut fx = Fixture::new();
        let busy_work = fx.painting("Ocupada");
        let target = fx.painting("Objetivo");
        let busy = fx.painter_restorer("Busy");
        fx.begin(busy_work.id, &[busy.id]);
        let sculptor = fx.sculptor_restorer("Escultor");
        let retired = fx.painter_restorer("Retirada");
        fx.catalog
            .update_restorer(
                retired.id,
                RestorerInput {
                    first_name: retired.first_name.clone(),
                    last_names: retired.last_names.clone(),
                    email: retired.email.clone(),
                    phone: None,
                    employment: EmploymentState::Inactive,
                    specialty: ArtworkKind::Painting,
                },
            )
            .unwrap();
        fx.catalog.take_changes();

        let err = fx
            .catalog
            .begin_restoration(fx.restoration_input(target.id, &[busy.id, sculptor.id, retired.id]))
            .unwrap_err();

        assert!(err.is_conflict());
        let violations = err.violations();
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations.iter().filter(|v| v.kind == ViolationKind::Conflict).count(),
            1
        );
        assert!(fx.catalog.pending_changes().is_empty());
        assert_eq!(fx.catalog.artwork(target.id).unwrap().state(), ArtworkState::InStorage);
    }

    #[test]
    fn empty_team_is_rejected() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Sola");
        let err = fx
            .catalog
            .begin_restoration(fx.restoration_input(artwork.id, &[]))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn completion_puts_artwork_on_display_and_frees_team() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Lista");
        let ana = fx.painter_restorer("Ana");
        let restoration = fx.begin(artwork.id, &[ana.id]);

        let done = fx.catalog.complete_restoration(restoration.id, fx.day(15)).unwrap();
        assert_eq!(done.status(), RestorationStatus::Completed);
        assert_eq!(fx.catalog.artwork(artwork.id).unwrap().state(), ArtworkState::OnDisplay);
        assert!(!fx.catalog.restorer(ana.id).unwrap().occupied());
    }

    #[test]
    fn completion_keeps_restorer_busy_on_another_open_restoration() {
        let mut fx = Fixture::new();
        let first = fx.painting("A");
        let second = fx.painting("B");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");

        let a = fx.begin(first.id, &[ana.id]);
        let b = fx.begin(second.id, &[bea.id]);
        // Double booking only arrives through imported rows
        let mut b_row = fx.catalog.restoration(b.id).unwrap().clone();
        b_row.team.insert(ana.id);
        fx.catalog.put_restoration(b_row);

        fx.catalog.complete_restoration(a.id, fx.day(20)).unwrap();

        assert!(fx.catalog.restorer(ana.id).unwrap().occupied());
        assert!(recompute_occupancy(ana.id, fx.catalog.restorations()));
    }

    #[test]
    fn removed_restorer_stays_busy_on_another_open_restoration() {
        let mut fx = Fixture::new();
        let first = fx.painting("A");
        let second = fx.painting("B");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");
        let cris = fx.painter_restorer("Cris");

        let a = fx.begin(first.id, &[ana.id]);
        let b = fx.begin(second.id, &[bea.id]);
        // Double booking only arrives through imported rows
        let mut b_row = fx.catalog.restoration(b.id).unwrap().clone();
        b_row.team.insert(ana.id);
        fx.catalog.put_restoration(b_row);

        fx.catalog
            .change_restoration_team(a.id, BTreeSet::from([cris.id]))
            .unwrap();

        assert!(fx.catalog.restorer(ana.id).unwrap().occupied());
        assert!(fx.catalog.restorer(cris.id).unwrap().occupied());
        assert!(!fx.catalog.restoration(a.id).unwrap().team.contains(&ana.id));
    }

    #[test]
    fn completion_is_one_way() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Final");
        let ana = fx.painter_restorer("Ana");
        let restoration = fx.begin(artwork.id, &[ana.id]);
        fx.catalog.complete_restoration(restoration.id, fx.day(15)).unwrap();

        let err = fx
            .catalog
            .complete_restoration(restoration.id, fx.day(16))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn completion_before_start_is_invalid() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Temprana");
        let ana = fx.painter_restorer("Ana");
        let restoration = fx.begin(artwork.id, &[ana.id]);

        let before = restoration.start_date - chrono::Duration::days(1);
        let err = fx.catalog.complete_restoration(restoration.id, before).unwrap_err();
        assert!(err.is_validation());
        assert!(fx.catalog.restoration(restoration.id).unwrap().is_active());
    }

    #[test]
    fn team_change_recomputes_added_and_removed_members() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Equipo");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");
        let restoration = fx.begin(artwork.id, &[ana.id]);

        fx.catalog
            .change_restoration_team(restoration.id, BTreeSet::from([bea.id]))
            .unwrap();

        assert!(!fx.catalog.restorer(ana.id).unwrap().occupied());
        assert!(fx.catalog.restorer(bea.id).unwrap().occupied());
    }

    #[test]
    fn current_members_are_exempt_from_the_occupancy_check() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Equipo");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");
        let restoration = fx.begin(artwork.id, &[ana.id]);

        let updated = fx
            .catalog
            .change_restoration_team(restoration.id, BTreeSet::from([ana.id, bea.id]))
            .unwrap();
        assert_eq!(updated.team.len(), 2);
        assert!(fx.catalog.restorer(ana.id).unwrap().occupied());
    }

    #[test]
    fn occupied_newcomer_is_rejected_on_team_change() {
        let mut fx = Fixture::new();
        let first = fx.painting("Uno");
        let second = fx.painting("Dos");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");
        fx.begin(first.id, &[ana.id]);
        let restoration = fx.begin(second.id, &[bea.id]);

        let err = fx
            .catalog
            .change_restoration_team(restoration.id, BTreeSet::from([ana.id, bea.id]))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn clearing_a_team_releases_everyone() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Vacía");
        let ana = fx.painter_restorer("Ana");
        let bea = fx.painter_restorer("Bea");
        let restoration = fx.begin(artwork.id, &[ana.id, bea.id]);

        let cleared = fx.catalog.clear_restoration_team(restoration.id).unwrap();
        assert!(cleared.team.is_empty());
        assert!(!fx.catalog.restorer(ana.id).unwrap().occupied());
        assert!(!fx.catalog.restorer(bea.id).unwrap().occupied());
    }

    #[test]
    fn listing_filters_by_status_and_orders_newest_first() {
        let mut fx = Fixture::new();
        let artwork = fx.painting("Historia");
        let ana = fx.painter_restorer("Ana");
        let old = fx.begin(artwork.id, &[ana.id]);
        fx.catalog.complete_restoration(old.id, fx.day(5)).unwrap();

        let mut input = fx.restoration_input(artwork.id, &[ana.id]);
        input.start_date = fx.day(6);
        let recent = fx.catalog.begin_restoration(input).unwrap();

        let ids: Vec<_> = fx
            .catalog
            .list_restorations(&RestorationFilter {
                artwork_id: Some(artwork.id),
                ..Default::default()
            })
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![recent.id, old.id]);

        let active = fx.catalog.list_restorations(&RestorationFilter {
            status: Some(RestorationStatus::Active),
            ..Default::default()
        });
        assert_eq!(active.len(), 1);
    }
}
