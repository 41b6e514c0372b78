//! Lookup tables: rooms, periods, styles, techniques and materials

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::catalog::Catalog;
use super::violations::Violations;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Room,
    Period,
    Style,
    Technique,
    Material,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 5] = [
        TaxonomyKind::Room,
        TaxonomyKind::Period,
        TaxonomyKind::Style,
        TaxonomyKind::Technique,
        TaxonomyKind::Material,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyKind::Room => "room",
            TaxonomyKind::Period => "period",
            TaxonomyKind::Style => "style",
            TaxonomyKind::Technique => "technique",
            TaxonomyKind::Material => "material",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        TaxonomyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown taxonomy kind '{}'", s),
            })
    }
}

/// One row of a lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: Uuid,
    pub kind: TaxonomyKind,
    pub name: String,
    /// Only rooms carry a description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaxonomyInput {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
        }
    }
}

impl Catalog {
    pub fn taxonomy_entry(&self, id: Uuid) -> Option<&TaxonomyEntry> {
        self.taxonomy.get(&id)
    }

    /// Entries of one kind ordered by name
    pub fn taxonomy_entries(&self, kind: TaxonomyKind) -> Vec<&TaxonomyEntry> {
        let mut entries: Vec<_> = self.taxonomy.values().filter(|e| e.kind == kind).collect();
        entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        entries
    }

    pub fn create_taxonomy_entry(
        &mut self,
        kind: TaxonomyKind,
        input: TaxonomyInput,
    ) -> Result<TaxonomyEntry> {
        let name = self.checked_taxonomy_name(kind, &input.name, None)?;

        let entry = TaxonomyEntry {
            id: Uuid::new_v4(),
            kind,
            name,
            description: input.description.filter(|_| kind == TaxonomyKind::Room),
        };
        self.put_taxonomy(entry.clone());

        tracing::info!(entry_id = %entry.id, kind = %kind, name = %entry.name, "Taxonomy entry created");
        Ok(entry)
    }

    pub fn rename_taxonomy_entry(&mut self, id: Uuid, input: TaxonomyInput) -> Result<TaxonomyEntry> {
        let mut entry = self
            .taxonomy
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("taxonomy entry", id))?;

        entry.name = self.checked_taxonomy_name(entry.kind, &input.name, Some(id))?;
        if entry.kind == TaxonomyKind::Room {
            entry.description = input.description;
        }
        self.put_taxonomy(entry.clone());
        Ok(entry)
    }

    /// Refused while any artwork still points at the entry
    pub fn delete_taxonomy_entry(&mut self, id: Uuid) -> Result<()> {
        let entry = self
            .taxonomy
            .get(&id)
            .ok_or_else(|| AppError::not_found("taxonomy entry", id))?;

        let mut violations = Violations::new();
        let users = self.artworks.values().filter(|a| a.references(id)).count();
        if users > 0 {
            violations.conflict(
                None,
                format!(
                    "{} '{}' is still referenced by {} artwork(s)",
                    entry.kind, entry.name, users
                ),
            );
        }
        violations.finish()?;

        self.remove_taxonomy(id);
        tracing::info!(entry_id = %id, "Taxonomy entry deleted");
        Ok(())
    }

    /// Record a violation unless `id` names an entry of `kind`
    pub(super) fn check_taxonomy_ref(
        &self,
        id: Uuid,
        kind: TaxonomyKind,
        field: &str,
        violations: &mut Violations,
    ) {
        match self.taxonomy.get(&id) {
            Some(entry) if entry.kind == kind => {}
            Some(entry) => violations.validation(
                Some(field),
                format!("'{}' is a {}, not a {}", entry.name, entry.kind, kind),
            ),
            None => violations.validation(Some(field), format!("unknown {} {}", kind, id)),
        }
    }

    fn checked_taxonomy_name(
        &self,
        kind: TaxonomyKind,
        raw: &str,
        except: Option<Uuid>,
    ) -> Result<String> {
        let name = raw.trim().to_string();
        let mut violations = Violations::new();

        if name.is_empty() {
            violations.validation(Some("name"), "must not be empty");
        } else if self.taxonomy.values().any(|e| {
            e.kind == kind && Some(e.id) != except && e.name.to_lowercase() == name.to_lowercase()
        }) {
            violations.conflict(Some("name"), format!("a {} named '{}' already exists", kind, name));
        }

        violations.finish()?;
        Ok(name)
    }
}
