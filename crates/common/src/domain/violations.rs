//! Collects every rule violation of a submission before failing

use crate::errors::{AppError, Violation, ViolationKind};

/// Accumulator for the violations found while checking one operation.
///
/// Checks never short-circuit: each rule pushes its finding here and the
/// operation calls [`Violations::finish`] once all rules have run.
#[derive(Debug, Default, Clone)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validation(&mut self, field: Option<&str>, message: impl Into<String>) {
        self.items.push(Violation::validation(field, message));
    }

    pub fn conflict(&mut self, field: Option<&str>, message: impl Into<String>) {
        self.items.push(Violation::conflict(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_conflicts(&self) -> bool {
        self.items.iter().any(|v| v.kind == ViolationKind::Conflict)
    }

    /// `Ok(())` when nothing was violated; otherwise a `Conflict` if any
    /// conflict was recorded, else a `Validation` error. All collected
    /// violations travel with the error either way.
    pub fn finish(self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Ok(());
        }

        let has_conflicts = self.has_conflicts();
        let violations = self.items;

        if has_conflicts {
            Err(AppError::Conflict { violations })
        } else {
            Err(AppError::Validation { violations })
        }
    }
}
