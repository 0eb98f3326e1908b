//! Per-session bookkeeping of which fields the reviewer has touched.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::declaration::{Declaration, DeclarationField};
use crate::review::issues::Issue;

/// Records edits and explicit verifications for one review session.
///
/// Set membership is one-way: a field stays in `edited` for the rest of the
/// session even if a later edit empties it again. Resolution still flips
/// back to false in that case, because the live value check is two-way.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResolutionTracker {
    edited: HashSet<DeclarationField>,
    verified: HashSet<DeclarationField>,
}

impl ResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_edited(&mut self, field: DeclarationField) {
        self.edited.insert(field);
    }

    /// Record an explicit "the extracted value is fine" assertion. No
    /// emptiness precondition is checked here; the approval gate still
    /// blocks empty fields at disposition time.
    pub fn mark_verified(&mut self, field: DeclarationField) {
        self.verified.insert(field);
    }

    pub fn is_edited(&self, field: DeclarationField) -> bool {
        self.edited.contains(&field)
    }

    pub fn is_verified(&self, field: DeclarationField) -> bool {
        self.verified.contains(&field)
    }

    pub fn edited_count(&self) -> usize {
        self.edited.len()
    }

    pub fn verified_count(&self) -> usize {
        self.verified.len()
    }

    /// Verification signal used by the extraction blend. Deliberately the
    /// sum of both set sizes, not the size of their union: a field that was
    /// both edited and verified counts twice. Preserved as-is for numeric
    /// compatibility; the blend is capped downstream.
    pub fn signal_count(&self) -> usize {
        self.verified.len() + self.edited.len()
    }

    /// An issue is resolved when its field was explicitly verified, or was
    /// edited and currently holds a non-empty value in the live declaration.
    pub fn is_resolved(&self, issue: &Issue, live: &Declaration) -> bool {
        if self.verified.contains(&issue.field) {
            return true;
        }
        self.edited.contains(&issue.field) && !live.is_missing(issue.field)
    }

    pub fn resolved_count(&self, issues: &[Issue], live: &Declaration) -> usize {
        issues.iter().filter(|issue| self.is_resolved(issue, live)).count()
    }
}
