//! Issue detection over the initial declaration snapshot.
//!
//! The detector is a pure function and is meant to run exactly once per
//! review session, on the snapshot taken when the session opens. Re-running
//! it against the live declaration mid-review would make findings appear and
//! disappear as the reviewer types; `ReviewSession` freezes the result at
//! construction instead.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::FieldCatalog;
use crate::domain::confidence::FieldConfidence;
use crate::domain::declaration::{Declaration, DeclarationField};
use crate::pipeline::{ComplianceCheck, ComplianceReport};

/// Extraction confidence below this threshold flags a field for review.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    Invalid,
    LowConfidence,
}

/// A finding requiring reviewer attention, tied to exactly one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub field: DeclarationField,
    pub kind: IssueKind,
    pub title: String,
    pub description: String,
    pub hint: String,
    /// Index of the originating compliance check, for `Invalid` issues.
    pub check_index: Option<usize>,
}

/// Detect issues in fixed precedence order: missing fields, failed
/// compliance checks, then low-confidence extractions. At most one issue is
/// retained per field; the first rule to claim a field wins.
pub fn detect_issues(
    initial: &Declaration,
    compliance: &ComplianceReport,
    confidences: Option<&BTreeMap<DeclarationField, FieldConfidence>>,
    catalog: &FieldCatalog,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut claimed: HashSet<DeclarationField> = HashSet::new();

    for field in DeclarationField::ALL {
        if !initial.is_missing(field) {
            continue;
        }
        claimed.insert(field);
        issues.push(Issue {
            field,
            kind: IssueKind::Missing,
            title: format!("Missing {}", catalog.label(field)),
            description: format!(
                "{} is required for customs processing.",
                catalog.label(field)
            ),
            hint: catalog.hint_or_generic(field).to_string(),
            check_index: None,
        });
    }

    for check in ComplianceCheck::ALL {
        if compliance.passed(check) {
            continue;
        }
        let description = compliance.description(check);
        if description.trim().is_empty() {
            continue;
        }
        // Document Completeness maps to no single field; failed checks that
        // cannot be attributed land on the goods description on purpose.
        let field = check.field().unwrap_or(DeclarationField::GoodsDescription);
        if !claimed.insert(field) {
            continue;
        }
        issues.push(Issue {
            field,
            kind: IssueKind::Invalid,
            title: catalog.check_name(check).to_string(),
            description: description.to_string(),
            hint: catalog.hint_or_generic(field).to_string(),
            check_index: Some(check.index()),
        });
    }

    if let Some(confidences) = confidences {
        for field in DeclarationField::ALL {
            let Some(entry) = confidences.get(&field) else {
                continue;
            };
            if !(entry.confidence < LOW_CONFIDENCE_THRESHOLD) || claimed.contains(&field) {
                continue;
            }
            claimed.insert(field);
            let percent = (entry.confidence * 100.0).round() as i64;
            issues.push(Issue {
                field,
                kind: IssueKind::LowConfidence,
                title: format!("Low Confidence: {}", catalog.label(field)),
                description: format!(
                    "{} was extracted with only {percent}% confidence.",
                    catalog.label(field)
                ),
                hint: catalog.hint_or_generic(field).to_string(),
                check_index: None,
            });
        }
    }

    issues
}
