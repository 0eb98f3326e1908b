//! Blending machine confidence with reviewer verification signal.

use crate::domain::confidence::ConfidenceScores;
use crate::domain::declaration::{Declaration, FIELD_COUNT};
use crate::review::issues::Issue;
use crate::review::resolution::ResolutionTracker;

/// Score deltas below this threshold do not produce an external
/// notification. Noise control only; the scores themselves are exact.
pub const NOTIFY_EPSILON: f64 = 0.001;

/// Derives adjusted confidence scores from the original machine scores and
/// the reviewer's resolution progress.
///
/// Human verification only ever raises confidence here; distrust is handled
/// upstream. The published scores are additionally held at a high-water mark
/// so that re-editing a field back to empty cannot walk a previously
/// reported score backwards.
#[derive(Clone, Debug)]
pub struct ConfidenceReconciler {
    original: ConfidenceScores,
    total_fields: usize,
    high_water: ConfidenceScores,
    last_notified: Option<ConfidenceScores>,
}

impl ConfidenceReconciler {
    pub fn new(original: ConfidenceScores) -> Self {
        Self::with_total_fields(original, FIELD_COUNT)
    }

    /// `total_fields` is the denominator of the extraction boost; it is the
    /// declaration schema size and only varies in tests.
    pub fn with_total_fields(original: ConfidenceScores, total_fields: usize) -> Self {
        let original = original.clamped();
        Self { original, total_fields: total_fields.max(1), high_water: original, last_notified: None }
    }

    pub fn original(&self) -> ConfidenceScores {
        self.original
    }

    /// Last published scores; equals the original scores until the first
    /// reviewer action.
    pub fn current(&self) -> ConfidenceScores {
        self.high_water
    }

    /// Raw convex blend toward 1.0, without the high-water hold. Pure.
    pub fn compute(
        &self,
        tracker: &ResolutionTracker,
        issues: &[Issue],
        live: &Declaration,
    ) -> ConfidenceScores {
        let signal = tracker.signal_count() as f64;
        let boost = signal / self.total_fields as f64;
        let extraction = blend(self.original.extraction, boost);

        let compliance = if issues.is_empty() {
            // No issues means nothing for the reviewer to resolve; the
            // original compliance score stands.
            self.original.compliance
        } else {
            let resolved = tracker.resolved_count(issues, live) as f64;
            blend(self.original.compliance, resolved / issues.len() as f64)
        };

        ConfidenceScores { extraction, compliance }
    }

    /// Recompute after a tracker mutation and advance the high-water mark.
    pub fn reconcile(
        &mut self,
        tracker: &ResolutionTracker,
        issues: &[Issue],
        live: &Declaration,
    ) -> ConfidenceScores {
        self.high_water = self.high_water.max(self.compute(tracker, issues, live));
        self.high_water
    }

    /// Like [`reconcile`](Self::reconcile), but also decides whether the new
    /// scores are worth telling the outside world about. Returns the scores
    /// and `true` when the delta against the last notification crosses
    /// [`NOTIFY_EPSILON`] (the first reconciliation always notifies).
    pub fn reconcile_and_flag(
        &mut self,
        tracker: &ResolutionTracker,
        issues: &[Issue],
        live: &Declaration,
    ) -> (ConfidenceScores, bool) {
        let scores = self.reconcile(tracker, issues, live);
        let notify = match self.last_notified {
            None => true,
            Some(previous) => {
                (scores.extraction - previous.extraction).abs() >= NOTIFY_EPSILON
                    || (scores.compliance - previous.compliance).abs() >= NOTIFY_EPSILON
            }
        };
        if notify {
            self.last_notified = Some(scores);
        }
        (scores, notify)
    }
}

fn blend(original: f64, boost: f64) -> f64 {
    (original + boost * (1.0 - original)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::{ConfidenceReconciler, NOTIFY_EPSILON};
    use crate::domain::confidence::ConfidenceScores;
    use crate::domain::declaration::{Declaration, DeclarationField};
    use crate::review::issues::{Issue, IssueKind};
    use crate::review::resolution::ResolutionTracker;

    fn issue(field: DeclarationField) -> Issue {
        Issue {
            field,
            kind: IssueKind::Missing,
            title: String::new(),
            description: String::new(),
            hint: String::new(),
            check_index: None,
        }
    }

    #[test]
    fn one_edit_boosts_extraction_by_a_seventh_of_the_remainder() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.8, 0.9));
        let mut tracker = ResolutionTracker::new();
        let mut live = Declaration::default();

        tracker.mark_edited(DeclarationField::HsCode);
        live.set_field(DeclarationField::HsCode, "854231");

        let scores = reconciler.reconcile(&tracker, &[], &live);
        let expected = 0.8 + (1.0 / 7.0) * 0.2;
        assert!((scores.extraction - expected).abs() < 1e-9);
    }

    #[test]
    fn no_issues_leaves_compliance_at_the_original_score() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.5, 0.72));
        let mut tracker = ResolutionTracker::new();
        tracker.mark_verified(DeclarationField::Shipper);

        let scores = reconciler.reconcile(&tracker, &[], &Declaration::default());
        assert_eq!(scores.compliance, 0.72);
    }

    #[test]
    fn resolving_every_issue_caps_compliance_at_one() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.5, 0.6));
        let mut tracker = ResolutionTracker::new();
        let live = Declaration::default();
        let issues = vec![issue(DeclarationField::Shipper), issue(DeclarationField::Value)];

        tracker.mark_verified(DeclarationField::Shipper);
        tracker.mark_verified(DeclarationField::Value);

        let scores = reconciler.reconcile(&tracker, &issues, &live);
        assert!((scores.compliance - 1.0).abs() < 1e-9);
        assert!(scores.compliance <= 1.0);
    }

    #[test]
    fn double_counted_signal_is_still_capped_at_one() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.9, 0.9));
        let mut tracker = ResolutionTracker::new();
        let mut live = Declaration::default();

        for field in DeclarationField::ALL {
            live.set_field(field, "x");
            tracker.mark_edited(field);
            tracker.mark_verified(field);
        }

        let scores = reconciler.reconcile(&tracker, &[], &live);
        assert_eq!(scores.extraction, 1.0);
    }

    #[test]
    fn high_water_mark_prevents_published_regression() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.4, 0.5));
        let mut tracker = ResolutionTracker::new();
        let mut live = Declaration::default();
        let issues = vec![issue(DeclarationField::HsCode)];

        tracker.mark_edited(DeclarationField::HsCode);
        live.set_field(DeclarationField::HsCode, "854231");
        let resolved = reconciler.reconcile(&tracker, &issues, &live);

        // Re-editing back to empty drops the raw compliance blend, but the
        // published score holds.
        live.set_field(DeclarationField::HsCode, "");
        let after_clear = reconciler.reconcile(&tracker, &issues, &live);

        assert!(after_clear.compliance >= resolved.compliance);
        assert!(after_clear.extraction >= resolved.extraction);
    }

    #[test]
    fn notifications_are_suppressed_below_epsilon() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.6, 0.7));
        let tracker = ResolutionTracker::new();
        let live = Declaration::default();

        let (_, first) = reconciler.reconcile_and_flag(&tracker, &[], &live);
        assert!(first, "first reconciliation always notifies");

        let (_, second) = reconciler.reconcile_and_flag(&tracker, &[], &live);
        assert!(!second, "unchanged scores stay quiet");
    }

    #[test]
    fn a_real_change_notifies_again() {
        let mut reconciler = ConfidenceReconciler::new(ConfidenceScores::new(0.6, 0.7));
        let mut tracker = ResolutionTracker::new();
        let live = Declaration::default();

        let (_, _) = reconciler.reconcile_and_flag(&tracker, &[], &live);
        tracker.mark_verified(DeclarationField::Shipper);
        let (scores, notified) = reconciler.reconcile_and_flag(&tracker, &[], &live);

        assert!(notified);
        assert!(scores.extraction > 0.6);
        assert!(scores.extraction - 0.6 >= NOTIFY_EPSILON);
    }

    #[test]
    fn original_scores_are_clamped_on_construction() {
        let reconciler = ConfidenceReconciler::new(ConfidenceScores::new(1.7, -0.3));
        assert_eq!(reconciler.original().extraction, 1.0);
        assert_eq!(reconciler.original().compliance, 0.0);
    }
}
