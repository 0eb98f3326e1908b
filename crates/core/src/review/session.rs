//! The review session: one document, one reviewer, one frozen issue list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::catalog::FieldCatalog;
use crate::domain::confidence::{ConfidenceScores, FieldConfidence};
use crate::domain::declaration::{Declaration, DeclarationField};
use crate::errors::{ContractError, SessionError};
use crate::pipeline::{ComplianceOutput, ComplianceReport, ExtractionOutput};
use crate::review::issues::{detect_issues, Issue};
use crate::review::reconcile::ConfidenceReconciler;
use crate::review::resolution::ResolutionTracker;

/// Session lifecycle. `Reviewing` is the only state that accepts mutations;
/// the other three are terminal for this engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Reviewing,
    Approved,
    Draft,
    ReturnedToAutomation,
}

impl ReviewState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Reviewing)
    }
}

/// Why a declaration goes back to the automated pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    ExtractionUnusable,
    WrongDocumentType,
    NeedsReprocessing,
    Other,
}

/// What currently blocks approval. Never an error: the caller renders this
/// as a disabled affordance with a remaining-work count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApprovalBlockers {
    /// Fields empty after trimming, in schema order.
    pub missing_fields: Vec<DeclarationField>,
    pub notes_missing: bool,
}

impl ApprovalBlockers {
    pub fn blocking_count(&self) -> usize {
        self.missing_fields.len() + usize::from(self.notes_missing)
    }

    pub fn is_clear(&self) -> bool {
        self.blocking_count() == 0
    }
}

/// Result of an approval attempt against a live session.
#[derive(Clone, Debug, PartialEq)]
pub enum ApprovalDecision {
    Approved(ReviewPacket),
    /// Guard failed; the session state did not change.
    Blocked(ApprovalBlockers),
}

/// Payload handed downstream on approval or draft save.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewPacket {
    pub document_id: String,
    pub declaration: Declaration,
    pub reviewer_notes: String,
}

/// Payload handed back to the automated pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnPacket {
    pub document_id: String,
    pub reason: ReturnReason,
    pub comment: String,
}

/// Everything the upstream stages supply when a review opens.
#[derive(Clone, Debug)]
pub struct ReviewInputs {
    pub document_id: String,
    pub declaration: Declaration,
    pub field_confidences: Option<BTreeMap<DeclarationField, FieldConfidence>>,
    pub extraction_confidence: f64,
    pub compliance: ComplianceReport,
    pub compliance_confidence: f64,
}

impl ReviewInputs {
    /// Bridge from the raw pipeline payloads.
    pub fn from_pipeline(
        extraction: &ExtractionOutput,
        compliance: &ComplianceOutput,
    ) -> Result<Self, ContractError> {
        Ok(Self {
            document_id: extraction.document_id.clone(),
            declaration: extraction.structured_data.clone(),
            field_confidences: extraction.field_confidences(),
            extraction_confidence: extraction.structure_confidence,
            compliance: compliance.report()?,
            compliance_confidence: compliance.compliance_confidence,
        })
    }
}

/// One human review of one declaration.
///
/// The issue list is computed from the declaration snapshot at construction
/// and never again; that ordering barrier is what keeps findings stable on
/// screen while the reviewer edits. The live declaration diverges from the
/// snapshot as edits land.
#[derive(Clone, Debug)]
pub struct ReviewSession {
    id: Uuid,
    document_id: String,
    opened_at: DateTime<Utc>,
    state: ReviewState,
    snapshot: Declaration,
    live: Declaration,
    issues: Vec<Issue>,
    tracker: ResolutionTracker,
    reconciler: ConfidenceReconciler,
    notes: String,
}

impl ReviewSession {
    pub fn open(inputs: ReviewInputs, catalog: &FieldCatalog) -> Self {
        // The one-time detection run. Everything downstream interprets
        // resolution against this frozen list.
        let issues = detect_issues(
            &inputs.declaration,
            &inputs.compliance,
            inputs.field_confidences.as_ref(),
            catalog,
        );
        let original =
            ConfidenceScores::new(inputs.extraction_confidence, inputs.compliance_confidence);

        Self {
            id: Uuid::new_v4(),
            document_id: inputs.document_id,
            opened_at: Utc::now(),
            state: ReviewState::Reviewing,
            snapshot: inputs.declaration.clone(),
            live: inputs.declaration,
            issues,
            tracker: ResolutionTracker::new(),
            reconciler: ConfidenceReconciler::new(original),
            notes: String::new(),
        }
    }

    pub fn open_with_audit<S: AuditSink>(
        inputs: ReviewInputs,
        catalog: &FieldCatalog,
        sink: &S,
    ) -> Self {
        let session = Self::open(inputs, catalog);
        sink.emit(
            session
                .event("review.session_opened", AuditCategory::Session, AuditOutcome::Success)
                .with_metadata("issue_count", session.issues.len().to_string()),
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    /// The frozen issue list, in detection order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn live(&self) -> &Declaration {
        &self.live
    }

    /// The declaration as it arrived from the pipeline.
    pub fn snapshot(&self) -> &Declaration {
        &self.snapshot
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn is_issue_resolved(&self, issue: &Issue) -> bool {
        self.tracker.is_resolved(issue, &self.live)
    }

    pub fn resolved_issue_count(&self) -> usize {
        self.tracker.resolved_count(&self.issues, &self.live)
    }

    pub fn open_issue_count(&self) -> usize {
        self.issues.len() - self.resolved_issue_count()
    }

    /// Current adjusted scores (original scores until the first action).
    pub fn scores(&self) -> ConfidenceScores {
        self.reconciler.current()
    }

    pub fn original_scores(&self) -> ConfidenceScores {
        self.reconciler.original()
    }

    /// Record an edit: permanent tracker membership plus the live value.
    pub fn edit_field(
        &mut self,
        field: DeclarationField,
        value: impl Into<String>,
    ) -> Result<ConfidenceScores, SessionError> {
        self.ensure_reviewing()?;
        self.live.set_field(field, value);
        self.tracker.mark_edited(field);
        Ok(self.reconciler.reconcile(&self.tracker, &self.issues, &self.live))
    }

    /// Record an explicit "extracted value is fine" verification.
    pub fn verify_field(
        &mut self,
        field: DeclarationField,
    ) -> Result<ConfidenceScores, SessionError> {
        self.ensure_reviewing()?;
        self.tracker.mark_verified(field);
        Ok(self.reconciler.reconcile(&self.tracker, &self.issues, &self.live))
    }

    pub fn edit_field_with_audit<S: AuditSink>(
        &mut self,
        field: DeclarationField,
        value: impl Into<String>,
        sink: &S,
    ) -> Result<ConfidenceScores, SessionError> {
        self.ensure_reviewing()?;
        self.live.set_field(field, value);
        self.tracker.mark_edited(field);
        sink.emit(
            self.event("review.field_edited", AuditCategory::Field, AuditOutcome::Success)
                .with_metadata("field", field.wire_name()),
        );
        Ok(self.reconcile_with_audit(sink))
    }

    pub fn verify_field_with_audit<S: AuditSink>(
        &mut self,
        field: DeclarationField,
        sink: &S,
    ) -> Result<ConfidenceScores, SessionError> {
        self.ensure_reviewing()?;
        self.tracker.mark_verified(field);
        sink.emit(
            self.event("review.field_verified", AuditCategory::Field, AuditOutcome::Success)
                .with_metadata("field", field.wire_name()),
        );
        Ok(self.reconcile_with_audit(sink))
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_reviewing()?;
        self.notes = notes.into();
        Ok(())
    }

    /// What would block approval right now.
    pub fn approval_blockers(&self) -> ApprovalBlockers {
        ApprovalBlockers {
            missing_fields: self.live.missing_fields(),
            notes_missing: self.notes.trim().is_empty(),
        }
    }

    pub fn can_approve(&self) -> bool {
        self.state == ReviewState::Reviewing && self.approval_blockers().is_clear()
    }

    /// Attempt the `Reviewing -> Approved` transition. A failed guard is a
    /// decline carrying the blockers, not an error, and leaves the state
    /// untouched.
    pub fn approve(&mut self) -> Result<ApprovalDecision, SessionError> {
        self.ensure_reviewing()?;
        let blockers = self.approval_blockers();
        if !blockers.is_clear() {
            return Ok(ApprovalDecision::Blocked(blockers));
        }

        self.state = ReviewState::Approved;
        Ok(ApprovalDecision::Approved(self.packet()))
    }

    pub fn approve_with_audit<S: AuditSink>(
        &mut self,
        sink: &S,
    ) -> Result<ApprovalDecision, SessionError> {
        let decision = self.approve()?;
        match &decision {
            ApprovalDecision::Approved(_) => sink.emit(
                self.event("review.approved", AuditCategory::Disposition, AuditOutcome::Success)
                    .with_metadata("resolved_issues", self.resolved_issue_count().to_string())
                    .with_metadata("total_issues", self.issues.len().to_string()),
            ),
            ApprovalDecision::Blocked(blockers) => sink.emit(
                self.event(
                    "review.approve_declined",
                    AuditCategory::Disposition,
                    AuditOutcome::Declined,
                )
                .with_metadata("blocking_count", blockers.blocking_count().to_string()),
            ),
        }
        Ok(decision)
    }

    /// `Reviewing -> Draft`: always permitted, nothing is locked.
    pub fn save_draft(&mut self) -> Result<ReviewPacket, SessionError> {
        self.ensure_reviewing()?;
        self.state = ReviewState::Draft;
        Ok(self.packet())
    }

    pub fn save_draft_with_audit<S: AuditSink>(
        &mut self,
        sink: &S,
    ) -> Result<ReviewPacket, SessionError> {
        let packet = self.save_draft()?;
        sink.emit(self.event(
            "review.draft_saved",
            AuditCategory::Disposition,
            AuditOutcome::Success,
        ));
        Ok(packet)
    }

    /// `Reviewing -> ReturnedToAutomation`: requires a reason code; the
    /// comment is optional free text.
    pub fn return_to_automation(
        &mut self,
        reason: ReturnReason,
        comment: impl Into<String>,
    ) -> Result<ReturnPacket, SessionError> {
        self.ensure_reviewing()?;
        self.state = ReviewState::ReturnedToAutomation;
        Ok(ReturnPacket {
            document_id: self.document_id.clone(),
            reason,
            comment: comment.into(),
        })
    }

    pub fn return_to_automation_with_audit<S: AuditSink>(
        &mut self,
        reason: ReturnReason,
        comment: impl Into<String>,
        sink: &S,
    ) -> Result<ReturnPacket, SessionError> {
        let packet = self.return_to_automation(reason, comment)?;
        sink.emit(
            self.event("review.returned", AuditCategory::Disposition, AuditOutcome::Success)
                .with_metadata("reason", format!("{:?}", packet.reason)),
        );
        Ok(packet)
    }

    fn ensure_reviewing(&self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::SessionClosed { state: self.state });
        }
        Ok(())
    }

    fn packet(&self) -> ReviewPacket {
        ReviewPacket {
            document_id: self.document_id.clone(),
            declaration: self.live.clone(),
            reviewer_notes: self.notes.clone(),
        }
    }

    fn reconcile_with_audit<S: AuditSink>(&mut self, sink: &S) -> ConfidenceScores {
        let (scores, notify) =
            self.reconciler.reconcile_and_flag(&self.tracker, &self.issues, &self.live);
        if notify {
            sink.emit(
                self.event(
                    "review.confidence_adjusted",
                    AuditCategory::Confidence,
                    AuditOutcome::Success,
                )
                .with_metadata("extraction", format!("{:.4}", scores.extraction))
                .with_metadata("compliance", format!("{:.4}", scores.compliance)),
            );
        }
        scores
    }

    fn event(
        &self,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent::new(self.document_id.clone(), self.id, event_type, category, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{ApprovalDecision, ReturnReason, ReviewInputs, ReviewSession, ReviewState};
    use crate::audit::InMemoryAuditSink;
    use crate::catalog::FieldCatalog;
    use crate::domain::declaration::{Declaration, DeclarationField};
    use crate::errors::SessionError;
    use crate::pipeline::ComplianceReport;
    use crate::review::issues::IssueKind;

    fn filled() -> Declaration {
        Declaration {
            shipper: "Acme Export GmbH, Hamburg".to_string(),
            receiver: "Nordic Imports AS, Oslo".to_string(),
            goods_description: "Integrated circuits".to_string(),
            value: "USD 12,400".to_string(),
            country_of_origin: "Germany".to_string(),
            hs_code: "854231".to_string(),
            weight: "18.2 kg".to_string(),
        }
    }

    fn inputs(declaration: Declaration, compliance: ComplianceReport) -> ReviewInputs {
        ReviewInputs {
            document_id: "doc-1".to_string(),
            declaration,
            field_confidences: None,
            extraction_confidence: 0.8,
            compliance,
            compliance_confidence: 0.85,
        }
    }

    fn open(declaration: Declaration, compliance: ComplianceReport) -> ReviewSession {
        ReviewSession::open(inputs(declaration, compliance), &FieldCatalog::default())
    }

    #[test]
    fn issue_list_is_frozen_at_open() {
        let mut declaration = filled();
        declaration.hs_code.clear();
        let mut session = open(declaration, ComplianceReport::all_passing());

        assert_eq!(session.issues().len(), 1);
        session.edit_field(DeclarationField::HsCode, "854231").expect("session is live");

        // The fix resolves the issue; it does not remove it.
        assert_eq!(session.issues().len(), 1);
        assert!(session.is_issue_resolved(&session.issues()[0].clone()));
        assert_eq!(session.open_issue_count(), 0);
    }

    #[test]
    fn approval_is_blocked_until_fields_and_notes_are_complete() {
        let mut declaration = filled();
        declaration.hs_code.clear();
        let mut session = open(declaration, ComplianceReport::all_passing());

        let blocked = session.approve().expect("session is live");
        let ApprovalDecision::Blocked(blockers) = blocked else {
            panic!("approval must be blocked");
        };
        assert_eq!(blockers.missing_fields, vec![DeclarationField::HsCode]);
        assert!(blockers.notes_missing);
        assert_eq!(blockers.blocking_count(), 2);
        assert_eq!(session.state(), ReviewState::Reviewing);

        session.edit_field(DeclarationField::HsCode, "854231").expect("session is live");
        session.set_notes("Checked HS code against invoice.").expect("session is live");

        let decision = session.approve().expect("session is live");
        let ApprovalDecision::Approved(packet) = decision else {
            panic!("approval must pass once the guard clears");
        };
        assert_eq!(packet.declaration.hs_code, "854231");
        assert_eq!(packet.reviewer_notes, "Checked HS code against invoice.");
        assert_eq!(session.state(), ReviewState::Approved);
    }

    #[test]
    fn blocked_approval_is_a_no_op() {
        let mut session = open(filled(), ComplianceReport::all_passing());
        // Notes are empty, so the guard fails.
        let decision = session.approve().expect("session is live");
        assert!(matches!(decision, ApprovalDecision::Blocked(_)));
        assert_eq!(session.state(), ReviewState::Reviewing);
        assert!(!session.can_approve());
    }

    #[test]
    fn draft_save_needs_no_guard() {
        let mut declaration = filled();
        declaration.weight.clear();
        let mut session = open(declaration, ComplianceReport::all_passing());

        let packet = session.save_draft().expect("draft is always permitted");
        assert!(packet.declaration.weight.is_empty());
        assert_eq!(session.state(), ReviewState::Draft);
    }

    #[test]
    fn return_to_automation_carries_reason_and_comment() {
        let mut session = open(filled(), ComplianceReport::all_passing());
        let packet = session
            .return_to_automation(ReturnReason::WrongDocumentType, "This is an invoice.")
            .expect("session is live");

        assert_eq!(packet.reason, ReturnReason::WrongDocumentType);
        assert_eq!(packet.comment, "This is an invoice.");
        assert_eq!(session.state(), ReviewState::ReturnedToAutomation);
    }

    #[test]
    fn terminal_sessions_decline_further_mutation() {
        let mut session = open(filled(), ComplianceReport::all_passing());
        session.save_draft().expect("draft is always permitted");

        let error = session
            .edit_field(DeclarationField::Weight, "20 kg")
            .expect_err("closed sessions decline edits");
        assert_eq!(error, SessionError::SessionClosed { state: ReviewState::Draft });

        assert!(session.verify_field(DeclarationField::Weight).is_err());
        assert!(session.set_notes("too late").is_err());
        assert!(session.approve().is_err());
        assert!(session.save_draft().is_err());
        assert!(session.return_to_automation(ReturnReason::Other, "").is_err());
    }

    #[test]
    fn verify_resolves_a_low_confidence_style_issue_without_editing() {
        let report = ComplianceReport::new(
            vec![false, true, true, true, true],
            vec!["HS code chapter does not match goods".to_string()],
        )
        .expect("valid shape");
        let mut session = open(filled(), report);

        assert_eq!(session.issues().len(), 1);
        assert_eq!(session.issues()[0].kind, IssueKind::Invalid);

        session.verify_field(DeclarationField::HsCode).expect("session is live");
        assert_eq!(session.resolved_issue_count(), 1);
    }

    #[test]
    fn scores_start_at_the_original_machine_scores() {
        let session = open(filled(), ComplianceReport::all_passing());
        assert_eq!(session.scores(), session.original_scores());
        assert_eq!(session.scores().extraction, 0.8);
    }

    #[test]
    fn audited_session_emits_lifecycle_events() {
        let sink = InMemoryAuditSink::default();
        let mut declaration = filled();
        declaration.hs_code.clear();

        let mut session = ReviewSession::open_with_audit(
            inputs(declaration, ComplianceReport::all_passing()),
            &FieldCatalog::default(),
            &sink,
        );
        session
            .edit_field_with_audit(DeclarationField::HsCode, "854231", &sink)
            .expect("session is live");
        session.set_notes("ok").expect("session is live");
        session.approve_with_audit(&sink).expect("session is live");

        assert_eq!(sink.events_of_type("review.session_opened").len(), 1);
        assert_eq!(sink.events_of_type("review.field_edited").len(), 1);
        assert_eq!(sink.events_of_type("review.confidence_adjusted").len(), 1);
        assert_eq!(sink.events_of_type("review.approved").len(), 1);

        let opened = &sink.events_of_type("review.session_opened")[0];
        assert_eq!(opened.metadata.get("issue_count").map(String::as_str), Some("1"));
    }

    #[test]
    fn redundant_adjustments_do_not_spam_the_sink() {
        let sink = InMemoryAuditSink::default();
        let mut session = ReviewSession::open_with_audit(
            inputs(filled(), ComplianceReport::all_passing()),
            &FieldCatalog::default(),
            &sink,
        );

        session
            .verify_field_with_audit(DeclarationField::Shipper, &sink)
            .expect("session is live");
        // Same field again: tracker sets are idempotent, scores unchanged.
        session
            .verify_field_with_audit(DeclarationField::Shipper, &sink)
            .expect("session is live");

        assert_eq!(sink.events_of_type("review.field_verified").len(), 2);
        assert_eq!(sink.events_of_type("review.confidence_adjusted").len(), 1);
    }
}
