pub mod audit;
pub mod catalog;
pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod review;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use catalog::{CatalogError, FieldCatalog};
pub use domain::confidence::{ConfidenceScores, FieldConfidence};
pub use domain::declaration::{Declaration, DeclarationField, FIELD_COUNT};
pub use errors::{ContractError, SessionError};
pub use pipeline::{
    ComplianceCheck, ComplianceOutput, ComplianceReport, ExtractionOutput, RiskLevel, CHECK_COUNT,
};
pub use review::{
    detect_issues, ApprovalBlockers, ApprovalDecision, ConfidenceReconciler, Issue, IssueKind,
    ResolutionTracker, ReturnPacket, ReturnReason, ReviewInputs, ReviewPacket, ReviewSession,
    ReviewState, LOW_CONFIDENCE_THRESHOLD, NOTIFY_EPSILON,
};
