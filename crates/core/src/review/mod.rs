//! The human review engine: issue detection, resolution tracking,
//! confidence reconciliation, and the approval gate.

pub mod issues;
pub mod reconcile;
pub mod resolution;
pub mod session;

pub use issues::{detect_issues, Issue, IssueKind, LOW_CONFIDENCE_THRESHOLD};
pub use reconcile::{ConfidenceReconciler, NOTIFY_EPSILON};
pub use resolution::ResolutionTracker;
pub use session::{
    ApprovalBlockers, ApprovalDecision, ReturnPacket, ReturnReason, ReviewInputs, ReviewPacket,
    ReviewSession, ReviewState,
};
