//! Session-scoped audit trail. The sink is the seam through which the
//! surrounding application observes a review session; the core itself does
//! no logging.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Session,
    Field,
    Confidence,
    Disposition,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Declined,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub document_id: String,
    pub session_id: Uuid,
    pub event_type: String,
    pub category: AuditCategory,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        document_id: impl Into<String>,
        session_id: Uuid,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            session_id,
            event_type: event_type.into(),
            category,
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| event.event_type == event_type).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};

    #[test]
    fn in_memory_sink_records_events_with_session_identity() {
        let sink = InMemoryAuditSink::default();
        let session_id = Uuid::new_v4();

        sink.emit(
            AuditEvent::new(
                "doc-42",
                session_id,
                "review.field_edited",
                AuditCategory::Field,
                AuditOutcome::Success,
            )
            .with_metadata("field", "hsCode"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].document_id, "doc-42");
        assert_eq!(events[0].session_id, session_id);
        assert_eq!(events[0].metadata.get("field").map(String::as_str), Some("hsCode"));
    }

    #[test]
    fn events_of_type_filters_by_event_type() {
        let sink = InMemoryAuditSink::default();
        let session_id = Uuid::new_v4();
        for event_type in ["review.field_edited", "review.field_verified", "review.field_edited"] {
            sink.emit(AuditEvent::new(
                "doc-1",
                session_id,
                event_type,
                AuditCategory::Field,
                AuditOutcome::Success,
            ));
        }

        assert_eq!(sink.events_of_type("review.field_edited").len(), 2);
        assert_eq!(sink.events_of_type("review.approved").len(), 0);
    }
}
