//! Audit trail for policy decisions
//!
//! Every block verdict (invocation denial, result classification,
//! quarantine fallback, redaction) generates a structured audit event so
//! each decision is traceable to its reason after the fact.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Severity level of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Informational (e.g. allow decision of interest)
    Info,
    /// Warning (e.g. untrusted data classified and contained)
    Warning,
    /// High (e.g. tool call blocked by policy)
    High,
}

/// The stage of the pipeline that produced the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    /// Tool invocation policy engine
    ToolInvocation,
    /// Trusted data classifier
    ToolResult,
    /// Dual-LLM quarantine protocol
    Quarantine,
    /// Redaction pass
    Redaction,
}

/// A structured audit event for a gate decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique event ID
    pub id: String,
    /// Conversation that triggered the event
    pub conversation_id: Uuid,
    /// Severity level
    pub severity: AuditSeverity,
    /// Pipeline stage
    pub stage: GateStage,
    /// Human-readable description
    pub description: String,
    /// Timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(
        conversation_id: Uuid,
        severity: AuditSeverity,
        stage: GateStage,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            severity,
            stage,
            description,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// In-memory audit log with bounded capacity
///
/// Stores recent gate decisions for querying. Durable forwarding is the
/// embedding service's concern.
#[derive(Debug)]
pub struct AuditLog {
    /// Bounded event buffer
    events: VecDeque<AuditEvent>,
    /// Maximum number of events to retain
    capacity: usize,
    /// Total events recorded (including evicted)
    total_count: u64,
}

impl AuditLog {
    /// Create a new audit log with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_count: 0,
        }
    }

    /// Record an audit event
    pub fn record(&mut self, event: AuditEvent) {
        tracing::warn!(
            conversation_id = %event.conversation_id,
            severity = ?event.severity,
            stage = ?event.stage,
            "Gate audit: {}",
            event.description
        );

        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_count += 1;
    }

    /// Get recent events (newest first)
    pub fn recent(&self, limit: usize) -> Vec<&AuditEvent> {
        self.events.iter().rev().take(limit).collect()
    }

    /// Get events for a specific conversation
    pub fn by_conversation(&self, conversation_id: Uuid) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.conversation_id == conversation_id)
            .collect()
    }

    /// Total events recorded, including those evicted from the buffer
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(conversation_id: Uuid, description: &str) -> AuditEvent {
        AuditEvent::new(
            conversation_id,
            AuditSeverity::High,
            GateStage::ToolInvocation,
            description.to_string(),
        )
    }

    #[test]
    fn test_record_and_recent() {
        let mut log = AuditLog::new(10);
        let cid = Uuid::new_v4();
        log.record(event(cid, "first"));
        log.record(event(cid, "second"));

        let recent = log.recent(5);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "second");
        assert_eq!(recent[1].description, "first");
    }

    #[test]
    fn test_capacity_eviction() {
        let mut log = AuditLog::new(2);
        let cid = Uuid::new_v4();
        log.record(event(cid, "a"));
        log.record(event(cid, "b"));
        log.record(event(cid, "c"));

        assert_eq!(log.recent(10).len(), 2);
        assert_eq!(log.total_count(), 3);
        assert_eq!(log.recent(10)[0].description, "c");
    }

    #[test]
    fn test_by_conversation_filters() {
        let mut log = AuditLog::new(10);
        let cid1 = Uuid::new_v4();
        let cid2 = Uuid::new_v4();
        log.record(event(cid1, "one"));
        log.record(event(cid2, "two"));

        let events = log.by_conversation(cid1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].description, "one");
    }

    #[test]
    fn test_event_serialization_camel_case() {
        let e = event(Uuid::new_v4(), "blocked");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"conversationId\""));
        assert!(json.contains("\"tool_invocation\""));
    }
}
