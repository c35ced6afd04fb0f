//! Trust ledger
//!
//! Per-conversation trust state is never stored as a mutable flag: it is a
//! pure fold over the append-only interaction log, so it can never drift
//! from the record. A conversation is trusted iff no contained interaction
//! is marked untrusted, which holds vacuously for an empty conversation.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded turn of a conversation
///
/// Append-only: never mutated after creation. Carries the trust verdict
/// assigned when the turn was recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Unique interaction id
    pub id: Uuid,
    /// Owning conversation
    pub conversation_id: Uuid,
    /// The message content
    pub content: Message,
    /// Whether this turn is trusted
    pub trusted: bool,
    /// Whether this turn's content is blocked from the model's view
    pub blocked: bool,
    /// Reason for an untrusted/blocked verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Creation timestamp (milliseconds since epoch)
    pub created_at: i64,
}

impl Interaction {
    /// Record a new interaction.
    ///
    /// A blocked interaction is untrusted by construction; passing
    /// `trusted = true` with `blocked = true` is corrected here rather
    /// than allowed to violate the invariant.
    pub fn new(
        conversation_id: Uuid,
        content: Message,
        trusted: bool,
        blocked: bool,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            content,
            trusted: trusted && !blocked,
            blocked,
            reason,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Record a trusted interaction with no verdict attached.
    pub fn trusted(conversation_id: Uuid, content: Message) -> Self {
        Self::new(conversation_id, content, true, false, None)
    }
}

/// A blocked tool result, as surfaced to the redaction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedToolResult {
    /// The tool call whose result was blocked
    pub tool_call_id: String,
    /// Reason recorded with the block verdict
    pub reason: Option<String>,
}

/// Whether a conversation is trusted: true iff no interaction is untrusted.
pub fn is_trusted(interactions: &[Interaction]) -> bool {
    interactions.iter().all(|i| i.trusted)
}

/// All blocked tool results in a conversation, in log order.
///
/// Only role-"tool" interactions participate; blocked user or assistant
/// turns affect trust but have nothing to redact.
pub fn blocked_tool_results(interactions: &[Interaction]) -> Vec<BlockedToolResult> {
    interactions
        .iter()
        .filter(|i| i.blocked)
        .filter_map(|i| match &i.content {
            Message::Tool { tool_call_id, .. } => Some(BlockedToolResult {
                tool_call_id: tool_call_id.clone(),
                reason: i.reason.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Resolve the tool name for a tool call id from the interaction log.
///
/// Tool result messages carry only the call id; the name lives on the
/// assistant message that issued the call. Scans newest-first so the most
/// recent issuing turn wins.
pub fn tool_name_for_call(interactions: &[Interaction], tool_call_id: &str) -> Option<String> {
    interactions.iter().rev().find_map(|i| match &i.content {
        Message::Assistant { tool_calls, .. } => tool_calls
            .iter()
            .find(|c| c.id == tool_call_id)
            .map(|c| c.name.clone()),
        _ => None,
    })
}
