//! Redaction of blocked tool results
//!
//! Blocked tool results must not reach the model, but the message itself
//! has to stay in place: providers reject a conversation where a tool call
//! has no corresponding result message. Redaction therefore substitutes
//! the content with a fixed-format placeholder and preserves the message's
//! position and `tool_call_id`.

use crate::message::Message;
use crate::trust::BlockedToolResult;

/// Build the redaction placeholder for a block reason.
fn placeholder(reason: Option<&str>) -> String {
    format!(
        "[REDACTED: Data blocked by policy: {}]",
        reason.unwrap_or("blocked by policy")
    )
}

/// Replace the content of every blocked tool result message.
///
/// Idempotent: the placeholder is a pure function of the block entry, so
/// redacting an already-redacted message set yields the same result.
pub fn redact_blocked(messages: Vec<Message>, blocked: &[BlockedToolResult]) -> Vec<Message> {
    if blocked.is_empty() {
        return messages;
    }

    messages
        .into_iter()
        .map(|message| match message {
            Message::Tool {
                tool_call_id,
                content,
            } => {
                let entry = blocked.iter().find(|b| b.tool_call_id == tool_call_id);
                match entry {
                    Some(entry) => Message::Tool {
                        tool_call_id,
                        content: placeholder(entry.reason.as_deref()),
                    },
                    None => Message::Tool {
                        tool_call_id,
                        content,
                    },
                }
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(tool_call_id: &str, reason: &str) -> BlockedToolResult {
        BlockedToolResult {
            tool_call_id: tool_call_id.to_string(),
            reason: Some(reason.to_string()),
        }
    }

    #[test]
    fn test_redacts_blocked_tool_result() {
        let messages = vec![
            Message::user("look this up"),
            Message::tool_result("call_1", "malicious payload"),
        ];
        let redacted = redact_blocked(messages, &[blocked("call_1", "Injection marker")]);

        assert_eq!(redacted.len(), 2);
        match &redacted[1] {
            Message::Tool {
                tool_call_id,
                content,
            } => {
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(
                    content,
                    "[REDACTED: Data blocked by policy: Injection marker]"
                );
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_unblocked_messages_untouched() {
        let messages = vec![
            Message::user("hello"),
            Message::tool_result("call_ok", "fine data"),
        ];
        let redacted = redact_blocked(messages.clone(), &[blocked("call_other", "reason")]);
        assert_eq!(redacted, messages);
    }

    #[test]
    fn test_empty_blocked_list_is_a_passthrough() {
        let messages = vec![Message::tool_result("call_1", "data")];
        let redacted = redact_blocked(messages.clone(), &[]);
        assert_eq!(redacted, messages);
    }

    #[test]
    fn test_redaction_is_idempotent() {
        let messages = vec![
            Message::tool_result("call_1", "payload"),
            Message::tool_result("call_2", "other payload"),
        ];
        let blocked_list = vec![blocked("call_1", "Bad source")];

        let once = redact_blocked(messages, &blocked_list);
        let twice = redact_blocked(once.clone(), &blocked_list);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_reason_uses_generic_placeholder() {
        let messages = vec![Message::tool_result("call_1", "payload")];
        let blocked_list = vec![BlockedToolResult {
            tool_call_id: "call_1".to_string(),
            reason: None,
        }];

        let redacted = redact_blocked(messages, &blocked_list);
        match &redacted[0] {
            Message::Tool { content, .. } => {
                assert_eq!(content, "[REDACTED: Data blocked by policy: blocked by policy]");
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_message_count_and_order_preserved() {
        let messages = vec![
            Message::user("a"),
            Message::tool_result("call_1", "x"),
            Message::assistant("b"),
            Message::tool_result("call_2", "y"),
        ];
        let redacted = redact_blocked(messages, &[blocked("call_2", "r")]);
        assert_eq!(redacted.len(), 4);
        assert_eq!(redacted[0], Message::user("a"));
        assert_eq!(redacted[2], Message::assistant("b"));
        assert_eq!(redacted[3].tool_call_id(), Some("call_2"));
    }
}
