//! Dual-LLM quarantine protocol
//!
//! When a tool result is classified untrusted, a main agent (which never
//! sees the raw payload) interrogates a quarantined agent (which sees the
//! payload but can only answer by option index) through a bounded Q&A
//! exchange. The resulting summary, never the payload, substitutes for
//! the tool output in the conversation.

pub mod coordinator;
pub mod prompts;
pub mod protocol;

use serde::{Deserialize, Serialize};

pub use coordinator::QuarantineCoordinator;
pub use protocol::{
    advance, parse_answer_index, parse_main_action, MainAgentAction, ProtocolEvent, ProtocolState,
};

/// One completed question/answer round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRound {
    /// Question the main agent asked
    pub question: String,
    /// Options offered to the quarantined agent
    pub options: Vec<String>,
    /// Index the quarantined agent selected
    pub answer_index: usize,
    /// The selected option text
    pub answer: String,
}

/// One completed quarantine run, retained for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualLlmResult {
    /// The tool call whose result was quarantined
    pub tool_call_id: String,
    /// The sanitized summary substituted for the raw payload
    pub result: String,
    /// Ordered transcript of Q&A rounds
    pub conversations: Vec<QaRound>,
}
