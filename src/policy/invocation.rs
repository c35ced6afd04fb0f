//! Tool invocation policy engine
//!
//! Decides whether a candidate tool call may proceed, given the tool's
//! policies and the conversation's trust state. Block rules are evaluated
//! first and short-circuit; allow rules only matter once the context is
//! untrusted and the tool carries no override.
//!
//! Missing-argument handling is deliberately asymmetric: a block rule
//! whose argument is absent is skipped (absence of a signal must not block
//! unrelated calls), while an allow rule whose argument is absent fails
//! closed (that rule is the only thing keeping an untrusted-context call
//! alive).

use crate::config::UnknownToolPolicy;
use crate::error::{Error, Result};
use crate::policy::operator::Operator;
use crate::policy::path;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Action taken when an invocation policy matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// Block the call whenever the rule matches, regardless of trust state
    BlockAlways,
    /// Permit the call in untrusted context when the rule matches
    AllowWhenContextIsUntrusted,
}

/// A rule gating invocations of one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationPolicy {
    /// Unique policy id
    pub id: Uuid,
    /// Tool this policy is scoped to
    pub tool_name: String,
    /// Dotted path into the call arguments
    pub argument_name: String,
    /// Comparison operator
    pub operator: Operator,
    /// Comparison operand
    pub value: String,
    /// Action when the rule matches
    pub action: PolicyAction,
    /// Reason attached to a block verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Creation timestamp (milliseconds since epoch); evaluation order
    pub created_at: i64,
}

impl ToolInvocationPolicy {
    /// Create a policy, validating the argument path and operator operand.
    ///
    /// Invalid regex patterns and malformed paths are rejected here, at
    /// the write boundary, so evaluation never sees them.
    pub fn new(
        tool_name: impl Into<String>,
        argument_name: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
        action: PolicyAction,
        reason: Option<String>,
    ) -> Result<Self> {
        let argument_name = argument_name.into();
        let value = value.into();
        path::validate(&argument_name)?;
        operator.validate_operand(&value)?;
        Ok(Self {
            id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            argument_name,
            operator,
            value,
            action,
            reason,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// Verdict of an invocation evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationDecision {
    /// Whether the call may proceed
    pub is_allowed: bool,
    /// Reason for a block; empty for allows
    pub reason: String,
}

impl InvocationDecision {
    fn allowed() -> Self {
        Self {
            is_allowed: true,
            reason: String::new(),
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            is_allowed: false,
            reason: reason.into(),
        }
    }
}

/// Evaluate a candidate tool call.
///
/// `tool` is `None` when no registration exists for the call's tool name;
/// `unknown_tool_policy` decides that case. `policies` must already be
/// scoped to the tool and ordered by creation.
pub fn evaluate(
    tool: Option<&Tool>,
    policies: &[ToolInvocationPolicy],
    arguments: &Value,
    context_is_trusted: bool,
    unknown_tool_policy: UnknownToolPolicy,
) -> InvocationDecision {
    let tool = match tool {
        Some(tool) => tool,
        None => {
            return match unknown_tool_policy {
                UnknownToolPolicy::Allow => InvocationDecision::allowed(),
                UnknownToolPolicy::Deny => InvocationDecision::blocked(
                    "Tool invocation blocked: tool is not registered".to_string(),
                ),
            };
        }
    };

    // Block rules run first and short-circuit, before any trust check.
    for policy in policies
        .iter()
        .filter(|p| p.action == PolicyAction::BlockAlways)
    {
        let actual = match path::lookup(arguments, &policy.argument_name) {
            // A block rule does not fire on absent data.
            None => continue,
            Some(actual) => actual,
        };
        if policy.operator.matches(actual, &policy.value) {
            let reason = policy
                .reason
                .clone()
                .unwrap_or_else(|| "Blocked by tool invocation policy".to_string());
            return InvocationDecision::blocked(format!("Tool invocation blocked: {}", reason));
        }
    }

    // The tool-level override is absolute: it skips allow-rule evaluation
    // and the trust check entirely.
    if tool.allow_usage_when_untrusted_data_is_present {
        return InvocationDecision::allowed();
    }

    if context_is_trusted {
        return InvocationDecision::allowed();
    }

    // Untrusted context: only a matching allow rule keeps the call alive.
    for policy in policies
        .iter()
        .filter(|p| p.action == PolicyAction::AllowWhenContextIsUntrusted)
    {
        let actual = match path::lookup(arguments, &policy.argument_name) {
            None => {
                return InvocationDecision::blocked(
                    Error::MissingArgument(policy.argument_name.clone()).to_string(),
                );
            }
            Some(actual) => actual,
        };
        if policy.operator.matches(actual, &policy.value) {
            return InvocationDecision::allowed();
        }
    }

    InvocationDecision::blocked(
        "Tool invocation blocked: context contains untrusted data and no policy allows this call",
    )
}
