//! TrustGate configuration
//!
//! Process-wide settings for the defense pipeline: how unregistered tools
//! are treated and how the dual-LLM quarantine behaves. All fields carry
//! serde defaults so partial configs deserialize cleanly.

use crate::quarantine::prompts;
use serde::{Deserialize, Serialize};

/// How to treat a tool call for a tool that has no registration.
///
/// The permissive default matches the bootstrap behavior of proxying
/// traffic before every tool has been registered; strict deployments flip
/// this to `Deny` so unregistered tools are blocked outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolPolicy {
    /// Allow calls to unregistered tools (no policy surface exists yet)
    Allow,
    /// Deny calls to unregistered tools
    Deny,
}

impl Default for UnknownToolPolicy {
    fn default() -> Self {
        Self::Allow
    }
}

/// Dual-LLM quarantine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualLlmConfig {
    /// Enable the quarantine protocol for untrusted tool results
    #[serde(default)]
    pub enabled: bool,
    /// Prompt for the main agent; `{{originalUserRequest}}` is substituted
    #[serde(default = "default_main_agent_prompt")]
    pub main_agent_prompt: String,
    /// Prompt for the quarantined agent; `{{toolResultData}}`,
    /// `{{question}}`, `{{options}}` and `{{maxIndex}}` are substituted
    #[serde(default = "default_quarantined_agent_prompt")]
    pub quarantined_agent_prompt: String,
    /// Prompt for summary generation; `{{qaText}}` is substituted
    #[serde(default = "default_summary_prompt")]
    pub summary_prompt: String,
    /// Hard cap on Q&A rounds between the two agents
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Per-round time budget in seconds
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
    /// Model used for both quarantine agents
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_main_agent_prompt() -> String {
    prompts::DEFAULT_MAIN_AGENT_PROMPT.to_string()
}

fn default_quarantined_agent_prompt() -> String {
    prompts::DEFAULT_QUARANTINED_AGENT_PROMPT.to_string()
}

fn default_summary_prompt() -> String {
    prompts::DEFAULT_SUMMARY_PROMPT.to_string()
}

fn default_max_rounds() -> u32 {
    5
}

fn default_round_timeout_secs() -> u64 {
    60
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for DualLlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            main_agent_prompt: default_main_agent_prompt(),
            quarantined_agent_prompt: default_quarantined_agent_prompt(),
            summary_prompt: default_summary_prompt(),
            max_rounds: default_max_rounds(),
            round_timeout_secs: default_round_timeout_secs(),
            model: default_model(),
        }
    }
}

/// Top-level TrustGate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustGateConfig {
    /// Treatment of calls to unregistered tools
    #[serde(default)]
    pub unknown_tool_policy: UnknownToolPolicy,
    /// Dual-LLM quarantine settings
    #[serde(default)]
    pub dual_llm: DualLlmConfig,
    /// Capacity of the in-memory audit log
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

fn default_audit_capacity() -> usize {
    1024
}

impl Default for TrustGateConfig {
    fn default() -> Self {
        Self {
            unknown_tool_policy: UnknownToolPolicy::default(),
            dual_llm: DualLlmConfig::default(),
            audit_capacity: default_audit_capacity(),
        }
    }
}
