//! Persistence seams
//!
//! Storage is a collaborator, not a concern of the gate itself: each
//! entity gets a small trait and an in-memory implementation backed by
//! dashmap. Durable deployments implement the traits over their own
//! store; the interaction log contract is append-only.

use crate::policy::{ToolInvocationPolicy, TrustedDataPolicy};
use crate::quarantine::DualLlmResult;
use crate::tool::Tool;
use crate::trust::Interaction;
use dashmap::DashMap;
use uuid::Uuid;

/// Tool registrations by name
pub trait ToolStore: Send + Sync {
    /// Register a tool unless one with the same name exists.
    fn create_if_missing(&self, tool: Tool);

    /// Replace an existing registration; returns false if absent.
    fn update(&self, tool: Tool) -> bool;

    /// Look up a tool by name.
    fn find_by_name(&self, name: &str) -> Option<Tool>;

    /// All registered tools.
    fn all(&self) -> Vec<Tool>;
}

/// Invocation and trusted-data policies, scoped per tool
///
/// Policies are returned in creation order; evaluation order matters.
pub trait PolicyStore: Send + Sync {
    fn add_invocation_policy(&self, policy: ToolInvocationPolicy);
    fn invocation_policies(&self, tool_name: &str) -> Vec<ToolInvocationPolicy>;
    fn add_trusted_data_policy(&self, policy: TrustedDataPolicy);
    fn trusted_data_policies(&self, tool_name: &str) -> Vec<TrustedDataPolicy>;
}

/// Append-only interaction log, keyed by conversation
pub trait InteractionStore: Send + Sync {
    /// Append an interaction to its conversation's log.
    fn append(&self, interaction: Interaction);

    /// All interactions of a conversation, in append order.
    fn for_conversation(&self, conversation_id: Uuid) -> Vec<Interaction>;
}

/// Completed quarantine runs, keyed by tool call id
pub trait QuarantineResultStore: Send + Sync {
    fn record(&self, result: DualLlmResult);
    fn by_tool_call_id(&self, tool_call_id: &str) -> Option<DualLlmResult>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory tool registry
#[derive(Debug, Default)]
pub struct MemoryToolStore {
    tools: DashMap<String, Tool>,
}

impl MemoryToolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolStore for MemoryToolStore {
    fn create_if_missing(&self, tool: Tool) {
        self.tools.entry(tool.name.clone()).or_insert(tool);
    }

    fn update(&self, tool: Tool) -> bool {
        match self.tools.get_mut(&tool.name) {
            Some(mut entry) => {
                *entry = tool;
                true
            }
            None => false,
        }
    }

    fn find_by_name(&self, name: &str) -> Option<Tool> {
        self.tools.get(name).map(|t| t.clone())
    }

    fn all(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.clone()).collect()
    }
}

/// In-memory policy store, keeping per-tool creation order
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    invocation: DashMap<String, Vec<ToolInvocationPolicy>>,
    trusted_data: DashMap<String, Vec<TrustedDataPolicy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn add_invocation_policy(&self, policy: ToolInvocationPolicy) {
        self.invocation
            .entry(policy.tool_name.clone())
            .or_default()
            .push(policy);
    }

    fn invocation_policies(&self, tool_name: &str) -> Vec<ToolInvocationPolicy> {
        self.invocation
            .get(tool_name)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn add_trusted_data_policy(&self, policy: TrustedDataPolicy) {
        self.trusted_data
            .entry(policy.tool_name.clone())
            .or_default()
            .push(policy);
    }

    fn trusted_data_policies(&self, tool_name: &str) -> Vec<TrustedDataPolicy> {
        self.trusted_data
            .get(tool_name)
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

/// In-memory append-only interaction log
#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    interactions: DashMap<Uuid, Vec<Interaction>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InteractionStore for MemoryInteractionStore {
    fn append(&self, interaction: Interaction) {
        self.interactions
            .entry(interaction.conversation_id)
            .or_default()
            .push(interaction);
    }

    fn for_conversation(&self, conversation_id: Uuid) -> Vec<Interaction> {
        self.interactions
            .get(&conversation_id)
            .map(|i| i.clone())
            .unwrap_or_default()
    }
}

/// In-memory quarantine result store
#[derive(Debug, Default)]
pub struct MemoryQuarantineResultStore {
    results: DashMap<String, DualLlmResult>,
}

impl MemoryQuarantineResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuarantineResultStore for MemoryQuarantineResultStore {
    fn record(&self, result: DualLlmResult) {
        self.results.insert(result.tool_call_id.clone(), result);
    }

    fn by_tool_call_id(&self, tool_call_id: &str) -> Option<DualLlmResult> {
        self.results.get(tool_call_id).map(|r| r.clone())
    }
}
