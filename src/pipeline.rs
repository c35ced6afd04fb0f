//! The TrustGate pipeline
//!
//! Facade tying the components together for the embedding service:
//! invocation gating, result classification, quarantine escalation, and
//! redaction, all keyed by conversation. Policy evaluation is synchronous;
//! only quarantine (which talks to a provider) is async.
//!
//! Turn processing is sequential per conversation: a trust downgrade from
//! one tool result must be visible to the redaction of the messages that
//! follow it in the same turn.

use crate::audit::{AuditEvent, AuditLog, AuditSeverity, GateStage};
use crate::config::TrustGateConfig;
use crate::error::{Error, Result};
use crate::llm::{AssistantReply, CompletionChunk, LlmProvider};
use crate::message::{parse_tool_payload, Message};
use crate::policy::{self, Classification, InvocationDecision, ToolInvocationPolicy, TrustedDataPolicy};
use crate::quarantine::{DualLlmResult, QuarantineCoordinator};
use crate::redact::redact_blocked;
use crate::store::{
    InteractionStore, MemoryInteractionStore, MemoryPolicyStore, MemoryQuarantineResultStore,
    MemoryToolStore, PolicyStore, QuarantineResultStore, ToolStore,
};
use crate::tool::Tool;
use crate::trust::{self, BlockedToolResult, Interaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A denied tool invocation, ready to substitute for the model's output
#[derive(Debug, Clone)]
pub struct Refusal {
    /// The assistant message replacing the original reply
    pub message: Message,
    /// Single-chunk stream substitution for streaming callers
    pub chunk: CompletionChunk,
    /// The block reason
    pub reason: String,
}

/// Messages screened for a provider call
#[derive(Debug, Clone)]
pub struct ScreenedMessages {
    /// The history with untrusted results sanitized and blocked results redacted
    pub messages: Vec<Message>,
    /// Whether the conversation was trusted after classification
    pub context_is_trusted: bool,
}

/// The defense pipeline
pub struct TrustGate {
    config: TrustGateConfig,
    tools: Arc<dyn ToolStore>,
    policies: Arc<dyn PolicyStore>,
    interactions: Arc<dyn InteractionStore>,
    quarantine_results: Arc<dyn QuarantineResultStore>,
    provider: Option<Arc<dyn LlmProvider>>,
    audit: Mutex<AuditLog>,
}

/// Builder for [`TrustGate`]
pub struct TrustGateBuilder {
    config: TrustGateConfig,
    tools: Arc<dyn ToolStore>,
    policies: Arc<dyn PolicyStore>,
    interactions: Arc<dyn InteractionStore>,
    quarantine_results: Arc<dyn QuarantineResultStore>,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl Default for TrustGateBuilder {
    fn default() -> Self {
        Self {
            config: TrustGateConfig::default(),
            tools: Arc::new(MemoryToolStore::new()),
            policies: Arc::new(MemoryPolicyStore::new()),
            interactions: Arc::new(MemoryInteractionStore::new()),
            quarantine_results: Arc::new(MemoryQuarantineResultStore::new()),
            provider: None,
        }
    }
}

impl TrustGateBuilder {
    pub fn config(mut self, config: TrustGateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool_store(mut self, tools: Arc<dyn ToolStore>) -> Self {
        self.tools = tools;
        self
    }

    pub fn policy_store(mut self, policies: Arc<dyn PolicyStore>) -> Self {
        self.policies = policies;
        self
    }

    pub fn interaction_store(mut self, interactions: Arc<dyn InteractionStore>) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn quarantine_result_store(mut self, results: Arc<dyn QuarantineResultStore>) -> Self {
        self.quarantine_results = results;
        self
    }

    pub fn build(self) -> TrustGate {
        let audit = Mutex::new(AuditLog::new(self.config.audit_capacity));
        TrustGate {
            config: self.config,
            tools: self.tools,
            policies: self.policies,
            interactions: self.interactions,
            quarantine_results: self.quarantine_results,
            provider: self.provider,
            audit,
        }
    }
}

impl TrustGate {
    pub fn builder() -> TrustGateBuilder {
        TrustGateBuilder::default()
    }

    /// Register a tool unless one with the same name exists.
    pub fn register_tool(&self, tool: Tool) {
        self.tools.create_if_missing(tool);
    }

    /// Replace an existing tool registration.
    pub fn update_tool(&self, tool: Tool) -> bool {
        self.tools.update(tool)
    }

    /// Add a (validated) invocation policy.
    pub fn add_invocation_policy(&self, policy: ToolInvocationPolicy) {
        self.policies.add_invocation_policy(policy);
    }

    /// Add a (validated) trusted-data policy.
    pub fn add_trusted_data_policy(&self, policy: TrustedDataPolicy) {
        self.policies.add_trusted_data_policy(policy);
    }

    /// Append a message to the conversation log as a trusted interaction.
    pub fn record_message(&self, conversation_id: Uuid, message: Message) {
        self.interactions
            .append(Interaction::trusted(conversation_id, message));
    }

    /// Whether the conversation is currently trusted.
    pub fn is_conversation_trusted(&self, conversation_id: Uuid) -> bool {
        trust::is_trusted(&self.interactions.for_conversation(conversation_id))
    }

    /// Blocked tool results of the conversation, in log order.
    pub fn blocked_tool_results(&self, conversation_id: Uuid) -> Vec<BlockedToolResult> {
        trust::blocked_tool_results(&self.interactions.for_conversation(conversation_id))
    }

    /// Evaluate a candidate tool call against its policies and the
    /// conversation's trust state.
    pub fn evaluate_tool_invocation(
        &self,
        conversation_id: Uuid,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> InvocationDecision {
        let tool = self.tools.find_by_name(tool_name);
        let policies = self.policies.invocation_policies(tool_name);
        let context_is_trusted = self.is_conversation_trusted(conversation_id);

        let decision = policy::evaluate(
            tool.as_ref(),
            &policies,
            arguments,
            context_is_trusted,
            self.config.unknown_tool_policy,
        );

        if decision.is_allowed {
            tracing::debug!(
                conversation_id = %conversation_id,
                tool_name,
                context_is_trusted,
                "Tool invocation allowed"
            );
        } else {
            self.record_audit(AuditEvent::new(
                conversation_id,
                AuditSeverity::High,
                GateStage::ToolInvocation,
                format!("{}: {}", tool_name, decision.reason),
            ));
        }
        decision
    }

    /// Evaluate every tool call in an assistant reply; on the first denial
    /// build the refusal that substitutes for the whole reply.
    ///
    /// The (possibly substituted) assistant message is appended to the
    /// conversation log either way, so later turns can resolve tool names
    /// from it.
    pub fn evaluate_assistant_reply(
        &self,
        conversation_id: Uuid,
        model: &str,
        reply: &AssistantReply,
    ) -> Option<Refusal> {
        let mut refusal = None;
        for call in &reply.tool_calls {
            let decision =
                self.evaluate_tool_invocation(conversation_id, &call.name, &call.arguments);
            if !decision.is_allowed {
                refusal = Some(Refusal {
                    message: Message::assistant(decision.reason.clone()),
                    chunk: CompletionChunk::refusal(model, decision.reason.clone()),
                    reason: decision.reason,
                });
                break;
            }
        }

        let recorded = match &refusal {
            Some(refusal) => refusal.message.clone(),
            None => reply.clone().into_message(),
        };
        self.record_message(conversation_id, recorded);
        refusal
    }

    /// Classify one tool result and persist the verdict as a new
    /// interaction. Classification is a write: the verdict becomes part of
    /// the trust record every later evaluation depends on.
    pub fn classify_tool_result(
        &self,
        conversation_id: Uuid,
        tool_name: &str,
        tool_call_id: &str,
        content: &str,
    ) -> Classification {
        let payload = parse_tool_payload(content);
        // An unregistered tool has no trust flags: its results fall to the
        // default-untrusted floor.
        let tool = self
            .tools
            .find_by_name(tool_name)
            .unwrap_or_else(|| Tool::new(tool_name));
        let policies = self.policies.trusted_data_policies(tool_name);

        let verdict = policy::classify(&tool, &policies, &payload);
        self.persist_verdict(conversation_id, tool_call_id, content, &verdict);
        verdict
    }

    fn persist_verdict(
        &self,
        conversation_id: Uuid,
        tool_call_id: &str,
        content: &str,
        verdict: &Classification,
    ) {
        self.interactions.append(Interaction::new(
            conversation_id,
            Message::tool_result(tool_call_id, content),
            verdict.is_trusted,
            verdict.is_blocked,
            verdict.reason.clone(),
        ));

        if verdict.is_blocked {
            self.record_audit(AuditEvent::new(
                conversation_id,
                AuditSeverity::High,
                GateStage::ToolResult,
                format!(
                    "Tool result {} blocked: {}",
                    tool_call_id,
                    verdict.reason.as_deref().unwrap_or("by policy")
                ),
            ));
        } else if !verdict.is_trusted {
            self.record_audit(AuditEvent::new(
                conversation_id,
                AuditSeverity::Warning,
                GateStage::ToolResult,
                format!("Tool result {} classified untrusted", tool_call_id),
            ));
        }
    }

    /// Run the quarantine protocol for one untrusted tool result and
    /// retain the transcript.
    pub async fn run_quarantine(
        &self,
        conversation_id: Uuid,
        tool_call_id: &str,
        payload: &str,
    ) -> Result<DualLlmResult> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| Error::Provider("no LLM provider configured".to_string()))?;

        let user_request = self.latest_user_request(conversation_id);
        let coordinator = QuarantineCoordinator::new(provider, self.config.dual_llm.clone());
        let result = coordinator
            .run(tool_call_id, &user_request, payload)
            .await?;

        self.quarantine_results.record(result.clone());
        Ok(result)
    }

    /// The most recent completed quarantine run for a tool call.
    pub fn quarantine_result(&self, tool_call_id: &str) -> Option<DualLlmResult> {
        self.quarantine_results.by_tool_call_id(tool_call_id)
    }

    /// Redact blocked tool results from a message list.
    pub fn redact(&self, conversation_id: Uuid, messages: Vec<Message>) -> Vec<Message> {
        redact_blocked(messages, &self.blocked_tool_results(conversation_id))
    }

    /// Screen a turn's messages before a provider call.
    ///
    /// Classifies each tool result in order (trust downgrades from earlier
    /// messages are visible to later ones), escalates untrusted results to
    /// quarantine when dual-LLM mode is enabled, and redacts everything
    /// blocked. The returned messages are what the provider may see, never
    /// the raw untrusted payloads.
    pub async fn screen_messages(
        &self,
        conversation_id: Uuid,
        messages: Vec<Message>,
    ) -> Result<ScreenedMessages> {
        let mut screened = Vec::with_capacity(messages.len());

        for message in messages {
            let (tool_call_id, content) = match &message {
                Message::Tool {
                    tool_call_id,
                    content,
                } => (tool_call_id.clone(), content.clone()),
                _ => {
                    screened.push(message);
                    continue;
                }
            };

            // The result message carries only the call id; the tool name
            // lives on the assistant message that issued the call.
            let history = self.interactions.for_conversation(conversation_id);
            let tool_name = match trust::tool_name_for_call(&history, &tool_call_id) {
                Some(name) => name,
                None => {
                    // No issuing call on record: leave the message as-is.
                    screened.push(message);
                    continue;
                }
            };

            let verdict =
                self.classify_tool_result(conversation_id, &tool_name, &tool_call_id, &content);

            if !verdict.is_trusted
                && !verdict.is_blocked
                && self.config.dual_llm.enabled
                && self.provider.is_some()
            {
                match self.run_quarantine(conversation_id, &tool_call_id, &content).await {
                    Ok(result) => {
                        // The sanitized summary substitutes for the payload.
                        screened.push(Message::tool_result(&tool_call_id, result.result));
                        continue;
                    }
                    Err(e) => {
                        // An aborted run falls back to a block verdict
                        // rather than leaking a partial untrusted result.
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            tool_call_id = %tool_call_id,
                            error = %e,
                            "Quarantine aborted, blocking tool result"
                        );
                        self.interactions.append(Interaction::new(
                            conversation_id,
                            Message::tool_result(&tool_call_id, &content),
                            false,
                            true,
                            Some(format!("Quarantine aborted: {}", e)),
                        ));
                        self.record_audit(AuditEvent::new(
                            conversation_id,
                            AuditSeverity::High,
                            GateStage::Quarantine,
                            format!("Quarantine for {} aborted: {}", tool_call_id, e),
                        ));
                    }
                }
            }

            screened.push(Message::Tool {
                tool_call_id,
                content,
            });
        }

        let context_is_trusted = self.is_conversation_trusted(conversation_id);
        let messages = self.redact(conversation_id, screened);

        Ok(ScreenedMessages {
            messages,
            context_is_trusted,
        })
    }

    /// Recent audit events for a conversation.
    pub fn audit_events(&self, conversation_id: Uuid) -> Vec<AuditEvent> {
        let log = self.audit.lock().expect("audit log lock poisoned");
        log.by_conversation(conversation_id)
            .into_iter()
            .cloned()
            .collect()
    }

    fn latest_user_request(&self, conversation_id: Uuid) -> String {
        self.interactions
            .for_conversation(conversation_id)
            .iter()
            .rev()
            .find_map(|i| match &i.content {
                Message::User { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn record_audit(&self, event: AuditEvent) {
        let mut log = self.audit.lock().expect("audit log lock poisoned");
        log.record(event);
    }
}
