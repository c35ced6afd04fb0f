//! Quarantine run coordinator
//!
//! Drives the protocol state machine against a live provider: invokes the
//! main agent, relays questions to fresh quarantined agent instances, and
//! produces the sanitized summary. Round boundaries carry the time budget;
//! a timed-out round stops questioning and summarizes the partial
//! transcript, while a provider error aborts the run so the caller falls
//! back to a block verdict.

use crate::config::DualLlmConfig;
use crate::error::{Error, Result};
use crate::llm::{CompletionRequest, LlmProvider};
use crate::message::Message;
use crate::quarantine::prompts::{format_options, format_qa_text, render};
use crate::quarantine::protocol::{
    advance, parse_answer_index, parse_main_action, MainAgentAction, ProtocolEvent, ProtocolState,
};
use crate::quarantine::{DualLlmResult, QaRound};
use std::sync::Arc;
use std::time::Duration;

/// Coordinates one quarantine exchange per untrusted tool result
pub struct QuarantineCoordinator {
    provider: Arc<dyn LlmProvider>,
    config: DualLlmConfig,
}

impl QuarantineCoordinator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: DualLlmConfig) -> Self {
        Self { provider, config }
    }

    /// Run the full protocol for one tool result.
    ///
    /// Returns the sanitized summary plus the Q&A transcript. Errors mean
    /// no usable summary exists; the caller must treat the result as
    /// blocked rather than fall back to the raw payload.
    pub async fn run(
        &self,
        tool_call_id: &str,
        original_user_request: &str,
        tool_result_data: &str,
    ) -> Result<DualLlmResult> {
        let max_rounds = self.config.max_rounds;
        let budget = Duration::from_secs(self.config.round_timeout_secs);

        let mut rounds: Vec<QaRound> = Vec::new();
        let mut pending_question: Option<(String, Vec<String>)> = None;
        let mut main_history = vec![Message::user(render(
            &self.config.main_agent_prompt,
            &[("originalUserRequest", original_user_request)],
        ))];

        let mut state = advance(ProtocolState::Init, ProtocolEvent::Started, max_rounds);

        loop {
            match state {
                ProtocolState::Questioning { round } => {
                    let reply = match self.bounded_complete(main_history.clone(), budget).await {
                        Ok(reply) => reply,
                        Err(Error::QuarantineTimeout { .. }) => {
                            tracing::warn!(
                                tool_call_id,
                                round,
                                "Quarantine round timed out, summarizing partial transcript"
                            );
                            state = advance(state, ProtocolEvent::RoundTimeout, max_rounds);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    main_history.push(Message::assistant(reply.clone()));

                    state = match parse_main_action(&reply) {
                        MainAgentAction::Ask { question, options } => {
                            pending_question = Some((question, options));
                            advance(state, ProtocolEvent::MainAsked, max_rounds)
                        }
                        MainAgentAction::Done => {
                            advance(state, ProtocolEvent::MainDone, max_rounds)
                        }
                    };
                }
                ProtocolState::Answering { round } => {
                    let (question, options) = match pending_question.clone() {
                        Some(pending) => pending,
                        // No outstanding question: nothing to answer.
                        None => {
                            state = ProtocolState::Summarizing;
                            continue;
                        }
                    };

                    let prompt = render(
                        &self.config.quarantined_agent_prompt,
                        &[
                            ("toolResultData", tool_result_data),
                            ("question", question.as_str()),
                            ("options", format_options(&options).as_str()),
                            (
                                "maxIndex",
                                options.len().saturating_sub(1).to_string().as_str(),
                            ),
                        ],
                    );

                    // Fresh quarantined instance per question: no carryover
                    // channel between rounds besides the selected option.
                    let reply = match self
                        .bounded_complete(vec![Message::user(prompt)], budget)
                        .await
                    {
                        Ok(reply) => reply,
                        Err(Error::QuarantineTimeout { .. }) => {
                            tracing::warn!(
                                tool_call_id,
                                round,
                                "Quarantined agent timed out, summarizing partial transcript"
                            );
                            state = advance(state, ProtocolEvent::RoundTimeout, max_rounds);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    state = match parse_answer_index(&reply, options.len()) {
                        Some(index) => {
                            let answer = options[index].clone();
                            main_history.push(Message::user(format!("Answer: {}", answer)));
                            rounds.push(QaRound {
                                question,
                                options,
                                answer_index: index,
                                answer,
                            });
                            pending_question = None;
                            advance(state, ProtocolEvent::AnswerAccepted, max_rounds)
                        }
                        None => {
                            // Non-answer: the round does not advance, but
                            // the retry consumes budget.
                            tracing::debug!(
                                tool_call_id,
                                round,
                                "Quarantined agent reply did not select an option"
                            );
                            advance(state, ProtocolEvent::AnswerRejected, max_rounds)
                        }
                    };
                }
                ProtocolState::Summarizing => {
                    let summary = self.summarize(&rounds, budget).await?;
                    return Ok(DualLlmResult {
                        tool_call_id: tool_call_id.to_string(),
                        result: summary,
                        conversations: rounds,
                    });
                }
                // Init only exists before Started; Done only after the
                // summary, which returns directly above.
                ProtocolState::Init | ProtocolState::Done => {
                    return Err(Error::Internal(
                        "quarantine protocol reached an unexpected state".to_string(),
                    ));
                }
            }
        }
    }

    /// One provider call under the round time budget.
    async fn bounded_complete(&self, messages: Vec<Message>, budget: Duration) -> Result<String> {
        let request = CompletionRequest::text(self.config.model.clone(), messages);
        let reply = tokio::time::timeout(budget, self.provider.complete(request))
            .await
            .map_err(|_| Error::QuarantineTimeout { completed_rounds: 0 })??;
        Ok(reply.content.unwrap_or_default())
    }

    async fn summarize(&self, rounds: &[QaRound], budget: Duration) -> Result<String> {
        let prompt = render(
            &self.config.summary_prompt,
            &[("qaText", format_qa_text(rounds).as_str())],
        );
        self.bounded_complete(vec![Message::user(prompt)], budget)
            .await
            .map_err(|e| match e {
                // A hung summarization leaves no usable result; surface the
                // timeout with the transcript length for diagnostics.
                Error::QuarantineTimeout { .. } => Error::QuarantineTimeout {
                    completed_rounds: rounds.len(),
                },
                other => other,
            })
    }
}
