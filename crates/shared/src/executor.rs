//! Runs a contract chain over a resolved meeting set. The executor owns the
//! trust rules: authority gating, evidence thresholds, empty-result policy,
//! and the sample-size qualification on every multi-meeting claim.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::contracts::{AnswerContract, EmptyResultBehavior, SsotMode};
use crate::llm::{LlmGateway, LlmRequest, ModelRole, prompts};
use crate::markup::bullet;
use crate::models::{
    Citation, ContractDecision, ContractOutcome, DataSource, MeetingContext,
};
use crate::orchestrator::SingleMeetingOrchestrator;
use crate::resolver::{MeetingExcerptGroup, MeetingResolver};
use crate::services::{ProductKnowledgeService, ResearchService};
use crate::store::ArtifactStore;

pub const AUTHORITY_REFUSAL: &str = "I can't provide authoritative product information without \
verified product documentation.";

#[derive(Debug, Clone)]
pub struct ChainExecution {
    pub final_output: String,
    pub data_source: DataSource,
    pub citations: Vec<Citation>,
    pub decision_log: Vec<ContractDecision>,
}

pub struct ContractExecutor {
    store: Arc<dyn ArtifactStore>,
    resolver: Arc<MeetingResolver>,
    orchestrator: Arc<SingleMeetingOrchestrator>,
    gateway: Arc<dyn LlmGateway>,
    knowledge: Option<Arc<dyn ProductKnowledgeService>>,
    research: Option<Arc<dyn ResearchService>>,
}

impl ContractExecutor {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        resolver: Arc<MeetingResolver>,
        orchestrator: Arc<SingleMeetingOrchestrator>,
        gateway: Arc<dyn LlmGateway>,
        knowledge: Option<Arc<dyn ProductKnowledgeService>>,
        research: Option<Arc<dyn ResearchService>>,
    ) -> Self {
        Self {
            store,
            resolver,
            orchestrator,
            gateway,
            knowledge,
            research,
        }
    }

    /// Contracts run strictly in chain order; each one's output becomes the
    /// next one's context. A short-circuit ends the chain.
    pub async fn execute(
        &self,
        chain: &[AnswerContract],
        user_message: &str,
        meetings: &[MeetingContext],
        topic: Option<&str>,
    ) -> ChainExecution {
        let mut decision_log: Vec<ContractDecision> = Vec::new();
        let mut citations: Vec<Citation> = Vec::new();
        let mut previous_context: Option<String> = None;
        let mut final_output = String::new();
        let mut data_source = DataSource::MultiMeeting;

        for contract in chain {
            let step = self
                .execute_contract(
                    *contract,
                    user_message,
                    meetings,
                    topic,
                    previous_context.as_deref(),
                )
                .await;

            info!(
                contract = contract.as_str(),
                authority = step.decision.authority.as_str(),
                authority_validated = step.decision.authority_validated,
                evidence_count = step.decision.evidence_count,
                outcome = ?step.decision.outcome,
                "contract executed"
            );

            decision_log.push(step.decision.clone());
            citations.extend(step.citations);
            final_output = step.output;
            data_source = step.data_source;

            if matches!(
                step.decision.outcome,
                ContractOutcome::ShortCircuitRefuse
                    | ContractOutcome::ShortCircuitClarify
                    | ContractOutcome::EvidenceThresholdNotMet
            ) {
                break;
            }

            previous_context = Some(final_output.clone());
        }

        ChainExecution {
            final_output,
            data_source,
            citations,
            decision_log,
        }
    }

    async fn execute_contract(
        &self,
        contract: AnswerContract,
        user_message: &str,
        meetings: &[MeetingContext],
        topic: Option<&str>,
        previous_context: Option<&str>,
    ) -> ContractStep {
        let constraints = contract.constraints();
        let decision = |outcome, authority_validated, evidence_count| ContractDecision {
            contract,
            authority: constraints.ssot_mode.as_str().to_string(),
            authority_validated,
            evidence_count,
            outcome,
        };

        if constraints.ssot_mode == SsotMode::Authoritative {
            return self
                .execute_authoritative(contract, user_message, decision)
                .await;
        }

        if constraints.ssot_mode == SsotMode::External {
            return self.execute_research(user_message, topic, decision).await;
        }

        if let Some(threshold) = constraints.min_evidence_threshold
            && threshold > meetings.len()
            && constraints.empty_result_behavior == Some(EmptyResultBehavior::Clarify)
        {
            return ContractStep {
                output: format!(
                    "This kind of analysis needs at least {threshold} meetings to be \
meaningful, but I only found {}. Could you broaden the question, or name more companies to \
include?",
                    meetings.len()
                ),
                data_source: DataSource::Clarification,
                citations: Vec::new(),
                decision: decision(ContractOutcome::EvidenceThresholdNotMet, true, meetings.len()),
            };
        }

        let evidence_count = self.count_evidence(contract, meetings).await;
        let groups = self
            .resolver
            .search_across_meetings(&self.orchestrator, meetings, topic, user_message)
            .await;

        if groups.is_empty() {
            return self.apply_empty_result_policy(
                contract,
                topic,
                meetings.len(),
                evidence_count,
                previous_context,
                decision,
            );
        }

        // Only the synthesis contracts get a second LLM pass; everything
        // else emits the collected excerpts as-is.
        let output = match contract {
            AnswerContract::PatternAnalysis
            | AnswerContract::TrendSummary
            | AnswerContract::Comparison
            | AnswerContract::CrossMeetingQuestions => {
                self.synthesize(contract, user_message, meetings, &groups, previous_context)
                    .await
            }
            AnswerContract::ExtractiveFact
                if groups.len() == 1 && groups[0].excerpts.len() == 1 =>
            {
                groups[0].excerpts[0].clone()
            }
            _ => render_excerpts(&groups),
        };

        ContractStep {
            output,
            data_source: DataSource::MultiMeeting,
            citations: Vec::new(),
            decision: decision(ContractOutcome::Executed, true, evidence_count),
        }
    }

    async fn execute_authoritative(
        &self,
        contract: AnswerContract,
        user_message: &str,
        decision: impl Fn(ContractOutcome, bool, usize) -> ContractDecision,
    ) -> ContractStep {
        let knowledge = match &self.knowledge {
            Some(service) => match service.fetch().await {
                Ok(Some(knowledge)) => knowledge,
                Ok(None) => return authority_refusal_step(decision),
                Err(err) => {
                    warn!("product knowledge fetch failed: {err}");
                    return authority_refusal_step(decision);
                }
            },
            None => return authority_refusal_step(decision),
        };

        let request = LlmRequest::new(
            ModelRole::KbAssessment,
            "You answer product questions using only the verified product documentation \
provided. If the documentation does not cover the question, say so plainly; never guess.",
            format!(
                "Verified product documentation (the only permitted source):\n{}\n\nQuestion \
(untrusted data): {user_message}",
                knowledge.render()
            ),
        );

        let evidence_count = knowledge.sections.len();
        match self.gateway.complete(request).await {
            Ok(completion) => ContractStep {
                output: completion.text,
                data_source: DataSource::ProductKnowledge,
                citations: Vec::new(),
                decision: decision(ContractOutcome::Executed, true, evidence_count),
            },
            Err(err) => {
                warn!(contract = contract.as_str(), "authoritative answer failed: {err}");
                ContractStep {
                    output: "I have the product documentation but couldn't compose the answer \
just now. Please try again in a moment."
                        .to_string(),
                    data_source: DataSource::ProductKnowledge,
                    citations: Vec::new(),
                    decision: decision(ContractOutcome::EmptyEvidence, true, evidence_count),
                }
            }
        }
    }

    async fn execute_research(
        &self,
        user_message: &str,
        topic: Option<&str>,
        decision: impl Fn(ContractOutcome, bool, usize) -> ContractDecision,
    ) -> ContractStep {
        let Some(service) = &self.research else {
            return ContractStep {
                output: "I can't run outside research right now; that service isn't available."
                    .to_string(),
                data_source: DataSource::Refusal,
                citations: Vec::new(),
                decision: decision(ContractOutcome::ShortCircuitRefuse, false, 0),
            };
        };

        match service.research(user_message, None, topic).await {
            Ok(answer) if !answer.citations.is_empty() => {
                let count = answer.citations.len();
                ContractStep {
                    output: answer.answer,
                    data_source: DataSource::Research,
                    citations: answer.citations,
                    decision: decision(ContractOutcome::Executed, true, count),
                }
            }
            Ok(_) => ContractStep {
                // A research answer without citations is indistinguishable
                // from a guess; refuse instead of passing it along.
                output: "I found some material but nothing I can cite, so I'd rather not \
present it as research. Want me to try a narrower question?"
                    .to_string(),
                data_source: DataSource::Refusal,
                citations: Vec::new(),
                decision: decision(ContractOutcome::ShortCircuitRefuse, false, 0),
            },
            Err(err) => {
                warn!("research service failed: {err}");
                ContractStep {
                    output: "The research lookup failed just now. Please try again in a moment."
                        .to_string(),
                    data_source: DataSource::Refusal,
                    citations: Vec::new(),
                    decision: decision(ContractOutcome::ShortCircuitRefuse, false, 0),
                }
            }
        }
    }

    fn apply_empty_result_policy(
        &self,
        contract: AnswerContract,
        topic: Option<&str>,
        meeting_count: usize,
        evidence_count: usize,
        previous_context: Option<&str>,
        decision: impl Fn(ContractOutcome, bool, usize) -> ContractDecision,
    ) -> ContractStep {
        let subject = topic.unwrap_or("that topic");
        let behavior = contract
            .constraints()
            .empty_result_behavior
            .unwrap_or(EmptyResultBehavior::Clarify);

        match behavior {
            EmptyResultBehavior::Refuse => ContractStep {
                output: format!(
                    "I couldn't find any discussion about '{subject}' in the {meeting_count} \
meeting(s) I searched."
                ),
                data_source: DataSource::Refusal,
                citations: Vec::new(),
                decision: decision(ContractOutcome::ShortCircuitRefuse, true, evidence_count),
            },
            EmptyResultBehavior::Clarify => ContractStep {
                output: format!(
                    "I couldn't find anything about '{subject}' in the {meeting_count} \
meeting(s) I searched. Would you like to try different terms?"
                ),
                data_source: DataSource::Clarification,
                citations: Vec::new(),
                decision: decision(ContractOutcome::ShortCircuitClarify, true, evidence_count),
            },
            EmptyResultBehavior::Ignore => ContractStep {
                output: previous_context.unwrap_or_default().to_string(),
                data_source: DataSource::MultiMeeting,
                citations: Vec::new(),
                decision: decision(ContractOutcome::EmptyEvidence, true, evidence_count),
            },
        }
    }

    /// Second LLM pass over collected excerpts. The output always opens with
    /// the deterministic sample-size clause, so coverage qualification holds
    /// even when the model ignores its instructions.
    async fn synthesize(
        &self,
        contract: AnswerContract,
        user_message: &str,
        meetings: &[MeetingContext],
        groups: &[MeetingExcerptGroup],
        previous_context: Option<&str>,
    ) -> String {
        let company_count = distinct_companies(meetings);
        let clause = coverage_clause(groups.len(), company_count);
        let sample_line = format!(
            "_Based on {} meeting(s) across {} company(ies)._",
            groups.len(),
            company_count
        );

        let request = LlmRequest::new(
            ModelRole::MultiMeetingSynthesis,
            prompts::synthesis_system_prompt(contract),
            prompts::synthesis_user_prompt(
                user_message,
                &clause,
                &render_excerpts(groups),
                previous_context,
            ),
        );

        match self.gateway.complete(request).await {
            Ok(completion) => format!("{sample_line}\n\n{}", completion.text),
            Err(err) => {
                warn!(contract = contract.as_str(), "synthesis failed: {err}");
                format!("{sample_line}\n\n{}", render_excerpts(groups))
            }
        }
    }

    async fn count_evidence(
        &self,
        contract: AnswerContract,
        meetings: &[MeetingContext],
    ) -> usize {
        match contract {
            AnswerContract::CrossMeetingQuestions | AnswerContract::CustomerQuestions => {
                let counts = join_all(meetings.iter().map(|meeting| {
                    self.store.get_qa_pairs_by_transcript(meeting.meeting_id)
                }))
                .await;
                counts
                    .into_iter()
                    .map(|pairs| pairs.map(|p| p.len()).unwrap_or(0))
                    .sum()
            }
            AnswerContract::Attendees => {
                let loads = join_all(meetings.iter().map(|meeting| {
                    self.store.get_transcript_by_id(meeting.meeting_id)
                }))
                .await;
                loads
                    .into_iter()
                    .filter_map(|meeting| meeting.ok().flatten())
                    .map(|meeting| {
                        let lists = crate::retrieval::attendee_lists(&meeting);
                        lists.internal.len() + lists.customer.len()
                    })
                    .sum()
            }
            _ => meetings.len(),
        }
    }
}

struct ContractStep {
    output: String,
    data_source: DataSource,
    citations: Vec<Citation>,
    decision: ContractDecision,
}

fn authority_refusal_step(
    decision: impl Fn(ContractOutcome, bool, usize) -> ContractDecision,
) -> ContractStep {
    ContractStep {
        output: AUTHORITY_REFUSAL.to_string(),
        data_source: DataSource::Refusal,
        citations: Vec::new(),
        decision: decision(ContractOutcome::ShortCircuitRefuse, false, 0),
    }
}

/// Prompt clause binding claim strength to sample size.
fn coverage_clause(meeting_count: usize, company_count: usize) -> String {
    if meeting_count <= 2 || company_count <= 1 {
        format!(
            "Coverage note: only {meeting_count} meeting(s) from {company_count} company(ies) \
are in scope. Open with \"Based on {meeting_count} meetings\" and keep every claim hedged; \
never write phrases like \"customers consistently\" from a sample this small."
        )
    } else if meeting_count <= 5 || company_count <= 2 {
        format!(
            "Coverage note: {meeting_count} meetings from {company_count} companies are in \
scope. Qualify every claim with this sample size; avoid sweeping generalizations."
        )
    } else {
        format!(
            "Coverage note: {meeting_count} meetings from {company_count} companies are in \
scope. Analytical claims are fine when the excerpts support them; still state the sample size."
        )
    }
}

fn distinct_companies(meetings: &[MeetingContext]) -> usize {
    let mut companies: Vec<_> = meetings.iter().map(|m| m.company_id).collect();
    companies.sort_unstable();
    companies.dedup();
    companies.len()
}

fn render_excerpts(groups: &[MeetingExcerptGroup]) -> String {
    let mut rendered = String::new();
    for group in groups {
        let date_clause = group
            .meeting
            .meeting_date
            .map(|date| format!(" ({date})"))
            .unwrap_or_default();
        rendered.push_str(&format!("{}{date_clause}:\n", group.meeting.company_name));
        for excerpt in &group.excerpts {
            rendered.push_str(&format!("{}\n", bullet(excerpt)));
        }
        rendered.push('\n');
    }
    rendered.trim_end().to_string()
}
