//! Orchestrator: drives one task from validation to a typed result.
//!
//! ## Lifecycle
//!
//! ```text
//! Validate ─► Detect ─► Route ─► Retrieve ─► BuildPrompt
//!                                                │
//!        ┌───────────────────────────────────────┘
//!        ▼
//!   Generate ─► Verify ──pass──► Finalize ─► Success
//!        ▲         │
//!        │      fail, regenerate: tighten prompt / switch model
//!        └─────────┤
//!                  └─ stop ─► Failure (VERIFICATION_FAILED | MAX_REGENERATIONS_EXCEEDED)
//! ```
//!
//! Any other error (generation fault, timeout, cancellation, bad prompt input)
//! ends the run as `ORCHESTRATION_ERROR`. [`Orchestrator::run`] never returns
//! an error: every outcome is an [`OrchestratorResult`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use coordination::escalation::MAX_REGENERATIONS;
use coordination::router::STRICT_FALLBACK_MODEL;
use coordination::verifier::Citation;
use coordination::{
    otel, AcceptanceGate, DraftAnswer, EvidencePack, LanguageLabel, Router, RouterDecision, Task,
    TaskMode, TokenUsage, VerifierConfig, VerifierReport,
};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::collaborators::{
    self, ChatMessage, Generation, GenerationRequest, Generator, PromptBuilder, PromptContext,
};
use crate::config::PipelineConfig;
use crate::contracts::{
    Answer, AttemptRecord, FinalAnswer, OrchestratorResult, PipelineFailure, PlanAnswer,
    ResolvedCitation, RunMetadata,
};
use crate::errors::{GenerationError, PipelineError};
use crate::metrics::PipelineMetrics;
use crate::plan::parse_plan;
use crate::planner::ToolPlanner;
use crate::prompts::{append_system_instructions, DefaultPromptBuilder};
use crate::session::ConversationSession;

/// Bookkeeping that survives a failed run, for the failure result.
struct RunState {
    request_id: String,
    span: Span,
    started: Instant,
    regeneration_count: u32,
    attempts: Vec<AttemptRecord>,
    last_report: Option<VerifierReport>,
}

impl RunState {
    fn new() -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();
        Self {
            span: Span::none(),
            request_id,
            started: Instant::now(),
            regeneration_count: 0,
            attempts: Vec::new(),
            last_report: None,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

pub struct Orchestrator {
    router: Router,
    gate: AcceptanceGate,
    planner: ToolPlanner,
    generator: Arc<dyn Generator>,
    prompt_builder: Arc<dyn PromptBuilder>,
    metrics: Option<PipelineMetrics>,
    max_regenerations: u32,
    generation_timeout: Duration,
    request_deadline: Option<Duration>,
}

impl Orchestrator {
    /// Default router, gates and prompt builder around the given collaborators.
    pub fn new(generator: Arc<dyn Generator>, planner: ToolPlanner) -> Self {
        Self {
            router: Router::new(),
            gate: AcceptanceGate::new(),
            planner,
            generator,
            prompt_builder: Arc::new(DefaultPromptBuilder),
            metrics: None,
            max_regenerations: MAX_REGENERATIONS,
            generation_timeout: Duration::from_secs(60),
            request_deadline: None,
        }
    }

    /// Wire every component from configuration.
    pub fn from_config(config: &PipelineConfig, metrics: Option<PipelineMetrics>) -> Self {
        let (generator, retriever) = collaborators::from_config(config);
        let mut planner = ToolPlanner::new(retriever)
            .with_top_k(config.retrieval_top_k)
            .with_timeout(config.retrieval_timeout());
        if let Some(m) = &metrics {
            planner = planner.with_metrics(m.clone());
        }

        let mut orchestrator = Self::new(generator, planner)
            .with_router(Router::with_catalog(config.catalog()))
            .with_verifier_config(config.verifier_config())
            .with_max_regenerations(config.max_regenerations)
            .with_generation_timeout(config.generation_timeout());
        orchestrator.request_deadline = config.request_deadline();
        orchestrator.metrics = metrics;
        orchestrator
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn with_verifier_config(mut self, config: VerifierConfig) -> Self {
        self.gate = AcceptanceGate::with_config(config);
        self
    }

    pub fn with_prompt_builder(mut self, builder: Arc<dyn PromptBuilder>) -> Self {
        self.prompt_builder = builder;
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Loop bound, capped at [`MAX_REGENERATIONS`].
    pub fn with_max_regenerations(mut self, max: u32) -> Self {
        self.max_regenerations = max.min(MAX_REGENERATIONS);
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = Some(deadline);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn max_regenerations(&self) -> u32 {
        self.max_regenerations
    }

    pub fn prompt_version(&self) -> &str {
        self.prompt_builder.version()
    }

    /// Run one task to completion.
    pub async fn run(&self, task: &Task, session: &mut ConversationSession) -> OrchestratorResult {
        self.run_with_cancel(task, session, &CancellationToken::new())
            .await
    }

    /// Run one task; `cancel` aborts between attempts or mid-generation.
    pub async fn run_with_cancel(
        &self,
        task: &Task,
        session: &mut ConversationSession,
        cancel: &CancellationToken,
    ) -> OrchestratorResult {
        let mut state = RunState::new();
        state.span = otel::request_span(&state.request_id, task.mode.as_str());
        let span = state.span.clone();

        // A panicking collaborator still yields a typed failure.
        let outcome = AssertUnwindSafe(self.execute(&mut state, task, session, cancel))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|payload| Err(PipelineError::Internal(panic_message(&*payload))));

        match outcome {
            Ok((answer, metadata)) => {
                let outcome = if metadata.regeneration_count == 0 {
                    "ok"
                } else {
                    "regen"
                };
                otel::record_request_result(
                    &state.span,
                    outcome,
                    metadata.regeneration_count,
                    metadata.latency_ms,
                );
                if let Some(m) = &self.metrics {
                    m.record_response(outcome);
                    m.request_latency_seconds
                        .observe(metadata.latency_ms as f64 / 1000.0);
                }
                tracing::info!(
                    request_id = %metadata.request_id,
                    model = %metadata.model_used,
                    regenerations = metadata.regeneration_count,
                    confidence = metadata.confidence,
                    latency_ms = metadata.latency_ms,
                    "answer accepted"
                );
                OrchestratorResult::Success { answer, metadata }
            }
            Err(err) => self.fail(state, err),
        }
    }

    /// Failure result for a request that never reached [`Self::run`],
    /// e.g. a body that did not parse into a [`Task`].
    pub fn reject(&self, err: PipelineError) -> OrchestratorResult {
        self.fail(RunState::new(), err)
    }

    fn fail(&self, state: RunState, err: PipelineError) -> OrchestratorResult {
        let code = err.code();
        let latency_ms = state.elapsed_ms();
        otel::record_request_result(&state.span, code.as_str(), state.regeneration_count, latency_ms);
        if let Some(m) = &self.metrics {
            m.record_response("fail");
            m.record_failure(code.as_str());
            m.request_latency_seconds.observe(latency_ms as f64 / 1000.0);
        }
        tracing::warn!(
            request_id = %state.request_id,
            code = %code,
            regenerations = state.regeneration_count,
            latency_ms,
            retriable = err.is_retriable(),
            error = %err,
            "answer failed"
        );
        OrchestratorResult::Failure {
            error: PipelineFailure {
                code,
                message: err.to_string(),
                request_id: state.request_id,
                latency_ms,
                regeneration_count: state.regeneration_count,
                attempts: state.attempts,
                last_report: state.last_report,
            },
        }
    }

    async fn execute(
        &self,
        state: &mut RunState,
        task: &Task,
        session: &mut ConversationSession,
        cancel: &CancellationToken,
    ) -> Result<(Answer, RunMetadata), PipelineError> {
        // Validate
        task.validate()?;

        // Detect
        let detection = session.detect(&task.message, task.requested_language);
        let target = task.requested_language.unwrap_or(detection.language);
        if let Some(m) = &self.metrics {
            m.record_language(detection.language.as_str(), detection.should_switch);
        }
        tracing::debug!(
            session = session.id(),
            detected = %detection.language,
            confidence = detection.confidence,
            held = detection.held_by_hysteresis,
            target = %target,
            "language detected"
        );

        // Route
        let decision = self.router.route(task);
        otel::record_request_route(
            &state.span,
            target.as_str(),
            &decision.matched_rule,
            &decision.selected_model,
        );

        // Retrieve
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let evidence = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            pack = self.planner.execute_plan_for(task, &state.request_id) => pack,
        };

        // Build prompt
        let mut messages = self
            .prompt_builder
            .build(&PromptContext {
                task,
                language: target,
                decision: &decision,
                evidence: &evidence,
            })
            .map_err(|e| PipelineError::Prompt(e.to_string()))?;

        // Generate → verify
        let mut model = decision.selected_model.clone();
        let mut usage = TokenUsage::default();
        loop {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            if state.regeneration_count > 0 && self.deadline_exhausted(state) {
                return Err(PipelineError::VerificationFailed {
                    regenerations: state.regeneration_count,
                    reason: "request deadline exhausted".into(),
                });
            }

            let attempt = state.regeneration_count + 1;
            let attempt_span = otel::attempt_span(&state.request_id, attempt, &model);
            let attempt_started = Instant::now();

            let generation = self
                .generate(&messages, &model, &decision, cancel)
                .instrument(attempt_span.clone())
                .await?;
            if let Some(m) = &self.metrics {
                m.observe_model_latency(&model, generation.latency_ms as f64 / 1000.0);
            }
            usage = add_usage(usage, generation.usage);

            let draft = DraftAnswer::new(generation.text, model.as_str())
                .with_usage(generation.usage)
                .with_latency_ms(generation.latency_ms);
            let report = self
                .gate
                .verify(&draft, target, task.mode, state.regeneration_count);

            let attempt_ms = attempt_started.elapsed().as_millis() as u64;
            attempt_span.in_scope(|| otel::emit_gate_spans(&report));
            otel::record_attempt_result(&attempt_span, &report, attempt_ms);
            if let Some(m) = &self.metrics {
                m.confidence_score.observe(report.confidence_score);
            }
            state.attempts.push(AttemptRecord {
                attempt,
                model: model.clone(),
                confidence: report.confidence_score,
                passed: report.overall_pass,
                action: report.strategy.action,
                latency_ms: attempt_ms,
            });

            if report.overall_pass {
                let answer = self.finalize(task, &draft, &report, &evidence, target);
                let metadata = RunMetadata {
                    request_id: state.request_id.clone(),
                    latency_ms: state.elapsed_ms(),
                    model_used: model,
                    regeneration_count: state.regeneration_count,
                    detected_language: detection.language,
                    confidence: report.confidence_score,
                    matched_rule: decision.matched_rule.clone(),
                    evidence_chunks: evidence.len(),
                    has_sufficient_evidence: evidence.has_sufficient_evidence(),
                    prompt_version: self.prompt_builder.version().to_string(),
                    token_usage: usage,
                    completed_at: Utc::now(),
                    attempts: std::mem::take(&mut state.attempts),
                };
                return Ok((answer, metadata));
            }

            let bound_reached = state.regeneration_count >= self.max_regenerations;
            if bound_reached || !report.should_regenerate {
                let err = if bound_reached {
                    PipelineError::MaxRegenerationsExceeded(self.max_regenerations)
                } else {
                    PipelineError::VerificationFailed {
                        regenerations: state.regeneration_count,
                        reason: failure_reason(&report),
                    }
                };
                state.last_report = Some(report);
                return Err(err);
            }

            tracing::info!(
                request_id = %state.request_id,
                attempt,
                action = %report.strategy.action,
                reasons = ?report.strategy.reasons,
                confidence = report.confidence_score,
                "draft rejected; regenerating"
            );
            if let Some(m) = &self.metrics {
                for reason in &report.strategy.reasons {
                    m.record_regeneration(reason.as_str());
                }
            }

            state.regeneration_count += 1;
            if report.strategy.switch_model {
                model = self.switch_model(&decision, &report, state.regeneration_count);
            }
            if let Some(extra) = &report.strategy.tightened_instructions {
                append_system_instructions(&mut messages, extra);
            }
            state.last_report = Some(report);
        }
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        decision: &RouterDecision,
        cancel: &CancellationToken,
    ) -> Result<Generation, PipelineError> {
        let request = GenerationRequest {
            messages: messages.to_vec(),
            model: model.to_string(),
            temperature: decision.temperature,
            max_tokens: decision.max_tokens,
        };
        let timeout = self.generation_timeout;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.generator.generate(request)) => match outcome {
                Ok(Ok(generation)) => Ok(generation),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(GenerationError::Timeout(timeout).into()),
            },
        }
    }

    fn deadline_exhausted(&self, state: &RunState) -> bool {
        self.request_deadline
            .is_some_and(|deadline| state.started.elapsed() >= deadline)
    }

    /// Next fallback from the routing decision, else the strict model.
    fn switch_model(
        &self,
        decision: &RouterDecision,
        report: &VerifierReport,
        regeneration_count: u32,
    ) -> String {
        let next = match self.router.next_fallback(decision, regeneration_count) {
            Some(fallback) => fallback.to_string(),
            None => {
                let strict = report.strategy.strict_model.unwrap_or(STRICT_FALLBACK_MODEL);
                self.router.catalog().name(strict).to_string()
            }
        };
        tracing::debug!(from = %decision.selected_model, to = %next, "switching model");
        next
    }

    fn finalize(
        &self,
        task: &Task,
        draft: &DraftAnswer,
        report: &VerifierReport,
        evidence: &EvidencePack,
        language: LanguageLabel,
    ) -> Answer {
        let citations: Vec<ResolvedCitation> = draft
            .citations
            .iter()
            .map(|token| {
                let resolved = resolve_citation(token, evidence);
                if let Some(m) = &self.metrics {
                    m.record_citation(resolved.resolved);
                }
                resolved
            })
            .collect();

        if task.mode == TaskMode::Plan {
            let parsed = parse_plan(&draft.text, &task.subject);
            Answer::Plan(PlanAnswer {
                title: parsed.title,
                phases: parsed.phases,
                raw_text: draft.text.clone(),
                citations,
                language,
                confidence: report.confidence_score,
            })
        } else {
            Answer::Final(FinalAnswer {
                text: draft.text.clone(),
                citations,
                formulas: draft.formulas.clone(),
                language,
                confidence: report.confidence_score,
            })
        }
    }
}

/// Exact-match lookup of a citation token in the evidence pack.
pub fn resolve_citation(token: &str, evidence: &EvidencePack) -> ResolvedCitation {
    let Some(chunk) = evidence.find_citation(token) else {
        return ResolvedCitation::unresolved(token);
    };
    let parsed = Citation::parse(token);
    let grammar_doc_id = match &parsed {
        Some(Citation::Ncert { doc_id, .. }) => Some(doc_id.clone()),
        _ => None,
    };
    ResolvedCitation {
        citation: token.to_string(),
        resolved: true,
        source_type: parsed.as_ref().map(|c| c.source_type().to_string()),
        doc_id: chunk.source.doc_id.clone().or(grammar_doc_id),
        title: chunk.source.title.clone(),
        chapter: chunk.source.chapter.clone(),
        page: chunk.source.page,
        similarity: Some(chunk.similarity),
    }
}

fn failure_reason(report: &VerifierReport) -> String {
    let errors = report.all_errors();
    if errors.is_empty() {
        format!(
            "confidence {:.2} below acceptance threshold",
            report.confidence_score
        )
    } else {
        errors.join("; ")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("collaborator panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("collaborator panicked: {msg}")
    } else {
        "collaborator panicked".to_string()
    }
}

fn add_usage(total: TokenUsage, next: TokenUsage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: total.prompt_tokens + next.prompt_tokens,
        completion_tokens: total.completion_tokens + next.completion_tokens,
        total_tokens: total.total_tokens + next.total_tokens,
    }
}
