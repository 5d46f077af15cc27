//! Tool planner: decides whether a task needs retrieval and runs it.
//!
//! Retrieval never fails a task. Errors, timeouts and an unconfigured
//! retriever all produce an empty [`EvidencePack`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use coordination::{otel, EvidencePack, RetrievalFilters, Task, TaskMode};
use tracing::Instrument;

use crate::collaborators::{NullRetriever, Retriever};
use crate::config::DEFAULT_TOP_K;
use crate::errors::RetrievalError;
use crate::metrics::PipelineMetrics;

pub struct ToolPlanner {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
    timeout: Duration,
    metrics: Option<PipelineMetrics>,
}

impl ToolPlanner {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            retriever,
            top_k: DEFAULT_TOP_K,
            timeout: Duration::from_secs(10),
            metrics: None,
        }
    }

    /// Planner that never retrieves.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullRetriever))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Grounding modes with attached documents, and every docchat task.
    pub fn should_retrieve(task: &Task) -> bool {
        task.mode == TaskMode::DocChat || (task.mode.needs_grounding() && task.has_documents())
    }

    pub fn filters_for(task: &Task) -> RetrievalFilters {
        RetrievalFilters {
            board: task.board.clone(),
            grade: task.grade,
            subject: task.subject.clone(),
            chapter: task.chapter.clone(),
            document_ids: task.document_ids.clone(),
        }
    }

    /// Build the evidence pack for `task`. Never fails.
    pub async fn execute_plan(&self, task: &Task) -> EvidencePack {
        self.execute_plan_for(task, "-").await
    }

    /// Like [`Self::execute_plan`], tagging the retrieval span with a request id.
    pub async fn execute_plan_for(&self, task: &Task, request_id: &str) -> EvidencePack {
        if !Self::should_retrieve(task) {
            tracing::debug!(mode = %task.mode, "retrieval not needed");
            return EvidencePack::empty();
        }

        let span = otel::retrieval_span(request_id, self.top_k);
        let started = Instant::now();
        let filters = Self::filters_for(task);

        let outcome = tokio::time::timeout(
            self.timeout,
            self.retriever.retrieve(&task.message, &filters, self.top_k),
        )
        .instrument(span.clone())
        .await;

        let pack = match outcome {
            Ok(Ok(chunks)) => EvidencePack::new(chunks),
            Ok(Err(e)) => {
                tracing::warn!(request_id, error = %e, "retrieval failed; continuing without evidence");
                EvidencePack::empty()
            }
            Err(_) => {
                let e = RetrievalError::Timeout(self.timeout);
                tracing::warn!(request_id, error = %e, "retrieval failed; continuing without evidence");
                EvidencePack::empty()
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        otel::record_retrieval_result(&span, pack.len(), pack.has_sufficient_evidence(), elapsed_ms);
        if let Some(metrics) = &self.metrics {
            metrics.observe_retrieval(pack.len(), pack.avg_similarity());
        }
        tracing::debug!(
            request_id,
            chunks = pack.len(),
            sufficient = pack.has_sufficient_evidence(),
            elapsed_ms,
            "retrieval complete"
        );
        pack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(mode: TaskMode) -> Task {
        Task::new("question", mode, "physics", "CBSE", 9)
    }

    #[test]
    fn retrieval_policy_by_mode() {
        let docs = vec!["doc-1".to_string()];
        assert!(ToolPlanner::should_retrieve(&task(TaskMode::DocChat)));
        assert!(!ToolPlanner::should_retrieve(&task(TaskMode::Explain)));
        assert!(ToolPlanner::should_retrieve(
            &task(TaskMode::Explain).with_documents(docs.clone())
        ));
        assert!(ToolPlanner::should_retrieve(
            &task(TaskMode::Plan).with_documents(docs.clone())
        ));
        assert!(!ToolPlanner::should_retrieve(
            &task(TaskMode::Solve).with_documents(docs.clone())
        ));
        assert!(!ToolPlanner::should_retrieve(
            &task(TaskMode::Derive).with_documents(docs)
        ));
    }

    #[test]
    fn filters_copy_task_context() {
        let t = task(TaskMode::DocChat)
            .with_chapter("Motion")
            .with_documents(vec!["d1".into(), "d2".into()]);
        let f = ToolPlanner::filters_for(&t);
        assert_eq!(f.board, "CBSE");
        assert_eq!(f.grade, 9);
        assert_eq!(f.chapter.as_deref(), Some("Motion"));
        assert_eq!(f.document_ids.len(), 2);
    }

    #[tokio::test]
    async fn disabled_planner_returns_empty_pack() {
        let pack = ToolPlanner::disabled()
            .execute_plan(&task(TaskMode::DocChat))
            .await;
        assert!(pack.is_empty());
        assert!(!pack.has_sufficient_evidence());
    }
}
