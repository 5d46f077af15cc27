//! Prometheus metrics for the answer pipeline.
//!
//! One registry per [`PipelineMetrics`]; clones share it. Exposed in the
//! text format at `GET /metrics`.

use std::sync::Arc;

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_histogram_with_registry, CounterVec, Encoder, Histogram, HistogramVec, Registry,
    TextEncoder,
};

/// Pipeline counters and histograms.
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Final outcome: `ok` (first draft), `regen` (accepted after regeneration), `fail`.
    pub responses_total: CounterVec,
    pub confidence_score: Histogram,
    pub regenerations_total: CounterVec,
    pub language_detections_total: CounterVec,
    pub request_latency_seconds: Histogram,
    pub model_latency_seconds: HistogramVec,
    pub citation_validations_total: CounterVec,
    pub retrieval_chunks: Histogram,
    pub retrieval_similarity: Histogram,
    pub failures_total: CounterVec,

    registry: Arc<Registry>,
}

impl PipelineMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let responses_total = register_counter_vec_with_registry!(
            "tutor_responses_total",
            "Answer requests by final outcome",
            &["outcome"],
            registry
        )?;

        let confidence_score = register_histogram_with_registry!(
            "tutor_confidence_score",
            "Confidence score of every verified draft",
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.72, 0.8, 0.82, 0.9, 0.95, 1.0],
            registry
        )?;

        let regenerations_total = register_counter_vec_with_registry!(
            "tutor_regenerations_total",
            "Regenerations by failing gate",
            &["reason"],
            registry
        )?;

        let language_detections_total = register_counter_vec_with_registry!(
            "tutor_language_detections_total",
            "Language detections by label and whether the session switched",
            &["language", "switched"],
            registry
        )?;

        let request_latency_seconds = register_histogram_with_registry!(
            "tutor_request_latency_seconds",
            "End-to-end request latency",
            vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0],
            registry
        )?;

        let model_latency_seconds = register_histogram_vec_with_registry!(
            "tutor_model_latency_seconds",
            "Generation latency per model",
            &["model"],
            vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            registry
        )?;

        let citation_validations_total = register_counter_vec_with_registry!(
            "tutor_citation_validations_total",
            "Answer citations resolved against retrieved evidence",
            &["result"],
            registry
        )?;

        let retrieval_chunks = register_histogram_with_registry!(
            "tutor_retrieval_chunks",
            "Chunks returned per retrieval",
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0],
            registry
        )?;

        let retrieval_similarity = register_histogram_with_registry!(
            "tutor_retrieval_similarity",
            "Average chunk similarity per retrieval",
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
            registry
        )?;

        let failures_total = register_counter_vec_with_registry!(
            "tutor_failures_total",
            "Failed requests by error code",
            &["code"],
            registry
        )?;

        Ok(Self {
            responses_total,
            confidence_score,
            regenerations_total,
            language_detections_total,
            request_latency_seconds,
            model_latency_seconds,
            citation_validations_total,
            retrieval_chunks,
            retrieval_similarity,
            failures_total,
            registry: Arc::new(registry),
        })
    }

    pub fn record_response(&self, outcome: &str) {
        self.responses_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_regeneration(&self, reason: &str) {
        self.regenerations_total.with_label_values(&[reason]).inc();
    }

    pub fn record_language(&self, language: &str, switched: bool) {
        let switched = if switched { "true" } else { "false" };
        self.language_detections_total
            .with_label_values(&[language, switched])
            .inc();
    }

    pub fn observe_model_latency(&self, model: &str, seconds: f64) {
        self.model_latency_seconds
            .with_label_values(&[model])
            .observe(seconds);
    }

    pub fn record_citation(&self, resolved: bool) {
        let result = if resolved { "resolved" } else { "unresolved" };
        self.citation_validations_total
            .with_label_values(&[result])
            .inc();
    }

    pub fn observe_retrieval(&self, chunks: usize, avg_similarity: f64) {
        self.retrieval_chunks.observe(chunks as f64);
        if chunks > 0 {
            self.retrieval_similarity.observe(avg_similarity);
        }
    }

    pub fn record_failure(&self, code: &str) {
        self.failures_total.with_label_values(&[code]).inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every series in the Prometheus text exposition format.
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_contains_recorded_series() {
        let m = PipelineMetrics::new().unwrap();
        m.record_response("ok");
        m.record_regeneration("fact_gate");
        m.record_language("hindi", true);
        m.record_citation(false);
        m.record_failure("VERIFICATION_FAILED");
        m.confidence_score.observe(0.9);
        m.observe_retrieval(3, 0.7);

        let text = m.export().unwrap();
        assert!(text.contains("tutor_responses_total{outcome=\"ok\"} 1"));
        assert!(text.contains("tutor_regenerations_total{reason=\"fact_gate\"} 1"));
        assert!(text.contains("tutor_language_detections_total{language=\"hindi\",switched=\"true\"} 1"));
        assert!(text.contains("tutor_citation_validations_total{result=\"unresolved\"} 1"));
        assert!(text.contains("tutor_failures_total{code=\"VERIFICATION_FAILED\"} 1"));
        assert!(text.contains("tutor_confidence_score_count 1"));
        assert!(text.contains("tutor_retrieval_chunks_sum 3"));
    }

    #[test]
    fn clones_share_one_registry() {
        let m = PipelineMetrics::new().unwrap();
        let other = m.clone();
        other.record_response("fail");
        m.record_response("fail");
        assert!(m
            .export()
            .unwrap()
            .contains("tutor_responses_total{outcome=\"fail\"} 2"));
    }

    #[test]
    fn independent_instances_do_not_collide() {
        let a = PipelineMetrics::new().unwrap();
        let b = PipelineMetrics::new().unwrap();
        a.record_response("ok");
        assert!(!b.export().unwrap().contains("outcome=\"ok\""));
    }
}
