//! Evidence Pack — retrieved grounding chunks plus a sufficiency verdict.
//!
//! Produced fresh for each task and never mutated after creation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum chunk count for sufficient evidence.
pub const MIN_SUFFICIENT_CHUNKS: usize = 2;
/// Minimum average similarity for sufficient evidence.
pub const MIN_AVG_SIMILARITY: f64 = 0.5;

/// Source metadata attached to a chunk by the retrieval service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// One retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceChunk {
    /// `NCERT:<doc_id>:<section>` or `PYQ:<EXAM>:<YYYY>:<SLOT>:<qid>`.
    pub citation: String,
    #[serde(default)]
    pub text: String,
    /// Similarity to the query, in [0, 1].
    pub similarity: f64,
    #[serde(default)]
    pub source: ChunkSource,
}

impl EvidenceChunk {
    pub fn new(citation: impl Into<String>, text: impl Into<String>, similarity: f64) -> Self {
        Self {
            citation: citation.into(),
            text: text.into(),
            similarity,
            source: ChunkSource::default(),
        }
    }

    pub fn with_source(mut self, source: ChunkSource) -> Self {
        self.source = source;
        self
    }
}

/// Filters sent to the retrieval service alongside the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RetrievalFilters {
    pub board: String,
    pub grade: u8,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<String>,
}

/// Ordered chunks with a computed sufficiency flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidencePack {
    chunks: Vec<EvidenceChunk>,
    has_sufficient_evidence: bool,
    avg_similarity: f64,
}

impl EvidencePack {
    /// Build a pack and compute its verdict: ≥2 chunks and average similarity ≥0.5.
    pub fn new(chunks: Vec<EvidenceChunk>) -> Self {
        let avg_similarity = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.similarity).sum::<f64>() / chunks.len() as f64
        };
        let has_sufficient_evidence =
            chunks.len() >= MIN_SUFFICIENT_CHUNKS && avg_similarity >= MIN_AVG_SIMILARITY;
        Self {
            chunks,
            has_sufficient_evidence,
            avg_similarity,
        }
    }

    /// Zero evidence: a legitimate state, not a fault.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> &[EvidenceChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn has_sufficient_evidence(&self) -> bool {
        self.has_sufficient_evidence
    }

    pub fn avg_similarity(&self) -> f64 {
        self.avg_similarity
    }

    /// Exact lookup of a chunk by citation string.
    pub fn find_citation(&self, citation: &str) -> Option<&EvidenceChunk> {
        self.chunks.iter().find(|c| c.citation == citation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pack_is_insufficient() {
        let pack = EvidencePack::empty();
        assert!(pack.is_empty());
        assert!(!pack.has_sufficient_evidence());
        assert_eq!(pack.avg_similarity(), 0.0);
    }

    #[test]
    fn one_strong_chunk_is_not_enough() {
        let pack = EvidencePack::new(vec![EvidenceChunk::new("NCERT:bio10:6.1", "t", 0.95)]);
        assert!(!pack.has_sufficient_evidence());
    }

    #[test]
    fn two_weak_chunks_are_not_enough() {
        let pack = EvidencePack::new(vec![
            EvidenceChunk::new("NCERT:bio10:6.1", "t", 0.4),
            EvidenceChunk::new("NCERT:bio10:6.2", "t", 0.5),
        ]);
        assert!((pack.avg_similarity() - 0.45).abs() < 1e-9);
        assert!(!pack.has_sufficient_evidence());
    }

    #[test]
    fn two_good_chunks_are_sufficient() {
        let pack = EvidencePack::new(vec![
            EvidenceChunk::new("NCERT:bio10:6.1", "t", 0.5),
            EvidenceChunk::new("PYQ:NEET:2021:MAY:12", "t", 0.5),
        ]);
        assert!(pack.has_sufficient_evidence());
        assert!(pack.find_citation("PYQ:NEET:2021:MAY:12").is_some());
        assert!(pack.find_citation("NCERT:bio10:9.9").is_none());
    }
}
