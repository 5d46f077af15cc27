//! Task contract — the immutable input to one pipeline run.
//!
//! A [`Task`] is owned by the caller and only ever read by the pipeline.
//! [`Task::validate`] is the fail-fast check the orchestrator runs before
//! any collaborator is contacted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::LanguageLabel;

/// Maximum accepted user message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 8000;

/// Grades served by the curriculum (inclusive).
pub const GRADE_RANGE: std::ops::RangeInclusive<u8> = 1..=12;

/// Pedagogical mode of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Explain,
    Solve,
    Derive,
    Revise,
    #[serde(rename = "docchat")]
    DocChat,
    Strategy,
    Plan,
}

impl TaskMode {
    pub const ALL: [TaskMode; 7] = [
        Self::Explain,
        Self::Solve,
        Self::Derive,
        Self::Revise,
        Self::DocChat,
        Self::Strategy,
        Self::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Solve => "solve",
            Self::Derive => "derive",
            Self::Revise => "revise",
            Self::DocChat => "docchat",
            Self::Strategy => "strategy",
            Self::Plan => "plan",
        }
    }

    /// Numeric modes: no citations required, math gate enabled.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Solve | Self::Derive)
    }

    /// Modes whose answers should be grounded in retrieved evidence.
    pub fn needs_grounding(&self) -> bool {
        matches!(
            self,
            Self::Explain | Self::DocChat | Self::Revise | Self::Strategy | Self::Plan
        )
    }
}

impl std::fmt::Display for TaskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskMode {
    type Err = TaskValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| TaskValidationError::InvalidMode(s.to_string()))
    }
}

/// Optional routing signals supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaskSignals {
    /// The question involves substantial numeric work.
    #[serde(default)]
    pub numeric_heavy: bool,
    /// The answer touches safety-relevant content (lab procedures, health).
    #[serde(default)]
    pub safety_critical: bool,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConversationTurn {
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
}

/// A student's question plus its pedagogical context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub message: String,
    pub mode: TaskMode,
    pub subject: String,
    /// Curriculum board, e.g. `CBSE`.
    pub board: String,
    pub grade: u8,
    #[serde(default)]
    pub signals: TaskSignals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<ConversationTurn>,
    /// Documents the student attached or is chatting with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_language: Option<LanguageLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Task {
    pub fn new(
        message: impl Into<String>,
        mode: TaskMode,
        subject: impl Into<String>,
        board: impl Into<String>,
        grade: u8,
    ) -> Self {
        Self {
            message: message.into(),
            mode,
            subject: subject.into(),
            board: board.into(),
            grade,
            signals: TaskSignals::default(),
            conversation: Vec::new(),
            document_ids: Vec::new(),
            chapter: None,
            requested_language: None,
            session_id: None,
        }
    }

    pub fn with_signals(mut self, signals: TaskSignals) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_documents(mut self, ids: Vec<String>) -> Self {
        self.document_ids = ids;
        self
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn with_language(mut self, language: LanguageLabel) -> Self {
        self.requested_language = Some(language);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn has_documents(&self) -> bool {
        !self.document_ids.is_empty()
    }

    /// Reject malformed tasks before any external call is made.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(TaskValidationError::EmptyMessage);
        }
        let len = message.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(TaskValidationError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }
        if !GRADE_RANGE.contains(&self.grade) {
            return Err(TaskValidationError::GradeOutOfRange(self.grade));
        }
        if self.subject.trim().is_empty() {
            return Err(TaskValidationError::MissingSubject);
        }
        Ok(())
    }
}

/// Reasons a task is rejected as `INVALID_INPUT`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("message too long: {len} chars (max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("invalid task mode: {0:?}")]
    InvalidMode(String),

    #[error("grade {0} out of range (1-12)")]
    GradeOutOfRange(u8),

    #[error("subject is empty")]
    MissingSubject,
}
