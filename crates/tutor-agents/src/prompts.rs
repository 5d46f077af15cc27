//! System prompts and the default prompt builder.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any preamble or the
//! message layout changes, so run metadata shows which prompt produced an
//! answer.

use std::fmt::Write as _;

use coordination::{LanguageLabel, TaskMode};

use crate::collaborators::{ChatMessage, ChatRole, PromptBuilder, PromptContext};

/// Prompt version. Bump on any preamble or layout change.
pub const PROMPT_VERSION: &str = "1.3.0";

/// Conversation turns carried into the prompt, most recent last.
pub const MAX_HISTORY_TURNS: usize = 6;

/// Shared rules appended to every mode preamble.
pub const BASE_RULES: &str = "\
## Rules
- Answer only what the student asked, at the level of their grade.
- Cite every factual statement with an evidence token such as [NCERT:doc_id:section] \
  or [PYQ:EXAM:YYYY:SLOT:qid], taken only from the evidence block.
- Never invent a citation. If the evidence does not cover a point, say so.
- Write formulas with standard English symbols and SI unit names.
- Do not reveal internal reasoning, scratch work or thinking steps.";

pub const EXPLAIN_PREAMBLE: &str = "\
You are a patient tutor for Indian school students. Explain the concept clearly, \
starting from what the student already knows, and finish with one short example.";

pub const SOLVE_PREAMBLE: &str = "\
You are a careful physics and mathematics tutor. Solve the problem step by step: \
list the given values with units, convert everything to one unit system, state the \
formula you use, substitute, and give the final answer rounded to the precision of \
the inputs.";

pub const DERIVE_PREAMBLE: &str = "\
You are a mathematics tutor. Derive the requested result from first principles, \
writing each equation on its own line and naming the law or identity used.";

pub const REVISE_PREAMBLE: &str = "\
You are a revision coach. Summarize the topic as short, exam-ready points, \
highlighting definitions and commonly tested facts.";

pub const DOCCHAT_PREAMBLE: &str = "\
You are a study assistant answering questions about the student's own documents. \
Use only the supplied evidence; if the documents do not contain the answer, say so.";

pub const STRATEGY_PREAMBLE: &str = "\
You are an exam strategy mentor. Give practical, specific advice on how to approach \
the exam or topic, grounded in past papers where the evidence allows.";

pub const PLAN_PREAMBLE: &str = "\
You are a study planner. Produce a study plan as numbered phases. Start each phase \
with a line `Phase N: <title>` followed by bullet points, one topic per bullet.";

pub fn preamble_for(mode: TaskMode) -> &'static str {
    match mode {
        TaskMode::Explain => EXPLAIN_PREAMBLE,
        TaskMode::Solve => SOLVE_PREAMBLE,
        TaskMode::Derive => DERIVE_PREAMBLE,
        TaskMode::Revise => REVISE_PREAMBLE,
        TaskMode::DocChat => DOCCHAT_PREAMBLE,
        TaskMode::Strategy => STRATEGY_PREAMBLE,
        TaskMode::Plan => PLAN_PREAMBLE,
    }
}

pub fn language_directive(language: LanguageLabel) -> &'static str {
    match language {
        LanguageLabel::English => "Respond in English.",
        LanguageLabel::Hindi => {
            "Respond in Hindi using Devanagari script. Keep formulas and unit symbols in English."
        }
        LanguageLabel::Hinglish => {
            "Respond in Hinglish (Hindi written in Latin script, mixed naturally with English). \
             Keep formulas and unit symbols in English."
        }
    }
}

/// Append `instructions` to the system message, inserting one if missing.
pub fn append_system_instructions(messages: &mut Vec<ChatMessage>, instructions: &str) {
    match messages.iter_mut().find(|m| m.role == ChatRole::System) {
        Some(system) => {
            system.content.push_str("\n\n");
            system.content.push_str(instructions);
        }
        None => messages.insert(0, ChatMessage::system(instructions)),
    }
}

/// Per-mode preamble, language directive, evidence block, history, question.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPromptBuilder;

impl DefaultPromptBuilder {
    fn system_prompt(ctx: &PromptContext<'_>) -> String {
        let task = ctx.task;
        let mut prompt = String::new();
        let _ = writeln!(prompt, "{}", preamble_for(task.mode));
        let _ = writeln!(
            prompt,
            "\nStudent: grade {} ({}), subject: {}.",
            task.grade, task.board, task.subject
        );
        if let Some(chapter) = &task.chapter {
            let _ = writeln!(prompt, "Chapter: {chapter}.");
        }
        let _ = writeln!(prompt, "{}", language_directive(ctx.language));
        let _ = writeln!(prompt, "\n{BASE_RULES}");

        if ctx.evidence.is_empty() {
            prompt.push_str(
                "\n## Evidence\nNo evidence was retrieved. Answer from the standard \
                 curriculum and avoid claims you cannot support.",
            );
        } else {
            prompt.push_str("\n## Evidence\n");
            for chunk in ctx.evidence.chunks() {
                let _ = writeln!(prompt, "[{}] {}", chunk.citation, chunk.text.trim());
            }
            if !ctx.evidence.has_sufficient_evidence() {
                prompt.push_str(
                    "The evidence above is limited. Flag anything it does not cover.",
                );
            }
        }
        prompt.trim_end().to_string()
    }
}

impl PromptBuilder for DefaultPromptBuilder {
    fn build(&self, ctx: &PromptContext<'_>) -> anyhow::Result<Vec<ChatMessage>> {
        let mut messages = vec![ChatMessage::system(Self::system_prompt(ctx))];

        let history = &ctx.task.conversation;
        let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in history.iter().skip(skip) {
            let message = match turn.role.as_str() {
                "assistant" => ChatMessage::assistant(&turn.content),
                "user" => ChatMessage::user(&turn.content),
                other => anyhow::bail!("unknown conversation role: {other:?}"),
            };
            messages.push(message);
        }

        messages.push(ChatMessage::user(ctx.task.message.trim()));
        Ok(messages)
    }

    fn version(&self) -> &str {
        PROMPT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordination::{ConversationTurn, EvidenceChunk, EvidencePack, Router, Task};

    fn build(task: &Task, evidence: &EvidencePack) -> anyhow::Result<Vec<ChatMessage>> {
        let decision = Router::new().route(task);
        DefaultPromptBuilder.build(&PromptContext {
            task,
            language: LanguageLabel::Hinglish,
            decision: &decision,
            evidence,
        })
    }

    #[test]
    fn system_prompt_carries_mode_language_and_evidence() {
        let task = Task::new("newton ka first law kya hai", TaskMode::Explain, "physics", "CBSE", 9)
            .with_chapter("Force and Laws of Motion");
        let evidence = EvidencePack::new(vec![
            EvidenceChunk::new("NCERT:phy9:9.2", "An object remains at rest...", 0.9),
            EvidenceChunk::new("NCERT:phy9:9.3", "Inertia is...", 0.8),
        ]);
        let messages = build(&task, &evidence).unwrap();

        assert_eq!(messages.len(), 2);
        let system = &messages[0].content;
        assert!(system.starts_with(EXPLAIN_PREAMBLE));
        assert!(system.contains("Hinglish"));
        assert!(system.contains("[NCERT:phy9:9.2]"));
        assert!(system.contains("Chapter: Force and Laws of Motion."));
        assert_eq!(messages[1], ChatMessage::user("newton ka first law kya hai"));
    }

    #[test]
    fn history_is_truncated_to_recent_turns() {
        let mut task = Task::new("and the third?", TaskMode::Revise, "physics", "CBSE", 9);
        task.conversation = (0..10)
            .map(|i| ConversationTurn {
                role: if i % 2 == 0 { "user" } else { "assistant" }.into(),
                content: format!("turn {i}"),
            })
            .collect();
        let messages = build(&task, &EvidencePack::empty()).unwrap();
        // system + 6 history + question
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[1].content, "turn 4");
        assert!(messages[0].content.contains("No evidence was retrieved"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut task = Task::new("q", TaskMode::Explain, "physics", "CBSE", 9);
        task.conversation = vec![ConversationTurn {
            role: "narrator".into(),
            content: "x".into(),
        }];
        assert!(build(&task, &EvidencePack::empty()).is_err());
    }

    #[test]
    fn instructions_append_to_system_message() {
        let mut messages = vec![ChatMessage::system("base"), ChatMessage::user("q")];
        append_system_instructions(&mut messages, "STRICT MODE");
        assert_eq!(messages[0].content, "base\n\nSTRICT MODE");

        let mut bare = vec![ChatMessage::user("q")];
        append_system_instructions(&mut bare, "fix it");
        assert_eq!(bare[0], ChatMessage::system("fix it"));
    }
}
