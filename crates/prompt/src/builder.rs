//! Grounded prompt builder.
//!
//! Renders the system and user templates with the question and the labeled
//! evidence snippets. The citation labels embedded here are the same labels
//! the postprocessor appends to the answer, so the model sees exactly the
//! sources the caller will be shown.

use citegate_core::{AppError, AppResult};
use citegate_generation::ChatMessage;
use citegate_retrieval::Hit;
use handlebars::Handlebars;
use serde_json::json;

/// System instructions for grounded answering.
const SYSTEM_TEMPLATE: &str = "\
You are a precise assistant. Answer using only the context snippets provided. \
If the context does not contain the answer, say you do not know. \
Do not invent sources and do not add your own source line; sources are \
attached separately.";

/// User message template. `context` is the labeled snippet block, empty when
/// no evidence survived normalization.
const USER_TEMPLATE: &str = "\
{{#if context}}Context:
{{context}}

{{/if}}Question: {{question}}";

/// Build the full message sequence for a question and its evidence set.
///
/// Each snippet is prefixed with its citation label so the model can ground
/// statements in a specific source. Evidence order is preserved.
pub fn build_messages(question: &str, evidence: &[Hit]) -> AppResult<Vec<ChatMessage>> {
    let context = render_context(evidence);
    tracing::debug!(
        snippets = evidence.len(),
        context_chars = context.len(),
        "Building prompt messages"
    );

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string("user", USER_TEMPLATE)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let user = handlebars
        .render("user", &json!({ "question": question, "context": context }))
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(vec![
        ChatMessage::system(SYSTEM_TEMPLATE),
        ChatMessage::user(user),
    ])
}

/// Format the evidence set as a labeled snippet block.
fn render_context(evidence: &[Hit]) -> String {
    evidence
        .iter()
        .map(|hit| format!("[{}] {}", hit.label(), hit.snippet_text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegate_retrieval::HitMeta;

    fn hit(doc_id: &str, section: Option<&str>, text: &str) -> Hit {
        Hit {
            text: Some(text.to_string()),
            meta: HitMeta {
                doc_id: Some(doc_id.to_string()),
                section: section.map(String::from),
                text: None,
            },
        }
    }

    #[test]
    fn test_messages_have_system_then_user() {
        let evidence = vec![hit("A", Some("intro"), "hello")];
        let messages = build_messages("what is this?", &evidence).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Question: what is this?"));
    }

    #[test]
    fn test_snippets_carry_citation_labels() {
        let evidence = vec![
            hit("A", Some("intro"), "first snippet"),
            hit("B", None, "second snippet"),
        ];
        let messages = build_messages("q", &evidence).unwrap();
        let user = &messages[1].content;

        assert!(user.contains("[A#intro] first snippet"));
        assert!(user.contains("[B] second snippet"));
        // Evidence order preserved
        assert!(user.find("[A#intro]").unwrap() < user.find("[B]").unwrap());
    }

    #[test]
    fn test_empty_evidence_omits_context_block() {
        let messages = build_messages("q", &[]).unwrap();
        let user = &messages[1].content;
        assert!(!user.contains("Context:"));
        assert_eq!(user, "Question: q");
    }

    #[test]
    fn test_is_deterministic() {
        let evidence = vec![hit("A", None, "snippet")];
        let first = build_messages("q", &evidence).unwrap();
        let second = build_messages("q", &evidence).unwrap();
        assert_eq!(first, second);
    }
}
