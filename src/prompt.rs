//! Prompt assembly.
//!
//! [`PROMPT_TEMPLATE`] is filled by plain text substitution of two
//! placeholders. Substitution is single-pass: placeholder text that appears
//! inside a question or retrieved document is copied through verbatim.
use crate::index::RetrievedMatch;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Reply the model is told to give when the context has no answer.
pub const REFUSAL_TEXT: &str = "I'm sorry, I couldn't find a trusted remedy for that symptom.";

/// Separator placed between retrieved documents in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

pub const PROMPT_TEMPLATE: &str = "\
You are a friendly home-remedy assistant. You suggest simple, trusted home remedies for common symptoms.

Answer the user's question using only the retrieved context below.
If the context does not contain a suitable remedy, reply exactly: \"I'm sorry, I couldn't find a trusted remedy for that symptom.\"
For every remedy you mention, cite its source URL from the context.
Only recommend home remedies. Do not give general medical advice, diagnoses, or prescriptions.

Retrieved Context:
{context}

User Question:
{question}

Answer:";

/// Join retrieved documents, in rank order, into one context block.
#[must_use]
pub fn format_context(matches: &[RetrievedMatch]) -> String {
    matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Fill [`PROMPT_TEMPLATE`] with `question` and `context`.
#[must_use]
pub fn assemble_prompt(question: &str, context: &str) -> String {
    fill_template(PROMPT_TEMPLATE, question, context)
}

fn fill_template(template: &str, question: &str, context: &str) -> String {
    let mut out = String::with_capacity(template.len() + question.len() + context.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
