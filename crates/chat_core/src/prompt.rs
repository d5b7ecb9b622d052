//! Prompt assembly.
//!
//! With context loaded, the prompt sent to the model is:
//!
//! ```text
//! Based on the following context:
//!
//! --- a.txt ---
//! <content of a.txt>
//!
//! --- b.docx ---
//! <content of b.docx>
//!
//! ---
//!
//! Question: <question>
//! ```
//!
//! Without context the question is sent unchanged.

use shared::ContextItem;

pub const CONTEXT_INTRO: &str = "Based on the following context:";
pub const QUESTION_PREFIX: &str = "Question: ";

/// Build the prompt for `question`. Item order and content are kept as-is;
/// nothing is truncated.
pub fn assemble(items: &[ContextItem], question: &str) -> String {
    if items.is_empty() {
        return question.to_string();
    }

    let body_len: usize = items.iter().map(|i| i.name.len() + i.content.len() + 10).sum();
    let mut prompt = String::with_capacity(CONTEXT_INTRO.len() + body_len + question.len() + 20);

    prompt.push_str(CONTEXT_INTRO);
    prompt.push_str("\n\n");
    for item in items {
        prompt.push_str("--- ");
        prompt.push_str(&item.name);
        prompt.push_str(" ---\n");
        prompt.push_str(&item.content);
        prompt.push_str("\n\n");
    }
    prompt.push_str("---\n\n");
    prompt.push_str(QUESTION_PREFIX);
    prompt.push_str(question);
    prompt
}
