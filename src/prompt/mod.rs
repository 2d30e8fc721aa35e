// Prompt module
// Renders retrieved context, conversation history and the question into one model prompt


use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationTurn;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Separator between retrieved chunks in the context block
pub const CONTEXT_DELIMITER: &str = "\n\n";

pub const DEFAULT_TEMPLATE: &str = "\
Answer the question using only the information in the context below.
Read all of the context, answer thoroughly and in detail, and address every part of the question.

<context>
{context}
</context>

<question>
{question}
</question>";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Replacement for the built-in template; must contain both placeholders
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    #[inline]
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    #[inline]
    pub fn new(config: &PromptConfig) -> Self {
        config
            .template
            .as_ref()
            .map_or_else(Self::default, |template| Self {
                template: template.clone(),
            })
    }

    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Fill the template with the chunks (in retrieval order) and the question
    #[inline]
    pub fn render(&self, context_chunks: &[String], question: &str) -> String {
        let context = context_chunks.join(CONTEXT_DELIMITER);
        fill_template(&self.template, &context, question)
    }

    /// Prefix the prompt with earlier turns, oldest first
    #[inline]
    pub fn with_history(turns: &[ConversationTurn], prompt: &str) -> String {
        if turns.is_empty() {
            return prompt.to_string();
        }

        let history = turns
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.question, turn.answer))
            .join("\n");

        format!("Conversation so far:\n{history}\n\n{prompt}")
    }
}

/// Single pass so placeholder text inside the context or question is left alone
fn fill_template(template: &str, context: &str, question: &str) -> String {
    let mut rendered = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    loop {
        let next = [(CONTEXT_PLACEHOLDER, context), (QUESTION_PLACEHOLDER, question)]
            .into_iter()
            .filter_map(|(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|(at, _, _)| *at);

        let Some((at, placeholder, value)) = next else {
            rendered.push_str(rest);
            return rendered;
        };

        let (head, tail) = rest.split_at(at);
        rendered.push_str(head);
        rendered.push_str(value);
        rest = tail.get(placeholder.len()..).unwrap_or_default();
    }
}
