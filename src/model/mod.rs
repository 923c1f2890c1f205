pub mod token;

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::config::OperatorConfig;

pub use token::{make_token, Token};

const PREVIEW_CHARS: usize = 50;

// Checked in order; the first trigger contained in the query wins.
const RESPONSES: &[(&str, &str)] = &[
    ("hello", "Hello! I'm Mongoose OS operated by {operator}. How can I help?"),
    ("hi", "Hi there! Mongoose OS is ready in {mode} mode."),
    ("help", "I can help you with questions about this repository. Ask me anything!"),
    ("status", "Mongoose OS is running in {mode} mode, operator: {operator}"),
    ("who are you", "I'm Mongoose OS AI, operated by {operator}. I assist with repository questions."),
    ("what can you do", "I can answer questions, provide code insights, and help navigate the repository."),
];

const EMPTY_PROMPT: &str = "Please ask me a question about the repository.";

// Offline canned-response engine
pub struct PassiveModel {
    config: Arc<OperatorConfig>,
}

impl PassiveModel {
    pub fn new(config: Arc<OperatorConfig>) -> Self {
        Self { config }
    }

    pub fn respond(&self, query: &str, repo: &str, context: Option<&Map<String, Value>>) -> String {
        debug!("Resolving query for repo {} (context: {:?})", repo, context);

        let normalized = query.trim().to_lowercase();

        if let Some((keyword, template)) = RESPONSES
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
        {
            debug!("Matched keyword {:?}", keyword);
            return self.render(template);
        }

        if normalized.is_empty() {
            return EMPTY_PROMPT.to_string();
        }

        format!(
            "I received your query about '{}' - Mongoose OS is processing in {} mode. This is a demo response.",
            preview(query),
            self.config.mode
        )
    }

    fn render(&self, template: &str) -> String {
        // Mode first so an operator name containing "{mode}" stays literal.
        template
            .replace("{mode}", &self.config.mode.to_string())
            .replace("{operator}", &self.config.operator)
    }
}

fn preview(query: &str) -> String {
    if query.chars().count() <= PREVIEW_CHARS {
        return query.to_string();
    }
    let mut head: String = query.chars().take(PREVIEW_CHARS).collect();
    head.push_str("...");
    head
}
