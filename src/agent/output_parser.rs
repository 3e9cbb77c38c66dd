//! Parsing of ReAct-style completions into an action or a final answer.

use crate::error::{Error, Result};
use fancy_regex::Regex;
use std::sync::LazyLock;

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

static ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .expect("static regex")
});

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub tool: String,
    pub input: String,
    /// The raw completion, replayed into the scratchpad.
    pub log: String,
}

/// The model's final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// Parse one completion.
///
/// A completion that contains both a final answer and a parseable action is
/// rejected; the model has to pick one.
pub fn parse_output(text: &str) -> Result<AgentStep> {
    let includes_answer = text.contains(FINAL_ANSWER_ACTION);
    let action = ACTION_PATTERN
        .captures(text)
        .map_err(|e| Error::parse(format!("action pattern: {e}")))?;

    match action {
        Some(_) if includes_answer => Err(Error::output_parse(format!(
            "parsing LLM output produced both a final answer and a parse-able action: {text}"
        ))),
        Some(caps) => {
            let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let input = input.trim().trim_matches(' ').trim_matches('"');
            if tool.is_empty() {
                return Err(Error::output_parse(text));
            }
            Ok(AgentStep::Action(AgentAction {
                tool: tool.to_string(),
                input: input.to_string(),
                log: text.to_string(),
            }))
        }
        None if includes_answer => {
            let idx = text.rfind(FINAL_ANSWER_ACTION).unwrap_or_default();
            let output = text[idx + FINAL_ANSWER_ACTION.len()..].trim();
            Ok(AgentStep::Finish(AgentFinish {
                output: output.to_string(),
                log: text.to_string(),
            }))
        }
        None => Err(Error::output_parse(text)),
    }
}
