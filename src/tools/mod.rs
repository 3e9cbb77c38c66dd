//! Tools an agent can call by name.
//!
//! Tools are looked up by identifier through [`load_tools`]. Each tool takes
//! a single free-text input and returns free text, which the agent feeds
//! back to the model as an observation.

pub mod calculator;
pub mod math;

use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use std::sync::Arc;

pub use calculator::{CalculatorTool, LlmMathTool};

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    async fn run(&self, input: &str) -> Result<String>;
}

/// Tool identifiers accepted by [`load_tools`].
pub const KNOWN_TOOLS: &[&str] = &["llm-math", "calculator"];

/// Build tools by identifier, preserving the requested order.
///
/// `llm-math` needs a model to translate questions into expressions;
/// `calculator` evaluates its input directly.
pub fn load_tools<S: AsRef<str>>(
    names: &[S],
    llm: Arc<dyn LanguageModel>,
) -> Result<Vec<Box<dyn Tool>>> {
    names
        .iter()
        .map(|name| -> Result<Box<dyn Tool>> {
            match name.as_ref() {
                "llm-math" => Ok(Box::new(LlmMathTool::new(Arc::clone(&llm)))),
                "calculator" => Ok(Box::new(CalculatorTool)),
                other => Err(Error::config(format!(
                    "unknown tool '{other}' (known: {})",
                    KNOWN_TOOLS.join(", ")
                ))),
            }
        })
        .collect()
}
