pub mod agent;
pub mod chain;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod tools;

/// CLI override for LLM provider/model/temperature.
#[derive(Debug, Default, Clone)]
pub struct LlmOverride {
    pub provider: Option<llm::Provider>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}
