use crate::error::{Error, Result};
use crate::llm::Provider;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Falls back to the provider's default model.
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Overrides each command's own default temperature.
    pub temperature: Option<f32>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            max_tokens: default_max_tokens(),
            temperature: None,
            api_key_env: None,
            base_url: None,
        }
    }
}

/// Settings for the zero-shot tool-using agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Feed unparseable completions back to the model instead of failing.
    #[serde(default)]
    pub handle_parsing_errors: bool,
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            verbose: true,
            handle_parsing_errors: false,
            tools: default_tools(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Only replay the last `window` turns into the prompt.
    pub window: Option<usize>,
    /// Persist the transcript here between runs.
    pub history_path: Option<PathBuf>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            window: None,
            history_path: None,
        }
    }
}

// Defaults
fn default_max_tokens() -> u32 {
    256
}
fn default_max_iterations() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_tools() -> Vec<String> {
    vec!["llm-math".into()]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.llm.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(Error::config(format!(
                "llm.temperature must be between 0 and 2, got {t}"
            )));
        }
        if self.agent.max_iterations == 0 {
            return Err(Error::config("agent.max_iterations must be at least 1"));
        }
        if self.agent.tools.is_empty() {
            return Err(Error::config("agent.tools must name at least one tool"));
        }
        if self.conversation.window == Some(0) {
            return Err(Error::config("conversation.window must be at least 1"));
        }
        Ok(())
    }

    /// Model to use: explicit config, else the provider's default.
    pub fn model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| self.llm.provider.default_model().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml = r#"
[llm]
provider = "anthropic"
model = "claude-3-5-haiku-latest"
max_tokens = 512
temperature = 0.2
api_key_env = "MY_KEY"

[agent]
max_iterations = 5
verbose = false
handle_parsing_errors = true
tools = ["llm-math", "calculator"]

[conversation]
window = 3
history_path = "chat.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.provider, Provider::Anthropic);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.agent.max_iterations, 5);
        assert!(!config.agent.verbose);
        assert!(config.agent.handle_parsing_errors);
        assert_eq!(config.agent.tools, ["llm-math", "calculator"]);
        assert_eq!(config.conversation.window, Some(3));
        assert_eq!(
            config.conversation.history_path.as_deref(),
            Some(Path::new("chat.json"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.llm.provider, Provider::OpenAi);
        assert_eq!(config.llm.max_tokens, 256);
        assert!(config.llm.temperature.is_none());
        assert_eq!(config.agent.max_iterations, 15);
        assert!(config.agent.verbose);
        assert_eq!(config.agent.tools, ["llm-math"]);
        assert!(config.conversation.verbose);
        assert_eq!(config.model(), "gpt-4o-mini");
    }

    #[test]
    fn validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = Some(3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let mut config = Config::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut config = Config::default();
        config.conversation.window = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(config.agent.max_iterations, 15);
    }
}
