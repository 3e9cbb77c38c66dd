use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One exchange between the human and the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub human: String,
    pub ai: String,
    pub timestamp: DateTime<Utc>,
}

/// Accumulates dialogue turns and renders them back as prompt context.
///
/// With a window of `k`, only the last `k` turns are rendered; all turns are
/// still kept and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationBufferMemory {
    #[serde(default = "default_human_prefix")]
    pub human_prefix: String,
    #[serde(default = "default_ai_prefix")]
    pub ai_prefix: String,
    #[serde(default = "default_memory_key")]
    pub memory_key: String,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    turns: Vec<Turn>,
}

fn default_human_prefix() -> String {
    "Human".into()
}
fn default_ai_prefix() -> String {
    "AI".into()
}
fn default_memory_key() -> String {
    "history".into()
}

impl Default for ConversationBufferMemory {
    fn default() -> Self {
        Self {
            human_prefix: default_human_prefix(),
            ai_prefix: default_ai_prefix(),
            memory_key: default_memory_key(),
            window: None,
            turns: Vec::new(),
        }
    }
}

impl ConversationBufferMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render only the most recent `k` turns.
    pub fn with_window(mut self, k: usize) -> Self {
        self.window = Some(k);
        self
    }

    pub fn with_prefixes(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.human_prefix = human.into();
        self.ai_prefix = ai.into();
        self
    }

    pub fn save_context(&mut self, input: &str, output: &str) {
        self.turns.push(Turn {
            human: input.to_string(),
            ai: output.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// The transcript as it is fed into the next prompt.
    pub fn buffer(&self) -> String {
        let skip = match self.window {
            Some(k) => self.turns.len().saturating_sub(k),
            None => 0,
        };
        self.turns[skip..]
            .iter()
            .map(|t| {
                format!(
                    "{}: {}\n{}: {}",
                    self.human_prefix, t.human, self.ai_prefix, t.ai
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            Error::parse(format!("parse conversation history {}: {e}", path.display()))
        })
    }

    /// Load a saved transcript, starting fresh if it is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(memory) => {
                debug!(turns = memory.len(), path = %path.display(), "loaded conversation history");
                memory
            }
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable conversation history");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::parse(format!("serialize conversation history: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
