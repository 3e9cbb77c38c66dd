use async_trait::async_trait;
use prompt_chains::error::Result;
use prompt_chains::llm::{LanguageModel, truncate_at_stop};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned completions in order and records every prompt it saw.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn stops(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, stop: &[String]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), stop.to_vec()));
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted model ran out of responses");
        Ok(truncate_at_stop(&next, stop).to_string())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
