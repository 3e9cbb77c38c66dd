//! Chains: a prompt template wired to a model, with or without memory.

use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::memory::ConversationBufferMemory;
use crate::prompt::PromptTemplate;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

/// Formats a prompt and sends it to the model.
pub struct LlmChain {
    llm: Arc<dyn LanguageModel>,
    prompt: PromptTemplate,
    verbose: bool,
}

impl LlmChain {
    pub fn new(llm: Arc<dyn LanguageModel>, prompt: PromptTemplate) -> Self {
        Self {
            llm,
            prompt,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn predict<K, V>(&self, values: &HashMap<K, V>) -> Result<String>
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
    {
        let prompt = self.prompt.format(values)?;
        if self.verbose {
            info!(model = self.llm.model(), "> Entering new LLMChain chain...");
            info!("Prompt after formatting:\n{prompt}");
        }
        let output = self.llm.generate(&prompt, &[]).await?;
        if self.verbose {
            info!("> Finished chain.");
        }
        Ok(output.trim().to_string())
    }

    /// Run a single-variable prompt with `input` bound to that variable.
    pub async fn run(&self, input: &str) -> Result<String> {
        match self.prompt.input_variables() {
            [only] => self.predict(&HashMap::from([(only.as_str(), input)])).await,
            vars => Err(Error::template(format!(
                "run() needs a prompt with exactly one input variable, found {}",
                vars.len()
            ))),
        }
    }
}

const DEFAULT_CONVERSATION_TEMPLATE: &str = "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. \
If the AI does not know the answer to a question, it truthfully says it does not know.

Current conversation:
{history}
Human: {input}
AI:";

/// A chat that remembers previous turns and replays them on every call.
pub struct ConversationChain {
    llm: Arc<dyn LanguageModel>,
    prompt: PromptTemplate,
    memory: ConversationBufferMemory,
    input_key: String,
    verbose: bool,
}

impl ConversationChain {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Result<Self> {
        let prompt = PromptTemplate::new(["history", "input"], DEFAULT_CONVERSATION_TEMPLATE)?;
        Self::with_prompt(llm, prompt, ConversationBufferMemory::default())
    }

    /// Use a custom prompt; its variables must be exactly the memory key
    /// and `input`.
    pub fn with_prompt(
        llm: Arc<dyn LanguageModel>,
        prompt: PromptTemplate,
        memory: ConversationBufferMemory,
    ) -> Result<Self> {
        let input_key = "input".to_string();
        let expected: BTreeSet<&str> = [memory.memory_key.as_str(), input_key.as_str()].into();
        let found: BTreeSet<&str> = prompt.input_variables().iter().map(String::as_str).collect();
        if expected != found {
            return Err(Error::template(format!(
                "conversation prompt expects variables {expected:?}, found {found:?}"
            )));
        }
        Ok(Self {
            llm,
            prompt,
            memory,
            input_key,
            verbose: false,
        })
    }

    /// Swap in another memory. Its key and speaker prefixes must match the
    /// ones the prompt was built for, or the replayed history and the stop
    /// sequence would disagree with the prompt's own speaker labels.
    pub fn with_memory(mut self, memory: ConversationBufferMemory) -> Result<Self> {
        if memory.memory_key != self.memory.memory_key {
            return Err(Error::template(format!(
                "memory key '{}' does not match prompt variable '{}'",
                memory.memory_key, self.memory.memory_key
            )));
        }
        if memory.human_prefix != self.memory.human_prefix
            || memory.ai_prefix != self.memory.ai_prefix
        {
            return Err(Error::template(format!(
                "memory speakers '{}'/'{}' do not match prompt speakers '{}'/'{}'",
                memory.human_prefix, memory.ai_prefix, self.memory.human_prefix, self.memory.ai_prefix
            )));
        }
        self.memory = memory;
        Ok(self)
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn memory(&self) -> &ConversationBufferMemory {
        &self.memory
    }

    /// Send `input` with the conversation so far and record the reply.
    pub async fn predict(&mut self, input: &str) -> Result<String> {
        let history = self.memory.buffer();
        let prompt = self.prompt.format(&HashMap::from([
            (self.memory.memory_key.as_str(), history.as_str()),
            (self.input_key.as_str(), input),
        ]))?;

        if self.verbose {
            info!(model = self.llm.model(), "> Entering new ConversationChain chain...");
            info!("Prompt after formatting:\n{prompt}");
        }

        let stop = vec![format!("\n{}:", self.memory.human_prefix)];
        let output = self.llm.generate(&prompt, &stop).await?;
        let output = output.trim().to_string();

        if self.verbose {
            info!("> Finished chain.");
        }

        self.memory.save_context(input, &output);
        Ok(output)
    }
}
