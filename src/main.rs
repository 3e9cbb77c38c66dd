use anyhow::{Context, Result};
use clap::Parser;
use prompt_chains::LlmOverride;
use prompt_chains::agent::{self, AgentType};
use prompt_chains::chain::{ConversationChain, LlmChain};
use prompt_chains::config::Config;
use prompt_chains::llm::{LanguageModel, LlmClient, Provider};
use prompt_chains::memory::ConversationBufferMemory;
use prompt_chains::prompt::PromptTemplate;
use prompt_chains::tools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const COMPANY_NAME_TEMPLATE: &str = "What is a good name for a company that makes {product}?";

/// Build an LlmClient from config + optional CLI override.
fn build_llm_client(
    config: &Config,
    llm_override: &LlmOverride,
    default_temperature: f32,
) -> Result<Arc<dyn LanguageModel>> {
    let provider = llm_override
        .provider
        .clone()
        .unwrap_or_else(|| config.llm.provider.clone());
    let provider_changed = llm_override
        .provider
        .as_ref()
        .is_some_and(|p| *p != config.llm.provider);
    let model = llm_override.model.clone().unwrap_or_else(|| {
        if provider_changed {
            provider.default_model().into()
        } else {
            config.model()
        }
    });
    let temperature = llm_override
        .temperature
        .or(config.llm.temperature)
        .unwrap_or(default_temperature);
    // Key env var and endpoint configured for one provider do not apply to another.
    let (api_key_env, base_url) = if provider_changed {
        (None, None)
    } else {
        (config.llm.api_key_env.clone(), config.llm.base_url.clone())
    };
    let client = LlmClient::from_config(
        provider,
        model,
        temperature,
        config.llm.max_tokens,
        api_key_env,
        base_url,
    )?;
    Ok(Arc::new(client))
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse a `key=value` pair for `--var`.
fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[derive(clap::Args)]
struct LlmArgs {
    /// Path to config file
    #[arg(short, long, default_value = "chains.toml")]
    config: PathBuf,

    /// LLM provider override: openai, anthropic, openrouter
    #[arg(long)]
    provider: Option<Provider>,

    /// LLM model override
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature override
    #[arg(long)]
    temperature: Option<f32>,
}

impl LlmArgs {
    fn llm_override(&self) -> LlmOverride {
        LlmOverride {
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "chains",
    about = "Prompt templates, a calculator-using ReAct agent and a remembering chat over hosted LLMs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Ask the model to name a company that makes PRODUCT
    Name {
        #[arg(default_value = "colorful socks")]
        product: String,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Answer a question with a zero-shot agent that can use a calculator
    Agent {
        #[arg(default_value = "What is 2 raised to the .023 power?")]
        question: String,

        /// Agent type
        #[arg(long, default_value = "zero-shot-react-description")]
        agent_type: AgentType,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Hold a conversation that remembers earlier turns
    Chat {
        /// Messages to send, in order
        #[arg(default_values_t = [
            "Hi there!".to_string(),
            "I'm doing well! Just having a conversation with an AI.".to_string(),
        ])]
        inputs: Vec<String>,

        /// Transcript file to resume from and save to
        #[arg(long)]
        history: Option<PathBuf>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Format a prompt template locally (no LLM call)
    Format {
        /// Template with {placeholders}
        #[arg(long, default_value = COMPANY_NAME_TEMPLATE)]
        template: String,

        /// Placeholder values as key=value
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_chains=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Name { product, llm } => {
            let config = load_config(&llm.config)?;
            let client = build_llm_client(&config, &llm.llm_override(), 0.9)?;
            let prompt = PromptTemplate::new(["product"], COMPANY_NAME_TEMPLATE)?;
            let chain = LlmChain::new(client, prompt);
            println!("{}", chain.run(&product).await?);
            Ok(())
        }
        Command::Agent {
            question,
            agent_type,
            llm,
        } => {
            let config = load_config(&llm.config)?;
            let client = build_llm_client(&config, &llm.llm_override(), 0.0)?;
            let tools = tools::load_tools(&config.agent.tools, Arc::clone(&client))?;
            let executor = agent::initialize_agent(tools, client, agent_type, config.agent)?;
            println!("{}", executor.run(&question).await?);
            Ok(())
        }
        Command::Chat {
            inputs,
            history,
            llm,
        } => {
            let config = load_config(&llm.config)?;
            let client = build_llm_client(&config, &llm.llm_override(), 0.0)?;
            let history_path = history.or(config.conversation.history_path.clone());

            let mut memory = match &history_path {
                Some(path) => ConversationBufferMemory::load_or_default(path),
                None => ConversationBufferMemory::default(),
            };
            memory.window = config.conversation.window;

            let mut conversation = ConversationChain::new(client)?
                .with_memory(memory)
                .context("conversation history does not fit the chat prompt")?
                .verbose(config.conversation.verbose);

            for input in &inputs {
                let output = conversation.predict(input).await?;
                println!("{output}");
            }

            if let Some(path) = history_path {
                conversation
                    .memory()
                    .save(&path)
                    .with_context(|| format!("saving history to {}", path.display()))?;
                info!(
                    turns = conversation.memory().len(),
                    path = %path.display(),
                    "conversation saved"
                );
            }
            Ok(())
        }
        Command::Format { template, vars } => {
            let prompt = PromptTemplate::from_template(template)?;
            let values: HashMap<String, String> = vars.into_iter().collect();
            let values = if values.is_empty() && prompt.input_variables() == ["product"] {
                HashMap::from([("product".to_string(), "colorful socks".to_string())])
            } else {
                values
            };
            println!("{}", prompt.format(&values)?);
            Ok(())
        }
    }
}
