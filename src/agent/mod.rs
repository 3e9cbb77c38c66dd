//! Zero-shot ReAct agent: the model reasons in text, picks a tool by name,
//! sees the tool's observation, and repeats until it states a final answer
//! or a hard stop is hit (max iterations).

pub mod output_parser;

pub use output_parser::{AgentAction, AgentFinish, AgentStep, parse_output};

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use crate::prompt::PromptTemplate;
use crate::tools::Tool;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

const SUFFIX: &str = "Begin!

Question: {input}
Thought:{agent_scratchpad}";

pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

const OBSERVATION_PREFIX: &str = "Observation: ";
const LLM_PREFIX: &str = "Thought:";

/// Agent flavours. Only zero-shot ReAct over tool descriptions is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentType {
    #[default]
    ZeroShotReactDescription,
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zero-shot-react-description" => Ok(Self::ZeroShotReactDescription),
            other => Err(Error::config(format!("unsupported agent type '{other}'"))),
        }
    }
}

/// Runs the think/act/observe loop over a fixed set of tools.
pub struct AgentExecutor {
    llm: Arc<dyn LanguageModel>,
    tools: Vec<Box<dyn Tool>>,
    prompt: PromptTemplate,
    config: AgentConfig,
    stop: Vec<String>,
}

/// Build an executor for `agent_type`.
///
/// Tool names must be unique, since the model selects tools by name.
pub fn initialize_agent(
    tools: Vec<Box<dyn Tool>>,
    llm: Arc<dyn LanguageModel>,
    agent_type: AgentType,
    config: AgentConfig,
) -> Result<AgentExecutor> {
    if tools.is_empty() {
        return Err(Error::config("an agent needs at least one tool"));
    }
    let mut seen = HashSet::new();
    for tool in &tools {
        if !seen.insert(tool.name()) {
            return Err(Error::config(format!(
                "duplicate tool name '{}'",
                tool.name()
            )));
        }
    }

    let prompt = match agent_type {
        AgentType::ZeroShotReactDescription => create_prompt(&tools)?,
    };

    Ok(AgentExecutor {
        llm,
        tools,
        prompt,
        config,
        stop: vec![
            format!("\n{}", OBSERVATION_PREFIX.trim_end()),
            format!("\n\t{}", OBSERVATION_PREFIX.trim_end()),
        ],
    })
}

/// Assemble prefix, tool descriptions, format instructions and suffix.
pub fn create_prompt(tools: &[Box<dyn Tool>]) -> Result<PromptTemplate> {
    let tool_strings = tools
        .iter()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ");
    // Tool names and descriptions are free text and may contain braces.
    let instructions = FORMAT_INSTRUCTIONS.replace("{tool_names}", &escape_braces(&tool_names));
    let tool_strings = escape_braces(&tool_strings);

    let template = [PREFIX, tool_strings.as_str(), instructions.as_str(), SUFFIX].join("\n\n");
    PromptTemplate::new(["input", "agent_scratchpad"], template)
}

impl AgentExecutor {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Run the agent and return its final answer.
    pub async fn run(&self, input: &str) -> Result<String> {
        let (output, _) = self.run_with_steps(input).await?;
        Ok(output)
    }

    /// Run the agent, also returning each action with its observation.
    pub async fn run_with_steps(&self, input: &str) -> Result<(String, Vec<(AgentAction, String)>)> {
        let mut steps: Vec<(AgentAction, String)> = Vec::new();

        if self.config.verbose {
            info!(input, model = self.llm.model(), "> Entering new AgentExecutor chain...");
        }

        for iteration in 0..self.config.max_iterations {
            let scratchpad = construct_scratchpad(&steps);
            let prompt = self.prompt.format(&HashMap::from([
                ("input", input),
                ("agent_scratchpad", scratchpad.as_str()),
            ]))?;

            let completion = self.llm.generate(&prompt, &self.stop).await?;
            debug!(iteration, completion = %completion, "agent completion");

            let parsed = match parse_output(&completion) {
                Ok(step) => step,
                Err(Error::OutputParse { output }) if self.config.handle_parsing_errors => {
                    warn!(iteration, "could not parse agent output, feeding error back");
                    let action = AgentAction {
                        tool: "_Exception".into(),
                        input: output.clone(),
                        log: completion.clone(),
                    };
                    steps.push((action, format!("Invalid Format: {output}")));
                    continue;
                }
                Err(e) => return Err(e),
            };

            match parsed {
                AgentStep::Finish(finish) => {
                    if self.config.verbose {
                        info!("{}", finish.log.trim());
                        info!("> Finished chain.");
                    }
                    return Ok((finish.output, steps));
                }
                AgentStep::Action(action) => {
                    if self.config.verbose {
                        info!("{}", action.log.trim());
                    }
                    let observation = self.take_action(&action).await;
                    if self.config.verbose {
                        info!("{OBSERVATION_PREFIX}{observation}");
                    }
                    steps.push((action, observation));
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "agent hit iteration limit"
        );
        Ok((ITERATION_LIMIT_OUTPUT.to_string(), steps))
    }

    /// Execute one action; unknown tools and tool failures become observations.
    async fn take_action(&self, action: &AgentAction) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == action.tool) else {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                self.tool_names().join(", ")
            );
        };

        debug!(tool = %action.tool, input = %action.input, "executing tool");
        match tool.run(&action.input).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(tool = %action.tool, error = %e, "tool failed");
                format!("Error: {e}")
            }
        }
    }
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Replay prior steps so the model sees its own reasoning and observations.
fn construct_scratchpad(steps: &[(AgentAction, String)]) -> String {
    let mut thoughts = String::new();
    for (action, observation) in steps {
        thoughts.push_str(&action.log);
        thoughts.push_str(&format!("\n{OBSERVATION_PREFIX}{observation}\n{LLM_PREFIX} "));
    }
    thoughts
}
