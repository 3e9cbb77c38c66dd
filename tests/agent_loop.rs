mod common;

use common::ScriptedModel;
use prompt_chains::agent::{AgentType, ITERATION_LIMIT_OUTPUT, initialize_agent};
use prompt_chains::config::AgentConfig;
use prompt_chains::error::Error;
use prompt_chains::llm::LanguageModel;
use prompt_chains::tools::{self, CalculatorTool, Tool};
use std::sync::Arc;

fn config(max_iterations: u32) -> AgentConfig {
    AgentConfig {
        max_iterations,
        verbose: true,
        ..AgentConfig::default()
    }
}

#[tokio::test]
async fn power_question_uses_llm_math_then_answers() {
    // Agent and llm-math share one model, so responses interleave:
    // agent step, math translation, agent final answer.
    let model = Arc::new(ScriptedModel::new([
        " I need to use a calculator to solve this.\nAction: Calculator\nAction Input: 2^.023\nObservation: made up",
        "```text\n2**.023\n```\n...evaluate(\"2**.023\")...\n",
        " I now know the final answer.\nFinal Answer: 2 raised to the .023 power is about 1.016.",
    ]));
    let llm: Arc<dyn LanguageModel> = model.clone();
    let tools = tools::load_tools(&["llm-math"], Arc::clone(&llm)).unwrap();
    let agent = initialize_agent(tools, llm, AgentType::ZeroShotReactDescription, config(15))
        .unwrap();

    let (answer, steps) = agent
        .run_with_steps("What is 2 raised to the .023 power?")
        .await
        .unwrap();

    assert_eq!(answer, "2 raised to the .023 power is about 1.016.");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].0.tool, "Calculator");
    assert_eq!(steps[0].0.input, "2^.023");
    let expected = format!("Answer: {}", 2f64.powf(0.023));
    assert_eq!(steps[0].1, expected);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].starts_with("Answer the following questions as best you can."));
    assert!(prompts[0].contains("Calculator: Useful for when you need to answer questions about math."));
    assert!(prompts[0].contains("should be one of [Calculator]"));
    assert!(prompts[0].ends_with("Question: What is 2 raised to the .023 power?\nThought:"));
    assert!(prompts[1].contains("Question: 2^.023"));
    assert!(prompts[2].ends_with(&format!(
        "Action Input: 2^.023\nObservation: {expected}\nThought: "
    )));

    let stops = model.stops();
    assert_eq!(stops[0], ["\nObservation:", "\n\tObservation:"]);
    assert_eq!(stops[1], ["```output"]);
}

#[tokio::test]
async fn unknown_tool_becomes_observation() {
    let model = Arc::new(ScriptedModel::new([
        "Action: Search\nAction Input: weather",
        "Final Answer: done",
    ]));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(CalculatorTool)];
    let agent = initialize_agent(
        tools,
        model.clone(),
        AgentType::ZeroShotReactDescription,
        config(5),
    )
    .unwrap();

    let (answer, steps) = agent.run_with_steps("q").await.unwrap();
    assert_eq!(answer, "done");
    assert_eq!(
        steps[0].1,
        "Search is not a valid tool, try one of [Calculator]."
    );
}

#[tokio::test]
async fn tool_error_becomes_observation() {
    let model = Arc::new(ScriptedModel::new([
        "Action: Calculator\nAction Input: 1 / 0",
        "Final Answer: cannot divide by zero",
    ]));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(CalculatorTool)];
    let agent = initialize_agent(
        tools,
        model.clone(),
        AgentType::ZeroShotReactDescription,
        config(5),
    )
    .unwrap();

    let (_, steps) = agent.run_with_steps("q").await.unwrap();
    assert!(steps[0].1.starts_with("Error: "), "{}", steps[0].1);
    assert!(steps[0].1.contains("division by zero"));
}

#[tokio::test]
async fn stops_at_iteration_limit() {
    let looping = "Action: Calculator\nAction Input: 1 + 1";
    let model = Arc::new(ScriptedModel::new([looping, looping, looping]));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(CalculatorTool)];
    let agent = initialize_agent(
        tools,
        model.clone(),
        AgentType::ZeroShotReactDescription,
        config(3),
    )
    .unwrap();

    let (answer, steps) = agent.run_with_steps("q").await.unwrap();
    assert_eq!(answer, ITERATION_LIMIT_OUTPUT);
    assert_eq!(steps.len(), 3);
    assert!(steps.iter().all(|(_, obs)| obs == "Answer: 2"));
}

#[tokio::test]
async fn unparseable_output_is_error_by_default() {
    let model = Arc::new(ScriptedModel::new(["I have no idea."]));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(CalculatorTool)];
    let agent = initialize_agent(
        tools,
        model.clone(),
        AgentType::ZeroShotReactDescription,
        config(5),
    )
    .unwrap();

    let err = agent.run("q").await.unwrap_err();
    assert!(matches!(err, Error::OutputParse { .. }));
}

#[tokio::test]
async fn unparseable_output_fed_back_when_handled() {
    let model = Arc::new(ScriptedModel::new(["I have no idea.", "Final Answer: 4"]));
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(CalculatorTool)];
    let agent = initialize_agent(
        tools,
        model.clone(),
        AgentType::ZeroShotReactDescription,
        AgentConfig {
            handle_parsing_errors: true,
            ..config(5)
        },
    )
    .unwrap();

    assert_eq!(agent.run("q").await.unwrap(), "4");
    let second = &model.prompts()[1];
    assert!(second.contains("I have no idea.\nObservation: Invalid Format: I have no idea."));
}

#[test]
fn rejects_empty_and_duplicate_tools() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(Vec::<String>::new()));

    let none: Vec<Box<dyn Tool>> = Vec::new();
    assert!(
        initialize_agent(none, Arc::clone(&model), AgentType::default(), config(1)).is_err()
    );

    let dupes = tools::load_tools(&["calculator", "llm-math"], Arc::clone(&model)).unwrap();
    assert!(initialize_agent(dupes, model, AgentType::default(), config(1)).is_err());
}
