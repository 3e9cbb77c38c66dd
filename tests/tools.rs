mod common;

use common::ScriptedModel;
use prompt_chains::error::Error;
use prompt_chains::llm::LanguageModel;
use prompt_chains::tools::{self, CalculatorTool, LlmMathTool, Tool};
use std::sync::Arc;

#[tokio::test]
async fn calculator_evaluates_directly() {
    let out = CalculatorTool.run("2**10").await.unwrap();
    assert_eq!(out, "Answer: 1024");
}

#[tokio::test]
async fn calculator_strips_backticks() {
    let out = CalculatorTool.run("`3 * (4 + 1)`").await.unwrap();
    assert_eq!(out, "Answer: 15");
}

#[tokio::test]
async fn calculator_reports_bad_input() {
    let err = CalculatorTool.run("two plus two").await.unwrap_err();
    assert!(matches!(err, Error::Tool { .. }));
}

#[tokio::test]
async fn llm_math_passes_direct_answer_through() {
    let model = Arc::new(ScriptedModel::new(["Answer: 7"]));
    let tool = LlmMathTool::new(model.clone());
    assert_eq!(tool.run("What is 3 + 4?").await.unwrap(), "Answer: 7");
}

#[tokio::test]
async fn llm_math_stops_before_output_block() {
    let model = Arc::new(ScriptedModel::new([
        "```text\n37593 * 67\n```\n...evaluate(\"37593 * 67\")...\n```output\n1\n```",
    ]));
    let tool = LlmMathTool::new(model.clone());
    assert_eq!(tool.run("What is 37593 * 67?").await.unwrap(), "Answer: 2518731");
}

#[test]
fn load_tools_preserves_order_and_rejects_unknown() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(Vec::<String>::new()));

    let loaded = tools::load_tools(&["calculator", "llm-math"], Arc::clone(&model)).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].description().contains("arithmetic expressions"));
    assert!(loaded[1].description().contains("questions about math"));

    let err = tools::load_tools(&["serpapi"], model).err().unwrap();
    assert!(err.to_string().contains("serpapi"));
}
