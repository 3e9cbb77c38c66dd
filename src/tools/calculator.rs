use super::Tool;
use super::math::{evaluate, format_number};
use crate::error::{Error, Result};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use fancy_regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

const CALCULATOR_NAME: &str = "Calculator";
const CALCULATOR_DESCRIPTION: &str = "Useful for when you need to answer questions about math.";

const MATH_PROMPT: &str = r#"Translate a math problem into an expression that can be evaluated by a simple calculator. The calculator understands numbers, + - * / % and ** (power), parentheses, the constants pi and e, and the functions sqrt, abs, exp, ln, log10, log2, sin, cos, tan, floor, ceil and round.

Use the following format:

Question: ${Question with math problem.}
```text
${single line mathematical expression that solves the problem}
```
...evaluate(expression)...
```output
${Output of running the code}
```
Answer: ${Answer}

Begin.

Question: What is 37593 * 67?
```text
37593 * 67
```
...evaluate("37593 * 67")...
```output
2518731
```
Answer: 2518731

Question: 37593^(1/5)
```text
37593**(1/5)
```
...evaluate("37593**(1/5)")...
```output
8.222831614237718
```
Answer: 8.222831614237718

Question: {question}
"#;

static TEXT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```text(.*?)```").expect("static regex")
});

/// Answers math questions by asking the model for an expression and
/// evaluating it locally.
pub struct LlmMathTool {
    llm: Arc<dyn LanguageModel>,
}

impl LlmMathTool {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    fn prompt(question: &str) -> String {
        MATH_PROMPT.replace("{question}", question)
    }
}

#[async_trait]
impl Tool for LlmMathTool {
    fn name(&self) -> &str {
        CALCULATOR_NAME
    }

    fn description(&self) -> &str {
        CALCULATOR_DESCRIPTION
    }

    async fn run(&self, input: &str) -> Result<String> {
        let stop = vec!["```output".to_string()];
        let completion = self.llm.generate(&Self::prompt(input), &stop).await?;
        debug!(question = input, completion = %completion, "llm-math completion");
        interpret_math_output(&completion)
    }
}

/// Turn the model's reply into `Answer: <value>`.
fn interpret_math_output(completion: &str) -> Result<String> {
    let text = completion.trim();

    let captures = TEXT_BLOCK
        .captures(text)
        .map_err(|e| Error::tool(CALCULATOR_NAME, e.to_string()))?;
    if let Some(expr) = captures.and_then(|c| c.get(1)) {
        let expression = expr.as_str().trim();
        let value = evaluate(expression).map_err(|e| {
            Error::tool(
                CALCULATOR_NAME,
                format!("evaluating \"{expression}\" raised error: {e}"),
            )
        })?;
        return Ok(format!("Answer: {}", format_number(value)));
    }

    if text.starts_with("Answer:") {
        return Ok(text.to_string());
    }
    if let Some(idx) = text.rfind("Answer:") {
        return Ok(format!("Answer: {}", text[idx + "Answer:".len()..].trim()));
    }

    Err(Error::tool(
        CALCULATOR_NAME,
        format!("unknown format from LLM: {text}"),
    ))
}

/// Evaluates its input as an arithmetic expression, no model involved.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        CALCULATOR_NAME
    }

    fn description(&self) -> &str {
        "Useful for evaluating arithmetic expressions such as 2**0.023 or sqrt(2) * 3. \
         Input must be a single expression."
    }

    async fn run(&self, input: &str) -> Result<String> {
        let expression = input.trim().trim_matches('`').trim();
        let value = evaluate(expression).map_err(|e| Error::tool(CALCULATOR_NAME, e.to_string()))?;
        Ok(format!("Answer: {}", format_number(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_text_block() {
        let out = interpret_math_output("```text\n37593 * 67\n```\n...evaluate(\"37593 * 67\")...\n")
            .unwrap();
        assert_eq!(out, "Answer: 2518731");
    }

    #[test]
    fn passes_through_direct_answer() {
        assert_eq!(interpret_math_output("Answer: 42").unwrap(), "Answer: 42");
    }

    #[test]
    fn takes_last_answer_marker() {
        let out = interpret_math_output("First guess. Answer: 3\nOn reflection, Answer: 4").unwrap();
        assert_eq!(out, "Answer: 4");
    }

    #[test]
    fn rejects_unknown_format() {
        let err = interpret_math_output("I don't know").unwrap_err();
        assert!(err.to_string().contains("unknown format"));
    }

    #[test]
    fn bad_expression_reports_error() {
        let err = interpret_math_output("```text\n2 +\n```").unwrap_err();
        assert!(err.to_string().contains("raised error"));
    }

    #[test]
    fn prompt_embeds_question() {
        let prompt = LlmMathTool::prompt("What is 2 raised to the .023 power?");
        assert!(prompt.ends_with("Question: What is 2 raised to the .023 power?\n"));
        assert!(prompt.contains("Question: ${Question with math problem.}"));
    }
}
