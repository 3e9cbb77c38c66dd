use prompt_chains::error::Error;
use prompt_chains::prompt::PromptTemplate;
use std::collections::HashMap;

#[test]
fn company_name_substitution() {
    let prompt = PromptTemplate::new(
        ["product"],
        "What is a good name for a company that makes {product}?",
    )
    .unwrap();
    let text = prompt
        .format(&HashMap::from([("product", "colorful socks")]))
        .unwrap();
    assert_eq!(
        text,
        "What is a good name for a company that makes colorful socks?"
    );
    assert_eq!(prompt.input_variables(), ["product"]);
    assert!(prompt.template().contains("{product}"));
}

#[test]
fn format_one_for_single_variable() {
    let prompt = PromptTemplate::from_template("Tell me about {topic}.").unwrap();
    assert_eq!(prompt.format_one("owls").unwrap(), "Tell me about owls.");
}

#[test]
fn format_one_rejects_multiple_variables() {
    let prompt = PromptTemplate::from_template("{a} {b}").unwrap();
    assert!(matches!(prompt.format_one("x"), Err(Error::Template(_))));
}

#[test]
fn undeclared_placeholder_rejected() {
    let err = PromptTemplate::new(["product"], "{product} for {audience}").unwrap_err();
    assert!(err.to_string().contains("audience"), "{err}");
}

#[test]
fn unused_variable_rejected() {
    let err = PromptTemplate::new(["product", "audience"], "{product}").unwrap_err();
    assert!(err.to_string().contains("audience"), "{err}");
}

#[test]
fn missing_value_is_error() {
    let prompt = PromptTemplate::from_template("{a} and {b}").unwrap();
    let err = prompt.format(&HashMap::from([("a", "x")])).unwrap_err();
    assert!(err.to_string().contains("'b'"), "{err}");
}

#[test]
fn extra_values_ignored() {
    let prompt = PromptTemplate::from_template("hi {name}").unwrap();
    let text = prompt
        .format(&HashMap::from([("name", "Ada"), ("unused", "x")]))
        .unwrap();
    assert_eq!(text, "hi Ada");
}

#[test]
fn escaped_braces_render_literally() {
    let prompt = PromptTemplate::new(["x"], "{{\"value\": {x}}}").unwrap();
    assert_eq!(prompt.format_one("1").unwrap(), "{\"value\": 1}");
}

#[test]
fn partial_binds_one_variable() {
    let prompt = PromptTemplate::from_template("{greeting}, {name}!").unwrap();
    let partial = prompt.partial("greeting", "Hello").unwrap();
    assert_eq!(partial.input_variables(), ["name"]);
    assert_eq!(partial.format_one("world").unwrap(), "Hello, world!");
    assert!(prompt.partial("missing", "x").is_err());
}

#[test]
fn owned_string_values_work() {
    let prompt = PromptTemplate::from_template("{a}").unwrap();
    let values: HashMap<String, String> = HashMap::from([("a".into(), "b".into())]);
    assert_eq!(prompt.format(&values).unwrap(), "b");
}
