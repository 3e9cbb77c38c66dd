//! String templates with named `{placeholders}`.
//!
//! `{{` and `}}` render as literal braces. A template's declared input
//! variables must match the placeholders it contains exactly.

use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    input_variables: Vec<String>,
    template: String,
    segments: Vec<Segment>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    /// Create a template, checking `input_variables` against its placeholders.
    pub fn new<S: Into<String>>(
        input_variables: impl IntoIterator<Item = S>,
        template: impl Into<String>,
    ) -> Result<Self> {
        let template = template.into();
        let input_variables: Vec<String> = input_variables.into_iter().map(Into::into).collect();
        let segments = parse(&template)?;

        let declared: BTreeSet<&str> = input_variables.iter().map(String::as_str).collect();
        let found: BTreeSet<&str> = placeholder_names(&segments).collect();

        if let Some(missing) = found.difference(&declared).next() {
            return Err(Error::template(format!(
                "placeholder '{missing}' is not a declared input variable"
            )));
        }
        if let Some(extra) = declared.difference(&found).next() {
            return Err(Error::template(format!(
                "input variable '{extra}' does not appear in the template"
            )));
        }

        Ok(Self {
            input_variables,
            template,
            segments,
            partials: HashMap::new(),
        })
    }

    /// Create a template whose input variables are its placeholders, in order
    /// of first appearance.
    pub fn from_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let segments = parse(&template)?;
        let mut input_variables: Vec<String> = Vec::new();
        for name in placeholder_names(&segments) {
            if !input_variables.iter().any(|v| v == name) {
                input_variables.push(name.to_string());
            }
        }
        Ok(Self {
            input_variables,
            template,
            segments,
            partials: HashMap::new(),
        })
    }

    /// Variables a caller still has to supply.
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Bind one variable up front, removing it from `input_variables`.
    pub fn partial(&self, name: &str, value: impl Into<String>) -> Result<Self> {
        if !self.input_variables.iter().any(|v| v == name) {
            return Err(Error::template(format!(
                "cannot bind '{name}': not an input variable"
            )));
        }
        let mut next = self.clone();
        next.input_variables.retain(|v| v != name);
        next.partials.insert(name.to_string(), value.into());
        Ok(next)
    }

    /// Substitute every placeholder. Values for unknown names are ignored.
    pub fn format<K, V>(&self, values: &HashMap<K, V>) -> Result<String>
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
    {
        let mut out = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = values
                        .get(name.as_str())
                        .map(<V as AsRef<str>>::as_ref)
                        .or_else(|| self.partials.get(name).map(String::as_str))
                        .ok_or_else(|| {
                            Error::template(format!("missing value for '{name}'"))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Convenience for templates with a single input variable.
    pub fn format_one(&self, value: &str) -> Result<String> {
        match self.input_variables.as_slice() {
            [only] => self.format(&HashMap::from([(only.as_str(), value)])),
            vars => Err(Error::template(format!(
                "format_one needs exactly one input variable, template has {}",
                vars.len()
            ))),
        }
    }
}

fn placeholder_names(segments: &[Segment]) -> impl Iterator<Item = &str> {
    segments.iter().filter_map(|s| match s {
        Segment::Var(name) => Some(name.as_str()),
        Segment::Literal(_) => None,
    })
}

fn parse(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    if n == '{' {
                        return Err(Error::template(format!(
                            "nested '{{' in placeholder at byte {pos}"
                        )));
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(Error::template(format!(
                        "unclosed placeholder starting at byte {pos}"
                    )));
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::template(format!(
                        "empty placeholder at byte {pos}"
                    )));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var(name.to_string()));
            }
            '}' => {
                return Err(Error::template(format!(
                    "single '}}' at byte {pos}; use '}}}}' for a literal brace"
                )));
            }
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
