// Wistro Coder: Prompt Templates
// `{{var}}` templates shared by the code-generation prompt and the step scripts

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use thiserror::Error;

static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Missing required variable: {0}")]
    MissingVariable(String),
}

/// Template with `{{var}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub template: String,
    pub required_vars: Vec<String>,
}

impl PromptTemplate {
    pub fn new(name: &str, template: &str) -> Self {
        let mut required_vars: Vec<String> = Vec::new();
        for caps in VAR_PATTERN.captures_iter(template) {
            let var = caps[1].to_string();
            if !required_vars.contains(&var) {
                required_vars.push(var);
            }
        }

        Self {
            name: name.to_string(),
            template: template.to_string(),
            required_vars,
        }
    }

    /// Render the template with provided variables.
    ///
    /// Substitution is a single pass over the template: values are spliced in
    /// verbatim and never expanded again, even if they contain `{{...}}`.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .required_vars
            .iter()
            .find(|var| !vars.contains_key(var.as_str()))
        {
            return Err(TemplateError::MissingVariable(missing.clone()));
        }

        let rendered = VAR_PATTERN.replace_all(&self.template, |caps: &Captures| {
            vars.get(&caps[1]).copied().unwrap_or_default().to_string()
        });

        Ok(rendered.into_owned())
    }
}

const CODE_GENERATION: &str = "
        You are a coding assistant. Generate a {{language}} function that fulfills the following requirements:
        {{task_description}}

        Only return the code for the function. Do not include explanations or comments.
        ";

static CODE_GENERATION_TEMPLATE: Lazy<PromptTemplate> =
    Lazy::new(|| PromptTemplate::new("code_generation", CODE_GENERATION));

/// Collection of prompts sent to the completion backends
pub struct Prompts;

impl Prompts {
    pub fn code_generation() -> &'static PromptTemplate {
        &CODE_GENERATION_TEMPLATE
    }

    /// Render the code-generation prompt for one task
    pub fn for_task(language: &str, task_description: &str) -> Result<String, TemplateError> {
        let vars = HashMap::from([
            ("language", language),
            ("task_description", task_description),
        ]);
        Self::code_generation().render(&vars)
    }
}
