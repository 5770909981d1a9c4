// Wistro Coder: Step Script Templates
// Per-language event-handler scaffolds that the generated logic is spliced into

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, Result};
use crate::llm::PromptTemplate;

/// Languages a step script can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    Python,
    TypeScript,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 2] = [ScriptLanguage::Python, ScriptLanguage::TypeScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptLanguage::Python => "python",
            ScriptLanguage::TypeScript => "typescript",
        }
    }

    /// File extension for a saved script
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptLanguage::Python => "py",
            ScriptLanguage::TypeScript => "ts",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            ScriptLanguage::Python => include_str!("python_step.py.tmpl"),
            ScriptLanguage::TypeScript => include_str!("typescript_step.ts.tmpl"),
        }
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptLanguage {
    type Err = AgentError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "python" => Ok(ScriptLanguage::Python),
            "typescript" => Ok(ScriptLanguage::TypeScript),
            other => Err(AgentError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Values spliced into a step script
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub name: &'a str,
    pub input_event: &'a str,
    pub output_event: &'a str,
    pub workflow: &'a str,
    pub logic: &'a str,
    pub language: &'a str,
}

/// Renders complete step scripts.
///
/// Nothing is escaped: logic or event names containing quotes or template
/// delimiters of the target language end up in the script as-is.
pub struct ScriptTemplater {
    python: PromptTemplate,
    typescript: PromptTemplate,
}

impl Default for ScriptTemplater {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptTemplater {
    pub fn new() -> Self {
        let template = |language: ScriptLanguage| {
            PromptTemplate::new(language.as_str(), language.source())
        };

        Self {
            python: template(ScriptLanguage::Python),
            typescript: template(ScriptLanguage::TypeScript),
        }
    }

    pub fn template(&self, language: ScriptLanguage) -> &PromptTemplate {
        match language {
            ScriptLanguage::Python => &self.python,
            ScriptLanguage::TypeScript => &self.typescript,
        }
    }

    /// Render the script for `ctx.language`, failing on any other tag
    pub fn render(&self, ctx: &ScriptContext<'_>) -> Result<String> {
        let language: ScriptLanguage = ctx.language.parse()?;

        let vars = HashMap::from([
            ("name", ctx.name),
            ("input_event", ctx.input_event),
            ("output_event", ctx.output_event),
            ("workflow", ctx.workflow),
            ("logic", ctx.logic),
        ]);

        Ok(self.template(language).render(&vars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(language: &'a str, logic: &'a str) -> ScriptContext<'a> {
        ScriptContext {
            name: "calculate_factorial_",
            input_event: "math.request",
            output_event: "math.result",
            workflow: "math",
            logic,
            language,
        }
    }

    #[test]
    fn test_python_script() {
        let templater = ScriptTemplater::new();
        let script = templater
            .render(&context("python", "return 42"))
            .unwrap();

        assert!(script.starts_with("\nconfig = {\n"));
        assert!(script.contains("\"name\": \"calculate_factorial_\""));
        assert!(script.contains("\"subscribes\": [\"math.request\"]"));
        assert!(script.contains("\"emits\": [\"math.result\"]"));
        assert!(script.contains("\"input\": None"));
        assert!(script.contains("\"workflow\": \"math\""));
        assert!(script.contains("async def executor(input, emit):"));
        assert!(script.ends_with(
            "    print('[calculate_factorial_] Received event', input)\n    return 42\n"
        ));
    }

    #[test]
    fn test_typescript_script() {
        let templater = ScriptTemplater::new();
        let script = templater
            .render(&context("typescript", "return input.value"))
            .unwrap();

        assert!(script.contains("import { z } from 'zod'"));
        assert!(script.contains("import { FlowConfig, FlowExecutor } from 'wistro'"));
        assert!(script.contains("const inputSchema = z.object({"));
        assert!(script.contains("export const config: FlowConfig<Input> = {"));
        assert!(script.contains("  name: 'calculate_factorial_',"));
        assert!(script.contains("  subscribes: ['math.request'],"));
        assert!(script.contains("  emits: ['math.result'],"));
        assert!(script.contains("  input: inputSchema,"));
        assert!(script.contains("  workflow: 'math',"));
        assert!(script.contains("export const executor: FlowExecutor<Input> = async (input, emit) => {"));
        assert!(script.ends_with(
            "  console.log('[calculate_factorial_] Received event:', input)\n  return input.value\n}\n"
        ));
    }

    #[test]
    fn test_unsupported_language() {
        let templater = ScriptTemplater::new();
        let err = templater.render(&context("go", "")).unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedLanguage(ref lang) if lang == "go"));
    }

    #[test]
    fn test_language_tags_are_case_sensitive() {
        assert!("Python".parse::<ScriptLanguage>().is_err());
        assert_eq!("typescript".parse::<ScriptLanguage>().unwrap(), ScriptLanguage::TypeScript);
    }

    #[test]
    fn test_logic_is_spliced_without_escaping() {
        let templater = ScriptTemplater::new();
        let logic = "print(\"{{name}}\")\n\"\"\"";
        let script = templater.render(&context("python", logic)).unwrap();
        assert!(script.contains(logic));
    }

    #[test]
    fn test_every_language_has_its_template() {
        let templater = ScriptTemplater::default();
        for language in ScriptLanguage::ALL {
            assert_eq!(templater.template(language).name, language.as_str());
        }
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ScriptLanguage::Python.extension(), "py");
        assert_eq!(ScriptLanguage::TypeScript.extension(), "ts");
    }
}
