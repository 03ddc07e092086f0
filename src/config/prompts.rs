//! Prompt templates for vidrag.
//!
//! The answer prompt can be customized by placing a `rag.toml` file in the
//! custom prompts directory.

use crate::error::{Result, VidragError};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompt used to answer a question from transcript context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub template: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            template: r#"
You are a helpful assistant.
Answer only from the provided transcript context.
If the context is insufficient, say "I don't know".
Context:
{{context}}

Question:
{{question}}
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults with files from `custom_dir` when present.
    pub fn load(custom_dir: Option<&str>) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Build the validated answer template.
    pub fn answer_template(&self) -> Result<PromptTemplate> {
        PromptTemplate::new(&self.rag.template)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid placeholder regex"))
}

/// A prompt skeleton with `{{context}}` and `{{question}}` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Slots every answer template must contain.
    pub const SLOTS: [&'static str; 2] = ["context", "question"];

    /// Create a template, rejecting skeletons that lack a required slot.
    pub fn new(template: &str) -> Result<Self> {
        let present: Vec<String> = placeholder_regex()
            .captures_iter(template)
            .map(|c| c[1].to_string())
            .collect();

        for slot in Self::SLOTS {
            if !present.iter().any(|p| p == slot) {
                return Err(VidragError::Config(format!(
                    "Prompt template is missing the {{{{{}}}}} slot",
                    slot
                )));
            }
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill the template.
    ///
    /// Substitution is a single pass, so placeholder-like text inside the
    /// context or question is left as is.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context", context);
        vars.insert("question", question);
        render(&self.template, &vars)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: RagPrompts::default().template,
        }
    }
}

/// Render `{{name}}` placeholders; unknown names are kept verbatim.
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_template_is_valid() {
        let prompts = Prompts::default();
        let template = prompts.answer_template().unwrap();
        assert!(template.as_str().contains("I don't know"));
    }

    #[test]
    fn test_render_template() {
        let template = PromptTemplate::new("C: {{context}} / Q: {{ question }}").unwrap();
        let result = template.render("some text", "why?");
        assert_eq!(result, "C: some text / Q: why?");
    }

    #[test]
    fn test_render_does_not_expand_inside_values() {
        let template = PromptTemplate::new("{{context}}|{{question}}").unwrap();
        let result = template.render("literal {{question}}", "q");
        assert_eq!(result, "literal {{question}}|q");
    }

    #[test]
    fn test_missing_slot_rejected() {
        let err = PromptTemplate::new("Only {{context}} here").unwrap_err();
        assert!(err.to_string().contains("question"));
    }

    #[test]
    fn test_custom_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("rag.toml")).unwrap();
        writeln!(file, "template = \"Ctx={{{{context}}}} Q={{{{question}}}}\"").unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        let template = prompts.answer_template().unwrap();
        assert_eq!(template.render("a", "b"), "Ctx=a Q=b");
    }
}
