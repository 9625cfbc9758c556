//! Prompt templates for the advisor
//!
//! Each prompt is a Markdown file: YAML frontmatter (id, version and the
//! sampling parameters), then a `# System` and a `# User` section with
//! `{{var}}` placeholders. Defaults are compiled in from `prompts/`; a file
//! named `<id>.md` in the override directory
//! (~/.local/share/ledgerlens/prompts/overrides/) replaces the default.

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::ai::{ChatMessage, ChatRequest};
use crate::error::{Error, Result};

mod defaults {
    pub const GENERATE_INSIGHTS: &str = include_str!("../../../prompts/generate_insights.md");
    pub const CATEGORIZE_EXPENSE: &str = include_str!("../../../prompts/categorize_expense.md");
    pub const ANSWER_QUESTION: &str = include_str!("../../../prompts/answer_question.md");
}

/// Prompts used by the advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    GenerateInsights,
    CategorizeExpense,
    AnswerQuestion,
}

impl PromptId {
    /// File stem and frontmatter id
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateInsights => "generate_insights",
            Self::CategorizeExpense => "categorize_expense",
            Self::AnswerQuestion => "answer_question",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::GenerateInsights,
            Self::CategorizeExpense,
            Self::AnswerQuestion,
        ]
    }

    /// Look up a prompt by its string identifier
    pub fn parse(s: &str) -> Option<PromptId> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::GenerateInsights => defaults::GENERATE_INSIGHTS,
            Self::CategorizeExpense => defaults::CATEGORIZE_EXPENSE,
            Self::AnswerQuestion => defaults::ANSWER_QUESTION,
        }
    }
}

/// Frontmatter of a prompt file
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Where a loaded prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    Override(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Everything after the frontmatter
    pub content: String,
    pub source: PromptSource,
}

impl Prompt {
    pub fn is_override(&self) -> bool {
        matches!(self.source, PromptSource::Override(_))
    }

    pub fn system_section(&self) -> Option<&str> {
        section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        section(&self.content, "# User")
    }

    /// Render into a chat request carrying this prompt's sampling parameters
    ///
    /// Without a `# User` header the whole body becomes the user message.
    pub fn to_request(&self, vars: &HashMap<&str, &str>) -> ChatRequest {
        let system = self
            .system_section()
            .map(|text| ChatMessage::system(render_template(text, vars)));
        let user = ChatMessage::user(render_template(
            self.user_section().unwrap_or(&self.content),
            vars,
        ));

        ChatRequest::new(
            system.into_iter().chain([user]).collect(),
            self.metadata.temperature,
            self.metadata.max_tokens,
        )
    }
}

/// Lazily parsed prompts, keyed by id
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Library that honors overrides in the default data directory
    pub fn new() -> Self {
        Self::with_dir(default_prompts_dir())
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self::with_dir(Some(path))
    }

    /// Library that ignores override files entirely
    pub fn embedded_only() -> Self {
        Self::with_dir(None)
    }

    fn with_dir(override_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            cache: HashMap::new(),
        }
    }

    /// Fetch a prompt, parsing it on first use
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        match self.cache.entry(id) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let prompt = load(self.override_dir.as_deref(), id)?;
                Ok(&*entry.insert(prompt))
            }
        }
    }

    /// Every known prompt with its version and override state
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = override_file(self.override_dir.as_deref(), id);
                let version = self.get(id).map(|p| p.metadata.version).unwrap_or(0);
                PromptInfo {
                    id: id.as_str().to_string(),
                    version,
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ledgerlens").join("prompts").join("overrides"))
}

fn override_file(dir: Option<&Path>, id: PromptId) -> Option<PathBuf> {
    dir.map(|d| d.join(format!("{}.md", id.as_str())))
        .filter(|path| path.is_file())
}

fn load(override_dir: Option<&Path>, id: PromptId) -> Result<Prompt> {
    let (text, source) = match override_file(override_dir, id) {
        Some(path) => {
            let text = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Cannot read prompt {}: {}", path.display(), e))
            })?;
            debug!(prompt = id.as_str(), path = %path.display(), "Loaded prompt override");
            (Cow::Owned(text), PromptSource::Override(path))
        }
        None => (Cow::Borrowed(id.default_content()), PromptSource::Embedded),
    };

    let (metadata, content) = split_frontmatter(&text)?;
    if metadata.id != id.as_str() {
        warn!(prompt = id.as_str(), declared = %metadata.id, "Prompt file declares a different id");
    }

    Ok(Prompt {
        metadata,
        content,
        source,
    })
}

/// Separate the YAML frontmatter from the Markdown body
fn split_frontmatter(text: &str) -> Result<(PromptMetadata, String)> {
    let rest = text
        .trim_start()
        .strip_prefix("---")
        .ok_or_else(|| Error::InvalidData("Prompt file has no frontmatter".into()))?;
    let (yaml, body) = rest
        .split_once("\n---")
        .ok_or_else(|| Error::InvalidData("Prompt frontmatter is never closed".into()))?;

    let metadata = serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidData(format!("Bad prompt frontmatter: {}", e)))?;
    Ok((metadata, body.trim().to_string()))
}

/// Text under `header`, up to the next `# ` heading line
fn section<'a>(body: &'a str, header: &str) -> Option<&'a str> {
    let mut offset = 0;
    let mut start = None;

    for line in body.split_inclusive('\n') {
        let heading = line.trim_end();
        match start {
            None if heading == header => start = Some(offset + line.len()),
            Some(from) if heading.starts_with("# ") => return Some(body[from..offset].trim()),
            _ => {}
        }
        offset += line.len();
    }
    start.map(|from| body[from..].trim())
}

/// Replace `{{var}}` placeholders in one pass
///
/// Substituted values are never rescanned, so user text containing braces
/// cannot pull in other variables. Unknown placeholders are left as-is.
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        match vars.get(after[..close].trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;

    #[test]
    fn test_prompt_id_parse() {
        for id in PromptId::all() {
            assert_eq!(PromptId::parse(id.as_str()), Some(*id));
        }
        assert_eq!(PromptId::parse("classify_merchant"), None);
    }

    #[test]
    fn test_split_frontmatter() {
        let content = r#"---
id: test_prompt
version: 2
temperature: 0.3
max_tokens: 50
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = split_frontmatter(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 2);
        assert_eq!(metadata.max_tokens, 50);
        assert!(body.contains("# System"));
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_frontmatter_required() {
        assert!(split_frontmatter("# User\nhello").is_err());
        assert!(split_frontmatter("---\nid: x\n# User\nhello").is_err());
    }

    #[test]
    fn test_section() {
        let content = "# System\nSystem content here.\n\n# User\nUser content here.";

        assert_eq!(
            section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(
            section(content, "# User"),
            Some("User content here.")
        );
        assert_eq!(section(content, "# Examples"), None);
    }

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("name", "World");
        vars.insert("value", "42");

        assert_eq!(
            render_template("Hello {{name}}, value {{ value }}, {{missing}}", &vars),
            "Hello World, value 42, {{missing}}"
        );
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("description", "{{categories}} dinner");
        vars.insert("categories", "Food, Other");

        assert_eq!(
            render_template("Expense: {{description}}", &vars),
            "Expense: {{categories}} dinner"
        );
    }

    #[test]
    fn test_render_unclosed_placeholder() {
        let vars = HashMap::new();
        assert_eq!(render_template("Hello {{name", &vars), "Hello {{name");
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let result = split_frontmatter(id.default_content());
            assert!(
                result.is_ok(),
                "Failed to parse {}: {:?}",
                id.as_str(),
                result.err()
            );

            let (metadata, _) = result.unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
        }
    }

    #[test]
    fn test_default_sampling_parameters() {
        let mut lib = PromptLibrary::embedded_only();

        let insights = lib.get(PromptId::GenerateInsights).unwrap();
        assert!((insights.metadata.temperature - 0.7).abs() < 1e-6);
        assert_eq!(insights.metadata.max_tokens, 1000);

        let categorize = lib.get(PromptId::CategorizeExpense).unwrap();
        assert!((categorize.metadata.temperature - 0.1).abs() < 1e-6);
        assert_eq!(categorize.metadata.max_tokens, 20);

        let answer = lib.get(PromptId::AnswerQuestion).unwrap();
        assert_eq!(answer.metadata.max_tokens, 200);
    }

    #[test]
    fn test_to_request_renders_both_sections() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::CategorizeExpense).unwrap();

        let mut vars = HashMap::new();
        vars.insert("categories", "Food, Other");
        vars.insert("description", "Tacos");
        let request = prompt.to_request(&vars);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Food, Other"));
        assert_eq!(
            request.messages[1].content,
            "Categorize this expense: \"Tacos\""
        );
        assert_eq!(request.max_tokens, 20);
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("answer_question.md"),
            "---\nid: answer_question\nversion: 9\ntemperature: 0.2\nmax_tokens: 64\n---\n\n# User\nQ: {{question}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        let prompt = lib.get(PromptId::AnswerQuestion).unwrap();
        assert!(prompt.is_override());
        assert_eq!(prompt.metadata.version, 9);

        let mut vars = HashMap::new();
        vars.insert("question", "Why?");
        let request = prompt.to_request(&vars);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "Q: Why?");

        let not_overridden = lib.get(PromptId::GenerateInsights).unwrap();
        assert_eq!(not_overridden.source, PromptSource::Embedded);

        let listed = lib.list();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed.iter().filter(|p| p.has_override).count(), 1);
    }
}
