pub mod directory_maker;
pub mod inference;
pub mod json_storer;
pub mod markdown_reader;
pub mod page_extractor;
pub mod pdf_splitter;
pub mod word_counter;

pub use directory_maker::DirectoryMaker;
pub use inference::{InferenceRetriever, InferenceWriter};
pub use json_storer::JsonStorer;
pub use markdown_reader::MarkdownReader;
pub use page_extractor::PageExtractor;
pub use pdf_splitter::{ConvertApiSplitter, LocalSplitter};
pub use word_counter::WordCounter;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tool trait for agent-orchestrated operations.
///
/// Not object-safe (associated types). Callers that need to dispatch by
/// name go through [`ToolRegistry`], which erases the input and output types
/// to JSON.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Vec<ParamSpec>;

    async fn run(&self, input: Self::Input) -> Result<Self::Output>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Object,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn new(name: &str, description: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
        }
    }
}

/// What the model is told about a callable tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Render as an OpenAI function tool. Every declared parameter is required.
    pub fn to_openai(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({ "type": p.kind.json_type(), "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

/// Input for tools that take no arguments.
#[derive(Debug, Default, Deserialize)]
pub struct NoArgs {}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait::async_trait]
trait DynTool: Send + Sync {
    fn describe(&self) -> ToolDescriptor;
    async fn call_json(&self, arguments: serde_json::Value) -> Result<serde_json::Value>;
}

#[async_trait::async_trait]
impl<T: Tool> DynTool for T {
    fn describe(&self) -> ToolDescriptor {
        self.descriptor()
    }

    async fn call_json(&self, arguments: serde_json::Value) -> Result<serde_json::Value> {
        let input: T::Input = serde_json::from_value(arguments).map_err(|source| {
            ToolError::InvalidArguments {
                tool: self.name().to_string(),
                source,
            }
        })?;
        let output = self.run(input).await?;
        serde_json::to_value(output).context("Failed to serialize tool output")
    }
}

/// Lookup table of the tools an orchestrator may call by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
        self
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.describe()).collect()
    }

    /// Run a tool with the raw JSON argument string the model produced and
    /// return its output as text.
    pub async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        let arguments = if arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArguments {
                tool: name.to_string(),
                source,
            })?
        };

        log::info!("Registry: calling {}", name);
        let output = tool.call_json(arguments).await?;

        Ok(match output {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => "Done".to_string(),
            other => other.to_string(),
        })
    }
}

/// Regular files in `dir`, in natural filename order (`page-2` before `page-10`).
pub fn list_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|p| natural_key(&p.file_name().unwrap_or_default().to_string_lossy()));
    Ok(files)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Text(String),
    Number(u64),
}

fn natural_key(name: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = name.chars().peekable();

    while let Some(&c) = chars.peek() {
        let is_digit = c.is_ascii_digit();
        let mut run = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() != is_digit {
                break;
            }
            run.push(c);
            chars.next();
        }
        segments.push(match run.parse::<u64>() {
            Ok(n) if is_digit => Segment::Number(n),
            _ => Segment::Text(run),
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Echo;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    #[async_trait::async_trait]
    impl Tool for Echo {
        type Input = EchoInput;
        type Output = String;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::new("text", "text to echo", ParamKind::String)]
        }

        async fn run(&self, input: EchoInput) -> Result<String> {
            Ok(input.text)
        }
    }

    #[test]
    fn test_descriptor_lists_required_parameters() {
        let schema = Echo.descriptor().to_openai();
        assert_eq!(schema["function"]["name"], "echo");
        assert_eq!(schema["function"]["parameters"]["type"], "object");
        assert_eq!(
            schema["function"]["parameters"]["properties"]["text"]["type"],
            "string"
        );
        assert_eq!(
            schema["function"]["parameters"]["required"],
            serde_json::json!(["text"])
        );
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let registry = ToolRegistry::new().with(Echo);
        assert_eq!(registry.descriptors().len(), 1);

        let out = registry.call("echo", r#"{"text":"hello"}"#).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::new().with(Echo);
        let err = registry.call("nope", "{}").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::Unknown(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn test_registry_bad_arguments() {
        let registry = ToolRegistry::new().with(Echo);
        for args in ["{}", "not json"] {
            let err = registry.call("echo", args).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ToolError>(),
                Some(ToolError::InvalidArguments { .. })
            ));
        }
    }

    #[test]
    fn test_natural_order() {
        let dir = TempDir::new().unwrap();
        for name in ["page-10.pdf", "page-2.pdf", "page-1.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let names: Vec<String> = list_dir_sorted(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.pdf", "page-2.pdf", "page-10.pdf"]);
    }
}
