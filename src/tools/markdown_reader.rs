use anyhow::{Context, Result};
use serde::Deserialize;
use super::{ParamKind, ParamSpec, Tool};

/// Returns the full text of a file.
pub struct MarkdownReader;

impl MarkdownReader {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
pub struct ReaderInput {
    pub markdown_path: String,
}

#[async_trait::async_trait]
impl Tool for MarkdownReader {
    type Input = ReaderInput;
    type Output = String;

    fn name(&self) -> &str {
        "markdown_reader"
    }

    fn description(&self) -> &str {
        "Used by agent to get the text presented in the given markdown file;"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "markdown_path",
            "should contain the path of the markdown file",
            ParamKind::String,
        )]
    }

    async fn run(&self, input: ReaderInput) -> Result<String> {
        let text = std::fs::read_to_string(&input.markdown_path)
            .with_context(|| format!("Failed to read {}", input.markdown_path))?;

        log::info!("MarkdownReader: read {} ({} chars)", input.markdown_path, text.len());
        Ok(text)
    }
}
