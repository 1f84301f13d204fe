use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use crate::llamaparse::DocumentParser;
use super::{list_dir_sorted, ParamKind, ParamSpec, Tool};

/// Parses every file in a directory to markdown, keeping the first fragment.
pub struct PageExtractor {
    parser: Arc<dyn DocumentParser>,
}

impl PageExtractor {
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        Self { parser }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractorInput {
    pub input_directory: String,
    pub output_directory: String,
}

#[async_trait::async_trait]
impl Tool for PageExtractor {
    type Input = ExtractorInput;
    type Output = Vec<String>;

    fn name(&self) -> &str {
        "page_extractor"
    }

    fn description(&self) -> &str {
        "Used by agents to parse and extract content of all page into markdown from a given directory and store it in the directory;"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(
                "input_directory",
                "should contain the name of the directory of the pdfs",
                ParamKind::String,
            ),
            ParamSpec::new(
                "output_directory",
                "should contain the name of output directory where the markdown to be stored",
                ParamKind::String,
            ),
        ]
    }

    async fn run(&self, input: ExtractorInput) -> Result<Vec<String>> {
        let out_dir = Path::new(&input.output_directory);
        let mut written = Vec::new();

        for page in list_dir_sorted(Path::new(&input.input_directory))? {
            let fragments = self.parser.parse(&page).await?;
            let first = fragments
                .into_iter()
                .next()
                .with_context(|| format!("Parser returned nothing for {}", page.display()))?;

            let stem = page
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_string();
            let target = out_dir.join(format!("{}.md", stem));

            std::fs::write(&target, first)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            log::info!("PageExtractor: {} -> {}", page.display(), target.display());
            written.push(target.display().to_string());
        }

        Ok(written)
    }
}
