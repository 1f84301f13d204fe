use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use crate::convertapi::ConvertApiClient;
use crate::pdf;
use super::{ParamKind, ParamSpec, Tool};

const NAME: &str = "pdf_splitter";
const DESCRIPTION: &str =
    "Used by agents to split the given pdf into seperate pages and store them in the given output directory";

#[derive(Debug, Deserialize)]
pub struct SplitterInput {
    pub pdf_name: String,
    pub output_directory: String,
}

fn splitter_parameters() -> Vec<ParamSpec> {
    vec![
        ParamSpec::new("pdf_name", "should contain the name of the pdf", ParamKind::String),
        ParamSpec::new(
            "output_directory",
            "should contain the name of the output directory where the splitted pages should be stored",
            ParamKind::String,
        ),
    ]
}

fn display_paths(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Splits a PDF locally into `page-<n>.pdf` files.
pub struct LocalSplitter;

impl LocalSplitter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Tool for LocalSplitter {
    type Input = SplitterInput;
    type Output = Vec<String>;

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        splitter_parameters()
    }

    async fn run(&self, input: SplitterInput) -> Result<Vec<String>> {
        let written = pdf::split_pages(Path::new(&input.pdf_name), Path::new(&input.output_directory))?;
        log::info!(
            "LocalSplitter: {} -> {} page(s) in {}",
            input.pdf_name,
            written.len(),
            input.output_directory
        );
        Ok(display_paths(&written))
    }
}

/// Splits a PDF through ConvertAPI, keeping whatever files it returns.
pub struct ConvertApiSplitter {
    client: ConvertApiClient,
}

impl ConvertApiSplitter {
    pub fn new(client: ConvertApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for ConvertApiSplitter {
    type Input = SplitterInput;
    type Output = Vec<String>;

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        splitter_parameters()
    }

    async fn run(&self, input: SplitterInput) -> Result<Vec<String>> {
        let written = self
            .client
            .split(Path::new(&input.pdf_name), Path::new(&input.output_directory))
            .await?;
        Ok(display_paths(&written))
    }
}
