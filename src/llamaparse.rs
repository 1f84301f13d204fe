use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::config::LlamaParseConfig;

/// Separator LlamaParse puts between pages of a markdown result.
const PAGE_SEPARATOR: &str = "\n---\n";

/// Turns a document into markdown fragments, one per parsed page.
#[async_trait::async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<Vec<String>>;
}

/// Client for the LlamaParse upload / poll / fetch-markdown cycle.
pub struct LlamaParseClient {
    pub endpoint: String,
    api_key: String,
    language: String,
    poll_interval: Duration,
    max_polls: u32,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

impl LlamaParseClient {
    pub fn new(config: &LlamaParseConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            anyhow::bail!("LlamaParse API key missing. Set LLAMA_KEY in .env");
        }

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            poll_interval: config.poll_interval(),
            max_polls: config.max_polls,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self.client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to send request to LlamaParse: {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("LlamaParse API error ({}): {}", status, error_text);
        }

        response.json().await.context("Failed to parse LlamaParse response")
    }

    async fn upload(&self, path: &Path) -> Result<Job> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", self.language.clone());

        let response = self.client
            .post(format!("{}/upload", self.endpoint))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to upload file to LlamaParse")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("LlamaParse upload error ({}): {}", status, error_text);
        }

        response.json().await.context("Failed to parse LlamaParse upload response")
    }

    async fn wait_for(&self, job_id: &str) -> Result<()> {
        for attempt in 1..=self.max_polls {
            let job: Job = self
                .get_json(format!("{}/job/{}", self.endpoint, job_id))
                .await?;

            match JobState::from_status(&job.status) {
                JobState::Done => return Ok(()),
                JobState::Failed => {
                    anyhow::bail!("LlamaParse job {} ended with status {}", job_id, job.status)
                }
                JobState::Pending => {
                    log::debug!("LlamaParse: job {} is {} (poll {})", job_id, job.status, attempt);
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        anyhow::bail!(
            "LlamaParse job {} did not finish after {} polls",
            job_id,
            self.max_polls
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Done,
    Failed,
    Pending,
}

impl JobState {
    fn from_status(status: &str) -> Self {
        match status {
            "SUCCESS" => JobState::Done,
            "ERROR" | "CANCELED" => JobState::Failed,
            _ => JobState::Pending,
        }
    }
}

#[async_trait::async_trait]
impl DocumentParser for LlamaParseClient {
    async fn parse(&self, path: &Path) -> Result<Vec<String>> {
        log::info!("LlamaParse: parsing {}", path.display());

        let job = self.upload(path).await?;
        self.wait_for(&job.id).await?;

        let result: MarkdownResult = self
            .get_json(format!("{}/job/{}/result/markdown", self.endpoint, job.id))
            .await?;

        let fragments = split_fragments(&result.markdown);
        log::info!(
            "LlamaParse: {} -> {} fragment(s)",
            path.display(),
            fragments.len()
        );
        Ok(fragments)
    }
}

fn split_fragments(markdown: &str) -> Vec<String> {
    markdown.split(PAGE_SEPARATOR).map(str::to_string).collect()
}
