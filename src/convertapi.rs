use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::ConvertApiConfig;

/// Client for the ConvertAPI `pdf -> split` conversion.
pub struct ConvertApiClient {
    pub endpoint: String,
    secret: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConversionResponse {
    files: Vec<ConvertedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    file_name: String,
    file_data: String,
}

impl ConvertApiClient {
    pub fn new(config: &ConvertApiConfig) -> Result<Self> {
        if config.secret.is_empty() {
            anyhow::bail!("ConvertAPI secret missing. Set CONVERT_API_KEY in .env");
        }

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            secret: config.secret.clone(),
            client: reqwest::Client::new(),
        })
    }

    /// Split `pdf` into pages and save the returned files into `out_dir`
    /// under the names the service chose.
    pub async fn split(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let bytes = std::fs::read(pdf)
            .with_context(|| format!("Failed to read PDF: {}", pdf.display()))?;
        let file_name = pdf
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        log::info!("ConvertAPI: splitting {} ({} bytes)", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("File", part)
            .text("StoreFile", "false");

        let response = self.client
            .post(format!("{}/convert/pdf/to/split", self.endpoint))
            .bearer_auth(&self.secret)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to ConvertAPI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("ConvertAPI error ({}): {}", status, error_text);
        }

        let body = response.text().await
            .context("Failed to read ConvertAPI response")?;

        save_files(&body, out_dir)
    }
}

/// Decode a conversion response body and write each file into `out_dir`.
fn save_files(body: &str, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let parsed: ConversionResponse = serde_json::from_str(body)
        .context("Failed to parse ConvertAPI response")?;

    let mut saved = Vec::with_capacity(parsed.files.len());
    for file in parsed.files {
        let data = base64::engine::general_purpose::STANDARD
            .decode(file.file_data.as_bytes())
            .with_context(|| format!("Invalid file data for {}", file.file_name))?;

        // Only the final path component is trusted.
        let name = Path::new(&file.file_name)
            .file_name()
            .with_context(|| format!("Invalid file name: {}", file.file_name))?;
        let target = out_dir.join(name);

        std::fs::write(&target, data)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        log::info!("ConvertAPI: saved {}", target.display());
        saved.push(target);
    }

    Ok(saved)
}
