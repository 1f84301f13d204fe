use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub convert_api: ConvertApiConfig,
    pub llama_parse: LlamaParseConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConvertApiConfig {
    pub endpoint: String,
    #[serde(default)]
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlamaParseConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub language: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

/// Filesystem conventions shared by the tools and the agent prompts.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub results_dir: String,
    pub extracted_dir: String,
    pub inferences_dir: String,
    pub results_json: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
            extracted_dir: "extracted_content".to_string(),
            inferences_dir: "inferences".to_string(),
            results_json: "results.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub max_round: usize,
    pub pdf_master_max_round: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_round: 100,
            pdf_master_max_round: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context("Failed to read config file. Make sure config.toml exists.")?;

        let mut config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets from the environment (usually `.env`) win over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Ok(secret) = std::env::var("CONVERT_API_KEY") {
            self.convert_api.secret = secret;
        }
        if let Ok(key) = std::env::var("LLAMA_KEY") {
            self.llama_parse.api_key = key;
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LlamaParseConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [openai]
        model = "gpt-4"
        endpoint = "https://api.openai.com/v1"
        api_key = "sk-test"
        timeout_secs = 120

        [convert_api]
        endpoint = "https://v2.convertapi.com"
        secret = "convert-secret"

        [llama_parse]
        endpoint = "https://api.cloud.llamaindex.ai/api/parsing"
        api_key = "llx-test"
        language = "en"
        poll_interval_ms = 500
        max_polls = 10

        [layout]
        results_dir = "pages"
        extracted_dir = "md"
        inferences_dir = "notes"
        results_json = "out.json"

        [chat]
        max_round = 40
        pdf_master_max_round = 8

        [logging]
        level = "debug"
    "#;

    #[test]
    fn test_config_parsing() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.openai.timeout(), Duration::from_secs(120));
        assert!(config.openai.temperature.is_none());
        assert_eq!(config.convert_api.secret, "convert-secret");
        assert_eq!(config.llama_parse.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.layout.inferences_dir, "notes");
        assert_eq!(config.chat.max_round, 40);
        assert_eq!(config.chat.pdf_master_max_round, 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_optional_sections_default() {
        let toml_str = r#"
            [openai]
            model = "gpt-4"
            endpoint = "https://api.openai.com/v1"
            timeout_secs = 60

            [convert_api]
            endpoint = "https://v2.convertapi.com"

            [llama_parse]
            endpoint = "https://api.cloud.llamaindex.ai/api/parsing"
            language = "en"
            poll_interval_ms = 1000
            max_polls = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.openai.api_key.is_empty());
        assert_eq!(config.layout.results_dir, "results");
        assert_eq!(config.layout.extracted_dir, "extracted_content");
        assert_eq!(config.layout.results_json, "results.json");
        assert_eq!(config.chat.max_round, 100);
        assert_eq!(config.chat.pdf_master_max_round, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides_secrets() {
        let mut config: Config = toml::from_str(FULL).unwrap();

        std::env::set_var("OPENAI_API_KEY", "sk-from-env");
        std::env::set_var("CONVERT_API_KEY", "convert-from-env");
        std::env::set_var("LLAMA_KEY", "llx-from-env");
        config.apply_env_overrides();
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("CONVERT_API_KEY");
        std::env::remove_var("LLAMA_KEY");

        assert_eq!(config.openai.api_key, "sk-from-env");
        assert_eq!(config.convert_api.secret, "convert-from-env");
        assert_eq!(config.llama_parse.api_key, "llx-from-env");
        assert_eq!(config.openai.model, "gpt-4");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::from_file("/definitely/not/here/config.toml").unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
