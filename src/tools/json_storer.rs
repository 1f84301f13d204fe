use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use super::{ParamKind, ParamSpec, Tool};

/// Writes a JSON object to a fixed file, replacing whatever was there.
pub struct JsonStorer {
    target: PathBuf,
}

impl JsonStorer {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self { target: target.into() }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorerInput {
    pub json_: serde_json::Map<String, serde_json::Value>,
}

#[async_trait::async_trait]
impl Tool for JsonStorer {
    type Input = StorerInput;
    type Output = String;

    fn name(&self) -> &str {
        "json_storer"
    }

    fn description(&self) -> &str {
        "For given dict, you should be able to create a json file and store the dict in that json file"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "json_",
            "should contain the json object to be stored",
            ParamKind::Object,
        )]
    }

    async fn run(&self, input: StorerInput) -> Result<String> {
        let json = serde_json::to_string(&input.json_)?;
        std::fs::write(&self.target, json)
            .with_context(|| format!("Failed to write {}", self.target.display()))?;

        log::info!("JsonStorer: wrote {} key(s) to {}", input.json_.len(), self.target.display());
        Ok(self.target.display().to_string())
    }
}
