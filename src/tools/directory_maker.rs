use anyhow::{Context, Result};
use serde::Deserialize;
use super::{ParamKind, ParamSpec, Tool};

/// Creates a fresh directory. Fails if it already exists.
pub struct DirectoryMaker;

impl DirectoryMaker {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
pub struct MakerInput {
    pub directory_name: String,
}

#[async_trait::async_trait]
impl Tool for DirectoryMaker {
    type Input = MakerInput;
    type Output = String;

    fn name(&self) -> &str {
        "directory_maker"
    }

    fn description(&self) -> &str {
        "Used by agents to create a fresh directory that can be used further"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "directory_name",
            "should contain the name of the directory to be created",
            ParamKind::String,
        )]
    }

    async fn run(&self, input: MakerInput) -> Result<String> {
        std::fs::create_dir(&input.directory_name)
            .with_context(|| format!("Failed to create directory: {}", input.directory_name))?;

        log::info!("DirectoryMaker: created {}", input.directory_name);
        Ok(input.directory_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_second_create_fails_with_already_exists() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("results").to_string_lossy().to_string();
        let maker = DirectoryMaker::new();

        let created = maker
            .run(MakerInput { directory_name: target.clone() })
            .await
            .unwrap();
        assert_eq!(created, target);
        assert!(root.path().join("results").is_dir());

        let err = maker
            .run(MakerInput { directory_name: target })
            .await
            .unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::AlreadyExists);
    }
}
