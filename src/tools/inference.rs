use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use super::{list_dir_sorted, NoArgs, ParamKind, ParamSpec, Tool};

/// Saves an agent's inference about one page as a text file.
///
/// The inferences directory must already exist.
pub struct InferenceWriter {
    dir: PathBuf,
}

impl InferenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[derive(Debug, Deserialize)]
pub struct WriterInput {
    pub agent: String,
    pub inference: String,
    pub page_no: String,
}

#[async_trait::async_trait]
impl Tool for InferenceWriter {
    type Input = WriterInput;
    type Output = String;

    fn name(&self) -> &str {
        "write_inference"
    }

    fn description(&self) -> &str {
        "Used by agents to write their inference as txt file that can be useful later;"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("agent", "should contain which agent is using this", ParamKind::String),
            ParamSpec::new("inference", "should contain the inference the agent got", ParamKind::String),
            ParamSpec::new("page_no", "page no", ParamKind::String),
        ]
    }

    async fn run(&self, input: WriterInput) -> Result<String> {
        let filename = format!(
            "{}_{}-inference.txt",
            file_component(&input.agent)?,
            file_component(&input.page_no)?
        );
        let path = self.dir.join(&filename);

        std::fs::write(&path, &input.inference)
            .with_context(|| format!("Failed to write inference: {}", path.display()))?;

        log::info!("InferenceWriter: saved {}", path.display());
        Ok(path.display().to_string())
    }
}

/// Last path component of a model-supplied name, so writes stay inside the directory.
fn file_component(value: &str) -> Result<&str> {
    Path::new(value)
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid name for an inference file: {:?}", value))
}

/// Concatenates every inference file, in natural filename order, with no separator.
pub struct InferenceRetriever {
    dir: PathBuf,
}

impl InferenceRetriever {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl Tool for InferenceRetriever {
    type Input = NoArgs;
    type Output = String;

    fn name(&self) -> &str {
        "master_inference"
    }

    fn description(&self) -> &str {
        "Used by LeadDetective agent to get all the inferences written by detectives and investigator"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn run(&self, _input: NoArgs) -> Result<String> {
        let mut result = String::new();

        for path in list_dir_sorted(&self.dir)? {
            log::info!("InferenceRetriever: {}", path.display());
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read inference: {}", path.display()))?;
            result.push_str(&text);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writer_names_file_by_agent_and_page() {
        let dir = TempDir::new().unwrap();
        let writer = InferenceWriter::new(dir.path());

        writer
            .run(WriterInput {
                agent: "JuniorDetective".to_string(),
                inference: "The butler lied.".to_string(),
                page_no: "3".to_string(),
            })
            .await
            .unwrap();

        let path = dir.path().join("JuniorDetective_3-inference.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "The butler lied.");
    }

    #[tokio::test]
    async fn test_writer_overwrites_same_agent_page() {
        let dir = TempDir::new().unwrap();
        let writer = InferenceWriter::new(dir.path());

        for text in ["first draft", "final"] {
            writer
                .run(WriterInput {
                    agent: "LeadDetective".to_string(),
                    inference: text.to_string(),
                    page_no: "1".to_string(),
                })
                .await
                .unwrap();
        }

        let path = dir.path().join("LeadDetective_1-inference.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "final");
    }

    #[tokio::test]
    async fn test_writer_stays_inside_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("inferences");
        std::fs::create_dir(&dir).unwrap();
        let writer = InferenceWriter::new(&dir);

        writer
            .run(WriterInput {
                agent: "../JuniorDetective".to_string(),
                inference: "escaped?".to_string(),
                page_no: "../../2".to_string(),
            })
            .await
            .unwrap();

        assert!(dir.join("JuniorDetective_2-inference.txt").is_file());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);

        let result = writer
            .run(WriterInput {
                agent: "..".to_string(),
                inference: "x".to_string(),
                page_no: "1".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_writer_does_not_create_directory() {
        let dir = TempDir::new().unwrap();
        let writer = InferenceWriter::new(dir.path().join("inferences"));

        let result = writer
            .run(WriterInput {
                agent: "Indicator".to_string(),
                inference: "x".to_string(),
                page_no: "1".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_retriever_concatenates_in_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("B"), "bar").unwrap();
        std::fs::write(dir.path().join("A"), "foo").unwrap();

        let all = InferenceRetriever::new(dir.path()).run(NoArgs {}).await.unwrap();
        assert_eq!(all, "foobar");
    }

    #[tokio::test]
    async fn test_retriever_orders_pages_numerically() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("JuniorDetective_10-inference.txt"), "ten.").unwrap();
        std::fs::write(dir.path().join("JuniorDetective_2-inference.txt"), "two.").unwrap();

        let all = InferenceRetriever::new(dir.path()).run(NoArgs {}).await.unwrap();
        assert_eq!(all, "two.ten.");
    }

    #[tokio::test]
    async fn test_retriever_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let retriever = InferenceRetriever::new(dir.path().join("inferences"));
        assert!(retriever.run(NoArgs {}).await.is_err());
    }
}
