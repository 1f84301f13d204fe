use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use super::{PDF_MASTER, USER_PROXY};
use crate::agents::{Agent, ChatOutcome, GroupChat, SpeakerSelection};
use crate::config::{Config, LayoutConfig};
use crate::llamaparse::{DocumentParser, LlamaParseClient};
use crate::openai::{ChatModel, OpenAiClient};
use crate::tools::directory_maker::MakerInput;
use crate::tools::page_extractor::ExtractorInput;
use crate::tools::pdf_splitter::SplitterInput;
use crate::tools::{
    DirectoryMaker, InferenceRetriever, InferenceWriter, LocalSplitter, MarkdownReader,
    PageExtractor, Tool, ToolRegistry,
};

pub const INDICATOR: &str = "Indicator";
pub const JUNIOR_DETECTIVE: &str = "JuniorDetective";
pub const LEAD_DETECTIVE: &str = "LeadDetective";

const USER_PROXY_PROMPT: &str = "Keeps the group on track by reminding everyone of what needs to be done next, repeating instructions/code if necessary. Reply TERMINATE if the original task is done.";

const PDF_MASTER_PROMPT: &str = "You are an expert at working with pdfs.
You are assigned to Extensively work with pdf.
To create directories , use 'directory_maker' tool. To split pdfs, use 'pdf_splitter' tool. To extract content, use 'page_extractor'";

const JUNIOR_PROMPT: &str = "You are an expert at solving cases.
You are keen in observing and analysing people's behaviour by their statements.
You keep track of all the events related to the case.
You will finally find the truth of the case.
You are good with managing people under you to solve the cases.
To read a case page content, use 'markdown_reader' tool.
To write your inference, use 'write_inference'";

const LEAD_PROMPT: &str = "You are an lead detective.
You are an expert in deducing solutions from inferences written by junor detectives.
Use 'master_inference' tool to get all the inference written and try your best to deduce the solution";

const QUIZ: &str = "WHO KILLED CATHERINE FOX?
Can you prove which grandchild blackmailed Catherine Fox? Prove it below to solve the case.
What TWO documents can best prove the identity of the murderer?*

Newspaper Article

Catherine's Letter to Police

Ransom Note

Crime Scene Photo of Dead Body

Photo of Suspect Lineup

Photo of Catherine Fox

Photo of Charlotte Marple

Witness Report of Charlotte Marple

Person of Interest - Alfred Christoff

Person of Interest - Edgar Christoff

Person of Interest - Gina Chesterson";

fn indicator_prompt(last_page: usize) -> String {
    format!(
        "You are a reminder for the Detective and Investigator.You should remember the last page no of investigation and should tell the detective and investigator the next page no to investigate. Investigations starts from you because you are the one to tell them the page no.You have to start from 1 and end at {}.",
        last_page
    )
}

fn extraction_message(pdf: &str, layout: &LayoutConfig) -> String {
    format!(
        "Please split the pdf named '{pdf}' into seperate pages.
Make sure to create a fresh directory named '{pages}' and use that directory to store the splitted pdf pages.
Then create a fresh directory named '{out}' and extract the content of every page into it as markdown.
Reply TERMINATE when everything is done.",
        pdf = pdf,
        pages = layout.results_dir,
        out = layout.extracted_dir,
    )
}

fn investigation_message(layout: &LayoutConfig) -> String {
    format!(
        "
You have already extracted content in '{extracted}' directory with each page named 'page-' followed by page no and .md extension.You dont need to extract anything.
Indicator agent will inform  junior detective  the page to investigate and they should try their best to understand the case and should write their own inference of that page.
make a directory called {inferences} to store the inferences by detective.
Only come to an conclusion after you read all the pages , dont skip any page.
The lead detective has to understand the inference written by junior detective and deduce the solution.
You have to answer the following questions.

{quiz}

Use all the agents and tools you have in your sleeve at the best to solve the case.",
        extracted = layout.extracted_dir,
        inferences = layout.inferences_dir,
        quiz = QUIZ,
    )
}

/// Every tool is offered to every agent.
pub fn registry(parser: Arc<dyn DocumentParser>, layout: &LayoutConfig) -> ToolRegistry {
    ToolRegistry::new()
        .with(DirectoryMaker::new())
        .with(LocalSplitter::new())
        .with(MarkdownReader::new())
        .with(InferenceWriter::new(&layout.inferences_dir))
        .with(PageExtractor::new(parser))
        .with(InferenceRetriever::new(&layout.inferences_dir))
}

/// Number of extracted markdown pages.
pub fn count_pages(extracted_dir: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(extracted_dir)
        .with_context(|| format!("Failed to list {}", extracted_dir.display()))?;

    let mut pages = 0;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            pages += 1;
        }
    }
    Ok(pages)
}

/// Split `pdf` locally and extract every page, without a model in the loop.
pub async fn extract_sequence(
    parser: Arc<dyn DocumentParser>,
    layout: &LayoutConfig,
    pdf: &str,
) -> Result<Vec<String>> {
    let maker = DirectoryMaker::new();
    maker.run(MakerInput { directory_name: layout.results_dir.clone() }).await?;
    maker.run(MakerInput { directory_name: layout.extracted_dir.clone() }).await?;

    LocalSplitter::new()
        .run(SplitterInput {
            pdf_name: pdf.to_string(),
            output_directory: layout.results_dir.clone(),
        })
        .await?;

    PageExtractor::new(parser)
        .run(ExtractorInput {
            input_directory: layout.results_dir.clone(),
            output_directory: layout.extracted_dir.clone(),
        })
        .await
}

pub async fn extract_chat(
    model: &dyn ChatModel,
    registry: &ToolRegistry,
    layout: &LayoutConfig,
    pdf: &str,
    max_round: usize,
) -> Result<ChatOutcome> {
    let chat = GroupChat::new(
        vec![
            Agent::user_proxy(USER_PROXY, USER_PROXY_PROMPT, "Continue. Reply TERMINATE if the task is done."),
            Agent::assistant(PDF_MASTER, PDF_MASTER_PROMPT),
        ],
        max_round,
        SpeakerSelection::RoundRobin,
    );

    chat.run(model, registry, USER_PROXY, &extraction_message(pdf, layout)).await
}

/// The manager-driven group chat that reads every page and answers the quiz.
pub async fn investigate(
    model: &dyn ChatModel,
    registry: &ToolRegistry,
    layout: &LayoutConfig,
    max_round: usize,
) -> Result<ChatOutcome> {
    let pages = count_pages(Path::new(&layout.extracted_dir))?;
    if pages == 0 {
        anyhow::bail!(
            "No extracted pages in {}. Run the extract command first.",
            layout.extracted_dir
        );
    }
    log::info!("Detective: investigating {} page(s)", pages);

    let chat = GroupChat::new(
        vec![
            Agent::user_proxy(USER_PROXY, USER_PROXY_PROMPT, "Continue with the next step."),
            Agent::assistant(INDICATOR, &indicator_prompt(pages)),
            Agent::assistant(JUNIOR_DETECTIVE, JUNIOR_PROMPT),
            Agent::assistant(LEAD_DETECTIVE, LEAD_PROMPT),
        ],
        max_round,
        SpeakerSelection::Auto,
    );

    chat.run(model, registry, USER_PROXY, &investigation_message(layout)).await
}

fn parser(config: &Config) -> Result<Arc<dyn DocumentParser>> {
    let parser: Arc<dyn DocumentParser> = Arc::new(LlamaParseClient::new(&config.llama_parse)?);
    Ok(parser)
}

pub async fn run_extract(config: &Config, pdf: &Path, direct: bool) -> Result<()> {
    let pdf = pdf.to_string_lossy().to_string();
    let parser = parser(config)?;

    if direct {
        let written = extract_sequence(parser, &config.layout, &pdf).await?;
        log::info!("Detective: extracted {} page(s)", written.len());
        for path in written {
            println!("{}", path);
        }
        return Ok(());
    }

    let model = OpenAiClient::new(&config.openai)?;
    let tools = registry(parser, &config.layout);
    let outcome = extract_chat(&model, &tools, &config.layout, &pdf, config.chat.pdf_master_max_round).await?;
    if let Some(answer) = outcome.last_text() {
        println!("{}", answer);
    }
    Ok(())
}

pub async fn run_investigation(config: &Config) -> Result<()> {
    let model = OpenAiClient::new(&config.openai)?;
    let tools = registry(parser(config)?, &config.layout);

    let outcome = investigate(&model, &tools, &config.layout, config.chat.max_round).await?;
    if !outcome.terminated {
        log::warn!("Detective: chat ended without a conclusion");
    }
    if let Some(answer) = outcome.last_text() {
        println!("{}", answer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::ScriptedModel;
    use crate::pdf::fixtures::write_pdf;
    use tempfile::TempDir;

    struct FirstLineParser;

    #[async_trait::async_trait]
    impl DocumentParser for FirstLineParser {
        async fn parse(&self, path: &Path) -> Result<Vec<String>> {
            let name = path.file_stem().unwrap().to_string_lossy().to_string();
            Ok(vec![format!("# {}", name), "ignored".to_string()])
        }
    }

    fn layout(root: &Path) -> LayoutConfig {
        LayoutConfig {
            results_dir: root.join("results").to_string_lossy().to_string(),
            extracted_dir: root.join("extracted_content").to_string_lossy().to_string(),
            inferences_dir: root.join("inferences").to_string_lossy().to_string(),
            results_json: root.join("results.json").to_string_lossy().to_string(),
        }
    }

    #[tokio::test]
    async fn test_extract_sequence_produces_markdown_per_page() {
        let root = TempDir::new().unwrap();
        let layout = layout(root.path());
        let pdf = root.path().join("case.pdf");
        write_pdf(&pdf, &["one", "two", "three"]);

        let written = extract_sequence(Arc::new(FirstLineParser), &layout, &pdf.to_string_lossy())
            .await
            .unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(count_pages(Path::new(&layout.extracted_dir)).unwrap(), 3);
        let md = std::fs::read_to_string(Path::new(&layout.extracted_dir).join("page-2.md")).unwrap();
        assert_eq!(md, "# page-2");
    }

    #[tokio::test]
    async fn test_investigate_requires_extracted_pages() {
        let root = TempDir::new().unwrap();
        let layout = layout(root.path());
        std::fs::create_dir(&layout.extracted_dir).unwrap();

        let model = ScriptedModel::new([]);
        let registry = registry(Arc::new(FirstLineParser), &layout);
        assert!(investigate(&model, &registry, &layout, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_investigation_round_trip() {
        let root = TempDir::new().unwrap();
        let layout = layout(root.path());
        std::fs::create_dir(&layout.extracted_dir).unwrap();
        let page = Path::new(&layout.extracted_dir).join("page-1.md");
        std::fs::write(&page, "Edgar Christoff was seen at the manor.").unwrap();

        let model = ScriptedModel::new([
            ScriptedModel::text(INDICATOR),
            ScriptedModel::text("JuniorDetective, investigate page 1."),
            ScriptedModel::text(JUNIOR_DETECTIVE),
            ScriptedModel::call("c1", "directory_maker", serde_json::json!({ "directory_name": layout.inferences_dir })),
            ScriptedModel::call("c2", "markdown_reader", serde_json::json!({ "markdown_path": page.to_string_lossy() })),
            ScriptedModel::call("c3", "write_inference", serde_json::json!({
                "agent": JUNIOR_DETECTIVE,
                "inference": "Edgar was at the manor.",
                "page_no": "1",
            })),
            ScriptedModel::text("Page 1 done."),
            ScriptedModel::text(LEAD_DETECTIVE),
            ScriptedModel::call("c4", "master_inference", serde_json::json!({})),
            ScriptedModel::text("Edgar Christoff. TERMINATE"),
        ]);
        let registry = registry(Arc::new(FirstLineParser), &layout);

        let outcome = investigate(&model, &registry, &layout, 100).await.unwrap();

        assert!(outcome.terminated);
        assert_eq!(outcome.last_text(), Some("Edgar Christoff. TERMINATE"));
        let inference = Path::new(&layout.inferences_dir).join("JuniorDetective_1-inference.txt");
        assert_eq!(std::fs::read_to_string(inference).unwrap(), "Edgar was at the manor.");

        // The reader and the retriever both reported real file contents.
        let tool_outputs: Vec<&str> = outcome
            .messages
            .iter()
            .filter(|m| m.role == crate::openai::Role::Tool)
            .map(|m| m.text())
            .collect();
        assert!(tool_outputs.contains(&"Edgar Christoff was seen at the manor."));
        assert!(tool_outputs.contains(&"Edgar was at the manor."));

        // The indicator was told where the pages end.
        let requests = model.requests.lock().unwrap();
        assert!(requests[1].messages[0].text().contains("end at 1."));
        assert_eq!(model.remaining(), 0);
    }

    #[test]
    fn test_investigation_message_carries_quiz_and_layout() {
        let layout = LayoutConfig::default();
        let msg = investigation_message(&layout);
        assert!(msg.contains("'extracted_content'"));
        assert!(msg.contains("directory called inferences"));
        assert!(msg.contains("WHO KILLED CATHERINE FOX?"));
        assert!(msg.contains("Person of Interest - Gina Chesterson"));
    }
}
