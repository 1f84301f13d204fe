use anyhow::Result;
use std::path::Path;

use super::{PDF_MASTER, USER_PROXY};
use crate::agents::{Agent, ChatOutcome, GroupChat, SpeakerSelection};
use crate::config::{Config, LayoutConfig};
use crate::convertapi::ConvertApiClient;
use crate::openai::{ChatModel, OpenAiClient};
use crate::tools::directory_maker::MakerInput;
use crate::tools::json_storer::StorerInput;
use crate::tools::pdf_splitter::SplitterInput;
use crate::tools::word_counter::{CounterInput, WordCounts};
use crate::tools::{ConvertApiSplitter, DirectoryMaker, JsonStorer, Tool, ToolRegistry, WordCounter};

const PDF_MASTER_PROMPT: &str = "You are an expert at working with pdfs.
You are assigned to Extensively work with pdf.
You are capable of taking decisions on which tool to use from your diverse set of tools";

fn task_message(pdf: &str, layout: &LayoutConfig) -> String {
    format!(
        "Please split the pdf named '{pdf}' into seperate pages.
Make sure to create a fresh directory named '{dir}' and use that directory to store the splitted pdf pages.
Additonaly please count the top 5 most frequent words of the splitted pdf pages stored in the created directory.
Write the counting results in a json file.
Reply TERMINATE when everything is done.",
        pdf = pdf,
        dir = layout.results_dir,
    )
}

pub fn registry(client: ConvertApiClient, layout: &LayoutConfig) -> ToolRegistry {
    ToolRegistry::new()
        .with(DirectoryMaker::new())
        .with(ConvertApiSplitter::new(client))
        .with(WordCounter::new())
        .with(JsonStorer::new(&layout.results_json))
}

/// PDFMaster decides the tool order itself.
pub async fn run_chat(
    model: &dyn ChatModel,
    registry: &ToolRegistry,
    layout: &LayoutConfig,
    pdf: &str,
    max_round: usize,
) -> Result<ChatOutcome> {
    let chat = GroupChat::new(
        vec![
            Agent::user_proxy(USER_PROXY, "", "Continue. Reply TERMINATE if the task is done."),
            Agent::assistant(PDF_MASTER, PDF_MASTER_PROMPT),
        ],
        max_round,
        SpeakerSelection::RoundRobin,
    );

    chat.run(model, registry, USER_PROXY, &task_message(pdf, layout)).await
}

/// Fixed order: make directory, split, count, store.
pub async fn run_sequence<S>(splitter: &S, layout: &LayoutConfig, pdf: &str) -> Result<WordCounts>
where
    S: Tool<Input = SplitterInput>,
{
    DirectoryMaker::new()
        .run(MakerInput { directory_name: layout.results_dir.clone() })
        .await?;

    splitter
        .run(SplitterInput {
            pdf_name: pdf.to_string(),
            output_directory: layout.results_dir.clone(),
        })
        .await?;

    let counts = WordCounter::new()
        .run(CounterInput { count_directory: layout.results_dir.clone() })
        .await?;

    let json = serde_json::to_value(&counts)?;
    if let serde_json::Value::Object(json_) = json {
        JsonStorer::new(&layout.results_json)
            .run(StorerInput { json_ })
            .await?;
    }

    Ok(counts)
}

pub async fn run(config: &Config, pdf: &Path, direct: bool) -> Result<()> {
    let pdf = pdf.to_string_lossy().to_string();
    let client = ConvertApiClient::new(&config.convert_api)?;

    if direct {
        log::info!("WordCount: running fixed sequence on {}", pdf);
        let counts = run_sequence(&ConvertApiSplitter::new(client), &config.layout, &pdf).await?;
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    log::info!("WordCount: starting {} chat on {}", PDF_MASTER, pdf);
    let model = OpenAiClient::new(&config.openai)?;
    let tools = registry(client, &config.layout);
    let outcome = run_chat(&model, &tools, &config.layout, &pdf, config.chat.pdf_master_max_round).await?;

    if let Some(answer) = outcome.last_text() {
        println!("{}", answer);
    }
    Ok(())
}
