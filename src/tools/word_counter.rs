use anyhow::Result;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use crate::pdf;
use super::{list_dir_sorted, ParamKind, ParamSpec, Tool};

/// How many words are kept per file.
pub const TOP_N: usize = 5;

/// Ordinal ("1", "2", ...) -> word -> count.
pub type WordCounts = BTreeMap<String, BTreeMap<String, usize>>;

/// Counts the most frequent words on the first page of every PDF in a directory.
pub struct WordCounter;

impl WordCounter {
    pub fn new() -> Self {
        Self
    }

    /// Top `TOP_N` whitespace-separated tokens by count. Ties keep the order in
    /// which the tokens first appear. Tokens are not normalized.
    pub fn top_words(text: &str) -> Vec<(String, usize)> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for word in text.split_whitespace() {
            match first_seen.get(word) {
                Some(&idx) => counts[idx].1 += 1,
                None => {
                    first_seen.insert(word, counts.len());
                    counts.push((word, 1));
                }
            }
        }

        // Stable sort keeps first-appearance order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(TOP_N)
            .map(|(w, c)| (w.to_string(), c))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CounterInput {
    pub count_directory: String,
}

#[async_trait::async_trait]
impl Tool for WordCounter {
    type Input = CounterInput;
    type Output = WordCounts;

    fn name(&self) -> &str {
        "word_counter"
    }

    fn description(&self) -> &str {
        "For all pdf files present in the given directory,count the top 5 frequent words in each pdf"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "count_directory",
            "should contain the name of the directory",
            ParamKind::String,
        )]
    }

    async fn run(&self, input: CounterInput) -> Result<WordCounts> {
        let mut result = WordCounts::new();

        for (i, path) in list_dir_sorted(Path::new(&input.count_directory))?
            .into_iter()
            .enumerate()
        {
            let text = pdf::first_page_text(&path)?;
            let top = Self::top_words(&text);
            log::info!("WordCounter: {} -> {:?}", path.display(), top);
            result.insert((i + 1).to_string(), top.into_iter().collect());
        }

        Ok(result)
    }
}
