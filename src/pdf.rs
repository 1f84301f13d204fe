use anyhow::{Context, Result};
use lopdf::Document;
use std::path::{Path, PathBuf};

fn load(path: &Path) -> Result<Document> {
    Document::load(path).with_context(|| format!("Failed to open PDF: {}", path.display()))
}

/// Write every page of `pdf` as its own `page-<n>.pdf` (1-based) in `out_dir`.
pub fn split_pages(pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let doc = load(pdf)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    if page_numbers.is_empty() {
        anyhow::bail!("PDF has no pages: {}", pdf.display());
    }

    let mut written = Vec::with_capacity(page_numbers.len());
    for &page in &page_numbers {
        let others: Vec<u32> = page_numbers.iter().copied().filter(|&n| n != page).collect();

        let mut single = doc.clone();
        single.delete_pages(&others);
        single.prune_objects();
        single.delete_zero_length_streams();
        single.renumber_objects();
        single.compress();

        let target = out_dir.join(format!("page-{}.pdf", page));
        single
            .save(&target)
            .with_context(|| format!("Failed to write page: {}", target.display()))?;

        log::debug!("Split: wrote {}", target.display());
        written.push(target);
    }

    Ok(written)
}

/// Text of the first page only, whatever the length of the document.
pub fn first_page_text(pdf: &Path) -> Result<String> {
    let doc = load(pdf)?;
    let first = doc
        .get_pages()
        .keys()
        .next()
        .copied()
        .with_context(|| format!("PDF has no pages: {}", pdf.display()))?;

    doc.extract_text(&[first])
        .with_context(|| format!("Failed to extract text from {}", pdf.display()))
}
