//! Whole-run orchestrator: fetch every chapter, run the cleanup pipeline,
//! persist, then compile the e-book.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use reqwest::blocking::Client;

use crate::cli::BuildArgs;
use crate::formats::Chapter;
use crate::formatters::FormatterTable;

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    crate::fetch::validate_base_url(&args.base_url).context("check --base-url")?;

    let book_id = crate::fetch::normalize_book_id(&args.book, &args.base_url);

    let book_dir = PathBuf::from(&args.title);
    std::fs::create_dir_all(&book_dir)
        .with_context(|| format!("create book dir: {}", book_dir.display()))?;

    let client = crate::fetch::client()?;
    let chapters = crate::fetch::fetch_chapters(&client, &args.base_url, &book_id)
        .context("fetch chapter list")?;
    if chapters.is_empty() {
        anyhow::bail!("no chapters found for book: {book_id}");
    }

    let formatters = if args.no_format {
        FormatterTable::empty()
    } else {
        FormatterTable::default()
    };

    // A failed chapter is skipped so one bad page never sinks the book.
    let mut written = 0usize;
    for (idx, chapter) in chapters.iter().enumerate() {
        let ordinal = idx + 1;
        tracing::info!(ordinal, id = chapter.id, title = %chapter.title, "fetch chapter");

        match write_one_chapter(
            &client,
            &args.base_url,
            &book_dir,
            ordinal,
            chapter,
            &formatters,
        ) {
            Ok(path) => {
                tracing::info!(ordinal, path = %path.display(), "chapter written");
                written += 1;
            }
            Err(err) => {
                tracing::warn!(ordinal, id = chapter.id, "skip chapter: {err:#}");
            }
        }
    }

    if written == 0 {
        anyhow::bail!("all {} chapters failed; nothing to compile", chapters.len());
    }

    let out = crate::book::compile_epub(&book_dir, &args.title, args.css.as_deref())
        .context("compile epub")?;
    tracing::info!(out = %out.display(), "book compiled");
    Ok(())
}

fn write_one_chapter(
    client: &Client,
    base_url: &str,
    book_dir: &Path,
    ordinal: usize,
    chapter: &Chapter,
    formatters: &FormatterTable,
) -> anyhow::Result<PathBuf> {
    let body_html = crate::fetch::fetch_chapter_html(client, base_url, chapter.id)
        .context("fetch chapter body")?;
    let content = crate::fetch::convert_chapter(&body_html, ordinal, &chapter.title);
    let lines = crate::pipeline::process_chapter(&content, formatters);
    crate::book::write_chapter(book_dir, ordinal, &lines).context("write chapter")
}
