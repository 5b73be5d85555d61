//! HTTP glue for the book-hosting site: chapter listing and chapter bodies.
//!
//! The contract with the site is deliberately narrow: one page fetch to
//! discover the Next.js build id, one page-data fetch for the chapter list,
//! and one API fetch per chapter body. Everything downstream works on plain
//! Markdown lines and never sees a URL.

use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use url::Url;

use crate::formats::{Chapter, ChapterBodyPayload, ChapterListPayload};

const BUILD_ID_KEY: &str = "\"buildId\":\"";

/// Validates the base URL up front so a typo fails before any request or
/// directory is created.
pub fn validate_base_url(input: &str) -> anyhow::Result<()> {
    let url = Url::parse(input).with_context(|| format!("parse base url: {input}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("base url must be http/https: {input}");
    }
    Ok(())
}

pub fn client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("zenbookify/0.1")
        .build()
        .context("build http client")
}

/// Accepts either a bare book id (`user/books/slug`) or a full URL and
/// returns the bare id.
pub fn normalize_book_id(input: &str, base_url: &str) -> String {
    let stripped = input
        .strip_prefix(base_url)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(input);
    stripped.trim_end_matches('/').to_owned()
}

/// Fetches the book page, extracts the Next.js build id and returns the
/// ordered chapter list from the page-data API.
pub fn fetch_chapters(
    client: &Client,
    base_url: &str,
    book_id: &str,
) -> anyhow::Result<Vec<Chapter>> {
    let page_url = format!("{base_url}/{book_id}");
    tracing::info!(url = %page_url, "fetch book page");

    let html = client
        .get(&page_url)
        .send()
        .with_context(|| format!("GET {page_url}"))?
        .error_for_status()
        .context("book page status")?
        .text()
        .context("read book page body")?;

    let build_id = extract_build_id(&html)
        .ok_or_else(|| anyhow::anyhow!("buildId not found in book page: {page_url}"))?;

    let data_url = format!("{base_url}/_next/data/{build_id}/{book_id}.json");
    tracing::info!(url = %data_url, "fetch chapter list");

    let payload: ChapterListPayload = client
        .get(&data_url)
        .send()
        .with_context(|| format!("GET {data_url}"))?
        .error_for_status()
        .context("chapter list status")?
        .json()
        .context("parse chapter list json")?;

    let mut chapters = payload.page_props.chapters;
    for chapter in &mut chapters {
        chapter.url = format!("{base_url}/api/chapters/{}", chapter.id);
    }
    Ok(chapters)
}

fn extract_build_id(html: &str) -> Option<&str> {
    let start = html.find(BUILD_ID_KEY)? + BUILD_ID_KEY.len();
    let end = html[start..].find('"')?;
    Some(&html[start..start + end])
}

/// Fetches one chapter's HTML body from the chapter API.
pub fn fetch_chapter_html(
    client: &Client,
    base_url: &str,
    chapter_id: u64,
) -> anyhow::Result<String> {
    let api_url = format!("{base_url}/api/chapters/{chapter_id}");
    tracing::debug!(url = %api_url, "fetch chapter body");

    let payload: ChapterBodyPayload = client
        .get(&api_url)
        .send()
        .with_context(|| format!("GET {api_url}"))?
        .error_for_status()
        .context("chapter body status")?
        .json()
        .context("parse chapter body json")?;

    Ok(payload.chapter.body_html)
}

/// Converts a chapter's HTML body to Markdown and prefixes the numbered
/// chapter heading.
pub fn convert_chapter(body_html: &str, ordinal: usize, title: &str) -> String {
    let markdown = html2md::parse_html(body_html);
    format!("# {ordinal}. {title}\n\n{markdown}")
}
