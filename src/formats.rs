use serde::Deserialize;

/// One chapter of the source book, as listed by the book page API.
#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub position: u32,
    /// Absolute chapter API URL, filled in after the list is parsed.
    #[serde(default)]
    pub url: String,
}

/// Envelope of the Next.js page-data payload carrying the chapter list.
#[derive(Debug, Deserialize)]
pub struct ChapterListPayload {
    #[serde(rename = "pageProps")]
    pub page_props: PageProps,
}

#[derive(Debug, Deserialize)]
pub struct PageProps {
    pub chapters: Vec<Chapter>,
}

/// Envelope of the chapter API payload carrying one chapter's HTML body.
#[derive(Debug, Deserialize)]
pub struct ChapterBodyPayload {
    pub chapter: ChapterBody,
}

#[derive(Debug, Deserialize)]
pub struct ChapterBody {
    pub body_html: String,
}
