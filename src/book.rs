//! Chapter persistence and the final e-book compile step.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

/// Writes one chapter's final line sequence to `chapterNN.md` inside the
/// book directory.
pub fn write_chapter(book_dir: &Path, ordinal: usize, lines: &[String]) -> anyhow::Result<PathBuf> {
    let path = book_dir.join(format!("chapter{ordinal:02}.md"));
    std::fs::write(&path, lines.join("\n"))
        .with_context(|| format!("write chapter: {}", path.display()))?;
    Ok(path)
}

/// Lists the chapter Markdown files in the book directory, sorted by name
/// so chapter order follows the zero-padded numbering.
pub fn chapter_file_paths(book_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(book_dir)
        .with_context(|| format!("read book dir: {}", book_dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.context("read book dir entry")?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Invokes pandoc to merge all chapter files into `<title>.epub` inside the
/// book directory. A failed compile is fatal for the run.
pub fn compile_epub(book_dir: &Path, title: &str, css: Option<&str>) -> anyhow::Result<PathBuf> {
    let chapter_paths = chapter_file_paths(book_dir)?;
    if chapter_paths.is_empty() {
        anyhow::bail!("no chapter files found in {}", book_dir.display());
    }

    let out_path = book_dir.join(format!("{title}.epub"));

    let mut pandoc = Command::new("pandoc");
    pandoc.args(["-f", "markdown"]);
    pandoc.arg("-o").arg(&out_path);
    pandoc.arg("--metadata").arg(format!("title={title}"));
    if let Some(css) = css {
        pandoc.args(["--css", css]);
    }
    pandoc.args(&chapter_paths);

    tracing::info!(
        out = %out_path.display(),
        chapters = chapter_paths.len(),
        "run pandoc"
    );

    let output = pandoc.output().context("run pandoc")?;
    if !output.status.success() {
        anyhow::bail!(
            "pandoc exited unsuccessfully ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(out_path)
}
