//! Markdown cleanup passes applied to each converted chapter before it is
//! written to disk.
//!
//! The HTML→Markdown conversion leaves a handful of artifacts behind:
//! syntax-highlighter `<span>` wrappers, fence markers tagged `diff-…`,
//! fence markers carrying a ` code-line` UI suffix with the following shell
//! commands flattened onto one visual line, and duplicated closing fences.
//! Each pass here consumes and produces a plain line sequence, so passes
//! compose in a fixed order and can be tested in isolation. None of them can
//! fail: a pass that finds nothing to do returns its input unchanged.

use crate::formatters::{FormatterTable, format_code_blocks};

/// Runs the full cleanup pipeline over one chapter's converted Markdown and
/// returns the final line sequence to be persisted.
pub fn process_chapter(content: &str, formatters: &FormatterTable) -> Vec<String> {
    let content = strip_highlight_spans(content);

    let mut lines = content
        .split('\n')
        .map(str::to_owned)
        .collect::<Vec<String>>();

    normalize_diff_fences(&mut lines);
    let lines = unwrap_code_lines(lines);
    let lines = balance_fences(lines);
    format_code_blocks(lines, formatters)
}

/// Drops the syntax-highlighter span wrappers the converter carries over
/// from the site's rendered HTML.
pub fn strip_highlight_spans(content: &str) -> String {
    content
        .replace("<span class=\"token builtin class-name\">", "")
        .replace("<span class=\"token function\">", "")
        .replace("</span>", "")
}

/// Rewrites fence markers tagged `diff-<anything>` to the bare `diff` tag.
pub fn normalize_diff_fences(lines: &mut [String]) {
    for line in lines.iter_mut() {
        if line.starts_with("```diff-") {
            *line = "```diff".to_owned();
        }
    }
}

const CODE_LINE_SUFFIX: &str = " code-line";

/// Detects fence markers carrying a stray ` code-line` suffix, strips the
/// suffix and re-flows the loose command lines that follow through
/// [`split_shell_commands`].
pub fn unwrap_code_lines(mut lines: Vec<String>) -> Vec<String> {
    let mut i = 0;
    while i < lines.len() {
        if !(lines[i].contains("```") && lines[i].ends_with(CODE_LINE_SUFFIX)) {
            i += 1;
            continue;
        }

        let stripped_len = lines[i].len() - CODE_LINE_SUFFIX.len();
        lines[i].truncate(stripped_len);

        // Collect command lines until a blank line or the next fence marker.
        let start = i + 1;
        let mut end = start;
        while end < lines.len() {
            let trimmed = lines[end].trim();
            if trimmed.is_empty() || trimmed.starts_with("```") {
                break;
            }
            end += 1;
        }

        if end == start {
            i += 1;
            continue;
        }

        let collected = lines[start..end]
            .iter()
            .map(|line| line.strip_suffix(' ').unwrap_or(line).to_owned())
            .collect::<Vec<_>>();
        let replacement = split_shell_commands(collected);
        let replacement_len = replacement.len();
        lines.splice(start..end, replacement);

        // Resume immediately after the spliced-in content.
        i = start + replacement_len;
    }
    lines
}

const SPLIT_TRIGGERS: &[&str] = &["mkdir", "cd", "go "];
const COMMAND_KEYWORDS: &[&str] = &["mkdir", "cd", "go", "npm", "git", "echo", "export"];

/// Re-segments a run of concatenated shell tokens into one command per line.
///
/// This is a heuristic, not a shell parser: it has no awareness of quoting,
/// escaping, pipes or subshells, and only undoes a specific conversion
/// artifact where several commands end up flattened onto one line. When no
/// trigger substring is present the input is returned untouched so original
/// formatting survives.
pub fn split_shell_commands(command_lines: Vec<String>) -> Vec<String> {
    let joined = command_lines.join(" ");
    if !SPLIT_TRIGGERS.iter().any(|t| joined.contains(t)) {
        return command_lines;
    }

    let mut commands = Vec::new();
    let mut current = String::new();
    for token in joined.split_whitespace() {
        if COMMAND_KEYWORDS.contains(&token) {
            if !current.is_empty() {
                commands.push(std::mem::take(&mut current));
            }
            current.push_str(token);
        } else if current.is_empty() {
            current.push_str(token);
        } else {
            current.push(' ');
            current.push_str(token);
        }
    }
    if !current.is_empty() {
        commands.push(current);
    }
    commands
}

/// Drops excess bare closing fences so that the number of closers never
/// exceeds the number of opening markers counted up front.
///
/// Opening markers are trusted as ground truth; excess closers are trimmed
/// from the tail end, content is never reordered or duplicated. The inverse
/// case is deliberately left alone: when a document has fewer closers than
/// openers no closer is fabricated and the document stays under-closed.
pub fn balance_fences(lines: Vec<String>) -> Vec<String> {
    let opens = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.starts_with("```") && trimmed.len() > 3
        })
        .count();

    let mut kept = Vec::with_capacity(lines.len());
    let mut closes_kept = 0;
    for line in lines {
        if line.trim() == "```" {
            if closes_kept < opens {
                closes_kept += 1;
                kept.push(line);
            }
            continue;
        }
        kept.push(line);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn normalize_retags_diff_fences() {
        let mut lines = doc(&["```diff-unified", "-a", "+b", "```", "```go"]);
        normalize_diff_fences(&mut lines);
        assert_eq!(lines, doc(&["```diff", "-a", "+b", "```", "```go"]));
    }

    #[test]
    fn normalize_leaves_documents_without_matches_unchanged() {
        let original = doc(&["# Title", "```rust", "fn main() {}", "```"]);
        let mut lines = original.clone();
        normalize_diff_fences(&mut lines);
        assert_eq!(lines, original);
    }

    #[test]
    fn splitter_keeps_already_separate_commands() {
        let input = doc(&["mkdir foo", "cd foo", "go mod init x"]);
        assert_eq!(
            split_shell_commands(input),
            doc(&["mkdir foo", "cd foo", "go mod init x"])
        );
    }

    #[test]
    fn splitter_splits_flattened_command_run() {
        let input = doc(&["mkdir foo && cd foo && go mod init x"]);
        assert_eq!(
            split_shell_commands(input),
            doc(&["mkdir foo &&", "cd foo &&", "go mod init x"])
        );
    }

    #[test]
    fn splitter_passes_through_without_trigger_keywords() {
        let input = doc(&["ls -la", "pwd"]);
        assert_eq!(split_shell_commands(input.clone()), input);
    }

    #[test]
    fn unwrap_strips_suffix_without_splice_on_blank_line() {
        let input = doc(&["```bash code-line", "", "text"]);
        let out = unwrap_code_lines(input);
        assert_eq!(out, doc(&["```bash", "", "text"]));
    }

    #[test]
    fn unwrap_reflows_flattened_commands() {
        let input = doc(&[
            "```bash code-line",
            "mkdir app cd app go mod init app",
            "```",
        ]);
        let out = unwrap_code_lines(input);
        assert_eq!(
            out,
            doc(&["```bash", "mkdir app", "cd app", "go mod init app", "```"])
        );
    }

    #[test]
    fn unwrap_handles_consecutive_triggers() {
        let input = doc(&[
            "```sh code-line",
            "cd one",
            "```",
            "```sh code-line",
            "cd two",
            "```",
        ]);
        let out = unwrap_code_lines(input);
        assert_eq!(
            out,
            doc(&["```sh", "cd one", "```", "```sh", "cd two", "```"])
        );
    }

    #[test]
    fn unwrap_tolerates_trigger_on_last_line() {
        let input = doc(&["```bash code-line"]);
        let out = unwrap_code_lines(input);
        assert_eq!(out, doc(&["```bash"]));
    }

    #[test]
    fn balance_drops_excess_closers() {
        let input = doc(&["```go", "fn()", "```", "```", "after"]);
        let out = balance_fences(input);
        assert_eq!(out, doc(&["```go", "fn()", "```", "after"]));
    }

    #[test]
    fn balance_never_exceeds_open_count() {
        let input = doc(&["```", "```", "```rust", "x", "```", "```"]);
        let out = balance_fences(input);
        let closes = out.iter().filter(|l| l.trim() == "```").count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn balance_is_idempotent() {
        let input = doc(&["```go", "fn()", "```", "```", "text", "```"]);
        let once = balance_fences(input);
        let twice = balance_fences(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn balance_leaves_under_closed_documents_alone() {
        let input = doc(&["```go", "fn()"]);
        let out = balance_fences(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn process_chapter_strips_highlight_spans() {
        let content = "<span class=\"token function\">make</span> build</span>";
        let out = process_chapter(content, &FormatterTable::empty());
        assert_eq!(out, doc(&["make build"]));
    }

    #[test]
    fn process_chapter_end_to_end() {
        let content = [
            "# 1. Intro",
            "",
            "```diff-unified",
            "-old",
            "+new",
            "```",
            "```",
            "text between",
            "```diff-unified",
            "-x",
            "+y",
            "```",
        ]
        .join("\n");

        let out = process_chapter(&content, &FormatterTable::default());

        let opens = out.iter().filter(|l| *l == "```diff").count();
        let closes = out.iter().filter(|l| l.trim() == "```").count();
        assert_eq!(opens, 2);
        assert_eq!(closes, 2);
        assert!(!out.iter().any(|l| l.starts_with("```diff-")));
        assert!(out.contains(&"-old".to_owned()));
        assert!(out.contains(&"+y".to_owned()));
    }
}
