//! Per-language code formatting for fenced blocks.
//!
//! The language→formatter mapping is a fixed table built at startup. Each
//! entry is an invocation recipe for an external formatter binary; a block
//! whose language has no entry, or whose formatter fails in any way, is left
//! exactly as it was. Formatting problems are diagnostics, never pipeline
//! errors.

use std::io::Write as _;
use std::process::{Command, Output, Stdio};

use anyhow::Context as _;

/// How a formatter binary receives the code and hands back the result.
#[derive(Debug, Clone)]
pub enum Recipe {
    /// Code is piped to stdin; the result is read from stdout.
    Stdin {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// Code is passed as the final command-line argument; the result is
    /// read from stdout.
    Arg {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// Code is written to a scratch file passed as the final argument; the
    /// result is read from stdout.
    Scratch {
        program: &'static str,
        args: &'static [&'static str],
        extension: &'static str,
    },
    /// Code is written to a scratch file the formatter rewrites in place;
    /// the result is the file read back.
    InPlace {
        program: &'static str,
        args: &'static [&'static str],
        extension: &'static str,
    },
}

/// Immutable lookup table from (lowercased) language tags to recipes.
#[derive(Debug, Clone)]
pub struct FormatterTable {
    entries: Vec<(&'static str, Recipe)>,
}

impl FormatterTable {
    pub fn new(entries: Vec<(&'static str, Recipe)>) -> Self {
        Self { entries }
    }

    /// A table that formats nothing; every block passes through.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn lookup(&self, lang: &str) -> Option<&Recipe> {
        let lang = lang.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(tag, _)| *tag == lang)
            .map(|(_, recipe)| recipe)
    }
}

const fn prettier(args: &'static [&'static str]) -> Recipe {
    Recipe::Scratch {
        program: "prettier",
        args,
        extension: ".tmp",
    }
}

impl Default for FormatterTable {
    fn default() -> Self {
        const GOFMT: Recipe = Recipe::Stdin {
            program: "gofmt",
            args: &[],
        };
        const RUSTFMT: Recipe = Recipe::Stdin {
            program: "rustfmt",
            args: &["--emit", "stdout"],
        };
        const BLACK: Recipe = Recipe::Arg {
            program: "black",
            args: &["--code"],
        };
        const RUBOCOP: Recipe = Recipe::InPlace {
            program: "rubocop",
            args: &["--auto-correct", "--stdin"],
            extension: ".rb",
        };
        const DOTNET: Recipe = Recipe::InPlace {
            program: "dotnet",
            args: &["format", "--include"],
            extension: ".cs",
        };
        const JAVA: Recipe = Recipe::Stdin {
            program: "google-java-format",
            args: &["-"],
        };

        const BABEL: Recipe = prettier(&["--parser", "babel"]);
        const TYPESCRIPT: Recipe = prettier(&["--parser", "typescript"]);
        const MARKDOWN: Recipe = prettier(&["--parser", "markdown"]);
        const YAML: Recipe = prettier(&["--parser", "yaml"]);

        Self::new(vec![
            ("javascript", BABEL),
            ("js", BABEL),
            ("jsx", BABEL),
            ("typescript", TYPESCRIPT),
            ("ts", TYPESCRIPT),
            ("tsx", TYPESCRIPT),
            ("json", prettier(&["--parser", "json"])),
            ("css", prettier(&["--parser", "css"])),
            ("scss", prettier(&["--parser", "scss"])),
            ("less", prettier(&["--parser", "less"])),
            ("html", prettier(&["--parser", "html"])),
            ("markdown", MARKDOWN),
            ("md", MARKDOWN),
            ("yaml", YAML),
            ("yml", YAML),
            ("graphql", prettier(&["--parser", "graphql"])),
            ("go", GOFMT),
            ("rust", RUSTFMT),
            ("rs", RUSTFMT),
            ("python", BLACK),
            ("py", BLACK),
            ("ruby", RUBOCOP),
            ("rb", RUBOCOP),
            ("c#", DOTNET),
            ("cs", DOTNET),
            ("csharp", DOTNET),
            ("java", JAVA),
        ])
    }
}

/// Scans the document for fenced code blocks and replaces each block's
/// content with the formatted result when a recipe for its language exists
/// and succeeds. Everything else passes through untouched.
pub fn format_code_blocks(mut lines: Vec<String>, table: &FormatterTable) -> Vec<String> {
    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if !trimmed.starts_with("```") {
            i += 1;
            continue;
        }
        let lang = trimmed[3..].trim().to_owned();

        let mut close = i + 1;
        while close < lines.len() && !lines[close].trim().starts_with("```") {
            close += 1;
        }
        if close >= lines.len() {
            // Unterminated block; leave the tail alone.
            break;
        }

        if !lang.is_empty()
            && let Some(formatted) = format_block(table, &lang, &lines[i + 1..close])
        {
            let formatted_len = formatted.len();
            lines.splice(i + 1..close, formatted);
            close = i + 1 + formatted_len;
        }

        // Resume past the closing fence.
        i = close + 1;
    }
    lines
}

fn format_block(table: &FormatterTable, lang: &str, code_lines: &[String]) -> Option<Vec<String>> {
    let Some(recipe) = table.lookup(lang) else {
        tracing::debug!(lang, "no formatter for language; leaving block as-is");
        return None;
    };

    let code = code_lines.join("\n");
    if code.trim().is_empty() {
        return None;
    }

    match run_recipe(recipe, &code) {
        Ok(formatted) => Some(formatted),
        Err(err) => {
            tracing::warn!(lang, "code formatting failed: {err:#}");
            None
        }
    }
}

fn run_recipe(recipe: &Recipe, code: &str) -> anyhow::Result<Vec<String>> {
    let formatted = match recipe {
        Recipe::Stdin { program, args } => {
            let mut child = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .with_context(|| format!("spawn {program}"))?;
            {
                let mut stdin = child.stdin.take().context("open formatter stdin")?;
                stdin
                    .write_all(code.as_bytes())
                    .context("write formatter stdin")?;
            }
            let output = child.wait_with_output().context("wait for formatter")?;
            ensure_success(program, &output)?;
            String::from_utf8(output.stdout).context("formatter output is not utf-8")?
        }
        Recipe::Arg { program, args } => {
            let output = Command::new(program)
                .args(*args)
                .arg(code)
                .output()
                .with_context(|| format!("run {program}"))?;
            ensure_success(program, &output)?;
            String::from_utf8(output.stdout).context("formatter output is not utf-8")?
        }
        Recipe::Scratch {
            program,
            args,
            extension,
        } => {
            let scratch = scratch_file(extension, code)?;
            let output = Command::new(program)
                .args(*args)
                .arg(scratch.path())
                .output()
                .with_context(|| format!("run {program}"))?;
            ensure_success(program, &output)?;
            String::from_utf8(output.stdout).context("formatter output is not utf-8")?
        }
        Recipe::InPlace {
            program,
            args,
            extension,
        } => {
            let scratch = scratch_file(extension, code)?;
            let output = Command::new(program)
                .args(*args)
                .arg(scratch.path())
                .output()
                .with_context(|| format!("run {program}"))?;
            ensure_success(program, &output)?;
            std::fs::read_to_string(scratch.path()).context("read rewritten scratch file")?
        }
    };

    if formatted.trim().is_empty() {
        anyhow::bail!("formatter produced empty output");
    }

    Ok(formatted
        .trim_end_matches('\n')
        .split('\n')
        .map(str::to_owned)
        .collect())
}

// The scratch file is removed on drop, on every exit path.
fn scratch_file(extension: &str, code: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let scratch = tempfile::Builder::new()
        .prefix("zenbookify_code_")
        .suffix(extension)
        .tempfile()
        .context("create formatter scratch file")?;
    std::fs::write(scratch.path(), code)
        .with_context(|| format!("write formatter scratch file: {}", scratch.path().display()))?;
    Ok(scratch)
}

fn ensure_success(program: &str, output: &Output) -> anyhow::Result<()> {
    if output.status.success() {
        return Ok(());
    }
    anyhow::bail!(
        "{program} exited unsuccessfully ({}): {}",
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    );
}
