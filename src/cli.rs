use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download a book, clean up each chapter and compile the e-book.
    Build(BuildArgs),
    /// Re-run only the e-book compile step on an existing chapter directory.
    Compile(CompileArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Book id (`user/books/slug`) or the full book URL.
    #[arg(long)]
    pub book: String,

    /// Book title; also the output directory name.
    #[arg(long)]
    pub title: String,

    /// Optional stylesheet passed to the document compiler.
    #[arg(long)]
    pub css: Option<String>,

    /// Base URL of the book-hosting site.
    #[arg(long, default_value = "https://zenn.dev")]
    pub base_url: String,

    /// Skip external code formatters; fenced blocks are left as converted.
    #[arg(long)]
    pub no_format: bool,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Directory containing the chapter Markdown files.
    #[arg(long)]
    pub dir: String,

    /// Book title; also the output file stem.
    #[arg(long)]
    pub title: String,

    /// Optional stylesheet passed to the document compiler.
    #[arg(long)]
    pub css: Option<String>,
}
