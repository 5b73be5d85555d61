use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    zenbookify::logging::init().context("init logging")?;

    let cli = zenbookify::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        zenbookify::cli::Command::Build(args) => {
            zenbookify::build::run(args).context("build")?;
        }
        zenbookify::cli::Command::Compile(args) => {
            let dir = PathBuf::from(&args.dir);
            zenbookify::book::compile_epub(&dir, &args.title, args.css.as_deref())
                .context("compile")?;
        }
    }

    Ok(())
}
