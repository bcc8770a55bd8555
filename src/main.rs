use std::io;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use readup::{PtyRunner, ReadupConfig, Review};

#[derive(Parser)]
#[command(
    name = "readup",
    version,
    about = "Refresh README code blocks with the live output of their commands"
)]
struct Cli {
    /// Markdown file to update
    #[arg(default_value = "README.md")]
    file: PathBuf,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => fail(e.to_string().trim().trim_start_matches("error: ")),
    };
    let config = ReadupConfig::load();
    let runner = PtyRunner::from_config(&config);

    let stdin = io::stdin();
    match Review::new(&runner, &config).run(&cli.file, stdin.lock(), io::stdout()) {
        Ok(outcome) => log::debug!("finished: {outcome:?}"),
        Err(e) => fail(&format!("{e:#}")),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}
