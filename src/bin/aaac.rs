use std::path::PathBuf;
use std::process::ExitCode;

use aaa_lang::compile;
use clap::Parser as ClapParser;
use log::LevelFilter;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Front-end compiler for the aaa stack language")]
struct Cli {
    /// Entry point `.aaa` file.
    file: PathBuf,

    /// Builtins file providing the primitive types and functions.
    #[arg(short, long, default_value = "builtins.aaa")]
    builtins: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("logger already initialized");

    let (diagnostics, checked) = compile(&args.file, &args.builtins);
    diagnostics.report();

    match checked {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}
