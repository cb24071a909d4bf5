//! `skills-utils`: quarter math, object store transfers and JSON-lines checks
//! for the skills pipeline, from the command line.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use skills_utils::cli::args::SkillsArgs;
use skills_utils::cli::commands::execute_command;

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn main() {
    let args = SkillsArgs::parse();

    Builder::new()
        .filter_level(log_level(args.verbosity()))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
