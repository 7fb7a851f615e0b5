use clap::{ColorChoice, Parser};
use colored::Colorize;
use ncmc::{Args, logger::Logger};
use std::{
    io::{IsTerminal, stderr},
    process,
};

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Auto => {
            if !stderr().is_terminal() {
                colored::control::set_override(false);
            }
        }
        ColorChoice::Never => colored::control::set_override(false),
    }

    Logger::init(args.log_level())?;
    args.command.execute()
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".bold().red(), e);
        process::exit(1);
    }
}
