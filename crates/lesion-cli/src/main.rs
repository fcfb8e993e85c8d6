/*!
Command line tools and HTTP service for lesion classification.
*/

mod commands;
mod fetch;
mod handler;

use anyhow::Result;
use clap::Parser;
use commands::Command;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Lesion {
    /// Log request details, including every prediction.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Lesion::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    commands::run(args.command)
}
