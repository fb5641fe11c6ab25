mod app;
mod cli;
mod logging;
mod menu;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::initialize(args.log, args.log_level);
    app::run(&args)
}
