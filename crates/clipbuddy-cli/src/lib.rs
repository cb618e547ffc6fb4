pub mod cli;
pub mod commands;
pub mod logging;

use clap::Parser;
use cli::Clipbuddy;
use commands::handle_command;
use std::process;

/// Run the clipbuddy CLI application
pub fn run_main() {
    let args = Clipbuddy::parse();
    let result = handle_command(args);

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
