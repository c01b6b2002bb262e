use clap::Parser;

mod args;
mod commands;

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = commands::run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(commands::exit_code_for(&err));
    }
}
