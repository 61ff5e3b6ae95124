use clap::Parser;
use chore::cli::commands::Cli;
use chore::cli::handlers;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
