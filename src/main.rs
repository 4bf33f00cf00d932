use clap::Parser;
use weekplan::cli::commands::Cli;
use weekplan::cli::handlers;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("WEEKPLAN_LOG", "error"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
