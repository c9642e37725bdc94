use clap::Parser;
use fleetpulse::cli::{check, encode, run, Cli, CheckCommand, Commands};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => run::execute(&cli, args).await,
        Commands::Check(CheckCommand::Config) => check::config(&cli),
        Commands::Encode(args) => encode::execute(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
