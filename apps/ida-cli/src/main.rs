use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

use commands::{ResolveArgs, SchemaArgs};

#[derive(Parser)]
#[command(name = "ida-cli", version, about = "Resolve scored candidate matches into an analysis situation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a JSON file of candidate matches and print the analysis situation
    Resolve(ResolveArgs),
    /// Print the resolver config JSON schema
    Schema(SchemaArgs),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Schema(args) => commands::schema::run(args),
    };
    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
