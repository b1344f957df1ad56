use clap::{Parser, Subcommand};

use recall_cli::commands::{InterestsCommand, MemoryCommand, ModelCommand};
use recall_cli::{CliResult, GatewayClient, OutputFormat};

#[derive(Parser, Debug)]
#[clap(name = "recall-cli", about = "Manage the Recall memory gateway", version)]
struct Cli {
    /// Base URL of a running gateway
    #[clap(long, global = true, default_value = "http://127.0.0.1:9000")]
    url: String,

    /// Print JSON instead of tables
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(about = "Inspect and edit stored memories")]
    Memory(MemoryCommand),
    #[clap(about = "Summarize interests from stored memories")]
    Interests(InterestsCommand),
    #[clap(about = "Show the active upstream model")]
    Model(ModelCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    let client = GatewayClient::new(&cli.url)?;

    match cli.command {
        Command::Memory(cmd) => cmd.execute(&client, format).await,
        Command::Interests(cmd) => cmd.execute(&client, format).await,
        Command::Model(cmd) => cmd.execute(&client, format).await,
    }
}
