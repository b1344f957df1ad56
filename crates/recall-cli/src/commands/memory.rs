use clap::{Args, Subcommand};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use recall_server::memory::MemoryEntry;

use crate::client::GatewayClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Args, Debug)]
pub struct MemoryCommand {
    #[clap(subcommand)]
    pub command: MemorySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum MemorySubcommand {
    #[clap(about = "List stored memories")]
    List(ListArgs),
    #[clap(about = "Add a memory by hand")]
    Add(AddArgs),
    #[clap(about = "Replace the text of a memory")]
    Update(UpdateArgs),
    #[clap(about = "Delete a memory")]
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Owner to list for; defaults to the gateway's configured user
    #[clap(long)]
    pub user: Option<String>,

    /// Maximum rows to show
    #[clap(long, short = 'n', default_value = "50")]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub content: String,

    #[clap(long)]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    pub content: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,
}

impl MemoryCommand {
    pub async fn execute(&self, client: &GatewayClient, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            MemorySubcommand::List(args) => list(client, args, format).await,
            MemorySubcommand::Add(args) => add(client, args, format).await,
            MemorySubcommand::Update(args) => {
                let status = client.update_memory(&args.id, &args.content).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                    OutputFormat::Table => println!("Memory {} {}", args.id, status.status),
                }
                Ok(())
            }
            MemorySubcommand::Delete(args) => {
                let status = client.delete_memory(&args.id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                    OutputFormat::Table => println!("Memory {} {}", args.id, status.status),
                }
                Ok(())
            }
        }
    }
}

async fn list(client: &GatewayClient, args: &ListArgs, format: OutputFormat) -> CliResult<()> {
    let memories = client.list_memories(args.user.as_deref()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&memories)?),
        OutputFormat::Table => {
            if memories.is_empty() {
                println!("No memories stored.");
                return Ok(());
            }
            println!("{}", memory_table(&memories, args.limit));
            if memories.len() > args.limit {
                println!("Showing {} of {} memories", args.limit, memories.len());
            }
        }
    }

    Ok(())
}

async fn add(client: &GatewayClient, args: &AddArgs, format: OutputFormat) -> CliResult<()> {
    let outcome = client.add_memory(&args.content, args.user.as_deref()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Table => {
            if outcome.results.is_empty() {
                println!("Store made no changes.");
            }
            for event in &outcome.results {
                println!("{:<7} {}  {}", event.event, event.id, event.memory);
            }
        }
    }

    Ok(())
}

fn memory_table(memories: &[MemoryEntry], limit: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Memory", "Source", "Created"]);

    for memory in memories.iter().take(limit) {
        let source = memory
            .metadata
            .as_ref()
            .and_then(|m| m.get("source"))
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let created = memory
            .created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&memory.id),
            Cell::new(truncate_string(&memory.memory, 60)),
            Cell::new(source),
            Cell::new(created),
        ]);
    }

    table
}
