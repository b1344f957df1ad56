use clap::Args;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use recall_server::interests::InterestSummary;

use crate::client::GatewayClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

/// Summarize the user's interests from stored memories
#[derive(Args, Debug)]
pub struct InterestsCommand {
    /// Sample memories shown per topic
    #[clap(long, default_value = "2")]
    pub samples: usize,
}

impl InterestsCommand {
    pub async fn execute(&self, client: &GatewayClient, format: OutputFormat) -> CliResult<()> {
        let summary = client.interests().await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Table => self.print_table(&summary),
        }

        Ok(())
    }

    fn print_table(&self, summary: &InterestSummary) {
        println!("{}\n", summary.summary);

        if summary.topics.is_empty() {
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Topic", "Count", "Sample memories"]);

        for topic in &summary.topics {
            let samples = topic
                .memories
                .iter()
                .take(self.samples)
                .map(|m| truncate_string(m, 60))
                .collect::<Vec<_>>()
                .join("\n");
            table.add_row(vec![
                Cell::new(&topic.name),
                Cell::new(topic.count),
                Cell::new(samples),
            ]);
        }

        println!("{table}");
    }
}
