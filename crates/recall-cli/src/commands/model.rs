use clap::Args;

use crate::client::GatewayClient;
use crate::error::CliResult;
use crate::output::OutputFormat;

/// Show which upstream model the gateway is currently routing to
#[derive(Args, Debug)]
pub struct ModelCommand {}

impl ModelCommand {
    pub async fn execute(&self, client: &GatewayClient, format: OutputFormat) -> CliResult<()> {
        let active = client.active_model().await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&active)?),
            OutputFormat::Table => {
                println!("Model:    {}", active.model);
                println!("Provider: {}", active.provider);
            }
        }

        Ok(())
    }
}
