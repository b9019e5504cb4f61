use anyhow::Result;
use meet_scheduler::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
