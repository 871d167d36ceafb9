use anyhow::Result;
use woundbot::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
