//! One-off maintenance: realigns `installment_count` with the recorded payment history.

use dotenvy::dotenv;
use env_helpers::get_env;
use tracing::info;

use dojo_api::{infra::postgres_persistence, use_cases::subscription::SubscriptionRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let database_url: String = get_env("DATABASE_URL");
    let persistence = postgres_persistence(&database_url).await?;

    let repaired = persistence.repair_installment_counts().await?;
    info!(repaired, "Installment counts repaired");

    Ok(())
}
