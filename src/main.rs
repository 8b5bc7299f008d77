use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxi_orders::{AppResult, AppState, config::Config, export, seed};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxi_orders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let config = Config::from_env()?;
    tracing::info!("Opening database {}", config.database_url);

    let state = AppState::connect(config).await?;
    tracing::info!("Database ready");

    if state.config.seed_demo_data {
        seed::seed_demo_data(&state, &state.config.seed_password).await?;
    }

    let records = state.orders.list_all_orders_joined().await?;
    let written = export::write_all(&records, &state.config.export_dir)?;
    tracing::info!(
        files = written.len(),
        dir = %state.config.export_dir.display(),
        "Order ledger exported"
    );

    Ok(())
}
