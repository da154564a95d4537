use fuelbook::{api, config::Config, db::init_db, AppError, FuelLedger, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fuelbook stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let pool = init_db(&config.database_path).await?;
    let ledger: Arc<dyn FuelLedger> = Arc::new(Repository::new(pool));
    tracing::info!(odometer_policy = %config.odometer_policy, "Fuel ledger ready");

    let app = api::create_router(api::AppState::new(ledger, config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
