use actix_web::{web, App, HttpServer};
use parler_search::config::AppConfig;
use parler_search::handlers;
use parler_search::MongoStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing::info!(
        endpoint = %config.mongo_endpoint,
        port = config.mongo_port,
        database = %config.mongo_database,
        "connecting to store"
    );
    let store = web::Data::new(MongoStore::connect(&config).await?);

    tracing::info!("Server listening on http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .configure(handlers::configure::<MongoStore>)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    if let Err(err) = run().await {
        tracing::error!("Fatal: {:#}", err);
        return Err(err);
    }
    Ok(())
}
