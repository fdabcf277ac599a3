use nightfall::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), NightfallError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let rules = config.game_config().await?;

    let store = MemoryLobbyStore::new();
    let lobbies = config.seed_lobbies().await?;
    let seeded = lobbies.len();
    for lobby in lobbies {
        store.insert(lobby).await?;
    }

    tracing::info!(
        bind = %config.bind_addr,
        lobbies = seeded,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        "starting nightfall server"
    );

    let server = NightfallServer::builder()
        .config(config)
        .build(GameService::new(store).with_config(rules))
        .await?;
    server.run().await
}
