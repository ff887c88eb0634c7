use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use songdrop_api::config::AppConfig;
use songdrop_api::state::AppState;
use songdrop_ledger::{
    HttpLedgerClient, LedgerClient, MintPipeline, MirrorClient, OperatorIdentity, OwnershipQuery,
    TokenLifecycle,
};
use songdrop_pin::{ContentStore, PinataClient};
use songdrop_render::BadgeAssets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "songdrop_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    let assets = BadgeAssets::load_from_dir(&config.assets_dir);

    // One operator identity performs all ledger operations
    let operator = OperatorIdentity::from_hex_key(
        &config.operator_account_id,
        &config.operator_private_key,
    )?;

    let store: Arc<dyn ContentStore> = Arc::new(PinataClient::new(
        &config.pinata_base_url,
        &config.pinata_api_key,
        &config.pinata_api_secret,
    ));
    let ledger: Arc<dyn LedgerClient> =
        Arc::new(HttpLedgerClient::new(&config.ledger_node_url, operator));
    let ownership: Arc<dyn OwnershipQuery> = Arc::new(MirrorClient::new(&config.mirror_node_url));

    let pipeline = MintPipeline::new(store, ledger.clone(), &config.token_symbol);
    let lifecycle = TokenLifecycle::new(
        ledger,
        ownership,
        &config.operator_account_id,
        config.burn_batch_size,
    );

    let state = Arc::new(AppState {
        assets,
        output_dir: config.output_dir.clone(),
        pipeline,
        lifecycle,
    });
    let app = songdrop_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("SongDrop API running on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
