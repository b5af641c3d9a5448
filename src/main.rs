//! Textframe - signed-nonce gateway for video transcript search

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use textframe::{
    auth::{self, IdentityStore, InMemoryIdentityStore, MongoIdentityStore, NonceAuthority},
    config::Args,
    db::MongoClient,
    logging::{InMemoryUsageSink, MongoUsageSink, UsageSink},
    server,
    services::{GeminiClient, Gateway, YouTubeTranscriptClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("textframe={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Textframe - transcript search gateway");
    info!("======================================");
    info!("Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT_SHORT"));
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB database: {}", args.mongodb_db);
    info!("Gemini model: {}", args.gemini.gemini_model_name);
    info!("Proxy: {}:{}", args.proxy.proxy_domain, args.proxy.proxy_port);
    info!("Upstream timeout: {}ms", args.upstream_timeout_ms);
    info!("Nonce TTL: {}s", args.nonce_ttl_secs);
    info!("======================================");

    // MongoDB is required outside dev mode
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing in memory): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let persistent = mongo.is_some();
    let (identities, usage): (Arc<dyn IdentityStore>, Arc<dyn UsageSink>) = match mongo {
        Some(ref client) => (
            Arc::new(MongoIdentityStore::new(client).await?),
            Arc::new(MongoUsageSink::new(client).await?),
        ),
        None => (
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(InMemoryUsageSink::new()),
        ),
    };

    let nonces = Arc::new(NonceAuthority::new(Some(args.nonce_ttl())));
    auth::spawn_cleanup_task(Arc::clone(&nonces));

    let transcripts = Arc::new(YouTubeTranscriptClient::new(
        Some(&args.proxy_config()),
        args.upstream_timeout(),
    )?);
    let generator = Arc::new(GeminiClient::new(
        &args.gemini.gemini_api_base,
        &args.gemini.gemini_model_name,
        &args.gemini.gemini_api_key,
        args.upstream_timeout(),
    )?);

    let gateway = Gateway::new(
        identities,
        nonces,
        transcripts,
        generator,
        usage,
        args.upstream_timeout(),
    );

    let state = Arc::new(server::AppState::new(args, Arc::new(gateway), persistent));
    server::run(state).await?;

    Ok(())
}
