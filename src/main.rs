use std::sync::Arc;

use foliobot::builder::StaticSiteBuilder;
use foliobot::config::{Config, TwilioConfig};
use foliobot::convo::ConversationRouter;
use foliobot::github::GitHubClient;
use foliobot::messenger::TwilioMessenger;
use foliobot::store::{LibSqlStore, Store};
use foliobot::webhook::webhook_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let twilio = TwilioConfig::from_env().unwrap_or_else(|| {
        eprintln!("Error: TWILIO_ACCOUNT_SID not set");
        eprintln!("  export TWILIO_ACCOUNT_SID=AC...");
        std::process::exit(1);
    });

    eprintln!("🤖 foliobot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook/whatsapp", config.port);
    eprintln!("   Database: {}", config.db_path);
    eprintln!("   Artifacts: {} -> {}", config.out_dir, config.public_base_url);
    eprintln!(
        "   Policy: restart phrase '{}', reset {} draft\n",
        config.policy.restart_phrase,
        if config.policy.reset_clears_draft { "clears" } else { "keeps" },
    );

    let db_path = std::path::Path::new(&config.db_path);
    let store: Arc<dyn Store> =
        Arc::new(LibSqlStore::new_local(db_path).await.unwrap_or_else(|e| {
            eprintln!("Error: Failed to open database at {}: {e}", config.db_path);
            std::process::exit(1);
        }));

    let messenger = Arc::new(TwilioMessenger::new(twilio));
    let github = Arc::new(GitHubClient::new(config.github_token.clone()));
    let builder = Arc::new(StaticSiteBuilder::new(
        Arc::clone(&store),
        &config.out_dir,
        &config.public_base_url,
        &config.chromium_bin,
    ));

    let router = Arc::new(ConversationRouter::new(
        store,
        messenger,
        github,
        builder,
        config.policy.clone(),
    ));

    let app = webhook_routes(router, config.verify_token.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
