use anyhow::Result;
use clap::Parser;
use polyglot_forge::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // RUST_LOG wins; POLYGLOT_LOG is the config-level fallback.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("POLYGLOT_LOG").unwrap_or_else(|_| "info".to_owned());
        EnvFilter::try_new(&level).unwrap_or_else(|e| {
            eprintln!("WARN: POLYGLOT_LOG='{level}' is not a valid tracing filter ({e}); falling back to 'info'");
            EnvFilter::new("info")
        })
    });

    let json = std::env::var("POLYGLOT_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    init_tracing();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "CLI application startup: tracing initialised, environment loaded"
    );

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
