use clap::Parser;
use thought_stream::{AppConfig, CommandCenter, SessionUpdate};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "thought_stream", about = "Stream a query through the agent pipeline")]
struct Cli {
    /// Query to send to the pipeline
    query: Option<String>,

    /// Backend base URL (overrides config.yaml and the environment)
    #[arg(long)]
    api_url: Option<String>,

    /// Only probe backend health, do not run a query
    #[arg(long)]
    probe_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?.with_api_url_override(cli.api_url.clone());
    info!("Loaded Configuration: {:?}", config);

    let center = CommandCenter::from_config(&config);
    center.start().await?;

    if cli.probe_only {
        print_health(&center);
        center.shutdown().await;
        return Ok(());
    }

    let Some(query) = cli.query else {
        warn!("No query given; pass one as the first argument or use --probe-only");
        center.shutdown().await;
        return Ok(());
    };

    let mut updates = center.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(SessionUpdate::Event { event, .. }) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to render event: {}", e),
                },
                Ok(SessionUpdate::RunFailed { message, .. }) => {
                    eprintln!("stream error: {} (showing fallback)", message)
                }
                Ok(SessionUpdate::RunFinished { .. }) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!("Display lagged by {} updates", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    center.run_query(&query).await;
    printer.await.ok();

    let projection = center.projection();
    match &projection.strategy {
        Some(strategy) => println!(
            "strategy: {:?} {:?} ({:?}) - {}",
            strategy.direction,
            strategy.security.as_deref().unwrap_or("-"),
            strategy.confidence,
            strategy.rationale
        ),
        None => println!("strategy: none"),
    }
    match &projection.risk {
        Some(risk) => println!("risk: {} ({})", risk.score, risk.label),
        None => println!("risk: none"),
    }
    print_health(&center);

    center.shutdown().await;
    Ok(())
}

fn print_health(center: &CommandCenter) {
    let health = center.health();
    let latency = health
        .api_latency_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "unreachable".to_string());
    println!(
        "health: api {}, registry {}, {} agents",
        latency,
        if health.registry_healthy { "healthy" } else { "unhealthy" },
        health.agents.len()
    );
}
