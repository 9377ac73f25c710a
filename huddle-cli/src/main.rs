use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use huddle_client::diagnostics::{DiagnosticsSink, FanoutSink, HttpDiagnosticsSink, TracingSink};
use huddle_client::render::LoggingRenderSink;
use huddle_client::{
    CallEngine, EngineConfig, EngineParts, EngineSnapshot, LinkState, LocalMediaSession,
    NoCaptureSource, ReconnectPolicy, RelayClient, RelayStatus, WebRtcConnectionFactory,
    credentials::load_catalog,
};
use huddle_core::utils::DEFAULT_RELAY_PORT;
use huddle_server::{DEFAULT_METERED_DOMAIN, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STATUS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "huddle", version, about = "Small mesh calls over a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "HOSTNAME", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = DEFAULT_RELAY_PORT)]
        port: u16,

        #[arg(long, env = "METERED_API_KEY")]
        metered_api_key: Option<String>,

        #[arg(long, default_value = DEFAULT_METERED_DOMAIN)]
        metered_domain: String,
    },

    /// Join a call as a headless, receive-only participant.
    Join {
        /// Relay WebSocket URL, e.g. ws://localhost:4057/ws
        #[arg(long)]
        url: String,

        #[arg(long)]
        credentials_url: Option<String>,

        #[arg(long)]
        diagnostics_url: Option<String>,

        /// Connectivity profile to start with.
        #[arg(long)]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            host,
            port,
            metered_api_key,
            metered_domain,
        } => {
            let config = ServerConfig {
                host,
                port,
                metered_api_key,
                metered_domain,
            };
            serve(config).await
        }
        Commands::Join {
            url,
            credentials_url,
            diagnostics_url,
            profile,
        } => join(url, credentials_url, diagnostics_url, profile).await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    println!("{}", "📡 Starting huddle relay...".green().bold());
    println!("   🔌 Listening: {}", config.bind_addr().cyan());
    if config.metered_api_key.is_some() {
        println!("   🔑 TURN credentials from {}", config.metered_domain.cyan());
    } else {
        println!("   {}", "⚠️  No Metered API key, serving STUN fallback".yellow());
    }

    huddle_server::serve(config, shutdown_signal()).await?;

    println!("{}", "👋 Relay stopped".green());
    Ok(())
}

async fn join(
    url: String,
    credentials_url: Option<String>,
    diagnostics_url: Option<String>,
    profile: Option<String>,
) -> Result<()> {
    println!("{}", "🎧 Joining call...".green().bold());
    println!("   📡 Relay: {}", url.cyan());

    let mut sinks: Vec<Arc<dyn DiagnosticsSink>> = vec![Arc::new(TracingSink)];
    if let Some(endpoint) = diagnostics_url {
        println!("   📝 Diagnostics: {}", endpoint.cyan());
        sinks.push(Arc::new(HttpDiagnosticsSink::new(endpoint, Some(url.clone()))));
    }
    let diagnostics: Arc<dyn DiagnosticsSink> = Arc::new(FanoutSink::new(sinks));

    let catalog = load_catalog(credentials_url.as_deref(), diagnostics.as_ref()).await;
    println!("   🧭 Profiles: {}", catalog.names().join(", "));

    let source = Arc::new(NoCaptureSource);
    let media = LocalMediaSession::acquire(source.as_ref()).await;

    let (relay, relay_events, relay_task) = RelayClient::spawn(url, ReconnectPolicy::default());
    let config = EngineConfig {
        initial_profile: profile,
        ..EngineConfig::default()
    };
    let parts = EngineParts {
        catalog,
        media,
        media_source: source,
        factory: Arc::new(WebRtcConnectionFactory),
        signaling: Arc::new(relay),
        render: Arc::new(LoggingRenderSink),
        diagnostics,
    };
    let (engine, engine_task) = CallEngine::spawn(config, parts, relay_events);

    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => match engine.snapshot().await {
                Ok(snapshot) => print_status(&snapshot),
                Err(e) => {
                    warn!("Engine stopped: {:#}", e);
                    break;
                }
            },
        }
    }

    info!("Leaving call");
    if let Err(e) = engine.shutdown().await {
        warn!("Engine already stopped: {:#}", e);
    }
    engine_task.await.context("Engine task panicked")?;
    relay_task.abort();

    println!("{}", "👋 Left the call".green());
    Ok(())
}

fn print_status(snapshot: &EngineSnapshot) {
    let relay = match snapshot.relay {
        RelayStatus::Connected => "connected".green(),
        RelayStatus::Connecting => "connecting".yellow(),
        RelayStatus::Reconnecting => "reconnecting".yellow(),
        RelayStatus::Offline => "offline".red(),
    };
    let connected = snapshot
        .links
        .iter()
        .filter(|link| link.state == LinkState::Connected)
        .count();

    println!(
        "{} relay {}, {} participant(s), {}/{} link(s) up, profile {}",
        "●".cyan(),
        relay,
        snapshot.participant_count(),
        connected,
        snapshot.links.len(),
        snapshot
            .last_good_profile
            .as_deref()
            .or(snapshot.selected_profile.as_deref())
            .unwrap_or("-"),
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
