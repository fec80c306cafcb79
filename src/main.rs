use anyhow::Context;
use insight::cli::{self, output::Output, Cli, Commands};
use insight::{build_router, AppState, ConfigManager, InsightConfig, ProviderRegistry, SessionService};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(config: &InsightConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.server.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Periodically evict idle coaching sessions
fn spawn_session_reaper(sessions: Arc<SessionService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sessions.evict_idle();
        }
    });
}

async fn serve(cli: &Cli, out: &Output) -> anyhow::Result<()> {
    let config_manager = Arc::new(
        ConfigManager::new(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?,
    );
    let config = config_manager.config();
    init_tracing(&config, cli.verbose);
    out.banner();

    if let Err(e) = config_manager.start_watching() {
        tracing::warn!(error = %e, "Config hot reload disabled");
    }

    let llm_factory = Arc::new(ProviderRegistry::from_config(&config));
    let state = AppState::new(Arc::clone(&config_manager), llm_factory)?;
    spawn_session_reaper(Arc::clone(&state.sessions));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    out.success(&format!("Listening on http://{}", addr));
    tracing::info!(%addr, prefix = %config.api.prefix, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await
        .context("server error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();
    let out = cli.output();

    let result = match cli.command {
        None | Some(Commands::Serve) => serve(&cli, &out).await,
        Some(Commands::Config { full, validate }) => InsightConfig::load(&cli.config)
            .and_then(|config| cli::show_config(&out, &config, full, validate))
            .map_err(anyhow::Error::from),
        Some(Commands::Tools) => InsightConfig::load(&cli.config)
            .map(|config| cli::list_tools(&out, &config))
            .map_err(anyhow::Error::from),
        Some(Commands::Workflows) => {
            cli::list_workflows(&out);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            out.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
