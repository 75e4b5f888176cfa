use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rink_stats::api::{build_router, state::AppState};
use rink_stats::calculate::{SortColumn, SortDirection, SortState, StatsPipeline};
use rink_stats::config::AppConfig;
use rink_stats::fetch::HttpStatsSource;
use rink_stats::models::{EntityKind, SituationFilter};
use rink_stats::table::{load_table, render_text, TableRequest};

#[derive(Parser)]
#[command(name = "rink-stats")]
#[command(about = "Score-adjusted situational hockey stats for players and teams")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Base URL of the upstream stats server; overrides the config file
    #[arg(long)]
    source_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a ranked table
    Report {
        /// "players" or "teams"
        #[arg(long, default_value = "teams")]
        kind: String,

        /// Strength situation: all, ev5, pp, sh, penShot, noOppG, noOwnG, other
        #[arg(long, default_value = "all")]
        situation: String,

        /// Sort column (e.g. pts, g_diff, sv_pct, cf_pct_adj, name)
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction: asc or desc
        #[arg(long, default_value = "desc")]
        order: String,

        /// Max rows to print
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a text table
        #[arg(long)]
        json: bool,
    },
}

fn parse_kind(s: &str) -> Result<EntityKind> {
    match s.trim().to_lowercase().as_str() {
        "players" | "player" => Ok(EntityKind::Player),
        "teams" | "team" => Ok(EntityKind::Team),
        other => bail!("Unknown kind (expected players or teams): {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(url) = &cli.source_url {
        config.source.base_url = url.clone();
        config.validate().context("Invalid --source-url")?;
    }

    // Initialize tracing
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting rink-stats v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = StatsPipeline::from_config(&config).context("Invalid score adjustment table")?;
    let source = HttpStatsSource::new(&config.source).context("Failed to build upstream client")?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            tracing::info!("Upstream source: {}", source.base_url());
            let state = AppState::new(Arc::new(source), pipeline);
            let app = build_router(state, &config.server.cors_origin);

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Report {
            kind,
            situation,
            sort,
            order,
            limit,
            json,
        } => {
            let kind = parse_kind(&kind)?;
            let mut request = TableRequest::new(kind);
            request.situation = situation
                .parse::<SituationFilter>()
                .context("Invalid --situation")?;
            if let Some(sort) = sort {
                let column: SortColumn = sort.parse().map_err(anyhow::Error::msg)?;
                request.sort = SortState::new(column);
            }
            request.sort.direction = order.parse::<SortDirection>().map_err(anyhow::Error::msg)?;
            request.limit = limit;

            let table = load_table(&source, &pipeline, &request)
                .await
                .context("Failed to build table")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                println!(
                    "{} | situation: {} | sort: {} {}",
                    kind, table.situation, table.sort.column, table.sort.direction
                );
                print!("{}", render_text(&table, kind));
            }
        }
    }

    Ok(())
}
