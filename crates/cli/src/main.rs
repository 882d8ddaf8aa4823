use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relsync_core::{
    config::LibraryKind,
    dispatch::{Dispatcher, TrackerResolvers},
    download_client::{DownloadClient, QBittorrentClient},
    library::{MovieLibrary, RadarrClient, SeriesLibrary, SonarrClient},
    load_config, metrics,
    notify::DiscordNotifier,
    release_index::{ReleaseIndex, ReleasesMoeClient},
    run_movie_sync, run_series_sync,
    selection::{AutoSelection, InteractiveSelection, SelectionStrategy},
    status::{check_services, ServiceSet, ServiceStatus},
    tracking::{AniListClient, TrackingService},
    validate_config, validate_for_library, Config, MappingStore, RunContext, SyncRunSummary,
};

#[derive(Parser)]
#[command(name = "relsync", version)]
#[command(about = "Reconcile Sonarr/Radarr anime against the best-release index")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "RELSYNC_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Report mismatches without adding torrents
    #[arg(long)]
    dry_run: bool,

    /// Ask which group to grab when several are recommended
    #[arg(long)]
    interactive: bool,

    /// Print the run summary (or service status) as JSON on stdout
    #[arg(long)]
    json_summary: bool,

    /// Print Prometheus metrics on stdout after the run
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync the Sonarr library
    Sonarr,
    /// Sync the Radarr library
    Radarr,
    /// Sync every configured library
    All,
    /// Check that every configured service answers
    Status,
    /// Validate the configuration file and exit
    ConfigValidate,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Collaborators shared by every library run.
struct Services {
    mappings: MappingStore,
    tracking: Arc<dyn TrackingService>,
    release_index: Arc<dyn ReleaseIndex>,
    strategy: Arc<dyn SelectionStrategy>,
}

async fn run(cli: Cli) -> Result<()> {
    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    config.sync.dry_run |= cli.dry_run;
    config.sync.interactive |= cli.interactive;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::ConfigValidate => return config_validate(&config),
        Command::Status => return status(&config, cli.json_summary).await,
        _ => {}
    }

    let kinds = libraries_to_run(&cli.command, &config)?;
    for kind in &kinds {
        validate_for_library(&config, *kind)
            .with_context(|| format!("{} is not configured", kind))?;
    }

    let mappings = MappingStore::load(&config.mappings)
        .await
        .context("Failed to load identifier mappings")?;

    let strategy: Arc<dyn SelectionStrategy> = if config.sync.interactive {
        Arc::new(InteractiveSelection::stdio())
    } else {
        Arc::new(AutoSelection)
    };

    let services = Services {
        mappings,
        tracking: Arc::new(
            AniListClient::new(&config.tracking).context("Failed to create AniList client")?,
        ),
        release_index: Arc::new(
            ReleasesMoeClient::new(&config.release_index)
                .context("Failed to create releases.moe client")?,
        ),
        strategy,
    };

    let mut summaries = Vec::new();
    for kind in kinds {
        let mut ctx = build_context(&config, kind, &services).await?;
        let summary = match kind {
            LibraryKind::Sonarr => run_sonarr(&config, &services, &mut ctx).await?,
            LibraryKind::Radarr => run_radarr(&config, &services, &mut ctx).await?,
        };
        log_summary(&summary);
        summaries.push(summary);
    }

    if cli.json_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("Failed to encode summary")?
        );
    }

    if cli.print_metrics {
        let registry = metrics::registry().context("Failed to register metrics")?;
        print!(
            "{}",
            metrics::encode_text(&registry).context("Failed to encode metrics")?
        );
    }

    Ok(())
}

fn configured_libraries(config: &Config) -> Vec<LibraryKind> {
    let mut kinds = Vec::new();
    if config.sonarr.is_some() {
        kinds.push(LibraryKind::Sonarr);
    }
    if config.radarr.is_some() {
        kinds.push(LibraryKind::Radarr);
    }
    kinds
}

fn libraries_to_run(command: &Command, config: &Config) -> Result<Vec<LibraryKind>> {
    let kinds = match command {
        Command::Sonarr => vec![LibraryKind::Sonarr],
        Command::Radarr => vec![LibraryKind::Radarr],
        _ => configured_libraries(config),
    };

    if kinds.is_empty() {
        bail!("Neither [sonarr] nor [radarr] is configured");
    }
    Ok(kinds)
}

/// `validate_config` has already passed; check each configured library too.
fn config_validate(config: &Config) -> Result<()> {
    let kinds = configured_libraries(config);
    if kinds.is_empty() {
        bail!("Neither [sonarr] nor [radarr] is configured");
    }
    for kind in &kinds {
        validate_for_library(config, *kind)
            .with_context(|| format!("{} is not configured correctly", kind))?;
    }

    println!("Configuration is valid");
    let libraries: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    println!("  libraries:    {}", libraries.join(", "));
    println!("  trackers:     {}", config.sync.trackers.join(", "));
    println!(
        "  torrent cap:  {}",
        config
            .sync
            .max_torrents_to_add
            .map_or_else(|| "none".to_string(), |cap| cap.to_string())
    );
    println!(
        "  qBittorrent:  {}",
        config.qbittorrent.as_ref().map_or("not configured", |qb| qb.url.as_str())
    );
    println!(
        "  Discord:      {}",
        if config.discord.is_some() { "configured" } else { "not configured" }
    );
    Ok(())
}

async fn status(config: &Config, json: bool) -> Result<()> {
    let services = ServiceSet {
        tracking: Arc::new(
            AniListClient::new(&config.tracking).context("Failed to create AniList client")?,
        ),
        release_index: Arc::new(
            ReleasesMoeClient::new(&config.release_index)
                .context("Failed to create releases.moe client")?,
        ),
        sonarr: match &config.sonarr {
            Some(c) => Some(Arc::new(
                SonarrClient::new(c).context("Failed to create Sonarr client")?,
            ) as Arc<dyn SeriesLibrary>),
            None => None,
        },
        radarr: match &config.radarr {
            Some(c) => Some(Arc::new(
                RadarrClient::new(c).context("Failed to create Radarr client")?,
            ) as Arc<dyn MovieLibrary>),
            None => None,
        },
        download_client: match &config.qbittorrent {
            Some(qb) => Some(Arc::new(
                QBittorrentClient::new(qb.clone()).context("Failed to create qBittorrent client")?,
            ) as Arc<dyn DownloadClient>),
            None => None,
        },
    };

    let statuses = check_services(&services).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&statuses).context("Failed to encode status")?
        );
    } else {
        for status in &statuses {
            println!("{:<14} {}", status.service, describe_status(status));
        }
    }

    let unreachable = statuses
        .iter()
        .filter(|s| s.configured && !s.accessible)
        .count();
    if unreachable > 0 {
        bail!("{} configured service(s) unreachable", unreachable);
    }
    Ok(())
}

fn describe_status(status: &ServiceStatus) -> String {
    match (status.configured, status.accessible, &status.error) {
        (false, _, _) => "not configured".to_string(),
        (true, true, _) => "ready".to_string(),
        (true, false, Some(e)) => format!("unreachable: {}", e),
        (true, false, None) => "unreachable".to_string(),
    }
}

async fn build_context(config: &Config, kind: LibraryKind, services: &Services) -> Result<RunContext> {
    let mut ctx = RunContext::new(
        &config.sync,
        Arc::clone(&services.tracking),
        Arc::clone(&services.release_index),
    )
    .with_strategy(Arc::clone(&services.strategy));

    match &config.qbittorrent {
        Some(qb) if !config.sync.dry_run => {
            let client = QBittorrentClient::new(qb.clone())
                .context("Failed to create qBittorrent client")?;
            client
                .login()
                .await
                .context("Failed to log in to qBittorrent")?;
            info!("Connected to qBittorrent at {}", qb.url);

            let resolvers = TrackerResolvers::with_defaults(Duration::from_secs(qb.timeout_secs as u64))
                .context("Failed to create tracker resolvers")?;
            ctx = ctx.with_dispatcher(Dispatcher::new(
                Arc::new(client),
                resolvers,
                qb.category_for(kind),
            ));
        }
        Some(_) => info!("Dry run, torrents will not be added"),
        None => info!("No download client configured, mismatches will only be reported"),
    }

    if let Some(discord) = &config.discord {
        ctx = ctx.with_notifier(Arc::new(
            DiscordNotifier::new(discord).context("Failed to create Discord notifier")?,
        ));
    }

    Ok(ctx)
}

async fn run_sonarr(
    config: &Config,
    services: &Services,
    ctx: &mut RunContext,
) -> Result<SyncRunSummary> {
    let sonarr_config = config.sonarr.as_ref().context("[sonarr] is not configured")?;
    let sonarr = SonarrClient::new(sonarr_config).context("Failed to create Sonarr client")?;

    // Radarr is only needed to skip specials that already exist as movies.
    let radarr = match &config.radarr {
        Some(radarr_config) if config.sync.ignore_movies_in_movie_library => {
            match RadarrClient::new(radarr_config) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Radarr unavailable, not skipping specials found there: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let summary = run_series_sync(
        ctx,
        &services.mappings,
        &sonarr,
        radarr.as_ref().map(|r| r as &dyn MovieLibrary),
    )
    .await
    .context("Sonarr sync failed")?;
    Ok(summary)
}

async fn run_radarr(
    config: &Config,
    services: &Services,
    ctx: &mut RunContext,
) -> Result<SyncRunSummary> {
    let radarr_config = config.radarr.as_ref().context("[radarr] is not configured")?;
    let radarr = RadarrClient::new(radarr_config).context("Failed to create Radarr client")?;

    let summary = run_movie_sync(ctx, &services.mappings, &radarr)
        .await
        .context("Radarr sync failed")?;
    Ok(summary)
}

fn log_summary(summary: &SyncRunSummary) {
    info!(
        library = %summary.library,
        processed = summary.items_processed,
        matched = summary.matched,
        mismatched = summary.mismatched,
        skipped = summary.skipped,
        failed = summary.failed,
        torrents_added = summary.torrents_added,
        torrents_would_add = summary.torrents_would_add,
        cap_reached = summary.cap_reached,
        "Sync finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use relsync_core::load_config_from_str;

    #[test]
    fn test_all_runs_configured_libraries() {
        let config = load_config_from_str(
            "[radarr]\nurl = \"http://127.0.0.1:7878\"\napi_key = \"abc\"\n",
        )
        .unwrap();

        assert_eq!(
            libraries_to_run(&Command::All, &config).unwrap(),
            vec![LibraryKind::Radarr]
        );
        assert_eq!(
            libraries_to_run(&Command::Sonarr, &config).unwrap(),
            vec![LibraryKind::Sonarr]
        );
        assert!(libraries_to_run(&Command::All, &Config::default()).is_err());
    }

    #[test]
    fn test_config_validate_checks_library_credentials() {
        let config = load_config_from_str(
            "[sonarr]\nurl = \"http://127.0.0.1:8989\"\napi_key = \"\"\n",
        )
        .unwrap();
        assert!(config_validate(&config).is_err());

        let config = load_config_from_str(
            "[sonarr]\nurl = \"http://127.0.0.1:8989\"\napi_key = \"abc\"\n",
        )
        .unwrap();
        assert!(config_validate(&config).is_ok());
        assert!(config_validate(&Config::default()).is_err());
    }

    #[test]
    fn test_describe_status() {
        let status = ServiceStatus {
            service: "sonarr",
            configured: true,
            accessible: false,
            error: Some("HTTP request failed".to_string()),
        };
        assert_eq!(describe_status(&status), "unreachable: HTTP request failed");
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::try_parse_from(["relsync", "config-validate"]).unwrap();
        assert!(matches!(cli.command, Command::ConfigValidate));
        let cli = Cli::try_parse_from(["relsync", "--json-summary", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status));
        assert!(cli.json_summary);
    }
}
