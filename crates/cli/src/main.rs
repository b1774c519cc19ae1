mod args;
mod prompt;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use filmsort_core::{
    load_config, metrics, FilmOrganizer, FilmStatus, MetadataCatalog, PlexNotifier, RunReport,
    SanitizedConfig, TmdbClient,
};

use args::Args;
use prompt::TerminalReviewer;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt = if args.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(fmt).init();
}

async fn run(args: Args) -> Result<()> {
    info!("Loading configuration from {:?}", args.config);
    let mut config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    args.apply(&mut config);

    let catalog: Option<Arc<dyn MetadataCatalog>> = match &config.tmdb {
        Some(tmdb) => {
            info!("Using TMDB for lookups");
            Some(Arc::new(
                TmdbClient::new(tmdb).context("Failed to create TMDB client")?,
            ))
        }
        None => {
            info!("No catalog configured, naming films from their file names");
            None
        }
    };

    let mut organizer =
        FilmOrganizer::new(config.clone(), catalog).context("Configuration validation failed")?;

    if let Some(plex) = &config.plex {
        let notifier = PlexNotifier::new(plex).context("Failed to create Plex notifier")?;
        organizer = organizer.with_notifier(Arc::new(notifier));
    }

    if config.lookup.interactive {
        if std::io::stderr().is_terminal() {
            organizer = organizer.with_reviewer(Arc::new(TerminalReviewer));
        } else {
            warn!("Interactive mode needs a terminal, accepting computed results");
        }
    }

    let control = organizer.control();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current film");
            control.abort();
        }
    });

    let report = organizer.run().await.context("Run failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        print_report(&report);
    }

    if config.run.debug {
        let sanitized = SanitizedConfig::from(&config);
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&sanitized).context("Failed to encode config")?
        );
        eprintln!("{}", metrics::gather_metrics());
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    let prefix = if report.test_mode { "[test] " } else { "" };
    for outcome in &report.outcomes {
        let status = outcome.status.as_str();
        let source = outcome.path.display();
        let placed = matches!(outcome.status, FilmStatus::Moved | FilmStatus::Copied);
        match (&outcome.destination, &outcome.reason) {
            (Some(dest), _) if placed => {
                println!("{}{:<8} {} -> {}", prefix, status, source, dest.display())
            }
            (_, Some(reason)) => println!("{}{:<8} {}: {}", prefix, status, source, reason),
            _ => println!("{}{:<8} {}", prefix, status, source),
        }
    }
    if report.aborted {
        println!("Run aborted");
    }
    println!("{}{}", prefix, report.summary());
}
