//! SecuPrison terminal front end
//!
//! Plays runs through the prison layers, prints each step as it happens
//! and writes the JSON/CSV exports on request.

use clap::Parser;
use secuprison_core::export::write_export;
use secuprison_core::{
    LayerCatalog, PlaybackOutcome, PlayerConfig, PlayerHandle, RunPlayer, SimError,
    StartOutcome, Step, StepNotice,
};
use secuprison_env::{PrisonContext, TokioContext};
use secuprison_sim::SimContext;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// SecuPrison - OSI-layer vulnerabilities as a prison break
#[derive(Parser, Debug)]
#[command(name = "secuprison")]
#[command(about = "Walk sampled vulnerabilities through the seven prison layers", long_about = None)]
struct Args {
    /// Master seed for a deterministic session (0 = real time, OS entropy)
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Number of runs to play
    #[arg(short, long, default_value = "1")]
    runs: usize,

    /// Delay between steps in milliseconds (lead-in is a third of it)
    #[arg(long)]
    step_ms: Option<u64>,

    /// Custom layer catalog (JSON array of layers)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Stop each run after this many layers have been shown (at least 1)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    stop_after: Option<usize>,

    /// Show the MITRE ATT&CK panel for the latest run
    #[arg(long)]
    mitre: bool,

    /// Write the latest run as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Write every logged run as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Write the raw session log as JSON
    #[arg(long)]
    export_log: Option<PathBuf>,

    /// JSON summary on stdout instead of a human report
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary<'a> {
    seed: u64,
    total_runs: usize,
    completed: usize,
    cancelled: usize,
    latest_run: Option<&'a secuprison_core::Run>,
}

fn load_catalog(path: Option<&Path>) -> Result<LayerCatalog, SimError> {
    match path {
        Some(path) => LayerCatalog::from_json(&std::fs::read_to_string(path)?),
        None => Ok(LayerCatalog::osi()),
    }
}

fn player_config(step_ms: Option<u64>) -> PlayerConfig {
    match step_ms {
        Some(ms) => PlayerConfig::default()
            .with_step_delay(Duration::from_millis(ms))
            .with_start_delay(Duration::from_millis(ms / 3)),
        None => PlayerConfig::default(),
    }
}

/// Plays one run by hand, stopping it after `limit` layers.
///
/// Drives `advance_run` directly instead of `PlayerHandle::play` so the
/// cancellation point is exact regardless of the clock.
async fn play_partial<C: PrisonContext>(
    handle: &PlayerHandle<C>,
    limit: usize,
    notices: &UnboundedSender<StepNotice>,
) -> Result<PlaybackOutcome, SimError> {
    let (run, first) = match handle.start()? {
        StartOutcome::Started { run, first } => (run, first),
        StartOutcome::AlreadyRunning => return Ok(PlaybackOutcome::AlreadyRunning),
    };
    let (ctx, config) = handle.with(|p| (Arc::clone(p.context()), p.config().clone()));

    let _ = notices.send(first);
    let mut shown = 1;
    let mut delay = config.start_delay;

    while shown < limit {
        ctx.sleep(delay).await;
        delay = config.step_delay;
        match handle.with(|p| p.advance_run(run.id)) {
            Step::Moved(notice) => {
                let _ = notices.send(notice);
                shown += 1;
            }
            Step::Finished => return Ok(PlaybackOutcome::Completed),
            Step::Halted => return Ok(PlaybackOutcome::Cancelled),
        }
    }

    handle.stop();
    Ok(PlaybackOutcome::Cancelled)
}

/// Writes one export, degrading "nothing to export" to a warning.
fn export_to(path: Option<&Path>, what: &str, render: impl FnOnce() -> Result<String, SimError>) -> bool {
    let Some(path) = path else {
        return true;
    };
    match render().and_then(|contents| write_export(path, &contents)) {
        Ok(()) => {
            info!("Exported {} to {}", what, path.display());
            true
        }
        Err(e) if e.is_user_facing() => {
            warn!("{}", e);
            true
        }
        Err(e) => {
            error!("Failed to export {}: {}", what, e);
            false
        }
    }
}

async fn run_session<C: PrisonContext>(
    ctx: Arc<C>,
    catalog: LayerCatalog,
    config: PlayerConfig,
    args: &Args,
) -> i32 {
    let handle = PlayerHandle::new(RunPlayer::new(ctx, Arc::new(catalog), config));
    let show_mitre = args.mitre;
    let quiet = args.json;

    let (tx, mut rx) = mpsc::unbounded_channel::<StepNotice>();
    let printer = tokio::spawn(async move {
        while let Some(notice) = rx.recv().await {
            if quiet {
                continue;
            }
            info!(
                "[{}/{}] {:<12} {:<22} {}",
                notice.index + 1,
                notice.total,
                notice.layer,
                notice.vulnerability,
                notice.checklist_type
            );
            if show_mitre {
                if let Some(technique) = secuprison_core::mitre::lookup(&notice.vulnerability) {
                    info!("        MITRE {}", technique);
                }
            }
        }
    });

    let mut completed = 0;
    let mut cancelled = 0;
    let mut exit_code = 0;

    for _ in 0..args.runs {
        let outcome = match args.stop_after {
            Some(limit) => play_partial(&handle, limit, &tx).await,
            None => handle.run_once(Some(&tx)).await,
        };
        match outcome {
            Ok(PlaybackOutcome::Completed) => completed += 1,
            Ok(PlaybackOutcome::Cancelled) => cancelled += 1,
            Ok(PlaybackOutcome::AlreadyRunning) => warn!("A run is already playing"),
            Err(e) => {
                error!("Cannot start run: {}", e);
                exit_code = 1;
                break;
            }
        }
    }

    drop(tx);
    let _ = printer.await;

    handle.with(|player| {
        if args.json {
            let summary = SessionSummary {
                seed: player.context().seed(),
                total_runs: player.total_runs(),
                completed,
                cancelled,
                latest_run: player.current_run().map(|r| r.as_ref()),
            };
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to render summary: {}", e);
                    exit_code = 1;
                }
            }
        } else {
            info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            info!(
                "Total runs: {} ({} completed, {} stopped early)",
                player.total_runs(),
                completed,
                cancelled
            );
            match player.current_run() {
                Some(run) => {
                    info!("Latest run {}:", run.id);
                    for event in &run.events {
                        info!("  {} ({}): {}", event.layer, event.analogy, event.vulnerability);
                        for step in &event.checklist {
                            info!("      - {}", step);
                        }
                    }
                }
                None => info!("No run yet."),
            }
        }

        if args.mitre && !args.json {
            info!("MITRE ATT&CK:");
            for layer in player.catalog().all_layers() {
                match player.mitre_for_layer(&layer.name) {
                    Ok(Some(technique)) => info!("  {:<12} {}", layer.name, technique),
                    Ok(None) => info!("  {:<12} no MITRE mapping", layer.name),
                    Err(e) => info!("  {:<12} {}", layer.name, e),
                }
            }
        }

        let exported = [
            export_to(args.export_json.as_deref(), "latest run", || player.export_current_json()),
            export_to(args.export_csv.as_deref(), "all runs", || player.export_log_csv()),
            export_to(args.export_log.as_deref(), "raw log", || player.export_log_json()),
        ];
        if exported.contains(&false) {
            exit_code = 1;
        }
    });

    exit_code
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = match load_catalog(args.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Invalid catalog: {}", e);
            std::process::exit(1);
        }
    };
    let config = player_config(args.step_ms);

    if !args.json {
        info!("SecuPrison v0.1.0 ({} layers)", catalog.len());
    }

    let code = if args.seed == 0 {
        run_session(TokioContext::shared(), catalog, config, &args).await
    } else {
        info!("Deterministic session (seed={})", args.seed);
        run_session(SimContext::shared(args.seed), catalog, config, &args).await
    };

    // Exit with proper code for CI
    if code != 0 {
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_after_rejects_zero() {
        assert!(Args::try_parse_from(["secuprison", "--stop-after", "0"]).is_err());

        let args = Args::try_parse_from(["secuprison", "--stop-after", "3"]).unwrap();
        assert_eq!(args.stop_after, Some(3));
        assert_eq!(Args::try_parse_from(["secuprison"]).unwrap().stop_after, None);
    }
}
