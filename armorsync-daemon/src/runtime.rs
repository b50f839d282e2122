use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use armorsync_core::{preflight, Config};
use armorsync_sync::{pipeline, SyncSummary};

use crate::error::{io_err, DaemonError};
use crate::logging::init_tracing;

/// Counters returned when the poll loop stops.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub last_summary: Option<SyncSummary>,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: Config) -> Result<RunStats, DaemonError> {
    init_tracing(false);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon until ctrl-c.
pub async fn run(config: Config) -> Result<RunStats, DaemonError> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(16);

    // Subscribe before spawning: a stop sent before the task is first polled
    // must still reach it.
    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut stop_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = stop_rx.recv() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => tracing::info!("received ctrl-c, shutting down daemon"),
                        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
                    }
                    let _ = shutdown.send(());
                }
            }
        })
    };

    let result = run_with_shutdown(config, shutdown_rx).await;
    let _ = shutdown_tx.send(());
    signal_handle.await.map_err(|err| DaemonError::Join {
        task: "signal_handler",
        message: err.to_string(),
    })?;
    result
}

/// Run preflight, then one sync pass per poll interval until `shutdown_rx`
/// fires. The first pass starts immediately.
///
/// A failed pass (e.g. the profiles directory vanished) is logged and the
/// loop keeps polling; only preflight failures end the run with an error.
pub async fn run_with_shutdown(
    config: Config,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<RunStats, DaemonError> {
    let checked = preflight(&config)?;
    if checked.target_created {
        tracing::info!(target_dir = %config.target_dir.display(), "target directory created");
    }
    tracing::info!(
        profiles_dir = %config.profiles_dir.display(),
        target_dir = %config.target_dir.display(),
        poll_secs = config.poll_interval_secs,
        strategy = %config.link_strategy,
        "daemon started",
    );

    let config = Arc::new(config);
    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stats = RunStats::default();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                stats.passes += 1;
                match run_pass(config.clone()).await {
                    Ok(summary) => {
                        log_summary(&summary);
                        stats.last_summary = Some(summary);
                    }
                    Err(DaemonError::Sync(err)) => {
                        stats.failed_passes += 1;
                        tracing::error!(error = %err, "sync pass failed");
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    }

    tracing::info!(passes = stats.passes, "daemon stopped");
    Ok(stats)
}

async fn run_pass(config: Arc<Config>) -> Result<SyncSummary, DaemonError> {
    let report = tokio::task::spawn_blocking(move || pipeline::sync_profiles(&config, false))
        .await
        .map_err(|err| DaemonError::Join {
            task: "sync_pass",
            message: err.to_string(),
        })??;

    for (name, err) in report.failures() {
        tracing::warn!(profile = %name, error = %err, "profile sync failed");
    }
    Ok(report.summary())
}

fn log_summary(summary: &SyncSummary) {
    if summary.linked + summary.copied + summary.failed == 0 {
        tracing::debug!(
            profiles = summary.profiles,
            duration_ms = summary.duration_ms,
            "sync pass: nothing to do",
        );
        return;
    }
    tracing::info!(
        profiles = summary.profiles,
        linked = summary.linked,
        copied = summary.copied,
        unchanged = summary.unchanged,
        failed = summary.failed,
        duration_ms = summary.duration_ms,
        "sync pass completed",
    );
}
