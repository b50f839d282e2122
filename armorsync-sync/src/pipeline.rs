//! Shared multi-profile sync pass used by the CLI and the daemon.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use armorsync_core::{list_profiles, Config, ProfileName};

use crate::error::SyncError;
use crate::inspect::{inspect, SyncState};
use crate::materialize::{Materializer, SyncOutcome};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What happened (or, in dry-run mode, would happen) to one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    Synced(SyncOutcome),
    /// Dry-run: current state, nothing written.
    Planned(SyncState),
}

/// Result for a single profile. A failure here never aborts the pass.
#[derive(Debug)]
pub struct ProfileResult {
    pub name: ProfileName,
    pub source: PathBuf,
    pub action: Result<ProfileAction, SyncError>,
}

/// Outcome of one pass over the profiles directory.
#[derive(Debug)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub dry_run: bool,
    pub profiles: Vec<ProfileResult>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = (&ProfileName, &SyncError)> {
        self.profiles
            .iter()
            .filter_map(|p| p.action.as_ref().err().map(|e| (&p.name, e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    fn count(&self, pred: impl Fn(&ProfileAction) -> bool) -> usize {
        self.profiles
            .iter()
            .filter(|p| p.action.as_ref().map(&pred).unwrap_or(false))
            .count()
    }

    /// Serializable summary with one entry per profile.
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            started_at: self.started_at,
            duration_ms: self.duration.as_millis(),
            dry_run: self.dry_run,
            profiles: self.profiles.len(),
            linked: self.count(|a| matches!(a, ProfileAction::Synced(SyncOutcome::HardLinked { .. }))),
            copied: self.count(|a| matches!(a, ProfileAction::Synced(SyncOutcome::Copied { .. }))),
            unchanged: self.count(|a| match a {
                ProfileAction::Synced(outcome) => !outcome.changed(),
                ProfileAction::Planned(state) => !state.needs_sync(),
            }),
            pending: self.count(|a| matches!(a, ProfileAction::Planned(state) if state.needs_sync())),
            failed: self.failures().count(),
            entries: self.profiles.iter().map(SummaryEntry::from).collect(),
        }
    }
}

/// Flat, serializable view of a [`SyncReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub dry_run: bool,
    pub profiles: usize,
    pub linked: usize,
    pub copied: usize,
    pub unchanged: usize,
    pub pending: usize,
    pub failed: usize,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ProfileResult> for SummaryEntry {
    fn from(result: &ProfileResult) -> Self {
        let (status, destination, error) = match &result.action {
            Ok(ProfileAction::Synced(outcome)) => {
                let status = match outcome {
                    SyncOutcome::AlreadyPresent { .. } => "already_present",
                    SyncOutcome::HardLinked { .. } => "hard_linked",
                    SyncOutcome::Copied { .. } => "copied",
                };
                (status.to_string(), Some(outcome.path().to_path_buf()), None)
            }
            Ok(ProfileAction::Planned(state)) => (state.to_string(), None, None),
            Err(err) => ("failed".to_string(), None, Some(err.to_string())),
        };
        SummaryEntry {
            name: result.name.0.clone(),
            status,
            destination,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// sync_profiles
// ---------------------------------------------------------------------------

/// Mirror every profile of `config.profiles_dir` into `config.target_dir`.
///
/// Fails only when the profiles directory cannot be listed; per-profile
/// failures are recorded in the report. With `dry_run`, each profile is
/// inspected instead and nothing is written.
pub fn sync_profiles(config: &Config, dry_run: bool) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();
    let started = Instant::now();

    let names = list_profiles(&config.profiles_dir)?;
    let materializer = Materializer::with_strategy(config.link_strategy);

    let profiles = names
        .into_iter()
        .map(|name| {
            let source = name.join_onto(&config.profiles_dir);
            let action = if dry_run {
                inspect(&source, &config.target_dir).map(ProfileAction::Planned)
            } else {
                materializer
                    .ensure_synced(&source, &config.target_dir)
                    .map(ProfileAction::Synced)
            };
            if let Err(err) = &action {
                tracing::warn!("profile '{}' failed: {}", name, err);
            }
            ProfileResult {
                name,
                source,
                action,
            }
        })
        .collect();

    Ok(SyncReport {
        started_at,
        duration: started.elapsed(),
        dry_run,
        profiles,
    })
}
