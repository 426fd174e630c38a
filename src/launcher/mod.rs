//! Launching the coding assistant while its models are validated in the background.
//!
//! The child starts immediately. A validation task checks the configured
//! identifiers against a fresh catalog and a wait task owns the child; the
//! coordinator observes whichever finishes first. A validation failure,
//! including a catalog that could not be fetched, kills the child. Only a
//! validation that outlives its timeout lets the session continue
//! unvalidated. Once the child has exited, a late validation result is
//! ignored.

pub mod env;
pub mod process;

pub use env::{launch_env, LaunchEnv};
pub use process::{LaunchCommand, ProcessRunner, RunningProcess, TokioProcessRunner};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::catalog::{CatalogFetcher, CatalogSource};
use crate::error::{ClauderockError, Result};
use crate::usage::{SessionRecord, UsageSink};
use crate::util::timeout::with_timeout;

/// Default bound on background validation.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Checks that identifiers exist upstream.
///
/// Returns [`ClauderockError::Validation`] when an identifier is missing and
/// any other error when the check itself failed. Both stop the session.
#[async_trait]
pub trait IdentifierValidator: Send + Sync {
    async fn validate(&self, identifiers: &[String]) -> Result<()>;
}

/// Validates identifiers by membership in a freshly fetched catalog.
pub struct CatalogValidator {
    fetcher: Arc<dyn CatalogFetcher>,
    source: CatalogSource,
}

impl CatalogValidator {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>, source: CatalogSource) -> Self {
        Self { fetcher, source }
    }
}

#[async_trait]
impl IdentifierValidator for CatalogValidator {
    async fn validate(&self, identifiers: &[String]) -> Result<()> {
        let catalog = match self.fetcher.fetch(&self.source).await {
            Ok(catalog) => catalog,
            // No listing endpoint: nothing to validate against.
            Err(err) if err.is_endpoint_missing() => {
                tracing::debug!(fetcher = self.fetcher.name(), "model listing endpoint missing; skipping validation");
                return Ok(());
            }
            Err(err) => {
                return Err(ClauderockError::catalog_unavailable(format!(
                    "failed to fetch models for validation: {err}"
                )))
            }
        };
        let missing = catalog.missing(identifiers);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClauderockError::validation(missing))
        }
    }
}

/// Everything needed for one launch.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub profile_name: String,
    pub command: LaunchCommand,
    /// Model identifiers injected into the child's environment.
    pub identifiers: Vec<String>,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The child exited on its own.
    ChildExited { code: i32 },
    /// Validation failed, or the catalog could not be fetched, and the child was killed.
    ValidationKilled {
        error: ClauderockError,
        code: Option<i32>,
    },
}

/// A finished session.
#[derive(Debug)]
pub struct SessionEnd {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
}

impl SessionEnd {
    /// Child exit code if it exited on its own, the validation error otherwise.
    pub fn into_result(self) -> Result<i32> {
        match self.outcome {
            SessionOutcome::ChildExited { code } => Ok(code),
            SessionOutcome::ValidationKilled { error, .. } => Err(error),
        }
    }

    fn record(&self, plan: &LaunchPlan) -> SessionRecord {
        let (exit_code, ended_by) = match &self.outcome {
            SessionOutcome::ChildExited { code } => (Some(*code), "exited"),
            SessionOutcome::ValidationKilled { code, .. } => (*code, "validation-killed"),
        };
        SessionRecord::new(
            &plan.profile_name,
            plan.identifiers.clone(),
            self.started_at,
            self.ended_at,
            exit_code,
            ended_by,
        )
    }
}

struct ExitReport {
    status: Result<i32>,
    killed: bool,
}

/// Runs a child process and validates its identifiers concurrently.
pub struct LaunchCoordinator {
    runner: Arc<dyn ProcessRunner>,
    validator: Option<Arc<dyn IdentifierValidator>>,
    usage: Option<Arc<dyn UsageSink>>,
    validation_timeout: Duration,
}

impl LaunchCoordinator {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            validator: None,
            usage: None,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn IdentifierValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage = Some(sink);
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Run the plan to completion and return the child's exit code.
    ///
    /// The session is recorded with the usage sink either way.
    pub async fn launch(&self, plan: &LaunchPlan) -> Result<i32> {
        let end = self.run_session(plan).await?;
        if let Some(sink) = &self.usage {
            if let Err(err) = sink.record_session(&end.record(plan)) {
                tracing::warn!(error = %err, "failed to record usage");
            }
        }
        end.into_result()
    }

    /// Spawn, race validation against exit, and report how the session ended.
    pub async fn run_session(&self, plan: &LaunchPlan) -> Result<SessionEnd> {
        let mut process = self.runner.spawn(&plan.command).await?;
        let started_at = Utc::now();
        tracing::info!(
            program = %plan.command.program.display(),
            profile = %plan.profile_name,
            "launched"
        );

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let mut wait_task = tokio::spawn(async move {
            tokio::select! {
                status = process.wait() => ExitReport { status, killed: false },
                Ok(()) = kill_rx => {
                    if let Err(err) = process.kill().await {
                        tracing::warn!(error = %err, "failed to kill child");
                    }
                    ExitReport { status: process.wait().await, killed: true }
                }
            }
        });

        let Some(validator) = self.validator.clone() else {
            let report = join_exit(wait_task.await)?;
            return finish(started_at, report, None);
        };

        let identifiers = plan.identifiers.clone();
        let timeout = self.validation_timeout;
        let mut validation_task = tokio::spawn(async move {
            with_timeout(timeout, validator.validate(&identifiers)).await
        });

        tokio::select! {
            joined = &mut wait_task => {
                validation_task.abort();
                tracing::debug!("child exited before validation finished; discarding result");
                finish(started_at, join_exit(joined)?, None)
            }
            verdict = &mut validation_task => {
                match flatten_validation(verdict) {
                    Err(ClauderockError::Timeout(ms)) => {
                        tracing::warn!(timeout_ms = ms, "model validation timed out; continuing unvalidated");
                        finish(started_at, join_exit(wait_task.await)?, None)
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "model validation failed; stopping child");
                        // Fails only if the wait task already finished; then there is nothing to kill.
                        let _ = kill_tx.send(());
                        let report = join_exit(wait_task.await)?;
                        finish(started_at, report, Some(error))
                    }
                    Ok(()) => {
                        tracing::debug!("models validated");
                        finish(started_at, join_exit(wait_task.await)?, None)
                    }
                }
            }
        }
    }
}

fn flatten_validation(
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    joined.map_err(|e| ClauderockError::Launch(format!("validation task failed: {e}")))?
}

fn join_exit(joined: std::result::Result<ExitReport, tokio::task::JoinError>) -> Result<ExitReport> {
    joined.map_err(|e| ClauderockError::Launch(format!("wait task failed: {e}")))
}

fn finish(
    started_at: DateTime<Utc>,
    report: ExitReport,
    validation_error: Option<ClauderockError>,
) -> Result<SessionEnd> {
    let ended_at = Utc::now();
    let outcome = match (validation_error, report.killed) {
        (Some(error), true) => SessionOutcome::ValidationKilled {
            error,
            code: report.status.ok(),
        },
        // The kill request lost the race against a normal exit.
        _ => SessionOutcome::ChildExited {
            code: report.status?,
        },
    };
    Ok(SessionEnd {
        started_at,
        ended_at,
        outcome,
    })
}

/// Keep Ctrl-C from terminating the host while the child handles it.
///
/// Abort the returned handle once the child has exited.
pub fn ignore_interrupts() -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::debug!("interrupt received; forwarded to child only");
        }
    })
}
