//! Race between background validation and the child's exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use clauderock::error::{EXIT_CONFIG, EXIT_UNAVAILABLE};
use clauderock::launcher::CatalogValidator;
use clauderock::prelude::*;

const SONNET: &str = "global.anthropic.claude-sonnet-4-5-20250929-v1:0";
const KILLED_CODE: i32 = 137;

/// A child that exits after `runtime`, or runs until killed when `None`.
struct FakeProcess {
    runtime: Option<Duration>,
    code: i32,
    kill: Arc<Notify>,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl RunningProcess for FakeProcess {
    async fn wait(&mut self) -> Result<i32> {
        if self.killed.load(Ordering::SeqCst) {
            return Ok(KILLED_CODE);
        }
        match self.runtime {
            Some(runtime) => tokio::select! {
                _ = tokio::time::sleep(runtime) => Ok(self.code),
                _ = self.kill.notified() => Ok(KILLED_CODE),
            },
            None => {
                self.kill.notified().await;
                Ok(KILLED_CODE)
            }
        }
    }

    async fn kill(&mut self) -> Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        self.kill.notify_one();
        Ok(())
    }
}

struct FakeRunner {
    runtime: Option<Duration>,
    code: i32,
    killed: Arc<AtomicBool>,
}

impl FakeRunner {
    fn new(runtime: Option<Duration>, code: i32) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            code,
            killed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn spawn(&self, _command: &LaunchCommand) -> Result<Box<dyn RunningProcess>> {
        Ok(Box::new(FakeProcess {
            runtime: self.runtime,
            code: self.code,
            kill: Arc::new(Notify::new()),
            killed: self.killed.clone(),
        }))
    }
}

struct FailingRunner;

#[async_trait]
impl ProcessRunner for FailingRunner {
    async fn spawn(&self, _command: &LaunchCommand) -> Result<Box<dyn RunningProcess>> {
        Err(ClauderockError::Launch("claude binary not found in PATH".into()))
    }
}

enum Verdict {
    Pass,
    Invalid,
    Unavailable,
}

struct FakeValidator {
    delay: Duration,
    verdict: Verdict,
}

#[async_trait]
impl IdentifierValidator for FakeValidator {
    async fn validate(&self, identifiers: &[String]) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        match self.verdict {
            Verdict::Pass => Ok(()),
            Verdict::Invalid => Err(ClauderockError::validation(identifiers.to_vec())),
            Verdict::Unavailable => Err(ClauderockError::Authentication("expired token".into())),
        }
    }
}

fn validator(delay_ms: u64, verdict: Verdict) -> Arc<FakeValidator> {
    Arc::new(FakeValidator {
        delay: Duration::from_millis(delay_ms),
        verdict,
    })
}

#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<SessionRecord>>,
    fail: bool,
}

impl UsageSink for MemorySink {
    fn record_session(&self, record: &SessionRecord) -> Result<()> {
        if self.fail {
            return Err(ClauderockError::Configuration("disk full".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn plan() -> LaunchPlan {
    LaunchPlan {
        profile_name: "work".into(),
        command: LaunchCommand {
            program: "claude".into(),
            ..LaunchCommand::default()
        },
        identifiers: vec![SONNET.to_string()],
    }
}

#[tokio::test(start_paused = true)]
async fn child_exit_before_validation_wins() {
    let runner = FakeRunner::new(Some(Duration::from_millis(50)), 0);
    let sink = Arc::new(MemorySink::default());
    let coordinator = LaunchCoordinator::new(runner.clone())
        .with_validator(validator(10_000, Verdict::Invalid))
        .with_usage_sink(sink.clone());

    let code = coordinator.launch(&plan()).await.unwrap();

    assert_eq!(code, 0);
    assert!(!runner.was_killed());
    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ended_by, "exited");
    assert_eq!(records[0].exit_code, Some(0));
}

#[tokio::test(start_paused = true)]
async fn failed_validation_kills_running_child() {
    let runner = FakeRunner::new(None, 0);
    let sink = Arc::new(MemorySink::default());
    let coordinator = LaunchCoordinator::new(runner.clone())
        .with_validator(validator(10, Verdict::Invalid))
        .with_usage_sink(sink.clone());

    let err = coordinator.launch(&plan()).await.unwrap_err();

    assert!(runner.was_killed());
    match &err {
        ClauderockError::Validation { invalid, .. } => assert_eq!(invalid, &vec![SONNET.to_string()]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), EXIT_CONFIG);
    assert!(err.to_string().contains("clauderock manage models list"), "{err}");

    let records = sink.records.lock().unwrap();
    assert_eq!(records[0].ended_by, "validation-killed");
    assert_eq!(records[0].exit_code, Some(KILLED_CODE));
}

#[tokio::test(start_paused = true)]
async fn passing_validation_waits_for_child_exit_code() {
    let runner = FakeRunner::new(Some(Duration::from_secs(5)), 3);
    let coordinator =
        LaunchCoordinator::new(runner.clone()).with_validator(validator(10, Verdict::Pass));

    assert_eq!(coordinator.launch(&plan()).await.unwrap(), 3);
    assert!(!runner.was_killed());
}

#[tokio::test(start_paused = true)]
async fn unavailable_catalog_stops_the_session() {
    let runner = FakeRunner::new(None, 0);
    let sink = Arc::new(MemorySink::default());
    let coordinator = LaunchCoordinator::new(runner.clone())
        .with_validator(validator(10, Verdict::Unavailable))
        .with_usage_sink(sink.clone());

    let err = coordinator.launch(&plan()).await.unwrap_err();

    assert!(runner.was_killed());
    assert!(err.to_string().contains("expired token"), "{err}");
    assert_eq!(sink.records.lock().unwrap()[0].ended_by, "validation-killed");
}

#[tokio::test(start_paused = true)]
async fn failed_catalog_fetch_stops_the_session() {
    let runner = FakeRunner::new(None, 0);
    let validator = CatalogValidator::new(
        Arc::new(StaticCatalog::failing("expired token")),
        CatalogSource::new("default", "us-east-1"),
    );
    let coordinator = LaunchCoordinator::new(runner.clone()).with_validator(Arc::new(validator));

    let err = coordinator.launch(&plan()).await.unwrap_err();

    assert!(runner.was_killed());
    assert!(matches!(err, ClauderockError::CatalogUnavailable(_)));
    assert_eq!(err.exit_code(), EXIT_UNAVAILABLE);
}

#[tokio::test(start_paused = true)]
async fn slow_catalog_times_out_without_killing() {
    let runner = FakeRunner::new(Some(Duration::from_secs(60)), 0);
    let catalog = StaticCatalog::new(Catalog::new(Vec::<String>::new()))
        .with_delay(Duration::from_secs(3600));
    let validator = CatalogValidator::new(Arc::new(catalog), CatalogSource::default());
    let coordinator = LaunchCoordinator::new(runner.clone())
        .with_validator(Arc::new(validator))
        .with_validation_timeout(Duration::from_secs(15));

    assert_eq!(coordinator.launch(&plan()).await.unwrap(), 0);
    assert!(!runner.was_killed());
}

#[tokio::test(start_paused = true)]
async fn simultaneous_exit_and_failure_never_kills_an_exited_child() {
    // Both tasks finish at the same instant; whichever branch is observed,
    // an exit reported as such must not have been killed.
    for _ in 0..32 {
        let runner = FakeRunner::new(Some(Duration::from_millis(10)), 7);
        let coordinator = LaunchCoordinator::new(runner.clone())
            .with_validator(validator(10, Verdict::Invalid));

        let end = coordinator.run_session(&plan()).await.unwrap();

        match end.outcome {
            SessionOutcome::ChildExited { code } => {
                assert_eq!(code, 7);
                assert!(!runner.was_killed());
            }
            SessionOutcome::ValidationKilled { code, .. } => {
                assert!(runner.was_killed());
                assert_eq!(code, Some(KILLED_CODE));
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn hung_validation_times_out_without_killing() {
    let runner = FakeRunner::new(Some(Duration::from_secs(60)), 0);
    let coordinator = LaunchCoordinator::new(runner.clone())
        .with_validator(validator(3_600_000, Verdict::Invalid))
        .with_validation_timeout(Duration::from_secs(15));

    let end = coordinator.run_session(&plan()).await.unwrap();

    assert!(matches!(end.outcome, SessionOutcome::ChildExited { code: 0 }));
    assert!(!runner.was_killed());
}

#[tokio::test(start_paused = true)]
async fn usage_sink_failure_does_not_fail_launch() {
    let runner = FakeRunner::new(Some(Duration::from_millis(5)), 0);
    let sink = Arc::new(MemorySink {
        fail: true,
        ..MemorySink::default()
    });
    let coordinator = LaunchCoordinator::new(runner).with_usage_sink(sink);

    assert_eq!(coordinator.launch(&plan()).await.unwrap(), 0);
}

#[tokio::test]
async fn spawn_failure_is_reported() {
    let coordinator = LaunchCoordinator::new(Arc::new(FailingRunner))
        .with_validator(validator(0, Verdict::Pass));
    let err = coordinator.launch(&plan()).await.unwrap_err();
    assert!(matches!(err, ClauderockError::Launch(_)));
}
