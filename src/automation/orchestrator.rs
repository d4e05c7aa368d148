use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::{sleep, timeout};

use super::dom::PageDom;
use super::driver::{DriveOutcome, RunProgress, Stage, StagedDriver, StepReport};
use super::target::TargetSet;
use crate::config::{AutomationConfig, Config, MissPolicy, Timing};
use crate::error::{ClipbookError, Result};

/// Command identifier that starts an automation run
pub const RUN_AUTOMATION: &str = "run-automation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabInfo {
    pub id: String,
    pub url: Option<String>,
}

/// Browser-side operations the orchestrator depends on
#[async_trait]
pub trait TabHost: Send + Sync {
    type Page: PageDom;

    /// The focused tab of the current window, if there is one
    async fn active_tab(&self) -> Result<Option<TabInfo>>;

    /// Open `url` in a new tab
    async fn open_tab(&self, url: &str) -> Result<Self::Page>;

    /// Resolve once the tab's document has fully loaded. Not bounded; callers
    /// apply their own timeout and drop the future to stop watching.
    async fn wait_until_loaded(&self, page: &Self::Page) -> Result<()>;

    async fn close_tab(&self, page: Self::Page) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted { stage: Stage, reason: String },
}

/// Summary of one automation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_url: Option<String>,
    pub final_stage: Stage,
    pub steps: Vec<StepReport>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Held for the duration of a run; releases the in-flight flag on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Captures the source tab, opens the destination, and hands it to the driver
pub struct Orchestrator<H: TabHost> {
    host: H,
    destination_url: String,
    timing: Timing,
    policy: MissPolicy,
    close_tab_on_failure: bool,
    driver: StagedDriver,
    in_flight: AtomicBool,
}

impl<H: TabHost> Orchestrator<H> {
    pub fn new(host: H, automation: &AutomationConfig, targets: TargetSet) -> Self {
        let timing = automation.timing();
        Self {
            host,
            destination_url: automation.destination_url.clone(),
            timing,
            policy: automation.on_miss,
            close_tab_on_failure: automation.close_tab_on_failure,
            driver: StagedDriver::new(targets, timing),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_config(host: H, config: &Config) -> Self {
        Self::new(
            host,
            &config.automation,
            TargetSet::from_config(&config.selectors),
        )
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Dispatch a command identifier. Unknown commands are ignored.
    pub async fn handle_command(&self, command: &str) -> Option<Result<RunReport>> {
        if command.trim() != RUN_AUTOMATION {
            tracing::debug!(command, "Ignoring unknown command");
            return None;
        }
        Some(self.run().await)
    }

    /// Run the automation once.
    ///
    /// Only fails with [`ClipbookError::RunInProgress`]; every other failure
    /// ends the run and is described by the report's outcome.
    pub async fn run(&self) -> Result<RunReport> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or_else(|| {
            tracing::warn!("Automation already running, ignoring trigger");
            ClipbookError::RunInProgress
        })?;

        let mut progress = RunProgress::new();
        let mut source_url = None;

        let outcome = match self.execute(&mut progress, &mut source_url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(stage = %progress.stage, "Automation failed: {}", e);
                RunOutcome::Aborted {
                    stage: progress.stage,
                    reason: e.to_string(),
                }
            }
        };

        match &outcome {
            RunOutcome::Completed => tracing::info!("Automation completed"),
            RunOutcome::Aborted { stage, reason } => {
                tracing::warn!(%stage, "Automation aborted: {}", reason)
            }
        }

        Ok(RunReport {
            source_url,
            final_stage: progress.stage,
            steps: progress.steps,
            outcome,
        })
    }

    async fn execute(
        &self,
        progress: &mut RunProgress,
        source_url: &mut Option<String>,
    ) -> Result<RunOutcome> {
        progress.enter(Stage::TabOpening);

        let tab = self
            .host
            .active_tab()
            .await?
            .ok_or(ClipbookError::NoActiveTab)?;
        let url = validate_source_url(tab.url.as_deref())?.to_string();
        tracing::info!(tab_id = tab.id.as_str(), source_url = url.as_str(), "Captured source URL");
        *source_url = Some(url.clone());

        let page = self.host.open_tab(&self.destination_url).await?;
        tracing::info!(destination = self.destination_url.as_str(), "Opened destination tab");

        let result = self.drive_page(&page, &url, progress).await;

        if self.close_tab_on_failure && !matches!(result, Ok(RunOutcome::Completed)) {
            if let Err(e) = self.host.close_tab(page).await {
                tracing::warn!("Failed to close destination tab: {}", e);
            }
        }

        result
    }

    async fn drive_page(
        &self,
        page: &H::Page,
        source_url: &str,
        progress: &mut RunProgress,
    ) -> Result<RunOutcome> {
        progress.enter(Stage::AwaitingLoad);
        timeout(self.timing.load_timeout, self.host.wait_until_loaded(page))
            .await
            .map_err(|_| {
                ClipbookError::Timeout(format!(
                    "destination tab did not finish loading within {:?}",
                    self.timing.load_timeout
                ))
            })??;
        sleep(self.timing.settle).await;

        let outcome = self
            .driver
            .drive(page, source_url, self.policy, progress)
            .await?;

        Ok(match outcome {
            DriveOutcome::Finished => RunOutcome::Completed,
            DriveOutcome::Halted { target } => RunOutcome::Aborted {
                stage: progress.stage,
                reason: format!("{} not found", target.label()),
            },
        })
    }
}

/// Accept any URL the tab reports; only a missing or blank one is rejected.
/// The text is passed on exactly as captured.
pub fn validate_source_url(url: Option<&str>) -> Result<&str> {
    url.filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ClipbookError::MissingSourceUrl("tab has no URL".to_string()))
}
