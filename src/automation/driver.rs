use serde::Serialize;

use super::dom::PageDom;
use super::probe::{wait_for, Match};
use super::target::{Target, TargetSet, TargetSpec};
use crate::config::{MissPolicy, Timing};
use crate::error::Result;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    TabOpening,
    AwaitingLoad,
    ClickingCreate,
    AwaitingSettle,
    SelectingWebsiteMode,
    FillingUrl,
    ClickingInsert,
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::TabOpening => "tab_opening",
            Stage::AwaitingLoad => "awaiting_load",
            Stage::ClickingCreate => "clicking_create",
            Stage::AwaitingSettle => "awaiting_settle",
            Stage::SelectingWebsiteMode => "selecting_website_mode",
            Stage::FillingUrl => "filling_url",
            Stage::ClickingInsert => "clicking_insert",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed {
        selector: String,
        strategy_index: usize,
    },
    NotFound,
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    fn from_match<E>(found: &Match<E>) -> Self {
        StepOutcome::Completed {
            selector: found.selector.clone(),
            strategy_index: found.strategy_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub stage: Stage,
    pub target: Target,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Mutable record of a run, updated as stages advance
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub stage: Stage,
    pub steps: Vec<StepReport>,
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            steps: Vec::new(),
        }
    }

    pub fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "Stage transition");
        self.stage = stage;
    }

    fn record(&mut self, target: Target, outcome: StepOutcome) -> bool {
        let completed = outcome.is_completed();
        self.steps.push(StepReport {
            stage: self.stage,
            target,
            outcome,
        });
        completed
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// How the UI sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Finished,
    Halted { target: Target },
}

/// Runs the fixed UI sequence against a loaded destination page
pub struct StagedDriver {
    targets: TargetSet,
    timing: Timing,
}

impl StagedDriver {
    pub fn new(targets: TargetSet, timing: Timing) -> Self {
        Self { targets, timing }
    }

    async fn find<D: PageDom>(
        &self,
        dom: &D,
        spec: &TargetSpec,
    ) -> Result<Option<Match<D::Element>>> {
        let found = wait_for(dom, spec, self.timing.step_timeout, self.timing.poll_interval).await?;
        match &found {
            Some(found) => tracing::info!(
                target_name = %spec.target,
                selector = found.selector.as_str(),
                "Found {}",
                spec.target.label()
            ),
            None => tracing::error!(
                target_name = %spec.target,
                "{} not found after trying {} selectors",
                spec.target.label(),
                spec.selectors.len()
            ),
        }
        Ok(found)
    }

    /// Locate `target` and click it
    pub async fn click_target<D: PageDom>(&self, dom: &D, target: Target) -> Result<StepOutcome> {
        let Some(found) = self.find(dom, self.targets.get(target)).await? else {
            return Ok(StepOutcome::NotFound);
        };
        dom.click(&found.element).await?;
        Ok(StepOutcome::from_match(&found))
    }

    /// Locate the URL field, assign `url`, then emit `input` and `change`
    pub async fn fill_url<D: PageDom>(&self, dom: &D, url: &str) -> Result<StepOutcome> {
        let Some(found) = self.find(dom, &self.targets.url_input).await? else {
            return Ok(StepOutcome::NotFound);
        };
        dom.set_value(&found.element, url).await?;
        dom.dispatch_event(&found.element, "input").await?;
        dom.dispatch_event(&found.element, "change").await?;
        Ok(StepOutcome::from_match(&found))
    }

    /// Run create → website → URL → insert, recording each step in `progress`.
    ///
    /// A miss either halts the sequence or moves on, depending on `policy`.
    /// Errors from the page itself are returned as-is with `progress` left at
    /// the failing stage.
    pub async fn drive<D: PageDom>(
        &self,
        dom: &D,
        source_url: &str,
        policy: MissPolicy,
        progress: &mut RunProgress,
    ) -> Result<DriveOutcome> {
        progress.enter(Stage::ClickingCreate);
        let outcome = self.click_target(dom, Target::CreateButton).await?;
        if !progress.record(Target::CreateButton, outcome) && policy == MissPolicy::Abort {
            return Ok(DriveOutcome::Halted {
                target: Target::CreateButton,
            });
        }

        // The source dialog renders asynchronously after "Create new".
        progress.enter(Stage::AwaitingSettle);
        let chip = self.find(dom, &self.targets.website).await?;

        progress.enter(Stage::SelectingWebsiteMode);
        let outcome = match chip {
            Some(found) => {
                dom.click(&found.element).await?;
                StepOutcome::from_match(&found)
            }
            None => StepOutcome::NotFound,
        };
        if !progress.record(Target::WebsiteChip, outcome) && policy == MissPolicy::Abort {
            return Ok(DriveOutcome::Halted {
                target: Target::WebsiteChip,
            });
        }

        progress.enter(Stage::FillingUrl);
        let outcome = self.fill_url(dom, source_url).await?;
        if !progress.record(Target::UrlInput, outcome) && policy == MissPolicy::Abort {
            return Ok(DriveOutcome::Halted {
                target: Target::UrlInput,
            });
        }

        progress.enter(Stage::ClickingInsert);
        let outcome = self.click_target(dom, Target::InsertButton).await?;
        if !progress.record(Target::InsertButton, outcome) && policy == MissPolicy::Abort {
            return Ok(DriveOutcome::Halted {
                target: Target::InsertButton,
            });
        }

        progress.enter(Stage::Done);
        Ok(DriveOutcome::Finished)
    }
}
