//! Send-to-notebook automation: tab orchestration and the staged UI driver.

pub mod dom;
pub mod driver;
pub mod orchestrator;
pub mod probe;
pub mod snapshot;
pub mod target;

pub use dom::PageDom;
pub use driver::{DriveOutcome, RunProgress, Stage, StagedDriver, StepOutcome, StepReport};
pub use orchestrator::{
    validate_source_url, Orchestrator, RunOutcome, RunReport, TabHost, TabInfo, RUN_AUTOMATION,
};
pub use probe::{locate, wait_for, Match};
pub use snapshot::{Interaction, SnapshotElement, SnapshotPage};
pub use target::{Predicate, Target, TargetSet, TargetSpec};
