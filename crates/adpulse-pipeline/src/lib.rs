//! The four-stage analysis pipeline: analyze → decide → create → aggregate.
//!
//! Each stage is a standalone async function that persists its own output in
//! a short transaction and hands typed rows to the next stage; the runner in
//! [`runner`] sequences them inside one agent-run record and manages the
//! run's lifecycle status. Stages never roll back a predecessor's committed
//! writes; a failure only marks the run as failed.

pub mod analytics;
pub mod content;
mod error;
pub mod generator;
pub mod report;
pub mod runner;
pub mod strategist;
pub mod window;

pub use error::PipelineError;
pub use generator::{BrandContext, CreativeDraft, CreativeGenerator, TemplateGenerator};
pub use report::{Report, ReportMetrics};
pub use runner::{run_weekly_analysis, RunParams, RUN_TYPE_WEEKLY};
