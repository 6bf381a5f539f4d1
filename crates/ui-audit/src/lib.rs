//! UI Audit Harness
//!
//! This crate drives a headless browser across a matrix of viewports and
//! pages, and runs heuristic layout checks on what it finds:
//! - Generates one Playwright script per run and streams its events back
//! - Captures read-only page snapshots (geometry and computed styles)
//! - Runs isolated inspectors over each snapshot
//! - Journals results as they arrive and writes a prioritized report
//! - Optionally diffs full-page screenshots against baselines
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Audit Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AuditRunner                                                │
//! │    ├── SitePreflight::wait_until_reachable()                │
//! │    ├── PlaywrightDriver::run(script) -> BrowserEvent*       │
//! │    ├── SweepRecorder                                        │
//! │    │     ├── InspectorSuite::run(snapshot) -> Findings      │
//! │    │     ├── IssueJournal::append()                         │
//! │    │     └── IssueAggregator                                │
//! │    ├── VisualComparator::compare(screenshot)                │
//! │    └── Report::build() -> JSON + console                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AuditPlan (YAML)                                           │
//! │    ├── base_url, browser                                    │
//! │    ├── viewports: [ViewportConfig]                          │
//! │    ├── pages: [PageTarget]                                  │
//! │    ├── selectors, thresholds                                │
//! │    └── navigation, output, visual                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod error;
pub mod inspect;
pub mod issue;
pub mod journal;
pub mod plan;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod site;
pub mod snapshot;
pub mod visual;

pub use aggregate::{IssueAggregator, SeverityCounts};
pub use error::{AuditError, AuditResult};
pub use inspect::{InspectContext, Inspector, InspectorSuite};
pub use issue::{
    ConsoleError, ElementKind, ElementRef, Findings, IssueCategory, IssueRecord, Severity,
};
pub use journal::{IssueJournal, JournalEntry};
pub use plan::{AuditPlan, OutputConfig, PageTarget, Thresholds, ViewportConfig};
pub use playwright::{BrowserEvent, PlaywrightDriver};
pub use report::{Recommendation, Report};
pub use runner::{AuditRunner, RunOptions, SweepRecorder, SweepState};
pub use snapshot::{ElementSnapshot, PageSnapshot};
