//! Orchestrates preflight, the browser sweep, inspection and reporting

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::aggregate::IssueAggregator;
use crate::error::{AuditError, AuditResult};
use crate::inspect::{InspectContext, InspectorSuite};
use crate::issue::{ConsoleError, InspectorFailure, PageError};
use crate::journal::{IssueJournal, JournalEntry};
use crate::plan::{screenshot_name, AuditPlan, PageTarget, ViewportConfig};
use crate::playwright::{BrowserEvent, PlaywrightDriver};
use crate::report::Report;
use crate::site::SitePreflight;
use crate::snapshot::PageSnapshot;
use crate::visual::{VisualComparator, VisualDiffResult};

/// Where the sweep is in the browser lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    BrowserLaunched,
    ContextOpen { viewport: String },
    BrowserClosed,
}

impl fmt::Display for SweepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepState::Idle => write!(f, "idle"),
            SweepState::BrowserLaunched => write!(f, "browser launched"),
            SweepState::ContextOpen { viewport } => write!(f, "context '{}' open", viewport),
            SweepState::BrowserClosed => write!(f, "browser closed"),
        }
    }
}

impl SweepState {
    /// Apply one event's lifecycle transition
    pub fn advance(&self, event: &BrowserEvent) -> AuditResult<SweepState> {
        use BrowserEvent as E;
        use SweepState as S;

        let next = match (self, event) {
            (S::Idle, E::BrowserLaunched { .. }) => S::BrowserLaunched,
            (S::BrowserLaunched, E::ContextOpened { viewport }) => S::ContextOpen {
                viewport: viewport.clone(),
            },
            (S::BrowserLaunched, E::ContextFailed { .. }) => S::BrowserLaunched,
            (S::ContextOpen { viewport: open }, E::PageInspected { viewport, .. })
            | (S::ContextOpen { viewport: open }, E::PageFailed { viewport, .. })
                if open == viewport =>
            {
                self.clone()
            }
            (S::ContextOpen { viewport: open }, E::ContextClosed { viewport }) if open == viewport => {
                S::BrowserLaunched
            }
            (S::BrowserLaunched, E::BrowserClosed) => S::BrowserClosed,
            _ => {
                return Err(AuditError::Protocol {
                    event: event.name().to_string(),
                    state: self.to_string(),
                })
            }
        };
        Ok(next)
    }
}

/// Consumes browser events in order and records every outcome.
///
/// Owns the only mutable issue state of a run: the aggregator and the
/// journal both live here.
pub struct SweepRecorder<'a> {
    plan: &'a AuditPlan,
    suite: &'a InspectorSuite,
    state: SweepState,
    aggregator: IssueAggregator,
    journal: IssueJournal,
    screenshots: Vec<String>,
}

impl<'a> SweepRecorder<'a> {
    pub fn new(plan: &'a AuditPlan, suite: &'a InspectorSuite, journal: IssueJournal) -> Self {
        Self {
            plan,
            suite,
            state: SweepState::Idle,
            aggregator: IssueAggregator::new(),
            journal,
            screenshots: Vec::new(),
        }
    }

    pub fn state(&self) -> &SweepState {
        &self.state
    }

    pub fn handle(&mut self, event: BrowserEvent) -> AuditResult<()> {
        let next = self.state.advance(&event)?;

        match event {
            BrowserEvent::BrowserLaunched { browser } => info!("Browser launched: {}", browser),
            BrowserEvent::ContextOpened { viewport } => {
                info!("Testing {} viewport", self.viewport(&viewport, "context_opened")?.display_name());
            }
            BrowserEvent::ContextFailed { viewport, error } => {
                self.record_context_failure(&viewport, &error)?;
            }
            BrowserEvent::PageInspected {
                viewport,
                page,
                snapshot,
                screenshot,
                screenshot_error,
                console_errors,
            } => {
                self.record_page(
                    &viewport,
                    &page,
                    &snapshot,
                    PageArtifacts {
                        screenshot,
                        screenshot_error,
                        console_errors,
                    },
                )?;
            }
            BrowserEvent::PageFailed {
                viewport,
                page,
                stage,
                error,
            } => {
                warn!("✗ {} ({}) failed during {}: {}", page, viewport, stage, error);
                self.record(JournalEntry::PageError(PageError {
                    page,
                    viewport,
                    stage,
                    message: error,
                }))?;
                self.journal.flush()?;
            }
            BrowserEvent::ContextClosed { viewport } => debug!("Context '{}' closed", viewport),
            BrowserEvent::BrowserClosed => debug!("Browser closed"),
        }

        self.state = next;
        Ok(())
    }

    fn viewport(&self, name: &str, event: &str) -> AuditResult<&'a ViewportConfig> {
        self.plan
            .viewports
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| AuditError::Protocol {
                event: event.to_string(),
                state: format!("unknown viewport '{}'", name),
            })
    }

    fn page(&self, name: &str, event: &str) -> AuditResult<&'a PageTarget> {
        self.plan
            .pages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| AuditError::Protocol {
                event: event.to_string(),
                state: format!("unknown page '{}'", name),
            })
    }

    fn record(&mut self, entry: JournalEntry) -> AuditResult<()> {
        self.journal.append(&entry)?;
        entry.apply(&mut self.aggregator);
        Ok(())
    }

    fn record_context_failure(&mut self, viewport: &str, error: &str) -> AuditResult<()> {
        self.viewport(viewport, "context_failed")?;
        error!("Could not open {} context: {}", viewport, error);
        let pages: Vec<String> = self.plan.pages.iter().map(|p| p.name.clone()).collect();
        for page in pages {
            self.record(JournalEntry::PageError(PageError {
                page,
                viewport: viewport.to_string(),
                stage: "context".to_string(),
                message: error.to_string(),
            }))?;
        }
        self.journal.flush()
    }

    fn record_page(
        &mut self,
        viewport_name: &str,
        page_name: &str,
        snapshot: &PageSnapshot,
        artifacts: PageArtifacts,
    ) -> AuditResult<()> {
        let viewport = self.viewport(viewport_name, "page_inspected")?;
        let page = self.page(page_name, "page_inspected")?;

        let ctx = InspectContext {
            snapshot,
            viewport,
            page,
            thresholds: &self.plan.thresholds,
        };
        let inspection = self.suite.run(&ctx);
        let (issues, checks) = inspection.findings.into_parts();
        let issue_count = issues.len();

        for collector in &snapshot.collector_errors {
            warn!(
                "Collector '{}' failed on {} ({}): {}",
                collector.collector, page.name, viewport.name, collector.message
            );
            self.record(JournalEntry::InspectorFailure(InspectorFailure {
                inspector: format!("collector/{}", collector.collector),
                page: page.name.clone(),
                viewport: viewport.name.clone(),
                message: collector.message.clone(),
            }))?;
        }
        for issue in issues {
            self.record(JournalEntry::Issue(issue))?;
        }
        for check in checks {
            self.record(JournalEntry::Check(check))?;
        }
        for failure in inspection.failures {
            self.record(JournalEntry::InspectorFailure(failure))?;
        }

        for message in artifacts.console_errors {
            warn!("Console error on {} ({}): {}", page.name, viewport.name, message);
            self.record(JournalEntry::ConsoleError(ConsoleError {
                page: page.name.clone(),
                viewport: viewport.name.clone(),
                message,
            }))?;
        }

        match (artifacts.screenshot, artifacts.screenshot_error) {
            (_, Some(message)) => {
                warn!("Screenshot failed for {} ({}): {}", page.name, viewport.name, message);
                self.record(JournalEntry::PageError(PageError {
                    page: page.name.clone(),
                    viewport: viewport.name.clone(),
                    stage: "screenshot".to_string(),
                    message,
                }))?;
            }
            (Some(path), None) => {
                debug!("Screenshot saved: {}", path.display());
                self.screenshots.push(screenshot_name(viewport, page));
            }
            (None, None) => {}
        }

        self.record(JournalEntry::PageInspected {
            page: page.name.clone(),
            viewport: viewport.name.clone(),
        })?;
        self.journal.flush()?;

        info!("✓ {} ({}): {} issues", page.name, viewport.name, issue_count);
        Ok(())
    }

    /// End the sweep; the browser must have closed cleanly
    pub fn finish(mut self) -> AuditResult<SweepOutcome> {
        self.journal.flush()?;
        if self.state != SweepState::BrowserClosed {
            return Err(AuditError::Protocol {
                event: "end of stream".to_string(),
                state: self.state.to_string(),
            });
        }
        info!(
            "Journal: {} entries in {}",
            self.journal.entries(),
            self.journal.path().display()
        );
        Ok(SweepOutcome {
            aggregator: self.aggregator,
            screenshots: self.screenshots,
        })
    }
}

/// What the browser produced for a page besides its snapshot
struct PageArtifacts {
    screenshot: Option<PathBuf>,
    screenshot_error: Option<String>,
    console_errors: Vec<String>,
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub aggregator: IssueAggregator,
    /// Screenshot stems written during the sweep, in capture order
    pub screenshots: Vec<String>,
}

/// Switches taken from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub skip_preflight: bool,
    pub compare_baselines: bool,
    pub update_baselines: bool,
}

pub struct AuditRunner {
    plan: AuditPlan,
    options: RunOptions,
    suite: InspectorSuite,
    driver: PlaywrightDriver,
}

impl AuditRunner {
    pub fn new(plan: AuditPlan, options: RunOptions) -> Self {
        Self {
            plan,
            options,
            suite: InspectorSuite::default(),
            driver: PlaywrightDriver::default(),
        }
    }

    pub fn with_driver(mut self, driver: PlaywrightDriver) -> Self {
        self.driver = driver;
        self
    }

    pub fn plan(&self) -> &AuditPlan {
        &self.plan
    }

    /// Run the full audit and write the report
    pub async fn run(&self) -> AuditResult<Report> {
        let start = Instant::now();
        self.plan.validate()?;

        std::fs::create_dir_all(&self.plan.output.dir)?;
        std::fs::create_dir_all(&self.plan.output.screenshot_dir)?;

        if self.options.skip_preflight {
            debug!("Preflight skipped");
        } else {
            SitePreflight::new(self.plan.base_url.clone())?
                .wait_until_reachable(Duration::from_millis(self.plan.navigation.preflight_timeout_ms))
                .await?;
        }

        PlaywrightDriver::check_playwright_installed()?;

        info!(
            "Auditing {} pages across {} viewports",
            self.plan.pages.len(),
            self.plan.viewports.len()
        );

        let journal = IssueJournal::create(&self.plan.output.journal)?;
        let mut recorder = SweepRecorder::new(&self.plan, &self.suite, journal);
        let script = PlaywrightDriver::build_script(&self.plan)?;
        self.driver.run(&script, |event| recorder.handle(event)).await?;
        let outcome = recorder.finish()?;

        let visual_diffs = self.visual_pass(&outcome.screenshots);

        let report = Report::build(&self.plan, &outcome.aggregator, visual_diffs);
        report.write(&self.plan.output.report)?;

        info!(
            "Audit finished in {:.1}s: {} issues, {}",
            start.elapsed().as_secs_f64(),
            report.summary.total_issues,
            if report.passed() { "passed" } else { "failed" }
        );
        Ok(report)
    }

    /// Baseline comparison or promotion. A failure here is logged and
    /// leaves the report without visual results rather than losing it.
    fn visual_pass(&self, screenshots: &[String]) -> Vec<VisualDiffResult> {
        match self.try_visual_pass(screenshots) {
            Ok(diffs) => diffs,
            Err(e) => {
                error!("Visual comparison aborted: {}", e);
                Vec::new()
            }
        }
    }

    fn try_visual_pass(&self, screenshots: &[String]) -> AuditResult<Vec<VisualDiffResult>> {
        let compare = self.options.compare_baselines || self.plan.visual.enabled;
        if !compare && !self.options.update_baselines {
            return Ok(Vec::new());
        }

        let comparator = VisualComparator::new(&self.plan)?;

        if self.options.update_baselines {
            for name in screenshots {
                comparator.update_baseline(name)?;
            }
            info!(
                "Updated {} baselines ({} stored)",
                screenshots.len(),
                comparator.list_baselines()?.len()
            );
            return Ok(Vec::new());
        }

        comparator.clean_diffs()?;
        let mut diffs = Vec::with_capacity(screenshots.len());
        for name in screenshots {
            match comparator.compare(name) {
                Ok(diff) => diffs.push(diff),
                Err(e) => warn!("Skipping visual comparison for '{}': {}", name, e),
            }
        }
        Ok(diffs)
    }

    /// Rebuild and rewrite the report from a journal left by an earlier run
    pub fn rebuild_report(&self, journal: &Path) -> AuditResult<Report> {
        let aggregator = IssueJournal::rebuild(journal)?;
        let report = Report::build(&self.plan, &aggregator, Vec::new());
        report.write(&self.plan.output.report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launched() -> BrowserEvent {
        BrowserEvent::BrowserLaunched {
            browser: "chromium".into(),
        }
    }

    #[test]
    fn test_lifecycle_transitions() {
        let state = SweepState::Idle.advance(&launched()).unwrap();
        let state = state
            .advance(&BrowserEvent::ContextOpened {
                viewport: "mobile".into(),
            })
            .unwrap();
        let state = state
            .advance(&BrowserEvent::ContextClosed {
                viewport: "mobile".into(),
            })
            .unwrap();
        let state = state.advance(&BrowserEvent::BrowserClosed).unwrap();
        assert_eq!(state, SweepState::BrowserClosed);
    }

    #[test]
    fn test_out_of_order_event_is_protocol_error() {
        let err = SweepState::Idle
            .advance(&BrowserEvent::ContextOpened {
                viewport: "mobile".into(),
            })
            .unwrap_err();
        assert!(matches!(err, AuditError::Protocol { .. }));

        let open = SweepState::ContextOpen {
            viewport: "mobile".into(),
        };
        let wrong_viewport = BrowserEvent::PageFailed {
            viewport: "desktop".into(),
            page: "Homepage".into(),
            stage: "navigate".into(),
            error: "timeout".into(),
        };
        assert!(open.advance(&wrong_viewport).is_err());
        assert!(open.advance(&BrowserEvent::BrowserClosed).is_err());
    }

    #[test]
    fn test_visual_failure_leaves_report_intact() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut plan = AuditPlan::default();
        plan.reroot_output(tmp.path());
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        plan.visual.baseline_dir = Some(blocker.join("baselines"));

        let options = RunOptions {
            compare_baselines: true,
            ..Default::default()
        };
        let runner = AuditRunner::new(plan, options);
        let diffs = runner.visual_pass(&["mobile-homepage".to_string()]);
        assert!(diffs.is_empty());

        let report = Report::build(runner.plan(), &IssueAggregator::new(), diffs);
        report.write(&runner.plan().output.report).unwrap();
        assert!(runner.plan().output.report.exists());
    }
}
