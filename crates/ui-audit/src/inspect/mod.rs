//! Heuristic inspectors
//!
//! Each inspector is a pure function of a [`PageSnapshot`], the active
//! viewport and the plan's thresholds. The suite runs every inspector inside
//! its own `Result` boundary: an inspector that errors loses only its own
//! output for that page.

use tracing::{debug, warn};

use crate::error::AuditResult;
use crate::issue::{Findings, InspectorFailure};
use crate::plan::{PageTarget, Thresholds, ViewportConfig};
use crate::snapshot::PageSnapshot;

pub mod floating;
pub mod hero;
pub mod navigation;
pub mod overflow;
pub mod padding;
pub mod spacing;
pub mod touch;
pub mod typography;

pub use floating::FloatingElementInspector;
pub use hero::{HeroContentInspector, HeroGeometryInspector};
pub use navigation::NavigationInspector;
pub use overflow::OverflowInspector;
pub use padding::PaddingInspector;
pub use spacing::SectionSpacingInspector;
pub use touch::TouchTargetInspector;
pub use typography::LineHeightInspector;

/// Inputs shared by every inspector for one (page, viewport) pass
#[derive(Debug, Clone, Copy)]
pub struct InspectContext<'a> {
    pub snapshot: &'a PageSnapshot,
    pub viewport: &'a ViewportConfig,
    pub page: &'a PageTarget,
    pub thresholds: &'a Thresholds,
}

impl<'a> InspectContext<'a> {
    pub fn is_mobile_width(&self) -> bool {
        self.viewport.is_mobile_width(self.thresholds)
    }

    /// Width used for overflow comparisons: the configured viewport width
    pub fn viewport_width(&self) -> f64 {
        f64::from(self.viewport.width)
    }

    pub fn findings(&self) -> Findings {
        Findings::new(self.page.name.clone(), self.viewport.name.clone())
    }
}

/// A single category of layout or accessibility heuristic
pub trait Inspector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Append issues and checks for this page to `out`
    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()>;
}

/// Result of running the suite over one page
#[derive(Debug)]
pub struct PageInspection {
    pub findings: Findings,
    pub failures: Vec<InspectorFailure>,
}

/// Ordered set of inspectors run against every snapshot
pub struct InspectorSuite {
    inspectors: Vec<Box<dyn Inspector>>,
}

impl Default for InspectorSuite {
    fn default() -> Self {
        Self::new(vec![
            Box::new(TouchTargetInspector),
            Box::new(PaddingInspector),
            Box::new(LineHeightInspector),
            Box::new(OverflowInspector),
            Box::new(HeroGeometryInspector),
            Box::new(HeroContentInspector),
            Box::new(FloatingElementInspector),
            Box::new(SectionSpacingInspector),
            Box::new(NavigationInspector),
        ])
    }
}

impl InspectorSuite {
    pub fn new(inspectors: Vec<Box<dyn Inspector>>) -> Self {
        Self { inspectors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.inspectors.iter().map(|i| i.name()).collect()
    }

    pub fn run(&self, ctx: &InspectContext<'_>) -> PageInspection {
        let mut findings = ctx.findings();
        let mut failures = Vec::new();

        for inspector in &self.inspectors {
            let mut scratch = findings.sibling();
            match inspector.inspect(ctx, &mut scratch) {
                Ok(()) => {
                    debug!(
                        inspector = inspector.name(),
                        issues = scratch.issues().len(),
                        "inspector finished"
                    );
                    findings.absorb(scratch);
                }
                Err(e) => {
                    warn!(
                        "Inspector '{}' failed on {} ({}): {}",
                        inspector.name(),
                        ctx.page.name,
                        ctx.viewport.name,
                        e
                    );
                    failures.push(InspectorFailure {
                        inspector: inspector.name().to_string(),
                        page: ctx.page.name.clone(),
                        viewport: ctx.viewport.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        PageInspection { findings, failures }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::Fixture;
    use super::*;
    use crate::issue::{ElementRef, IssueCategory, Severity};
    use crate::snapshot::ElementSnapshot;

    struct Exploding;

    impl Inspector for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
            out.issue(
                Severity::Low,
                IssueCategory::Padding,
                ElementRef::page(),
                "partial output",
                "nowhere",
            );
            ctx.snapshot.buttons[0].padding_sides()?;
            Ok(())
        }
    }

    #[test]
    fn test_failing_inspector_is_isolated() {
        let mut snapshot = PageSnapshot::blank(375.0, 667.0);
        snapshot.scroll_width = 420.0;
        snapshot.buttons.push(ElementSnapshot::new("body>button", "button").padding("1em"));
        let fixture = Fixture::mobile(snapshot);

        let suite = InspectorSuite::new(vec![Box::new(Exploding), Box::new(OverflowInspector)]);
        let result = suite.run(&fixture.ctx());

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].inspector, "exploding");
        assert_eq!(result.findings.issues().len(), 1);
        assert_eq!(
            result.findings.issues()[0].category,
            IssueCategory::HorizontalOverflow
        );
    }

    #[test]
    fn test_default_suite_names() {
        let suite = InspectorSuite::default();
        assert_eq!(suite.names().len(), 9);
        assert!(suite.names().contains(&"hero-content"));
        assert!(suite.names().contains(&"touch-target"));
    }
}
