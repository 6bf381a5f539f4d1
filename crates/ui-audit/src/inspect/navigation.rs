//! Mobile navigation bar height

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::fmt_px;

use super::{InspectContext, Inspector};

pub struct NavigationInspector;

impl Inspector for NavigationInspector {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        let Some(nav) = &ctx.snapshot.navigation else {
            return Ok(());
        };
        let min = ctx.thresholds.nav_min_height_mobile;

        if ctx.is_mobile_width() && nav.is_rendered() && nav.rect.height < min {
            out.issue(
                Severity::High,
                IssueCategory::Navigation,
                ElementRef::of(ElementKind::Navigation, nav),
                format!(
                    "Navigation height too small for mobile: {}px (should be at least {}px)",
                    fmt_px(nav.rect.height.round()),
                    fmt_px(min)
                ),
                "Navigation bar",
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::fixtures::Fixture;
    use crate::snapshot::{ElementSnapshot, PageSnapshot};

    #[test]
    fn test_short_nav_on_mobile() {
        let mut snapshot = PageSnapshot::blank(375.0, 667.0);
        snapshot.navigation = Some(ElementSnapshot::new("body>header>nav", "nav").at(0.0, 0.0, 375.0, 48.0));
        let findings = Fixture::mobile(snapshot.clone()).run(&NavigationInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].severity, Severity::High);

        let findings = Fixture::desktop(snapshot).run(&NavigationInspector);
        assert!(findings.issues().is_empty());
    }
}
