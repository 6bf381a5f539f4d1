//! Page-wide horizontal scrolling

use crate::error::AuditResult;
use crate::issue::{ElementRef, Findings, IssueCategory, Severity};

use super::{InspectContext, Inspector};

pub struct OverflowInspector;

impl Inspector for OverflowInspector {
    fn name(&self) -> &'static str {
        "overflow"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        // One record per (page, viewport), never per offending element.
        if ctx.snapshot.scroll_width > ctx.viewport_width() {
            out.issue(
                Severity::Critical,
                IssueCategory::HorizontalOverflow,
                ElementRef::page(),
                format!(
                    "Horizontal scrolling detected at {}px width",
                    ctx.viewport.width
                ),
                "Overall page layout",
            );
        }
        Ok(())
    }
}
