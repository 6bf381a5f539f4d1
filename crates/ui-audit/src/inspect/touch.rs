//! Minimum touch target size on mobile-width viewports

use std::collections::HashSet;

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::fmt_px;

use super::{InspectContext, Inspector};

pub struct TouchTargetInspector;

impl Inspector for TouchTargetInspector {
    fn name(&self) -> &'static str {
        "touch-target"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        if !ctx.is_mobile_width() {
            return Ok(());
        }

        let min = ctx.thresholds.min_touch_target;
        let mut seen = HashSet::new();

        for element in &ctx.snapshot.interactive {
            if !element.is_rendered() || !seen.insert(element.path.as_str()) {
                continue;
            }
            if element.rect.width >= min && element.rect.height >= min {
                continue;
            }

            let (kind, fallback) = if element.is_form_control() {
                (ElementKind::FormField, "Unknown input")
            } else {
                (ElementKind::Button, "Unknown button")
            };

            out.issue(
                Severity::Critical,
                IssueCategory::TouchTarget,
                ElementRef::of(kind, element),
                format!(
                    "Touch target too small: {}x{}px (minimum {}x{}px required)",
                    fmt_px(element.rect.width.round()),
                    fmt_px(element.rect.height.round()),
                    fmt_px(min),
                    fmt_px(min)
                ),
                element.anchor_or(fallback),
            );
        }

        Ok(())
    }
}
