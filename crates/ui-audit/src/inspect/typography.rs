//! Text readability: line-height ratio and mobile font size

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::fmt_px;

use super::{InspectContext, Inspector};

pub struct LineHeightInspector;

impl Inspector for LineHeightInspector {
    fn name(&self) -> &'static str {
        "line-height"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        let t = ctx.thresholds;
        let mobile = ctx.is_mobile_width();

        for element in &ctx.snapshot.text {
            let Some(font_size) = element.font_size_px()? else {
                continue;
            };
            if font_size <= 0.0 {
                continue;
            }
            let element_ref = ElementRef::of(ElementKind::Text, element);

            if let Some(line_height) = element.line_height_px()? {
                let ratio = line_height / font_size;
                if ratio < t.min_line_height_ratio {
                    out.issue(
                        Severity::Medium,
                        IssueCategory::LineHeight,
                        element_ref.clone(),
                        format!(
                            "Line height too tight: {:.2} (should be at least {})",
                            ratio, t.min_line_height_ratio
                        ),
                        element.anchor_or("Unknown text"),
                    );
                }
            }

            if mobile && font_size < t.min_font_size_mobile {
                out.issue(
                    Severity::High,
                    IssueCategory::FontSize,
                    element_ref,
                    format!(
                        "Text too small for mobile: {}px (minimum {}px)",
                        fmt_px(font_size),
                        fmt_px(t.min_font_size_mobile)
                    ),
                    element.anchor_or("Unknown text"),
                );
            }
        }

        Ok(())
    }
}
