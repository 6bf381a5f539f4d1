//! Vertical rhythm between sections and container width consistency

use std::collections::BTreeSet;

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::fmt_px;

use super::{InspectContext, Inspector};

pub struct SectionSpacingInspector;

impl Inspector for SectionSpacingInspector {
    fn name(&self) -> &'static str {
        "section-spacing"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        check_sections(ctx, out)?;
        check_containers(ctx, out);
        Ok(())
    }
}

struct SectionSpacing {
    top: f64,
    bottom: f64,
}

fn check_sections(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let t = ctx.thresholds;
    let sections = &ctx.snapshot.sections;

    let mut spacings = Vec::with_capacity(sections.len());
    for section in sections {
        let margin = section.margin_sides()?;
        let padding = section.padding_sides()?;
        let spacing = SectionSpacing {
            top: margin.top + padding.top,
            bottom: margin.bottom + padding.bottom,
        };

        if spacing.top < t.section_min_spacing || spacing.bottom < t.section_min_spacing {
            out.issue(
                Severity::Medium,
                IssueCategory::SectionSpacing,
                ElementRef::of(ElementKind::Section, section),
                format!(
                    "Insufficient section spacing: {}px top, {}px bottom",
                    fmt_px(spacing.top),
                    fmt_px(spacing.bottom)
                ),
                section.anchor_or("Unknown section"),
            );
        }
        spacings.push(spacing);
    }

    // Gap i sits between sections i and i + 1.
    let gaps: Vec<f64> = spacings
        .windows(2)
        .map(|pair| pair[0].bottom + pair[1].top)
        .collect();
    if gaps.len() < 2 {
        return Ok(());
    }

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return Ok(());
    }
    let allowed = mean * t.section_spacing_tolerance;

    for (index, gap) in gaps.iter().enumerate() {
        if (gap - mean).abs() > allowed {
            let next = &sections[index + 1];
            out.issue(
                Severity::Medium,
                IssueCategory::SectionSpacing,
                ElementRef::of(ElementKind::Section, next),
                format!(
                    "Inconsistent section spacing: {}px gap vs {}px mean",
                    fmt_px(*gap),
                    fmt_px(mean)
                ),
                next.anchor_or("Unknown section"),
            );
        }
    }

    Ok(())
}

fn check_containers(ctx: &InspectContext<'_>, out: &mut Findings) {
    let containers = &ctx.snapshot.containers;
    let widths: BTreeSet<i64> = containers
        .iter()
        .filter(|c| c.is_rendered())
        .map(|c| c.rect.width.round() as i64)
        .collect();

    if widths.len() > ctx.thresholds.max_container_widths {
        if let Some(first) = containers.first() {
            out.issue(
                Severity::High,
                IssueCategory::ContainerWidth,
                ElementRef::of(ElementKind::Containers, first),
                format!(
                    "Inconsistent container widths detected: {} different widths",
                    widths.len()
                ),
                "Page containers",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::fixtures::Fixture;
    use crate::snapshot::{ElementSnapshot, PageSnapshot};

    fn section(index: usize, padding: &str) -> ElementSnapshot {
        ElementSnapshot::new(format!("body>main>section:nth-of-type({})", index), "section")
            .padding(padding)
            .anchored(format!("Section {}", index))
    }

    #[test]
    fn test_uniform_sections_are_clean() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.sections = (1..=4).map(|i| section(i, "64px 0")).collect();
        assert!(Fixture::desktop(snapshot).run(&SectionSpacingInspector).issues().is_empty());
    }

    #[test]
    fn test_outlier_gap_is_flagged() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        // Gaps: 128, 128, 128 + 192 = 320 -> mean 192, allowed 96
        snapshot.sections = vec![
            section(1, "64px 0"),
            section(2, "64px 0"),
            section(3, "64px 0 256px 0"),
            section(4, "64px 0"),
        ];
        let findings = Fixture::desktop(snapshot).run(&SectionSpacingInspector);
        let issues = findings.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "Section 4");
        assert_eq!(
            issues[0].issue,
            "Inconsistent section spacing: 320px gap vs 192px mean"
        );
    }

    #[test]
    fn test_tight_section_is_flagged() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.sections = vec![section(1, "24px 0").margin("16px 0")];
        let findings = Fixture::desktop(snapshot).run(&SectionSpacingInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(
            findings.issues()[0].issue,
            "Insufficient section spacing: 40px top, 40px bottom"
        );
    }

    #[test]
    fn test_container_widths() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.containers = [1280.0, 1024.0, 768.0, 640.0]
            .iter()
            .enumerate()
            .map(|(i, w)| {
                ElementSnapshot::new(format!("body>div:nth-of-type({})", i + 1), "div")
                    .at(0.0, 0.0, *w, 100.0)
            })
            .collect();
        let findings = Fixture::desktop(snapshot).run(&SectionSpacingInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].category, IssueCategory::ContainerWidth);
    }
}
