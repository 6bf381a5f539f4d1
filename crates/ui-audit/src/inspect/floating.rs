//! Floating badges, escaping particle layers and full-screen overlays

use std::collections::HashSet;

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::{fmt_px, ElementSnapshot, PageSnapshot};

use super::{InspectContext, Inspector};

pub const VISUAL_ARTIFACTS: &str = "visual artifacts";

pub struct FloatingElementInspector;

impl Inspector for FloatingElementInspector {
    fn name(&self) -> &'static str {
        "floating-element"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        let snapshot = ctx.snapshot;
        let before = out.issues().len();

        check_badges(snapshot, out);
        check_particles(snapshot, out);
        check_overlays(ctx, out)?;

        let found = out.issues().len() - before;
        let message = if found == 0 {
            "No floating badges, escaping particle layers or overlays".to_string()
        } else {
            format!("{} visual artifact(s) found", found)
        };
        out.check(VISUAL_ARTIFACTS, found == 0, message);
        Ok(())
    }
}

fn check_badges(snapshot: &PageSnapshot, out: &mut Findings) {
    let hero_bottom = snapshot.hero.as_ref().map(|h| h.rect.bottom());

    for badge in snapshot.badges.iter().filter(|b| b.is_rendered() && b.is_floating()) {
        let rect = badge.rect;
        let element = ElementRef::of(ElementKind::Badge, badge);

        match hero_bottom {
            Some(bottom) if rect.top() < bottom => {
                out.issue(
                    Severity::High,
                    IssueCategory::VisualArtifact,
                    element,
                    format!(
                        "Badge floating over hero: {} at top {}px, hero bottom {}px",
                        badge.style.position,
                        fmt_px(rect.top()),
                        fmt_px(bottom)
                    ),
                    badge.anchor_or("Unknown badge"),
                );
            }
            _ if rect.top() < snapshot.inner_height / 2.0
                && rect.left() < snapshot.inner_width / 2.0 =>
            {
                out.issue(
                    Severity::Medium,
                    IssueCategory::VisualArtifact,
                    element,
                    format!(
                        "Floating badge in upper-left quadrant: {} at {}px, {}px",
                        badge.style.position,
                        fmt_px(rect.left()),
                        fmt_px(rect.top())
                    ),
                    badge.anchor_or("Unknown badge"),
                );
            }
            _ => {}
        }
    }
}

fn check_particles(snapshot: &PageSnapshot, out: &mut Findings) {
    for layer in &snapshot.particles {
        let rect = layer.rect;
        let right = rect.right() > snapshot.inner_width;
        let bottom = rect.bottom() > snapshot.inner_height;
        if !right && !bottom {
            continue;
        }

        let edges = match (right, bottom) {
            (true, true) => "right and bottom edges",
            (true, false) => "right edge",
            _ => "bottom edge",
        };
        out.issue(
            Severity::Medium,
            IssueCategory::VisualArtifact,
            ElementRef::of(ElementKind::ParticleLayer, layer),
            format!(
                "Particle layer exceeds viewport past the {} ({}x{}px viewport)",
                edges,
                fmt_px(snapshot.inner_width),
                fmt_px(snapshot.inner_height)
            ),
            layer.anchor_or(&format!("<{}>", layer.tag)),
        );
    }
}

fn check_overlays(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let snapshot = ctx.snapshot;
    let t = ctx.thresholds;
    let reported: HashSet<&str> = snapshot
        .badges
        .iter()
        .chain(&snapshot.particles)
        .map(|e| e.path.as_str())
        .collect();

    for element in snapshot
        .positioned
        .iter()
        .filter(|e| e.is_floating() && !reported.contains(e.path.as_str()))
    {
        if let Some(reason) = overlay_reason(element, snapshot, t.overlay_max_coverage, t.overlay_max_z_index)? {
            out.issue(
                Severity::High,
                IssueCategory::VisualArtifact,
                ElementRef::of(ElementKind::Overlay, element),
                reason,
                element.anchor_or(&format!("<{}>", element.tag)),
            );
        }
    }
    Ok(())
}

fn overlay_reason(
    element: &ElementSnapshot,
    snapshot: &PageSnapshot,
    max_coverage: f64,
    max_z_index: i64,
) -> AuditResult<Option<String>> {
    let rect = element.rect;
    if rect.width >= snapshot.inner_width * max_coverage
        && rect.height >= snapshot.inner_height * max_coverage
    {
        return Ok(Some(format!(
            "{} element covers the viewport: {}x{}px",
            element.style.position,
            fmt_px(rect.width),
            fmt_px(rect.height)
        )));
    }

    if let Some(z) = element.z_index_value()? {
        if z > max_z_index {
            return Ok(Some(format!(
                "{} element stacked above everything: z-index {}",
                element.style.position, z
            )));
        }
    }

    Ok(None)
}
