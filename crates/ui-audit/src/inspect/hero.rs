//! Hero checks: geometry against the viewport height, and whether its
//! content is readable without scrolling

use crate::error::AuditResult;
use crate::issue::Findings;
use crate::snapshot::{fmt_px, ElementSnapshot, PageSnapshot};

use super::{InspectContext, Inspector};

pub const VIEWPORT_CONSTRAINT: &str = "viewport constraint";
pub const CONTENT_VISIBILITY: &str = "content visibility";

/// Reports a named check rather than bucketed issues: the hero must fit
/// inside the window with no vertical scrollbar.
pub struct HeroGeometryInspector;

impl Inspector for HeroGeometryInspector {
    fn name(&self) -> &'static str {
        "hero-geometry"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        let snapshot = ctx.snapshot;
        let Some(hero) = &snapshot.hero else {
            out.check(VIEWPORT_CONSTRAINT, false, "Hero section not found");
            return Ok(());
        };

        let height = hero.rect.height.round();
        let window = snapshot.inner_height;
        let fits = height <= window;
        let scrollbar = snapshot.has_vertical_scrollbar();

        let message = match (fits, scrollbar) {
            (true, false) => format!(
                "Hero height: {}px, window: {}px, scrollbar: no",
                fmt_px(height),
                fmt_px(window)
            ),
            (false, _) => format!(
                "Hero height {}px exceeds window height {}px by {}px{}",
                fmt_px(height),
                fmt_px(window),
                fmt_px(height - window),
                if scrollbar { ", vertical scrollbar present" } else { "" }
            ),
            (true, true) => format!(
                "Hero height {}px fits window height {}px but a vertical scrollbar is present",
                fmt_px(height),
                fmt_px(window)
            ),
        };

        out.check(VIEWPORT_CONSTRAINT, fits && !scrollbar, message);
        Ok(())
    }
}

/// Headline and subheading entirely above the fold, plus enough call-to-action
/// buttons fully on the first screen. Pages without a hero are skipped.
pub struct HeroContentInspector;

fn visibility(snapshot: &PageSnapshot, element: Option<&ElementSnapshot>) -> &'static str {
    match element {
        Some(el) if snapshot.above_the_fold(&el.rect) => "visible",
        Some(_) => "cut off",
        None => "missing",
    }
}

impl Inspector for HeroContentInspector {
    fn name(&self) -> &'static str {
        "hero-content"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        let snapshot = ctx.snapshot;
        if snapshot.hero.is_none() {
            return Ok(());
        }

        let headline = visibility(snapshot, snapshot.headline.as_ref());
        let subheading = visibility(snapshot, snapshot.subheading.as_ref());
        let visible_ctas = snapshot
            .ctas
            .iter()
            .filter(|cta| cta.is_rendered() && snapshot.above_the_fold(&cta.rect))
            .count();
        let required = ctx.thresholds.min_visible_ctas;

        let passed = headline == "visible" && subheading == "visible" && visible_ctas >= required;
        out.check(
            CONTENT_VISIBILITY,
            passed,
            format!(
                "Headline: {}, subheading: {}, CTA buttons visible: {} (minimum {})",
                headline, subheading, visible_ctas, required
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::fixtures::Fixture;
    use crate::snapshot::{ElementSnapshot, PageSnapshot};

    fn with_hero(height: f64) -> PageSnapshot {
        let mut snapshot = PageSnapshot::blank(375.0, 667.0);
        snapshot.hero =
            Some(ElementSnapshot::new("body>section", "section").at(0.0, 0.0, 375.0, height));
        snapshot
    }

    #[test]
    fn test_hero_that_fits_passes() {
        let findings = Fixture::mobile(with_hero(500.0)).run(&HeroGeometryInspector);
        assert_eq!(findings.checks().len(), 1);
        assert!(findings.checks()[0].passed);
        assert!(findings.issues().is_empty());
    }

    #[test]
    fn test_tall_hero_fails_with_mismatch() {
        let mut snapshot = with_hero(700.0);
        snapshot.scroll_height = 700.0;
        let findings = Fixture::mobile(snapshot).run(&HeroGeometryInspector);
        let check = &findings.checks()[0];
        assert!(!check.passed);
        assert_eq!(check.name, VIEWPORT_CONSTRAINT);
        assert!(check.message.contains("700px exceeds window height 667px by 33px"));
    }

    #[test]
    fn test_hero_that_fits_but_scrolls_fails() {
        let mut snapshot = with_hero(600.0);
        snapshot.scroll_height = 1800.0;
        let findings = Fixture::mobile(snapshot).run(&HeroGeometryInspector);
        let check = &findings.checks()[0];
        assert!(!check.passed);
        assert_eq!(
            check.message,
            "Hero height 600px fits window height 667px but a vertical scrollbar is present"
        );
    }

    fn with_content(cta_tops: &[f64]) -> PageSnapshot {
        let mut snapshot = with_hero(600.0);
        snapshot.headline = Some(ElementSnapshot::new("body>section>h1", "h1").at(16.0, 120.0, 343.0, 80.0));
        snapshot.subheading =
            Some(ElementSnapshot::new("body>section>p", "p").at(16.0, 220.0, 343.0, 60.0));
        snapshot.ctas = cta_tops
            .iter()
            .enumerate()
            .map(|(i, top)| {
                ElementSnapshot::new(format!("body>section>a:nth-of-type({})", i + 1), "a")
                    .at(16.0, *top, 160.0, 48.0)
            })
            .collect();
        snapshot
    }

    #[test]
    fn test_hero_content_visible() {
        let findings = Fixture::mobile(with_content(&[320.0, 380.0])).run(&HeroContentInspector);
        let check = &findings.checks()[0];
        assert_eq!(check.name, CONTENT_VISIBILITY);
        assert!(check.passed, "{}", check.message);
        assert_eq!(
            check.message,
            "Headline: visible, subheading: visible, CTA buttons visible: 2 (minimum 2)"
        );
    }

    #[test]
    fn test_cta_below_the_fold_fails() {
        // second button straddles the bottom edge of the 667px window
        let findings = Fixture::mobile(with_content(&[320.0, 640.0])).run(&HeroContentInspector);
        let check = &findings.checks()[0];
        assert!(!check.passed);
        assert!(check.message.ends_with("CTA buttons visible: 1 (minimum 2)"));
    }

    #[test]
    fn test_cut_off_or_missing_headline_fails() {
        let mut snapshot = with_content(&[320.0, 380.0]);
        snapshot.headline.as_mut().unwrap().rect.y = -20.0;
        snapshot.subheading = None;
        let findings = Fixture::mobile(snapshot).run(&HeroContentInspector);
        let check = &findings.checks()[0];
        assert!(!check.passed);
        assert!(check.message.starts_with("Headline: cut off, subheading: missing"));
    }

    #[test]
    fn test_page_without_hero_has_no_content_check() {
        let findings = Fixture::mobile(PageSnapshot::blank(375.0, 667.0)).run(&HeroContentInspector);
        assert!(findings.checks().is_empty());
    }

    #[test]
    fn test_missing_hero_fails() {
        let findings = Fixture::mobile(PageSnapshot::blank(375.0, 667.0)).run(&HeroGeometryInspector);
        assert!(!findings.checks()[0].passed);
    }
}
