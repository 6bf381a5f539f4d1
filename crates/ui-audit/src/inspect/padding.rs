//! Component padding minimums: buttons, cards, form fields, hero, footer

use crate::error::AuditResult;
use crate::issue::{ElementKind, ElementRef, Findings, IssueCategory, Severity};
use crate::snapshot::{fmt_px, Sides};

use super::{InspectContext, Inspector};

pub struct PaddingInspector;

impl Inspector for PaddingInspector {
    fn name(&self) -> &'static str {
        "padding"
    }

    fn inspect(&self, ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
        check_buttons(ctx, out)?;
        check_cards(ctx, out)?;
        check_form_fields(ctx, out)?;
        check_hero(ctx, out)?;
        check_footer(ctx, out)?;
        Ok(())
    }
}

fn check_buttons(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let t = ctx.thresholds;
    for button in &ctx.snapshot.buttons {
        let padding = button.padding_sides()?;
        let (x, y) = (padding.horizontal(), padding.vertical());
        if y < t.button_min_padding_y || x < t.button_min_padding_x {
            out.issue(
                Severity::Medium,
                IssueCategory::Padding,
                ElementRef::of(ElementKind::Button, button),
                format!(
                    "Insufficient padding: {}px horizontal, {}px vertical",
                    fmt_px(x),
                    fmt_px(y)
                ),
                button.anchor_or("Unknown button"),
            );
        }
    }
    Ok(())
}

fn check_cards(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let min = ctx.thresholds.card_min_padding;
    let mut paddings: Vec<Sides> = Vec::with_capacity(ctx.snapshot.cards.len());

    for card in &ctx.snapshot.cards {
        let padding = card.padding_sides()?;
        if padding.min() < min {
            out.issue(
                Severity::Medium,
                IssueCategory::Padding,
                ElementRef::of(ElementKind::Card, card),
                format!(
                    "Insufficient padding: {}/{}/{}/{}px",
                    fmt_px(padding.top),
                    fmt_px(padding.right),
                    fmt_px(padding.bottom),
                    fmt_px(padding.left)
                ),
                card.anchor_or("Unknown card"),
            );
        }
        paddings.push(padding);
    }

    if let (Some(first), Some(first_card)) = (paddings.first(), ctx.snapshot.cards.first()) {
        if paddings.iter().any(|p| p != first) {
            out.issue(
                Severity::High,
                IssueCategory::Padding,
                ElementRef::of(ElementKind::Cards, first_card),
                "Inconsistent padding across card components",
                "Multiple cards on page",
            );
        }
    }

    Ok(())
}

fn check_form_fields(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let min = ctx.thresholds.form_field_min_padding_x;
    for field in &ctx.snapshot.form_fields {
        let x = field.padding_sides()?.horizontal();
        if x < min {
            out.issue(
                Severity::Medium,
                IssueCategory::Padding,
                ElementRef::of(ElementKind::FormField, field),
                format!(
                    "Insufficient horizontal padding: {}px (should be at least {}px)",
                    fmt_px(x),
                    fmt_px(min)
                ),
                field.anchor_or("Unknown input"),
            );
        }
    }
    Ok(())
}

fn check_hero(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let Some(hero) = &ctx.snapshot.hero else {
        return Ok(());
    };
    let t = ctx.thresholds;
    let padding = hero.padding_sides()?;
    let element = ElementRef::of(ElementKind::Hero, hero);

    if ctx.is_mobile_width()
        && (padding.left < t.hero_min_padding_x_mobile || padding.right < t.hero_min_padding_x_mobile)
    {
        out.issue(
            Severity::High,
            IssueCategory::Padding,
            element.clone(),
            format!(
                "Insufficient horizontal padding: {}px / {}px (should be at least {}px)",
                fmt_px(padding.left),
                fmt_px(padding.right),
                fmt_px(t.hero_min_padding_x_mobile)
            ),
            hero.anchor_or("Hero section"),
        );
    }

    if padding.top < t.hero_min_padding_y || padding.bottom < t.hero_min_padding_y {
        out.issue(
            Severity::Medium,
            IssueCategory::Padding,
            element,
            format!(
                "Insufficient vertical padding: {}px top / {}px bottom",
                fmt_px(padding.top),
                fmt_px(padding.bottom)
            ),
            hero.anchor_or("Hero section"),
        );
    }

    Ok(())
}

fn check_footer(ctx: &InspectContext<'_>, out: &mut Findings) -> AuditResult<()> {
    let Some(footer) = &ctx.snapshot.footer else {
        return Ok(());
    };
    let vertical = footer.padding_sides()?.vertical();
    if vertical < ctx.thresholds.footer_min_padding_y {
        out.issue(
            Severity::Low,
            IssueCategory::Padding,
            ElementRef::of(ElementKind::Footer, footer),
            format!(
                "Insufficient footer padding: {}px total vertical padding",
                fmt_px(vertical)
            ),
            "Page footer",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::fixtures::Fixture;
    use crate::snapshot::{ElementSnapshot, PageSnapshot};

    fn hero_page(padding: &str) -> PageSnapshot {
        let mut snapshot = PageSnapshot::blank(375.0, 667.0);
        snapshot.hero = Some(
            ElementSnapshot::new("body>main>section", "section")
                .at(0.0, 0.0, 375.0, 600.0)
                .padding(padding),
        );
        snapshot
    }

    #[test]
    fn test_mobile_hero_horizontal_padding_is_high() {
        let fixture = Fixture::mobile(hero_page("48px 12px"));
        let findings = fixture.run(&PaddingInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].severity, Severity::High);
        assert!(findings.issues()[0].issue.contains("12px / 12px"));
    }

    #[test]
    fn test_desktop_hero_only_checks_vertical() {
        let fixture = Fixture::desktop(hero_page("24px 12px"));
        let findings = fixture.run(&PaddingInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].severity, Severity::Medium);
        assert_eq!(
            findings.issues()[0].issue,
            "Insufficient vertical padding: 24px top / 24px bottom"
        );
    }

    #[test]
    fn test_card_padding_and_consistency() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.cards = vec![
            ElementSnapshot::new("body>div:nth-of-type(1)", "div")
                .padding("24px")
                .anchored("Foundation"),
            ElementSnapshot::new("body>div:nth-of-type(2)", "div")
                .padding("12px 24px")
                .anchored("Performance"),
        ];
        let fixture = Fixture::desktop(snapshot);
        let findings = fixture.run(&PaddingInspector);

        let issues = findings.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].issue, "Insufficient padding: 12/24/12/24px");
        assert_eq!(issues[0].location, "Performance");
        assert_eq!(issues[1].severity, Severity::High);
        assert_eq!(issues[1].element.kind, ElementKind::Cards);
    }

    #[test]
    fn test_form_field_horizontal_padding_minimum() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.form_fields = vec![
            ElementSnapshot::new("body>form>input:nth-of-type(1)", "input")
                .padding("8px 11px")
                .anchored("Email address"),
            ElementSnapshot::new("body>form>input:nth-of-type(2)", "input").padding("8px 12px"),
        ];

        let findings = Fixture::desktop(snapshot).run(&PaddingInspector);
        assert_eq!(findings.issues().len(), 1);
        let issue = &findings.issues()[0];
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.element.kind, ElementKind::FormField);
        assert_eq!(
            issue.issue,
            "Insufficient horizontal padding: 22px (should be at least 24px)"
        );
        assert_eq!(issue.location, "Email address");
    }

    #[test]
    fn test_footer_padding_is_low() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.footer = Some(ElementSnapshot::new("body>footer", "footer").padding("24px 32px"));
        let findings = Fixture::desktop(snapshot).run(&PaddingInspector);
        assert_eq!(findings.issues().len(), 1);
        assert_eq!(findings.issues()[0].severity, Severity::Low);
        assert!(findings.issues()[0].issue.contains("48px total"));
    }

    #[test]
    fn test_unparseable_padding_is_an_error() {
        let mut snapshot = PageSnapshot::blank(1440.0, 900.0);
        snapshot.buttons = vec![ElementSnapshot::new("body>button", "button").padding("1rem")];
        let fixture = Fixture::desktop(snapshot);
        let ctx = fixture.ctx();
        let mut out = ctx.findings();
        assert!(PaddingInspector.inspect(&ctx, &mut out).is_err());
    }
}
