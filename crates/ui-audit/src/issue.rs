//! Issue records and named check results

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::ElementSnapshot;

/// Remediation priority bucket, ordered most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// What kind of problem an issue describes; drives the recommendation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    TouchTarget,
    Padding,
    LineHeight,
    FontSize,
    HorizontalOverflow,
    VisualArtifact,
    SectionSpacing,
    ContainerWidth,
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Page,
    Button,
    FormField,
    Card,
    Cards,
    Hero,
    Text,
    Section,
    Badge,
    ParticleLayer,
    Overlay,
    Navigation,
    Footer,
    Containers,
}

impl ElementKind {
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Page => "Page Layout",
            ElementKind::Button => "Button",
            ElementKind::FormField => "Form field",
            ElementKind::Card => "Card",
            ElementKind::Cards => "Cards",
            ElementKind::Hero => "Hero Section",
            ElementKind::Text => "Text element",
            ElementKind::Section => "Section",
            ElementKind::Badge => "Badge",
            ElementKind::ParticleLayer => "Particle layer",
            ElementKind::Overlay => "Overlay",
            ElementKind::Navigation => "Navigation",
            ElementKind::Footer => "Footer",
            ElementKind::Containers => "Containers",
        }
    }
}

/// Structured element identity: grouping key for the report
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ElementKind,
    /// DOM path of the element, or of the document root for page-wide issues
    pub path: String,
}

impl ElementRef {
    pub fn new(kind: ElementKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn of(kind: ElementKind, element: &ElementSnapshot) -> Self {
        Self::new(kind, element.path.clone())
    }

    /// Page-wide issues anchor on the document element
    pub fn page() -> Self {
        Self::new(ElementKind::Page, "html")
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind.label(), self.path)
    }
}

/// One detected problem, carrying everything needed to act on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub severity: Severity,
    pub category: IssueCategory,
    pub element: ElementRef,
    pub issue: String,
    pub location: String,
    pub page: String,
    pub viewport: String,
}

/// A named pass/fail test outside the severity buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub page: String,
    pub viewport: String,
    pub passed: bool,
    pub message: String,
}

/// A page that could not be inspected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageError {
    pub page: String,
    pub viewport: String,
    pub stage: String,
    pub message: String,
}

/// An inspector that errored on one page; its partial output is discarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorFailure {
    pub inspector: String,
    pub page: String,
    pub viewport: String,
    pub message: String,
}

/// A `console.error` message the page logged while it was being audited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleError {
    pub page: String,
    pub viewport: String,
    pub message: String,
}

/// Output buffer handed to a single inspector invocation.
///
/// Stamps page and viewport onto every record, so nothing produced through
/// it can lose its provenance.
#[derive(Debug)]
pub struct Findings {
    page: String,
    viewport: String,
    issues: Vec<IssueRecord>,
    checks: Vec<CheckResult>,
}

impl Findings {
    pub fn new(page: impl Into<String>, viewport: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            viewport: viewport.into(),
            issues: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn issue(
        &mut self,
        severity: Severity,
        category: IssueCategory,
        element: ElementRef,
        issue: impl Into<String>,
        location: impl Into<String>,
    ) {
        self.issues.push(IssueRecord {
            severity,
            category,
            element,
            issue: issue.into(),
            location: location.into(),
            page: self.page.clone(),
            viewport: self.viewport.clone(),
        });
    }

    pub fn check(&mut self, name: impl Into<String>, passed: bool, message: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.into(),
            page: self.page.clone(),
            viewport: self.viewport.clone(),
            passed,
            message: message.into(),
        });
    }

    /// Fresh, empty buffer for the same page and viewport
    pub fn sibling(&self) -> Self {
        Self::new(self.page.clone(), self.viewport.clone())
    }

    pub fn absorb(&mut self, other: Findings) {
        self.issues.extend(other.issues);
        self.checks.extend(other.checks);
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn into_parts(self) -> (Vec<IssueRecord>, Vec<CheckResult>) {
        (self.issues, self.checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium, Severity::High];
        severities.sort();
        assert_eq!(severities, Severity::ALL.to_vec());
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_findings_stamp_provenance() {
        let mut findings = Findings::new("Homepage", "mobile");
        findings.issue(
            Severity::Critical,
            IssueCategory::HorizontalOverflow,
            ElementRef::page(),
            "Horizontal scrolling detected at 375px width",
            "Overall page layout",
        );
        findings.check("viewport constraint", true, "fits");

        let (issues, checks) = findings.into_parts();
        assert_eq!(issues[0].page, "Homepage");
        assert_eq!(issues[0].viewport, "mobile");
        assert_eq!(checks[0].viewport, "mobile");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"high\"");
    }
}
