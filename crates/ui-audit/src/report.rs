//! Final report: summary counts, grouped listing and recommendations

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::aggregate::{group_by_element, IssueAggregator, SeverityCounts};
use crate::error::{AuditError, AuditResult};
use crate::issue::{
    CheckResult, ConsoleError, InspectorFailure, IssueCategory, IssueRecord, PageError, Severity,
};
use crate::plan::AuditPlan;
use crate::visual::VisualDiffResult;

/// Advisory fix derived from which issue categories fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub priority: Severity,
    pub files_to_modify: Vec<String>,
    pub solution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Condition under which a recommendation rule fires
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Any issue of this severity and category
    Category(Severity, IssueCategory),
    /// Any issue of this severity from a mobile viewport
    MobileViewport(Severity),
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationRule {
    pub title: &'static str,
    pub priority: Severity,
    pub files: &'static [&'static str],
    pub solution: &'static str,
    pub example: Option<&'static str>,
    pub trigger: Trigger,
}

/// Static rule table; every rule is evaluated independently
pub const RULES: &[RecommendationRule] = &[
    RecommendationRule {
        title: "Fix Mobile Touch Targets",
        priority: Severity::Critical,
        files: &["components/ui/button.tsx", "app/globals.css"],
        solution: "Ensure all interactive elements are at least 44x44px on mobile",
        example: Some("className={cn(\"min-h-[44px] px-6 py-3\", \"touch-manipulation\", className)}"),
        trigger: Trigger::Category(Severity::Critical, IssueCategory::TouchTarget),
    },
    RecommendationRule {
        title: "Fix Horizontal Overflow",
        priority: Severity::Critical,
        files: &["app/globals.css"],
        solution: "Add overflow-x-hidden to body and ensure all content respects viewport width",
        example: Some("body {\n  overflow-x: hidden;\n  max-width: 100vw;\n}"),
        trigger: Trigger::Category(Severity::Critical, IssueCategory::HorizontalOverflow),
    },
    RecommendationRule {
        title: "Standardize Component Padding",
        priority: Severity::High,
        files: &["tailwind.config.ts"],
        solution: "Create a consistent spacing scale and apply it across all components",
        example: Some("spacing: {\n  card: '1.5rem',\n  section: '4rem',\n  mobile: '1rem',\n}"),
        trigger: Trigger::Category(Severity::High, IssueCategory::Padding),
    },
    RecommendationRule {
        title: "Improve Text Readability",
        priority: Severity::Medium,
        files: &["app/globals.css"],
        solution: "Set proper line-height for all text elements",
        example: Some("p, li { line-height: 1.6; }\nh1, h2, h3 { line-height: 1.3; }"),
        trigger: Trigger::Category(Severity::Medium, IssueCategory::LineHeight),
    },
    RecommendationRule {
        title: "Enhance Mobile Experience",
        priority: Severity::High,
        files: &["app/globals.css", "components/navigation.tsx"],
        solution: "Apply mobile-first responsive design patterns",
        example: Some(
            "@media (max-width: 768px) {\n  .container { padding: 1rem; }\n  .card { padding: 1.5rem; }\n  .section { padding: 3rem 1rem; }\n}",
        ),
        trigger: Trigger::MobileViewport(Severity::High),
    },
    RecommendationRule {
        title: "Anchor Floating Badges",
        priority: Severity::High,
        files: &["components/hero.tsx"],
        solution: "Render achievement badges in normal flow after the hero instead of fixed or absolute over it",
        example: None,
        trigger: Trigger::Category(Severity::High, IssueCategory::VisualArtifact),
    },
    RecommendationRule {
        title: "Normalize Section Rhythm",
        priority: Severity::Medium,
        files: &["app/globals.css"],
        solution: "Use one vertical padding scale for sections (py-12 mobile, py-16 desktop)",
        example: Some("section { @apply py-12 lg:py-16; }"),
        trigger: Trigger::Category(Severity::Medium, IssueCategory::SectionSpacing),
    },
];

impl RecommendationRule {
    fn fires(&self, aggregator: &IssueAggregator, mobile_viewports: &HashSet<String>) -> bool {
        match self.trigger {
            Trigger::Category(severity, category) => aggregator.has(severity, category),
            Trigger::MobileViewport(severity) => aggregator
                .bucket(severity)
                .iter()
                .any(|i| mobile_viewports.contains(&i.viewport)),
        }
    }

    fn to_recommendation(self) -> Recommendation {
        Recommendation {
            title: self.title.to_string(),
            priority: self.priority,
            files_to_modify: self.files.iter().map(|f| f.to_string()).collect(),
            solution: self.solution.to_string(),
            example: self.example.map(String::from),
        }
    }
}

/// Evaluate the rule table against the collected issues
pub fn recommendations(
    aggregator: &IssueAggregator,
    mobile_viewports: &HashSet<String>,
) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter(|rule| rule.fires(aggregator, mobile_viewports))
        .map(|rule| rule.to_recommendation())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(flatten)]
    pub counts: SeverityCounts,
    pub total_issues: usize,
    pub pages_inspected: usize,
    pub pages_failed: usize,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub inspector_failures: usize,
    pub visual_mismatches: usize,
    /// Informational; console errors never fail the audit
    #[serde(default)]
    pub console_errors: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub base_url: String,
    pub viewports: Vec<String>,
    pub pages: Vec<String>,
    pub summary: ReportSummary,
    pub issues_by_severity: BTreeMap<Severity, Vec<IssueRecord>>,
    pub checks: Vec<CheckResult>,
    pub page_errors: Vec<PageError>,
    pub inspector_failures: Vec<InspectorFailure>,
    #[serde(default)]
    pub console_errors: Vec<ConsoleError>,
    pub visual_diffs: Vec<VisualDiffResult>,
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    pub fn build(
        plan: &AuditPlan,
        aggregator: &IssueAggregator,
        visual_diffs: Vec<VisualDiffResult>,
    ) -> Self {
        let counts = aggregator.counts();
        let checks_failed = aggregator.checks().iter().filter(|c| !c.passed).count();
        let visual_mismatches = visual_diffs.iter().filter(|d| !d.matches).count();
        let pages_failed = aggregator.page_errors().len();

        let summary = ReportSummary {
            counts,
            total_issues: counts.total(),
            pages_inspected: aggregator.pages_inspected(),
            pages_failed,
            checks_passed: aggregator.checks().len() - checks_failed,
            checks_failed,
            inspector_failures: aggregator.inspector_failures().len(),
            visual_mismatches,
            console_errors: aggregator.console_errors().len(),
            passed: counts.critical == 0
                && checks_failed == 0
                && pages_failed == 0
                && visual_mismatches == 0,
        };

        Self {
            generated_at: Utc::now(),
            base_url: plan.base_url.clone(),
            viewports: plan.viewports.iter().map(|v| v.name.clone()).collect(),
            pages: plan.pages.iter().map(|p| p.name.clone()).collect(),
            summary,
            issues_by_severity: aggregator.issues_by_severity().clone(),
            checks: aggregator.checks().to_vec(),
            page_errors: aggregator.page_errors().to_vec(),
            inspector_failures: aggregator.inspector_failures().to_vec(),
            console_errors: aggregator.console_errors().to_vec(),
            visual_diffs,
            recommendations: recommendations(aggregator, &plan.mobile_viewports()),
        }
    }

    pub fn passed(&self) -> bool {
        self.summary.passed
    }

    /// Persist the report as pretty JSON. Failure here is fatal for the run.
    pub fn write(&self, path: &Path) -> AuditResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let to_write_error = |source| AuditError::ReportWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_write_error)?;
        }
        fs::write(path, json).map_err(to_write_error)?;

        info!("Report written to: {}", path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> AuditResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Human-readable listing: severity buckets, grouped by page and element
    pub fn render_console(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{}", "UI ANALYSIS REPORT".bold());
        let _ = writeln!(out, "{}", rule);

        for severity in Severity::ALL {
            let issues = self
                .issues_by_severity
                .get(&severity)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if issues.is_empty() {
                continue;
            }

            let heading = format!("{} PRIORITY ISSUES ({})", severity, issues.len());
            let heading = match severity {
                Severity::Critical => heading.red().bold(),
                Severity::High => heading.yellow().bold(),
                Severity::Medium => heading.cyan().bold(),
                Severity::Low => heading.normal(),
            };
            let _ = writeln!(out, "\n{}", heading);
            let _ = writeln!(out, "{}", "-".repeat(60));

            for ((page, element), grouped) in group_by_element(issues) {
                let _ = writeln!(out, "\n  {} on {}:", element, page);
                for issue in grouped {
                    let _ = writeln!(out, "     • {}", issue.issue);
                    let _ = writeln!(out, "       Location: {}", issue.location);
                    let _ = writeln!(
                        out,
                        "       Page: {} | Viewport: {}",
                        issue.page, issue.viewport
                    );
                }
            }
        }

        if !self.checks.is_empty() {
            let _ = writeln!(out, "\n{}", "CHECKS".bold());
            for check in &self.checks {
                let mark = if check.passed { "PASSED".green() } else { "FAILED".red() };
                let _ = writeln!(
                    out,
                    "  [{}] {} - {} ({}): {}",
                    mark, check.name, check.page, check.viewport, check.message
                );
            }
        }

        if !self.page_errors.is_empty() {
            let _ = writeln!(out, "\n{}", "PAGE ERRORS".red().bold());
            for error in &self.page_errors {
                let _ = writeln!(
                    out,
                    "  {} ({}) during {}: {}",
                    error.page, error.viewport, error.stage, error.message
                );
            }
        }

        if !self.console_errors.is_empty() {
            let _ = writeln!(out, "\n{}", "CONSOLE ERRORS".yellow().bold());
            let mut by_page: BTreeMap<(&str, &str), Vec<&str>> = BTreeMap::new();
            for error in &self.console_errors {
                by_page
                    .entry((error.page.as_str(), error.viewport.as_str()))
                    .or_default()
                    .push(error.message.as_str());
            }
            for ((page, viewport), messages) in by_page {
                let _ = writeln!(out, "  {} ({}): {}", page, viewport, messages.len());
                for message in messages {
                    let _ = writeln!(out, "     • {}", message);
                }
            }
        }

        if !self.recommendations.is_empty() {
            let _ = writeln!(out, "\n{}", rule);
            let _ = writeln!(out, "{}", "RECOMMENDED FIXES (PRIORITY ORDER)".bold());
            let _ = writeln!(out, "{}", rule);
            for (index, rec) in self.recommendations.iter().enumerate() {
                let _ = writeln!(out, "\n{}. {}", index + 1, rec.title);
                let _ = writeln!(out, "   Priority: {}", rec.priority);
                let _ = writeln!(out, "   Files to modify: {}", rec.files_to_modify.join(", "));
                let _ = writeln!(out, "   Solution: {}", rec.solution);
                if let Some(example) = &rec.example {
                    let _ = writeln!(out, "   Example:");
                    for line in example.lines() {
                        let _ = writeln!(out, "     {}", line);
                    }
                }
            }
        }

        let _ = writeln!(out, "\n{}", self.summary_table());
        let verdict = if self.passed() {
            "AUDIT PASSED".green().bold()
        } else {
            "AUDIT FAILED".red().bold()
        };
        let _ = writeln!(out, "{}", verdict);
        out
    }

    pub fn summary_table(&self) -> Table {
        let s = &self.summary;
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Metric", "Count"]);
        for (metric, value) in [
            ("Critical", s.counts.critical),
            ("High", s.counts.high),
            ("Medium", s.counts.medium),
            ("Low", s.counts.low),
            ("Total issues", s.total_issues),
            ("Pages inspected", s.pages_inspected),
            ("Pages failed", s.pages_failed),
            ("Checks passed", s.checks_passed),
            ("Checks failed", s.checks_failed),
            ("Inspector failures", s.inspector_failures),
            ("Visual mismatches", s.visual_mismatches),
            ("Console errors", s.console_errors),
        ] {
            table.add_row(vec![metric.to_string(), value.to_string()]);
        }
        table
    }
}
