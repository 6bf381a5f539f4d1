//! Severity-bucketed issue store
//!
//! The runner owns one aggregator for the whole sweep and feeds it every
//! page's results in order. Nothing else holds mutable issue state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::issue::{
    CheckResult, ConsoleError, ElementRef, IssueCategory, IssueRecord, InspectorFailure, PageError,
    Severity,
};

/// Issues sharing a page and an exact element identity
pub type ElementGroups<'a> = BTreeMap<(&'a str, &'a ElementRef), Vec<&'a IssueRecord>>;

/// Group issues by (page, element). The same DOM path on two pages is two
/// different elements.
pub fn group_by_element<'a>(issues: impl IntoIterator<Item = &'a IssueRecord>) -> ElementGroups<'a> {
    let mut groups: ElementGroups<'a> = BTreeMap::new();
    for issue in issues {
        groups
            .entry((issue.page.as_str(), &issue.element))
            .or_default()
            .push(issue);
    }
    groups
}

/// Per-severity issue counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueAggregator {
    buckets: BTreeMap<Severity, Vec<IssueRecord>>,
    checks: Vec<CheckResult>,
    page_errors: Vec<PageError>,
    inspector_failures: Vec<InspectorFailure>,
    console_errors: Vec<ConsoleError>,
    pages_inspected: usize,
}

impl IssueAggregator {
    pub fn new() -> Self {
        let mut buckets = BTreeMap::new();
        for severity in Severity::ALL {
            buckets.insert(severity, Vec::new());
        }
        Self {
            buckets,
            ..Default::default()
        }
    }

    pub fn add_issue(&mut self, issue: IssueRecord) {
        self.buckets.entry(issue.severity).or_default().push(issue);
    }

    pub fn add_check(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn add_page_error(&mut self, error: PageError) {
        self.page_errors.push(error);
    }

    pub fn add_inspector_failure(&mut self, failure: InspectorFailure) {
        self.inspector_failures.push(failure);
    }

    pub fn add_console_error(&mut self, error: ConsoleError) {
        self.console_errors.push(error);
    }

    /// Count a page whose snapshot reached the inspectors
    pub fn mark_page_inspected(&mut self) {
        self.pages_inspected += 1;
    }

    pub fn bucket(&self, severity: Severity) -> &[IssueRecord] {
        self.buckets
            .get(&severity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, severity: Severity, category: IssueCategory) -> bool {
        self.bucket(severity).iter().any(|i| i.category == category)
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts {
            critical: self.bucket(Severity::Critical).len(),
            high: self.bucket(Severity::High).len(),
            medium: self.bucket(Severity::Medium).len(),
            low: self.bucket(Severity::Low).len(),
        }
    }

    pub fn issues_by_severity(&self) -> &BTreeMap<Severity, Vec<IssueRecord>> {
        &self.buckets
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn page_errors(&self) -> &[PageError] {
        &self.page_errors
    }

    pub fn inspector_failures(&self) -> &[InspectorFailure] {
        &self.inspector_failures
    }

    pub fn console_errors(&self) -> &[ConsoleError] {
        &self.console_errors
    }

    pub fn pages_inspected(&self) -> usize {
        self.pages_inspected
    }
}
