//! Declarative YAML audit plan
//!
//! A plan names the site under test, the viewport matrix, the pages to
//! visit, the selector groups the browser collects and the thresholds the
//! inspectors apply. Every field has a default, so an empty document is the
//! built-in plan.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, AuditResult};

/// A complete audit plan parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPlan {
    /// Base URL of the site under test
    pub base_url: String,

    /// Browser engine to launch
    pub browser: Browser,

    /// Viewport matrix, visited in order
    pub viewports: Vec<ViewportConfig>,

    /// Pages visited in every viewport
    pub pages: Vec<PageTarget>,

    /// Selector groups collected from each page
    pub selectors: SelectorSet,

    /// Inspector thresholds
    pub thresholds: Thresholds,

    /// Navigation timing
    pub navigation: NavigationConfig,

    /// Output locations
    pub output: OutputConfig,

    /// Screenshot baseline comparison
    pub visual: VisualSettings,
}

impl Default for AuditPlan {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            browser: Browser::default(),
            viewports: default_viewports(),
            pages: default_pages(),
            selectors: SelectorSet::default(),
            thresholds: Thresholds::default(),
            navigation: NavigationConfig::default(),
            output: OutputConfig::default(),
            visual: VisualSettings::default(),
        }
    }
}

fn default_viewports() -> Vec<ViewportConfig> {
    vec![
        ViewportConfig {
            name: "mobile".to_string(),
            label: Some("Mobile (iPhone SE)".to_string()),
            width: 375,
            height: 667,
            is_mobile: true,
            has_touch: true,
            device_scale_factor: 2.0,
        },
        ViewportConfig {
            name: "tablet".to_string(),
            label: Some("Tablet (iPad)".to_string()),
            width: 768,
            height: 1024,
            is_mobile: false,
            has_touch: true,
            device_scale_factor: 2.0,
        },
        ViewportConfig {
            name: "desktop".to_string(),
            label: Some("Desktop (MacBook)".to_string()),
            width: 1440,
            height: 900,
            is_mobile: false,
            has_touch: false,
            device_scale_factor: 1.0,
        },
    ]
}

fn default_pages() -> Vec<PageTarget> {
    [
        ("/", "Homepage"),
        ("/about", "About"),
        ("/services", "Services"),
        ("/results", "Results"),
        ("/contact", "Contact"),
        ("/privacy-policy", "Privacy Policy"),
        ("/terms", "Terms"),
    ]
    .into_iter()
    .map(|(url, name)| PageTarget {
        url: url.to_string(),
        name: name.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// A named device class in the viewport matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Short key, used in screenshot names and issue provenance
    pub name: String,

    /// Display label for the console report
    #[serde(default)]
    pub label: Option<String>,

    pub width: u32,
    pub height: u32,

    #[serde(default)]
    pub is_mobile: bool,

    #[serde(default)]
    pub has_touch: bool,

    #[serde(default = "default_scale_factor")]
    pub device_scale_factor: f64,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl ViewportConfig {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether the mobile-only heuristics apply at this width
    pub fn is_mobile_width(&self, thresholds: &Thresholds) -> bool {
        self.width < thresholds.mobile_breakpoint
    }
}

/// A page visited in every viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTarget {
    /// Path relative to the base URL
    pub url: String,
    pub name: String,
}

impl PageTarget {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Lowercase a name and collapse every non-alphanumeric run into a dash
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// CSS selector lists for each element group the browser collects.
///
/// Most lists are joined with `, ` into a single `querySelectorAll` call, so
/// an element matched by two selectors of one group is collected once. The
/// headline and subheading lists are tried one selector at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub interactive: Vec<String>,
    pub buttons: Vec<String>,
    pub form_fields: Vec<String>,
    pub cards: Vec<String>,
    pub hero: Vec<String>,
    pub text: Vec<String>,
    pub sections: Vec<String>,
    pub badges: Vec<String>,
    pub particles: Vec<String>,
    pub navigation: Vec<String>,
    pub footer: Vec<String>,
    pub containers: Vec<String>,
    /// Tried in order; the first match with text is the headline
    pub headline: Vec<String>,
    /// Tried in order; the first long text in the top half is the subheading
    pub subheading: Vec<String>,
    pub cta: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            interactive: strings(&[
                "button",
                "a[class*=\"button\"]",
                "a[class*=\"btn\"]",
                "[role=\"button\"]",
                "input:not([type=\"hidden\"])",
                "textarea",
                "select",
            ]),
            buttons: strings(&[
                "button",
                "a[class*=\"button\"]",
                "a[class*=\"btn\"]",
                "[role=\"button\"]",
            ]),
            form_fields: strings(&["input:not([type=\"hidden\"])", "textarea", "select"]),
            cards: strings(&["[class*=\"card\"]", "[class*=\"Card\"]"]),
            hero: strings(&[
                ".hero-section",
                "[data-hero]",
                "[class*=\"hero\"]",
                "header + section",
                "main > section:first-child",
            ]),
            text: strings(&["p", "li", "span"]),
            sections: strings(&["section", "main > div"]),
            badges: strings(&["[class*=\"badge\"]", "[class*=\"achievement\"]"]),
            particles: strings(&["[class*=\"particle\"]", "canvas"]),
            navigation: strings(&["nav"]),
            footer: strings(&["footer"]),
            containers: strings(&["[class*=\"container\"]", "[class*=\"max-w\"]"]),
            headline: strings(&["h1", "[class*=\"headline\"]", "[class*=\"title\"]"]),
            subheading: strings(&[
                "h2",
                "[class*=\"subheading\"]",
                "[class*=\"subtitle\"]",
                "p",
            ]),
            cta: strings(&["button", "a[class*=\"btn\"]", "[class*=\"cta\"]"]),
        }
    }
}

impl SelectorSet {
    /// Named groups in collection order
    pub fn groups(&self) -> [(&'static str, &[String]); 15] {
        [
            ("interactive", self.interactive.as_slice()),
            ("buttons", self.buttons.as_slice()),
            ("form_fields", self.form_fields.as_slice()),
            ("cards", self.cards.as_slice()),
            ("hero", self.hero.as_slice()),
            ("text", self.text.as_slice()),
            ("sections", self.sections.as_slice()),
            ("badges", self.badges.as_slice()),
            ("particles", self.particles.as_slice()),
            ("navigation", self.navigation.as_slice()),
            ("footer", self.footer.as_slice()),
            ("containers", self.containers.as_slice()),
            ("headline", self.headline.as_slice()),
            ("subheading", self.subheading.as_slice()),
            ("cta", self.cta.as_slice()),
        ]
    }
}

/// Numeric limits applied by the inspectors.
///
/// Minimums are inclusive: a value equal to the minimum passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Viewports narrower than this get the mobile-only checks
    pub mobile_breakpoint: u32,
    pub min_touch_target: f64,
    pub button_min_padding_x: f64,
    pub button_min_padding_y: f64,
    pub card_min_padding: f64,
    pub form_field_min_padding_x: f64,
    pub hero_min_padding_x_mobile: f64,
    pub hero_min_padding_y: f64,
    pub footer_min_padding_y: f64,
    pub min_line_height_ratio: f64,
    pub min_font_size_mobile: f64,
    pub section_min_spacing: f64,
    /// Allowed deviation of a section gap from the mean, as a fraction of the mean
    pub section_spacing_tolerance: f64,
    pub max_container_widths: usize,
    pub nav_min_height_mobile: f64,
    /// Fraction of the viewport a positioned element may cover before it is an overlay
    pub overlay_max_coverage: f64,
    pub overlay_max_z_index: i64,
    /// CTA buttons that must be fully inside the first screen
    pub min_visible_ctas: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768,
            min_touch_target: 44.0,
            button_min_padding_x: 24.0,
            button_min_padding_y: 16.0,
            card_min_padding: 16.0,
            form_field_min_padding_x: 24.0,
            hero_min_padding_x_mobile: 16.0,
            hero_min_padding_y: 32.0,
            footer_min_padding_y: 64.0,
            min_line_height_ratio: 1.4,
            min_font_size_mobile: 14.0,
            section_min_spacing: 48.0,
            section_spacing_tolerance: 0.5,
            max_container_widths: 3,
            nav_min_height_mobile: 56.0,
            overlay_max_coverage: 0.9,
            overlay_max_z_index: 9999,
            min_visible_ctas: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Timeout for `goto` with the network-idle wait
    pub timeout_ms: u64,

    /// Fixed wait after navigation so transitions finish before measuring
    pub settle_ms: u64,

    /// How long the preflight waits for the site to answer
    pub preflight_timeout_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            settle_ms: 1_000,
            preflight_timeout_ms: 10_000,
        }
    }
}

/// Output locations. Any path left out of the YAML is derived from `dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OutputPaths")]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub journal: PathBuf,
    pub report: PathBuf,
}

/// `output` as written in YAML, before unset paths are derived
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputPaths {
    dir: Option<PathBuf>,
    screenshot_dir: Option<PathBuf>,
    journal: Option<PathBuf>,
    report: Option<PathBuf>,
}

impl From<OutputPaths> for OutputConfig {
    fn from(raw: OutputPaths) -> Self {
        let rooted = Self::rooted_at(raw.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)));
        Self {
            screenshot_dir: raw.screenshot_dir.unwrap_or(rooted.screenshot_dir),
            journal: raw.journal.unwrap_or(rooted.journal),
            report: raw.report.unwrap_or(rooted.report),
            dir: rooted.dir,
        }
    }
}

const DEFAULT_OUTPUT_DIR: &str = "ui-analysis";

impl Default for OutputConfig {
    fn default() -> Self {
        Self::rooted_at(DEFAULT_OUTPUT_DIR)
    }
}

impl OutputConfig {
    /// Re-root every output path under `dir`
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            screenshot_dir: dir.join("screenshots"),
            journal: dir.join("issues.jsonl"),
            report: dir.join("ui-audit-report.json"),
            dir,
        }
    }

    /// Deterministic screenshot path for a page in a viewport
    pub fn screenshot_path(&self, viewport: &ViewportConfig, page: &PageTarget) -> PathBuf {
        self.screenshot_dir
            .join(screenshot_name(viewport, page))
            .with_extension("png")
    }
}

/// `{viewport}-{page}` stem shared by screenshots and baselines
pub fn screenshot_name(viewport: &ViewportConfig, page: &PageTarget) -> String {
    format!("{}-{}", slugify(&viewport.name), page.slug())
}

/// Baseline comparison settings. Unset directories live under the output dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_dir: Option<PathBuf>,
    /// Allowed share of differing pixels (0.0 - 100.0 percent)
    pub threshold: f64,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            baseline_dir: None,
            diff_dir: None,
            threshold: 0.5,
        }
    }
}

impl AuditPlan {
    /// Parse a plan from a YAML string
    pub fn from_yaml(yaml: &str) -> AuditResult<Self> {
        // An empty document deserializes to unit, not to an empty map.
        let plan: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Parse a plan from a YAML file
    pub fn from_file(path: &Path) -> AuditResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject plans the runner cannot execute
    pub fn validate(&self) -> AuditResult<()> {
        if self.viewports.is_empty() {
            return Err(AuditError::InvalidPlan("no viewports configured".into()));
        }
        if self.pages.is_empty() {
            return Err(AuditError::InvalidPlan("no pages configured".into()));
        }

        let mut seen = HashSet::new();
        for viewport in &self.viewports {
            if viewport.width == 0 || viewport.height == 0 {
                return Err(AuditError::InvalidPlan(format!(
                    "viewport '{}' has a zero dimension",
                    viewport.name
                )));
            }
            if viewport.device_scale_factor <= 0.0 {
                return Err(AuditError::InvalidPlan(format!(
                    "viewport '{}' has a non-positive device scale factor",
                    viewport.name
                )));
            }
            if !seen.insert(slugify(&viewport.name)) {
                return Err(AuditError::InvalidPlan(format!(
                    "duplicate viewport name '{}'",
                    viewport.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.slug()) {
                return Err(AuditError::InvalidPlan(format!(
                    "duplicate page name '{}'",
                    page.name
                )));
            }
        }

        let t = &self.thresholds;
        if t.min_touch_target <= 0.0 || t.min_line_height_ratio <= 0.0 || t.min_font_size_mobile <= 0.0 {
            return Err(AuditError::InvalidPlan(
                "size thresholds must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&t.overlay_max_coverage) || t.section_spacing_tolerance < 0.0 {
            return Err(AuditError::InvalidPlan(
                "fractional thresholds out of range".into(),
            ));
        }

        Ok(())
    }

    /// Absolute URL of a page
    pub fn page_url(&self, page: &PageTarget) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), page.url)
    }

    pub fn baseline_dir(&self) -> PathBuf {
        self.visual
            .baseline_dir
            .clone()
            .unwrap_or_else(|| self.output.dir.join("baselines"))
    }

    pub fn diff_dir(&self) -> PathBuf {
        self.visual
            .diff_dir
            .clone()
            .unwrap_or_else(|| self.output.dir.join("diffs"))
    }

    /// Move every output, including baselines and diffs, under `dir`
    pub fn reroot_output(&mut self, dir: impl Into<PathBuf>) {
        self.output = OutputConfig::rooted_at(dir);
        self.visual.baseline_dir = None;
        self.visual.diff_dir = None;
    }

    /// Names of the viewports the mobile-only checks apply to
    pub fn mobile_viewports(&self) -> HashSet<String> {
        self.viewports
            .iter()
            .filter(|v| v.is_mobile || v.is_mobile_width(&self.thresholds))
            .map(|v| v.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default_plan() {
        let plan = AuditPlan::from_yaml("").unwrap();
        assert_eq!(plan.viewports.len(), 3);
        assert_eq!(plan.pages.len(), 7);
        assert_eq!(plan.navigation.timeout_ms, 30_000);
        assert_eq!(plan.thresholds.min_touch_target, 44.0);
    }

    #[test]
    fn test_parse_partial_plan() {
        let yaml = r#"
base_url: http://127.0.0.1:4000/
viewports:
  - name: phone
    width: 390
    height: 844
    is_mobile: true
    has_touch: true
    device_scale_factor: 3
pages:
  - url: /pricing
    name: Pricing Tiers
thresholds:
  min_line_height_ratio: 1.5
"#;
        let plan = AuditPlan::from_yaml(yaml).unwrap();
        assert_eq!(plan.viewports[0].name, "phone");
        assert_eq!(plan.viewports[0].device_scale_factor, 3.0);
        assert_eq!(plan.thresholds.min_line_height_ratio, 1.5);
        assert_eq!(plan.thresholds.min_touch_target, 44.0);
        assert_eq!(plan.page_url(&plan.pages[0]), "http://127.0.0.1:4000/pricing");
        assert_eq!(plan.selectors, SelectorSet::default());
    }

    #[test]
    fn test_rejects_duplicate_viewports() {
        let yaml = r#"
viewports:
  - { name: Mobile, width: 375, height: 667 }
  - { name: mobile, width: 390, height: 844 }
"#;
        let err = AuditPlan::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, AuditError::InvalidPlan(_)));
    }

    #[test]
    fn test_rejects_empty_pages() {
        let err = AuditPlan::from_yaml("pages: []").unwrap_err();
        assert!(err.to_string().contains("no pages"));
    }

    #[test]
    fn test_screenshot_naming() {
        let plan = AuditPlan::default();
        let path = plan
            .output
            .screenshot_path(&plan.viewports[0], &plan.pages[5]);
        assert_eq!(
            path,
            PathBuf::from("ui-analysis/screenshots/mobile-privacy-policy.png")
        );
    }

    #[test]
    fn test_mobile_viewports() {
        let plan = AuditPlan::default();
        let mobile = plan.mobile_viewports();
        assert!(mobile.contains("mobile"));
        assert!(!mobile.contains("tablet"));
        assert!(!mobile.contains("desktop"));
    }

    #[test]
    fn test_output_paths_follow_dir() {
        let yaml = r#"
output:
  dir: build/audit
  report: reports/latest.json
"#;
        let plan = AuditPlan::from_yaml(yaml).unwrap();
        assert_eq!(plan.output.screenshot_dir, PathBuf::from("build/audit/screenshots"));
        assert_eq!(plan.output.journal, PathBuf::from("build/audit/issues.jsonl"));
        assert_eq!(plan.output.report, PathBuf::from("reports/latest.json"));
        assert_eq!(plan.baseline_dir(), PathBuf::from("build/audit/baselines"));
        assert_eq!(plan.diff_dir(), PathBuf::from("build/audit/diffs"));
    }

    #[test]
    fn test_reroot_moves_visual_dirs() {
        let mut plan = AuditPlan::from_yaml(
            r#"
visual:
  baseline_dir: snapshots/baselines
"#,
        )
        .unwrap();
        assert_eq!(plan.baseline_dir(), PathBuf::from("snapshots/baselines"));

        plan.reroot_output("/tmp/run-7");
        assert_eq!(plan.output.report, PathBuf::from("/tmp/run-7/ui-audit-report.json"));
        assert_eq!(plan.baseline_dir(), PathBuf::from("/tmp/run-7/baselines"));
        assert_eq!(plan.diff_dir(), PathBuf::from("/tmp/run-7/diffs"));
    }
}
