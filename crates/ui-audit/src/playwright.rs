//! Playwright browser automation
//!
//! The whole viewport × page matrix runs as one generated Node script. The
//! script reports progress as prefixed JSON lines on stdout, which are
//! decoded into [`BrowserEvent`]s and handed to the caller as they arrive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, trace, warn};

use crate::error::{AuditError, AuditResult};
use crate::plan::AuditPlan;
use crate::snapshot::PageSnapshot;

/// Marks stdout lines that carry an event
pub const EVENT_PREFIX: &str = "@@ui-audit ";

const COLLECTOR_JS: &str = include_str!("collector.js");

/// Leading keys of a `page_inspected` line, in the order the script emits them
static PAGE_INSPECTED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\{"event":"page_inspected","viewport":"((?:[^"\\]|\\.)*)","page":"((?:[^"\\]|\\.)*)""#)
        .expect("valid event header regex")
});

/// Progress reported by the browser script, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrowserEvent {
    BrowserLaunched {
        browser: String,
    },
    ContextOpened {
        viewport: String,
    },
    /// The context for a viewport could not be created; its pages are skipped
    ContextFailed {
        viewport: String,
        error: String,
    },
    PageInspected {
        viewport: String,
        page: String,
        snapshot: Box<PageSnapshot>,
        #[serde(default)]
        screenshot: Option<PathBuf>,
        #[serde(default)]
        screenshot_error: Option<String>,
        /// `console.error` output seen while the page was open
        #[serde(default)]
        console_errors: Vec<String>,
    },
    PageFailed {
        viewport: String,
        page: String,
        stage: String,
        error: String,
    },
    ContextClosed {
        viewport: String,
    },
    BrowserClosed,
}

impl BrowserEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserEvent::BrowserLaunched { .. } => "browser_launched",
            BrowserEvent::ContextOpened { .. } => "context_opened",
            BrowserEvent::ContextFailed { .. } => "context_failed",
            BrowserEvent::PageInspected { .. } => "page_inspected",
            BrowserEvent::PageFailed { .. } => "page_failed",
            BrowserEvent::ContextClosed { .. } => "context_closed",
            BrowserEvent::BrowserClosed => "browser_closed",
        }
    }

    /// Decode one stdout line; `None` for ordinary console output.
    ///
    /// A `page_inspected` payload that does not decode becomes a
    /// `page_failed` event at stage `decode`, so bad page content costs
    /// only that page.
    pub fn parse_line(line: &str) -> Option<AuditResult<Self>> {
        let payload = line.strip_prefix(EVENT_PREFIX)?;
        let decoded = serde_json::from_str(payload).or_else(|e| {
            Self::undecodable_page(payload, &e).ok_or_else(|| AuditError::from(e))
        });
        Some(decoded)
    }

    fn undecodable_page(payload: &str, error: &serde_json::Error) -> Option<Self> {
        let header = PAGE_INSPECTED_HEADER.captures(payload)?;
        let unescape = |raw: &str| {
            serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
        };
        let viewport = unescape(&header[1]);
        let page = unescape(&header[2]);
        warn!("Undecodable snapshot for {} ({}): {}", page, viewport, error);

        Some(BrowserEvent::PageFailed {
            viewport,
            page,
            stage: "decode".to_string(),
            error: error.to_string(),
        })
    }
}

/// Matrix description embedded into the generated script
#[derive(Debug, Serialize)]
struct ScriptPlan {
    browser: &'static str,
    timeout_ms: u64,
    settle_ms: u64,
    selectors: BTreeMap<&'static str, Vec<String>>,
    viewports: Vec<ScriptViewport>,
}

#[derive(Debug, Serialize)]
struct ScriptViewport {
    name: String,
    width: u32,
    height: u32,
    is_mobile: bool,
    has_touch: bool,
    device_scale_factor: f64,
    pages: Vec<ScriptPage>,
}

#[derive(Debug, Serialize)]
struct ScriptPage {
    name: String,
    url: String,
    screenshot: String,
}

impl ScriptPlan {
    fn from_plan(plan: &AuditPlan) -> Self {
        let selectors = plan
            .selectors
            .groups()
            .into_iter()
            .map(|(name, list)| (name, list.to_vec()))
            .collect();

        let viewports = plan
            .viewports
            .iter()
            .map(|viewport| ScriptViewport {
                name: viewport.name.clone(),
                width: viewport.width,
                height: viewport.height,
                is_mobile: viewport.is_mobile,
                has_touch: viewport.has_touch,
                device_scale_factor: viewport.device_scale_factor,
                pages: plan
                    .pages
                    .iter()
                    .map(|page| ScriptPage {
                        name: page.name.clone(),
                        url: plan.page_url(page),
                        screenshot: plan
                            .output
                            .screenshot_path(viewport, page)
                            .to_string_lossy()
                            .to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            browser: plan.browser.as_str(),
            timeout_ms: plan.navigation.timeout_ms,
            settle_ms: plan.navigation.settle_ms,
            selectors,
            viewports,
        }
    }
}

/// Runs generated Playwright scripts under `node`
pub struct PlaywrightDriver {
    /// Directory whose `node_modules` provides the `playwright` package
    module_root: PathBuf,
}

impl PlaywrightDriver {
    pub fn new(module_root: impl Into<PathBuf>) -> Self {
        Self {
            module_root: module_root.into(),
        }
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed() -> AuditResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(AuditError::PlaywrightNotFound),
        }
    }

    /// Build the Node script that sweeps the whole matrix
    pub fn build_script(plan: &AuditPlan) -> AuditResult<String> {
        let matrix = serde_json::to_string_pretty(&ScriptPlan::from_plan(plan))?;

        Ok(format!(
            r#"
const playwright = require('playwright');

const PREFIX = {prefix};
const emit = (event) => console.log(PREFIX + JSON.stringify(event));
const describe = (error) => String(error && error.message ? error.message : error);

const plan = {matrix};

const collect = {collector};

(async () => {{
  const browser = await playwright[plan.browser].launch({{ headless: true }});
  emit({{ event: 'browser_launched', browser: plan.browser }});

  try {{
    for (const viewport of plan.viewports) {{
      let context;
      try {{
        context = await browser.newContext({{
          viewport: {{ width: viewport.width, height: viewport.height }},
          isMobile: viewport.is_mobile,
          hasTouch: viewport.has_touch,
          deviceScaleFactor: viewport.device_scale_factor,
        }});
      }} catch (error) {{
        emit({{ event: 'context_failed', viewport: viewport.name, error: describe(error) }});
        continue;
      }}
      emit({{ event: 'context_opened', viewport: viewport.name }});

      for (const target of viewport.pages) {{
        let page = null;
        let stage = 'open';
        const consoleErrors = [];
        try {{
          page = await context.newPage();
          page.on('console', (msg) => {{
            if (msg.type() === 'error') consoleErrors.push(msg.text());
          }});
          stage = 'navigate';
          await page.goto(target.url, {{ waitUntil: 'networkidle', timeout: plan.timeout_ms }});
          stage = 'settle';
          await page.waitForTimeout(plan.settle_ms);
          stage = 'collect';
          const snapshot = await page.evaluate(collect, plan.selectors);

          let screenshotError = null;
          try {{
            await page.screenshot({{ path: target.screenshot, fullPage: true }});
          }} catch (error) {{
            screenshotError = describe(error);
          }}

          emit({{
            event: 'page_inspected',
            viewport: viewport.name,
            page: target.name,
            snapshot,
            screenshot: screenshotError ? null : target.screenshot,
            screenshot_error: screenshotError,
            console_errors: consoleErrors,
          }});
        }} catch (error) {{
          emit({{ event: 'page_failed', viewport: viewport.name, page: target.name, stage, error: describe(error) }});
        }} finally {{
          if (page) await page.close().catch(() => {{}});
        }}
      }}

      await context.close();
      emit({{ event: 'context_closed', viewport: viewport.name }});
    }}
  }} finally {{
    await browser.close();
    emit({{ event: 'browser_closed' }});
  }}
}})().catch((error) => {{
  console.error(JSON.stringify({{ success: false, error: describe(error), stack: error && error.stack }}));
  process.exit(1);
}});
"#,
            prefix = serde_json::to_string(EVENT_PREFIX)?,
            matrix = matrix,
            collector = COLLECTOR_JS.trim(),
        ))
    }

    /// Execute a script, feeding each event to `on_event` in order.
    ///
    /// An error from the callback stops the sweep; the node process is
    /// killed when its handle drops.
    pub async fn run<F>(&self, script: &str, mut on_event: F) -> AuditResult<()>
    where
        F: FnMut(BrowserEvent) -> AuditResult<()>,
    {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("ui-audit.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .env("NODE_PATH", self.module_root.join("node_modules"))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuditError::Playwright(format!("Failed to spawn node: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AuditError::Playwright("node stdout not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AuditError::Playwright("node stderr not captured".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match BrowserEvent::parse_line(&line) {
                Some(event) => on_event(event?)?,
                None => trace!("[node] {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();
        for line in stderr.lines() {
            debug!("[node stderr] {}", line);
        }

        if !status.success() {
            warn!("Playwright script exited with {}", status);
            return Err(AuditError::Playwright(format!(
                "Script failed ({}):\n{}",
                status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Default for PlaywrightDriver {
    fn default() -> Self {
        Self::new(".")
    }
}
