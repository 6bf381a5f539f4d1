//! Sweep recording tests
//!
//! Feeds synthetic browser events through the recorder, then checks the
//! aggregator, the on-disk journal and the report built from both.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use ui_audit::playwright::EVENT_PREFIX;
use ui_audit::{
    AuditError, AuditPlan, BrowserEvent, ElementSnapshot, InspectorSuite, IssueJournal,
    OutputConfig, PageSnapshot, Report, SweepRecorder, SweepState,
};

fn plan_in(dir: &TempDir) -> AuditPlan {
    let mut plan = AuditPlan::from_yaml(
        r#"
base_url: http://localhost:4000
viewports:
  - name: mobile
    width: 375
    height: 667
    is_mobile: true
    has_touch: true
  - name: desktop
    width: 1440
    height: 900
pages:
  - url: /
    name: Homepage
  - url: /contact
    name: Contact
"#,
    )
    .unwrap();
    plan.output = OutputConfig::rooted_at(dir.path().join("out"));
    plan
}

fn overflowing(width: f64, height: f64) -> Box<PageSnapshot> {
    let mut snapshot = PageSnapshot::blank(width, height);
    snapshot.scroll_width = width + 40.0;
    snapshot.hero = Some(ElementSnapshot::new("body>section", "section").at(0.0, 0.0, width, 400.0));
    Box::new(snapshot)
}

fn inspected(viewport: &str, page: &str, snapshot: Box<PageSnapshot>) -> BrowserEvent {
    BrowserEvent::PageInspected {
        viewport: viewport.into(),
        page: page.into(),
        snapshot,
        screenshot: Some(PathBuf::from(format!("{}-{}.png", viewport, page.to_lowercase()))),
        screenshot_error: None,
        console_errors: Vec::new(),
    }
}

fn recorder_for<'a>(plan: &'a AuditPlan, suite: &'a InspectorSuite) -> SweepRecorder<'a> {
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    SweepRecorder::new(plan, suite, journal)
}

fn open_mobile(recorder: &mut SweepRecorder<'_>) {
    recorder.handle(full_sweep().remove(0)).unwrap();
    recorder
        .handle(BrowserEvent::ContextOpened {
            viewport: "mobile".into(),
        })
        .unwrap();
}

fn close_mobile(recorder: &mut SweepRecorder<'_>) {
    recorder
        .handle(BrowserEvent::ContextClosed {
            viewport: "mobile".into(),
        })
        .unwrap();
    recorder.handle(BrowserEvent::BrowserClosed).unwrap();
}

fn full_sweep() -> Vec<BrowserEvent> {
    vec![
        BrowserEvent::BrowserLaunched {
            browser: "chromium".into(),
        },
        BrowserEvent::ContextOpened {
            viewport: "mobile".into(),
        },
        inspected("mobile", "Homepage", overflowing(375.0, 667.0)),
        BrowserEvent::PageFailed {
            viewport: "mobile".into(),
            page: "Contact".into(),
            stage: "navigate".into(),
            error: "Timeout 30000ms exceeded".into(),
        },
        BrowserEvent::ContextClosed {
            viewport: "mobile".into(),
        },
        BrowserEvent::ContextOpened {
            viewport: "desktop".into(),
        },
        BrowserEvent::PageInspected {
            viewport: "desktop".into(),
            page: "Homepage".into(),
            snapshot: Box::new(PageSnapshot::blank(1440.0, 900.0)),
            screenshot: Some(PathBuf::from("desktop-homepage.png")),
            screenshot_error: None,
            console_errors: vec!["Failed to load resource: the server responded with a status of 404".into()],
        },
        inspected("desktop", "Contact", overflowing(1440.0, 900.0)),
        BrowserEvent::ContextClosed {
            viewport: "desktop".into(),
        },
        BrowserEvent::BrowserClosed,
    ]
}

#[test]
fn test_sweep_continues_past_failed_page() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    let mut recorder = SweepRecorder::new(&plan, &suite, journal);

    for event in full_sweep() {
        recorder.handle(event).unwrap();
    }
    assert_eq!(recorder.state(), &SweepState::BrowserClosed);
    let outcome = recorder.finish().unwrap();

    let aggregator = &outcome.aggregator;
    assert_eq!(aggregator.pages_inspected(), 3);
    assert_eq!(aggregator.page_errors().len(), 1);
    assert_eq!(aggregator.page_errors()[0].stage, "navigate");
    assert_eq!(aggregator.counts().critical, 2);
    assert_eq!(aggregator.console_errors().len(), 1);
    assert_eq!(aggregator.console_errors()[0].page, "Homepage");
    assert_eq!(aggregator.console_errors()[0].viewport, "desktop");
    assert_eq!(
        outcome.screenshots,
        vec!["mobile-homepage", "desktop-homepage", "desktop-contact"]
    );

    let report = Report::build(&plan, aggregator, Vec::new());
    assert!(!report.passed());
    assert_eq!(report.summary.pages_failed, 1);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.title == "Fix Horizontal Overflow"));
}

#[test]
fn test_journal_rebuild_matches_live_aggregator() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    let mut recorder = SweepRecorder::new(&plan, &suite, journal);
    for event in full_sweep() {
        recorder.handle(event).unwrap();
    }
    let live = recorder.finish().unwrap().aggregator;

    let rebuilt = IssueJournal::rebuild(&plan.output.journal).unwrap();
    assert_eq!(rebuilt.counts(), live.counts());
    assert_eq!(rebuilt.checks(), live.checks());
    assert_eq!(rebuilt.page_errors(), live.page_errors());
    assert_eq!(rebuilt.console_errors(), live.console_errors());
    assert_eq!(rebuilt.pages_inspected(), live.pages_inspected());
}

#[test]
fn test_interrupted_sweep_keeps_finished_pages() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    let mut recorder = SweepRecorder::new(&plan, &suite, journal);

    for event in full_sweep().into_iter().take(3) {
        recorder.handle(event).unwrap();
    }
    let err = recorder.finish().unwrap_err();
    assert!(matches!(err, AuditError::Protocol { .. }));

    let rebuilt = IssueJournal::rebuild(&plan.output.journal).unwrap();
    assert_eq!(rebuilt.pages_inspected(), 1);
    assert_eq!(rebuilt.counts().critical, 1);
}

#[test]
fn test_unknown_page_is_protocol_error() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    let mut recorder = SweepRecorder::new(&plan, &suite, journal);

    recorder.handle(full_sweep().remove(0)).unwrap();
    recorder
        .handle(BrowserEvent::ContextOpened {
            viewport: "mobile".into(),
        })
        .unwrap();
    let err = recorder
        .handle(inspected("mobile", "Blog", Box::new(PageSnapshot::blank(375.0, 667.0))))
        .unwrap_err();
    assert!(matches!(err, AuditError::Protocol { .. }));
}

#[test]
fn test_context_failure_marks_every_page() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let journal = IssueJournal::create(&plan.output.journal).unwrap();
    let mut recorder = SweepRecorder::new(&plan, &suite, journal);

    recorder.handle(full_sweep().remove(0)).unwrap();
    recorder
        .handle(BrowserEvent::ContextFailed {
            viewport: "mobile".into(),
            error: "Target closed".into(),
        })
        .unwrap();
    recorder.handle(BrowserEvent::BrowserClosed).unwrap();

    let outcome = recorder.finish().unwrap();
    let errors = outcome.aggregator.page_errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.stage == "context" && e.viewport == "mobile"));
}

#[test]
fn test_report_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let report = Report::build(&plan, &ui_audit::IssueAggregator::new(), Vec::new());

    report.write(&plan.output.report).unwrap();
    let read = Report::read(&plan.output.report).unwrap();
    assert_eq!(read.summary, report.summary);
    assert_eq!(read.base_url, "http://localhost:4000");
    assert!(read.passed());
}

#[test]
fn test_unwritable_report_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let plan = plan_in(&tmp);
    let report = Report::build(&plan, &ui_audit::IssueAggregator::new(), Vec::new());
    let err = report.write(&blocker.join("report.json")).unwrap_err();
    assert!(matches!(err, AuditError::ReportWrite { .. }));
}

#[test]
fn test_screenshot_failure_is_page_error() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let mut recorder = recorder_for(&plan, &suite);

    open_mobile(&mut recorder);
    recorder
        .handle(BrowserEvent::PageInspected {
            viewport: "mobile".into(),
            page: "Homepage".into(),
            snapshot: overflowing(375.0, 667.0),
            screenshot: None,
            screenshot_error: Some("ENOSPC: no space left on device".into()),
            console_errors: Vec::new(),
        })
        .unwrap();
    close_mobile(&mut recorder);

    let outcome = recorder.finish().unwrap();
    let aggregator = &outcome.aggregator;
    assert_eq!(aggregator.pages_inspected(), 1);
    assert_eq!(aggregator.counts().critical, 1);
    assert_eq!(aggregator.page_errors().len(), 1);
    assert_eq!(aggregator.page_errors()[0].stage, "screenshot");
    assert_eq!(aggregator.page_errors()[0].message, "ENOSPC: no space left on device");
    assert!(outcome.screenshots.is_empty());
}

#[test]
fn test_undecodable_snapshot_costs_only_its_page() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_in(&tmp);
    let suite = InspectorSuite::default();
    let mut recorder = recorder_for(&plan, &suite);

    open_mobile(&mut recorder);
    let line = format!(
        "{}{}",
        EVENT_PREFIX,
        r#"{"event":"page_inspected","viewport":"mobile","page":"Homepage","snapshot":{"inner_width":375,"inner_height":667,"buttons":[{"path":"body>a","tag":"a","anchor":"Start now \ud83d"}]},"screenshot":null,"screenshot_error":null,"console_errors":[]}"#
    );
    let event = BrowserEvent::parse_line(&line).unwrap().unwrap();
    recorder.handle(event).unwrap();
    recorder
        .handle(inspected("mobile", "Contact", Box::new(PageSnapshot::blank(375.0, 667.0))))
        .unwrap();
    close_mobile(&mut recorder);

    let aggregator = recorder.finish().unwrap().aggregator;
    assert_eq!(aggregator.pages_inspected(), 1);
    assert_eq!(aggregator.page_errors().len(), 1);
    assert_eq!(aggregator.page_errors()[0].page, "Homepage");
    assert_eq!(aggregator.page_errors()[0].stage, "decode");
}
