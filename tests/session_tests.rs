use std::sync::Arc;

use voice_form_fill::form::FillMapping;
use voice_form_fill::page::{LocalPage, PageContext, WritePath};
use voice_form_fill::session::{
    Dwell, ProcessingMachine, SessionError, SessionState, StatusUpdate, Step,
};
use voice_form_fill::trace::TraceLogger;

mod common;
use crate::common::mocks::{
    ChannelDownPage, MemoryCapture, MockBackend, PanickingPage, sample_clip,
};
use crate::common::utils::{control, fixture};

fn contact_page() -> Arc<LocalPage> {
    Arc::new(LocalPage::open(&fixture("contact_form.html")).unwrap())
}

fn machine_with(backend: Arc<MockBackend>) -> ProcessingMachine {
    ProcessingMachine::builder(backend).dwell(Dwell::none()).build()
}

fn three_fields() -> FillMapping {
    FillMapping::from_pairs([
        ("full_name", "Ada Lovelace"),
        ("country", "India"),
        ("gender_male", "female"),
    ])
}

fn drain_steps(rx: &mut tokio::sync::broadcast::Receiver<StatusUpdate>) -> Vec<Step> {
    let mut steps = Vec::new();
    while let Ok(update) = rx.try_recv() {
        assert_eq!(update.action, "STATUS_UPDATE");
        steps.push(update.state.step);
    }
    steps
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn full_session_runs_every_step_and_fills_page() {
    let backend = MockBackend::replying(three_fields());
    let machine = machine_with(backend.clone());
    let mut rx = machine.subscribe();
    let page = contact_page();
    let capture = MemoryCapture::new();

    let recording = machine.start_recording(capture.as_ref()).await.unwrap();
    let outcome = machine
        .stop_recording(recording, capture, page.clone())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        drain_steps(&mut rx),
        vec![
            Step::Idle,
            Step::Analyzing,
            Step::Crawling,
            Step::Brain,
            Step::Filling,
            Step::Success,
        ]
    );
    assert_eq!(outcome.write_path, WritePath::MessageChannel);
    assert_eq!(outcome.report.filled_count(), 3);
    assert_eq!(outcome.fields.len(), 14);
    assert_eq!(backend.call_count(), 1);
    assert_eq!(backend.last_fields(), outcome.fields);

    let doc = page.document();
    assert_eq!(doc.value(control(&doc, "full_name")), "Ada Lovelace");
    assert_eq!(doc.value(control(&doc, "country")), "in");
    assert!(doc.checked(control(&doc, "gender_female")));

    let status = machine.status();
    assert_eq!(status.step, Step::Success);
    assert!(!status.is_processing);
}

#[tokio::test]
async fn process_accepts_clip_in_hand() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let mut rx = machine.subscribe();

    let handle = machine.process(sample_clip(), contact_page()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(
        drain_steps(&mut rx),
        vec![Step::Analyzing, Step::Crawling, Step::Brain, Step::Filling, Step::Success]
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn page_without_fields_errors_before_backend() {
    let backend = MockBackend::replying(three_fields());
    let machine = machine_with(backend.clone());
    let mut rx = machine.subscribe();
    let page = Arc::new(LocalPage::open(&fixture("no_form.html")).unwrap());

    let result = machine.process(sample_clip(), page).unwrap().await.unwrap();

    assert!(matches!(result, Err(SessionError::NoFieldsFound)));
    let steps = drain_steps(&mut rx);
    assert_eq!(steps, vec![Step::Analyzing, Step::Crawling, Step::Error]);
    assert!(!steps.contains(&Step::Brain));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(
        machine.status(),
        SessionState::new(Step::Error, "Error: No form fields found on this page")
    );
}

#[tokio::test]
async fn backend_rejection_message_reaches_observers() {
    let machine = machine_with(MockBackend::rejecting("Backend returned 500: Internal Server Error"));

    let result = machine.process(sample_clip(), contact_page()).unwrap().await.unwrap();

    assert!(matches!(result, Err(SessionError::Backend(_))));
    let status = machine.status();
    assert_eq!(status.step, Step::Error);
    assert_eq!(status.message, "Error: Backend returned 500: Internal Server Error");
}

#[tokio::test]
async fn unreachable_backend_ends_in_error() {
    let machine = machine_with(MockBackend::unreachable());
    let mut rx = machine.subscribe();

    let result = machine.process(sample_clip(), contact_page()).unwrap().await.unwrap();

    assert!(result.is_err());
    assert_eq!(
        drain_steps(&mut rx),
        vec![Step::Analyzing, Step::Crawling, Step::Brain, Step::Error]
    );
    assert!(machine.status().message.starts_with("Error: Backend unreachable"));
}

#[tokio::test]
async fn lost_recording_ends_in_error() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let capture = MemoryCapture::losing_recording();

    let recording = machine.start_recording(capture.as_ref()).await.unwrap();
    let result = machine
        .stop_recording(recording, capture, contact_page())
        .await
        .unwrap();

    assert!(matches!(result, Err(SessionError::CaptureUnavailable(_))));
    assert_eq!(machine.status().message, "Error: No active recording");
}

#[tokio::test]
async fn panicking_page_ends_in_error_and_frees_session() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let mut rx = machine.subscribe();
    let capture = MemoryCapture::new();

    let recording = machine.start_recording(capture.as_ref()).await.unwrap();
    let result = machine
        .stop_recording(recording, capture.clone(), Arc::new(PanickingPage))
        .await
        .unwrap();

    assert!(matches!(result, Err(SessionError::Internal(_))));
    assert_eq!(
        drain_steps(&mut rx),
        vec![Step::Idle, Step::Analyzing, Step::Crawling, Step::Error]
    );
    let status = machine.status();
    assert_eq!(status.step, Step::Error);
    assert!(!status.is_processing);
    assert!(status.message.starts_with("Error: Internal error"));

    assert!(!machine.is_busy());
    machine.process(sample_clip(), contact_page()).unwrap().await.unwrap().unwrap();
    assert_eq!(machine.status().step, Step::Success);
}

// ============================================================================
// Write path fallback
// ============================================================================

#[tokio::test]
async fn channel_failure_falls_back_to_direct_injection() {
    let machine = machine_with(MockBackend::replying(FillMapping::from_pairs([
        ("company", "Acme"),
        ("country", "gb"),
    ])));
    let page = Arc::new(ChannelDownPage {
        inner: LocalPage::open(&fixture("contact_form.html")).unwrap(),
        allow_injection: true,
    });

    let outcome = machine
        .process(sample_clip(), page.clone())
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.write_path, WritePath::DirectInjection);
    let doc = page.inner.document();
    assert_eq!(doc.value(control(&doc, "company")), "Acme");
    assert_eq!(doc.value(control(&doc, "country")), "gb");
    assert_eq!(machine.status().step, Step::Success);
}

#[tokio::test]
async fn no_write_path_left_ends_in_error() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let page: Arc<dyn PageContext> = Arc::new(ChannelDownPage {
        inner: LocalPage::open(&fixture("contact_form.html")).unwrap(),
        allow_injection: false,
    });

    let result = machine.process(sample_clip(), page).unwrap().await.unwrap();

    assert!(matches!(result, Err(SessionError::FillChannelUnavailable(_))));
    assert_eq!(machine.status().step, Step::Error);
}

// ============================================================================
// Concurrency and observers
// ============================================================================

#[tokio::test]
async fn second_start_while_recording_is_busy() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let capture = MemoryCapture::new();

    let recording = machine.start_recording(capture.as_ref()).await.unwrap();
    assert!(machine.is_busy());

    let second = machine.start_recording(capture.as_ref()).await;
    assert!(matches!(second, Err(SessionError::Busy)));
    assert!(matches!(
        machine.process(sample_clip(), contact_page()),
        Err(SessionError::Busy)
    ));

    machine
        .stop_recording(recording, capture.clone(), contact_page())
        .await
        .unwrap()
        .unwrap();

    assert!(!machine.is_busy());
    assert!(machine.start_recording(capture.as_ref()).await.is_ok());
}

#[tokio::test]
async fn new_recording_resets_to_idle() {
    let machine = machine_with(MockBackend::rejecting("nope"));
    machine.process(sample_clip(), contact_page()).unwrap().await.unwrap().unwrap_err();
    assert_eq!(machine.status().step, Step::Error);

    let capture = MemoryCapture::new();
    let _recording = machine.start_recording(capture.as_ref()).await.unwrap();
    assert_eq!(machine.status(), SessionState::idle());
}

#[tokio::test]
async fn detached_observer_does_not_stop_session() {
    let machine = machine_with(MockBackend::replying(three_fields()));
    let early = machine.subscribe();
    drop(early);
    let mut watcher = machine.watch();

    machine.process(sample_clip(), contact_page()).unwrap().await.unwrap().unwrap();

    // A late observer reads the final state.
    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().step, Step::Success);
    assert_eq!(machine.status().step, Step::Success);
}

#[tokio::test(start_paused = true)]
async fn dwell_times_pause_each_step() {
    let machine = ProcessingMachine::builder(MockBackend::replying(three_fields()))
        .dwell(Dwell::default())
        .build();
    let start = tokio::time::Instant::now();

    machine.process(sample_clip(), contact_page()).unwrap().await.unwrap().unwrap();

    assert!(start.elapsed() >= std::time::Duration::from_millis(1500 + 2000 + 2500 + 2000));
}

#[tokio::test]
async fn transitions_are_traced_as_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let machine = ProcessingMachine::builder(MockBackend::replying(three_fields()))
        .dwell(Dwell::none())
        .tracer(TraceLogger::new(&path))
        .build();

    machine.process(sample_clip(), contact_page()).unwrap().await.unwrap().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let events: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let steps: Vec<_> = events.iter().map(|e| e["step"].as_str().unwrap()).collect();
    assert_eq!(steps, vec!["ANALYZING", "CRAWLING", "BRAIN", "FILLING", "SUCCESS"]);

    assert_eq!(events[0]["audio_sha1"], sample_clip().fingerprint());
    assert_eq!(events[2]["fields"], 14);
    assert_eq!(events[4]["write_path"], "message_channel");
    assert_eq!(events[4]["filled"], 3);
    assert!(events.iter().all(|e| e["session"] == 1));
}

#[test]
fn status_update_wire_format() {
    let update = StatusUpdate::new(SessionState::new(Step::Brain, "thinking"));
    assert_eq!(
        serde_json::to_value(&update).unwrap(),
        serde_json::json!({
            "action": "STATUS_UPDATE",
            "state": { "isProcessing": true, "step": "BRAIN", "message": "thinking" }
        })
    );
}

#[test]
fn only_working_steps_are_processing() {
    let processing: Vec<_> = [
        Step::Idle,
        Step::Analyzing,
        Step::Crawling,
        Step::Brain,
        Step::Filling,
        Step::Success,
        Step::Error,
    ]
    .into_iter()
    .filter(Step::is_processing)
    .collect();
    assert_eq!(
        processing,
        vec![Step::Analyzing, Step::Crawling, Step::Brain, Step::Filling]
    );
}

#[test]
fn unwritable_trace_path_disables_tracing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(TraceLogger::new(dir.path().join("trace.jsonl")).is_enabled());
    assert!(!TraceLogger::new(dir.path().join("missing").join("trace.jsonl")).is_enabled());
    assert!(!TraceLogger::disabled().is_enabled());
}
