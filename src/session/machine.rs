use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::ReasoningBackend;
use crate::capture::{AudioCapture, AudioClip, CaptureHandle};
use crate::page::write::default_strategies;
use crate::page::{PageContext, WriteStrategy, write_with_fallback};
use crate::session::state::{SessionState, StatusUpdate, Step};
use crate::session::{SessionError, SessionOutcome};
use crate::trace::{TraceEvent, TraceLogger};

const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Pause after entering each working step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dwell {
    pub analyzing: Duration,
    pub crawling: Duration,
    pub brain: Duration,
    pub filling: Duration,
}

impl Default for Dwell {
    fn default() -> Self {
        Self::from_millis(1500, 2000, 2500, 2000)
    }
}

impl Dwell {
    pub fn none() -> Self {
        Self::from_millis(0, 0, 0, 0)
    }

    pub fn from_millis(analyzing: u64, crawling: u64, brain: u64, filling: u64) -> Self {
        Self {
            analyzing: Duration::from_millis(analyzing),
            crawling: Duration::from_millis(crawling),
            brain: Duration::from_millis(brain),
            filling: Duration::from_millis(filling),
        }
    }
}

async fn dwell(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// A capture in progress. Holds the session lock until the session that
/// consumes it finishes.
pub struct Recording {
    pub session: u64,
    pub handle: CaptureHandle,
    guard: OwnedMutexGuard<()>,
}

pub struct MachineBuilder {
    backend: Arc<dyn ReasoningBackend>,
    strategies: Vec<Box<dyn WriteStrategy>>,
    dwell: Dwell,
    tracer: TraceLogger,
}

impl MachineBuilder {
    pub fn dwell(mut self, dwell: Dwell) -> Self {
        self.dwell = dwell;
        self
    }

    pub fn tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn strategies(mut self, strategies: Vec<Box<dyn WriteStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn build(self) -> ProcessingMachine {
        let (state_tx, _) = watch::channel(SessionState::idle());
        let (events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);

        ProcessingMachine {
            inner: Arc::new(Inner {
                state_tx,
                events,
                backend: self.backend,
                strategies: self.strategies,
                dwell: self.dwell,
                tracer: self.tracer,
                lock: Arc::new(Mutex::new(())),
                sessions: AtomicU64::new(0),
            }),
        }
    }
}

struct Inner {
    state_tx: watch::Sender<SessionState>,
    events: broadcast::Sender<StatusUpdate>,
    backend: Arc<dyn ReasoningBackend>,
    strategies: Vec<Box<dyn WriteStrategy>>,
    dwell: Dwell,
    tracer: TraceLogger,
    lock: Arc<Mutex<()>>,
    sessions: AtomicU64,
}

/// Drives one fill session at a time through
/// `IDLE → ANALYZING → CRAWLING → BRAIN → FILLING → SUCCESS | ERROR`.
///
/// Only the task holding the session lock writes the state. Observers either
/// read the latest value ([`status`](Self::status), [`watch`](Self::watch))
/// or follow every transition ([`subscribe`](Self::subscribe)). Cloning is
/// cheap and every clone drives the same machine.
#[derive(Clone)]
pub struct ProcessingMachine {
    inner: Arc<Inner>,
}

impl ProcessingMachine {
    pub fn builder(backend: Arc<dyn ReasoningBackend>) -> MachineBuilder {
        MachineBuilder {
            backend,
            strategies: default_strategies(),
            dwell: Dwell::default(),
            tracer: TraceLogger::disabled(),
        }
    }

    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self::builder(backend).build()
    }

    /// Current state, for observers that attach mid-session.
    pub fn status(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.inner.events.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock.try_lock().is_err()
    }

    fn acquire(&self) -> Result<(u64, OwnedMutexGuard<()>), SessionError> {
        let guard = self
            .inner
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| SessionError::Busy)?;
        let session = self.inner.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        Ok((session, guard))
    }

    /// Begin a new recording. Resets the state to IDLE; rejected with
    /// [`SessionError::Busy`] while another session holds the lock.
    pub async fn start_recording(&self, capture: &dyn AudioCapture) -> Result<Recording, SessionError> {
        let (session, guard) = self.acquire()?;
        self.transition(session, Step::Idle, "");

        let handle = match capture.start_capture().await {
            Ok(handle) => handle,
            Err(e) => {
                let error = SessionError::from(e);
                self.fail(session, &error);
                return Err(error);
            }
        };
        info!(session, "recording started");
        Ok(Recording {
            session,
            handle,
            guard,
        })
    }

    /// Stop the recording and run the pipeline on a background task.
    pub fn stop_recording(
        &self,
        recording: Recording,
        capture: Arc<dyn AudioCapture>,
        page: Arc<dyn PageContext>,
    ) -> JoinHandle<Result<SessionOutcome, SessionError>> {
        let machine = self.clone();
        tokio::spawn(async move {
            let Recording {
                session,
                handle,
                guard,
            } = recording;
            let result = match capture.stop_capture(handle).await {
                Ok(clip) => machine.supervise(session, clip, page).await,
                Err(e) => Err(SessionError::from(e)),
            };
            machine.finish(session, result, guard)
        })
    }

    /// Run the pipeline on a clip that is already in hand.
    pub fn process(
        &self,
        clip: AudioClip,
        page: Arc<dyn PageContext>,
    ) -> Result<JoinHandle<Result<SessionOutcome, SessionError>>, SessionError> {
        let (session, guard) = self.acquire()?;
        let machine = self.clone();
        Ok(tokio::spawn(async move {
            let result = machine.supervise(session, clip, page).await;
            machine.finish(session, result, guard)
        }))
    }

    /// Run the pipeline on its own task so that a panicking collaborator
    /// still ends the session in ERROR.
    async fn supervise(
        &self,
        session: u64,
        clip: AudioClip,
        page: Arc<dyn PageContext>,
    ) -> Result<SessionOutcome, SessionError> {
        let machine = self.clone();
        let pipeline =
            tokio::spawn(async move { machine.run_pipeline(session, clip, page.as_ref()).await });
        match pipeline.await {
            Ok(result) => result,
            Err(e) => Err(SessionError::Internal(e.to_string())),
        }
    }

    async fn run_pipeline(
        &self,
        session: u64,
        clip: AudioClip,
        page: &dyn PageContext,
    ) -> Result<SessionOutcome, SessionError> {
        let dwell_times = self.inner.dwell;

        let event = self.transition(session, Step::Analyzing, Step::Analyzing.default_message());
        self.trace(
            event
                .with_page(page.describe())
                .with_audio_sha1(clip.fingerprint()),
        );
        dwell(dwell_times.analyzing).await;

        let event = self.transition(session, Step::Crawling, Step::Crawling.default_message());
        self.trace(event);
        dwell(dwell_times.crawling).await;

        let fields = page.extract_fields().await.map_err(SessionError::Extraction)?;
        info!(session, fields = fields.len(), "fields extracted");
        if fields.is_empty() {
            return Err(SessionError::NoFieldsFound);
        }

        let event = self.transition(session, Step::Brain, Step::Brain.default_message());
        self.trace(event.with_fields(fields.len()));
        dwell(dwell_times.brain).await;

        let mapping = self.inner.backend.process(&clip, &fields).await?;
        info!(session, values = mapping.len(), "backend returned mapping");

        let event = self.transition(session, Step::Filling, Step::Filling.default_message());
        self.trace(event);
        dwell(dwell_times.filling).await;

        let (write_path, report) = write_with_fallback(page, &mapping, &self.inner.strategies)
            .await
            .map_err(SessionError::FillChannelUnavailable)?;

        let event = self.transition(session, Step::Success, Step::Success.default_message());
        self.trace(
            event
                .with_filled(report.filled_count())
                .with_write_path(write_path.as_str()),
        );

        Ok(SessionOutcome {
            fields,
            report,
            write_path,
        })
    }

    fn finish(
        &self,
        session: u64,
        result: Result<SessionOutcome, SessionError>,
        guard: OwnedMutexGuard<()>,
    ) -> Result<SessionOutcome, SessionError> {
        if let Err(e) = &result {
            self.fail(session, e);
        }
        drop(guard);
        result
    }

    fn fail(&self, session: u64, error: &SessionError) {
        warn!(session, error = %error, "session failed");
        let event = self.transition(session, Step::Error, &format!("Error: {}", error));
        self.trace(event);
    }

    fn transition(&self, session: u64, step: Step, message: &str) -> TraceEvent {
        let state = SessionState::new(step, message);
        info!(session, step = step.as_str(), status = message, "state transition");

        self.inner.state_tx.send_replace(state.clone());
        // No subscribers is fine; observers come and go.
        let _ = self.inner.events.send(StatusUpdate::new(state));

        TraceEvent::now(session, step.as_str(), message)
    }

    fn trace(&self, event: TraceEvent) {
        self.inner.tracer.log(&event);
    }
}
