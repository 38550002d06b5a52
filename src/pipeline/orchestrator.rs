//! Live recognition pipeline with an enable/disable lifecycle.
//!
//! An enabled session runs three threads sharing one running flag:
//!
//! - **capture**: pulls a raw frame from the [`FrameSource`] every capture
//!   period and hands it to a small bounded queue, dropping it when full.
//! - **preprocess**: resizes, crops and normalizes queued frames into the
//!   [`FrameBuffer`].
//! - **inference**: polls the buffer; when it is full and the
//!   [`ThrottleGate`] admits a run, it snapshots the window, runs the model,
//!   ranks the output and publishes the result.

use crate::defaults::{
    CAPTURE_PERIOD_MS, FRAME_QUEUE, INFERENCE_INTERVAL_MS, POLL_PERIOD_MS, SHUTDOWN_TIMEOUT_MS,
    TOP_K, WINDOW_FRAMES,
};
use crate::error::{GlossError, Result};
use crate::gloss::{GlossTable, Prediction, PredictionRanker, PredictionSet};
use crate::infer::{InferenceEngine, TensorAssembler};
use crate::pipeline::buffer::FrameBuffer;
use crate::pipeline::clock::{Clock, SystemClock};
use crate::pipeline::error::{ErrorReporter, LogReporter, StageError};
use crate::pipeline::sink::CaptionSink;
use crate::pipeline::stats::{PipelineStats, StatsSnapshot};
use crate::pipeline::throttle::ThrottleGate;
use crate::video::{FrameSource, Preprocessor, RawFrame};
use crossbeam_channel::{Receiver, RecvTimeoutError, SendError, Sender, TrySendError, bounded};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time between frame captures.
    pub capture_period: Duration,
    /// Time between inference readiness checks.
    pub poll_period: Duration,
    /// Minimum spacing between the end of one inference and the next start.
    pub inference_interval: Duration,
    /// Predictions kept per ranking.
    pub top_k: usize,
    /// Raw frames queued between capture and preprocessing.
    pub frame_queue: usize,
    /// How long `disable()` waits for an in-flight inference.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture_period: Duration::from_millis(CAPTURE_PERIOD_MS),
            poll_period: Duration::from_millis(POLL_PERIOD_MS),
            inference_interval: Duration::from_millis(INFERENCE_INTERVAL_MS),
            top_k: TOP_K,
            frame_queue: FRAME_QUEUE,
            shutdown_timeout: Duration::from_millis(SHUTDOWN_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Disabled,
    Enabled,
}

/// Point-in-time view of the pipeline for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStatus {
    pub state: PipelineState,
    /// Frame buffer fill, 0 to 100.
    pub buffer_fill_percent: u8,
    pub inference_in_flight: bool,
    pub stats: StatsSnapshot,
}

/// Builder for a [`PipelineOrchestrator`].
pub struct Pipeline {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets the clock used by the inference throttle.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Assemble a disabled orchestrator around its collaborators.
    pub fn build(
        self,
        source: Box<dyn FrameSource>,
        engine: Arc<dyn InferenceEngine>,
        table: Arc<GlossTable>,
        sink: Box<dyn CaptionSink>,
    ) -> PipelineOrchestrator {
        if let Some(classes) = engine.class_count()
            && classes != table.len()
        {
            warn!(
                model = engine.model_name(),
                classes,
                glosses = table.len(),
                "model class count does not match gloss table"
            );
        }

        let shared = Shared {
            buffer: FrameBuffer::new(WINDOW_FRAMES),
            gate: Arc::new(ThrottleGate::new(self.config.inference_interval)),
            latest: Mutex::new(None),
            stats: PipelineStats::new(),
            preprocessor: Preprocessor::new(),
            assembler: TensorAssembler::new(),
            ranker: PredictionRanker::new(self.config.top_k),
            engine,
            table,
            sink: Mutex::new(sink),
            clock: self.clock,
            reporter: self.error_reporter,
        };

        PipelineOrchestrator {
            config: self.config,
            shared: Arc::new(shared),
            source: Some(source),
            session: None,
        }
    }
}

/// State shared by the orchestrator and its session threads.
struct Shared {
    buffer: FrameBuffer,
    gate: Arc<ThrottleGate>,
    latest: Mutex<Option<Arc<PredictionSet>>>,
    stats: PipelineStats,
    preprocessor: Preprocessor,
    assembler: TensorAssembler,
    ranker: PredictionRanker,
    engine: Arc<dyn InferenceEngine>,
    table: Arc<GlossTable>,
    sink: Mutex<Box<dyn CaptionSink>>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ErrorReporter>,
}

/// Threads of one enabled period.
struct Session {
    running: Arc<AtomicBool>,
    /// Hands the frame source back on exit; `None` if it never received it.
    capture: JoinHandle<Option<Box<dyn FrameSource>>>,
    preprocess: JoinHandle<()>,
    inference: JoinHandle<()>,
}

/// Drives capture, preprocessing and inference while enabled.
///
/// Created disabled. Dropping it disables it.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    shared: Arc<Shared>,
    /// Owned here while disabled; moved into the capture thread while enabled.
    source: Option<Box<dyn FrameSource>>,
    session: Option<Session>,
}

impl PipelineOrchestrator {
    /// Start a session. No-op when already enabled.
    ///
    /// Fails with [`GlossError::ModelNotLoaded`] if the engine is not ready,
    /// or with the source's error if it cannot start.
    pub fn enable(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        if !self.shared.engine.is_ready() {
            return Err(GlossError::ModelNotLoaded);
        }
        let mut source = self.source.take().ok_or_else(|| GlossError::FrameSource {
            message: "frame source was lost when a capture thread panicked".to_string(),
        })?;
        if let Err(e) = source.start() {
            self.source = Some(source);
            return Err(e);
        }

        self.shared.clear();
        self.shared.stats.reset();

        let running = Arc::new(AtomicBool::new(true));
        let (frame_tx, frame_rx) = bounded(self.config.frame_queue.max(1));

        let (preprocess, inference) = match self.spawn_workers(&running, frame_rx) {
            Ok(handles) => handles,
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                if let Err(stop_err) = source.stop() {
                    warn!(source = source.name(), "failed to stop frame source: {}", stop_err);
                }
                self.source = Some(source);
                return Err(e);
            }
        };

        let capture = {
            let shared = self.shared.clone();
            let running = running.clone();
            let period = self.config.capture_period;
            spawn_with_handoff(source, move |source_rx| {
                thread::Builder::new()
                    .name("glosscast-capture".to_string())
                    .spawn(move || {
                        let mut source: Box<dyn FrameSource> = source_rx.recv().ok()?;
                        capture_loop(&shared, &running, source.as_mut(), frame_tx, period);
                        Some(source)
                    })
            })
        };
        let capture = match capture {
            Ok(handle) => handle,
            Err((e, mut source)) => {
                // The workers see the dropped queue and the cleared flag and exit.
                running.store(false, Ordering::SeqCst);
                if let Err(stop_err) = source.stop() {
                    warn!(source = source.name(), "failed to stop frame source: {}", stop_err);
                }
                self.source = Some(source);
                return Err(e);
            }
        };

        self.session = Some(Session {
            running,
            capture,
            preprocess,
            inference,
        });
        info!(model = self.shared.engine.model_name(), "sign recognition enabled");
        Ok(())
    }

    fn spawn_workers(
        &self,
        running: &Arc<AtomicBool>,
        frame_rx: Receiver<RawFrame>,
    ) -> Result<(JoinHandle<()>, JoinHandle<()>)> {
        let inference = {
            let shared = self.shared.clone();
            let running = running.clone();
            let poll = self.config.poll_period;
            thread::Builder::new()
                .name("glosscast-inference".to_string())
                .spawn(move || inference_loop(&shared, &running, poll))?
        };
        let preprocess = {
            let shared = self.shared.clone();
            let running = running.clone();
            let poll = self.config.poll_period;
            thread::Builder::new()
                .name("glosscast-preprocess".to_string())
                .spawn(move || preprocess_loop(&shared, &running, frame_rx, poll))
        };
        match preprocess {
            Ok(preprocess) => Ok((preprocess, inference)),
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the session. No-op when already disabled.
    ///
    /// Capture and preprocessing are joined. An in-flight inference gets up
    /// to `shutdown_timeout` to finish and is detached after that; its result
    /// is discarded either way.
    pub fn disable(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.running.store(false, Ordering::SeqCst);

        match session.capture.join() {
            Ok(Some(source)) => self.source = Some(source),
            Ok(None) => {}
            Err(panic) => error!("capture thread panicked: {}", panic_message(&*panic)),
        }
        if let Err(panic) = session.preprocess.join() {
            error!("preprocess thread panicked: {}", panic_message(&*panic));
        }

        self.shared.clear();
        self.wait_for_inference(session.inference);
        info!("sign recognition disabled");
    }

    /// Flip the state and return the new one.
    pub fn toggle(&mut self) -> Result<PipelineState> {
        match self.state() {
            PipelineState::Enabled => self.disable(),
            PipelineState::Disabled => self.enable()?,
        }
        Ok(self.state())
    }

    fn wait_for_inference(&self, handle: JoinHandle<()>) {
        let deadline = Instant::now() + self.config.shutdown_timeout;
        let poll_interval = Duration::from_millis(10);

        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                    "inference still running, detaching"
                );
                // Dropping the JoinHandle detaches the thread.
                return;
            }
            thread::sleep(poll_interval);
        }
        if let Err(panic) = handle.join() {
            error!("inference thread panicked: {}", panic_message(&*panic));
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.session.is_some() {
            PipelineState::Enabled
        } else {
            PipelineState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// Most recently published predictions of the current session.
    pub fn latest_predictions(&self) -> Option<Arc<PredictionSet>> {
        self.shared.latest().clone()
    }

    pub fn top_prediction(&self) -> Option<Prediction> {
        self.shared
            .latest()
            .as_ref()
            .and_then(|set| set.top().cloned())
    }

    pub fn buffer_fill_percent(&self) -> u8 {
        self.shared.buffer.fill_percent()
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            state: self.state(),
            buffer_fill_percent: self.buffer_fill_percent(),
            inference_in_flight: self.shared.gate.in_flight(),
            stats: self.shared.stats.snapshot(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn gloss_table(&self) -> &GlossTable {
        &self.shared.table
    }
}

impl Drop for PipelineOrchestrator {
    fn drop(&mut self) {
        self.disable();
    }
}

impl Shared {
    fn latest(&self) -> MutexGuard<'_, Option<Arc<PredictionSet>>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Empty the window and forget the published predictions.
    fn clear(&self) {
        self.buffer.clear();
        *self.latest() = None;
    }

    /// One inference over a full window. The gate is held for the duration.
    fn run_cycle(&self, running: &AtomicBool) {
        let frames = self.buffer.snapshot();
        if frames.len() < self.buffer.capacity() {
            return;
        }
        let Some(permit) = ThrottleGate::acquire(&self.gate, &self.clock) else {
            return;
        };
        if !running.load(Ordering::SeqCst) {
            permit.cancel();
            return;
        }

        let started = Instant::now();
        let result = self
            .assembler
            .build(&frames)
            .and_then(|input| self.engine.run(&input))
            .and_then(|output| self.ranker.rank(&output, &self.table));
        drop(permit);

        match result {
            Ok(predictions) => {
                let latency = started.elapsed();
                self.stats.inference_completed(latency);
                debug!(latency_ms = latency.as_millis() as u64, "inference complete");
                self.publish(running, predictions);
            }
            Err(e) => {
                self.stats.inference_failed();
                self.reporter
                    .report("inference", &StageError::Recoverable(e.to_string()));
            }
        }
    }

    /// Publish unless the session was disabled while the run was in flight.
    ///
    /// The running flag is checked under the same lock `clear` takes, so a
    /// late result can never reappear after `disable()`.
    fn publish(&self, running: &AtomicBool, predictions: PredictionSet) {
        let predictions = {
            let mut latest = self.latest();
            if !running.load(Ordering::SeqCst) {
                debug!("session disabled, discarding predictions");
                return;
            }
            let predictions = Arc::new(predictions);
            *latest = Some(predictions.clone());
            predictions
        };
        if let Some(top) = predictions.top() {
            info!(gloss = %top.label, confidence = %top.confidence(), "recognized sign");
        }

        // Not under `latest`: a slow sink must not hold up `disable()`.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.handle(&predictions) {
            self.reporter
                .report(sink.name(), &StageError::Recoverable(e.to_string()));
        }
    }
}

fn capture_loop(
    shared: &Shared,
    running: &AtomicBool,
    source: &mut dyn FrameSource,
    frame_tx: Sender<RawFrame>,
    period: Duration,
) {
    let mut consecutive_errors: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let tick = Instant::now();

        match source.capture_frame() {
            Ok(raw) => {
                if consecutive_errors > 0 {
                    info!(
                        source = source.name(),
                        failures = consecutive_errors,
                        "frame source recovered"
                    );
                    consecutive_errors = 0;
                }
                match frame_tx.try_send(raw) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => shared.stats.frame_dropped(),
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e) => {
                shared.stats.frame_dropped();
                consecutive_errors += 1;
                // One report per failure streak.
                if consecutive_errors == 1 {
                    shared
                        .reporter
                        .report("capture", &StageError::Recoverable(e.to_string()));
                }
            }
        }

        thread::sleep(period.saturating_sub(tick.elapsed()));
    }

    if let Err(e) = source.stop() {
        warn!(source = source.name(), "failed to stop frame source: {}", e);
    }
}

fn preprocess_loop(
    shared: &Shared,
    running: &AtomicBool,
    frame_rx: Receiver<RawFrame>,
    poll: Duration,
) {
    while running.load(Ordering::SeqCst) {
        let raw = match frame_rx.recv_timeout(poll) {
            Ok(raw) => raw,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        match shared.preprocessor.process(&raw) {
            Ok(frame) => {
                shared.buffer.push(frame);
                shared.stats.frame_captured();
            }
            Err(e) => {
                shared.stats.frame_dropped();
                shared
                    .reporter
                    .report("preprocess", &StageError::Recoverable(e.to_string()));
            }
        }
    }
}

fn inference_loop(shared: &Shared, running: &AtomicBool, poll: Duration) {
    while running.load(Ordering::SeqCst) {
        let tick = Instant::now();
        shared.run_cycle(running);
        thread::sleep(poll.saturating_sub(tick.elapsed()));
    }
}

/// Spawn a thread that takes ownership of `value` only once it is running.
///
/// If `spawn` fails, or the thread exits before taking the value, the value
/// is returned with the error instead of being dropped with the closure.
fn spawn_with_handoff<T, R>(
    value: T,
    spawn: impl FnOnce(Receiver<T>) -> std::io::Result<JoinHandle<R>>,
) -> std::result::Result<JoinHandle<R>, (GlossError, T)>
where
    T: Send + 'static,
{
    let (tx, rx) = bounded(1);
    let handle = match spawn(rx) {
        Ok(handle) => handle,
        Err(e) => return Err((e.into(), value)),
    };
    match tx.send(value) {
        Ok(()) => Ok(handle),
        Err(SendError(value)) => Err((
            GlossError::Other("thread exited before taking ownership".to_string()),
            value,
        )),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}
