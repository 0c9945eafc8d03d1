use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::capture::domain::capture_source::CaptureSource;
use crate::capture::domain::white_frame::is_likely_white_frame;
use crate::governor::domain::governor::Governor;
use crate::governor::domain::governor_config::GovernorConfig;
use crate::governor::domain::sampling_profile::SamplingProfile;
use crate::governor::domain::throttle_level::ThrottleLevel;
use crate::shared::clock::{Clock, MonotonicClock};
use crate::shared::constants::CAPTURE_THREAD_NAME;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::{copy_opaque, OpaqueBuffer};

use super::capture_worker::CaptureWorker;
use super::captured_frame::CapturedFrame;
use super::double_buffer::{Checkout, DoubleBuffer};
use super::frame_cell::{FrameCell, FrameWatcher};
use super::sampler_config::SamplerConfig;
use super::sampler_stats::SamplerStats;

/// Reports the display refresh rate in Hz.
pub type RefreshRateProvider = Box<dyn Fn() -> f32 + Send + Sync>;

/// Orchestrates backdrop captures: rate limiting, the single in-flight
/// attempt, double-buffered conversion, publication and clearing.
///
/// Callers on any thread invoke [`request_capture`](Self::request_capture)
/// every visual frame; at most one capture runs at a time on a background
/// worker. Consumers read the latest frame through
/// [`latest_frame`](Self::latest_frame) or a [`FrameWatcher`].
pub struct FrameSampler {
    inner: Arc<SamplerInner>,
}

struct SamplerInner {
    config: SamplerConfig,
    clock: Arc<dyn Clock>,
    refresh_rate: RefreshRateProvider,
    frames: FrameCell,
    state: Mutex<SamplerState>,
}

struct SamplerState {
    generation: u64,
    /// `None` means the next request is not rate limited.
    last_capture_at_ms: Option<u64>,
    governor: Governor,
    buffers: DoubleBuffer,
    in_flight: bool,
    pending_recycle: bool,
    pending_shutdown: bool,
    worker: Option<CaptureWorker>,
    /// Held weakly so the allocation stays reserved and its address cannot
    /// be handed to a different source.
    source: Option<Weak<dyn CaptureSource>>,
    last_version: u64,
    stats: Counters,
}

#[derive(Default)]
struct Counters {
    dispatched: u64,
    published: u64,
    failed: u64,
    rejected_white: u64,
    discarded: u64,
}

struct CaptureJob {
    source: Arc<dyn CaptureSource>,
    effective_fps: u32,
    blur_radius: u32,
    profile: SamplingProfile,
    generation: u64,
}

impl FrameSampler {
    pub fn new(config: SamplerConfig, refresh_rate: impl Fn() -> f32 + Send + Sync + 'static) -> Self {
        Self::with_clock(config, refresh_rate, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        mut config: SamplerConfig,
        refresh_rate: impl Fn() -> f32 + Send + Sync + 'static,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if let Err(e) = config.governor.validate() {
            log::warn!("Ignoring governor tuning, using defaults: {e}");
            config.governor = GovernorConfig::default();
        }
        let state = SamplerState {
            generation: 0,
            last_capture_at_ms: None,
            governor: Governor::new(config.governor.clone()),
            buffers: DoubleBuffer::new(),
            in_flight: false,
            pending_recycle: false,
            pending_shutdown: false,
            worker: None,
            source: None,
            last_version: 0,
            stats: Counters::default(),
        };
        Self {
            inner: Arc::new(SamplerInner {
                config,
                clock,
                refresh_rate: Box::new(refresh_rate),
                frames: FrameCell::new(),
                state: Mutex::new(state),
            }),
        }
    }

    /// Asks for a new capture if the rate limit and in-flight guard allow it.
    ///
    /// Never blocks on the capture itself. With no source, or when blur is
    /// unsupported, this clears instead. A source different from the previous
    /// request's also clears first. `force` bypasses the rate limit but not
    /// the in-flight guard.
    pub fn request_capture(
        &self,
        source: Option<&Arc<dyn CaptureSource>>,
        user_fps: u32,
        blur_radius: u32,
        profile: SamplingProfile,
        force: bool,
    ) {
        let inner = &self.inner;
        if !inner.config.blur_supported {
            self.clear(false);
            return;
        }
        let Some(source) = source else {
            self.clear(false);
            return;
        };

        let display_hz = (inner.refresh_rate)();
        let mut state = inner.lock();

        let same_source = state
            .source
            .as_ref()
            .is_some_and(|previous| previous.ptr_eq(&Arc::downgrade(source)));
        if !same_source {
            if state.source.is_some() {
                log::debug!("Capture source changed, discarding previous backdrop");
                inner.reset(&mut state);
            }
            state.source = Some(Arc::downgrade(source));
        }

        let now = inner.clock.now_ms();
        let effective_fps = state
            .governor
            .effective_fps(user_fps, display_hz, blur_radius, profile, now);
        let interval = (1000 / u64::from(effective_fps.max(1))).max(1);

        if !force {
            if let Some(last) = state.last_capture_at_ms {
                let elapsed = now.saturating_sub(last);
                if elapsed < interval {
                    return;
                }
                let cooling = state.governor.level() == ThrottleLevel::Critical
                    && state.governor.is_cooling_down(now);
                if cooling && elapsed < interval * 2 {
                    return;
                }
            }
        }
        if state.in_flight {
            return;
        }

        if state.worker.is_none() {
            match CaptureWorker::spawn(CAPTURE_THREAD_NAME) {
                Ok(worker) => state.worker = Some(worker),
                Err(e) => {
                    log::warn!("Failed to start capture worker: {e}");
                    return;
                }
            }
        }

        let job = CaptureJob {
            source: Arc::clone(source),
            effective_fps,
            blur_radius,
            profile,
            generation: state.generation,
        };
        let runner = Arc::clone(inner);
        let submitted = match &state.worker {
            Some(worker) => worker.submit(Box::new(move || runner.run(job))).is_ok(),
            None => false,
        };

        if submitted {
            state.in_flight = true;
            state.stats.dispatched += 1;
        } else {
            log::warn!("Capture worker is gone, restarting on next request");
            state.worker = None;
        }
    }

    /// Drops the published frame and resets throttling.
    ///
    /// With `recycle_buffers` the capture buffers are freed and the worker
    /// stopped, deferred until the in-flight attempt ends if there is one.
    pub fn clear(&self, recycle_buffers: bool) {
        let worker = {
            let mut state = self.inner.lock();
            self.inner.reset(&mut state);
            state.source = None;

            if !recycle_buffers {
                None
            } else if state.in_flight {
                state.pending_recycle = true;
                state.pending_shutdown = true;
                None
            } else {
                state.buffers.release();
                state.worker.take()
            }
        };
        if let Some(worker) = worker {
            worker.shutdown();
        }
    }

    pub fn latest_frame(&self) -> Option<CapturedFrame> {
        self.inner.frames.get()
    }

    /// Subscribes to publish and clear events.
    pub fn frames(&self) -> FrameWatcher {
        self.inner.frames.subscribe()
    }

    /// Rate the next request would be limited to.
    pub fn effective_fps(&self, user_fps: u32, blur_radius: u32, profile: SamplingProfile) -> u32 {
        let display_hz = (self.inner.refresh_rate)();
        let now = self.inner.clock.now_ms();
        self.inner
            .lock()
            .governor
            .effective_fps(user_fps, display_hz, blur_radius, profile, now)
    }

    pub fn throttle_level(&self) -> ThrottleLevel {
        self.inner.lock().governor.level()
    }

    pub fn is_capture_in_flight(&self) -> bool {
        self.inner.lock().in_flight
    }

    /// Current capture buffer resolution, `None` when released.
    pub fn buffer_size(&self) -> Option<ContentSize> {
        self.inner.lock().buffers.size()
    }

    pub fn stats(&self) -> SamplerStats {
        let state = self.inner.lock();
        SamplerStats {
            dispatched: state.stats.dispatched,
            published: state.stats.published,
            failed: state.stats.failed,
            rejected_white: state.stats.rejected_white,
            discarded: state.stats.discarded,
            buffer_allocations: state.buffers.allocations(),
            level: state.governor.level(),
            failure_streak: state.governor.failure_streak(),
            average_cost_ms: state.governor.average_cost_ms(),
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.clear(true);
    }
}

impl SamplerInner {
    fn lock(&self) -> MutexGuard<'_, SamplerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates in-flight work and forgets throttling history.
    fn reset(&self, state: &mut SamplerState) {
        state.generation += 1;
        state.last_capture_at_ms = None;
        state.governor.reset();
        self.frames.set(None);
    }

    /// Worker entry point for one attempt.
    fn run(&self, job: CaptureJob) {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.capture(&job)));
        if attempt.is_err() {
            log::error!("Capture source panicked, attempt abandoned");
        }
        self.finish();
    }

    fn capture(&self, job: &CaptureJob) {
        let source_size = job.source.size();
        if source_size.is_empty() {
            log::trace!("Capture source has no size yet");
            return;
        }

        let (mut lent, quality_scale, blur_radius_factor) = {
            let mut state = self.lock();
            if state.generation != job.generation {
                state.stats.discarded += 1;
                return;
            }
            let quality_scale = state.governor.capture_scale(job.blur_radius, job.profile);
            let blur_radius_factor = state.governor.blur_radius_factor(job.profile);
            let capture_size = source_size.scaled(quality_scale);
            if state.buffers.ensure(capture_size) {
                log::debug!(
                    "Allocated capture buffers {}x{} (scale {quality_scale:.2})",
                    capture_size.width,
                    capture_size.height
                );
            }
            let Some(lent) = state.buffers.checkout() else {
                return;
            };
            (lent, quality_scale, blur_radius_factor)
        };

        let started = self.clock.now_ms();
        let rejected_white = match job.source.capture(&mut lent.raw) {
            Ok(()) => job.source.reject_likely_white_frame() && is_likely_white_frame(&lent.raw),
            Err(e) => {
                log::debug!("Backdrop capture failed: {e}");
                self.fail(job, lent, false);
                return;
            }
        };
        if rejected_white {
            log::debug!("Rejected likely blank backdrop frame");
            self.fail(job, lent, true);
            return;
        }

        let previous = std::mem::replace(&mut lent.opaque, Arc::new(OpaqueBuffer::new(0, 0)));
        let mut opaque = match Arc::try_unwrap(previous) {
            Ok(buffer) => buffer,
            Err(shared) => OpaqueBuffer::new(shared.width(), shared.height()),
        };
        copy_opaque(&lent.raw, &mut opaque);
        lent.opaque = Arc::new(opaque);

        self.publish(job, lent, source_size, quality_scale, blur_radius_factor, started);
    }

    fn publish(
        &self,
        job: &CaptureJob,
        lent: Checkout,
        source_size: ContentSize,
        quality_scale: f32,
        blur_radius_factor: f32,
        started_ms: u64,
    ) {
        let mut state = self.lock();
        if state.generation != job.generation {
            state.stats.discarded += 1;
            state.buffers.checkin(lent);
            return;
        }

        let now = self.clock.now_ms();
        let version = now.max(state.last_version + 1);
        state.last_version = version;
        self.frames.set(Some(CapturedFrame::new(
            Arc::clone(&lent.opaque),
            source_size,
            quality_scale,
            blur_radius_factor,
            version,
        )));

        state
            .governor
            .record_success(now.saturating_sub(started_ms), job.effective_fps, now, job.profile);
        state.buffers.checkin(lent);
        state.buffers.flip();
        state.last_capture_at_ms = Some(now);
        state.stats.published += 1;
    }

    fn fail(&self, job: &CaptureJob, lent: Checkout, rejected_white: bool) {
        let mut state = self.lock();
        state.buffers.checkin(lent);
        if state.generation != job.generation {
            state.stats.discarded += 1;
            return;
        }

        let now = self.clock.now_ms();
        state.governor.record_failure(job.effective_fps, now, job.profile);
        state.last_capture_at_ms = Some(now);
        state.stats.failed += 1;
        if rejected_white {
            state.stats.rejected_white += 1;
        }
    }

    /// Runs after every attempt, including ones that panicked.
    fn finish(&self) {
        let worker = {
            let mut state = self.lock();
            state.in_flight = false;
            if state.pending_recycle {
                state.pending_recycle = false;
                state.buffers.release();
                log::debug!("Released capture buffers after in-flight attempt");
            }
            if state.pending_shutdown {
                state.pending_shutdown = false;
                state.worker.take()
            } else {
                None
            }
        };
        if let Some(worker) = worker {
            worker.shutdown();
        }
    }
}
