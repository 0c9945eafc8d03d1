use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use crossbeam_channel::{Sender, TrySendError};
use image::imageops::{self, FilterType};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::content_surface::{ContentSurface, CopyResult, CopySurface};
use crate::shared::constants::{COPY_QUEUE_DEPTH, COPY_THREAD_NAME};
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

/// In-memory surface a producer presents rendered frames into.
///
/// Implements both [`ContentSurface`] (synchronous scaled draw) and
/// [`CopySurface`] (copies serviced on a dedicated dispatcher thread), so the
/// same content can back either kind of capture source.
pub struct SharedSurface {
    content: RwLock<Option<Arc<CaptureBuffer>>>,
    dispatcher: Option<Sender<CopyJob>>,
}

struct CopyJob {
    content: Arc<CaptureBuffer>,
    width: u32,
    height: u32,
    done: Sender<CopyResult>,
}

impl SharedSurface {
    pub fn new() -> Self {
        Self {
            content: RwLock::new(None),
            dispatcher: spawn_dispatcher(),
        }
    }

    /// Replaces the current content.
    pub fn present(&self, frame: CaptureBuffer) {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(frame));
    }

    /// Detaches the content; the surface reports an empty size afterwards.
    pub fn clear(&self) {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn snapshot(&self) -> Option<Arc<CaptureBuffer>> {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for SharedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSurface for SharedSurface {
    fn size(&self) -> ContentSize {
        self.snapshot()
            .map(|c| ContentSize::from(c.dimensions()))
            .unwrap_or(ContentSize::ZERO)
    }

    fn draw_scaled(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError> {
        let content = self.snapshot().ok_or(CaptureError::NotReady)?;
        let scaled = scale_to(&content, target.width(), target.height())?;
        target.copy_from_slice(scaled.as_raw());
        Ok(())
    }
}

impl CopySurface for SharedSurface {
    fn size(&self) -> ContentSize {
        ContentSurface::size(self)
    }

    fn request_copy(&self, width: u32, height: u32, done: Sender<CopyResult>) {
        let Some(content) = self.snapshot() else {
            let _ = done.send(Err(CaptureError::NotReady));
            return;
        };
        let Some(dispatcher) = &self.dispatcher else {
            let _ = done.send(Err(CaptureError::Disconnected));
            return;
        };
        let job = CopyJob {
            content,
            width,
            height,
            done,
        };
        match dispatcher.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                log::trace!("Copy dispatcher busy, skipping request");
                let _ = job.done.send(Err(CaptureError::NotReady));
            }
            Err(TrySendError::Disconnected(job)) => {
                let _ = job.done.send(Err(CaptureError::Disconnected));
            }
        }
    }
}

fn scale_to(content: &CaptureBuffer, width: u32, height: u32) -> Result<CaptureBuffer, CaptureError> {
    if width == 0 || height == 0 || content.width() == 0 || content.height() == 0 {
        return Err(CaptureError::NotReady);
    }
    if content.dimensions() == (width, height) {
        return Ok(content.clone());
    }
    Ok(imageops::resize(content, width, height, FilterType::Triangle))
}

/// Starts the copy dispatcher. The thread exits once the surface (the only
/// sender) is dropped. At most one copy waits behind the running one.
fn spawn_dispatcher() -> Option<Sender<CopyJob>> {
    let (tx, rx) = crossbeam_channel::bounded::<CopyJob>(COPY_QUEUE_DEPTH);
    let spawned = thread::Builder::new()
        .name(COPY_THREAD_NAME.into())
        .spawn(move || {
            for job in rx {
                let result = scale_to(&job.content, job.width, job.height);
                let _ = job.done.send(result);
            }
        });
    match spawned {
        Ok(_) => Some(tx),
        Err(e) => {
            log::warn!("Failed to start copy dispatcher, copies will fail: {e}");
            None
        }
    }
}
