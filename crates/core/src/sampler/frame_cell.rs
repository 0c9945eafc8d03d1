use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::captured_frame::CapturedFrame;

struct CellInner {
    value: Mutex<Option<CapturedFrame>>,
    watchers: Mutex<Vec<Sender<()>>>,
}

/// Latest-value holder for the published frame.
///
/// Readers always see the most recent value; intermediate values may be
/// skipped. Watchers get a coalesced change signal.
#[derive(Clone)]
pub struct FrameCell {
    inner: Arc<CellInner>,
}

/// Subscription handle returned by [`FrameCell::subscribe`].
pub struct FrameWatcher {
    inner: Arc<CellInner>,
    signal: Receiver<()>,
}

impl FrameCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CellInner {
                value: Mutex::new(None),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> Option<CapturedFrame> {
        self.inner.current()
    }

    /// Replaces the value and signals watchers. Clearing an already empty
    /// cell is silent.
    pub fn set(&self, frame: Option<CapturedFrame>) {
        {
            let mut value = lock(&self.inner.value);
            if value.is_none() && frame.is_none() {
                return;
            }
            *value = frame;
        }
        lock(&self.inner.watchers).retain(|watcher| match watcher.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        });
    }

    pub fn subscribe(&self) -> FrameWatcher {
        let (sender, signal) = bounded(1);
        lock(&self.inner.watchers).push(sender);
        FrameWatcher {
            inner: Arc::clone(&self.inner),
            signal,
        }
    }

    pub fn watcher_count(&self) -> usize {
        lock(&self.inner.watchers).len()
    }
}

impl Default for FrameCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWatcher {
    pub fn current(&self) -> Option<CapturedFrame> {
        self.inner.current()
    }

    /// Consumes a pending change signal, if any.
    pub fn has_changed(&self) -> bool {
        self.signal.try_recv().is_ok()
    }

    /// Blocks until the value changes or `timeout` elapses.
    pub fn wait_changed(&self, timeout: Duration) -> bool {
        self.signal.recv_timeout(timeout).is_ok()
    }
}

impl CellInner {
    fn current(&self) -> Option<CapturedFrame> {
        lock(&self.value).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::content_size::ContentSize;
    use image::RgbImage;

    fn frame(version: u64) -> CapturedFrame {
        CapturedFrame::new(Arc::new(RgbImage::new(2, 2)), ContentSize::new(4, 4), 0.5, 0.5, version)
    }

    #[test]
    fn test_get_returns_latest() {
        let cell = FrameCell::new();
        assert!(cell.get().is_none());
        cell.set(Some(frame(1)));
        cell.set(Some(frame(2)));
        assert_eq!(cell.get().map(|f| f.version()), Some(2));
    }

    #[test]
    fn test_watcher_signals_are_coalesced() {
        let cell = FrameCell::new();
        let watcher = cell.subscribe();
        assert!(!watcher.has_changed());

        cell.set(Some(frame(1)));
        cell.set(Some(frame(2)));
        assert!(watcher.has_changed());
        assert!(!watcher.has_changed());
        assert_eq!(watcher.current().map(|f| f.version()), Some(2));
    }

    #[test]
    fn test_clearing_empty_cell_is_silent() {
        let cell = FrameCell::new();
        let watcher = cell.subscribe();
        cell.set(None);
        assert!(!watcher.has_changed());
    }

    #[test]
    fn test_clear_notifies() {
        let cell = FrameCell::new();
        cell.set(Some(frame(1)));
        let watcher = cell.subscribe();
        cell.set(None);
        assert!(watcher.has_changed());
        assert!(watcher.current().is_none());
    }

    #[test]
    fn test_dropped_watchers_are_pruned() {
        let cell = FrameCell::new();
        let kept = cell.subscribe();
        drop(cell.subscribe());
        assert_eq!(cell.watcher_count(), 2);

        cell.set(Some(frame(1)));
        assert_eq!(cell.watcher_count(), 1);
        assert!(kept.has_changed());
    }

    #[test]
    fn test_wait_changed_across_threads() {
        let cell = FrameCell::new();
        let watcher = cell.subscribe();
        let publisher = cell.clone();
        let handle = std::thread::spawn(move || publisher.set(Some(frame(3))));
        assert!(watcher.wait_changed(Duration::from_secs(5)));
        handle.join().unwrap();
        assert_eq!(watcher.current().map(|f| f.version()), Some(3));
    }

    #[test]
    fn test_wait_changed_times_out() {
        let cell = FrameCell::new();
        let watcher = cell.subscribe();
        assert!(!watcher.wait_changed(Duration::from_millis(5)));
    }
}
