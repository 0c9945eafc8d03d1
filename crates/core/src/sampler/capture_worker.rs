use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};

/// Unit of work executed on the capture thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single background thread that runs capture jobs in submission order.
pub struct CaptureWorker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (jobs, queue) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in queue {
                    job();
                }
                log::debug!("Capture worker stopped");
            })?;
        Ok(Self {
            jobs: Some(jobs),
            handle: Some(handle),
        })
    }

    /// Queues a job. Hands it back if the thread is gone.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        match &self.jobs {
            Some(jobs) => jobs.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }

    /// Stops accepting work and waits for queued jobs to finish.
    ///
    /// Called from the worker thread itself it only closes the queue; the
    /// thread exits once the current job returns.
    pub fn shutdown(mut self) {
        self.jobs = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::warn!("Capture worker panicked during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_in_order_on_named_thread() {
        let worker = CaptureWorker::spawn("test-capture").unwrap();
        let (tx, rx) = bounded(3);
        for i in 0..3 {
            let tx = tx.clone();
            let submitted = worker
                .submit(Box::new(move || {
                    let name = thread::current().name().map(str::to_string);
                    tx.send((i, name)).unwrap();
                }));
            assert!(submitted.is_ok());
        }
        for expected in 0..3 {
            let (i, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(i, expected);
            assert_eq!(name.as_deref(), Some("test-capture"));
        }
        worker.shutdown();
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let worker = CaptureWorker::spawn("test-capture").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let count = Arc::clone(&count);
            let submitted = worker
                .submit(Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }));
            assert!(submitted.is_ok());
        }
        worker.shutdown();
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_shutdown_from_worker_thread_does_not_deadlock() {
        let worker = CaptureWorker::spawn("test-capture").unwrap();
        let (slot_tx, slot_rx) = bounded::<CaptureWorker>(1);
        let (done_tx, done_rx) = bounded(1);
        let submitted = worker
            .submit(Box::new(move || {
                let me = slot_rx.recv().unwrap();
                me.shutdown();
                done_tx.send(()).unwrap();
            }));
        assert!(submitted.is_ok());
        slot_tx.send(worker).unwrap();
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
