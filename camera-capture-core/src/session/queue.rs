use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use crate::models::error::CaptureError;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Cloneable handle for scheduling work on a `SessionQueue`.
#[derive(Clone)]
pub struct QueueHandle {
    sender: Sender<Message>,
    worker: ThreadId,
}

impl QueueHandle {
    /// Schedule `job` to run after everything already queued.
    ///
    /// Returns `false` if the queue has shut down; the job is dropped.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Message::Run(Box::new(job))).is_err() {
            log::warn!("Session queue is shut down; dropping job");
            return false;
        }
        true
    }

    /// Block until every job queued before this call has run.
    ///
    /// Returns immediately when called from the worker itself.
    pub fn flush(&self) {
        if self.is_current() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        if self.dispatch(move || {
            let _ = tx.send(());
        }) {
            let _ = rx.recv();
        }
    }

    /// Whether the calling thread is the queue's worker.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker
    }
}

/// Dedicated single-worker job queue.
///
/// Every job runs on one named thread in submission order, so jobs never
/// overlap. Dropping the queue runs the jobs already submitted, then joins
/// the worker.
pub struct SessionQueue {
    handle: QueueHandle,
    worker: Option<JoinHandle<()>>,
}

impl SessionQueue {
    pub fn new(name: &str) -> Result<Self, CaptureError> {
        let (sender, receiver) = mpsc::channel::<Message>();

        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Run(job) => run(job),
                        Message::Shutdown => break,
                    }
                }
                // Jobs scheduled by the last jobs before shutdown still run.
                while let Ok(message) = receiver.try_recv() {
                    if let Message::Run(job) = message {
                        run(job);
                    }
                }
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn session queue: {}", e)))?;

        Ok(Self {
            handle: QueueHandle {
                sender,
                worker: worker.thread().id(),
            },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.dispatch(job)
    }

    pub fn flush(&self) {
        self.handle.flush();
    }
}

fn run(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::error!("Session queue job panicked");
    }
}

impl Drop for SessionQueue {
    fn drop(&mut self) {
        let _ = self.handle.sender.send(Message::Shutdown);
        if let Some(worker) = self.worker.take() {
            if self.handle.is_current() {
                return;
            }
            let _ = worker.join();
        }
    }
}
