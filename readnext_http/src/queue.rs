use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{mpsc, oneshot, Semaphore};

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_INTER_OP_DELAY: Duration = Duration::from_millis(100);

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// FIFO scheduler that bounds how many submitted operations run at once and
/// spaces out slot reuse by a fixed delay. Decoupled from the API client so
/// it can wrap any future, e.g. bulk per-user recommendation fetches.
///
/// One operation's failure never cancels or blocks the others.
#[derive(Clone)]
pub struct RequestQueue {
    jobs: mpsc::UnboundedSender<Job>,
}

impl RequestQueue {
    /// Must be called from within a tokio runtime; the admission loop runs
    /// as a background task and stops once every clone of the queue is gone.
    pub fn new(max_concurrent: usize, inter_op_delay: Duration) -> Self {
        let (jobs, mut pending) = mpsc::unbounded_channel::<Job>();
        let slots = Arc::new(Semaphore::new(max_concurrent.max(1)));

        tokio::spawn(async move {
            while let Some(job) = pending.recv().await {
                // Admission: wait for a free slot before touching the next
                // job, so start order matches submission order.
                let Ok(permit) = slots.clone().acquire_owned().await else {
                    break;
                };
                tokio::spawn(async move {
                    job.await;
                    tokio::time::sleep(inter_op_delay).await;
                    drop(permit);
                });
            }
            debug!("request queue dispatcher stopped");
        });

        Self { jobs }
    }

    /// Appends `operation` to the waiting list and returns a handle that
    /// resolves with the operation's own output, success or failure alike.
    /// The handle errors only if the queue was torn down before the
    /// operation got to run.
    pub fn submit<F, T>(&self, operation: F) -> oneshot::Receiver<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = tx.send(operation.await);
        });
        if self.jobs.send(job).is_err() {
            debug!("request queue dispatcher is gone, dropping operation");
        }
        rx
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT, DEFAULT_INTER_OP_DELAY)
    }
}
