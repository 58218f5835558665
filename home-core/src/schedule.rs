use std::{future::Future, pin::Pin, time::Duration};
use tokio::task::JoinHandle;
use tracing::debug;

type StepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Step = Box<dyn FnOnce() -> StepFuture + Send>;

/// A list of callbacks, each run after a delay relative to the previous step.
#[derive(Default)]
pub struct Sequence {
    steps: Vec<(Duration, Step)>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<F>(self, delay: Duration, step: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.then_async(delay, move || async move { step() })
    }

    pub fn then_async<F, Fut>(mut self, delay: Duration, step: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let step: Step = Box::new(move || Box::pin(step()) as StepFuture);
        self.steps.push((delay, step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Must be called from within a tokio runtime.
    pub fn start(self) -> SequenceHandle {
        let handle = tokio::task::spawn(async move {
            let total = self.steps.len();
            for (i, (delay, step)) in self.steps.into_iter().enumerate() {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!(step = i + 1, total, "running sequence step");
                step().await;
            }
        });
        SequenceHandle { handle: Some(handle) }
    }
}

/// Dropping the handle leaves the sequence running; call `cancel` to stop it.
#[derive(Debug)]
pub struct SequenceHandle {
    handle: Option<JoinHandle<()>>,
}

impl SequenceHandle {
    /// Return true if the sequence was still running and got aborted.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}
