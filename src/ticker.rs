//! Cancellable periodic task on the tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// A callback invoked every `period` until stopped.
///
/// The first invocation happens one full period after spawning. Stopping is
/// idempotent and also happens on drop.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &'static str, period: Duration, mut callback: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);
        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; skip it so the first tick lands after one period
            timer.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = timer.tick() => {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        callback(n);
                    }
                }
            }
        });
        Self {
            name,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            ticks,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task to stop. Safe to call any number of times.
    pub fn stop(&mut self) -> bool {
        match self.stop_tx.take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Stop and wait for the task to exit.
    pub async fn join(mut self) -> u64 {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.ticks()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let task = PeriodicTask::spawn("test", Duration::from_secs(30), move |n| {
            sink.lock().unwrap().push(n);
        });
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(task.ticks(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(task.join().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut task = PeriodicTask::spawn("test", Duration::from_secs(1), |_| {});
        assert!(task.is_running());
        assert!(task.stop());
        assert!(!task.stop());
        assert!(!task.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(task.ticks(), 0);
        assert_eq!(task.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let mut task = PeriodicTask::spawn("test", Duration::from_secs(10), |_| {});
        tokio::time::sleep(Duration::from_secs(25)).await;
        task.stop();
        let at_stop = task.ticks();
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(task.ticks(), at_stop);
        assert_eq!(at_stop, 2);
    }
}
