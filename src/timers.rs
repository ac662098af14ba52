//! Debounced input and the periodic clock tick.
//!
//! Both run as tokio tasks and report through unbounded channels, so the
//! dashboard that consumes them stays on the caller's task.

use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::trace;

/// Emits a value once input has been quiet for `delay`.
///
/// Each push cancels the pending one, so only the last value of a burst is
/// delivered. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    tx: UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn channel(delay: Duration) -> (Self, UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                tx,
                pending: None,
            },
            rx,
        )
    }

    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            // receiver gone means nobody is listening any more
            let _ = tx.send(value);
        }));
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                trace!("debounced value superseded");
            }
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Periodic tick, stopped on [`Ticker::stop`] or drop.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Start ticking every `period`; the first tick arrives after one period.
    pub fn channel(period: Duration) -> (Self, UnboundedReceiver<Instant>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await;
            loop {
                let at = ticks.tick().await;
                if tx.send(at).is_err() {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_debouncer_delivers_last_value_only() {
        let (mut debouncer, mut rx) = Debouncer::channel(Duration::from_millis(40));
        debouncer.push("v".to_string());
        debouncer.push("vi".to_string());
        debouncer.push("vik".to_string());

        let got = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert_eq!(got.as_deref(), Some("vik"));

        sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_value() {
        let (mut debouncer, mut rx) = Debouncer::channel(Duration::from_millis(30));
        debouncer.push(1_u32);
        debouncer.cancel();
        sleep(Duration::from_millis(90)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ticker_ticks_until_stopped() {
        let (ticker, mut rx) = Ticker::channel(Duration::from_millis(20));
        for _ in 0..2 {
            assert!(timeout(Duration::from_secs(2), rx.recv()).await.unwrap().is_some());
        }
        ticker.stop();
        let closed = timeout(Duration::from_secs(2), async { while rx.recv().await.is_some() {} }).await;
        assert!(closed.is_ok());
    }
}
