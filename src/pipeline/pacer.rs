use crate::app::ports::ClockPort;
use crate::error::{PipelineError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spaces out calls to a rate-limited service.
///
/// The marker starts at construction time and moves to the completion time of every
/// call (`complete`). `wait` sleeps until `interval` has passed since the marker, so
/// the gap between two call starts is never shorter than `interval` and a slow call
/// earns no credit toward the next one.
pub struct Pacer {
    clock: Arc<dyn ClockPort>,
    interval: Duration,
    marker: Duration,
}

impl Pacer {
    pub fn new(clock: Arc<dyn ClockPort>, interval: Duration) -> Self {
        let marker = clock.now();
        Self {
            clock,
            interval,
            marker,
        }
    }

    /// Blocks until the next call may start, or fails with `Cancelled`.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let elapsed = self.clock.now().saturating_sub(self.marker);
        let remaining = self.interval.saturating_sub(elapsed);
        if remaining.is_zero() {
            return Ok(());
        }

        debug!("Rate limiting: waiting {:?}", remaining);
        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = self.clock.sleep(remaining) => Ok(()),
        }
    }

    /// Records that the call just finished.
    pub fn complete(&mut self) {
        self.marker = self.clock.now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ManualClock {
        now: Mutex<Duration>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    #[async_trait]
    impl ClockPort for ManualClock {
        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }

    #[tokio::test]
    async fn test_first_wait_counts_from_construction() {
        let clock = Arc::new(ManualClock::default());
        let mut pacer = Pacer::new(clock.clone(), Duration::from_millis(1010));
        clock.advance(Duration::from_millis(300));

        pacer.wait(&CancellationToken::new()).await.unwrap();

        assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_millis(710)]);
    }

    #[tokio::test]
    async fn test_slow_call_banks_no_credit() {
        let clock = Arc::new(ManualClock::default());
        let mut pacer = Pacer::new(clock.clone(), Duration::from_millis(1000));
        let cancel = CancellationToken::new();

        pacer.wait(&cancel).await.unwrap();
        clock.advance(Duration::from_secs(5));
        pacer.complete();
        pacer.wait(&cancel).await.unwrap();

        assert_eq!(
            *clock.sleeps.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let clock = Arc::new(ManualClock::default());
        let mut pacer = Pacer::new(clock.clone(), Duration::from_millis(1000));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pacer.wait(&cancel).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert!(clock.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let clock = Arc::new(crate::infra::clock::TokioClock::new());
        let mut pacer = Pacer::new(clock, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = pacer.wait(&cancel).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
