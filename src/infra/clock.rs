use crate::app::ports::ClockPort;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock pacing backed by the tokio timer.
pub struct TokioClock {
    origin: Instant,
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

#[async_trait]
impl ClockPort for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
