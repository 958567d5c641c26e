use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

pub trait Timer {
    fn timestamp(&self) -> u32;
}

/// Server clock: whole seconds since startup, ticked by a background task.
/// Expiration deadlines are expressed on this clock.
pub struct SystemTimer {
    seconds: AtomicU32,
    cancellation_token: CancellationToken,
}

impl SystemTimer {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        debug!("Creating system timer");
        SystemTimer {
            seconds: AtomicU32::new(0),
            cancellation_token,
        }
    }

    pub async fn run(&self) {
        let start = Instant::now();
        let mut interval = interval_at(start, Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.add_second();
                    trace!("Server tick: {}", self.timestamp());
                }
                _ = self.cancellation_token.cancelled() => {
                    debug!("System timer stopped");
                    return;
                }
            }
        }
    }

    fn add_second(&self) {
        self.seconds.fetch_add(1, Ordering::Release);
    }
}

impl Timer for SystemTimer {
    fn timestamp(&self) -> u32 {
        self.seconds.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_timestamp() {
        let timer = SystemTimer::new(CancellationToken::new());
        assert_eq!(timer.timestamp(), 0);
    }

    #[test]
    fn test_add_second() {
        let timer = SystemTimer::new(CancellationToken::new());
        timer.add_second();
        assert_eq!(timer.timestamp(), 1);
        timer.add_second();
        assert_eq!(timer.timestamp(), 2);
    }

    #[tokio::test]
    async fn test_run_increments_time() {
        let token = CancellationToken::new();
        let timer = Arc::new(SystemTimer::new(token.clone()));
        let timer_clone = Arc::clone(&timer);

        let handle = tokio::spawn(async move {
            timer_clone.run().await;
        });

        tokio::time::sleep(Duration::from_millis(2100)).await;
        token.cancel();
        handle.await.unwrap();
        assert!(timer.timestamp() >= 2);
    }
}
