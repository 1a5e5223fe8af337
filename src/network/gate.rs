use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::LinkFault;

/// Bounded wait for the backing service to become resolvable.
///
/// Attempts run back to back with `poll_interval` between them; the whole
/// wait never exceeds `max_wait`. Nothing runs in the background: a caller
/// that gives up leaves no retry loop behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationGate {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for ActivationGate {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(5),
        }
    }
}

impl ActivationGate {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Run `attempt` until it succeeds or the budget is spent.
    /// Returns the last fault seen on timeout.
    pub async fn wait_for<T, F, Fut>(&self, mut attempt: F) -> Result<T, LinkFault>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LinkFault>>,
    {
        let deadline = Instant::now() + self.max_wait;
        let mut tries = 0u32;

        loop {
            tries += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let fault = match tokio::time::timeout(remaining, attempt()).await {
                Ok(Ok(value)) => {
                    debug!("Activation gate open after {} attempt(s)", tries);
                    return Ok(value);
                }
                Ok(Err(fault)) => fault,
                Err(_) => LinkFault::Timeout(self.max_wait.as_millis() as u64),
            };

            if Instant::now() + self.poll_interval >= deadline {
                debug!("Activation gate gave up after {} attempt(s): {}", tries, fault);
                return Err(fault);
            }
            debug!("Backing service not ready ({}), retrying", fault);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn gate() -> ActivationGate {
        ActivationGate::new(Duration::from_millis(100), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn opens_once_the_service_appears() {
        let calls = &AtomicU32::new(0);
        let result = gate()
            .wait_for(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(LinkFault::Unreachable("not yet".into()))
                } else {
                    Ok("ready")
                }
            })
            .await;

        assert_eq!(result, Ok("ready"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_wait() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<(), _> = gate()
            .wait_for(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LinkFault::Unreachable("down".into()))
            })
            .await;

        assert_eq!(result, Err(LinkFault::Unreachable("down".into())));
        assert!(started.elapsed() <= Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempt_is_cut_at_the_deadline() {
        let result: Result<(), _> = gate()
            .wait_for(|| std::future::pending::<Result<(), LinkFault>>())
            .await;
        assert_eq!(result, Err(LinkFault::Timeout(1000)));
    }
}
