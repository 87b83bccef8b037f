//! Deadline-bounded polling
//!
//! Every wait in the page layer is a probe run repeatedly until it yields a
//! value or the deadline passes. The probe reports why it is not ready yet
//! as a [`LookupError`]; on timeout the last of those is kept as the cause.
//! Failures that polling cannot cure, such as a dropped connection, end the
//! wait at once.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::error::LookupError;

/// Delay between two probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default horizon for `wait_and_get` / `wait_and_get_all`.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default horizon for click, type, read and scroll helpers.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default implicit-wait horizon set by `wait_for_load`.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a probe, or the whole wait, did not produce a value.
#[derive(Debug, PartialEq)]
pub enum ProbeError<E> {
    /// Not ready yet. Polled again until the deadline, after which it comes
    /// back wrapped in [`LookupError::Timeout`].
    Lookup(LookupError),

    /// Returned as soon as a probe reports it.
    Fatal(E),
}

impl<E> From<LookupError> for ProbeError<E> {
    fn from(e: LookupError) -> Self {
        ProbeError::Lookup(e)
    }
}

/// Run `probe` until it succeeds, fails fatally, or `timeout` elapses.
///
/// The probe always runs at least once, so a zero timeout is a single
/// attempt. The sleep before the next probe never overshoots the deadline.
pub async fn poll_until<T, E, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, ProbeError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProbeError<E>>>,
{
    let start = Instant::now();

    loop {
        let last = match probe().await {
            Ok(value) => return Ok(value),
            Err(ProbeError::Lookup(e)) => e,
            Err(fatal) => return Err(fatal),
        };

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            log::debug!("wait gave up after {:?}: {}", elapsed, last);
            return Err(ProbeError::Lookup(LookupError::Timeout {
                timeout,
                last: Box::new(last),
            }));
        }

        sleep(interval.min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    type Probe = ProbeError<&'static str>;

    #[tokio::test]
    async fn returns_immediately_when_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = poll_until(Duration::from_secs(5), DEFAULT_POLL_INTERVAL, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Probe>(42)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keeps_polling_until_probe_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = poll_until(Duration::from_secs(5), Duration::from_millis(10), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err::<_, Probe>(LookupError::NotVisible.into())
                } else {
                    Ok("visible")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "visible");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn timeout_keeps_last_condition() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = Instant::now();

        let err = poll_until(Duration::from_millis(200), Duration::from_millis(20), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err::<(), Probe>(LookupError::NoSuchElement.into())
                } else {
                    Err(LookupError::NotVisible.into())
                }
            }
        })
        .await
        .unwrap_err();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(2), "wait overran: {:?}", elapsed);
        assert_eq!(
            err,
            ProbeError::Lookup(LookupError::Timeout {
                timeout: Duration::from_millis(200),
                last: Box::new(LookupError::NotVisible),
            })
        );
        assert!(calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn zero_timeout_is_a_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = poll_until(Duration::ZERO, DEFAULT_POLL_INTERVAL, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), Probe>(LookupError::NoSuchElement.into())
            }
        })
        .await
        .unwrap_err();

        match err {
            ProbeError::Lookup(cause) => assert_eq!(cause.innermost(), &LookupError::NoSuchElement),
            other => panic!("expected a lookup failure, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fatal_failure_ends_wait_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = Instant::now();

        let err = poll_until(Duration::from_secs(5), Duration::from_millis(20), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), Probe>(ProbeError::Fatal("oneshot canceled"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err, ProbeError::Fatal("oneshot canceled"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn query_failures_keep_polling() {
        let err = poll_until(Duration::from_millis(100), Duration::from_millis(20), || async {
            Err::<(), Probe>(LookupError::Query("bad selector".to_string()).into())
        })
        .await
        .unwrap_err();

        match err {
            ProbeError::Lookup(LookupError::Timeout { last, .. }) => {
                assert_eq!(*last, LookupError::Query("bad selector".to_string()))
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }
}
