use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::config::RetryPolicy;

/// Run `action` until it succeeds or the policy's retries are used up. The
/// last error is returned unchanged.
pub fn with_retry<T>(policy: RetryPolicy, label: &str, action: impl FnMut() -> Result<T>) -> Result<T> {
    with_retry_sleeping(policy, label, action, thread::sleep)
}

pub(crate) fn with_retry_sleeping<T>(
    policy: RetryPolicy,
    label: &str,
    mut action: impl FnMut() -> Result<T>,
    mut sleep: impl FnMut(Duration),
) -> Result<T> {
    let mut attempt = 0;
    loop {
        match action() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.retries => {
                let delay = policy.delay_for(attempt);
                log::debug!("{label} attempt {} failed, retrying in {delay:?}: {err:#}", attempt + 1);
                sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;

    use super::with_retry_sleeping;
    use crate::config::RetryPolicy;

    #[test]
    fn retries_twice_with_linear_backoff_then_fails() {
        let mut calls = 0;
        let mut delays = Vec::new();
        let result: anyhow::Result<()> = with_retry_sleeping(
            RetryPolicy::default(),
            "teams",
            || {
                calls += 1;
                Err(anyhow!("http 503"))
            },
            |d| delays.push(d),
        );
        let err = result.expect_err("should fail");
        assert_eq!(err.to_string(), "http 503");
        assert_eq!(calls, 3);
        assert_eq!(delays, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn stops_at_first_success() {
        let mut calls = 0;
        let mut slept = 0;
        let value = with_retry_sleeping(
            RetryPolicy::default(),
            "roster",
            || {
                calls += 1;
                if calls < 2 { Err(anyhow!("reset")) } else { Ok(42) }
            },
            |_| slept += 1,
        )
        .expect("second attempt succeeds");
        assert_eq!(value, 42);
        assert_eq!(calls, 2);
        assert_eq!(slept, 1);
    }

    #[test]
    fn no_retry_policy_calls_once() {
        let mut calls = 0;
        let result: anyhow::Result<()> = with_retry_sleeping(
            RetryPolicy::none(),
            "bio",
            || {
                calls += 1;
                Err(anyhow!("boom"))
            },
            |_| panic!("should not sleep"),
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
