//! A plain bounded retry loop, not a scheduler — sleeping happens
//! synchronously in whichever worker calls `retry_with`.

use std::time::Duration;

use crate::errors::YoinkError;

/// Default bound on attempts for any NGAS fetch (spec §4.3).
pub const MAX_TRIES: u32 = 10;
/// Fixed sleep between attempts (spec §4.3).
pub const SLEEP_INTERVAL: Duration = Duration::from_secs(1);

/// The outcome of a retried operation: its result plus how many attempts it
/// took, exposed for observability and tests.
pub struct Attempted<T> {
    pub value: T,
    pub num_tries: u32,
}

/// Call `f` up to `max_tries` times, sleeping `sleep_interval` between
/// attempts. Only errors for which `YoinkError::is_retriable()` is true are
/// retried; anything else propagates on the first failure. On exhaustion,
/// the last observed error is returned.
pub fn retry_with<T>(
    max_tries: u32,
    sleep_interval: Duration,
    mut f: impl FnMut() -> Result<T, YoinkError>,
) -> Result<Attempted<T>, YoinkError> {
    assert!(max_tries >= 1, "max_tries must be at least 1");

    let mut attempt = 0;
    loop {
        attempt += 1;
        match f() {
            Ok(value) => return Ok(Attempted {
                value,
                num_tries: attempt,
            }),
            Err(err) if err.is_retriable() && attempt < max_tries => {
                std::thread::sleep(sleep_interval);
                continue;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    #[test]
    fn succeeds_immediately_without_sleeping() {
        let calls = Cell::new(0);
        let result = retry_with(3, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            Ok::<_, YoinkError>(42)
        })
        .unwrap();
        assert_eq!(result.value, 42);
        assert_eq!(result.num_tries, 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_retriable_errors_until_success() {
        let calls = Cell::new(0);
        let result = retry_with(5, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(YoinkError::SizeMismatch {
                    path: "x".into(),
                    expected: 1,
                    actual: 2,
                })
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(result.num_tries, 3);
    }

    #[test]
    fn exhausts_max_tries_and_surfaces_last_error() {
        let calls = Cell::new(0);
        let err = retry_with(4, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            Err::<(), _>(YoinkError::NgasServiceError {
                server: "h".into(),
                status_code: Some(500),
                message: format!("attempt {}", calls.get()),
            })
        })
        .unwrap_err();
        assert_eq!(calls.get(), 4);
        match err {
            YoinkError::NgasServiceError { message, .. } => assert_eq!(message, "attempt 4"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let err = retry_with(10, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            Err::<(), _>(YoinkError::FileExists("x".into()))
        })
        .unwrap_err();
        assert_eq!(calls.get(), 1);
        assert!(matches!(err, YoinkError::FileExists(_)));
    }
}
