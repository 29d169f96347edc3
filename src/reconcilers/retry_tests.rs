// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        default_backoff, is_retryable_error, requeue_delay, retry_api_call, scaled_requeue_delay,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(
            kube::core::Status::failure(&format!("HTTP {code}"), "Test")
                .with_code(code)
                .boxed(),
        )
    }

    /// Test that backoff configuration has expected values
    #[test]
    fn test_backoff_configuration() {
        let backoff = default_backoff();

        assert_eq!(backoff.initial_interval, Duration::from_millis(100));
        assert_eq!(backoff.max_interval, Duration::from_secs(5));
        assert_eq!(backoff.max_elapsed_time, Some(Duration::from_secs(30)));

        #[allow(clippy::float_cmp)]
        {
            assert_eq!(backoff.multiplier, 2.0);
            assert_eq!(backoff.randomization_factor, 0.1);
        }
    }

    /// Test that the jittered interval stays within ±10%
    #[test]
    fn test_next_backoff_jitter_bounds() {
        let mut backoff = default_backoff();

        let first = backoff.next_backoff().unwrap();
        assert!(first >= Duration::from_millis(89) && first <= Duration::from_millis(111));

        let second = backoff.next_backoff().unwrap();
        assert!(second >= Duration::from_millis(179) && second <= Duration::from_millis(221));
    }

    /// Test that max interval is respected
    #[test]
    fn test_max_interval_capping() {
        let mut backoff = default_backoff();
        for _ in 0..20 {
            backoff.next_backoff();
        }
        assert_eq!(backoff.current_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable_error(&api_error(429)));
        assert!(is_retryable_error(&api_error(500)));
        assert!(is_retryable_error(&api_error(503)));
        assert!(is_retryable_error(&api_error(599)));

        assert!(!is_retryable_error(&api_error(400)));
        assert!(!is_retryable_error(&api_error(401)));
        assert!(!is_retryable_error(&api_error(404)));
        assert!(
            !is_retryable_error(&api_error(409)),
            "conflicts are resolved by re-reading, not by blind retry"
        );
    }

    #[test]
    fn test_service_errors_retryable() {
        let service_error: Box<dyn std::error::Error + Send + Sync> = Box::new(
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection failed"),
        );
        assert!(is_retryable_error(&kube::Error::Service(service_error)));
    }

    #[test]
    fn test_requeue_delay_schedule() {
        assert_eq!(requeue_delay(0), Duration::from_secs(30));
        assert_eq!(requeue_delay(1), Duration::from_secs(30));
        assert_eq!(requeue_delay(2), Duration::from_secs(60));
        assert_eq!(requeue_delay(3), Duration::from_secs(120));
        assert_eq!(requeue_delay(4), Duration::from_secs(240));
        assert_eq!(requeue_delay(5), Duration::from_secs(300));
        assert_eq!(requeue_delay(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn test_scaled_requeue_delay_starts_at_base() {
        let base = Duration::from_secs(10);
        assert_eq!(scaled_requeue_delay(base, 1), base);
        assert_eq!(scaled_requeue_delay(base, 2), Duration::from_secs(20));
        assert_eq!(scaled_requeue_delay(base, 6), Duration::from_secs(300));
        assert_eq!(
            scaled_requeue_delay(Duration::from_secs(600), 1),
            Duration::from_secs(300)
        );
    }

    #[tokio::test]
    async fn test_retry_api_call_fails_fast_on_client_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), kube::Error> = retry_api_call(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(api_error(403)) }
            },
            "forbidden call",
        )
        .await;

        assert!(matches!(result, Err(kube::Error::Api(ref e)) if e.code == 403));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_api_call_recovers_from_transient_error() {
        let calls = AtomicU32::new(0);
        let result = retry_api_call(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(api_error(503))
                    } else {
                        Ok("ok")
                    }
                }
            },
            "flaky call",
        )
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
