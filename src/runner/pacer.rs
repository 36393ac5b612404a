//! @ai:module:intent Serial request pacing toward a target rate
//! @ai:module:layer infrastructure
//! @ai:module:public_api Pacer, PacerTrait
//! @ai:module:stateless true

use crate::config::WorkloadSpec;
use crate::error::ConfigError;
use std::time::Duration;
use tokio::time::Instant;

/// @ai:intent Trait for the inter-request wait step
pub trait PacerTrait: Send + Sync {
    /// @ai:intent Wait out the rest of the interval after a request took `elapsed`,
    /// never past `deadline`
    fn wait(
        &self,
        elapsed: Duration,
        deadline: Instant,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// @ai:intent Closed-loop pacer: at most one request in flight
///
/// The next dispatch happens `max(0, interval - elapsed)` after the previous
/// request completed. A request slower than the interval is followed
/// immediately, so the realized rate degrades to `1 / latency`.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    /// @ai:intent Create a pacer for `qps` requests per second
    /// @ai:pre qps > 0 and 1/qps fits in a `Duration`
    /// @ai:effects pure
    pub fn new(qps: f64) -> Result<Self, ConfigError> {
        if !qps.is_finite() || qps <= 0.0 {
            return Err(ConfigError::NonPositiveRate {
                name: String::new(),
                qps,
            });
        }

        let interval = Duration::try_from_secs_f64(1.0 / qps).map_err(|_| ConfigError::RateTooLow {
            name: String::new(),
            qps,
        })?;

        Ok(Self { interval })
    }

    /// @ai:intent Pacer for a workload, with its name on any error
    /// @ai:effects pure
    pub fn for_workload(spec: &WorkloadSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            interval: spec.interval()?,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// @ai:intent Remaining delay before the next dispatch
    /// @ai:example (interval=100ms, elapsed=30ms) -> 70ms
    /// @ai:example (interval=100ms, elapsed=250ms) -> 0
    /// @ai:effects pure
    pub fn delay_after(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }
}

impl PacerTrait for Pacer {
    /// @ai:effects time
    async fn wait(&self, elapsed: Duration, deadline: Instant) {
        let delay = self.delay_after(elapsed);

        if delay.is_zero() {
            return;
        }

        let wake = Instant::now()
            .checked_add(delay)
            .map_or(deadline, |at| at.min(deadline));
        tokio::time::sleep_until(wake).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_reciprocal_of_rate() {
        let pacer = Pacer::new(10.0).unwrap();
        assert_eq!(pacer.interval(), Duration::from_millis(100));

        let pacer = Pacer::new(0.5).unwrap();
        assert_eq!(pacer.interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(Pacer::new(0.0).is_err());
        assert!(Pacer::new(-3.0).is_err());
        assert!(Pacer::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_rate_too_low_to_represent() {
        assert!(matches!(Pacer::new(1e-20), Err(ConfigError::RateTooLow { .. })));
        assert!(Pacer::new(1e-6).is_ok());

        let spec = WorkloadSpec::new("trickle", 1e-20, 1.0);
        assert_eq!(
            Pacer::for_workload(&spec).unwrap_err(),
            ConfigError::RateTooLow {
                name: "trickle".to_string(),
                qps: 1e-20,
            }
        );
    }

    #[test]
    fn test_delay_saturates_at_zero() {
        let pacer = Pacer::new(10.0).unwrap();
        assert_eq!(pacer.delay_after(Duration::from_millis(30)), Duration::from_millis(70));
        assert_eq!(pacer.delay_after(Duration::from_millis(100)), Duration::ZERO);
        assert_eq!(pacer.delay_after(Duration::from_millis(250)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_remaining_interval() {
        let pacer = Pacer::new(10.0).unwrap();
        let deadline = Instant::now() + Duration::from_secs(60);

        let start = Instant::now();
        pacer.wait(Duration::from_millis(40), deadline).await;
        assert_eq!(start.elapsed(), Duration::from_millis(60));

        let start = Instant::now();
        pacer.wait(Duration::from_millis(400), deadline).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_capped_by_deadline() {
        let pacer = Pacer::new(0.1).unwrap();
        let start = Instant::now();
        let deadline = start + Duration::from_secs(1);

        pacer.wait(Duration::ZERO, deadline).await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
