//! Reconnect policy options.
//!
//! Reconnection is opt-in. With the default policy a closed socket leaves the
//! provider [`Disconnected`](super::ConnectionState::Disconnected).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use websocket_provider::ReconnectPolicy;
//!
//! let policy = ReconnectPolicy::exponential()
//!     .with_max_attempts(10)
//!     .with_initial_delay(Duration::from_millis(250));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Bounded exponential backoff for replacing a closed socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Whether a closed socket is replaced at all.
    pub enabled: bool,

    /// Consecutive attempts before giving up.
    pub max_attempts: u32,

    /// Delay before the first attempt.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Growth factor between attempts.
    pub multiplier: f64,

    /// Fraction of the delay randomized around its value (0.0 to 1.0).
    pub jitter: f64,
}

// ============================================================================
// Constructors
// ============================================================================

impl ReconnectPolicy {
    /// Creates a disabled policy with standard backoff parameters.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: false,
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }

    /// Never reconnects.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new()
    }

    /// Reconnects with standard exponential backoff.
    #[inline]
    #[must_use]
    pub fn exponential() -> Self {
        Self {
            enabled: true,
            ..Self::new()
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ReconnectPolicy {
    /// Enables or disables reconnection.
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the attempt budget.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the first delay.
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[inline]
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction.
    #[inline]
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }
}

// ============================================================================
// Backoff
// ============================================================================

impl ReconnectPolicy {
    /// Returns `true` if `attempt` (1-based) is within budget.
    #[inline]
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.enabled && attempt <= self.max_attempts
    }

    /// Delay before the given 1-based attempt.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let initial_ms = self.initial_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = (initial_ms * self.multiplier.powi(exponent)).min(max_ms);

        let jitter_range = base_ms * self.jitter;
        let offset = fastrand::f64() * jitter_range - jitter_range / 2.0;

        Duration::from_millis((base_ms + offset).max(0.0) as u64)
    }

    /// Checks the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the multiplier is below 1.0, the jitter is
    /// outside `0.0..=1.0`, or an enabled policy has no attempts.
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::config(format!(
                "reconnect multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }

        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(Error::config(format!(
                "reconnect jitter must be within 0.0..=1.0, got {}",
                self.jitter
            )));
        }

        if self.enabled && self.max_attempts == 0 {
            return Err(Error::config("enabled reconnect policy needs max_attempts > 0"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.enabled);
        assert!(!policy.allows(1));
        assert_eq!(policy, ReconnectPolicy::disabled());
    }

    #[test]
    fn test_exponential_is_enabled() {
        let policy = ReconnectPolicy::exponential();
        assert!(policy.enabled);
        assert!(policy.allows(1));
        assert!(policy.allows(5));
        assert!(!policy.allows(6));
    }

    #[test]
    fn test_builder_methods() {
        let policy = ReconnectPolicy::new()
            .with_enabled(true)
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(50))
            .with_multiplier(3.0)
            .with_jitter(0.0);

        assert!(policy.enabled);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(policy.max_delay, Duration::from_millis(50));
        assert_eq!(policy.multiplier, 3.0);
        assert_eq!(policy.jitter, 0.0);
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = ReconnectPolicy::exponential()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(1000))
            .with_jitter(0.0);

        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_delay_jitter_stays_in_range() {
        let policy = ReconnectPolicy::exponential()
            .with_initial_delay(Duration::from_millis(1000))
            .with_jitter(0.2);

        for _ in 0..100 {
            let delay = policy.delay_for(1).as_millis();
            assert!((900..=1100).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn test_validate() {
        assert!(ReconnectPolicy::default().validate().is_ok());
        assert!(ReconnectPolicy::exponential().validate().is_ok());
        assert!(ReconnectPolicy::new().with_multiplier(0.5).validate().is_err());
        assert!(ReconnectPolicy::new().with_jitter(1.5).validate().is_err());
        assert!(
            ReconnectPolicy::exponential()
                .with_max_attempts(0)
                .validate()
                .is_err()
        );
    }
}
