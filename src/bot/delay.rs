//! Randomized reply delay.

use std::time::Duration;

use rand::Rng;

use crate::config::Settings;

/// Uniform random delay, in whole seconds, applied before each reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min_secs: u64,
    max_secs: u64,
}

impl DelayPolicy {
    /// Delay drawn from `[min_secs, max_secs]`, bounds inclusive.
    ///
    /// Inverted bounds are swapped.
    #[must_use]
    pub const fn new(min_secs: u64, max_secs: u64) -> Self {
        if min_secs <= max_secs {
            Self { min_secs, max_secs }
        } else {
            Self {
                min_secs: max_secs,
                max_secs: min_secs,
            }
        }
    }

    /// No delay at all
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Bounds configured in `settings`
    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.reply_delay_min_secs, settings.reply_delay_max_secs)
    }

    /// Lower bound in seconds
    #[must_use]
    pub const fn min_secs(&self) -> u64 {
        self.min_secs
    }

    /// Upper bound in seconds
    #[must_use]
    pub const fn max_secs(&self) -> u64 {
        self.max_secs
    }

    /// Draw one delay
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min_secs == self.max_secs {
            return Duration::from_secs(self.min_secs);
        }
        Duration::from_secs(rand::thread_rng().gen_range(self.min_secs..=self.max_secs))
    }

    /// Sleep for a freshly drawn delay and return it.
    ///
    /// Only the calling task is suspended.
    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}
