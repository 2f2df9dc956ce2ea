//! Monotonic time source
//!
//! Drivers that debounce or rate-limit read time through [`Clock`] instead
//! of a global, so tests can drive time explicitly. Blocking waits use
//! [`embedded_hal::delay::DelayNs`]; on target `embassy_time::Delay`
//! implements it.

/// Milliseconds since boot.
pub trait Clock {
    /// Current time in milliseconds since boot. Never decreases.
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// [`Clock`] backed by the Embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embassy_clock_is_monotonic() {
        let clock = EmbassyClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn clock_reference_forwards() {
        struct Fixed(u64);
        impl Clock for Fixed {
            fn now_ms(&self) -> u64 {
                self.0
            }
        }
        let fixed = Fixed(1500);
        let by_ref: &dyn Clock = &fixed;
        assert_eq!((&by_ref).now_ms(), 1500);
    }
}
