//! Monotonic time source.

use embassy_time::Instant;

/// Monotonic clock used for message recency and idle-line detection.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by the global `embassy-time` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}
