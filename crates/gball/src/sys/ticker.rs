use std::time::{Duration, Instant};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Fixed-period deadline tracker. Ticks that were missed while the caller was
/// busy are dropped, not replayed.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// The first tick is due at `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            next: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Returns whether a tick is due at `now`, scheduling the following one if so.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_once_per_period() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(16 * MS, t0);

        assert!(ticker.poll(t0));
        assert!(!ticker.poll(t0 + 5 * MS));
        assert!(ticker.poll(t0 + 16 * MS));
        assert!(!ticker.poll(t0 + 20 * MS));
        assert_eq!(ticker.next_deadline(), t0 + 32 * MS);
    }

    #[test]
    fn test_late_ticks_keep_the_grid() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(10 * MS, t0);
        ticker.poll(t0);

        assert!(ticker.poll(t0 + 13 * MS));
        assert_eq!(ticker.next_deadline(), t0 + 20 * MS);
    }

    #[test]
    fn test_missed_ticks_are_dropped() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(10 * MS, t0);
        ticker.poll(t0);

        assert!(ticker.poll(t0 + 95 * MS));
        assert!(!ticker.poll(t0 + 96 * MS));
        assert_eq!(ticker.next_deadline(), t0 + 105 * MS);
    }

    #[test]
    fn test_zero_period_is_raised() {
        let ticker = Ticker::new(Duration::ZERO, Instant::now());
        assert_eq!(ticker.period(), MIN_PERIOD);
    }
}
