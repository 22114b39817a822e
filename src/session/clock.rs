use std::time::Duration;

/// Accumulates time handed to it and releases it in whole intervals.
#[derive(Clone, Debug)]
struct Ticker {
    interval: Duration,
    carry: Duration,
}

impl Ticker {
    fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            carry: Duration::ZERO,
        }
    }

    /// Returns how many whole intervals `dt` completed.
    fn feed(&mut self, dt: Duration) -> u32 {
        self.carry += dt;
        let mut ticks = 0;
        while self.carry >= self.interval {
            self.carry -= self.interval;
            ticks += 1;
        }
        ticks
    }
}

/// Count-up clock driven by `advance`. It never reads wall time.
#[derive(Clone, Debug)]
pub struct Stopwatch {
    ticker: Ticker,
    elapsed: Duration,
    running: bool,
}

impl Stopwatch {
    pub fn new(interval: Duration) -> Self {
        Self {
            ticker: Ticker::new(interval),
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Returns the number of ticks that fired; zero while stopped.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        let ticks = self.ticker.feed(dt);
        self.elapsed += self.ticker.interval * ticks;
        ticks
    }
}

/// Count-down clock driven by `advance`.
#[derive(Clone, Debug)]
pub struct Countdown {
    ticker: Ticker,
    duration: Duration,
    remaining: Duration,
    running: bool,
}

impl Countdown {
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Self {
            ticker: Ticker::new(interval),
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if !self.timed_out() {
            self.running = true;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn elapsed(&self) -> Duration {
        self.duration - self.remaining
    }

    pub fn timed_out(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        let ticks = self.ticker.feed(dt);
        self.remaining = self.remaining.saturating_sub(self.ticker.interval * ticks);
        if self.timed_out() {
            self.running = false;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_ignores_time_until_started() {
        let mut sw = Stopwatch::new(Duration::from_millis(10));
        assert_eq!(sw.advance(Duration::from_millis(500)), 0);
        assert_eq!(sw.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_stopwatch_quantizes_to_interval() {
        let mut sw = Stopwatch::new(Duration::from_millis(100));
        sw.start();
        assert_eq!(sw.advance(Duration::from_millis(250)), 2);
        assert_eq!(sw.elapsed_millis(), 200);
        // the 50ms remainder is carried
        assert_eq!(sw.advance(Duration::from_millis(50)), 1);
        assert_eq!(sw.elapsed_millis(), 300);
    }

    #[test]
    fn test_stopwatch_stop_freezes_elapsed() {
        let mut sw = Stopwatch::new(Duration::from_millis(1));
        sw.start();
        sw.advance(Duration::from_millis(40));
        sw.stop();
        sw.advance(Duration::from_millis(40));
        assert_eq!(sw.elapsed_millis(), 40);
    }

    #[test]
    fn test_countdown_times_out_and_stops() {
        let mut cd = Countdown::new(Duration::from_secs(3), Duration::from_secs(1));
        cd.start();
        cd.advance(Duration::from_millis(2500));
        assert_eq!(cd.remaining(), Duration::from_secs(1));
        assert!(!cd.timed_out());
        cd.advance(Duration::from_millis(600));
        assert!(cd.timed_out());
        assert!(!cd.is_running());
        assert_eq!(cd.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_countdown_never_underflows() {
        let mut cd = Countdown::new(Duration::from_secs(1), Duration::from_secs(1));
        cd.start();
        cd.advance(Duration::from_secs(10));
        assert_eq!(cd.remaining(), Duration::ZERO);
    }
}
