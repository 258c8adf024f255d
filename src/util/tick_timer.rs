use web_time::{Duration, Instant};

/// Fixed-rate tick scheduler with a smoothed rate readout.
///
/// Deadlines advance by one interval per tick. If the caller falls more
/// than one interval behind, the backlog is dropped instead of replayed.
#[derive(Debug, Clone)]
pub struct TickTimer {
    /// Time between ticks
    interval: Duration,
    /// Last tick timestamp
    last_tick: Instant,
    /// When the next tick is due
    next_deadline: Instant,
    /// Exponential moving average of ticks per second
    smoothed_rate: f32,
    /// Weight of the newest sample (0.0-1.0)
    smoothing: f32,
}

impl TickTimer {
    /// Timer ticking `hz` times per second. Zero is treated as one.
    #[must_use]
    pub fn new(hz: u32) -> Self {
        let hz = hz.max(1);
        let interval = Duration::from_secs_f64(1.0 / f64::from(hz));
        let now = Instant::now();
        Self {
            interval,
            last_tick: now,
            next_deadline: now + interval,
            smoothed_rate: hz as f32,
            smoothing: 0.05,
        }
    }

    /// Whether the next tick is due.
    #[must_use]
    pub fn should_tick(&self) -> bool {
        Instant::now() >= self.next_deadline
    }

    /// When the next tick is due, for `ControlFlow::WaitUntil`.
    #[must_use]
    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Nominal time between ticks.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a tick and return the seconds elapsed since the previous one.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.next_deadline += self.interval;
        if self.next_deadline < now {
            self.next_deadline = now + self.interval;
        }

        if elapsed > 0.0 {
            self.smoothed_rate = self.smoothed_rate * (1.0 - self.smoothing)
                + self.smoothing / elapsed;
        }
        elapsed
    }

    /// Smoothed ticks per second.
    #[must_use]
    pub fn rate(&self) -> f32 {
        self.smoothed_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_matches_rate() {
        let timer = TickTimer::new(60);
        let expected = 1.0 / 60.0;
        assert!((timer.interval().as_secs_f64() - expected).abs() < 1e-9);
        assert!((timer.rate() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn zero_hz_ticks_once_per_second() {
        let timer = TickTimer::new(0);
        assert_eq!(timer.interval(), Duration::from_secs(1));
        assert!(!timer.should_tick());
    }

    #[test]
    fn tick_advances_deadline_past_now() {
        let mut timer = TickTimer::new(1000);
        std::thread::sleep(Duration::from_millis(20));
        let dt = timer.tick();
        assert!(dt >= 0.019);
        // Backlog is dropped rather than replayed.
        assert!(timer.next_deadline() > Instant::now() - Duration::from_millis(1));
    }
}
