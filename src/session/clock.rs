use std::cmp;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Bounded by `target_ms`; elapsed time never reads past the budget.
    #[default]
    Countdown,
    Stopwatch,
}

/// Run clock driven by frame timestamps rather than wall time, so replayed
/// or scripted input produces the same elapsed values as live input.
#[derive(Debug, Clone)]
pub struct RunClock {
    pub status: ClockStatus,
    pub mode: ClockMode,
    pub target_ms: u64,
    pub active_ms: u64,
    pub running_anchor: Option<Instant>,
}

impl Default for RunClock {
    fn default() -> Self {
        Self {
            status: ClockStatus::Idle,
            mode: ClockMode::Countdown,
            target_ms: 0,
            active_ms: 0,
            running_anchor: None,
        }
    }
}

impl RunClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run. `limit` selects countdown vs stopwatch.
    pub fn begin(&mut self, limit: Option<Duration>, now: Instant) {
        let (mode, target_ms) = match limit {
            Some(limit) => (ClockMode::Countdown, limit.as_millis() as u64),
            None => (ClockMode::Stopwatch, 0),
        };
        *self = Self {
            status: ClockStatus::Running,
            mode,
            target_ms,
            active_ms: 0,
            running_anchor: Some(now),
        };
    }

    pub fn current_active_ms(&self, now: Instant) -> u64 {
        match (self.status, self.running_anchor) {
            (ClockStatus::Running, Some(anchor)) => {
                let raw = now.saturating_duration_since(anchor).as_millis() as u64;
                match self.mode {
                    ClockMode::Countdown => cmp::min(raw, self.target_ms),
                    ClockMode::Stopwatch => raw,
                }
            }
            _ => self.active_ms,
        }
    }

    pub fn remaining_ms(&self, now: Instant) -> Option<u64> {
        match self.mode {
            ClockMode::Countdown => {
                Some(self.target_ms.saturating_sub(self.current_active_ms(now)))
            }
            ClockMode::Stopwatch => None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.status == ClockStatus::Running
            && self.mode == ClockMode::Countdown
            && self.current_active_ms(now) >= self.target_ms
    }

    /// Freeze the elapsed time at `now`.
    pub fn stop(&mut self, now: Instant) {
        self.active_ms = self.current_active_ms(now);
        self.status = ClockStatus::Stopped;
        self.running_anchor = None;
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.current_active_ms(now) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_clamps_to_budget() {
        let t0 = Instant::now();
        let mut clock = RunClock::new();
        clock.begin(Some(Duration::from_secs(60)), t0);

        assert_eq!(clock.remaining_ms(t0 + Duration::from_secs(10)), Some(50_000));
        assert!(!clock.is_expired(t0 + Duration::from_millis(59_999)));
        assert!(clock.is_expired(t0 + Duration::from_secs(60)));

        let late = t0 + Duration::from_secs(75);
        assert_eq!(clock.elapsed_secs(late), 60);
        assert_eq!(clock.remaining_ms(late), Some(0));
    }

    #[test]
    fn test_stopwatch_never_expires() {
        let t0 = Instant::now();
        let mut clock = RunClock::new();
        clock.begin(None, t0);

        let later = t0 + Duration::from_secs(3600);
        assert!(!clock.is_expired(later));
        assert_eq!(clock.remaining_ms(later), None);
        assert_eq!(clock.elapsed_secs(later), 3600);
    }

    #[test]
    fn test_stop_freezes_elapsed() {
        let t0 = Instant::now();
        let mut clock = RunClock::new();
        clock.begin(Some(Duration::from_secs(30)), t0);
        clock.stop(t0 + Duration::from_millis(12_400));

        assert_eq!(clock.status, ClockStatus::Stopped);
        assert_eq!(clock.elapsed_secs(t0 + Duration::from_secs(29)), 12);
        assert!(!clock.is_expired(t0 + Duration::from_secs(40)));
    }

    #[test]
    fn test_elapsed_is_measured_from_run_start() {
        let t0 = Instant::now();
        let mut clock = RunClock::new();
        clock.begin(None, t0);
        let restart = t0 + Duration::from_secs(20);
        clock.begin(None, restart);
        assert_eq!(clock.elapsed_secs(restart + Duration::from_secs(5)), 5);
    }
}
