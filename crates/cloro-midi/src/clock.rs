//! MIDI timing clock schedule and tempo arithmetic.
//!
//! The generator is a plain deadline calculator. Whoever owns it waits until
//! [`ClockGenerator::deadline`] and then calls [`ClockGenerator::poll`]; it never
//! sleeps or spawns anything itself.

use std::time::{Duration, Instant};

/// Timing clock pulses per quarter note.
pub const CLOCKS_PER_QUARTER: u32 = 24;

const NANOS_PER_MINUTE: u64 = 60_000_000_000;

/// Quarter-note length for `bpm`. `None` for a non-positive tempo.
pub fn beat_interval_from_bpm(bpm: i64) -> Option<Duration> {
    let bpm = u64::try_from(bpm).ok().filter(|bpm| *bpm > 0)?;
    Some(Duration::from_nanos(NANOS_PER_MINUTE / bpm))
}

/// Spacing of clock pulses for `bpm`: `60e9 / (bpm * 24)` ns.
pub fn clock_interval_from_bpm(bpm: i64) -> Option<Duration> {
    let bpm = u64::try_from(bpm).ok().filter(|bpm| *bpm > 0)?;
    Some(Duration::from_nanos(
        NANOS_PER_MINUTE / (bpm * u64::from(CLOCKS_PER_QUARTER)),
    ))
}

/// Two states: idle (no deadline) and running.
#[derive(Debug, Clone)]
pub struct ClockGenerator {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl ClockGenerator {
    /// Starts idle.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Zero intervals are ignored. Takes effect from the next scheduled tick.
    pub fn set_interval(&mut self, interval: Duration) {
        if !interval.is_zero() {
            self.interval = interval;
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// First pulse fires one full interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + self.interval);
    }

    /// Drops the pending pulse and schedules a fresh interval from `now`.
    /// Emits nothing; no-op while idle.
    pub fn reset(&mut self, now: Instant) {
        if self.is_running() {
            self.next_tick = Some(now + self.interval);
        }
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Returns `true` when a pulse is due at `now` and schedules the next one.
    ///
    /// The next deadline is counted from the one that just fired so waking up
    /// late does not accumulate drift. If the owner fell a whole interval
    /// behind, the schedule restarts from `now` instead of bursting pulses.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(due) if now >= due => {
                let next = due + self.interval;
                self.next_tick = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_interval_from_bpm() {
        assert_eq!(
            clock_interval_from_bpm(120),
            Some(Duration::from_nanos(20_833_333))
        );
        assert_eq!(clock_interval_from_bpm(0), None);
        assert_eq!(clock_interval_from_bpm(-5), None);

        assert_eq!(beat_interval_from_bpm(120), Some(ms(500)));
        assert_eq!(beat_interval_from_bpm(80), Some(ms(750)));
        assert_eq!(beat_interval_from_bpm(0), None);
    }

    #[test]
    fn test_idle_never_fires() {
        let t0 = Instant::now();
        let mut clock = ClockGenerator::new(ms(20));
        assert!(!clock.is_running());
        assert!(!clock.poll(t0 + ms(1000)));
        clock.reset(t0);
        assert_eq!(clock.deadline(), None);
    }

    #[test]
    fn test_fires_on_schedule() {
        let t0 = Instant::now();
        let mut clock = ClockGenerator::new(ms(20));
        clock.start(t0);
        assert_eq!(clock.deadline(), Some(t0 + ms(20)));

        assert!(!clock.poll(t0 + ms(19)));
        assert!(clock.poll(t0 + ms(20)));
        assert_eq!(clock.deadline(), Some(t0 + ms(40)));

        // A late wake-up keeps the grid
        assert!(clock.poll(t0 + ms(43)));
        assert_eq!(clock.deadline(), Some(t0 + ms(60)));
    }

    #[test]
    fn test_far_behind_resyncs() {
        let t0 = Instant::now();
        let mut clock = ClockGenerator::new(ms(20));
        clock.start(t0);
        assert!(clock.poll(t0 + ms(100)));
        assert_eq!(clock.deadline(), Some(t0 + ms(120)));
        assert!(!clock.poll(t0 + ms(101)));
    }

    #[test]
    fn test_reset_schedules_full_interval() {
        let t0 = Instant::now();
        let mut clock = ClockGenerator::new(ms(20));
        clock.start(t0);
        clock.reset(t0 + ms(15));
        assert!(!clock.poll(t0 + ms(20)));
        assert_eq!(clock.deadline(), Some(t0 + ms(35)));
    }

    #[test]
    fn test_interval_change_applies_to_next_tick() {
        let t0 = Instant::now();
        let mut clock = ClockGenerator::new(ms(20));
        clock.start(t0);
        clock.set_interval(ms(10));
        assert!(clock.poll(t0 + ms(20)));
        assert_eq!(clock.deadline(), Some(t0 + ms(30)));

        clock.set_interval(Duration::ZERO);
        assert_eq!(clock.interval(), ms(10));
    }
}
