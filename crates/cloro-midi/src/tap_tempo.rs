//! Tap-tempo estimation from the spacing of recent taps.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Taps remembered, newest first.
pub const TAP_WINDOW: usize = 4;

#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
    min_interval: Duration,
    max_interval: Duration,
}

impl TapTempo {
    /// `origin` seeds the window so the first real tap already has a partner.
    pub fn new(min_interval: Duration, max_interval: Duration, origin: Instant) -> Self {
        let mut taps = VecDeque::with_capacity(TAP_WINDOW + 1);
        taps.push_front(origin);
        Self {
            taps,
            min_interval,
            max_interval,
        }
    }

    /// Records a tap and returns the beat interval if the leading taps agree.
    ///
    /// Deltas are averaged from the newest tap backwards and stop at the first
    /// one outside `[min_interval, max_interval]`. Fewer than two usable deltas
    /// means no stable tempo.
    pub fn tap(&mut self, now: Instant) -> Option<Duration> {
        self.taps.push_front(now);
        self.taps.truncate(TAP_WINDOW);

        let (total, count) = self
            .taps
            .iter()
            .zip(self.taps.iter().skip(1))
            .map(|(newer, older)| newer.saturating_duration_since(*older))
            .take_while(|delta| (self.min_interval..=self.max_interval).contains(delta))
            .fold((Duration::ZERO, 0u32), |(total, count), delta| {
                (total + delta, count + 1)
            });

        (count >= 2).then(|| total / count)
    }
}
