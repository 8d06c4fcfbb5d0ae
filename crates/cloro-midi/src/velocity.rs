//! Velocity shaping for note messages.

use crate::message::MidiMessage;
use crate::source::{ChannelTable, Source};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_VELOCITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VelocityMode {
    /// Velocity passes through.
    #[default]
    Off,
    /// Every note gets the cell's base velocity.
    Fixed,
    /// Base velocity spread by the configured random offset.
    Random,
}

/// Stretches the middle of the CC range so that knob positions 8..=120 already
/// reach 0 and 127.
pub fn scale_up(value: u8) -> u8 {
    let v = i32::from(value & 0x7F);
    let scaled = match v.cmp(&64) {
        Ordering::Greater => (v + 8 * (v - 64) / 56).min(127),
        Ordering::Less => (v - 8 * (64 - v) / 56).max(0),
        Ordering::Equal => v,
    };
    scaled as u8
}

#[derive(Debug, Clone)]
pub struct VelocityShaper<R = StdRng> {
    modes: ChannelTable<VelocityMode>,
    values: ChannelTable<u8>,
    random_offset: i32,
    rng: R,
}

impl VelocityShaper<StdRng> {
    pub fn new(random_offset: i32) -> Self {
        Self::with_rng(random_offset, StdRng::from_entropy())
    }
}

impl<R: Rng> VelocityShaper<R> {
    pub fn with_rng(random_offset: i32, rng: R) -> Self {
        Self {
            modes: ChannelTable::filled(VelocityMode::Off),
            values: ChannelTable::filled(DEFAULT_VELOCITY),
            random_offset,
            rng,
        }
    }

    #[inline]
    pub fn mode(&self, source: Source, channel: u8) -> VelocityMode {
        self.modes.get(source, channel)
    }

    #[inline]
    pub fn base(&self, source: Source, channel: u8) -> u8 {
        self.values.get(source, channel)
    }

    /// Rewrites the velocity of a note-on/off in place.
    ///
    /// A note-on with velocity 0 is a release and is left alone, otherwise FIXED
    /// mode would turn it into a sounding note.
    pub fn shape(&mut self, source: Source, message: &mut MidiMessage) {
        if matches!(message, MidiMessage::NoteOn { velocity: 0, .. }) {
            return;
        }
        if let MidiMessage::NoteOn {
            channel, velocity, ..
        }
        | MidiMessage::NoteOff {
            channel, velocity, ..
        } = message
        {
            *velocity = self.velocity_for(source, *channel, *velocity);
        }
    }

    fn velocity_for(&mut self, source: Source, channel: u8, incoming: u8) -> u8 {
        let base = self.base(source, channel);
        match self.mode(source, channel) {
            VelocityMode::Off => incoming,
            VelocityMode::Fixed => base,
            VelocityMode::Random => self.random_velocity(base),
        }
    }

    fn random_velocity(&mut self, base: u8) -> u8 {
        let u: f64 = self.rng.gen();
        let base = i32::from(base);
        let spread = (f64::from(self.random_offset) * u).floor() as i32;
        let velocity = match self.random_offset.cmp(&0) {
            Ordering::Less => (base + spread).max(0),
            Ordering::Greater => (base + spread).min(127),
            Ordering::Equal => (127.0 * u).floor() as i32,
        };
        velocity.clamp(0, 127) as u8
    }

    /// Velocity CC: 127 toggles FIXED/RANDOM, 0 switches shaping off, anything
    /// else sets the base velocity (through [`scale_up`]) and enables FIXED if
    /// shaping was off.
    pub fn set_from_cc(&mut self, source: Source, channel: u8, value: u8) -> VelocityMode {
        let value = value & 0x7F;
        let mode = match (value, self.mode(source, channel)) {
            (127, VelocityMode::Fixed) => VelocityMode::Random,
            (127, _) => VelocityMode::Fixed,
            (0, _) => VelocityMode::Off,
            (_, current) => {
                self.values.set(source, channel, scale_up(value));
                match current {
                    VelocityMode::Off => VelocityMode::Fixed,
                    other => other,
                }
            }
        };
        self.modes.set(source, channel, mode);
        mode
    }

    /// Multi-device variant: the CC also drives every lower-indexed source.
    pub fn set_from_cc_cascading(&mut self, source: Source, channel: u8, value: u8) {
        for target in source.and_lower() {
            self.set_from_cc(target, channel, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shaper(offset: i32) -> VelocityShaper<StdRng> {
        VelocityShaper::with_rng(offset, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_scale_up_fixed_points() {
        assert_eq!(scale_up(0), 0);
        assert_eq!(scale_up(8), 0);
        assert_eq!(scale_up(64), 64);
        assert_eq!(scale_up(120), 127);
        assert_eq!(scale_up(127), 127);
        assert_eq!(scale_up(100), 105);
        assert_eq!(scale_up(30), 26);
    }

    #[test]
    fn test_off_passes_velocity() {
        let mut shaper = shaper(-40);
        let mut msg = MidiMessage::note_on(0, 60, 33);
        shaper.shape(Source::ALL[0], &mut msg);
        assert_eq!(msg.velocity(), Some(33));
    }

    #[test]
    fn test_fixed_overwrites_note_on_and_off() {
        let mut shaper = shaper(-40);
        let src = Source::ALL[0];
        assert_eq!(shaper.set_from_cc(src, 0, 64), VelocityMode::Fixed);

        let mut on = MidiMessage::note_on(0, 60, 12);
        shaper.shape(src, &mut on);
        assert_eq!(on.velocity(), Some(64));

        let mut off = MidiMessage::note_off(0, 60, 0);
        shaper.shape(src, &mut off);
        assert_eq!(off.velocity(), Some(64));
    }

    #[test]
    fn test_zero_velocity_note_on_untouched() {
        let mut shaper = shaper(-40);
        let src = Source::ALL[0];
        shaper.set_from_cc(src, 0, 64);

        let mut release = MidiMessage::note_on(0, 60, 0);
        shaper.shape(src, &mut release);
        assert_eq!(release.velocity(), Some(0));
    }

    #[test]
    fn test_other_messages_untouched() {
        let mut shaper = shaper(-40);
        let src = Source::ALL[0];
        shaper.set_from_cc(src, 0, 64);

        let mut cc = MidiMessage::control_change(0, 7, 3);
        shaper.shape(src, &mut cc);
        assert_eq!(cc, MidiMessage::control_change(0, 7, 3));
    }

    #[test]
    fn test_random_negative_offset_bounds() {
        let mut shaper = shaper(-40);
        let src = Source::ALL[1];
        shaper.set_from_cc(src, 3, 127);
        assert_eq!(shaper.set_from_cc(src, 3, 127), VelocityMode::Random);
        assert_eq!(shaper.base(src, 3), DEFAULT_VELOCITY);

        for _ in 0..1000 {
            let mut msg = MidiMessage::note_on(3, 60, 1);
            shaper.shape(src, &mut msg);
            let v = msg.velocity().unwrap();
            assert!((60..=100).contains(&v), "velocity {} out of [60, 100]", v);
        }
    }

    #[test]
    fn test_random_positive_offset_clamps_high() {
        let mut shaper = shaper(40);
        let src = Source::ALL[0];
        shaper.set_from_cc(src, 0, 120); // base 127
        shaper.set_from_cc(src, 0, 127); // -> Random

        for _ in 0..200 {
            let mut msg = MidiMessage::note_on(0, 60, 1);
            shaper.shape(src, &mut msg);
            assert_eq!(msg.velocity(), Some(127));
        }
    }

    #[test]
    fn test_random_zero_offset_full_range() {
        let mut shaper = shaper(0);
        let src = Source::ALL[0];
        assert_eq!(shaper.set_from_cc(src, 0, 127), VelocityMode::Fixed);
        assert_eq!(shaper.set_from_cc(src, 0, 127), VelocityMode::Random);

        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..2000 {
            let mut msg = MidiMessage::note_on(0, 60, 1);
            shaper.shape(src, &mut msg);
            let v = msg.velocity().unwrap();
            assert!(v <= 127);
            seen_low |= v < 32;
            seen_high |= v > 96;
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn test_cc_state_machine() {
        let mut shaper = shaper(-40);
        let src = Source::ALL[0];

        // OFF -> 127 -> FIXED -> 127 -> RANDOM -> 127 -> FIXED
        assert_eq!(shaper.set_from_cc(src, 0, 127), VelocityMode::Fixed);
        assert_eq!(shaper.set_from_cc(src, 0, 127), VelocityMode::Random);
        assert_eq!(shaper.set_from_cc(src, 0, 127), VelocityMode::Fixed);

        // A base change keeps RANDOM
        shaper.set_from_cc(src, 0, 127);
        assert_eq!(shaper.set_from_cc(src, 0, 90), VelocityMode::Random);
        assert_eq!(shaper.base(src, 0), scale_up(90));

        assert_eq!(shaper.set_from_cc(src, 0, 0), VelocityMode::Off);
        // Base survives switching off
        assert_eq!(shaper.base(src, 0), scale_up(90));
    }

    #[test]
    fn test_cascading_updates_lower_sources_only() {
        let mut shaper = shaper(-40);
        shaper.set_from_cc_cascading(Source::ALL[2], 5, 64);

        for source in &Source::ALL[..=2] {
            assert_eq!(shaper.mode(*source, 5), VelocityMode::Fixed);
            assert_eq!(shaper.base(*source, 5), 64);
        }
        assert_eq!(shaper.mode(Source::ALL[3], 5), VelocityMode::Off);
        assert_eq!(shaper.base(Source::ALL[3], 5), DEFAULT_VELOCITY);
    }
}
