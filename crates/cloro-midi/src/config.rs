//! Router configuration.
//!
//! Field names on the wire follow the MIDIcloro config keys (`enableClock`,
//! `tempoMidiCC`, `input1noteOffMode`, ...). Missing keys take the defaults below.

use crate::clock::{beat_interval_from_bpm, clock_interval_from_bpm};
use crate::error::{Error, Result};
use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterConfig {
    /// Generate MIDI clock and drop incoming clock bytes.
    pub enable_clock: bool,
    pub ignore_program_changes: bool,
    pub initial_bpm: i32,
    pub tap_tempo_min_bpm: i32,
    pub tap_tempo_max_bpm: i32,
    /// Tempo CC sets `bpm = offset + value` when taps are not steady.
    #[serde(rename = "bpmOffsetForMidiCC")]
    pub bpm_offset_for_midi_cc: i32,
    #[serde(rename = "tempoMidiCC")]
    pub tempo_midi_cc: u8,
    #[serde(rename = "chordMidiCC")]
    pub chord_midi_cc: u8,
    #[serde(rename = "routeMidiCC")]
    pub route_midi_cc: u8,
    #[serde(rename = "velocityMidiCC")]
    pub velocity_midi_cc: u8,
    /// Spread of RANDOM velocity mode; 0 means anywhere in 0-127.
    pub velocity_random_offset: i32,
    /// A velocity CC from input N also drives inputs below N.
    pub velocity_multi_device_ctrl: bool,
    #[serde(rename = "input1noteOffMode", alias = "input1NoteOffMode")]
    pub input1_note_off_mode: bool,
    #[serde(rename = "input2noteOffMode", alias = "input2NoteOffMode")]
    pub input2_note_off_mode: bool,
    #[serde(rename = "input3noteOffMode", alias = "input3NoteOffMode")]
    pub input3_note_off_mode: bool,
    #[serde(rename = "input4noteOffMode", alias = "input4NoteOffMode")]
    pub input4_note_off_mode: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enable_clock: true,
            ignore_program_changes: true,
            initial_bpm: 142,
            tap_tempo_min_bpm: 80,
            tap_tempo_max_bpm: 200,
            bpm_offset_for_midi_cc: 70,
            tempo_midi_cc: 10,
            chord_midi_cc: 11,
            route_midi_cc: 12,
            velocity_midi_cc: 13,
            velocity_random_offset: -40,
            velocity_multi_device_ctrl: false,
            input1_note_off_mode: false,
            input2_note_off_mode: false,
            input3_note_off_mode: false,
            input4_note_off_mode: false,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, bpm) in [
            ("initialBpm", self.initial_bpm),
            ("tapTempoMinBpm", self.tap_tempo_min_bpm),
            ("tapTempoMaxBpm", self.tap_tempo_max_bpm),
        ] {
            if bpm <= 0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, bpm
                )));
            }
        }
        if self.tap_tempo_min_bpm > self.tap_tempo_max_bpm {
            return Err(Error::InvalidConfig(format!(
                "tapTempoMinBpm {} exceeds tapTempoMaxBpm {}",
                self.tap_tempo_min_bpm, self.tap_tempo_max_bpm
            )));
        }
        if !(-127..=127).contains(&self.velocity_random_offset) {
            return Err(Error::InvalidConfig(format!(
                "velocityRandomOffset {} out of range (-127 to 127)",
                self.velocity_random_offset
            )));
        }

        let ccs = self.control_ccs();
        for (i, (name, cc)) in ccs.iter().enumerate() {
            if *cc > 127 {
                return Err(Error::InvalidConfig(format!(
                    "{} {} out of range (0-127)",
                    name, cc
                )));
            }
            if let Some((other, _)) = ccs[i + 1..].iter().find(|(_, o)| o == cc) {
                return Err(Error::InvalidConfig(format!(
                    "{} and {} both use CC {}",
                    name, other, cc
                )));
            }
        }
        Ok(())
    }

    fn control_ccs(&self) -> [(&'static str, u8); 4] {
        [
            ("tempoMidiCC", self.tempo_midi_cc),
            ("chordMidiCC", self.chord_midi_cc),
            ("routeMidiCC", self.route_midi_cc),
            ("velocityMidiCC", self.velocity_midi_cc),
        ]
    }

    pub fn note_off_mode(&self, source: Source) -> bool {
        [
            self.input1_note_off_mode,
            self.input2_note_off_mode,
            self.input3_note_off_mode,
            self.input4_note_off_mode,
        ][source.index()]
    }

    pub fn clock_interval(&self) -> Result<Duration> {
        clock_interval_from_bpm(i64::from(self.initial_bpm)).ok_or_else(|| {
            Error::InvalidConfig(format!("initialBpm {} must be positive", self.initial_bpm))
        })
    }

    /// Shortest accepted tap spacing (from the maximum BPM).
    pub fn tap_tempo_min_interval(&self) -> Result<Duration> {
        beat_interval_from_bpm(i64::from(self.tap_tempo_max_bpm)).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "tapTempoMaxBpm {} must be positive",
                self.tap_tempo_max_bpm
            ))
        })
    }

    /// Longest accepted tap spacing (from the minimum BPM).
    pub fn tap_tempo_max_interval(&self) -> Result<Duration> {
        beat_interval_from_bpm(i64::from(self.tap_tempo_min_bpm)).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "tapTempoMinBpm {} must be positive",
                self.tap_tempo_min_bpm
            ))
        })
    }
}
