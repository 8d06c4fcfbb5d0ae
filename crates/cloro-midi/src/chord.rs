//! Chord expansion of single notes.
//!
//! Every mode is a list of semitone steps; each step is relative to the tone
//! before it, so `[0, 3, 4]` voices root, minor third and fifth. Tones are
//! emitted in list order, which downstream gear hears as a fast arpeggio, so the
//! order is part of the output contract.

use crate::message::MidiMessage;
use crate::source::{ChannelTable, Source};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Longest voicing (ninth chords).
pub const MAX_CHORD_TONES: usize = 5;

pub type ChordTones = SmallVec<[MidiMessage; MAX_CHORD_TONES]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChordMode {
    #[default]
    Off = 0,
    Minor3,
    Major3,
    Minor3Lo,
    Major3Lo,
    Minor2,
    Major2,
    Minor7,
    Major7,
    Minor9,
    Major9,
    Sus4,
    Power2,
    Power3,
    Octave2,
    Octave3,
}

impl ChordMode {
    /// In CC order: mode `n` covers CC values `8n..8n+8`.
    pub const ALL: [ChordMode; 16] = [
        ChordMode::Off,
        ChordMode::Minor3,
        ChordMode::Major3,
        ChordMode::Minor3Lo,
        ChordMode::Major3Lo,
        ChordMode::Minor2,
        ChordMode::Major2,
        ChordMode::Minor7,
        ChordMode::Major7,
        ChordMode::Minor9,
        ChordMode::Major9,
        ChordMode::Sus4,
        ChordMode::Power2,
        ChordMode::Power3,
        ChordMode::Octave2,
        ChordMode::Octave3,
    ];

    #[inline]
    pub fn from_cc(value: u8) -> Self {
        Self::ALL[((value & 0x7F) / 8) as usize]
    }

    pub const fn steps(self) -> &'static [i8] {
        match self {
            ChordMode::Off => &[0],
            ChordMode::Minor3 => &[0, 3, 4],
            ChordMode::Major3 => &[0, 4, 3],
            ChordMode::Minor3Lo => &[-5, 5, 3],
            ChordMode::Major3Lo => &[-5, 5, 4],
            ChordMode::Minor2 => &[0, 3],
            ChordMode::Major2 => &[0, 4],
            ChordMode::Minor7 => &[0, 3, 4, 3],
            ChordMode::Major7 => &[0, 4, 3, 4],
            ChordMode::Minor9 => &[0, 3, 4, 3, 4],
            ChordMode::Major9 => &[0, 4, 3, 4, 3],
            ChordMode::Sus4 => &[0, 5, 2],
            ChordMode::Power2 => &[0, 7],
            ChordMode::Power3 => &[0, 7, 5],
            ChordMode::Octave2 => &[0, 12],
            ChordMode::Octave3 => &[0, 12, 12],
        }
    }

    /// Absolute offsets from the root, in emission order.
    pub fn offsets(self) -> impl Iterator<Item = i8> {
        self.steps().iter().scan(0i8, |acc, step| {
            *acc += step;
            Some(*acc)
        })
    }
}

/// Chord tones for `root`, dropping any that fall outside 0-127.
///
/// Offsets are absolute, so a dropped tone does not move the ones after it.
pub fn voice(mode: ChordMode, root: u8) -> impl Iterator<Item = u8> {
    mode.offsets().filter_map(move |offset| {
        let note = i16::from(root) + i16::from(offset);
        u8::try_from(note).ok().filter(|n| *n <= 127)
    })
}

/// Expands a note-on/off into its chord. Other messages come back unchanged.
pub fn synthesize(mode: ChordMode, message: &MidiMessage) -> ChordTones {
    match message.note() {
        Some(root) => voice(mode, root)
            .filter_map(|note| message.with_note(note))
            .collect(),
        None => SmallVec::from_elem(message.clone(), 1),
    }
}

/// What a chord CC did to its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordChange {
    Mode(ChordMode),
    Legato(bool),
}

/// Chord mode and legato flag per (source, channel).
#[derive(Debug, Clone)]
pub struct ChordTable {
    modes: ChannelTable<ChordMode>,
    legato: ChannelTable<bool>,
}

impl ChordTable {
    pub fn new() -> Self {
        Self {
            modes: ChannelTable::filled(ChordMode::Off),
            legato: ChannelTable::filled(false),
        }
    }

    #[inline]
    pub fn mode(&self, source: Source, channel: u8) -> ChordMode {
        self.modes.get(source, channel)
    }

    #[inline]
    pub fn legato(&self, source: Source, channel: u8) -> bool {
        self.legato.get(source, channel)
    }

    /// Selecting OFF while already OFF flips legato instead, which is the only
    /// way to change it at runtime.
    pub fn set_from_cc(&mut self, source: Source, channel: u8, value: u8) -> ChordChange {
        let mode = ChordMode::from_cc(value);
        if mode == ChordMode::Off && self.mode(source, channel) == ChordMode::Off {
            let legato = self.legato.get_mut(source, channel);
            *legato = !*legato;
            ChordChange::Legato(*legato)
        } else {
            self.modes.set(source, channel, mode);
            ChordChange::Mode(mode)
        }
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        Self::new()
    }
}
