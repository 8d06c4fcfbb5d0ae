//! MIDI 1.0 messages as seen on the wire, decoded once at the input boundary.

use smallvec::SmallVec;

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;
pub const TIMING_CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;

/// Raw bytes of one message. Channel and realtime messages never spill.
pub type MidiBytes = SmallVec<[u8; 3]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    ControlChange {
        channel: u8,
        control: u8,
        value: u8,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
    /// Pressure and pitch bend, plus note/CC messages too short to carry both
    /// data bytes. `kind` is the status high nibble (e.g. `0xE0`).
    ChannelVoice {
        kind: u8,
        channel: u8,
        data: SmallVec<[u8; 2]>,
    },
    Clock,
    Start,
    /// SysEx, system common and the remaining realtime bytes, kept verbatim.
    Other(MidiBytes),
}

impl MidiMessage {
    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOn {
            channel: channel & 0x0F,
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOff {
            channel: channel & 0x0F,
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    #[inline]
    pub fn control_change(channel: u8, control: u8, value: u8) -> Self {
        Self::ControlChange {
            channel: channel & 0x0F,
            control: control & 0x7F,
            value: value & 0x7F,
        }
    }

    /// Returns `None` for an empty slice.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;

        match status {
            TIMING_CLOCK => return Some(Self::Clock),
            START => return Some(Self::Start),
            // Running-status data or system messages: forwarded untouched.
            0x00..=0x7F | 0xF0..=0xFF => return Some(Self::Other(SmallVec::from_slice(bytes))),
            _ => {}
        }

        let kind = status & 0xF0;
        let channel = status & 0x0F;

        let message = match (kind, data) {
            (NOTE_ON, &[note, velocity, ..]) => Self::NoteOn {
                channel,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            },
            (NOTE_OFF, &[note, velocity, ..]) => Self::NoteOff {
                channel,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            },
            (CONTROL_CHANGE, &[control, value, ..]) => Self::ControlChange {
                channel,
                control: control & 0x7F,
                value: value & 0x7F,
            },
            (PROGRAM_CHANGE, &[program, ..]) => Self::ProgramChange {
                channel,
                program: program & 0x7F,
            },
            _ => Self::ChannelVoice {
                kind,
                channel,
                data: data.iter().take(2).map(|b| b & 0x7F).collect(),
            },
        };
        Some(message)
    }

    pub fn to_bytes(&self) -> MidiBytes {
        match self {
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => SmallVec::from_buf([NOTE_ON | channel, *note, *velocity]),
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => SmallVec::from_buf([NOTE_OFF | channel, *note, *velocity]),
            Self::ControlChange {
                channel,
                control,
                value,
            } => SmallVec::from_buf([CONTROL_CHANGE | channel, *control, *value]),
            Self::ProgramChange { channel, program } => {
                SmallVec::from_slice(&[PROGRAM_CHANGE | channel, *program])
            }
            Self::ChannelVoice {
                kind,
                channel,
                data,
            } => {
                let mut bytes = MidiBytes::new();
                bytes.push(kind | channel);
                bytes.extend_from_slice(data);
                bytes
            }
            Self::Clock => SmallVec::from_slice(&[TIMING_CLOCK]),
            Self::Start => SmallVec::from_slice(&[START]),
            Self::Other(bytes) => bytes.clone(),
        }
    }

    /// Status high nibble for channel-voice messages.
    #[inline]
    pub fn kind(&self) -> Option<u8> {
        match self {
            Self::NoteOn { .. } => Some(NOTE_ON),
            Self::NoteOff { .. } => Some(NOTE_OFF),
            Self::ControlChange { .. } => Some(CONTROL_CHANGE),
            Self::ProgramChange { .. } => Some(PROGRAM_CHANGE),
            Self::ChannelVoice { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[inline]
    pub fn channel(&self) -> Option<u8> {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelVoice { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// No-op for messages without a channel.
    #[inline]
    pub fn set_channel(&mut self, new_channel: u8) {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelVoice { channel, .. } => *channel = new_channel & 0x0F,
            _ => {}
        }
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self {
            Self::NoteOn { note, .. } | Self::NoteOff { note, .. } => Some(*note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => Some(*velocity),
            _ => None,
        }
    }

    /// Copy of a note message transposed to `note`; `None` for anything else.
    pub fn with_note(&self, note: u8) -> Option<Self> {
        let mut transposed = self.clone();
        match &mut transposed {
            Self::NoteOn { note: n, .. } | Self::NoteOff { note: n, .. } => *n = note & 0x7F,
            _ => return None,
        }
        Some(transposed)
    }

    /// Note-on with a non-zero velocity.
    #[inline]
    pub fn is_note_start(&self) -> bool {
        matches!(self, Self::NoteOn { velocity, .. } if *velocity > 0)
    }

    /// Note-off, or the note-on-with-velocity-0 shorthand for one.
    #[inline]
    pub fn is_note_release(&self) -> bool {
        matches!(
            self,
            Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. }
        )
    }
}
