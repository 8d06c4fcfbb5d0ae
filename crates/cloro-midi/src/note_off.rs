//! Monophonic note-off pairing for sources running in note-off mode.
//!
//! Each (source, input channel) remembers the last root note it started. A new
//! note-on first releases that note (or, in legato mode, releases it right after
//! the new note starts), so at most one tracked note is ever held per cell.

use crate::message::MidiMessage;
use crate::source::{ChannelTable, Source};
use smallvec::SmallVec;

pub type PairedNotes = SmallVec<[MidiMessage; 2]>;

#[derive(Debug, Clone)]
pub struct NoteOffTracker {
    last_root: ChannelTable<Option<u8>>,
}

impl NoteOffTracker {
    pub fn new() -> Self {
        Self {
            last_root: ChannelTable::filled(None),
        }
    }

    #[inline]
    pub fn last_root(&self, source: Source, channel: u8) -> Option<u8> {
        self.last_root.get(source, channel)
    }

    /// Input-level events to play for `message`, in order.
    ///
    /// Must be called with the message as received, before routing or any
    /// shaping, so the remembered root is the played note. Synthesised releases
    /// use the input channel and velocity 0.
    pub fn pair(&mut self, source: Source, message: MidiMessage, legato: bool) -> PairedNotes {
        let (channel, note) = match (message.channel(), message.note()) {
            (Some(channel), Some(note)) => (channel, note),
            _ => return SmallVec::from_elem(message, 1),
        };
        let starts = message.is_note_start();

        let cell = self.last_root.get_mut(source, channel);
        let release = if starts {
            cell.filter(|&old| !(legato && old == note))
                .map(|old| MidiMessage::note_off(channel, old, 0))
        } else {
            None
        };
        if starts {
            *cell = Some(note);
        } else if message.is_note_release() {
            *cell = None;
        }

        let mut out = PairedNotes::new();
        match release {
            Some(release) if legato => {
                out.push(message);
                out.push(release);
            }
            Some(release) => {
                out.push(release);
                out.push(message);
            }
            None => out.push(message),
        }
        out
    }
}

impl Default for NoteOffTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: Source = Source::ALL[0];

    #[test]
    fn test_first_note_passes() {
        let mut tracker = NoteOffTracker::new();
        let out = tracker.pair(SRC, MidiMessage::note_on(0, 60, 100), false);
        assert_eq!(out.to_vec(), vec![MidiMessage::note_on(0, 60, 100)]);
        assert_eq!(tracker.last_root(SRC, 0), Some(60));
    }

    #[test]
    fn test_non_legato_releases_before_new_note() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(0, 60, 100), false);
        let out = tracker.pair(SRC, MidiMessage::note_on(0, 64, 100), false);
        assert_eq!(
            out.to_vec(),
            vec![
                MidiMessage::note_off(0, 60, 0),
                MidiMessage::note_on(0, 64, 100)
            ]
        );
        assert_eq!(tracker.last_root(SRC, 0), Some(64));
    }

    #[test]
    fn test_legato_releases_after_new_note() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(0, 60, 100), true);
        let out = tracker.pair(SRC, MidiMessage::note_on(0, 64, 100), true);
        assert_eq!(
            out.to_vec(),
            vec![
                MidiMessage::note_on(0, 64, 100),
                MidiMessage::note_off(0, 60, 0)
            ]
        );
    }

    #[test]
    fn test_legato_restrike_does_not_release_itself() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(0, 60, 100), true);
        let out = tracker.pair(SRC, MidiMessage::note_on(0, 60, 80), true);
        assert_eq!(out.to_vec(), vec![MidiMessage::note_on(0, 60, 80)]);
    }

    #[test]
    fn test_note_off_clears_root() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(2, 60, 100), false);
        let out = tracker.pair(SRC, MidiMessage::note_off(2, 60, 0), false);
        assert_eq!(out.to_vec(), vec![MidiMessage::note_off(2, 60, 0)]);
        assert_eq!(tracker.last_root(SRC, 2), None);

        // Nothing left to release
        let out = tracker.pair(SRC, MidiMessage::note_on(2, 62, 100), false);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_zero_velocity_note_on_clears_root() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(5, 48, 90), false);
        let out = tracker.pair(SRC, MidiMessage::note_on(5, 48, 0), false);
        assert_eq!(out.to_vec(), vec![MidiMessage::note_on(5, 48, 0)]);
        assert_eq!(tracker.last_root(SRC, 5), None);
    }

    #[test]
    fn test_zero_velocity_note_on_counts_as_release() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(SRC, MidiMessage::note_on(0, 60, 100), false);
        let out = tracker.pair(SRC, MidiMessage::note_on(0, 60, 0), false);
        assert_eq!(out.to_vec(), vec![MidiMessage::note_on(0, 60, 0)]);
        assert_eq!(tracker.last_root(SRC, 0), None);
    }

    #[test]
    fn test_cells_are_independent() {
        let mut tracker = NoteOffTracker::new();
        tracker.pair(Source::ALL[0], MidiMessage::note_on(0, 60, 100), false);
        tracker.pair(Source::ALL[1], MidiMessage::note_on(0, 62, 100), false);
        tracker.pair(Source::ALL[0], MidiMessage::note_on(1, 64, 100), false);

        assert_eq!(tracker.last_root(Source::ALL[0], 0), Some(60));
        assert_eq!(tracker.last_root(Source::ALL[1], 0), Some(62));
        assert_eq!(tracker.last_root(Source::ALL[0], 1), Some(64));
    }
}
