//! Hardware MIDI I/O.
//!
//! Device enumeration and connection via midir.
//! Requires the `midi-io` feature.

mod input;
mod output;

pub use input::MidiInputManager;
pub use output::MidiOutputManager;
