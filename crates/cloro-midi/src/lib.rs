//! MIDI routing core for MIDIcloro.
//!
//! Everything here is pure state and arithmetic: no threads, no devices, no
//! sleeping. Time comes in as an [`std::time::Instant`] argument and output goes
//! out through a [`MidiSink`], so the whole pipeline is testable in memory.
//!
//! # Pipeline
//!
//! - **Channel routing**: per (source, channel) output channel, set by CC
//! - **Velocity shaping**: off, fixed or randomised velocity per routed channel
//! - **Chord synthesis**: one note in, up to five chord tones out
//! - **Note-off pairing**: monophonic release for sources that never send note-offs
//! - **Clock**: 24 PPQN timing clock with tap tempo and CC tempo
//!
//! # Example
//!
//! ```
//! use cloro_midi::{MidiMessage, Router, RouterConfig, Source};
//! use std::time::Instant;
//!
//! let now = Instant::now();
//! let mut router = Router::new(RouterConfig::default(), now)?;
//! let mut out: Vec<MidiMessage> = Vec::new();
//!
//! // Major triad on channel 1
//! router.handle_bytes(Source::ALL[0], &[0xB0, 11, 16], now, &mut out);
//! router.handle_bytes(Source::ALL[0], &[0x90, 60, 100], now, &mut out);
//! assert_eq!(out.len(), 3);
//! # Ok::<(), cloro_midi::Error>(())
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

// Wire model
pub mod message;
pub use message::{MidiBytes, MidiMessage};

pub mod source;
pub use source::{ChannelTable, Source, CHANNELS, MAX_SOURCES};

pub mod sink;
pub use sink::MidiSink;

// Per-channel processing stages
pub mod chord;
pub use chord::{ChordChange, ChordMode, ChordTable};

pub mod note_off;
pub use note_off::NoteOffTracker;

pub mod routing;
pub use routing::ChannelRouter;

pub mod velocity;
pub use velocity::{VelocityMode, VelocityShaper};

// Timing
pub mod clock;
pub use clock::{clock_interval_from_bpm, ClockGenerator, CLOCKS_PER_QUARTER};

pub mod tap_tempo;
pub use tap_tempo::TapTempo;

// Configuration and dispatch
pub mod config;
pub use config::RouterConfig;

mod router;
pub use router::{Dispatch, Router};
