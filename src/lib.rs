//! # MIDIcloro - MIDI clock generator and router
//!
//! Sits between up to four MIDI controllers and one MIDI output. It generates
//! MIDI clock, and lets CC messages on the inputs reroute channels, expand
//! notes into chords and reshape velocity.
//!
//! ## Architecture
//!
//! MIDIcloro is an umbrella crate that coordinates:
//! - **cloro-midi** - Routing core (message model, router, clock, tap tempo)
//! - **cloro-midi-io** - Port matching, hardware I/O and the engine thread
//!
//! This crate adds the config file, the interactive setup and the process
//! lifecycle used by the `midicloro` binary.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cloro::{Config, Midicloro};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("midicloro.toml"))?;
//! Midicloro::start(&config)?.run_until_signal()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `midi-hardware`
//! - `midi-hardware` - midir backed ports and the `midicloro` binary

/// Re-export of cloro-midi for direct access
pub use cloro_midi as core;
/// Re-export of cloro-midi-io for direct access
pub use cloro_midi_io as io;

pub use cloro_midi::{MidiMessage, Router, RouterConfig, Source};

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{Config, PortConfig, DEFAULT_CONFIG_PATH};

pub mod wizard;
pub use wizard::Wizard;

#[cfg(feature = "midi-hardware")]
mod engine;
#[cfg(feature = "midi-hardware")]
pub use engine::Midicloro;
