//! MIDI I/O subsystem for MIDIcloro.
//!
//! Connects the pure [`cloro_midi::Router`] to the outside world:
//!
//! - **Port matching**: configured names against backend port names, with or
//!   without the trailing hardware id
//! - **Engine thread**: sole owner of the router and its clock
//! - **Hardware I/O**: up to four inputs and one output (feature: `midi-io`)
//!
//! # Example
//!
//! ```ignore
//! use cloro_midi::{Router, RouterConfig, Source};
//! use cloro_midi_io::{EngineHandle, MidiInputManager, MidiOutputManager};
//! use std::time::Instant;
//!
//! let router = Router::new(RouterConfig::default(), Instant::now())?;
//! let output = MidiOutputManager::open("Synth")?;
//! let engine = EngineHandle::spawn(router, output)?;
//!
//! let mut inputs = MidiInputManager::new(engine.sender());
//! inputs.connect(Source::ALL[0], "USB Keys")?;
//! ```

// Error types
pub mod error;
pub use error::{Direction, Error, Result};

pub mod port;
pub use port::{find_port, port_matches, trim_hardware_id, PortInfo};

pub mod engine;
pub use engine::{EngineCommand, EngineHandle, EngineSender};

// Hardware I/O (requires midi-io feature)
#[cfg(feature = "midi-io")]
mod io;
#[cfg(feature = "midi-io")]
pub use io::{MidiInputManager, MidiOutputManager};

#[cfg(feature = "midi-io")]
pub fn list_input_devices() -> Vec<PortInfo> {
    MidiInputManager::list_devices()
}

#[cfg(feature = "midi-io")]
pub fn list_output_devices() -> Vec<PortInfo> {
    MidiOutputManager::list_devices()
}
