//! Centralized error type for the midicloro umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] cloro_midi::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] cloro_midi_io::Error),

    #[error("Config file {} not found (run `midicloro --configure` to create it)", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
