//! Running MIDIcloro instance: output port, engine thread, input ports.

use crate::config::Config;
use crate::Result;
use cloro_midi::Router;
use cloro_midi_io::{EngineHandle, MidiInputManager, MidiOutputManager};
use std::time::Instant;
use tracing::{info, warn};

/// Owns every open port and the engine thread.
///
/// Shutdown order: the engine stops first (dropping the output it owns, which
/// closes the output port), then the inputs close.
///
/// # Example
///
/// ```ignore
/// let config = Config::load(Path::new("midicloro.toml"))?;
/// let midicloro = Midicloro::start(&config)?;
/// midicloro.run_until_signal()?;
/// ```
pub struct Midicloro {
    engine: EngineHandle,
    inputs: MidiInputManager,
}

impl Midicloro {
    /// Opens the output (fatal if missing), starts the engine, then opens each
    /// configured input. Missing inputs are logged and skipped.
    pub fn start(config: &Config) -> Result<Self> {
        let router = Router::new(config.router.clone(), Instant::now())?;
        let output = MidiOutputManager::open(&config.ports.output)?;
        let engine = EngineHandle::spawn(router, output)?;

        let mut inputs = MidiInputManager::new(engine.sender());
        for (source, pattern) in config.ports.inputs() {
            match inputs.connect(source, pattern) {
                Ok(Some(_)) => {}
                Ok(None) => info!("{} disabled", source),
                Err(e) => warn!("{} not opened: {}", source, e),
            }
        }
        if inputs.is_empty() {
            warn!("No MIDI inputs open");
        }

        Ok(Self { engine, inputs })
    }

    /// Blocks until SIGINT or SIGTERM, then shuts down.
    pub fn run_until_signal(self) -> Result<()> {
        let shutdown = self.engine.sender();
        ctrlc::set_handler(move || {
            // Fails only if the engine already stopped
            let _ = shutdown.shutdown();
        })?;
        info!("Running, press Ctrl-C to exit");

        let Self { engine, mut inputs } = self;
        engine.join()?;
        inputs.close_all();
        info!("Exiting");
        Ok(())
    }
}
