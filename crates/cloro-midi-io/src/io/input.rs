//! MIDI input manager.
//!
//! Holds one midir connection per configured source. Callbacks run on the
//! backend's thread and only copy bytes into the engine queue.

use crate::engine::EngineSender;
use crate::error::{Direction, Error, Result};
use crate::port::{find_port, PortInfo};
use cloro_midi::Source;
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::info;

const CLIENT_NAME: &str = "midicloro";

struct OpenInput {
    source: Source,
    port_name: String,
    // Dropping the connection closes the port
    _connection: MidiInputConnection<()>,
}

pub struct MidiInputManager {
    engine: EngineSender,
    inputs: Vec<OpenInput>,
}

impl MidiInputManager {
    pub fn new(engine: EngineSender) -> Self {
        Self {
            engine,
            inputs: Vec::new(),
        }
    }

    pub fn list_devices() -> Vec<PortInfo> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new(CLIENT_NAME) {
            let ports = midi_input.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(PortInfo { index, name });
            }
        }
        devices
    }

    /// Opens the first input matching `pattern` and feeds it to the engine as
    /// `source`.
    ///
    /// An empty pattern leaves the source disabled and returns `Ok(None)`.
    /// Returns the opened port name otherwise.
    pub fn connect(&mut self, source: Source, pattern: &str) -> Result<Option<String>> {
        if pattern.is_empty() {
            return Ok(None);
        }

        let mut midi_input = MidiInput::new(CLIENT_NAME)?;
        // Clock, start and sysex must reach the router
        midi_input.ignore(Ignore::None);

        let ports = midi_input.ports();
        let names: Vec<PortInfo> = ports
            .iter()
            .enumerate()
            .map(|(index, port)| PortInfo {
                index,
                name: midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index)),
            })
            .collect();

        let info = find_port(pattern, &names).ok_or_else(|| Error::PortNotFound {
            direction: Direction::Input,
            pattern: pattern.to_string(),
        })?;
        let port = ports.get(info.index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI input device {} not found", info.index))
        })?;

        let engine = self.engine.clone();
        let connection = midi_input.connect(
            port,
            &format!("midicloro-{}", source),
            move |_timestamp, message, _| {
                if !message.is_empty() {
                    engine.send_input(source, message);
                }
            },
            (),
        )?;

        info!("Opened MIDI input port {}: {}", source, info.name);
        self.inputs.push(OpenInput {
            source,
            port_name: info.name.clone(),
            _connection: connection,
        });
        Ok(Some(info.name.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Closes every input port.
    pub fn close_all(&mut self) {
        for input in self.inputs.drain(..) {
            info!("Closing MIDI input port {}: {}", input.source, input.port_name);
        }
    }
}
