//! MIDI output: device enumeration, connection, and message sending via a dedicated thread.

use crate::error::{Direction, Error, Result};
use crate::port::{find_port, PortInfo};
use cloro_midi::{MidiBytes, MidiMessage, MidiSink};
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiOutput, MidiOutputConnection};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "midicloro";

enum MidiOutputCommand {
    Send(MidiBytes),
    Shutdown,
}

/// Owns the output connection on its own thread so a slow backend never
/// stalls the engine.
///
/// Dropping the manager flushes queued messages and closes the port.
pub struct MidiOutputManager {
    command_sender: Sender<MidiOutputCommand>,
    thread: Option<JoinHandle<()>>,
    port_name: String,
}

impl MidiOutputManager {
    /// Opens the first output port matching `pattern`. No match is an error.
    pub fn open(pattern: &str) -> Result<Self> {
        let midi_output = MidiOutput::new(CLIENT_NAME)?;
        let ports = midi_output.ports();
        let names: Vec<PortInfo> = ports
            .iter()
            .enumerate()
            .map(|(index, port)| PortInfo {
                index,
                name: midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index)),
            })
            .collect();

        let info = find_port(pattern, &names).ok_or_else(|| Error::PortNotFound {
            direction: Direction::Output,
            pattern: pattern.to_string(),
        })?;
        let port = ports.get(info.index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", info.index))
        })?;

        let connection = midi_output.connect(port, "midicloro-output")?;
        info!("Opened MIDI output port: {}", info.name);

        Self::spawn(connection, info.name.clone())
    }

    fn spawn(connection: MidiOutputConnection, port_name: String) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(1024);

        let thread = thread::Builder::new()
            .name("cloro-midi-output".to_string())
            .spawn(move || Self::midi_output_thread(command_receiver, connection))
            .map_err(|e| {
                Error::MidiDevice(format!("Failed to spawn MIDI output thread: {}", e))
            })?;

        Ok(Self {
            command_sender,
            thread: Some(thread),
            port_name,
        })
    }

    fn midi_output_thread(
        command_receiver: Receiver<MidiOutputCommand>,
        mut connection: MidiOutputConnection,
    ) {
        for command in command_receiver.iter() {
            match command {
                MidiOutputCommand::Send(bytes) => {
                    if let Err(e) = connection.send(&bytes) {
                        warn!("Failed to send MIDI message: {}", e);
                    }
                }
                MidiOutputCommand::Shutdown => break,
            }
        }
        connection.close();
        debug!("MIDI output closed");
    }

    pub fn list_devices() -> Vec<PortInfo> {
        let mut devices = Vec::new();
        if let Ok(midi_output) = MidiOutput::new(CLIENT_NAME) {
            let ports = midi_output.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(PortInfo { index, name });
            }
        }
        devices
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn send_bytes(&self, bytes: MidiBytes) {
        if let Err(e) = self.command_sender.try_send(MidiOutputCommand::Send(bytes)) {
            debug!("MIDI output command channel full or disconnected: {}", e);
        }
    }
}

impl MidiSink for MidiOutputManager {
    fn send(&mut self, message: &MidiMessage) {
        self.send_bytes(message.to_bytes());
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiOutputCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
