//! Output side of the router.

use crate::message::MidiMessage;

/// Receives every outgoing message, one call per MIDI event.
///
/// Implementations must not block: the router calls this from the thread that
/// also drives the clock.
pub trait MidiSink {
    fn send(&mut self, message: &MidiMessage);
}

/// Collects output in memory.
impl MidiSink for Vec<MidiMessage> {
    fn send(&mut self, message: &MidiMessage) {
        self.push(message.clone());
    }
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, message: &MidiMessage) {
        (**self).send(message);
    }
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, message: &MidiMessage) {
        (**self).send(message);
    }
}
