//! Per-source channel remapping.

use crate::message::MidiMessage;
use crate::source::{ChannelTable, Source};

/// Output channel for every (source, input channel). Starts as identity.
#[derive(Debug, Clone)]
pub struct ChannelRouter {
    table: ChannelTable<u8>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self {
            table: ChannelTable::from_fn(|_, channel| channel),
        }
    }

    #[inline]
    pub fn output_channel(&self, source: Source, channel: u8) -> u8 {
        self.table.get(source, channel)
    }

    /// Rewrites the channel nibble in place. System messages are left alone.
    #[inline]
    pub fn route(&self, source: Source, message: &mut MidiMessage) {
        if let Some(channel) = message.channel() {
            message.set_channel(self.output_channel(source, channel));
        }
    }

    /// Route CC: the 0-127 value selects one of 16 output channels in steps of 8.
    pub fn set_from_cc(&mut self, source: Source, channel: u8, value: u8) -> u8 {
        let output = (value & 0x7F) / 8;
        self.table.set(source, channel, output);
        output
    }
}

impl Default for ChannelRouter {
    fn default() -> Self {
        Self::new()
    }
}
