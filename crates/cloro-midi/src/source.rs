//! Input source indices and per-(source, channel) state tables.

use crate::error::{Error, Result};
use std::fmt;

/// Number of input devices the router accepts.
pub const MAX_SOURCES: usize = 4;

/// MIDI channels per source.
pub const CHANNELS: usize = 16;

/// Index (0-3) of the input device a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Source(u8);

impl Source {
    pub const ALL: [Source; MAX_SOURCES] = [Source(0), Source(1), Source(2), Source(3)];

    pub fn new(index: usize) -> Result<Self> {
        if index < MAX_SOURCES {
            Ok(Self(index as u8))
        } else {
            Err(Error::InvalidSource(index))
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// This source and every lower-indexed one, highest first.
    pub fn and_lower(self) -> impl Iterator<Item = Source> {
        (0..=self.0).rev().map(Source)
    }
}

impl TryFrom<usize> for Source {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Self::new(index)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the `inputN` naming of the config file.
        write!(f, "input{}", self.0 + 1)
    }
}

/// Fixed 4x16 table holding one value per (source, channel) cell.
///
/// Channels are masked to 4 bits on every access, so a lookup can never go out
/// of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable<T> {
    cells: [[T; CHANNELS]; MAX_SOURCES],
}

impl<T: Copy> ChannelTable<T> {
    pub fn filled(value: T) -> Self {
        Self {
            cells: [[value; CHANNELS]; MAX_SOURCES],
        }
    }

    pub fn from_fn(f: impl Fn(Source, u8) -> T) -> Self {
        Self {
            cells: std::array::from_fn(|s| std::array::from_fn(|c| f(Source(s as u8), c as u8))),
        }
    }

    #[inline]
    pub fn get(&self, source: Source, channel: u8) -> T {
        self.cells[source.index()][(channel & 0x0F) as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, source: Source, channel: u8) -> &mut T {
        &mut self.cells[source.index()][(channel & 0x0F) as usize]
    }

    #[inline]
    pub fn set(&mut self, source: Source, channel: u8, value: T) {
        *self.get_mut(source, channel) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_range() {
        assert_eq!(Source::new(3).unwrap().index(), 3);
        assert_eq!(Source::new(4), Err(Error::InvalidSource(4)));
        assert!(Source::try_from(7usize).is_err());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::ALL[0].to_string(), "input1");
        assert_eq!(Source::ALL[3].to_string(), "input4");
    }

    #[test]
    fn test_and_lower_cascades_downwards() {
        let order: Vec<usize> = Source::ALL[2].and_lower().map(Source::index).collect();
        assert_eq!(order, vec![2, 1, 0]);

        let order: Vec<usize> = Source::ALL[0].and_lower().map(Source::index).collect();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn test_table_masks_channel() {
        let mut table = ChannelTable::filled(0u8);
        table.set(Source::ALL[1], 0x13, 9);
        assert_eq!(table.get(Source::ALL[1], 3), 9);
        assert_eq!(table.get(Source::ALL[0], 3), 0);
    }

    #[test]
    fn test_table_from_fn() {
        let table = ChannelTable::from_fn(|source, channel| source.index() as u8 * 16 + channel);
        assert_eq!(table.get(Source::ALL[0], 0), 0);
        assert_eq!(table.get(Source::ALL[2], 5), 37);
        assert_eq!(table.get(Source::ALL[3], 15), 63);
    }
}
