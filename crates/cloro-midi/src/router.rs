//! Message dispatcher owning all routing state.
//!
//! A [`Router`] is meant to live on exactly one thread: inputs and the clock
//! timer feed it in arrival order, and only it mutates the per-channel tables.

use crate::chord::{self, ChordChange, ChordMode, ChordTable};
use crate::clock::{clock_interval_from_bpm, ClockGenerator, CLOCKS_PER_QUARTER};
use crate::config::RouterConfig;
use crate::error::Result;
use crate::message::{MidiMessage, PROGRAM_CHANGE};
use crate::note_off::NoteOffTracker;
use crate::routing::ChannelRouter;
use crate::sink::MidiSink;
use crate::source::Source;
use crate::tap_tempo::TapTempo;
use crate::velocity::{VelocityMode, VelocityShaper};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// How the router disposed of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Note played through the note-off tracker.
    PairedNote,
    /// Note routed, shaped and chord-expanded.
    Note,
    /// Start forwarded and clock schedule reset.
    Start,
    /// Tempo CC consumed; carries the clock interval now in effect.
    Tempo(Duration),
    Chord(ChordChange),
    /// Route CC consumed; carries the new output channel.
    Route(u8),
    Velocity(VelocityMode),
    Forwarded,
    Dropped,
}

pub struct Router<R = StdRng> {
    config: RouterConfig,
    routing: ChannelRouter,
    chords: ChordTable,
    velocity: VelocityShaper<R>,
    note_off: NoteOffTracker,
    tap_tempo: TapTempo,
    clock: ClockGenerator,
}

impl Router<StdRng> {
    /// Validates `config`. When the clock is enabled the first pulse is due one
    /// interval after `now`.
    pub fn new(config: RouterConfig, now: Instant) -> Result<Self> {
        Self::with_rng(config, now, StdRng::from_entropy())
    }
}

impl<R: Rng> Router<R> {
    pub fn with_rng(config: RouterConfig, now: Instant, rng: R) -> Result<Self> {
        config.validate()?;

        let mut clock = ClockGenerator::new(config.clock_interval()?);
        if config.enable_clock {
            clock.start(now);
        }
        let tap_tempo = TapTempo::new(
            config.tap_tempo_min_interval()?,
            config.tap_tempo_max_interval()?,
            now,
        );

        Ok(Self {
            routing: ChannelRouter::new(),
            chords: ChordTable::new(),
            velocity: VelocityShaper::with_rng(config.velocity_random_offset, rng),
            note_off: NoteOffTracker::new(),
            tap_tempo,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn routing(&self) -> &ChannelRouter {
        &self.routing
    }

    pub fn chords(&self) -> &ChordTable {
        &self.chords
    }

    pub fn velocity(&self) -> &VelocityShaper<R> {
        &self.velocity
    }

    pub fn note_off(&self) -> &NoteOffTracker {
        &self.note_off
    }

    #[inline]
    pub fn clock_interval(&self) -> Duration {
        self.clock.interval()
    }

    /// When the next clock pulse is due; `None` with the clock disabled.
    #[inline]
    pub fn clock_deadline(&self) -> Option<Instant> {
        self.clock.deadline()
    }

    /// Sends a clock pulse if one is due at `now`.
    pub fn poll_clock<S: MidiSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> bool {
        if self.clock.poll(now) {
            sink.send(&MidiMessage::Clock);
            true
        } else {
            false
        }
    }

    /// Decodes and handles raw input bytes. Empty input is dropped.
    pub fn handle_bytes<S: MidiSink + ?Sized>(
        &mut self,
        source: Source,
        bytes: &[u8],
        now: Instant,
        sink: &mut S,
    ) -> Dispatch {
        match MidiMessage::from_bytes(bytes) {
            Some(message) => self.handle(source, message, now, sink),
            None => {
                trace!("Dropping empty message from {}", source);
                Dispatch::Dropped
            }
        }
    }

    pub fn handle<S: MidiSink + ?Sized>(
        &mut self,
        source: Source,
        message: MidiMessage,
        now: Instant,
        sink: &mut S,
    ) -> Dispatch {
        trace!("{}: {:?}", source, message);
        let dispatch = self.dispatch(source, message, now, sink);
        trace!("{}: {:?}", source, dispatch);
        dispatch
    }

    fn dispatch<S: MidiSink + ?Sized>(
        &mut self,
        source: Source,
        message: MidiMessage,
        now: Instant,
        sink: &mut S,
    ) -> Dispatch {
        let RouterConfig {
            enable_clock,
            ignore_program_changes,
            tempo_midi_cc,
            chord_midi_cc,
            route_midi_cc,
            velocity_midi_cc,
            ..
        } = self.config;

        match message {
            MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. }
                if self.config.note_off_mode(source) =>
            {
                self.play_paired(source, message, sink);
                Dispatch::PairedNote
            }
            MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. } => {
                self.play(source, message, sink);
                Dispatch::Note
            }
            MidiMessage::Start if enable_clock => {
                sink.send(&message);
                self.clock.reset(now);
                Dispatch::Start
            }
            MidiMessage::ControlChange { value, control, .. } if control == tempo_midi_cc => {
                Dispatch::Tempo(self.set_tempo(value, now))
            }
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } if control == chord_midi_cc => {
                let channel = self.routing.output_channel(source, channel);
                let change = self.chords.set_from_cc(source, channel, value);
                debug!("{} ch{}: chord {:?}", source, channel + 1, change);
                Dispatch::Chord(change)
            }
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } if control == route_midi_cc => {
                let output = self.routing.set_from_cc(source, channel, value);
                debug!("{} ch{}: routed to ch{}", source, channel + 1, output + 1);
                Dispatch::Route(output)
            }
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } if control == velocity_midi_cc => {
                let channel = self.routing.output_channel(source, channel);
                if self.config.velocity_multi_device_ctrl {
                    self.velocity.set_from_cc_cascading(source, channel, value);
                } else {
                    self.velocity.set_from_cc(source, channel, value);
                }
                let mode = self.velocity.mode(source, channel);
                debug!(
                    "{} ch{}: velocity {:?} (base {})",
                    source,
                    channel + 1,
                    mode,
                    self.velocity.base(source, channel)
                );
                Dispatch::Velocity(mode)
            }
            // The generator is the only clock on the output.
            MidiMessage::Clock if enable_clock => Dispatch::Dropped,
            _ if ignore_program_changes && message.kind() == Some(PROGRAM_CHANGE) => {
                Dispatch::Dropped
            }
            mut other => {
                self.routing.route(source, &mut other);
                sink.send(&other);
                Dispatch::Forwarded
            }
        }
    }

    /// Route, shape, expand, send.
    fn play<S: MidiSink + ?Sized>(
        &mut self,
        source: Source,
        mut message: MidiMessage,
        sink: &mut S,
    ) {
        self.routing.route(source, &mut message);
        self.velocity.shape(source, &mut message);
        let mode = message
            .channel()
            .map_or(ChordMode::Off, |channel| self.chords.mode(source, channel));
        for tone in chord::synthesize(mode, &message) {
            sink.send(&tone);
        }
    }

    fn play_paired<S: MidiSink + ?Sized>(
        &mut self,
        source: Source,
        message: MidiMessage,
        sink: &mut S,
    ) {
        // Legato is set through the routed channel, like the chord mode.
        let legato = message.channel().map_or(false, |channel| {
            self.chords
                .legato(source, self.routing.output_channel(source, channel))
        });
        for event in self.note_off.pair(source, message, legato) {
            self.play(source, event, sink);
        }
    }

    fn set_tempo(&mut self, value: u8, now: Instant) -> Duration {
        let interval = match self.tap_tempo.tap(now) {
            Some(beat) => {
                debug!("Tap tempo: {:?} per beat", beat);
                Some(beat / CLOCKS_PER_QUARTER)
            }
            None => clock_interval_from_bpm(
                i64::from(self.config.bpm_offset_for_midi_cc) + i64::from(value),
            ),
        };

        match interval {
            Some(interval) => {
                self.clock.set_interval(interval);
                debug!("Clock interval set to {:?}", interval);
            }
            None => debug!(
                "Tempo CC {} gives no positive BPM, keeping {:?}",
                value,
                self.clock.interval()
            ),
        }
        self.clock.reset(now);
        self.clock.interval()
    }
}
