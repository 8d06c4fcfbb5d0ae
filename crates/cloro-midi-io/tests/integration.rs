//! Integration tests for cloro-midi-io.
//!
//! These run the real engine thread without hardware MIDI devices, collecting
//! output through a channel.

use cloro_midi::{MidiMessage, MidiSink, Router, RouterConfig, Source};
use cloro_midi_io::{port_matches, EngineHandle, PortInfo};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ChannelSink(Sender<MidiMessage>);

impl MidiSink for ChannelSink {
    fn send(&mut self, message: &MidiMessage) {
        let _ = self.0.send(message.clone());
    }
}

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn spawn(config: RouterConfig) -> (EngineHandle, Receiver<MidiMessage>) {
    let (tx, rx) = unbounded();
    let router = Router::new(config, Instant::now()).unwrap();
    let engine = EngineHandle::spawn(router, ChannelSink(tx)).unwrap();
    (engine, rx)
}

fn next_non_clock(rx: &Receiver<MidiMessage>) -> MidiMessage {
    loop {
        let message = rx.recv_timeout(RECV_TIMEOUT).expect("engine output");
        if message != MidiMessage::Clock {
            return message;
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Engine round trip
// ---------------------------------------------------------------------------

#[test]
fn test_engine_routes_input() {
    let (engine, rx) = spawn(RouterConfig {
        enable_clock: false,
        ..Default::default()
    });
    let sender = engine.sender();

    assert!(sender.send_input(Source::ALL[0], &[0xB0, 12, 16]));
    assert!(sender.send_input(Source::ALL[0], &[0x90, 60, 100]));
    assert_eq!(
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        MidiMessage::note_on(2, 60, 100)
    );

    engine.stop().unwrap();
}

#[test]
fn test_engine_emits_clock() {
    let (engine, rx) = spawn(RouterConfig {
        initial_bpm: 300, // ~8.3ms pulses
        ..Default::default()
    });

    for _ in 0..5 {
        assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), MidiMessage::Clock);
    }
    engine.stop().unwrap();
}

#[test]
fn test_clock_keeps_running_alongside_input() {
    let (engine, rx) = spawn(RouterConfig {
        initial_bpm: 300,
        ..Default::default()
    });
    let sender = engine.sender();
    sender.send_input(Source::ALL[3], &[0x95, 40, 90]);
    assert_eq!(next_non_clock(&rx), MidiMessage::note_on(5, 40, 90));

    let clocks = (0..3)
        .filter_map(|_| rx.recv_timeout(RECV_TIMEOUT).ok())
        .filter(|m| *m == MidiMessage::Clock)
        .count();
    assert_eq!(clocks, 3);
    engine.stop().unwrap();
}

#[test]
fn test_shutdown_through_sender() {
    let (engine, rx) = spawn(RouterConfig::default());
    engine.sender().shutdown().unwrap();
    engine.join().unwrap();

    // The sink is dropped with the engine
    let leftover: Vec<MidiMessage> = rx.try_iter().collect();
    assert!(leftover.iter().all(|m| *m == MidiMessage::Clock));
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_sender_after_stop_reports_stopped() {
    let (engine, _rx) = spawn(RouterConfig::default());
    let sender = engine.sender();
    engine.stop().unwrap();
    assert!(sender.shutdown().is_err());
    assert!(!sender.send_input(Source::ALL[0], &[0x90, 60, 1]));
}

// ---------------------------------------------------------------------------
// 2. Port matching against realistic port lists
// ---------------------------------------------------------------------------

#[test]
fn test_alsa_style_port_names() {
    let ports = [
        "Midi Through:Midi Through Port-0 14:0",
        "Arturia BeatStep:Arturia BeatStep MIDI 1 20:0",
        "Arturia BeatStep:Arturia BeatStep MIDI 1 24:0",
    ];
    let list: Vec<PortInfo> = ports
        .iter()
        .enumerate()
        .map(|(index, name)| PortInfo {
            index,
            name: name.to_string(),
        })
        .collect();

    let pattern = "Arturia BeatStep:Arturia BeatStep MIDI 1";
    let matched: Vec<usize> = list
        .iter()
        .filter(|p| port_matches(pattern, &p.name))
        .map(|p| p.index)
        .collect();
    assert_eq!(matched, vec![1, 2]);

    assert_eq!(
        cloro_midi_io::find_port("Arturia BeatStep:Arturia BeatStep MIDI 1 24:0", &list)
            .map(|p| p.index),
        Some(2)
    );
}
