//! Interactive setup (`midicloro --configure`).
//!
//! Walks through port selection and the router options on any
//! `BufRead`/`Write` pair, producing a [`Config`].

use crate::config::Config;
use crate::error::Result;
use cloro_midi::Source;
use cloro_midi_io::{trim_hardware_id, PortInfo};
use std::io::{BufRead, ErrorKind, Write};
use std::ops::RangeInclusive;

const HARDWARE_ID_NOTE: &str = "Note about hardware id (HWid example: 11:00). \
The HWid for a device might change if you connect it to another USB port.\n\
Recommendation: Do not store HWid for single devices. \
Store HWid for devices sharing the same name.";

pub struct Wizard<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks before an existing config is replaced.
    pub fn confirm_overwrite(&mut self) -> Result<bool> {
        self.yes_no(
            "This will clear and reconfigure the settings. Continue? (y/N): ",
            false,
        )
    }

    pub fn run(&mut self, inputs: &[PortInfo], outputs: &[PortInfo]) -> Result<Config> {
        let mut config = Config::default();
        writeln!(self.output, "\n{}\n", HARDWARE_ID_NOTE)?;

        self.choose_inputs(&mut config, inputs)?;
        config.ports.output = self.choose_output(outputs)?;
        self.choose_options(&mut config)?;

        writeln!(self.output)?;
        Ok(config)
    }

    fn choose_inputs(&mut self, config: &mut Config, ports: &[PortInfo]) -> Result<()> {
        writeln!(self.output, "Available input ports:")?;
        self.list(ports)?;

        let mut taken = vec![false; ports.len()];
        for source in Source::ALL {
            let number = source.index() + 1;
            if taken.iter().all(|t| *t) {
                writeln!(self.output, "Disabling input {}", number)?;
                continue;
            }

            let answer = self.prompt(&format!(
                "Enter port number for input {} (press enter to disable): ",
                number
            ))?;
            let chosen = answer
                .parse::<usize>()
                .ok()
                .filter(|i| *i < ports.len() && !taken[*i]);
            let Some(index) = chosen else {
                writeln!(self.output, "Disabling input {}", number)?;
                continue;
            };

            taken[index] = true;
            let pattern = self.port_pattern(&ports[index].name)?;
            config.ports.set_input(source, pattern);
        }
        Ok(())
    }

    fn choose_output(&mut self, ports: &[PortInfo]) -> Result<String> {
        writeln!(self.output, "\nAvailable output ports:")?;
        self.list(ports)?;

        let mut question = "Enter port number for output: ";
        let index = loop {
            let answer = self.prompt(question)?;
            if let Some(index) = answer.parse::<usize>().ok().filter(|i| *i < ports.len()) {
                break index;
            }
            question = "Incorrect port number, try again: ";
        };
        self.port_pattern(&ports[index].name)
    }

    fn choose_options(&mut self, config: &mut Config) -> Result<()> {
        let router = &mut config.router;
        writeln!(self.output)?;
        router.enable_clock = self.yes_no("Enable MIDI clock? (Y/n): ", true)?;
        router.ignore_program_changes =
            self.yes_no("Ignore incoming program change messages? (Y/n): ", true)?;
        router.initial_bpm = self.number(
            "Enter initial MIDI clock BPM (1-300, default 142): ",
            1..=300,
            router.initial_bpm,
        )?;
        router.tap_tempo_min_bpm = self.number(
            "Enter tap-tempo minimum BPM (default 80): ",
            1..=i32::MAX,
            router.tap_tempo_min_bpm,
        )?;
        router.tap_tempo_max_bpm = self.number(
            "Enter tap-tempo maximum BPM (default 200): ",
            1..=i32::MAX,
            router.tap_tempo_max_bpm,
        )?;
        router.bpm_offset_for_midi_cc = self.number(
            "Enter BPM offset (offset + MIDI CC value [0-127] = BPM, default 70): ",
            0..=i32::MAX,
            router.bpm_offset_for_midi_cc,
        )?;
        router.tempo_midi_cc = self.cc(
            "Enter tempo MIDI CC number (default 10): ",
            router.tempo_midi_cc,
        )?;
        router.chord_midi_cc = self.cc(
            "Enter chord mode MIDI CC number (default 11): ",
            router.chord_midi_cc,
        )?;
        router.route_midi_cc = self.cc(
            "Enter channel routing MIDI CC number (default 12): ",
            router.route_midi_cc,
        )?;
        router.velocity_midi_cc = self.cc(
            "Enter velocity MIDI CC number (default 13): ",
            router.velocity_midi_cc,
        )?;
        Ok(())
    }

    fn list(&mut self, ports: &[PortInfo]) -> Result<()> {
        for port in ports {
            writeln!(self.output, "{}. {}", port.index, port.name)?;
        }
        Ok(())
    }

    fn port_pattern(&mut self, name: &str) -> Result<String> {
        let keep_id = self.yes_no("Store hardware id? (y/N): ", false)?;
        Ok(if keep_id {
            name.to_string()
        } else {
            trim_hardware_id(name).to_string()
        })
    }

    fn cc(&mut self, question: &str, default: u8) -> Result<u8> {
        let value = self.number(question, 0..=127, i32::from(default))?;
        Ok(u8::try_from(value).unwrap_or(default))
    }

    /// Empty or out-of-range answers take `default`.
    fn number(&mut self, question: &str, range: RangeInclusive<i32>, default: i32) -> Result<i32> {
        let answer = self.prompt(question)?;
        Ok(answer
            .parse::<i32>()
            .ok()
            .filter(|v| range.contains(v))
            .unwrap_or(default))
    }

    fn yes_no(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = self.prompt(question)?;
        Ok(match answer.as_str() {
            "y" | "Y" => true,
            "n" | "N" => false,
            _ => default,
        })
    }

    /// One trimmed line. End of input is an error so a required question can't
    /// loop forever.
    fn prompt(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(std::io::Error::new(ErrorKind::UnexpectedEof, "input closed").into());
        }
        Ok(line.trim().to_string())
    }
}
