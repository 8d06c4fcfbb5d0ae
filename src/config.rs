//! Configuration file (`midicloro.toml`).
//!
//! One flat TOML table: the port names plus every [`RouterConfig`] key.
//!
//! ```toml
//! input1 = "Arturia BeatStep:Arturia BeatStep MIDI 1"
//! input2 = ""
//! output = "USB MIDI Interface 24:0"
//! enableClock = true
//! initialBpm = 142
//! tempoMidiCC = 10
//! ```

use crate::error::{Error, Result};
use cloro_midi::{RouterConfig, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "midicloro.toml";

/// Port-name patterns. Empty inputs are disabled; the output is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub input1: String,
    pub input2: String,
    pub input3: String,
    pub input4: String,
    pub output: String,
}

impl PortConfig {
    pub fn inputs(&self) -> [(Source, &str); 4] {
        let [s1, s2, s3, s4] = Source::ALL;
        [
            (s1, self.input1.as_str()),
            (s2, self.input2.as_str()),
            (s3, self.input3.as_str()),
            (s4, self.input4.as_str()),
        ]
    }

    pub fn set_input(&mut self, source: Source, pattern: String) {
        let slot = match source.index() {
            0 => &mut self.input1,
            1 => &mut self.input2,
            2 => &mut self.input3,
            _ => &mut self.input4,
        };
        *slot = pattern;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub ports: PortConfig,

    #[serde(flatten)]
    pub router: RouterConfig,

    /// Keys neither table knows. Reported at load, kept on save.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Parses and validates. Unknown keys are logged at warn.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        for key in config.unknown.keys() {
            warn!("Ignoring unknown config key '{}'", key);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigMissing {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.router.validate()?;
        if self.ports.output.is_empty() {
            return Err(cloro_midi::Error::InvalidConfig(
                "output port must be set".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_takes_defaults() {
        let config = Config::from_toml_str("output = \"Synth\"\n").unwrap();
        assert_eq!(config.ports.output, "Synth");
        assert_eq!(config.ports.input1, "");
        assert_eq!(config.router, RouterConfig::default());
    }

    #[test]
    fn test_camel_case_key_names() {
        let config = Config::from_toml_str(
            r#"
input1 = "Keys"
input3 = "Pads 20:0"
output = "Synth"
enableClock = false
ignoreProgramChanges = false
initialBpm = 120
tapTempoMinBpm = 60
tapTempoMaxBpm = 180
bpmOffsetForMidiCC = 50
tempoMidiCC = 20
chordMidiCC = 21
routeMidiCC = 22
velocityMidiCC = 23
velocityRandomOffset = 30
velocityMultiDeviceCtrl = true
input2noteOffMode = true
"#,
        )
        .unwrap();

        let inputs: Vec<&str> = config.ports.inputs().iter().map(|(_, p)| *p).collect();
        assert_eq!(inputs, vec!["Keys", "", "Pads 20:0", ""]);
        let r = &config.router;
        assert!(!r.enable_clock);
        assert!(!r.ignore_program_changes);
        assert_eq!(r.initial_bpm, 120);
        assert_eq!((r.tap_tempo_min_bpm, r.tap_tempo_max_bpm), (60, 180));
        assert_eq!(r.bpm_offset_for_midi_cc, 50);
        assert_eq!(
            (r.tempo_midi_cc, r.chord_midi_cc, r.route_midi_cc, r.velocity_midi_cc),
            (20, 21, 22, 23)
        );
        assert_eq!(r.velocity_random_offset, 30);
        assert!(r.velocity_multi_device_ctrl);
        assert!(r.note_off_mode(Source::ALL[1]));
        assert!(!r.note_off_mode(Source::ALL[0]));
        assert!(config.unknown.is_empty());
    }

    #[test]
    fn test_unknown_keys_collected() {
        let config = Config::from_toml_str("output = \"Synth\"\nfoo = 1\n").unwrap();
        assert_eq!(config.unknown.keys().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn test_missing_output_rejected() {
        assert!(matches!(
            Config::from_toml_str("input1 = \"Keys\"\n"),
            Err(Error::Core(cloro_midi::Error::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_invalid_router_values_rejected() {
        assert!(Config::from_toml_str("output = \"Synth\"\ninitialBpm = 0\n").is_err());
        assert!(matches!(
            Config::from_toml_str("output = \"Synth\"\ninitialBpm = \"fast\"\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.ports.output = "Synth 24:0".to_string();
        config.ports.set_input(Source::ALL[2], "Pads".to_string());
        config.router.initial_bpm = 99;

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("initialBpm = 99"));
        assert!(text.contains("tempoMidiCC = 10"));
        assert!(text.contains("input3 = \"Pads\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { .. }));
        assert!(err.to_string().contains("--configure"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_PATH);
        let mut config = Config::default();
        config.ports.output = "Synth".to_string();
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
