//! Port-name matching.
//!
//! Backends append a hardware id to port names (ALSA: `"USB Keys:USB Keys MIDI 1 20:0"`).
//! The id changes when devices are replugged, so a configured pattern normally
//! leaves it out and matches any id. A pattern that ends in an id pins that
//! exact port.

use regex::Regex;
use std::sync::OnceLock;

const HARDWARE_ID_PATTERN: &str = r"^(.+)\s([0-9]+):([0-9]+)$";

/// An available port, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
}

/// `true` when `name` ends in a `client:port` hardware id.
pub fn has_hardware_id(name: &str) -> bool {
    static HARDWARE_ID: OnceLock<Option<Regex>> = OnceLock::new();
    HARDWARE_ID
        .get_or_init(|| Regex::new(HARDWARE_ID_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// Drops the last space-separated token. Names without a space are returned whole.
pub fn trim_hardware_id(name: &str) -> &str {
    name.rsplit_once(' ').map_or(name, |(head, _)| head)
}

pub fn port_matches(pattern: &str, port_name: &str) -> bool {
    if has_hardware_id(pattern) {
        port_name == pattern
    } else {
        trim_hardware_id(port_name) == pattern
    }
}

/// First port whose name matches `pattern`.
pub fn find_port<'a>(pattern: &str, ports: &'a [PortInfo]) -> Option<&'a PortInfo> {
    ports.iter().find(|port| port_matches(pattern, &port.name))
}
