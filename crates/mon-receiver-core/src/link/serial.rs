//! Serial port handling
//!
//! Enumerates candidate devices and opens them with the controller's fixed
//! 8N1 configuration.

use std::collections::BTreeSet;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;

use super::{LinkChannel, LinkConfig, LinkError};

/// Source of candidate devices and open connections
///
/// [`SystemSerial`] talks to real hardware; tests substitute scripted backends.
pub trait SerialBackend: Send {
    /// Device paths that currently match the candidate pattern, in any order
    fn candidates(&self) -> Vec<String>;

    /// Open `device` with the given read timeout
    fn open(&self, device: &str, timeout: Duration) -> Result<Box<dyn LinkChannel>, LinkError>;
}

/// Candidate pattern for the current platform
pub fn default_patterns() -> Vec<String> {
    #[cfg(target_os = "linux")]
    let patterns = vec!["/dev/ttyUSB".to_string()];
    #[cfg(target_os = "macos")]
    let patterns = vec!["/dev/cu.usbserial".to_string()];
    #[cfg(target_os = "windows")]
    let patterns = vec!["COM".to_string()];
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    let patterns = vec!["/dev/tty".to_string()];

    patterns
}

/// Sort key: numeric suffix of the base name, then the base name itself
fn port_sort_key(name: &str) -> (Option<u64>, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let digits = basename.len()
        - basename
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();
    let number = basename[digits..].parse::<u64>().ok();
    (number, basename.to_string())
}

/// Order candidates highest-numbered first
///
/// Freshly attached adapters usually get the highest number, so they are
/// tried before stale ones.
pub fn sort_candidates(candidates: &mut [String]) {
    candidates.sort_by(|a, b| port_sort_key(b).cmp(&port_sort_key(a)));
}

/// Keep the names matching any of the patterns, without duplicates
pub fn filter_candidates<I>(names: I, patterns: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .filter(|name| patterns.iter().any(|p| name.starts_with(p.as_str())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// List all serial port names the system knows about, with /dev fallbacks
pub fn list_port_names() -> Vec<String> {
    let mut names: Vec<String> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| info.port_name)
        .collect();

    // Linux-only: udev may not report ports on minimal systems
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    names.push(format!("/dev/{}", fname));
                }
            }
        }
    }

    names
}

/// Real serial ports through the `serialport` crate
#[derive(Debug, Clone)]
pub struct SystemSerial {
    patterns: Vec<String>,
    baud_rate: u32,
}

impl SystemSerial {
    /// Backend using the link configuration's patterns and baud rate
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            patterns: config.device_patterns.clone(),
            baud_rate: config.baud_rate,
        }
    }
}

impl SerialBackend for SystemSerial {
    fn candidates(&self) -> Vec<String> {
        filter_candidates(list_port_names(), &self.patterns)
    }

    fn open(&self, device: &str, timeout: Duration) -> Result<Box<dyn LinkChannel>, LinkError> {
        let port = serialport::new(device, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| LinkError::Open {
                device: device.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(port))
    }
}
