//! Measurements as delivered to the store

use chrono::{DateTime, SubsecRound, Utc};

use crate::protocol::Packet;

/// Timestamp text format: ISO-8601, UTC, microseconds
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// One value of one series at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Series name, taken from the packet name
    pub measurement: String,
    /// Ingestion time, truncated to microseconds
    pub timestamp: DateTime<Utc>,
    /// Measured value
    pub value: f32,
}

impl Measurement {
    /// Adapt a packet, stamping it with `now`
    pub fn from_packet(packet: Packet, now: DateTime<Utc>) -> Self {
        Self {
            measurement: packet.name().to_string(),
            timestamp: now.trunc_subsecs(6),
            value: packet.value(),
        }
    }

    /// Timestamp as ISO-8601 text
    pub fn time(&self) -> String {
        self.timestamp.format(TIME_FORMAT).to_string()
    }

    /// InfluxDB line protocol with microsecond timestamp
    ///
    /// `None` for points line protocol cannot carry: NaN or infinite values,
    /// and names with control characters.
    pub fn to_line_protocol(&self) -> Option<String> {
        if !self.value.is_finite() || self.measurement.chars().any(char::is_control) {
            return None;
        }

        Some(format!(
            "{} value={} {}",
            escape_measurement(&self.measurement),
            self.value,
            self.timestamp.timestamp_micros()
        ))
    }
}

fn escape_measurement(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, ',' | ' ' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(nanos: u32) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2020, 4, 1, 12, 30, 5).unwrap();
        base + chrono::Duration::nanoseconds(i64::from(nanos))
    }

    #[test]
    fn test_from_packet_truncates_to_micros() {
        let packet = Packet::new("flow", 1.25).unwrap();
        let m = Measurement::from_packet(packet, at(123_456_789));

        assert_eq!(m.measurement, "flow");
        assert_eq!(m.value, 1.25);
        assert_eq!(m.timestamp, at(123_456_000));
        assert_eq!(m.time(), "2020-04-01T12:30:05.123456Z");
    }

    #[test]
    fn test_line_protocol() {
        let m = Measurement::from_packet(Packet::new("flow", 1.5).unwrap(), at(1_000));
        assert_eq!(
            m.to_line_protocol().unwrap(),
            format!("flow value=1.5 {}", at(0).timestamp_micros() + 1)
        );
    }

    #[test]
    fn test_line_protocol_escapes_and_skips_nan() {
        let mut m = Measurement::from_packet(Packet::new("a b,c", 2.0).unwrap(), at(0));
        assert!(m.to_line_protocol().unwrap().starts_with("a\\ b\\,c value=2 "));

        m.value = f32::NAN;
        assert_eq!(m.to_line_protocol(), None);
    }

    #[test]
    fn test_line_protocol_skips_control_characters() {
        let mut m = Measurement::from_packet(Packet::new("flow", 2.0).unwrap(), at(0));
        for name in ["a\nb", "a\rb", "ta\tb", "x\0"] {
            m.measurement = name.to_string();
            assert_eq!(m.to_line_protocol(), None, "{name:?}");
        }
    }
}
