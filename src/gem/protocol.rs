//! # GEM Protocol Constants and Types
//!
//! Core definitions for the GEM status-report grammar.
//!
//! A GEM monitor periodically emits one ASCII status line per report. Fields
//! are joined by `&`, each field is a `key=value` pair. Scalar keys carry the
//! mains voltage (`v`) and the monitor serial (`n`, also sent as the literal
//! key `Alive n` right after a keepalive poll). Channel keys have the shape
//! `{type}_{channel}`: `wh` (watt-hours), `p` (watts) and `a` (amps) populate
//! the channel's energy sample, `t` a temperature sample and `c` a pulse
//! counter sample.

use std::collections::BTreeMap;
use thiserror::Error;

/// Keepalive poll sent to the monitor once per second
pub const KEEPALIVE_POLL: &[u8] = b"^^^APISPK";

/// Field separator within one status report
pub const FIELD_SEPARATOR: char = '&';

/// Temperature values the monitor sends for an unconnected sensor
pub const TEMPERATURE_NO_READING: &[&str] = &["nc", "x"];

/// Energy readings for one channel
///
/// Fields are populated independently as `wh_N` / `p_N` / `a_N` fields are
/// seen; a field absent from the report stays at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergySample {
    /// Accumulated energy in watt-hours
    pub watt_hours: f64,

    /// Instantaneous power in watts
    pub watts: f64,

    /// Instantaneous current in amperes
    pub amps: f64,
}

/// Pulse counter reading for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseSample {
    /// Accumulated pulse count
    pub pulses: i64,
}

/// Temperature reading for one channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureSample {
    /// Temperature in the monitor's configured unit
    pub temperature: f64,
}

/// A decode problem for a single field of a status report
///
/// Decoding never fails as a whole; each malformed field is skipped and
/// recorded as one of these. The two variants match the two failure shapes
/// of the grammar: a field (or channel key) with the wrong structure, and a
/// well-shaped field whose value does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Field did not split into exactly one `key=value` pair, or a channel
    /// key did not have the `{type}_{channel}` shape
    #[error("malformed field `{0}`")]
    Structure(String),

    /// Value (or channel id) failed to parse for its expected type
    #[error("unparseable value in field `{0}`")]
    Parse(String),
}

/// One decoded status report
///
/// Scoped to a single decode call: channel maps are built fresh per report
/// and never merged across reports. A report that sets none of the fields
/// still decodes to this (all-default) value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    /// Mains voltage from the `v` field (0 if absent or unparseable)
    pub voltage: f64,

    /// Monitor serial from the `n` field, raw and unvalidated (empty if absent)
    pub serial: String,

    /// Energy samples keyed by channel id
    pub energy: BTreeMap<i64, EnergySample>,

    /// Pulse counter samples keyed by channel id
    pub pulses: BTreeMap<i64, PulseSample>,

    /// Temperature samples keyed by channel id
    pub temperatures: BTreeMap<i64, TemperatureSample>,

    /// Per-field decode problems, in field order
    pub field_errors: Vec<FieldError>,
}
