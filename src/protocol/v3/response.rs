//! GPSD Protocol v3 report shapes folded into the session state
//!
//! Each report is identified by its "class" field in the JSON structure:
//! - TPV (Time-Position-Velocity): fix mode, position and time
//! - SKY: dilution of precision and the satellites in view
//! - PPS (Pulse-Per-Second): precision timing pulses
//!
//! The shapes follow the wire schema closely, including fields the
//! projector does not consume; see [`crate::state`] for which ones flow
//! into the snapshot.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::*;

/// ECEF data, all data in meters, and meters/second, or NaN
/// * [gps_fix_t.ecef](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L245)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ecef {
    #[serde(rename = "ecefx")]
    pub x: Option<f64>,
    #[serde(rename = "ecefy")]
    pub y: Option<f64>,
    #[serde(rename = "ecefz")]
    pub z: Option<f64>,
    #[serde(rename = "ecefpAcc")]
    pub p_acc: Option<f64>,
    #[serde(rename = "ecefvx")]
    pub vx: Option<f64>,
    #[serde(rename = "ecefvy")]
    pub vy: Option<f64>,
    #[serde(rename = "ecefvz")]
    pub vz: Option<f64>,
    #[serde(rename = "ecefvAcc")]
    pub v_acc: Option<f64>,
}

/// Time-Position-Velocity (TPV) report
///
/// Only `mode`, `alt`, `lat`, `lon`, `magvar`, `time` and `leapseconds`
/// are projected into the state. Everything else is decoded for callers
/// that work with records directly.
///
/// Reference: [json_tpv_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L34)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tpv {
    /// Altitude in meters (deprecated, use altMSL or altHAE)
    pub alt: Option<f64>,
    /// Altitude, height above ellipsoid, in meters
    #[serde(rename = "altHAE")]
    pub alt_hae: Option<f64>,
    /// Altitude, MSL (mean sea level) in meters
    #[serde(rename = "altMSL")]
    pub alt_msl: Option<f64>,
    /// Climb/sink rate in meters per second
    pub climb: Option<f64>,
    /// Geodetic datum (usually WGS84)
    pub datum: Option<String>,
    /// Device path that provided this data
    pub device: Option<String>,
    /// ECEF coordinates and velocities (flattened)
    #[serde(flatten)]
    pub ecef: Ecef,
    /// Estimated climb error in meters/second
    pub epc: Option<f64>,
    /// Estimated track error in degrees
    pub epd: Option<f64>,
    /// Estimated horizontal position error in meters
    pub eph: Option<f64>,
    /// Estimated speed error in meters/second
    pub eps: Option<f64>,
    /// Estimated time error in seconds
    pub ept: Option<f64>,
    /// Longitude error estimate in meters
    pub epx: Option<f64>,
    /// Latitude error estimate in meters
    pub epy: Option<f64>,
    /// Estimated vertical error in meters
    pub epv: Option<f64>,
    /// Geoid separation (height of geoid above WGS84 ellipsoid) in meters
    #[serde(rename = "geoidSep")]
    pub geoid_sep: Option<f64>,
    /// Latitude in degrees (positive = North)
    pub lat: Option<f64>,
    /// Current leap seconds (GPS-UTC offset)
    pub leapseconds: Option<i32>,
    /// Longitude in degrees (positive = East)
    pub lon: Option<f64>,
    /// Magnetic track (course over ground relative to magnetic north)
    pub magtrack: Option<f64>,
    /// Magnetic variation in degrees, positive is West
    pub magvar: Option<f64>,
    /// GPS fix mode; a missing mode reads as unknown
    #[serde(default)]
    pub mode: FixMode,
    /// GPS time of fix; absent, or unparseable outside a fix
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub time: Option<DateTime<Utc>>,
    /// True track (course over ground) in degrees
    pub track: Option<f64>,
    /// Spherical error probability in meters
    pub sep: Option<f64>,
    /// Speed over ground in meters/second
    pub speed: Option<f64>,
    /// GPS fix status code (0 unknown, 1 normal, 2 DGPS, ...)
    pub status: Option<i32>,
    /// Wind angle magnetic in degrees
    pub wanglem: Option<f64>,
    /// Wind angle relative in degrees
    pub wangler: Option<f64>,
    /// Wind angle true in degrees
    pub wanglet: Option<f64>,
    /// Wind speed relative in meters/second
    pub wspeedr: Option<f64>,
    /// Wind speed true in meters/second
    pub wspeedt: Option<f64>,
    #[cfg(feature = "extra-fields")]
    /// Additional fields not explicitly defined
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

/// Satellite Sky View (SKY) report
///
/// Newer GPSD releases may split a sky view over several reports, some
/// carrying only the DOP values; `satellites` is `None` for those.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sky {
    /// Device path that provided this data
    pub device: Option<String>,
    /// Dilution of precision values (flattened)
    #[serde(flatten)]
    pub dop: Dop,
    /// GPS time of this sky view
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub time: Option<DateTime<Utc>>,
    /// Number of satellites visible
    #[serde(rename = "nSat")]
    pub n_sat: Option<i32>,
    /// Number of satellites used in navigation solution
    #[serde(rename = "uSat")]
    pub u_sat: Option<i32>,
    /// Satellites in view, in report order
    pub satellites: Option<Vec<Satellite>>,
    #[cfg(feature = "extra-fields")]
    /// Additional fields not explicitly defined
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

/// Pulse-Per-Second (PPS) timing report
///
/// Timing fields are kept as sent: split seconds and nanoseconds, no
/// conversion to a calendar time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pps {
    /// Device path that provided this data
    pub device: Option<String>,
    #[serde(flatten)]
    pub timing: PulseTiming,
}

/// Reads an ISO 8601 time, mapping anything unparseable to `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match opt {
        Some(serde_json::Value::String(iso_time)) => DateTime::parse_from_rfc3339(&iso_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}
