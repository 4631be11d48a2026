use serde::{Deserialize, Serialize};
use serde_repr::Serialize_repr;
use serde_with::skip_serializing_none;

/// Labels for `TPV.mode`, indexed by the wire code.
pub const FIX_LABELS: [&str; 4] = ["unknown", "no fix", "2D", "3D"];

/// Labels for `satellite.gnssid`, indexed by the wire code.
///
/// SBAS (1) and IMES (4) are reported as "unknown".
pub const GNSS_SYSTEM_LABELS: [&str; 7] = [
    "GPS", "unknown", "Galileo", "Beidou", "unknown", "QZSS", "GLONASS",
];

const UNKNOWN_LABEL: &str = "unknown";

/// Looks up the fix label for a raw mode code.
pub fn fix_label(code: i64) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|index| FIX_LABELS.get(index))
        .copied()
        .unwrap_or(UNKNOWN_LABEL)
}

/// Looks up the constellation label for a raw `gnssid`.
///
/// A missing id is treated like an unmapped one.
pub fn gnss_system_label(gnssid: Option<i32>) -> &'static str {
    gnssid
        .and_then(|id| usize::try_from(id).ok())
        .and_then(|index| GNSS_SYSTEM_LABELS.get(index))
        .copied()
        .unwrap_or(UNKNOWN_LABEL)
}

/// * [gps_fix_t.mode](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L181)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FixMode {
    #[default]
    Unknown = 0,
    NoFix = 1,
    Fix2D = 2,
    Fix3D = 3,
}

impl FixMode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(FixMode::Unknown),
            1 => Some(FixMode::NoFix),
            2 => Some(FixMode::Fix2D),
            3 => Some(FixMode::Fix3D),
            _ => None,
        }
    }

    /// Human readable label ("unknown", "no fix", "2D", "3D")
    pub fn label(self) -> &'static str {
        fix_label(self as i64)
    }
}

impl<'de> Deserialize<'de> for FixMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i64::deserialize(deserializer)?;
        Ok(FixMode::from_code(code).unwrap_or_else(|| {
            log::debug!("TPV mode {code} out of range, treating as unknown");
            FixMode::Unknown
        }))
    }
}

/// * [satellite.health](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L2504)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr)]
#[repr(u8)]
pub enum SatHealth {
    #[default]
    Unknown = 0,
    Ok = 1,
    Bad = 2,
}

impl<'de> Deserialize<'de> for SatHealth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = i64::deserialize(deserializer)?;
        match v {
            1 => Ok(SatHealth::Ok),
            2 => Ok(SatHealth::Bad),
            _ => Ok(SatHealth::Unknown),
        }
    }
}

/// * [dop_t](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L2557)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dop {
    #[serde(rename = "xdop")]
    pub x: Option<f64>,
    #[serde(rename = "ydop")]
    pub y: Option<f64>,
    #[serde(rename = "pdop")]
    pub p: Option<f64>,
    #[serde(rename = "hdop")]
    pub h: Option<f64>,
    #[serde(rename = "vdop")]
    pub v: Option<f64>,
    #[serde(rename = "tdop")]
    pub t: Option<f64>,
    #[serde(rename = "gdop")]
    pub g: Option<f64>,
}

/// - [json_attrs_satellites](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L295)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Satellite {
    /// PRN ID; 1-63 GNSS, 64-96 GLONASS, 100-164 SBAS
    #[serde(rename = "PRN")]
    pub prn: i16,
    #[serde(rename = "az")]
    pub azimuth: Option<f64>,
    #[serde(rename = "el")]
    pub elevation: Option<f64>,
    /// GLONASS frequency slot plus 7 (0 to 13)
    pub freqid: Option<u8>,
    /// Kept raw; ids outside the label table must not fail the report
    pub gnssid: Option<i32>,
    pub health: Option<SatHealth>,
    pub pr: Option<f64>,
    #[serde(rename = "prRate")]
    pub pr_rate: Option<f64>,
    #[serde(rename = "prRes")]
    pub pr_res: Option<f64>,
    /// Signal to noise ratio in dBHz
    pub ss: Option<f64>,
    pub sigid: Option<u8>,
    pub svid: Option<u8>,
    #[serde(default)]
    pub used: bool,
}

/// Pulse timing block of a PPS report
///
/// The same shape is carried verbatim into [`crate::state::State`], so its
/// serialized keys follow the wire names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseTiming {
    /// Seconds from the PPS source
    pub real_sec: i64,
    /// Nanoseconds from the PPS source
    pub real_nsec: i64,
    /// Seconds from the system clock
    pub clock_sec: i64,
    /// Nanoseconds from the system clock
    pub clock_nsec: i64,
    /// NTP style estimate of PPS precision
    pub precision: i32,
    /// SHM key of this PPS
    pub shm: String,
    /// Quantization ("sawtooth") error in picoseconds
    #[serde(rename = "qErr")]
    pub q_err: i64,
}

/// # Watch Policy
/// - [json_watch_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/shared_json.c#L95)
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Watch {
    /// Restricts the stream to one device path
    pub device: Option<String>,
    pub enable: Option<bool>,
    pub json: Option<bool>,
}
