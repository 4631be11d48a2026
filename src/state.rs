//! Live device snapshot
//!
//! [`State`] holds the latest projected values of each report class.
//! Each class owns a disjoint group of fields: a TPV report never touches
//! the sky view, a SKY report never touches the position, and so on.
//! A field no report has carried yet keeps its default.
//!
//! [`SharedState`] is the handle readers hold while a session's read loop
//! writes. One report is applied under a single write lock, so a reader
//! never observes half of a report; it may still observe a position and a
//! satellite list that came from different protocol ticks.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    Result,
    error::GpsdError,
    protocol::v3::{
        Record,
        response::{Pps, Sky, Tpv},
        types::{FixMode, PulseTiming, SatHealth, Satellite, gnss_system_label},
    },
};

/// Position block, written by TPV reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Fix label: "unknown", "no fix", "2D" or "3D"
    pub fix: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    /// Taken from the deprecated `alt` key, not `altHAE`/`altMSL`
    pub altitude: f64,
    /// Degrees, positive is West
    pub magnetic_variation: f64,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            fix: FixMode::Unknown.label(),
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            magnetic_variation: 0.0,
        }
    }
}

/// Time block, written by TPV reports
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeData {
    /// UTC time of the last fix that carried a valid timestamp
    pub timestamp: Option<DateTime<Utc>>,
    pub leapseconds: i32,
}

/// Dilution of precision block, written by SKY reports
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DilutionOfPrecision {
    pub xdop: f64,
    pub ydop: f64,
    pub vdop: f64,
    pub tdop: f64,
    pub hdop: f64,
    pub pdop: f64,
    pub gdop: f64,
}

/// One tracked satellite
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatInfo {
    pub prn: i16,
    /// Degrees, 0 to 90
    pub elevation: Option<f64>,
    /// Degrees from true north
    pub azimuth: Option<f64>,
    /// dBHz
    pub signal_noise_ratio: Option<f64>,
    pub used: bool,
    /// Constellation label ("GPS", "Galileo", ..., "unknown")
    #[serde(rename = "type")]
    pub system: &'static str,
    pub svid: Option<u8>,
    pub sigid: Option<u8>,
    pub freqid: Option<u8>,
    pub health: SatHealth,
}

impl From<&Satellite> for SatInfo {
    fn from(sat: &Satellite) -> Self {
        if sat.gnssid.is_some_and(|id| !(0..=6).contains(&id)) {
            log::debug!("PRN {} has unmapped gnssid {:?}", sat.prn, sat.gnssid);
        }

        SatInfo {
            prn: sat.prn,
            elevation: sat.elevation,
            azimuth: sat.azimuth,
            signal_noise_ratio: sat.ss,
            used: sat.used,
            system: gnss_system_label(sat.gnssid),
            svid: sat.svid,
            sigid: sat.sigid,
            freqid: sat.freqid,
            health: sat.health.unwrap_or_default(),
        }
    }
}

/// Latest known device state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub position: Position,
    pub time: TimeData,
    pub dilution_of_precision: DilutionOfPrecision,
    /// Satellites of the latest sky view, in report order
    pub satellites: Vec<SatInfo>,
    /// Pulse timing of the latest PPS report, verbatim
    pub timing: PulseTiming,
}

impl State {
    /// Projects a TPV report.
    ///
    /// Every projected field is rewritten; a key the report leaves out
    /// reads as zero. `time` is the exception: an absent or invalid time
    /// leaves the previous timestamp in place.
    pub fn apply_tpv(&mut self, tpv: &Tpv) {
        self.position = Position {
            fix: tpv.mode.label(),
            latitude: tpv.lat.unwrap_or_default(),
            longitude: tpv.lon.unwrap_or_default(),
            altitude: tpv.alt.unwrap_or_default(),
            magnetic_variation: tpv.magvar.unwrap_or_default(),
        };
        if let Some(time) = tpv.time {
            self.time.timestamp = Some(time);
        }
        self.time.leapseconds = tpv.leapseconds.unwrap_or_default();
    }

    /// Projects a SKY report.
    ///
    /// All seven DOP values are copied, missing ones as zero. The satellite
    /// list is replaced wholesale, in report order; a report without a
    /// `satellites` array leaves it empty.
    pub fn apply_sky(&mut self, sky: &Sky) {
        self.dilution_of_precision = DilutionOfPrecision {
            xdop: sky.dop.x.unwrap_or_default(),
            ydop: sky.dop.y.unwrap_or_default(),
            vdop: sky.dop.v.unwrap_or_default(),
            tdop: sky.dop.t.unwrap_or_default(),
            hdop: sky.dop.h.unwrap_or_default(),
            pdop: sky.dop.p.unwrap_or_default(),
            gdop: sky.dop.g.unwrap_or_default(),
        };
        self.satellites = sky.satellites.iter().flatten().map(SatInfo::from).collect();
    }

    /// Projects a PPS report; the timing block is copied as is.
    pub fn apply_pps(&mut self, pps: &Pps) {
        self.timing.clone_from(&pps.timing);
    }

    /// Projects any record. Returns false for unclassified records, which
    /// leave the state untouched.
    pub fn apply(&mut self, record: &Record) -> bool {
        match record {
            Record::Tpv(tpv) => self.apply_tpv(tpv),
            Record::Sky(sky) => self.apply_sky(sky),
            Record::Pps(pps) => self.apply_pps(pps),
            Record::Unclassified(_) => return false,
        }
        true
    }

    /// Number of satellites in the latest sky view
    pub fn satellites_visible(&self) -> usize {
        self.satellites.len()
    }

    /// Number of satellites in the latest sky view flagged as used in the fix
    pub fn satellites_used(&self) -> usize {
        self.satellites.iter().filter(|sat| sat.used).count()
    }
}

/// Lock-guarded handle on a session's [`State`]
///
/// Cloning the handle shares the same state. Only the owning session
/// writes through it.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<State>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the state under the read lock.
    ///
    /// Holding the guard stalls the read loop's next write; prefer
    /// [`SharedState::snapshot`] for anything slow.
    pub fn read(&self) -> RwLockReadGuard<'_, State> {
        // Projectors only assign fields; a poisoned lock still guards a whole report.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> State {
        self.read().clone()
    }

    /// Serializes a snapshot as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.snapshot()).map_err(GpsdError::SerdeError)
    }

    /// Serializes a snapshot as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(GpsdError::SerdeError)
    }

    /// Applies one record under a single write lock.
    pub(crate) fn apply(&self, record: &Record) -> bool {
        if matches!(record, Record::Unclassified(_)) {
            return false;
        }
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.apply(record)
    }
}
