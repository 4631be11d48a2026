//! Report classification
//!
//! A line is decoded in two steps: first only its `class` tag, then the
//! report shape that tag selects. Unknown keys are ignored at both steps.

use serde::Deserialize;

use super::response::{Pps, Sky, Tpv};
use crate::{Result, error::GpsdError};

/// Report class named by the `class` field of a line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminant {
    /// `"TPV"`
    PositionVelocityTime,
    /// `"SKY"`
    SkyView,
    /// `"PPS"`
    PulsePerSecond,
    /// Any other tag, including `VERSION`, `DEVICES` and `WATCH` acknowledgments
    Unclassified(String),
}

impl Discriminant {
    /// Maps a wire tag to its class by exact, case-sensitive match.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "TPV" => Discriminant::PositionVelocityTime,
            "SKY" => Discriminant::SkyView,
            "PPS" => Discriminant::PulsePerSecond,
            other => Discriminant::Unclassified(other.to_owned()),
        }
    }

    /// Reads only the `class` field of a line.
    pub fn classify(line: &[u8]) -> Result<Self> {
        #[derive(Deserialize)]
        struct RawRecord {
            class: Option<String>,
        }

        let raw: RawRecord = serde_json::from_slice(line).map_err(GpsdError::SerdeError)?;
        match raw.class {
            Some(tag) => Ok(Discriminant::from_tag(&tag)),
            None => Err(GpsdError::ProtocolError("report has no class field")),
        }
    }
}

/// A decoded report
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Time-Position-Velocity report
    Tpv(Box<Tpv>),
    /// Satellite sky view report
    Sky(Sky),
    /// Pulse-per-second timing report
    Pps(Pps),
    /// Report of any other class, carrying its tag
    Unclassified(String),
}

impl Record {
    /// Classifies a line and decodes it into the matching report shape.
    ///
    /// Fails if the line is not a JSON object with a string `class`, or if
    /// a recognized class does not match its expected field shapes.
    pub fn decode(line: &[u8]) -> Result<Self> {
        let record = match Discriminant::classify(line)? {
            Discriminant::PositionVelocityTime => {
                Record::Tpv(serde_json::from_slice(line).map_err(GpsdError::SerdeError)?)
            }
            Discriminant::SkyView => {
                Record::Sky(serde_json::from_slice(line).map_err(GpsdError::SerdeError)?)
            }
            Discriminant::PulsePerSecond => {
                Record::Pps(serde_json::from_slice(line).map_err(GpsdError::SerdeError)?)
            }
            Discriminant::Unclassified(tag) => Record::Unclassified(tag),
        };
        Ok(record)
    }
}
