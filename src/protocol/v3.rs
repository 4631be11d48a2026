//! GPSD JSON Protocol Version 3 reports consumed by the watch session
//!
//! GPSD answers a `?WATCH` subscription with an unbounded stream of
//! newline-delimited JSON objects. Every object carries a `class` field
//! naming its shape; this module decodes the three classes the session
//! folds into its state and routes every other class to a fallback.
//!
//! # Protocol Overview
//!
//! - The client sends `?WATCH={"enable":true,"json":true}` once
//! - Responses are JSON objects with a "class" field indicating message type
//! - `TPV`, `SKY` and `PPS` are decoded; `VERSION`, `DEVICES`, `WATCH` and
//!   anything else are unclassified
//!
//! # References
//!
//! Based on the GPSD project protocol specification:
//! - [GPSD Protocol Documentation](https://gpsd.io/gpsd_json.html)

/// Discriminant classifier and the decoded record union
pub mod class;
/// Subscribe command
pub mod request;
/// Report shapes for TPV, SKY and PPS
pub mod response;
/// Common data types and lookup tables used in reports
pub mod types;

pub use class::{Discriminant, Record};
