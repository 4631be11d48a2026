//! # gpsd-state
//!
//! A Rust client for GPSD (GPS Service Daemon) that keeps a live snapshot of
//! device state from its JSON watch stream.
//!
//! ## Overview
//!
//! GPSD monitors GNSS receivers and streams their reports as newline-delimited
//! JSON on TCP port 2947. Each report carries a `class` tag naming its shape.
//! This library subscribes to that stream, classifies each line, and folds
//! the position (`TPV`), sky view (`SKY`) and timing pulse (`PPS`) reports
//! into a [`state::State`] that callers can read, or serialize, at any time
//! while a background read loop keeps it current.
//!
//! Lines that fail to decode are dropped without stopping the loop. The loop
//! ends only when the connection does; reconnecting is left to the caller.
//!
//! ## Example
//!
//! ```ignore
//! use gpsd_state::client::{DEFAULT_ADDRESS, GpsdSession};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = GpsdSession::new(DEFAULT_ADDRESS, 0.0, 0.0);
//!     let handle = session.start().await?;
//!
//!     loop {
//!         tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!         println!("{}", session.state().to_json_pretty()?);
//!         if handle.is_finished() {
//!             return Err(handle.join().await.into());
//!         }
//!     }
//! }
//! ```

use crate::error::GpsdError;

/// Session management: connecting, subscribing and the background read loop
pub mod client;

/// Error types used throughout the library
pub mod error;

/// Protocol definitions and report decoding for the GPSD JSON protocol
pub mod protocol;

/// Live device snapshot and the projection of reports into it
pub mod state;

/// Convenience type alias for Results with GpsdError
pub type Result<T> = core::result::Result<T, GpsdError>;
