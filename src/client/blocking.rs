//! Blocking (std thread) session implementation
//!
//! This module runs the same read loop as the async session on a
//! dedicated OS thread, for applications without an async runtime.

use std::io::BufRead;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Result;
use crate::client::{GpsdSession, LineHandler};
use crate::error::GpsdError;
use crate::protocol::{GpsdJsonDecode, GpsdJsonEncode, v3};

impl GpsdSession {
    /// Connects to GPSD, subscribes, and spawns the read loop on a thread
    ///
    /// Connection and subscribe failures are returned here; the thread is
    /// only spawned once both succeeded.
    ///
    /// # Example
    /// ```no_run
    /// # use gpsd_state::client::GpsdSession;
    /// let session = GpsdSession::new("127.0.0.1:2947", 0.0, 0.0);
    /// let handle = session.start_blocking().unwrap();
    /// std::thread::sleep(std::time::Duration::from_secs(5));
    /// println!("{:?}", session.snapshot().position);
    /// handle.close();
    /// ```
    pub fn start_blocking(&self) -> Result<SessionHandle> {
        let mut stream = TcpStream::connect(self.server()).map_err(GpsdError::IoError)?;
        log::info!("connected to GPSD at {}", self.server());
        stream.write_request(&v3::types::Watch::json_stream())?;

        let stop = Arc::new(AtomicBool::new(false));
        let handler = self.line_handler();
        let thread = {
            let stop = stop.clone();
            std::thread::Builder::new()
                .name("gpsd-read-loop".into())
                .spawn(move || read_loop(std::io::BufReader::new(stream), &handler, &stop))
                .map_err(GpsdError::IoError)?
        };

        Ok(SessionHandle { thread, stop })
    }

    /// Subscribes on an already connected stream and runs the read loop
    /// on the calling thread
    ///
    /// Only returns once the stream fails or closes, with the condition
    /// that ended it.
    pub fn run_blocking<Stream>(&self, mut stream: Stream) -> GpsdError
    where
        Stream: std::io::Read + std::io::Write,
    {
        if let Err(err) = stream.write_request(&v3::types::Watch::json_stream()) {
            return err;
        }
        let never = AtomicBool::new(false);
        read_loop(
            std::io::BufReader::new(stream),
            &self.line_handler(),
            &never,
        )
    }
}

/// Owner's handle on a read loop thread
///
/// Dropping the handle detaches the thread.
#[derive(Debug)]
pub struct SessionHandle {
    thread: std::thread::JoinHandle<GpsdError>,
    stop: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Asks the read loop to stop
    ///
    /// The thread is blocked on the socket between lines, so the request
    /// is honoured after the next line arrives or the connection drops.
    pub fn close(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns true once the read loop has ended
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the read loop to end and returns what ended it
    pub fn join(self) -> GpsdError {
        match self.thread.join() {
            Ok(err) => err,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn read_loop<R: BufRead>(mut reader: R, handler: &LineHandler, stop: &AtomicBool) -> GpsdError {
    let mut buf = Vec::new();
    loop {
        if stop.load(Ordering::Acquire) {
            return GpsdError::Aborted;
        }
        match reader.read_raw_line(&mut buf) {
            Ok(Some(line)) => handler.handle_line(line),
            Ok(None) => {
                log::warn!("GPSD closed the connection");
                return GpsdError::ConnectionClosed;
            }
            Err(err) => {
                log::warn!("reading from GPSD failed: {err}");
                return err;
            }
        }
    }
}
