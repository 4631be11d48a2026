//! GPSD watch session
//!
//! A [`GpsdSession`] connects to GPSD, subscribes to the JSON report stream
//! and runs a background read loop that folds every TPV, SKY and PPS report
//! into a [`State`]. Any number of callers may read the state while the
//! loop writes it.
//!
//! The async session runs its loop as a tokio task. For a std thread, see
//! the `blocking` submodule.
//!
//! # Example
//!
//! ```no_run
//! use gpsd_state::client::{DEFAULT_ADDRESS, GpsdSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = GpsdSession::new(DEFAULT_ADDRESS, 0.0, 0.0);
//! let handle = session.start().await?;
//!
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! println!("{}", session.state().to_json_pretty()?);
//!
//! // The loop only ends when GPSD goes away
//! eprintln!("session ended: {}", handle.join().await);
//! # Ok(())
//! # }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    Result,
    error::GpsdError,
    protocol::{GpsdJsonRequest, v3},
    state::{SharedState, State},
};

/// Blocking (std thread) session implementation
pub mod blocking;

/// Address GPSD listens on by default
pub const DEFAULT_ADDRESS: &str = "localhost:2947";

/// Destination for raw lines echoed in debug mode
///
/// Closures taking a `&str` are sinks too.
pub trait DiagnosticSink: Send + Sync {
    fn echo(&self, line: &str);
}

/// Echoes to standard output, one line per report
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn echo(&self, line: &str) {
        println!("{line}");
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn echo(&self, line: &str) {
        self(line)
    }
}

/// Per-line work of the read loop, shared by the async and blocking loops
#[derive(Clone)]
pub(crate) struct LineHandler {
    state: SharedState,
    debug: Arc<AtomicBool>,
    sink: Arc<dyn DiagnosticSink>,
}

impl LineHandler {
    /// Classifies one line and projects it into the state.
    ///
    /// Lines that fail to decode are dropped; this never fails.
    pub(crate) fn handle_line(&self, line: &[u8]) {
        let line = line.trim_ascii();
        if line.is_empty() {
            return;
        }
        log::trace!("gpsd: {}", String::from_utf8_lossy(line));

        match v3::Record::decode(line) {
            Ok(v3::Record::Unclassified(tag)) => {
                if self.debug.load(Ordering::Relaxed) {
                    self.sink.echo(&String::from_utf8_lossy(line));
                } else {
                    log::trace!("ignoring {tag} report");
                }
            }
            Ok(record) => {
                self.state.apply(&record);
            }
            Err(err) => log::debug!("dropping line from GPSD: {err}"),
        }
    }
}

/// Session with a GPSD daemon
///
/// Created once with all-default state; the state lives as long as the
/// session and keeps its last values after the read loop ends.
pub struct GpsdSession {
    server: String,
    start_longitude: f64,
    start_latitude: f64,
    state: SharedState,
    debug: Arc<AtomicBool>,
    sink: Arc<dyn DiagnosticSink>,
}

impl core::fmt::Debug for GpsdSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpsdSession")
            .field("server", &self.server)
            .field("start_longitude", &self.start_longitude)
            .field("start_latitude", &self.start_latitude)
            .field("debug", &self.debug())
            .finish_non_exhaustive()
    }
}

impl GpsdSession {
    /// Creates a session for the GPSD at `server` (e.g. "localhost:2947")
    ///
    /// The start coordinates are stored for callers but not used by the
    /// session itself.
    pub fn new<S: Into<String>>(server: S, start_longitude: f64, start_latitude: f64) -> Self {
        GpsdSession {
            server: server.into(),
            start_longitude,
            start_latitude,
            state: SharedState::new(),
            debug: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(StdoutSink),
        }
    }

    /// Replaces the debug echo destination
    ///
    /// Applies to read loops started afterwards.
    pub fn with_sink<D: DiagnosticSink + 'static>(mut self, sink: D) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Enables or disables echoing unclassified reports to the sink
    ///
    /// Takes effect immediately, including for a running read loop.
    /// Has no effect on the state.
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Start coordinates given at construction, as (longitude, latitude)
    pub fn start_position(&self) -> (f64, f64) {
        (self.start_longitude, self.start_latitude)
    }

    /// Handle for reading the state; clones share the same state
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> State {
        self.state.snapshot()
    }

    pub(crate) fn line_handler(&self) -> LineHandler {
        LineHandler {
            state: self.state.clone(),
            debug: self.debug.clone(),
            sink: self.sink.clone(),
        }
    }

    /// Subscribes on an already connected stream and runs the read loop
    /// on the current task
    ///
    /// Runtime agnostic. Only returns once the stream fails or closes,
    /// with the condition that ended it.
    pub async fn run<Stream>(&self, mut stream: Stream) -> GpsdError
    where
        Stream: futures_io::AsyncRead + futures_io::AsyncWrite + Unpin,
    {
        if let Err(err) = subscribe(&mut stream).await {
            return err;
        }
        read_loop(stream, self.line_handler()).await
    }
}

#[cfg(feature = "tokio")]
impl GpsdSession {
    /// Connects to GPSD, subscribes, and spawns the read loop on tokio
    ///
    /// Connection and subscribe failures are returned here; the read loop
    /// is only spawned once both succeeded.
    pub async fn start(&self) -> Result<SessionHandle> {
        use tokio_util::compat::TokioAsyncReadCompatExt;

        let stream = tokio::net::TcpStream::connect(self.server.as_str())
            .await
            .map_err(GpsdError::IoError)?;
        log::info!("connected to GPSD at {}", self.server);

        let mut stream = stream.compat();
        subscribe(&mut stream).await?;

        let task = tokio::spawn(read_loop(stream, self.line_handler()));
        Ok(SessionHandle { task })
    }
}

/// Owner's handle on a spawned read loop
///
/// Dropping the handle detaches the loop; it keeps running until GPSD
/// closes the connection.
#[cfg(feature = "tokio")]
#[derive(Debug)]
pub struct SessionHandle {
    task: tokio::task::JoinHandle<GpsdError>,
}

#[cfg(feature = "tokio")]
impl SessionHandle {
    /// Returns true once the read loop has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the read loop at its next suspension point
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Waits for the read loop to end and returns what ended it
    pub async fn join(self) -> GpsdError {
        match self.task.await {
            Ok(err) => err,
            Err(err) if err.is_cancelled() => GpsdError::Aborted,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

/// Sends the watch command enabling the JSON report stream
async fn subscribe<Stream>(stream: &mut Stream) -> Result<()>
where
    Stream: futures_io::AsyncWrite + Unpin,
{
    use futures_util::AsyncWriteExt;

    let cmd = v3::types::Watch::json_stream().to_command();
    stream
        .write_all(cmd.as_bytes())
        .await
        .map_err(GpsdError::IoError)?;
    stream.flush().await.map_err(GpsdError::IoError)?;
    log::info!("sent {cmd}");
    Ok(())
}

async fn read_loop<Stream>(stream: Stream, handler: LineHandler) -> GpsdError
where
    Stream: futures_io::AsyncRead + Unpin,
{
    use futures_util::AsyncBufReadExt;

    let mut reader = futures_util::io::BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                log::warn!("GPSD closed the connection");
                return GpsdError::ConnectionClosed;
            }
            Ok(_) => handler.handle_line(&buf),
            Err(err) => {
                log::warn!("reading from GPSD failed: {err}");
                return GpsdError::IoError(err);
            }
        }
    }
}

#[cfg(all(test, feature = "tokio"))]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Plays GPSD for one client: checks the subscribe command, sends
    /// `lines`, then closes unless `hold` is set.
    async fn serve(lines: Vec<String>, hold: bool) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let expected = v3::types::Watch::json_stream().to_command();
            let mut command = vec![0u8; expected.len()];
            socket.read_exact(&mut command).await.unwrap();
            for line in lines {
                socket.write_all(line.as_bytes()).await.unwrap();
            }
            socket.flush().await.unwrap();
            if hold {
                let mut rest = Vec::new();
                let _ = socket.read_to_end(&mut rest).await;
            }
            command
        });
        (addr, server)
    }

    fn collecting_sink() -> (Arc<Mutex<Vec<String>>>, impl DiagnosticSink + 'static) {
        let echoed = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let echoed = echoed.clone();
            move |line: &str| echoed.lock().unwrap().push(line.to_string())
        };
        (echoed, sink)
    }

    #[tokio::test]
    async fn test_session_tpv_end_to_end() {
        let (addr, server) = serve(
            vec![r#"{"class":"TPV","mode":3,"lat":52.5,"lon":13.4,"alt":34.2}"#.to_string() + "\n"],
            false,
        )
        .await;

        let session = GpsdSession::new(addr, 0.0, 0.0);
        let handle = session.start().await.unwrap();
        assert!(matches!(handle.join().await, GpsdError::ConnectionClosed));
        assert_eq!(
            server.await.unwrap(),
            br#"?WATCH={"enable":true,"json":true}"#.to_vec()
        );

        let state = session.snapshot();
        assert_eq!(state.position.fix, "3D");
        assert_eq!(state.position.latitude, 52.5);
        assert_eq!(state.position.longitude, 13.4);
        assert_eq!(state.position.altitude, 34.2);
    }

    #[tokio::test]
    async fn test_session_sky_end_to_end() {
        let (addr, _server) = serve(
            vec![
                r#"{"class":"SKY","hdop":1.1,"satellites":[{"PRN":5,"az":120,"el":45,"ss":38,"used":true,"gnssid":0}]}"#
                    .to_string()
                    + "\n",
            ],
            false,
        )
        .await;

        let session = GpsdSession::new(addr, 0.0, 0.0);
        let handle = session.start().await.unwrap();
        assert!(matches!(handle.join().await, GpsdError::ConnectionClosed));

        let state = session.snapshot();
        assert_eq!(state.dilution_of_precision.hdop, 1.1);
        assert_eq!(state.satellites.len(), 1);
        assert_eq!(state.satellites[0].system, "GPS");
        assert!(state.satellites[0].used);
    }

    #[tokio::test]
    async fn test_session_unclassified_without_debug() {
        let (addr, _server) = serve(vec!["{\"class\":\"FOO\"}\n".into()], false).await;
        let (echoed, sink) = collecting_sink();

        let session = GpsdSession::new(addr, 0.0, 0.0).with_sink(sink);
        let handle = session.start().await.unwrap();
        handle.join().await;

        assert!(echoed.lock().unwrap().is_empty());
        assert_eq!(session.snapshot(), State::default());
    }

    #[tokio::test]
    async fn test_session_unclassified_with_debug() {
        let (addr, _server) = serve(
            vec![
                "{\"class\":\"FOO\"}\n".into(),
                "{\"class\":\"VERSION\",\"release\":\"3.25\",\"proto_major\":3,\"proto_minor\":15}\n"
                    .into(),
            ],
            false,
        )
        .await;
        let (echoed, sink) = collecting_sink();

        let session = GpsdSession::new(addr, 0.0, 0.0).with_sink(sink);
        session.set_debug(true);
        let handle = session.start().await.unwrap();
        handle.join().await;

        assert_eq!(
            *echoed.lock().unwrap(),
            vec![
                "{\"class\":\"FOO\"}".to_string(),
                "{\"class\":\"VERSION\",\"release\":\"3.25\",\"proto_major\":3,\"proto_minor\":15}"
                    .to_string(),
            ]
        );
        assert_eq!(session.snapshot(), State::default());
    }

    #[tokio::test]
    async fn test_session_survives_malformed_lines() {
        let (addr, _server) = serve(
            vec![
                "not json at all\n".into(),
                "\n".into(),
                "{\"mode\":3,\"lat\":1.0}\n".into(),
                "{\"class\":\"TPV\",\"lat\":\"north\"}\n".into(),
                "{\"class\":\"TPV\",\"mode\":2,\"lat\":7.5}\n".into(),
            ],
            false,
        )
        .await;

        let session = GpsdSession::new(addr, 0.0, 0.0);
        session.set_debug(true);
        let handle = session.start().await.unwrap();
        assert!(matches!(handle.join().await, GpsdError::ConnectionClosed));

        let state = session.snapshot();
        assert_eq!(state.position.fix, "2D");
        assert_eq!(state.position.latitude, 7.5);
    }

    #[tokio::test]
    async fn test_session_malformed_lines_leave_state() {
        let (addr, _server) = serve(
            vec![
                "{\"class\":\"TPV\",\"mode\":3\n".into(),
                "{\"mode\":3,\"lat\":1.0}\n".into(),
                "{\"class\":3,\"mode\":3}\n".into(),
                "{\"class\":\"TPV\",\"mode\":3,\"lat\":\"north\"}\n".into(),
                "{\"class\":\"SKY\",\"hdop\":1.1,\"satellites\":{\"PRN\":5}}\n".into(),
                "{\"class\":\"PPS\",\"real_sec\":\"soon\"}\n".into(),
            ],
            false,
        )
        .await;

        let (echoed, sink) = collecting_sink();
        let session = GpsdSession::new(addr, 0.0, 0.0).with_sink(sink);
        session.set_debug(true);
        let handle = session.start().await.unwrap();
        assert!(matches!(handle.join().await, GpsdError::ConnectionClosed));

        assert_eq!(session.snapshot(), State::default());
        assert!(echoed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_abort() {
        let (addr, _server) = serve(Vec::new(), true).await;

        let session = GpsdSession::new(addr, 0.0, 0.0);
        let handle = session.start().await.unwrap();
        assert!(!handle.is_finished());
        handle.abort();
        assert!(matches!(handle.join().await, GpsdError::Aborted));
    }

    #[tokio::test]
    async fn test_start_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let session = GpsdSession::new(addr, 0.0, 0.0);
        assert!(matches!(session.start().await, Err(GpsdError::IoError(_))));
    }

    #[tokio::test]
    async fn test_run_on_in_memory_stream() {
        use tokio_util::compat::TokioAsyncReadCompatExt;

        let (client, mut daemon) = tokio::io::duplex(1024);
        let daemon = tokio::spawn(async move {
            let expected = v3::types::Watch::json_stream().to_command();
            let mut command = vec![0u8; expected.len()];
            daemon.read_exact(&mut command).await.unwrap();
            daemon
                .write_all(b"{\"class\":\"PPS\",\"real_sec\":5,\"shm\":\"NTP0\",\"qErr\":-9}\n")
                .await
                .unwrap();
            command
        });

        let session = GpsdSession::new(DEFAULT_ADDRESS, 13.4, 52.5);
        assert!(matches!(
            session.run(client.compat()).await,
            GpsdError::ConnectionClosed
        ));
        assert_eq!(
            String::from_utf8(daemon.await.unwrap()).unwrap(),
            r#"?WATCH={"enable":true,"json":true}"#
        );

        let timing = session.snapshot().timing;
        assert_eq!(timing.real_sec, 5);
        assert_eq!(timing.shm, "NTP0");
        assert_eq!(timing.q_err, -9);
        assert_eq!(session.start_position(), (13.4, 52.5));
    }
}
