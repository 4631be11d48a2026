use crate::{Result, error::GpsdError};

pub mod v3;

/// Reads newline-delimited lines off a blocking reader.
pub trait GpsdJsonDecode: std::io::BufRead {
    /// Reads the next line, delimiter included, into `buf`.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream (zero bytes
    /// read with no delimiter found).
    fn read_raw_line<'a>(&mut self, buf: &'a mut Vec<u8>) -> Result<Option<&'a [u8]>> {
        buf.clear();
        let bytes_read = self
            .read_until(b'\n', buf)
            .map_err(GpsdError::IoError)?;
        if bytes_read == 0 {
            return Ok(None); // EOF reached
        }

        Ok(Some(buf.as_slice()))
    }
}

impl<R: std::io::BufRead + ?Sized> GpsdJsonDecode for R {}

pub trait GpsdJsonRequest {
    fn to_command(&self) -> String;
}

pub trait GpsdJsonEncode: std::io::Write {
    /// Writes a request and flushes it so GPSD sees it immediately.
    fn write_request(&mut self, request: &impl GpsdJsonRequest) -> Result<()> {
        let cmd = request.to_command();
        self.write_all(cmd.as_bytes())
            .map_err(GpsdError::IoError)?;
        self.flush().map_err(GpsdError::IoError)
    }
}

impl<W: std::io::Write + ?Sized> GpsdJsonEncode for W {}
