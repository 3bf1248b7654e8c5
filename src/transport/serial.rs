//! RS-232 transport.
//!
//! Wraps the `serialport` crate. Before every request the input and output
//! buffers are cleared so stale bytes from an earlier, interrupted exchange
//! cannot be mistaken for the new response.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, info};
use serialport::{ClearBuffer, SerialPort};

use super::Transport;
use crate::error::{LaserError, LaserResult};
use crate::protocol::TERMINATOR;

/// Serial port connection to the laser.
pub struct SerialTransport {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    port_name: String,

    /// Overall time allowed for one response
    timeout: Duration,

    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`.
    ///
    /// # Arguments
    /// * `port_name` - Serial port path (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Communication speed (e.g., 9600, 115200)
    /// * `timeout` - Time allowed for a complete response
    ///
    /// # Errors
    /// Returns [`LaserError::Connection`] if the port cannot be opened.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> LaserResult<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| LaserError::connection(port_name, io::Error::from(e)))?;

        info!("Serial port '{port_name}' opened at {baud_rate} baud");
        Ok(Self {
            port_name: port_name.to_string(),
            timeout,
            port: Some(port),
        })
    }

    /// Name of the open port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .field("timeout", &self.timeout)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl Transport for SerialTransport {
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>> {
        let port = self.port.as_mut().ok_or(LaserError::Closed)?;

        port.clear(ClearBuffer::All).map_err(io::Error::from)?;
        port.write_all(request)?;
        port.flush()?;

        read_until_terminator(port, self.timeout)
    }

    fn close(&mut self) -> LaserResult<()> {
        if self.port.take().is_some() {
            debug!("Serial port '{}' closed", self.port_name);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("serial://{}", self.port_name)
    }
}

/// Read single bytes until the frame terminator arrives or `timeout` elapses.
///
/// The terminator is included in the returned bytes.
fn read_until_terminator<R: Read + ?Sized>(reader: &mut R, timeout: Duration) -> LaserResult<Vec<u8>> {
    let start = Instant::now();
    let mut response = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if start.elapsed() > timeout {
            debug!("Serial read timed out with partial response {response:?}");
            return Err(LaserError::Timeout);
        }

        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(LaserError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "serial port returned EOF",
                )));
            }
            Ok(_) => {
                response.push(byte[0]);
                if byte[0] == TERMINATOR {
                    return Ok(response);
                }
            }
            // The port's own timeout may be shorter than the remaining budget.
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(LaserError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Reader that yields scripted chunks, then reports timeouts.
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ChunkedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.front_mut() {
                Some(chunk) => {
                    let n = buf.len().min(chunk.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    chunk.drain(..n);
                    if chunk.is_empty() {
                        self.chunks.pop_front();
                    }
                    Ok(n)
                }
                None => {
                    std::thread::sleep(Duration::from_millis(5));
                    Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
                }
            }
        }
    }

    #[test]
    fn test_reads_up_to_terminator() {
        let mut reader = ChunkedReader::new(&[b"RCS: 1", b"2.34\rtrailing"]);
        let response = read_until_terminator(&mut reader, Duration::from_secs(1)).unwrap();
        assert_eq!(response, b"RCS: 12.34\r");
    }

    #[test]
    fn test_times_out_without_terminator() {
        let mut reader = ChunkedReader::new(&[b"RCS: 12"]);
        let err = read_until_terminator(&mut reader, Duration::from_millis(50)).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_eof_is_io_error() {
        let mut reader: &[u8] = b"ABF";
        let err = read_until_terminator(&mut reader, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, LaserError::Io(_)));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let err = SerialTransport::open("/dev/does-not-exist-laser", 9600, Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, LaserError::Connection { .. }));
    }
}
