//! TCP transport.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use log::{debug, info};

use super::{resolve, Transport, RECV_BUFFER_SIZE};
use crate::error::{LaserError, LaserResult};

/// Connected stream socket to the laser's network interface.
///
/// Each exchange writes the whole request and performs a single read of up to
/// [`RECV_BUFFER_SIZE`] bytes.
#[derive(Debug)]
pub struct TcpTransport {
    peer: SocketAddr,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Connect to `address`.
    ///
    /// `address` is a host name or IP address, optionally with its own
    /// `:port` suffix; otherwise `port` is used. `timeout` bounds the connect,
    /// every write and every read.
    ///
    /// # Errors
    /// Returns [`LaserError::Connection`] if the host cannot be resolved or no
    /// resolved address accepts the connection.
    pub fn connect(address: &str, port: u16, timeout: Duration) -> LaserResult<Self> {
        let mut last_err = None;

        for peer in resolve(address, port)? {
            match TcpStream::connect_timeout(&peer, timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(timeout))
                        .and_then(|()| stream.set_write_timeout(Some(timeout)))
                        .map_err(|e| LaserError::connection(peer.to_string(), e))?;
                    info!("Connected to laser at tcp://{peer}");
                    return Ok(Self {
                        peer,
                        stream: Some(stream),
                    });
                }
                Err(e) => {
                    debug!("Connection to {peer} failed: {e}");
                    last_err = Some(LaserError::connection(peer.to_string(), e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            LaserError::Config(format!("no address to connect to for '{address}'"))
        }))
    }

    /// Address of the connected peer.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or(LaserError::Closed)?;

        stream.write_all(request)?;

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let n = stream.read(&mut buffer)?;
        if n == 0 {
            return Err(LaserError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{} closed the connection", self.peer),
            )));
        }
        Ok(buffer[..n].to_vec())
    }

    fn close(&mut self) -> LaserResult<()> {
        if let Some(stream) = self.stream.take() {
            info!("Closing tcp://{}", self.peer);
            // The peer may already have gone away; the socket is released on drop either way.
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Shutdown of {} reported: {e}", self.peer);
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.peer)
    }
}
