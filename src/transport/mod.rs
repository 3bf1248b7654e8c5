//! Byte-level transports.
//!
//! A [`Transport`] performs one blocking write-then-read round trip per call.
//! The protocol engine never touches the medium directly, so the same command
//! encoding runs over RS-232, TCP or UDP.
//!
//! - [`serial::SerialTransport`]: RS-232 via the `serialport` crate
//!   (feature `instrument_serial`).
//! - [`tcp::TcpTransport`]: connected stream socket.
//! - [`udp::UdpTransport`]: connectionless datagrams.
//! - [`mock::MockTransport`]: scripted replies for tests and dry runs.
//!
//! Transports never retry. A read that exceeds the configured timeout returns
//! [`LaserError::Timeout`](crate::error::LaserError::Timeout).

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial;
pub mod tcp;
pub mod udp;

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::error::{LaserError, LaserResult};

pub use mock::MockTransport;
#[cfg(feature = "instrument_serial")]
pub use serial::SerialTransport;
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

/// Size of the single read performed by the network transports.
///
/// Responses longer than this are truncated; they are not reassembled across
/// reads.
pub const RECV_BUFFER_SIZE: usize = 64;

/// One blocking request/response round trip over some medium.
pub trait Transport: Send {
    /// Write `request` in full, then read one response.
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>>;

    /// Release the underlying connection. Calling it again is a no-op.
    fn close(&mut self) -> LaserResult<()> {
        Ok(())
    }

    /// Short description of the endpoint for log messages.
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>> {
        (**self).exchange(request)
    }

    fn close(&mut self) -> LaserResult<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Resolve a network endpoint.
///
/// An address written as `host:port` keeps its own port; a bare host name or
/// IP address is combined with `default_port`.
pub(crate) fn resolve(address: &str, default_port: u16) -> LaserResult<Vec<SocketAddr>> {
    let address = address.trim();
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, default_port)]);
    }

    let lookup = if address.contains(':') {
        address.to_socket_addrs()
    } else {
        (address, default_port).to_socket_addrs()
    };
    let addrs: Vec<SocketAddr> = lookup
        .map_err(|e| LaserError::connection(address, e))?
        .collect();

    if addrs.is_empty() {
        return Err(LaserError::connection(
            address,
            io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing"),
        ));
    }
    Ok(addrs)
}
