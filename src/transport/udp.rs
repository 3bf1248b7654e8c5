//! UDP transport.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use log::{debug, info};

use super::{resolve, Transport, RECV_BUFFER_SIZE};
use crate::error::{LaserError, LaserResult};

/// Connectionless socket addressing the laser by datagram.
///
/// No peer association is kept: each exchange sends one datagram to the
/// laser and returns the payload of the next datagram received, whoever sent
/// it.
#[derive(Debug)]
pub struct UdpTransport {
    target: SocketAddr,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    /// Open a local socket for talking to `address`.
    ///
    /// `address` is a host name or IP address, optionally with its own
    /// `:port` suffix; otherwise `port` is used. `timeout` bounds each
    /// receive.
    pub fn open(address: &str, port: u16, timeout: Duration) -> LaserResult<Self> {
        let target = resolve(address, port)?[0];
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(local)
            .and_then(|s| s.set_read_timeout(Some(timeout)).map(|()| s))
            .map_err(|e| LaserError::connection(target.to_string(), e))?;

        info!("Opened udp socket for laser at {target}");
        Ok(Self {
            target,
            socket: Some(socket),
        })
    }

    /// Address datagrams are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for UdpTransport {
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(LaserError::Closed)?;

        socket.send_to(request, self.target)?;

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let (n, from) = socket.recv_from(&mut buffer)?;
        if from != self.target {
            debug!("Datagram from {from}, expected {}", self.target);
        }
        Ok(buffer[..n].to_vec())
    }

    fn close(&mut self) -> LaserResult<()> {
        if self.socket.take().is_some() {
            info!("Closed udp socket for {}", self.target);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.target)
    }
}
