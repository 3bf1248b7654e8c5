//! Laser client: one transport bound to one command table.
//!
//! The client owns its transport from construction to teardown. The
//! connection is released exactly once, either by [`LaserClient::close`] or
//! when the client is dropped, whichever comes first.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use fiber_laser::{ConnectionSettings, LaserClient, Model, Value};
//!
//! fn main() -> Result<(), fiber_laser::LaserError> {
//!     let table = Arc::new(Model::RflC3000s.table());
//!     let mut laser = LaserClient::tcp(&ConnectionSettings::tcp("192.168.0.10"), table)?;
//!
//!     laser.set("SPW", 100)?;
//!     let current = laser.get("RCS")?;
//!     println!("Current setpoint: {current}");
//!
//!     laser.close()
//! }
//! ```

use std::sync::Arc;

use log::{info, warn};

use crate::config::{ConnectionSettings, TransportKind};
use crate::device::DeviceTable;
use crate::error::{LaserError, LaserResult};
use crate::protocol;
use crate::transport::{TcpTransport, Transport, UdpTransport};
use crate::value::Value;

#[cfg(feature = "instrument_serial")]
use crate::transport::SerialTransport;

/// A connected laser.
///
/// Calls take `&mut self`: the protocol is half-duplex, so one client never
/// has more than one request in flight.
pub struct LaserClient<T: Transport> {
    transport: T,
    table: Arc<DeviceTable>,
    closed: bool,
}

impl<T: Transport> LaserClient<T> {
    /// Bind an already open transport to `table`.
    pub fn with_transport(transport: T, table: Arc<DeviceTable>) -> Self {
        info!(
            "Laser client for {} on {}",
            table.name(),
            transport.describe()
        );
        Self {
            transport,
            table,
            closed: false,
        }
    }

    /// Send a command with an optional argument and return its result.
    ///
    /// Set commands return `Value::Bool(true)`; Get commands return the
    /// reading typed per the command table.
    pub fn send(&mut self, token: &str, value: Option<Value>) -> LaserResult<Value> {
        if self.closed {
            return Err(LaserError::Closed);
        }
        protocol::send(&self.table, &mut self.transport, token, value.as_ref())
    }

    /// Send a Set command with an argument.
    pub fn set(&mut self, token: &str, value: impl Into<Value>) -> LaserResult<Value> {
        self.send(token, Some(value.into()))
    }

    /// Send a command without an argument (a Get, or an argument-less Set).
    pub fn get(&mut self, token: &str) -> LaserResult<Value> {
        self.send(token, None)
    }

    /// Command table this client is bound to.
    pub fn table(&self) -> &Arc<DeviceTable> {
        &self.table
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the connection now and report how that went.
    pub fn close(mut self) -> LaserResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> LaserResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.transport.close()
    }
}

impl<T: Transport> Drop for LaserClient<T> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Error closing {}: {e}", self.transport.describe());
        }
    }
}

impl<T: Transport> std::fmt::Debug for LaserClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaserClient")
            .field("transport", &self.transport.describe())
            .field("table", &self.table.name())
            .field("closed", &self.closed)
            .finish()
    }
}

impl LaserClient<TcpTransport> {
    /// Connect over TCP using `settings.address` and `settings.port`.
    pub fn tcp(settings: &ConnectionSettings, table: Arc<DeviceTable>) -> LaserResult<Self> {
        settings.validate()?;
        let transport =
            TcpTransport::connect(&settings.address, settings.port, settings.timeout_duration()?)?;
        Ok(Self::with_transport(transport, table))
    }
}

impl LaserClient<UdpTransport> {
    /// Talk over UDP using `settings.address` and `settings.port`.
    pub fn udp(settings: &ConnectionSettings, table: Arc<DeviceTable>) -> LaserResult<Self> {
        settings.validate()?;
        let transport =
            UdpTransport::open(&settings.address, settings.port, settings.timeout_duration()?)?;
        Ok(Self::with_transport(transport, table))
    }
}

#[cfg(feature = "instrument_serial")]
impl LaserClient<SerialTransport> {
    /// Open the serial port `settings.address` at `settings.baud_rate`.
    pub fn serial(settings: &ConnectionSettings, table: Arc<DeviceTable>) -> LaserResult<Self> {
        settings.validate()?;
        let transport = SerialTransport::open(
            &settings.address,
            settings.baud_rate,
            settings.timeout_duration()?,
        )?;
        Ok(Self::with_transport(transport, table))
    }
}

impl LaserClient<Box<dyn Transport>> {
    /// Open whichever transport `settings.transport` names.
    pub fn open(settings: &ConnectionSettings, table: Arc<DeviceTable>) -> LaserResult<Self> {
        settings.validate()?;
        let timeout = settings.timeout_duration()?;

        let transport: Box<dyn Transport> = match settings.transport {
            TransportKind::Tcp => Box::new(TcpTransport::connect(
                &settings.address,
                settings.port,
                timeout,
            )?),
            TransportKind::Udp => Box::new(UdpTransport::open(
                &settings.address,
                settings.port,
                timeout,
            )?),
            #[cfg(feature = "instrument_serial")]
            TransportKind::Serial => Box::new(SerialTransport::open(
                &settings.address,
                settings.baud_rate,
                timeout,
            )?),
            #[cfg(not(feature = "instrument_serial"))]
            TransportKind::Serial => {
                return Err(LaserError::Config(
                    "Serial support not enabled. Rebuild with --features instrument_serial"
                        .to_string(),
                ))
            }
        };
        Ok(Self::with_transport(transport, table))
    }
}
