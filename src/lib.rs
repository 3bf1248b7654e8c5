//! Client library for fiber lasers speaking the line-oriented ASCII command
//! protocol.
//!
//! A command is a short mnemonic token (`ABN`, `SPW`, `RCS`, ...) sent as a
//! `\r`-terminated frame. The laser either echoes a Set command back or
//! answers a Get command with `TOKEN: value\r`. Which tokens exist, and the
//! type of value each one carries, is described by a [`DeviceTable`].
//!
//! The library is layered:
//! - [`transport`]: byte round trips over RS-232, TCP or UDP
//! - [`protocol`]: frame encoding and response matching
//! - [`client`]: a transport bound to a command table
//! - [`config`]: connection settings loaded from TOML and the environment

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod value;

pub use client::LaserClient;
pub use config::{ConnectionSettings, LaserConfig, TransportKind};
pub use device::{CommandDescriptor, DeviceTable, Direction, Model};
pub use error::{LaserError, LaserResult};
pub use transport::Transport;
pub use value::{Value, ValueType};
