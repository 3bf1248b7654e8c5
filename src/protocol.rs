//! Laser command protocol engine.
//!
//! The protocol is half-duplex ASCII. Every frame, in both directions, ends
//! with a single carriage return and carries no length prefix or checksum.
//!
//! | Command            | Request             | Expected response       |
//! |--------------------|---------------------|-------------------------|
//! | Set, no argument   | `<TOKEN>\r`         | `<TOKEN>\r`             |
//! | Set, with argument | `<TOKEN> <value>\r` | `<TOKEN>: <value>\r`    |
//! | Get                | `<TOKEN>\r`         | `<TOKEN>: <reading>\r`  |
//!
//! A Set succeeds when its echo appears anywhere in the response. A Get
//! captures the run of non-whitespace after `<TOKEN>: ` and parses it as the
//! command's declared [`ValueType`].
//!
//! Encoding and decoding are independent of the medium: [`send`] works over
//! any [`Transport`].

use log::{debug, warn};
use regex::Regex;

use crate::device::{normalize_token, CommandDescriptor, DeviceTable, Direction};
use crate::error::{LaserError, LaserResult};
use crate::transport::Transport;
use crate::value::{Value, ValueType};

/// Frame terminator, both directions.
pub const TERMINATOR: u8 = b'\r';

/// What a response must contain for a request to succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// Set: this exact text must appear in the response.
    Echo(String),
    /// Get: `<token>: <reading>\r` must appear; the reading is parsed as `value_type`.
    Reading {
        /// Command token the reading is labelled with.
        token: String,
        /// Declared result type.
        value_type: ValueType,
    },
}

/// An encoded request and the response shape that acknowledges it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// ASCII request frame including the terminator.
    pub frame: String,
    /// Acceptance rule for the response.
    pub expect: Expect,
}

impl Request {
    /// Encode a command for `descriptor` with an optional argument.
    ///
    /// Arguments to Get commands and to Set commands without a value type are
    /// not sent.
    pub fn encode(descriptor: &CommandDescriptor, value: Option<&Value>) -> LaserResult<Self> {
        let token = descriptor.token.as_str();

        match descriptor.direction {
            Direction::Set => {
                let rendered = match (descriptor.value_type, value) {
                    (ValueType::None, Some(v)) => {
                        warn!("{token} takes no argument; ignoring {v}");
                        None
                    }
                    (ValueType::None, None) => None,
                    (_, None) => return Err(LaserError::MissingValue(token.to_string())),
                    (value_type, Some(v)) => value_type.encode(v)?,
                };

                Ok(match rendered {
                    Some(arg) => Request {
                        frame: format!("{token} {arg}\r"),
                        expect: Expect::Echo(format!("{token}: {arg}\r")),
                    },
                    None => Request {
                        frame: format!("{token}\r"),
                        expect: Expect::Echo(format!("{token}\r")),
                    },
                })
            }
            Direction::Get => {
                if let Some(v) = value {
                    debug!("{token} is a read command; ignoring argument {v}");
                }
                Ok(Request {
                    frame: format!("{token}\r"),
                    expect: Expect::Reading {
                        token: token.to_string(),
                        value_type: descriptor.value_type,
                    },
                })
            }
        }
    }

    /// Validate a raw response against this request and decode the result.
    pub fn decode(&self, response: &str) -> LaserResult<Value> {
        match &self.expect {
            Expect::Echo(echo) => {
                if response.contains(echo.as_str()) {
                    Ok(Value::Bool(true))
                } else {
                    Err(LaserError::Protocol(response.to_string()))
                }
            }
            Expect::Reading { token, value_type } => {
                let reading = capture_reading(token, response)
                    .ok_or_else(|| LaserError::Protocol(response.to_string()))?;
                value_type.decode(reading)
            }
        }
    }
}

/// Find `<token>: <reading>\r` anywhere in `response` and return the reading.
fn capture_reading<'a>(token: &str, response: &'a str) -> Option<&'a str> {
    let pattern = format!(r"{}: (\S+)\r", regex::escape(token));
    // The token is escaped, so the pattern is always valid.
    let re = Regex::new(&pattern).ok()?;
    re.captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Send one command and return its typed result.
///
/// The token is matched case-insensitively against `table`. Set commands
/// return `Value::Bool(true)` once the device echoes them; Get commands return
/// the reading parsed as the declared type. Every call performs a fresh
/// exchange.
pub fn send<T>(
    table: &DeviceTable,
    transport: &mut T,
    token: &str,
    value: Option<&Value>,
) -> LaserResult<Value>
where
    T: Transport + ?Sized,
{
    let token = normalize_token(token);
    let descriptor = table
        .lookup(&token)
        .ok_or_else(|| LaserError::UnknownCommand(token.clone()))?;

    let request = Request::encode(descriptor, value)?;
    let response = exchange(transport, &request.frame)?;
    request.decode(&response)
}

fn exchange<T>(transport: &mut T, frame: &str) -> LaserResult<String>
where
    T: Transport + ?Sized,
{
    debug!("Send frame: {frame:?}");
    let raw = transport.exchange(frame.as_bytes())?;
    let response = String::from_utf8_lossy(&raw).into_owned();
    debug!("Recv frame: {response:?}");
    Ok(response)
}
