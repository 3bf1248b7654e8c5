//! Device command tables.
//!
//! A [`DeviceTable`] maps each command token a laser model understands to its
//! [`CommandDescriptor`]: whether the command writes (Set) or reads (Get) and
//! which [`ValueType`] its argument or result has. Tables are built once and
//! never mutated; clients share them through an `Arc`.
//!
//! Tables come from three places:
//!
//! - the built-in models in [`models`],
//! - TOML files loaded with [`DeviceTable::from_toml_file`],
//! - code, through [`DeviceTable::from_entries`].
//!
//! ## TOML format
//!
//! ```toml
//! name = "RFL-C3000S"
//!
//! [commands]
//! ABF = { direction = "set" }
//! SPW = { direction = "set", type = "integer" }
//! RCS = { direction = "get", type = "float" }
//! ```

pub mod models;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LaserError, LaserResult};
use crate::value::ValueType;

pub use models::Model;

/// Whether a command writes a value to the device or reads one back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Write; the device echoes the command to confirm.
    Set,
    /// Read; the device answers with `<TOKEN>: <value>`.
    Get,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Set => f.write_str("set"),
            Direction::Get => f.write_str("get"),
        }
    }
}

/// Direction and value type of one command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Uppercase ASCII command token, e.g. `SPW`.
    pub token: String,
    /// Set or Get.
    pub direction: Direction,
    /// Argument type for Set, result type for Get.
    pub value_type: ValueType,
}

/// Immutable token → descriptor mapping for one laser model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTable {
    name: String,
    commands: BTreeMap<String, CommandDescriptor>,
}

#[derive(Deserialize)]
struct TableFile {
    name: String,
    commands: BTreeMap<String, EntryFile>,
}

#[derive(Deserialize)]
struct EntryFile {
    direction: Direction,
    #[serde(default, rename = "type")]
    value_type: ValueType,
}

impl DeviceTable {
    /// Build a table from `(token, direction, value_type)` entries.
    ///
    /// Tokens are uppercased. Empty tokens, tokens containing whitespace or
    /// non-ASCII characters, and duplicates (after uppercasing) are rejected.
    pub fn from_entries<I, S>(name: impl Into<String>, entries: I) -> LaserResult<Self>
    where
        I: IntoIterator<Item = (S, Direction, ValueType)>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mut commands = BTreeMap::new();

        for (token, direction, value_type) in entries {
            let token = normalize_token(token.as_ref());
            if token.is_empty()
                || !token.is_ascii()
                || token.chars().any(|c| c.is_whitespace() || c == ':')
            {
                return Err(LaserError::Config(format!(
                    "invalid command token {token:?} in table '{name}'"
                )));
            }

            let descriptor = CommandDescriptor {
                token: token.clone(),
                direction,
                value_type,
            };
            if commands.insert(token.clone(), descriptor).is_some() {
                return Err(LaserError::Config(format!(
                    "duplicate command {token} in table '{name}'"
                )));
            }
        }

        Ok(Self { name, commands })
    }

    /// Parse a table from TOML text.
    pub fn from_toml_str(text: &str) -> LaserResult<Self> {
        let file: TableFile = toml::from_str(text)
            .map_err(|e| LaserError::Config(format!("invalid device table: {e}")))?;

        let entries = file
            .commands
            .into_iter()
            .map(|(token, entry)| (token, entry.direction, entry.value_type));
        Self::from_entries(file.name, entries)
    }

    /// Read and parse a TOML table file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> LaserResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LaserError::Config(format!("cannot read device table {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Model name this table describes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a command; the token is matched case-insensitively.
    pub fn lookup(&self, token: &str) -> Option<&CommandDescriptor> {
        self.commands.get(&normalize_token(token))
    }

    /// True if the table knows `token` (case-insensitive).
    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if the table has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Descriptors in token order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values()
    }
}

pub(crate) fn normalize_token(token: &str) -> String {
    token.trim().to_ascii_uppercase()
}
