//! Built-in command tables for supported laser models.
//!
//! Each call to [`Model::table`] builds a fresh [`DeviceTable`]; wrap it in an
//! `Arc` to share it between clients.

use std::fmt;
use std::str::FromStr;

use super::{DeviceTable, Direction};
use crate::error::{LaserError, LaserResult};
use crate::value::ValueType;

use Direction::{Get, Set};
use ValueType::{Float, Integer, None as Bare, String as Text};

type Entry = (&'static str, Direction, ValueType);

/// Laser models with a built-in command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    /// Raycus RFL-C3000S.
    RflC3000s,
    /// Raycus RFL-C3000XZ, RFL-C4000XZ and the rest of the XZ series.
    RflXzSeries,
    /// Raycus RFL-1500/1500-ABP, RFL-2000/2000-ABP and the rest of the ABP series.
    RflAbpSeries,
    /// Raycus RFL-QCW150/1500.
    RflQcw150_1500,
    /// IPG YLR series.
    YlrSeries,
}

impl Model {
    /// Every built-in model.
    pub const ALL: [Model; 5] = [
        Model::RflC3000s,
        Model::RflXzSeries,
        Model::RflAbpSeries,
        Model::RflQcw150_1500,
        Model::YlrSeries,
    ];

    /// Identifier used in configuration files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Model::RflC3000s => "rfl-c3000s",
            Model::RflXzSeries => "rfl-xz",
            Model::RflAbpSeries => "rfl-abp",
            Model::RflQcw150_1500 => "rfl-qcw150-1500",
            Model::YlrSeries => "ylr",
        }
    }

    /// Human readable model name, used as the table name.
    pub fn display_name(self) -> &'static str {
        match self {
            Model::RflC3000s => "Raycus RFL-C3000S",
            Model::RflXzSeries => "Raycus RFL-XZ series",
            Model::RflAbpSeries => "Raycus RFL-ABP series",
            Model::RflQcw150_1500 => "Raycus RFL-QCW150/1500",
            Model::YlrSeries => "IPG YLR series",
        }
    }

    /// Build this model's command table.
    pub fn table(self) -> DeviceTable {
        let entries = match self {
            Model::RflC3000s => RFL_C3000S,
            Model::RflXzSeries => RFL_XZ_SERIES,
            Model::RflAbpSeries => RFL_ABP_SERIES,
            Model::RflQcw150_1500 => RFL_QCW150_1500,
            Model::YlrSeries => YLR_SERIES,
        };
        DeviceTable::from_static(self.display_name(), entries)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = LaserError;

    fn from_str(s: &str) -> LaserResult<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Model::ALL
            .into_iter()
            .find(|m| m.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Model::ALL.iter().map(|m| m.id()).collect();
                LaserError::Config(format!(
                    "unknown laser model '{s}'. Must be one of: {}",
                    known.join(", ")
                ))
            })
    }
}

impl DeviceTable {
    fn from_static(name: &str, entries: &[Entry]) -> Self {
        let commands = entries
            .iter()
            .map(|&(token, direction, value_type)| {
                let descriptor = super::CommandDescriptor {
                    token: token.to_string(),
                    direction,
                    value_type,
                };
                (token.to_string(), descriptor)
            })
            .collect();
        Self {
            name: name.to_string(),
            commands,
        }
    }
}

/// Raycus RFL-C3000S
const RFL_C3000S: &[Entry] = &[
    ("ABF", Set, Bare),       // Aiming Beam OFF
    ("ABN", Set, Bare),       // Aiming Beam ON
    ("DEABC", Set, Bare),     // Disable External Aiming Beam Control
    ("EEABC", Set, Bare),     // Enable External Aiming Beam Control
    ("DEC", Set, Bare),       // Disable External Control
    ("EEC", Set, Bare),       // Enable External Control
    ("DLE", Set, Bare),       // Disable Hardware Emission Control
    ("ELE", Set, Bare),       // Enable Hardware Emission Control
    ("DGM", Set, Bare),       // Disable Gate Mode
    ("EGM", Set, Bare),       // Enable Gate Mode
    ("EMOFF", Set, Bare),     // Stop Emission
    ("EMON", Set, Bare),      // Start Emission
    ("MPWROFF", Set, Bare),   // Main Power OFF
    ("MPWRON", Set, Bare),    // Main Power ON
    ("PERR", Set, Bare),      // Reset Errors
    ("PSTP", Set, Bare),      // Program Stop
    ("PSRT", Set, Integer),   // Program Start
    ("SPW", Set, Integer),    // Set Pulse Width
    ("RPW", Get, Float),      // Read Pulse Width
    ("SPRR", Set, Integer),   // Set Pulse Repetition Rate
    ("RPRR", Get, Integer),   // Read Pulse Repetition Rate
    ("SDC", Set, Integer),    // Set Diode Current
    ("RCS", Get, Float),      // Read Current Setpoint
    ("SIP", Set, Text),       // Set IP
    ("RIP", Get, Text),       // Read IP
    ("SMASK", Set, Text),     // Set Sub-net Mask
    ("RMASK", Get, Text),     // Read Sub-net Mask
    ("SUT", Set, Integer),    // Set Up Time
    ("RUT", Get, Integer),    // Read Up Time
    ("SDT", Set, Integer),    // Set Down Time
    ("RDT", Get, Integer),    // Read Down Time
    ("RBT", Get, Float),      // Read Board Temperature
    ("RCT", Get, Float),      // Read Laser Temperature
    ("ROP", Get, Float),      // Read Output Power
    ("RSN", Get, Integer),    // Read Serial Number
    ("STA", Get, Integer),    // Read device status
];

/// Raycus RFL-C3000XZ, RFL-C4000XZ, ...
const RFL_XZ_SERIES: &[Entry] = &[
    ("ABF", Set, Bare),
    ("ABN", Set, Bare),
    ("DEABC", Set, Bare),
    ("EEABC", Set, Bare),
    ("DEC", Set, Bare),
    ("EEC", Set, Bare),
    ("DLE", Set, Bare),
    ("ELE", Set, Bare),
    ("EMOFF", Set, Bare),
    ("EMON", Set, Bare),
    ("MPWROFF", Set, Bare),
    ("MPWRON", Set, Bare),
    ("PERR", Set, Bare),
    ("ECM", Set, Bare),       // Enable Calibration Mode
    ("DCM", Set, Bare),       // Disable Calibration Mode
    ("PSTP", Set, Bare),
    ("PSRT", Set, Integer),
    ("SPW", Set, Integer),
    ("RPW", Get, Float),
    ("SPRR", Set, Integer),
    ("RPRR", Get, Integer),
    ("SDC", Set, Integer),
    ("RCS", Get, Float),
    ("SUT", Set, Integer),
    ("RUT", Get, Integer),
    ("SDT", Set, Integer),
    ("RDT", Get, Integer),
    ("RBT", Get, Float),
    ("RCT", Get, Float),
    ("STA", Get, Integer),
];

/// Raycus RFL-1500/1500-ABP, RFL-2000/2000-ABP, ...
const RFL_ABP_SERIES: &[Entry] = &[
    ("ABF", Set, Bare),
    ("ABN", Set, Bare),
    ("DEABC", Set, Bare),
    ("EEABC", Set, Bare),
    ("DEC", Set, Bare),
    ("EEC", Set, Bare),
    ("DLE", Set, Bare),
    ("ELE", Set, Bare),
    ("EMOFF", Set, Bare),
    ("EMON", Set, Bare),
    ("MPWROFF", Set, Bare),
    ("MPWRON", Set, Bare),
    ("PERR", Set, Bare),
    ("ECM", Set, Bare),
    ("DCM", Set, Bare),
    ("PSTP", Set, Bare),
    ("PSRT", Set, Integer),
    ("SPW", Set, Integer),
    ("SPRR", Set, Integer),
    ("RCS", Get, Float),
    ("RPRR", Get, Integer),
    ("SDC", Set, Integer),
    ("RBT", Get, Float),
    ("RPW", Get, Float),
    ("RCT", Get, Float),
    ("SUT", Set, Integer),
    ("RUT", Get, Integer),
    ("SDT", Set, Integer),
    ("RDT", Get, Integer),
    ("STA", Get, Integer),
];

/// Raycus RFL-QCW150/1500
const RFL_QCW150_1500: &[Entry] = &[
    ("ABF", Set, Bare),
    ("ABN", Set, Bare),
    ("DEABC", Set, Bare),
    ("DEC", Set, Bare),
    ("DGM", Set, Bare),
    ("DLE", Set, Bare),
    ("DMOD", Set, Bare),      // Disable Modulation
    ("DPM", Set, Bare),       // Disable PULSE Mode
    ("EEABC", Set, Bare),
    ("EEC", Set, Bare),
    ("EGM", Set, Bare),
    ("ELE", Set, Bare),
    ("EMOD", Set, Bare),      // Enable Modulation
    ("EMOFF", Set, Bare),
    ("EMON", Set, Bare),
    ("EPM", Set, Bare),       // Enable PULSE Mode
    ("RERR", Set, Bare),      // Reset Errors
    ("RBT", Get, Float),
    ("RCS", Get, Float),
    ("RCT", Get, Float),
    ("RDGW", Get, Text),      // Read Default Gateway
    ("RIP", Get, Text),
    ("RMASK", Get, Text),
    ("RPRR", Get, Integer),
    ("RPW", Get, Float),
    ("SDC", Set, Float),
    ("SDGW", Set, Text),      // Set Default Gateway
    ("SIP", Set, Text),
    ("SMASK", Set, Text),
    ("SPRR", Set, Integer),
    ("SPW", Set, Float),
    ("STA", Get, Integer),
    ("STR", Get, Integer),    // Read Raycus error register
];

/// IPG YLR series
const YLR_SERIES: &[Entry] = &[
    ("ABF", Set, Bare),
    ("ABN", Set, Bare),
    ("DEABC", Set, Bare),
    ("EEABC", Set, Bare),
    ("DEC", Set, Bare),
    ("EEC", Set, Bare),
    ("DGM", Set, Bare),
    ("EGM", Set, Bare),
    ("DLE", Set, Bare),
    ("ELE", Set, Bare),
    ("DMOD", Set, Bare),
    ("EMOD", Set, Bare),
    ("DPM", Set, Bare),
    ("EPM", Set, Bare),
    ("EMOFF", Set, Bare),
    ("EMON", Set, Bare),
    ("LFP", Set, Bare),       // Lock Front Panel
    ("UFP", Set, Bare),       // Unlock Front Panel
    ("RERR", Set, Bare),
    ("RCS", Get, Float),
    ("SDC", Set, Float),
    ("SPRR", Set, Integer),
    ("RPRR", Get, Integer),
    ("SPW", Set, Float),
    ("RPW", Get, Float),
    ("RCT", Get, Float),
    ("RET", Get, Integer),    // Read Elapsed Time
    ("RFV", Get, Text),       // Read firmware revision
    ("RMEC", Get, Integer),   // Read Module Error Code
    ("RNC", Get, Float),      // Read Minimum Current Setpoint
    ("ROP", Get, Integer),
    ("RPP", Get, Integer),    // Read Peak Power
    ("RSN", Get, Integer),
    ("STA", Get, Integer),
];
