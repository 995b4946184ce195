//! Field identifiers and the wire label table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A telemetry quantity that can be requested from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    /// Diagnostic mode: every observed line goes to the diagnostics sink
    Dump = 0,
    /// State of charge, in permille
    StateOfCharge,
    /// Main battery voltage, in mV
    BatteryVoltage,
    /// Instantaneous battery power, in W
    BatteryPower,
    /// Panel power, in W
    PvPower,
    /// Main battery current, in mA
    BatteryCurrent,
    /// Alarm condition active (ON/OFF)
    Alarm,
}

/// Wire labels indexed by `FieldId` discriminant.
///
/// `"Dump"` is never emitted by a device, so the dump entry cannot match.
pub const LABEL_TABLE: [&str; FieldId::COUNT] = ["Dump", "SOC", "V", "P", "PPV", "I", "Alarm"];

impl FieldId {
    /// Number of field identifiers, including the dump sentinel
    pub const COUNT: usize = 7;

    /// All field identifiers in table order
    pub const ALL: [FieldId; FieldId::COUNT] = [
        FieldId::Dump,
        FieldId::StateOfCharge,
        FieldId::BatteryVoltage,
        FieldId::BatteryPower,
        FieldId::PvPower,
        FieldId::BatteryCurrent,
        FieldId::Alarm,
    ];

    /// Wire label for this field
    pub const fn label(self) -> &'static str {
        LABEL_TABLE[self as usize]
    }

    /// Whether this is the dump sentinel
    pub const fn is_dump(self) -> bool {
        matches!(self, FieldId::Dump)
    }

    /// Look up the field carrying `label`. The dump sentinel is never returned.
    pub fn from_label(label: &str) -> Option<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|f| !f.is_dump())
            .find(|f| f.label() == label)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldId {
    type Err = String;

    /// Accepts a wire label (`"V"`) or `"Dump"`, case-sensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == FieldId::Dump.label() {
            return Ok(FieldId::Dump);
        }
        FieldId::from_label(s).ok_or_else(|| format!("unknown VE.Direct label '{}'", s))
    }
}
