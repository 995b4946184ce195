//! # vedirect Core Library
//!
//! Reads single fields from the VE.Direct text protocol spoken by Victron
//! battery monitors and solar charge controllers.
//!
//! This library provides:
//! - A bounded line scanner extracting one labelled field per call
//! - ON/OFF and integer value decoding
//! - Serial port discovery and setup for VE.Direct cables
//! - A simulated device for running without hardware
//!
//! ## Example
//!
//! ```rust,ignore
//! use vedirect_core::prelude::*;
//!
//! let mut reader = ProtocolReader::connect("/dev/ttyUSB0", ReaderConfig::default())?;
//!
//! let millivolts = reader.read_field(FieldId::BatteryVoltage)?;
//! let pv_watts = reader.read_field(FieldId::PvPower)?;
//! println!("Battery {} mV, solar {} W", millivolts, pv_watts);
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod demo;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ReaderConfig;
    pub use crate::demo::DemoDevice;
    pub use crate::protocol::{
        DiagnosticsSink, FieldId, MemoryChannel, ProtocolReader, ReadError, SerialChannel,
        Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
