//! Serial port handling
//!
//! Provides low-level serial port access for VE.Direct devices.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;

use super::{ReadError, VED_BAUD_RATE};

/// FTDI vendor ID used by the official VE.Direct to USB cable
pub const VE_CABLE_USB_VID: u16 = 0x0403;

/// FTDI FT-X product ID used by the official VE.Direct to USB cable
pub const VE_CABLE_USB_PID: u16 = 0x6015;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,

    /// Serial number (if available)
    pub serial_number: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }

    /// Whether this looks like a Victron VE.Direct USB cable
    pub fn is_ve_direct_cable(&self) -> bool {
        let ids_match = self.vid == Some(VE_CABLE_USB_VID) && self.pid == Some(VE_CABLE_USB_PID);
        let product_match = self
            .product
            .as_deref()
            .map(|p| p.contains("VE Direct") || p.contains("VE.Direct"))
            .unwrap_or(false);
        ids_match || product_match
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, manufacturer, product, serial_number) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => (
                Some(usb_info.vid),
                Some(usb_info.pid),
                usb_info.manufacturer,
                usb_info.product,
                usb_info.serial_number,
            ),
            _ => (None, None, None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            manufacturer,
            product,
            serial_number,
        }
    }
}

/// Sort key putting ttyUSB* (FTDI cables) first, then ttyACM*, then the rest,
/// numerically by suffix within each group
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

fn sort_ports(ports: &mut [PortInfo]) {
    // VE.Direct cables ahead of everything else, then by name
    ports.sort_by_key(|p| (!p.is_ve_direct_cable(), port_sort_key(&p.name)));
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // USB serial adapters sometimes miss udev metadata
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyUSB") || fname.starts_with("ttyACM") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    sort_ports(&mut v);
    v
}

/// Open a serial port at the VE.Direct baud rate unless overridden
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, ReadError> {
    let baud = baud_rate.unwrap_or(VED_BAUD_RATE);

    // Reads are polled via bytes_to_read(), so a short timeout is enough
    serialport::new(name, baud)
        .timeout(Duration::from_millis(100))
        .open()
        .map_err(|e| ReadError::SerialError(e.to_string()))
}

/// Configure a serial port for VE.Direct (8N1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ReadError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ReadError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ReadError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ReadError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ReadError::SerialError(e.to_string()))?;

    tracing::debug!(port = ?port.name(), "configured 8N1, no flow control");
    Ok(())
}

/// Discard anything queued in the port's input and output buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ReadError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ReadError::SerialError(e.to_string()))
}
