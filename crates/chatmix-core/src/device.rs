//! USB device identification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Bus/device pair identifying an attached USB device.
///
/// Only valid while the device stays connected; the kernel hands out a new
/// device number on every re-plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    /// USB bus number
    pub bus: u8,
    /// Device number on the bus
    pub device: u8,
}

impl DeviceAddress {
    #[must_use]
    pub fn new(bus: u8, device: u8) -> Self {
        Self { bus, device }
    }
}

impl fmt::Display for DeviceAddress {
    /// Formats as `BUS:DEV`, the selector syntax `usbhid-dump -s` expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bus, self.device)
    }
}

/// USB vendor/product id pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
}

impl UsbId {
    #[must_use]
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self { vendor_id, product_id }
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

impl FromStr for UsbId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidUsbId(s.to_string());

        let (vid, pid) = s.trim().split_once(':').ok_or_else(invalid)?;
        if vid.len() != 4 || pid.len() != 4 {
            return Err(invalid());
        }

        let vendor_id = u16::from_str_radix(vid, 16).map_err(|_| invalid())?;
        let product_id = u16::from_str_radix(pid, 16).map_err(|_| invalid())?;
        Ok(Self { vendor_id, product_id })
    }
}

impl TryFrom<String> for UsbId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UsbId> for String {
    fn from(id: UsbId) -> Self {
        id.to_string()
    }
}
