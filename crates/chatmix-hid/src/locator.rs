//! Headset discovery from the USB device listing.

use std::process::Command;
use std::sync::OnceLock;

use chatmix_core::{DeviceAddress, UsbId};
use regex::Regex;
use tracing::{debug, info};

use crate::error::{HidError, HidResult};

/// One attached USB device as reported by an enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceRecord {
    /// Bus/device address
    pub address: DeviceAddress,
    /// Vendor/product id
    pub usb_id: UsbId,
    /// Human-readable description (vendor and product names)
    pub description: String,
}

/// Source of the attached-device list.
///
/// Listing may block; async callers run it on the blocking pool.
pub trait UsbEnumerator: Send + Sync {
    /// List currently attached USB devices.
    ///
    /// # Errors
    /// Returns an error if the listing cannot be produced.
    fn devices(&self) -> HidResult<Vec<UsbDeviceRecord>>;
}

/// Enumerates devices by running `lsusb` and parsing its lines.
#[derive(Debug, Clone)]
pub struct LsusbEnumerator {
    program: String,
}

impl Default for LsusbEnumerator {
    fn default() -> Self {
        Self { program: "lsusb".to_string() }
    }
}

impl LsusbEnumerator {
    /// Use a different `lsusb` binary.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl UsbEnumerator for LsusbEnumerator {
    fn devices(&self) -> HidResult<Vec<UsbDeviceRecord>> {
        let output = Command::new(&self.program)
            .output()
            .map_err(|e| HidError::EnumerationFailed(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HidError::EnumerationFailed(format!(
                "{} failed ({}): {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_lsusb(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn lsusb_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"Bus\s+(\d{3})\s+Device\s+(\d{3}):\s+ID\s+([0-9A-Fa-f]{4}):([0-9A-Fa-f]{4})\s*(.*)$",
        )
        .expect("lsusb line pattern is valid")
    })
}

/// Parse one `lsusb` line like
/// `Bus 001 Device 005: ID 1038:2202 SteelSeries ApS Arctis Nova 7`.
#[must_use]
pub fn parse_lsusb_line(line: &str) -> Option<UsbDeviceRecord> {
    let caps = lsusb_line_regex().captures(line)?;

    let bus = caps[1].parse().ok()?;
    let device = caps[2].parse().ok()?;
    let vendor_id = u16::from_str_radix(&caps[3], 16).ok()?;
    let product_id = u16::from_str_radix(&caps[4], 16).ok()?;

    Some(UsbDeviceRecord {
        address: DeviceAddress::new(bus, device),
        usb_id: UsbId::new(vendor_id, product_id),
        description: caps[5].trim().to_string(),
    })
}

/// Parse full `lsusb` output, skipping lines that are not device entries.
#[must_use]
pub fn parse_lsusb(output: &str) -> Vec<UsbDeviceRecord> {
    output.lines().filter_map(parse_lsusb_line).collect()
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedDevice {
    pub address: DeviceAddress,
    pub usb_id: UsbId,
}

/// Finds the configured headset among the attached devices.
#[derive(Debug, Clone)]
pub struct DeviceLocator {
    device_name: String,
    usb_id: Option<UsbId>,
}

impl DeviceLocator {
    /// Create a locator for a device description, optionally pinned to a
    /// vendor/product id.
    #[must_use]
    pub fn new(device_name: impl Into<String>, usb_id: Option<UsbId>) -> Self {
        Self { device_name: device_name.into(), usb_id }
    }

    /// Whether a record is the configured device.
    ///
    /// The description has to start with the device name, mirroring how
    /// `lsusb` prints the name right after the id. A pinned id replaces the
    /// name check (the native enumerator reports device strings, not
    /// `usb.ids` names).
    #[must_use]
    pub fn matches(&self, record: &UsbDeviceRecord) -> bool {
        match self.usb_id {
            Some(id) => record.usb_id == id,
            None => record.description.starts_with(&self.device_name),
        }
    }

    /// Resolve the device address.
    ///
    /// # Errors
    /// Returns [`HidError::DeviceNotFound`] if no entry matches, or the
    /// enumerator's error if listing fails.
    pub fn locate(&self, enumerator: &dyn UsbEnumerator) -> HidResult<LocatedDevice> {
        let devices = enumerator.devices()?;
        debug!(count = devices.len(), "Enumerated USB devices");

        let record = devices
            .iter()
            .find(|record| self.matches(record))
            .ok_or_else(|| HidError::DeviceNotFound(self.device_name.clone()))?;

        info!(
            bus = record.address.bus,
            device = record.address.device,
            usb_id = %record.usb_id,
            description = %record.description,
            "Headset located"
        );

        Ok(LocatedDevice { address: record.address, usb_id: record.usb_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const LSUSB: &str = "\
Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub
Bus 001 Device 003: ID 046d:c52b Logitech, Inc. Unifying Receiver
Bus 001 Device 005: ID 1038:2202 SteelSeries ApS Arctis Nova 7
Bus 001 Device 001: ID 1d6b:0002 Linux Foundation 2.0 root hub
";

    struct FixedEnumerator(&'static str);

    impl UsbEnumerator for FixedEnumerator {
        fn devices(&self) -> HidResult<Vec<UsbDeviceRecord>> {
            Ok(parse_lsusb(self.0))
        }
    }

    struct FailingEnumerator;

    impl UsbEnumerator for FailingEnumerator {
        fn devices(&self) -> HidResult<Vec<UsbDeviceRecord>> {
            Err(HidError::EnumerationFailed("lsusb: not found".into()))
        }
    }

    #[test]
    fn test_parse_lsusb_line() {
        let record =
            parse_lsusb_line("Bus 001 Device 005: ID 1038:2202 SteelSeries ApS Arctis Nova 7")
                .unwrap();
        assert_eq!(record.address, DeviceAddress::new(1, 5));
        assert_eq!(record.usb_id, UsbId::new(0x1038, 0x2202));
        assert_eq!(record.description, "SteelSeries ApS Arctis Nova 7");
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let record = parse_lsusb_line(
            "  Bus 003  Device 012:  ID 1038:2202   SteelSeries ApS Arctis Nova 7  ",
        )
        .unwrap();
        assert_eq!(record.address, DeviceAddress::new(3, 12));
        assert_eq!(record.description, "SteelSeries ApS Arctis Nova 7");
    }

    #[test]
    fn test_parse_skips_non_device_lines() {
        assert!(parse_lsusb_line("").is_none());
        assert!(parse_lsusb_line("/:  Bus 01.Port 1: Dev 1, Class=root_hub").is_none());
        assert_eq!(parse_lsusb(LSUSB).len(), 4);
    }

    #[test]
    fn test_locate_arctis_nova_7() {
        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        let found = locator.locate(&FixedEnumerator(LSUSB)).unwrap();
        assert_eq!(found.address, DeviceAddress::new(1, 5));
        assert_eq!(found.usb_id, UsbId::new(0x1038, 0x2202));
    }

    #[test]
    fn test_locate_returns_first_match() {
        let listing = "\
Bus 001 Device 005: ID 1038:2202 SteelSeries ApS Arctis Nova 7
Bus 003 Device 009: ID 1038:2202 SteelSeries ApS Arctis Nova 7
";
        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        let found = locator.locate(&FixedEnumerator(listing)).unwrap();
        assert_eq!(found.address, DeviceAddress::new(1, 5));
    }

    #[test]
    fn test_locate_name_must_follow_id() {
        let listing = "Bus 001 Device 007: ID 1234:5678 Dock for SteelSeries ApS Arctis Nova 7\n";
        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        assert_matches!(
            locator.locate(&FixedEnumerator(listing)),
            Err(HidError::DeviceNotFound(_))
        );
    }

    #[test]
    fn test_locate_by_usb_id() {
        let locator = DeviceLocator::new("Arctis", Some(UsbId::new(0x1038, 0x2202)));
        let found = locator.locate(&FixedEnumerator(LSUSB)).unwrap();
        assert_eq!(found.address, DeviceAddress::new(1, 5));

        let locator = DeviceLocator::new("SteelSeries", Some(UsbId::new(0x1038, 0x12ad)));
        assert_matches!(locator.locate(&FixedEnumerator(LSUSB)), Err(HidError::DeviceNotFound(_)));
    }

    #[test]
    fn test_device_not_found() {
        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        let listing = "Bus 002 Device 001: ID 1d6b:0003 Linux Foundation 3.0 root hub\n";
        assert_matches!(
            locator.locate(&FixedEnumerator(listing)),
            Err(HidError::DeviceNotFound(name)) if name == "SteelSeries ApS Arctis Nova 7"
        );
    }

    #[test]
    fn test_enumeration_failure_propagates() {
        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        assert_matches!(locator.locate(&FailingEnumerator), Err(HidError::EnumerationFailed(_)));
    }

    #[cfg(unix)]
    fn fake_lsusb(dir: &tempfile::TempDir, body: &str) -> LsusbEnumerator {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("lsusb");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        LsusbEnumerator::with_program(path.to_str().unwrap())
    }

    #[cfg(unix)]
    #[test]
    fn test_lsusb_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let enumerator = fake_lsusb(
            &dir,
            "echo 'Bus 001 Device 005: ID 1038:2202 SteelSeries ApS Arctis Nova 7'",
        );

        let devices = enumerator.devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, DeviceAddress::new(1, 5));

        let locator = DeviceLocator::new("SteelSeries ApS Arctis Nova 7", None);
        assert_eq!(locator.locate(&enumerator).unwrap().usb_id, UsbId::new(0x1038, 0x2202));
    }

    #[cfg(unix)]
    #[test]
    fn test_lsusb_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let enumerator = fake_lsusb(&dir, "echo 'unable to initialize libusb: -99' >&2\nexit 1");

        assert_matches!(
            enumerator.devices(),
            Err(HidError::EnumerationFailed(msg)) if msg.contains("unable to initialize libusb: -99")
        );
    }

    #[test]
    fn test_missing_lsusb_binary() {
        let enumerator = LsusbEnumerator::with_program("/nonexistent/chatmix-lsusb");
        assert_matches!(
            enumerator.devices(),
            Err(HidError::EnumerationFailed(msg)) if msg.starts_with("/nonexistent/chatmix-lsusb")
        );
    }
}
