//! Native USB enumeration via libusb.

use chatmix_core::{DeviceAddress, UsbId};
use tracing::debug;

use crate::error::{HidError, HidResult};
use crate::locator::{UsbDeviceRecord, UsbEnumerator};

/// Enumerates devices through libusb instead of parsing `lsusb`.
///
/// Descriptions are built from the device's own manufacturer and product
/// strings, which need the device to be openable. When it is not, the
/// description is empty and only an id match can find it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RusbEnumerator;

impl UsbEnumerator for RusbEnumerator {
    fn devices(&self) -> HidResult<Vec<UsbDeviceRecord>> {
        let devices = rusb::devices().map_err(|e| match e {
            rusb::Error::Access => HidError::PermissionDenied,
            other => HidError::UsbError(other.to_string()),
        })?;

        let mut records = Vec::new();
        for device in devices.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };

            let description = describe(&device, &desc).unwrap_or_default();
            records.push(UsbDeviceRecord {
                address: DeviceAddress::new(device.bus_number(), device.address()),
                usb_id: UsbId::new(desc.vendor_id(), desc.product_id()),
                description,
            });
        }

        Ok(records)
    }
}

/// Read "<manufacturer> <product>" from the device strings.
fn describe<T: rusb::UsbContext>(
    device: &rusb::Device<T>,
    desc: &rusb::DeviceDescriptor,
) -> Option<String> {
    let handle = match device.open() {
        Ok(handle) => handle,
        Err(e) => {
            debug!(
                bus = device.bus_number(),
                address = device.address(),
                error = %e,
                "Cannot open USB device for strings"
            );
            return None;
        }
    };

    let manufacturer = desc
        .manufacturer_string_index()
        .and_then(|_| handle.read_manufacturer_string_ascii(desc).ok());
    let product =
        desc.product_string_index().and_then(|_| handle.read_product_string_ascii(desc).ok());

    match (manufacturer, product) {
        (Some(m), Some(p)) => Some(format!("{m} {p}")),
        (Some(s), None) | (None, Some(s)) => Some(s),
        (None, None) => None,
    }
}
