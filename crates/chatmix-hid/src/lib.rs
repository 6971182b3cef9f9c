//! Chatmix HID - headset discovery and chat-mix report decoding.
//!
//! This crate finds the headset on the USB bus and turns its raw interrupt
//! reports into [`MixState`](chatmix_core::MixState) values:
//! - [`locator`] resolves a device name to a bus/device address
//! - [`report`] decodes single capture lines
//! - [`stream`] runs `usbhid-dump` and yields decoded states lazily
//!
//! **Note**: reports are read through `usbhid-dump` rather than hidraw, so
//! the capture needs the same permissions that tool does (usually a udev
//! rule for the headset).

pub mod device;
pub mod error;
pub mod locator;
pub mod report;
pub mod stream;

pub use device::RusbEnumerator;
pub use error::{HidError, HidResult};
pub use locator::{DeviceLocator, LocatedDevice, LsusbEnumerator, UsbDeviceRecord, UsbEnumerator};
pub use report::{ReportError, decode_line};
pub use stream::{HidCapture, MixStream, ReportSource};
