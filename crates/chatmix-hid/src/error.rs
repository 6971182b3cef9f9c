//! HID error types.

use std::time::Duration;

use thiserror::Error;

/// HID error type.
#[derive(Debug, Error)]
pub enum HidError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied - check udev rules")]
    PermissionDenied,

    #[error("USB error: {0}")]
    UsbError(String),

    #[error("USB enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Failed to start capture: {0}")]
    CaptureFailed(String),

    #[error("No report received for {0:?}")]
    ReadTimeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for HID operations.
pub type HidResult<T> = Result<T, HidError>;
