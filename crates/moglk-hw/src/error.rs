//! Error types for the GLK driver library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the module.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter is outside the range the command reference documents.
    #[error("{what} out of range: {value} (allowed {min}-{max})")]
    OutOfRange {
        what: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },

    /// A coordinate lies off the 192x64 panel.
    #[error("coordinate ({x}, {y}) outside the 192x64 panel")]
    OffPanel { x: u8, y: u8 },

    /// Rectangle extents are reversed; the protocol requires x1 <= x2 and
    /// y1 <= y2.
    #[error("extents ({x1}, {y1})-({x2}, {y2}) are not ordered")]
    UnorderedExtents { x1: u8, y1: u8, x2: u8, y2: u8 },

    /// A payload has the wrong length for the command.
    #[error("{what}: expected {expected} bytes, got {actual}")]
    BadLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Text contains bytes the module's character table cannot represent.
    #[error("text is not ASCII")]
    NotAscii,

    /// Serial port missing or inaccessible.
    #[error("serial port not found at {0}")]
    PortNotFound(String),

    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Serial I/O error.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An expected response did not arrive within the read deadline.
    #[error("timed out waiting for {expected} response byte(s)")]
    Timeout { expected: usize },

    /// The operation needs the file transfer protocol, which this driver
    /// does not speak.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The module returned a type byte we do not know.
    #[error("unknown module type byte: {0:#04X}")]
    UnknownModuleType(u8),

    /// The keypad returned a code outside the documented layout.
    #[error("unknown keypad code: {0:#04X}")]
    UnknownKey(u8),
}
