//! Errors of the host application.

/// Anything that can go wrong between a board and the window.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No Pinguino found")]
    NotFound,
    #[error("USB error while {0}")]
    Usb(&'static str, #[source] nusb::Error),
    #[error("USB transfer error while {0}")]
    Transfer(&'static str, #[source] nusb::transfer::TransferError),
    #[error("Timeout while waiting for the device")]
    Timeout,
    #[error("Malformed data from the device: {0}")]
    Decode(#[from] pinguino_protocol::DecodeError),
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("I/O error while {0}")]
    Io(&'static str, #[source] std::io::Error),
    #[error("No trace named {0:?}")]
    UnknownTrace(String),
    #[error("Trace range {min} to {max} is empty")]
    EmptyRange { min: f64, max: f64 },
}

impl Error {
    /// The board went away; nothing further can be read.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Transfer(_, nusb::transfer::TransferError::Disconnected)
        )
    }
}
