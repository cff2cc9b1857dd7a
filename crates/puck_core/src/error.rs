use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid table bounds: {width} x {height}")]
    InvalidTable { width: f32, height: f32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the command transport. None of these stop the control loop.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::Io(_) => true,
            TransportError::Unavailable(_) => true,
            TransportError::Closed => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed observation on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Detector unavailable: {0}")]
    Unavailable(String),
}

/// Wire frame that does not match `M` + 4 digits + 4 digits
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command frame has {0} bytes, expected 9")]
    Length(usize),

    #[error("Command frame must start with 'M'")]
    Prefix,

    #[error("Non-digit byte {byte:#04x} at offset {offset}")]
    Digit { offset: usize, byte: u8 },
}

pub type Result<T> = std::result::Result<T, CoreError>;
