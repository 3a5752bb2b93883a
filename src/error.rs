/// Errors that can occur when talking to a GestIC sensor.
#[derive(Debug, thiserror::Error)]
pub enum GesticError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Property {0} is read-only")]
    ReadOnly(&'static str),

    #[error("Property {0} is write-only")]
    WriteOnly(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Send buffer too large: {0} bytes (max 256)")]
    SendBufferTooLarge(usize),

    #[error("Malformed send buffer: {0}")]
    MalformedSendBuffer(String),

    #[error("Failed to reserve {0} byte scratch buffer")]
    Alloc(usize),

    #[error("Decode worker error: {0}")]
    Worker(String),

    #[error("Device stopped")]
    DeviceStopped,

    #[error("Timeout waiting for data")]
    Timeout,
}

impl GesticError {
    /// Shorthand used by transport implementations.
    pub fn transport(msg: impl Into<String>) -> Self {
        GesticError::Transport(msg.into())
    }
}
