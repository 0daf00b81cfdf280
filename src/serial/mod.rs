pub mod accumulator;
pub mod interface;
pub mod scripted;
pub mod wake;

pub use accumulator::{Accumulation, Reply, ResponseAccumulator};
pub use interface::SerialInterface;
pub use scripted::ScriptedChannel;
pub use wake::wake;

#[derive(Debug, Clone)]
pub struct SerialDeviceInfo {
    pub port_name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// Duplex byte stream to a console.
///
/// `read` never blocks: it copies whatever is currently buffered and returns
/// `Ok(0)` when nothing is ready. `readable` is the readiness signal and
/// resolves once inbound bytes are pending. No call assumes a read returns a
/// complete message.
#[async_trait::async_trait]
pub trait ByteChannel: Send {
    /// Queue `data` for transmission, returning how many bytes were accepted
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Block until the output queue has been flushed to the wire
    async fn drain(&mut self) -> Result<()>;

    /// Copy currently buffered inbound bytes into `buf`
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Wait until inbound bytes are available
    async fn readable(&mut self) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Console did not wake after {attempts} attempts")]
    WakeFailed { attempts: u32 },

    #[error("Communication timeout")]
    Timeout,

    #[error("Reply exceeds the {capacity}-byte response buffer")]
    BufferOverflow { capacity: usize },

    #[error("No data received from console")]
    NoReply,

    #[error("Reply too short: model byte at offset {offset} but only {received} bytes received")]
    ShortReply { offset: usize, received: usize },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

impl SerialError {
    /// Process exit code reported by the CLI for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            SerialError::WakeFailed { .. } => 3,
            SerialError::PortNotFound(_)
            | SerialError::ConnectionFailed(_)
            | SerialError::IoError(_)
            | SerialError::SerialportError(_) => 4,
            SerialError::Timeout => 5,
            SerialError::BufferOverflow { .. } => 6,
            SerialError::NoReply
            | SerialError::ShortReply { .. }
            | SerialError::ProtocolError(_) => 7,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;
