//! Wire encoding of console commands and decoding of their replies.

use serde::{Deserialize, Serialize};

use super::model::model_name;
use crate::config::SessionConfig;
use crate::serial::{Reply, Result, SerialError};

pub const WAKE_BYTE: u8 = 0x0D;
pub const VER_QUERY: &[u8] = b"VER\n";
/// `WRD` followed by the two raw bytes 0x12 0x4D and a newline
pub const WRD_QUERY: &[u8] = b"WRD\x12\x4D\n";
pub const LAMPS_ON: &[u8] = b"LAMPS 1\n";
pub const LAMPS_OFF: &[u8] = b"LAMPS 0\n";

/// Which firmware query a console understands. Newer firmware answers `VER`,
/// older generations only the `WRD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareQuery {
    #[default]
    Ver,
    Wrd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    WakeUp,
    GetFirmwareVersion,
    GetModel,
    SetBacklight(bool),
}

/// What the console sends back for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    None,
    AsciiLine,
    BinaryRecord,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::WakeUp => "wake-up",
            Command::GetFirmwareVersion => "firmware-version",
            Command::GetModel => "model",
            Command::SetBacklight(_) => "set-backlight",
        }
    }

    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Command::WakeUp | Command::SetBacklight(_) => ReplyShape::None,
            Command::GetFirmwareVersion => ReplyShape::AsciiLine,
            Command::GetModel => ReplyShape::BinaryRecord,
        }
    }
}

/// Raw firmware reply; the console defines no structure beyond the bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareReply {
    pub raw: Vec<u8>,
}

impl FirmwareReply {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Uppercase hex pairs separated by spaces
    pub fn hex_dump(&self) -> String {
        self.raw
            .iter()
            .map(|b| hex::encode_upper([*b]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lossy text view with line endings removed
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw)
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub code: u8,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCodec {
    pub firmware_query: FirmwareQuery,
    pub model_offset: usize,
}

impl CommandCodec {
    pub fn new(firmware_query: FirmwareQuery, model_offset: usize) -> Self {
        Self { firmware_query, model_offset }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.firmware_query, config.model_offset)
    }

    /// Exact bytes to transmit for `command`
    pub fn encode(&self, command: &Command) -> Vec<u8> {
        match command {
            Command::WakeUp => vec![WAKE_BYTE],
            Command::GetFirmwareVersion => match self.firmware_query {
                FirmwareQuery::Ver => VER_QUERY.to_vec(),
                FirmwareQuery::Wrd => WRD_QUERY.to_vec(),
            },
            Command::GetModel => WRD_QUERY.to_vec(),
            Command::SetBacklight(true) => LAMPS_ON.to_vec(),
            Command::SetBacklight(false) => LAMPS_OFF.to_vec(),
        }
    }

    pub fn decode_firmware(&self, reply: Reply) -> Result<FirmwareReply> {
        if reply.is_empty() {
            return Err(SerialError::NoReply);
        }
        Ok(FirmwareReply { raw: reply.bytes })
    }

    /// Read the model code at the configured offset.
    ///
    /// Padding trimmed off the end of the reply was received as zeros, so an
    /// offset inside the received span but past the trimmed bytes reads as 0.
    /// An offset past everything received is an error rather than a guess.
    pub fn decode_model(&self, reply: &Reply) -> Result<ModelReply> {
        if reply.received == 0 {
            return Err(SerialError::NoReply);
        }
        if self.model_offset >= reply.received {
            return Err(SerialError::ShortReply {
                offset: self.model_offset,
                received: reply.received,
            });
        }

        let code = reply.bytes.get(self.model_offset).copied().unwrap_or(0);
        Ok(ModelReply { code, name: model_name(code) })
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
