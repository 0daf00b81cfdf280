pub mod command;
pub mod model;
pub mod session;

pub use command::{Command, CommandCodec, FirmwareQuery, FirmwareReply, ModelReply, ReplyShape};
pub use model::{model_name, StationModel, UNKNOWN_MODEL};
pub use session::{Completed, ExchangeReport, Outcome, SessionState, StationSession};
