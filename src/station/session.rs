use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

use super::command::{Command, CommandCodec, FirmwareReply, ModelReply, ReplyShape};
use crate::config::SessionConfig;
use crate::serial::{
    wake, Accumulation, ByteChannel, Reply, ResponseAccumulator, Result, SerialError,
    SerialInterface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
    Woken,
    Idle,
    AwaitingReply,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No command requested; the console was woken and left alone
    Idle,
    Firmware(FirmwareReply),
    Model(ModelReply),
    Backlight { on: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeReport {
    pub command: Option<&'static str>,
    /// Every state the session passed through, starting at `Open`
    pub transitions: Vec<SessionState>,
    pub wake_attempts: u32,
    pub bytes_written: usize,
    /// Reply bytes received before padding was trimmed
    pub bytes_received: usize,
    pub elapsed: Duration,
}

impl ExchangeReport {
    pub fn final_state(&self) -> Option<SessionState> {
        self.transitions.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub outcome: Outcome,
    pub report: ExchangeReport,
}

/// A single-shot conversation with one console.
///
/// `execute` consumes the session: it wakes the console, services at most one
/// command and drops the channel, which closes the port.
pub struct StationSession<C: ByteChannel> {
    channel: C,
    config: SessionConfig,
    codec: CommandCodec,
    report: ExchangeReport,
}

impl StationSession<SerialInterface> {
    pub fn open(port_name: &str, config: SessionConfig) -> Result<Self> {
        let channel = SerialInterface::open(port_name, config.baud_rate)?;
        Ok(Self::new(channel, config))
    }
}

impl<C: ByteChannel> StationSession<C> {
    /// Wrap an already open channel
    pub fn new(channel: C, config: SessionConfig) -> Self {
        let codec = CommandCodec::from_config(&config);
        Self {
            channel,
            config,
            codec,
            report: ExchangeReport {
                transitions: vec![SessionState::Open],
                ..ExchangeReport::default()
            },
        }
    }

    pub fn state(&self) -> SessionState {
        self.report.final_state().unwrap_or(SessionState::Open)
    }

    pub async fn execute(self, command: Option<Command>) -> Result<Completed> {
        let (result, report) = self.exchange(command).await;
        result.map(|outcome| Completed { outcome, report })
    }

    /// Like `execute`, but hands back the report on failure too. A failed
    /// exchange always ends in `Closed`.
    pub async fn exchange(
        mut self,
        command: Option<Command>,
    ) -> (Result<Outcome>, ExchangeReport) {
        let started = Instant::now();
        self.report.command = command.as_ref().map(Command::name);

        let result = self.run(command).await;
        if result.is_err() {
            self.transition(SessionState::Closed);
        }
        self.report.elapsed = started.elapsed();
        log::debug!("Exchange report: {:?}", self.report);

        (result, self.report)
    }

    fn transition(&mut self, next: SessionState) {
        log::trace!("Session {:?} -> {:?}", self.state(), next);
        self.report.transitions.push(next);
    }

    async fn run(&mut self, command: Option<Command>) -> Result<Outcome> {
        self.report.wake_attempts = wake(&mut self.channel, &self.config).await?;
        self.transition(SessionState::Woken);
        log::info!("Console awake after {} attempt(s)", self.report.wake_attempts);

        let command = match command {
            None | Some(Command::WakeUp) => {
                self.transition(SessionState::Idle);
                return Ok(Outcome::Idle);
            }
            Some(command) => command,
        };

        self.send(&command).await?;

        let outcome = match command.reply_shape() {
            ReplyShape::None => match command {
                Command::SetBacklight(on) => Outcome::Backlight { on },
                _ => Outcome::Idle,
            },
            ReplyShape::AsciiLine => {
                self.transition(SessionState::AwaitingReply);
                let reply = self.collect_reply().await?;
                Outcome::Firmware(self.codec.decode_firmware(reply)?)
            }
            ReplyShape::BinaryRecord => {
                self.transition(SessionState::AwaitingReply);
                let reply = self.collect_reply().await?;
                Outcome::Model(self.codec.decode_model(&reply)?)
            }
        };

        self.transition(SessionState::Done);
        Ok(outcome)
    }

    /// Write and flush one command. Never retried: repeating a command such as
    /// a backlight toggle is not safe. Short writes continue with the rest of
    /// the payload.
    async fn send(&mut self, command: &Command) -> Result<()> {
        let payload = self.codec.encode(command);
        log::debug!("Sending {} ({})", command.name(), hex::encode(&payload));

        let mut offset = 0;
        while offset < payload.len() {
            let n = self.channel.write(&payload[offset..]).await?;
            if n == 0 {
                let stalled = format!(
                    "{} stalled after {} of {} bytes",
                    command.name(),
                    offset,
                    payload.len()
                );
                return Err(SerialError::IoError(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    stalled,
                )));
            }
            offset += n;
        }
        self.channel.drain().await?;
        self.report.bytes_written += offset;
        Ok(())
    }

    async fn collect_reply(&mut self) -> Result<Reply> {
        match timeout(self.config.reply_timeout(), self.channel.readable()).await {
            Ok(ready) => ready?,
            Err(_) => {
                log::warn!("No reply within {:?}", self.config.reply_timeout());
                return Err(SerialError::Timeout);
            }
        }
        sleep(self.config.reply_settle()).await;

        let mut accumulator = ResponseAccumulator::with_capacity(self.config.response_capacity);
        for _ in 0..self.config.max_drain_rounds {
            match accumulator.poll(&mut self.channel).await? {
                Accumulation::Complete(reply) => {
                    self.report.bytes_received = reply.received;
                    return Ok(reply);
                }
                Accumulation::Pending => {
                    // A quiet window without readiness ends the reply on the next poll
                    let quiet = self.config.quiet_window();
                    if let Ok(ready) = timeout(quiet, self.channel.readable()).await {
                        ready?;
                    }
                }
            }
        }

        self.report.bytes_received = accumulator.cursor();
        log::warn!(
            "Reply still arriving after {} drain rounds ({} bytes so far)",
            self.config.max_drain_rounds,
            accumulator.cursor()
        );
        Err(SerialError::Timeout)
    }
}
