//! In-memory console used to drive the protocol engine without hardware.
//!
//! Inbound chunks are queued up front and released one per readiness wait,
//! which mimics a console whose reply trickles in over several deliveries.
//! Clones share state, so a test can keep a handle after moving the channel
//! into a session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ByteChannel, Result, SerialError};

#[derive(Debug, Default)]
struct ScriptState {
    write_failures: VecDeque<bool>,
    fail_drain: bool,
    chunks: VecDeque<Vec<u8>>,
    arrived: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    write_attempts: usize,
    drains: usize,
    max_write: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound chunk, released on a later readiness wait
    pub fn push_chunk(&self, chunk: impl Into<Vec<u8>>) -> &Self {
        self.lock().chunks.push_back(chunk.into());
        self
    }

    /// Script the outcome of upcoming writes in order; `false` fails the write.
    /// Writes past the script succeed.
    pub fn script_writes(&self, outcomes: &[bool]) -> &Self {
        self.lock().write_failures.extend(outcomes.iter().map(|ok| !ok));
        self
    }

    /// Accept at most `max` bytes per write, like a port with a small
    /// transmit buffer
    pub fn limit_write_size(&self, max: usize) -> &Self {
        self.lock().max_write = Some(max);
        self
    }

    pub fn fail_drain(&self) -> &Self {
        self.lock().fail_drain = true;
        self
    }

    /// Payloads of every successful write, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.lock().write_attempts
    }

    pub fn drains(&self) -> usize {
        self.lock().drains
    }

    /// Inbound chunks not yet released
    pub fn queued_chunks(&self) -> usize {
        self.lock().chunks.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl ByteChannel for ScriptedChannel {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.lock();
        state.write_attempts += 1;
        if state.write_failures.pop_front().unwrap_or(false) {
            return Err(SerialError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        let n = state.max_write.map_or(data.len(), |max| data.len().min(max));
        state.written.push(data[..n].to_vec());
        Ok(n)
    }

    async fn drain(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.drains += 1;
        if state.fail_drain {
            return Err(SerialError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted drain failure",
            )));
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        let n = buf.len().min(state.arrived.len());
        for (slot, byte) in buf.iter_mut().zip(state.arrived.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn readable(&mut self) -> Result<()> {
        {
            let mut state = self.lock();
            if !state.arrived.is_empty() {
                return Ok(());
            }
            if let Some(chunk) = state.chunks.pop_front() {
                state.arrived.extend(chunk);
                return Ok(());
            }
        }
        // Silent console: never ready
        std::future::pending::<()>().await;
        Ok(())
    }
}
