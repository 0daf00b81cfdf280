//! Reply collection for replies that carry no length prefix or terminator.
//!
//! The console pads fixed-size records with zero bytes, so the end of a reply
//! is inferred from the channel going quiet, and trailing zeros are stripped
//! once it has.

use super::{ByteChannel, Result, SerialError};

/// Largest reply the console is expected to send
pub const RESPONSE_CAPACITY: usize = 4200;

const READ_CHUNK: usize = 512;

/// A completed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Received bytes with trailing zero padding removed
    pub bytes: Vec<u8>,
    /// Bytes received before trimming
    pub received: usize,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulation {
    Pending,
    Complete(Reply),
}

/// Bounded buffer owned by a single request/response exchange.
///
/// Storage is allocated on the first received byte and the accumulator is
/// consumed when the reply completes, so nothing carries over between
/// commands.
#[derive(Debug)]
pub struct ResponseAccumulator {
    buffer: Option<Vec<u8>>,
    cursor: usize,
    capacity: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::with_capacity(RESPONSE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: None,
            cursor: 0,
            capacity,
        }
    }

    /// Number of bytes written so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Append a delivered chunk at the cursor
    pub fn extend(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        if self.cursor + chunk.len() > self.capacity {
            return Err(SerialError::BufferOverflow { capacity: self.capacity });
        }

        let capacity = self.capacity;
        let buffer = self.buffer.get_or_insert_with(|| Vec::with_capacity(capacity));
        buffer.extend_from_slice(chunk);
        self.cursor += chunk.len();
        Ok(())
    }

    /// Drain every byte the channel currently has into the buffer.
    ///
    /// Returns `Pending` when this round copied anything (more may still be
    /// trickling in) or when nothing has arrived yet. A round that finds the
    /// channel empty after data was received completes the reply.
    pub async fn poll<C: ByteChannel + ?Sized>(&mut self, channel: &mut C) -> Result<Accumulation> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut copied = 0;

        loop {
            let n = channel.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.extend(&chunk[..n])?;
            copied += n;
        }

        if copied > 0 || self.cursor == 0 {
            log::trace!("Drained {} bytes, cursor at {}", copied, self.cursor);
            return Ok(Accumulation::Pending);
        }

        Ok(Accumulation::Complete(self.take()))
    }

    /// Consume the buffered bytes as a trimmed reply
    pub fn finish(mut self) -> Reply {
        self.take()
    }

    fn take(&mut self) -> Reply {
        let mut bytes = self.buffer.take().unwrap_or_default();
        let received = self.cursor;
        self.cursor = 0;
        let meaningful = trim_trailing_zeros(&bytes).len();
        bytes.truncate(meaningful);
        Reply { bytes, received }
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip zero padding from the end of `bytes`
pub fn trim_trailing_zeros(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(payload: &[u8], total: usize) -> Vec<u8> {
        let mut v = payload.to_vec();
        v.resize(total, 0);
        v
    }

    #[test]
    fn trim_removes_only_trailing_zeros() {
        assert_eq!(trim_trailing_zeros(&[0, 1, 0, 2, 0, 0]), &[0, 1, 0, 2]);
        assert_eq!(trim_trailing_zeros(b"5.2\n"), b"5.2\n");
        assert_eq!(trim_trailing_zeros(&[]), &[] as &[u8]);
    }

    #[test]
    fn all_zero_buffers_trim_to_nothing() {
        for len in [1usize, 2, 17, 4200] {
            assert!(trim_trailing_zeros(&vec![0u8; len]).is_empty(), "len {}", len);
        }

        let mut acc = ResponseAccumulator::new();
        acc.extend(&[0u8; 64]).unwrap();
        let reply = acc.finish();
        assert!(reply.is_empty());
        assert_eq!(reply.received, 64);
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let payload = padded(b"\x06\x10 Vantage \x00 record", 300);
        let expected = trim_trailing_zeros(&payload).to_vec();

        for chunk_size in 1..=payload.len() {
            let mut acc = ResponseAccumulator::new();
            for chunk in payload.chunks(chunk_size) {
                acc.extend(chunk).unwrap();
            }
            assert_eq!(acc.cursor(), payload.len());
            let reply = acc.finish();
            assert_eq!(reply.bytes, expected, "chunk size {}", chunk_size);
            assert_eq!(reply.received, payload.len());
        }
    }

    #[test]
    fn uneven_split_points_agree() {
        let payload = padded(b"5.2\n", 4200);
        for split in [0usize, 1, 2, 3, 4, 5, 100, 4199, 4200] {
            let mut acc = ResponseAccumulator::new();
            acc.extend(&payload[..split]).unwrap();
            acc.extend(&payload[split..]).unwrap();
            assert_eq!(acc.finish().bytes, b"5.2\n".to_vec());
        }
    }

    #[test]
    fn filling_to_capacity_is_allowed() {
        let mut acc = ResponseAccumulator::with_capacity(8);
        acc.extend(&[1u8; 8]).unwrap();
        assert_eq!(acc.cursor(), 8);
    }

    #[test]
    fn writing_past_capacity_overflows() {
        let mut acc = ResponseAccumulator::with_capacity(8);
        acc.extend(&[1u8; 5]).unwrap();
        let err = acc.extend(&[1u8; 4]).unwrap_err();
        assert!(matches!(err, SerialError::BufferOverflow { capacity: 8 }));
        assert_eq!(acc.cursor(), 5);
    }

    #[test]
    fn storage_is_allocated_lazily() {
        let mut acc = ResponseAccumulator::new();
        acc.extend(&[]).unwrap();
        assert!(acc.buffer.is_none());
        acc.extend(b"V").unwrap();
        assert!(acc.buffer.is_some());
    }
}
