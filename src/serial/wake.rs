use tokio::time::sleep;

use super::{ByteChannel, Result, SerialError};
use crate::config::SessionConfig;
use crate::station::{Command, CommandCodec};

/// Wake the console with a bare CR, retrying failed writes immediately.
///
/// An accepted write counts as woken; the console's answer is not awaited.
/// Attempts run strictly one after another. Returns the attempt number that
/// succeeded, after the settle delay has elapsed.
pub async fn wake<C: ByteChannel + ?Sized>(channel: &mut C, config: &SessionConfig) -> Result<u32> {
    let payload = CommandCodec::from_config(config).encode(&Command::WakeUp);
    let max_attempts = config.wake_attempts.max(1);

    let mut attempt = 1;
    loop {
        match channel.write(&payload).await {
            Ok(n) if n == payload.len() => {
                log::debug!("Wake write accepted on attempt {}", attempt);
                sleep(config.wake_settle()).await;
                return Ok(attempt);
            }
            Ok(n) => log::warn!("Wake attempt {} wrote {} of {} bytes", attempt, n, payload.len()),
            Err(e) => log::warn!("Wake attempt {} failed: {}", attempt, e),
        }

        if attempt >= max_attempts {
            return Err(SerialError::WakeFailed { attempts: attempt });
        }
        attempt += 1;
    }
}
