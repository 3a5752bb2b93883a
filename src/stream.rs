use crate::ring::{RingBuffer, STREAM_BUFFER_CAPACITY};
use crate::transport::Transport;
use crate::{GesticError, Result};

/// Largest length a single buffered read may ask for.
pub const MAX_READ_LEN: usize = STREAM_BUFFER_CAPACITY;

/// Where the next buffered read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Fresh bus receive of the pending length.
    #[default]
    Direct,
    /// Drain the stream ring buffer, then fall back to `Direct`.
    Streaming,
}

/// Routes `receive_buffer` reads to the bus or the stream buffer.
#[derive(Debug)]
pub struct StreamController {
    mode: StreamMode,
    pending_len: usize,
    available: usize,
    ring: RingBuffer,
}

impl StreamController {
    pub fn new(ring: RingBuffer) -> Self {
        Self {
            mode: StreamMode::Direct,
            pending_len: 1,
            available: 0,
            ring,
        }
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Serve the next read from the stream buffer.
    pub fn enter_streaming(&mut self) {
        log::debug!("Next buffered read comes from the stream buffer");
        self.mode = StreamMode::Streaming;
    }

    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    /// Length the next buffered read asks for, at most [`MAX_READ_LEN`].
    pub fn set_pending_len(&mut self, len: usize) -> Result<()> {
        if len > MAX_READ_LEN {
            return Err(GesticError::InvalidValue {
                name: "receive_buffer",
                reason: format!("{} exceeds {}", len, MAX_READ_LEN),
            });
        }
        log::debug!("Buffered read length set to {}", len);
        self.pending_len = len;
        Ok(())
    }

    /// Bytes the stream buffer reports as available.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Producer side: store all of `bytes` or none of it.
    ///
    /// A message that does not fit in the free space is dropped whole, so
    /// the buffer never holds a fragment whose size byte overstates it.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        if bytes.len() > self.ring.free() {
            log::trace!(
                "Stream buffer full, dropped {} byte message with {} free",
                bytes.len(),
                self.ring.free()
            );
            return 0;
        }
        let stored = self.ring.write_slice(bytes);
        self.available += stored;
        stored
    }

    /// Serve one buffered read.
    ///
    /// In `Streaming` mode this drains up to the pending length from the
    /// ring and returns to `Direct`. In `Direct` mode it receives the pending
    /// length from `transport`; a failed receive logs and yields no bytes.
    /// Either way the pending length is reset to zero.
    pub fn read(&mut self, transport: &mut dyn Transport) -> Result<Vec<u8>> {
        let requested = std::mem::take(&mut self.pending_len);

        match self.mode {
            StreamMode::Streaming => {
                self.mode = StreamMode::Direct;
                let out = self
                    .ring
                    .read_up_to(requested)
                    .map_err(|_| GesticError::Alloc(requested))?;
                self.available = self.available.saturating_sub(out.len());
                if out.len() < requested {
                    log::debug!(
                        "Stream read asked for {} bytes, {} available",
                        requested,
                        out.len()
                    );
                }
                log::debug!(
                    "Stream read returned {} bytes, {} left",
                    out.len(),
                    self.available
                );
                Ok(out)
            }
            StreamMode::Direct => {
                if requested == 0 {
                    return Ok(Vec::new());
                }
                match transport.recv(requested) {
                    Ok(bytes) => {
                        log::trace!("Direct read returned {:02x?}", bytes);
                        Ok(bytes)
                    }
                    Err(e) => {
                        log::warn!("Direct read of {} bytes failed: {}", requested, e);
                        Ok(Vec::new())
                    }
                }
            }
        }
    }
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new(RingBuffer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;

    #[test]
    fn test_direct_read_uses_transport() {
        let (mut bus, log) = ScriptedTransport::new();
        log.push_response(vec![9, 8, 7, 6]);
        let mut ctl = StreamController::default();
        ctl.set_pending_len(3).unwrap();

        assert_eq!(ctl.read(&mut bus).unwrap(), vec![9, 8, 7]);
        assert_eq!(log.recv_requests(), vec![3]);
        assert_eq!(ctl.pending_len(), 0);
    }

    #[test]
    fn test_direct_read_failure_yields_nothing() {
        let (mut bus, log) = ScriptedTransport::new();
        log.fail_next(1);
        let mut ctl = StreamController::default();
        ctl.set_pending_len(4).unwrap();
        assert!(ctl.read(&mut bus).unwrap().is_empty());
        assert_eq!(ctl.pending_len(), 0);
    }

    #[test]
    fn test_streaming_read_drains_ring_then_reverts() {
        let (mut bus, log) = ScriptedTransport::new();
        let mut ctl = StreamController::default();
        assert_eq!(ctl.push(&[1, 2, 3, 4, 5]), 5);

        ctl.set_pending_len(3).unwrap();
        ctl.enter_streaming();
        assert_eq!(ctl.read(&mut bus).unwrap(), vec![1, 2, 3]);
        assert_eq!(ctl.available(), 2);
        assert_eq!(ctl.mode(), StreamMode::Direct);
        assert_eq!(log.transactions(), 0);

        ctl.set_pending_len(10).unwrap();
        ctl.enter_streaming();
        assert_eq!(ctl.read(&mut bus).unwrap(), vec![4, 5]);
        assert_eq!(ctl.available(), 0);
        assert_eq!(log.transactions(), 0);
    }

    #[test]
    fn test_streaming_read_of_zero_takes_nothing() {
        let (mut bus, _log) = ScriptedTransport::new();
        let mut ctl = StreamController::default();
        ctl.push(&[1, 2]);
        ctl.set_pending_len(0).unwrap();
        ctl.enter_streaming();
        assert!(ctl.read(&mut bus).unwrap().is_empty());
        assert_eq!(ctl.available(), 2);
    }

    #[test]
    fn test_push_drops_message_that_does_not_fit() {
        let mut ctl = StreamController::new(RingBuffer::new(8));
        assert_eq!(ctl.push(&[1, 2, 3, 4]), 4);
        assert_eq!(ctl.push(&[5, 6, 7, 8]), 0);
        assert_eq!(ctl.available(), 4);
        assert_eq!(ctl.push(&[5, 6, 7]), 3);
        assert_eq!(ctl.available(), 7);

        let (mut bus, _log) = ScriptedTransport::new();
        ctl.set_pending_len(MAX_READ_LEN).unwrap();
        ctl.enter_streaming();
        assert_eq!(ctl.read(&mut bus).unwrap(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_pending_len_is_bounded() {
        let mut ctl = StreamController::default();
        ctl.set_pending_len(5).unwrap();
        assert!(ctl.set_pending_len(MAX_READ_LEN + 1).is_err());
        assert_eq!(ctl.pending_len(), 5);
    }
}
