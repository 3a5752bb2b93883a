use crate::types::InputEvent;
use crate::{GesticError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Destination for input events produced by the decode worker.
///
/// Each call carries one complete report (a press/release pulse or a
/// position sample with its sync) and must be delivered contiguously.
pub trait InputSink: Send + Sync {
    fn emit(&self, batch: &[InputEvent]);
}

/// Create a bounded channel sink and the stream that reads from it.
pub fn event_channel(capacity: usize) -> (ChannelSink, EventStream) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    (ChannelSink { sender }, EventStream { receiver })
}

/// Sink that forwards events into a crossbeam channel.
///
/// The decode worker is the only emitter, so batches stay contiguous.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<InputEvent>,
}

impl InputSink for ChannelSink {
    fn emit(&self, batch: &[InputEvent]) {
        for &event in batch {
            if let Err(e) = self.sender.try_send(event) {
                match e {
                    crossbeam_channel::TrySendError::Full(_) => {
                        log::trace!("Event channel full, dropping {:?}", event);
                    }
                    crossbeam_channel::TrySendError::Disconnected(_) => {
                        log::trace!("Event channel disconnected");
                        return;
                    }
                }
            }
        }
    }
}

/// Receiving end of [`event_channel`].
pub struct EventStream {
    receiver: Receiver<InputEvent>,
}

impl EventStream {
    /// Receive the next event (blocks until available).
    pub fn recv(&self) -> Result<InputEvent> {
        self.receiver.recv().map_err(|_| GesticError::DeviceStopped)
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive an event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<InputEvent> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => GesticError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => GesticError::DeviceStopped,
        })
    }

    /// Everything currently queued.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_in_order() {
        let (sink, stream) = event_channel(8);
        sink.emit(&[InputEvent::Abs { x: 1, y: 2, z: 3 }, InputEvent::Sync]);
        assert_eq!(stream.try_recv(), Some(InputEvent::Abs { x: 1, y: 2, z: 3 }));
        assert_eq!(stream.try_recv(), Some(InputEvent::Sync));
        assert_eq!(stream.try_recv(), None);
    }

    #[test]
    fn test_full_channel_drops() {
        let (sink, stream) = event_channel(1);
        sink.emit(&[InputEvent::Sync, InputEvent::Abs { x: 0, y: 0, z: 0 }]);
        assert_eq!(stream.drain(), vec![InputEvent::Sync]);
    }

    #[test]
    fn test_disconnected_stream() {
        let (sink, stream) = event_channel(1);
        drop(sink);
        assert!(matches!(stream.recv(), Err(GesticError::DeviceStopped)));
        assert!(matches!(
            stream.recv_timeout(Duration::from_millis(1)),
            Err(GesticError::DeviceStopped)
        ));
    }
}
