use crate::{GesticError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Byte-level link to the sensor.
///
/// Each call is one blocking bus transaction. Implementations do not frame
/// or interpret the bytes; `recv` returns what the bus delivered, at most
/// `max_len` bytes.
pub trait Transport: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
    fn recv(&mut self, max_len: usize) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn recv(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).recv(max_len)
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    recv_requests: Vec<usize>,
    failed_sends: usize,
    fail_next: usize,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory sensor bus for tests and demos.
///
/// Replays queued responses in order, truncated to the requested length.
/// With nothing queued it answers like an idle sensor: `max_len` zero bytes,
/// which reads as a message of declared length 0.
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

/// Handle for feeding and inspecting a [`ScriptedTransport`] after it has
/// been handed to a device.
#[derive(Clone)]
pub struct TransportLog {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> (ScriptedTransport, TransportLog) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            ScriptedTransport {
                script: script.clone(),
            },
            TransportLog { script },
        )
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut script = lock(&self.script);
        if script.fail_next > 0 {
            script.fail_next -= 1;
            script.failed_sends += 1;
            return Err(GesticError::transport("simulated send failure"));
        }
        script.sent.push(bytes.to_vec());
        Ok(())
    }

    fn recv(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut script = lock(&self.script);
        script.recv_requests.push(max_len);
        if script.fail_next > 0 {
            script.fail_next -= 1;
            return Err(GesticError::transport("simulated recv failure"));
        }
        match script.responses.pop_front() {
            Some(mut bytes) => {
                bytes.truncate(max_len);
                Ok(bytes)
            }
            None => Ok(vec![0u8; max_len]),
        }
    }
}

impl TransportLog {
    /// Queue bytes for a future `recv`.
    pub fn push_response(&self, bytes: impl Into<Vec<u8>>) {
        lock(&self.script).responses.push_back(bytes.into());
    }

    /// Make the next `count` transactions fail.
    pub fn fail_next(&self, count: usize) {
        lock(&self.script).fail_next = count;
    }

    /// Every successful `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.script).sent.clone()
    }

    /// Requested length of every `recv`, including failed ones.
    pub fn recv_requests(&self) -> Vec<usize> {
        lock(&self.script).recv_requests.clone()
    }

    /// Total number of bus transactions attempted, failed ones included.
    pub fn transactions(&self) -> usize {
        let script = lock(&self.script);
        script.sent.len() + script.failed_sends + script.recv_requests.len()
    }

    pub fn pending_responses(&self) -> usize {
        lock(&self.script).responses.len()
    }

    /// Forget recorded traffic, keeping queued responses.
    pub fn clear_history(&self) {
        let mut script = lock(&self.script);
        script.sent.clear();
        script.recv_requests.clear();
        script.failed_sends = 0;
    }
}
