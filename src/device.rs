use crate::config::SensorConfig;
use crate::control::{ControlSurface, Property, Value};
use crate::dispatch;
use crate::handshake::{FirmwareHandshake, HandshakeReport};
use crate::protocol::{self, SendRequest};
use crate::sink::InputSink;
use crate::stream::{StreamController, StreamMode};
use crate::transport::Transport;
use crate::types::{DecodedFields, FirmwareInfo, OutputAction};
use crate::{GesticError, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Software stand-in for enabling and disabling the sensor interrupt line.
#[derive(Debug, Default)]
pub struct InterruptGate {
    enabled: AtomicBool,
}

impl InterruptGate {
    /// A gate starts closed.
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Result of one decode pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Decoded {
        fields: DecodedFields,
        action: Option<OutputAction>,
        /// Raw message bytes stored in the stream buffer.
        captured: usize,
    },
    /// Declared length exceeded the read buffer; the rest was drained unread.
    Discarded { declared_len: usize, drained: usize },
}

struct Shared {
    transport: Mutex<Box<dyn Transport>>,
    config: Mutex<SensorConfig>,
    stream: Mutex<StreamController>,
    sink: Box<dyn InputSink>,
    gate: InterruptGate,
    stop_flag: AtomicBool,
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A running sensor session.
///
/// Owns the transport, the shared configuration and the stream buffer, and a
/// background worker that performs one decode pass per (coalesced) interrupt.
pub struct Device {
    shared: Arc<Shared>,
    irq_sender: Option<Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
    handshake: HandshakeReport,
}

impl Device {
    /// Bring the sensor up and start the decode worker.
    ///
    /// Runs the firmware handshake with interrupts gated off. Any failure
    /// aborts bring-up and drops everything acquired so far.
    pub fn open(
        transport: impl Transport + 'static,
        sink: impl InputSink + 'static,
        config: SensorConfig,
    ) -> Result<Device> {
        let mut transport: Box<dyn Transport> = Box::new(transport);
        let gate = InterruptGate::new();

        let handshake =
            FirmwareHandshake::new(config.read_buffer_size).run(transport.as_mut(), &gate)?;

        match handshake.firmware {
            Some(fw) => log::info!(
                "Opened GestIC sensor: bootloader {}.{} firmware {} ({:?})",
                fw.bootloader_major,
                fw.bootloader_minor,
                fw.version_string(),
                fw.validity
            ),
            None => log::warn!("Opened GestIC sensor without firmware identity"),
        }

        let shared = Arc::new(Shared {
            transport: Mutex::new(transport),
            config: Mutex::new(config),
            stream: Mutex::new(StreamController::default()),
            sink: Box::new(sink),
            gate,
            stop_flag: AtomicBool::new(false),
        });

        // Capacity 1: interrupts that arrive while a pass is pending collapse
        // into it.
        let (irq_sender, irq_receiver) = crossbeam_channel::bounded(1);
        let worker = shared.clone();
        let thread = std::thread::Builder::new()
            .name("gestic-decode".into())
            .spawn(move || decode_worker_loop(worker, irq_receiver))
            .map_err(|e| GesticError::Worker(format!("Failed to spawn decode thread: {}", e)))?;

        Ok(Device {
            shared,
            irq_sender: Some(irq_sender),
            thread: Some(thread),
            handshake,
        })
    }

    /// Signal that the sensor raised its interrupt line.
    ///
    /// Returns `true` if a decode pass was scheduled, `false` if interrupts
    /// are gated off, a pass is already pending, or the worker has stopped.
    pub fn interrupt(&self) -> bool {
        if !self.shared.gate.is_enabled() {
            log::trace!("Interrupt ignored, delivery disabled");
            return false;
        }
        let Some(sender) = &self.irq_sender else {
            return false;
        };
        match sender.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                log::trace!("Decode pass already pending, coalescing interrupt");
                false
            }
            Err(TrySendError::Disconnected(())) => false,
        }
    }

    /// Run one decode pass on the calling thread.
    pub fn decode_pass(&self) -> Result<PassOutcome> {
        run_pass(&self.shared)
    }

    /// Firmware identity discovered at bring-up.
    pub fn firmware(&self) -> Option<FirmwareInfo> {
        self.handshake.firmware
    }

    pub fn handshake_report(&self) -> &HandshakeReport {
        &self.handshake
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.shared.gate.is_enabled()
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> SensorConfig {
        lock(&self.shared.config).clone()
    }

    pub fn stream_mode(&self) -> StreamMode {
        lock(&self.shared.stream).mode()
    }

    /// External producer entry for the stream buffer.
    ///
    /// Stores the whole message or, when it does not fit, nothing.
    pub fn push_stream_bytes(&self, bytes: &[u8]) -> usize {
        lock(&self.shared.stream).push(bytes)
    }

    /// Raw passthrough write, `[address, len, payload...]`.
    ///
    /// `[0xFE, 0x00]` arms a stream buffer read without touching the bus.
    pub fn send_raw(&self, buf: &[u8]) -> Result<()> {
        match protocol::parse_send_buffer(buf)? {
            SendRequest::StreamRead => {
                lock(&self.shared.stream).enter_streaming();
                Ok(())
            }
            SendRequest::Transmit(tx) => {
                log::debug!("Raw send to 0x{:02x}, {} payload bytes", tx[0], tx.len() - 1);
                lock(&self.shared.transport).send(&tx)
            }
        }
    }

    /// Serve a buffered read of the pending length.
    pub fn buffered_read(&self) -> Result<Vec<u8>> {
        let mut stream = lock(&self.shared.stream);
        let mut transport = lock(&self.shared.transport);
        stream.read(transport.as_mut())
    }

    /// Stop the decode worker and wait for it to finish.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shared.stop_flag.store(true, Ordering::Relaxed);
        self.shared.gate.disable();
        drop(self.irq_sender.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ControlSurface for Device {
    fn get(&self, name: &str) -> Result<Value> {
        let prop = Property::from_name(name)?;
        if !prop.readable() {
            return Err(GesticError::WriteOnly(prop.name()));
        }

        let value = match prop {
            Property::StreamBufferSize => {
                let available = lock(&self.shared.stream).available();
                Value::Int(i32::try_from(available).unwrap_or(i32::MAX))
            }
            Property::TouchEnable => Value::Int(lock(&self.shared.config).touch_enable as i32),
            Property::ReadBufferSize => {
                Value::Int(lock(&self.shared.config).read_buffer_size as i32)
            }
            Property::Gesture(action) => Value::Int(lock(&self.shared.config).mapping.code(action)),
            Property::ReceiveBuffer => Value::Bytes(self.buffered_read()?),
            Property::SendBuffer => return Err(GesticError::WriteOnly(prop.name())),
        };
        Ok(value)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        let prop = Property::from_name(name)?;
        if !prop.writable() {
            return Err(GesticError::ReadOnly(prop.name()));
        }

        match prop {
            Property::TouchEnable => {
                let v = value.as_int(prop.name())?;
                lock(&self.shared.config).touch_enable = v != 0;
                log::info!("touch_enable set to {}", v);
            }
            Property::ReadBufferSize => {
                let v = value.as_int(prop.name())?;
                let size = usize::try_from(v).map_err(|_| GesticError::InvalidValue {
                    name: prop.name(),
                    reason: format!("{} is negative", v),
                })?;
                lock(&self.shared.config).set_read_buffer_size(size)?;
                log::info!("i2c_read_buffer_size set to {}", size);
            }
            Property::Gesture(action) => {
                let v = value.as_int(prop.name())?;
                lock(&self.shared.config)
                    .mapping
                    .set_code(action, v)
                    .map_err(|_| GesticError::InvalidValue {
                        name: prop.name(),
                        reason: format!("{} is negative", v),
                    })?;
                log::info!("{} set to {}", prop.name(), v);
            }
            Property::ReceiveBuffer => {
                let v = value.as_int(prop.name())?;
                let len = usize::try_from(v).map_err(|_| GesticError::InvalidValue {
                    name: prop.name(),
                    reason: format!("{} is negative", v),
                })?;
                lock(&self.shared.stream).set_pending_len(len)?;
            }
            Property::SendBuffer => self.send_raw(value.as_bytes(prop.name())?)?,
            Property::StreamBufferSize => return Err(GesticError::ReadOnly(prop.name())),
        }
        Ok(())
    }
}

/// One interrupt's worth of work: read, decode, dispatch, capture.
///
/// Holds the transport lock only for the bus reads so control-surface
/// transactions interleave between passes, never inside one.
fn run_pass(shared: &Shared) -> Result<PassOutcome> {
    let config = lock(&shared.config).clone();
    let capacity = config.read_buffer_size;

    let message = {
        let mut transport = lock(&shared.transport);
        let message = transport.recv(capacity)?;
        let declared = protocol::declared_len(&message);
        if declared > capacity {
            let drained = transport.recv(declared - capacity)?.len();
            log::debug!(
                "Message of {} bytes exceeds read buffer of {}, drained {} bytes unread",
                declared,
                capacity,
                drained
            );
            return Ok(PassOutcome::Discarded {
                declared_len: declared,
                drained,
            });
        }
        message
    };

    let declared = protocol::declared_len(&message);
    let fields = protocol::decode_frame(&message, declared);
    let sink = shared.sink.as_ref();

    let action = fields
        .gesture
        .and_then(|g| dispatch::dispatch(g, &config.mapping));
    if let Some(action) = action {
        dispatch::emit_action(sink, action);
    }
    if let Some(position) = fields.position {
        dispatch::emit_position(sink, position);
    }

    let end = declared.min(message.len());
    let captured = if end > 0 {
        lock(&shared.stream).push(&message[..end])
    } else {
        0
    };

    Ok(PassOutcome::Decoded {
        fields,
        action,
        captured,
    })
}

/// The decode worker runs in a dedicated thread, one pass per wakeup.
fn decode_worker_loop(shared: Arc<Shared>, irq_receiver: Receiver<()>) {
    log::info!("Decode worker started");

    while irq_receiver.recv().is_ok() {
        if shared.stop_flag.load(Ordering::Relaxed) {
            break;
        }
        match run_pass(&shared) {
            Ok(PassOutcome::Decoded { fields, .. }) if fields.truncated => {
                log::debug!("Decoded partial message: {:?}", fields);
            }
            Ok(outcome) => log::trace!("Decode pass: {:?}", outcome),
            Err(e) => log::warn!("Decode pass aborted: {}", e),
        }
    }

    log::info!("Decode worker stopping");
}
