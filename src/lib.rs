//! # gestic - Rust protocol engine for Microchip GestIC 3D sensors
//!
//! Talks to an MGC31x0-class gesture/position sensor over any byte
//! transport. Provides:
//! - Firmware discovery handshake at bring-up
//! - Decoding of sensor data output messages (gestures, air wheel, 3D position)
//! - Gesture to key / pointer-button pulse mapping
//! - Raw passthrough and buffered "stream" reads through a property interface
//!
//! ## Quick Start
//! ```no_run
//! use gestic::{event_channel, Device, SensorConfig, ScriptedTransport};
//! use std::time::Duration;
//!
//! let (bus, _log) = ScriptedTransport::new();
//! let (sink, events) = event_channel(256);
//! let device = Device::open(bus, sink, SensorConfig::from_env()).unwrap();
//!
//! // Call from the interrupt source whenever the sensor signals data.
//! device.interrupt();
//! if let Ok(event) = events.recv_timeout(Duration::from_millis(100)) {
//!     println!("{:?}", event);
//! }
//! ```

pub mod error;
pub mod keys;
pub mod types;
pub mod protocol;
pub mod ring;
pub mod transport;
pub mod sink;
pub mod config;
pub mod dispatch;
pub mod handshake;
pub mod stream;
pub mod control;
pub mod device;

pub use error::GesticError;
pub use types::*;
pub use config::{ActionMapping, GestureAction, SensorConfig};
pub use control::{ControlSurface, Property, Value};
pub use device::{Device, PassOutcome};
pub use ring::RingBuffer;
pub use sink::{event_channel, ChannelSink, EventStream, InputSink};
pub use stream::{StreamController, StreamMode};
pub use transport::{ScriptedTransport, Transport, TransportLog};

/// Result type alias for gestic operations.
pub type Result<T> = std::result::Result<T, GesticError>;
