//! Bring-up exchange that discovers the sensor firmware.
//!
//! Outputs are switched off, the version info is requested, and up to
//! [`HANDSHAKE_ATTEMPTS`] non-empty responses are classified before outputs
//! are switched back on. Interrupt delivery stays off for the whole
//! exchange. The final enable runs whether or not a valid image was seen.

use crate::device::InterruptGate;
use crate::protocol::{self, MSG_ID_FW_VERSION_INFO};
use crate::transport::Transport;
use crate::types::FirmwareInfo;
use crate::Result;

/// Responses classified before giving up on the exchange.
pub const HANDSHAKE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    DisableOutputs,
    RequestVersion,
    AwaitResponse,
    Classify,
    Continue,
    Stop,
    EnableOutputs,
}

/// What the handshake observed.
#[derive(Debug, Clone, Default)]
pub struct HandshakeReport {
    /// First valid image seen, otherwise the last classified one.
    pub firmware: Option<FirmwareInfo>,
    /// Non-empty responses examined.
    pub responses: usize,
    /// Responses that reported an empty or invalid image.
    pub invalid_reports: usize,
    /// States in the order they were entered.
    pub trace: Vec<HandshakeState>,
}

pub struct FirmwareHandshake {
    read_size: usize,
    attempts: usize,
}

impl FirmwareHandshake {
    pub fn new(read_size: usize) -> Self {
        Self {
            read_size,
            attempts: HANDSHAKE_ATTEMPTS,
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Run the exchange to its terminal state.
    ///
    /// Receive failures end the classify loop early. Send failures are fatal
    /// and leave the interrupt gate closed.
    pub fn run(
        &self,
        transport: &mut dyn Transport,
        gate: &InterruptGate,
    ) -> Result<HandshakeReport> {
        gate.disable();

        let mut report = HandshakeReport::default();
        let mut response = Vec::new();
        let mut remaining = self.attempts;
        let mut state = HandshakeState::DisableOutputs;

        loop {
            report.trace.push(state);
            state = match state {
                HandshakeState::DisableOutputs => {
                    transport.send(&protocol::CMD_DISABLE_OUTPUTS)?;
                    log::info!("Disabled sensor outputs");
                    HandshakeState::RequestVersion
                }
                HandshakeState::RequestVersion => {
                    transport.send(&protocol::CMD_REQUEST_FW_VERSION)?;
                    log::info!("Requested firmware version");
                    HandshakeState::AwaitResponse
                }
                HandshakeState::AwaitResponse => match transport.recv(self.read_size) {
                    Ok(bytes) => {
                        response = bytes;
                        HandshakeState::Classify
                    }
                    Err(e) => {
                        log::warn!("Firmware version read failed: {}", e);
                        HandshakeState::Stop
                    }
                },
                HandshakeState::Classify => {
                    if protocol::declared_len(&response) == 0 || remaining == 0 {
                        HandshakeState::Stop
                    } else {
                        self.classify(&response, &mut report);
                        remaining -= 1;
                        HandshakeState::Continue
                    }
                }
                HandshakeState::Continue => match transport.recv(self.read_size) {
                    Ok(bytes) => {
                        response = bytes;
                        if remaining > 0 {
                            HandshakeState::Classify
                        } else {
                            HandshakeState::Stop
                        }
                    }
                    Err(e) => {
                        log::warn!("Firmware handshake read failed: {}", e);
                        HandshakeState::Stop
                    }
                },
                HandshakeState::Stop => HandshakeState::EnableOutputs,
                HandshakeState::EnableOutputs => {
                    gate.enable();
                    log::info!("Enabled interrupts");
                    transport.send(&protocol::CMD_ENABLE_OUTPUTS)?;
                    log::info!("Enabled sensor outputs");
                    break;
                }
            };
        }

        Ok(report)
    }

    fn classify(&self, response: &[u8], report: &mut HandshakeReport) {
        report.responses += 1;
        let size = protocol::declared_len(response);
        let id = protocol::message_id(response).unwrap_or(0);

        if id != MSG_ID_FW_VERSION_INFO {
            log::info!("Msg size 0x{:02x} Msg ID 0x{:02x}", size, id);
            return;
        }

        let Some(info) = protocol::parse_firmware_info(response) else {
            log::debug!(
                "Unrecognised firmware status 0x{:02x}",
                response.get(protocol::OFFSET_FW_STATUS).copied().unwrap_or(0)
            );
            return;
        };

        if info.is_valid() {
            log::info!("Valid firmware image found on device");
            log::info!("Msg size 0x{:02x} Msg ID 0x{:02x}", size, id);
            log::info!(
                "Bootloader version {}.{}",
                info.bootloader_major,
                info.bootloader_minor
            );
            log::info!("Firmware revision {}", info.version_string());
        } else {
            report.invalid_reports += 1;
            log::warn!(
                "no valid firmware on device ({:?}), reload a valid image",
                info.validity
            );
        }

        let keep_previous = report.firmware.is_some_and(|f| f.is_valid());
        if !keep_previous {
            report.firmware = Some(info);
        }
    }
}
