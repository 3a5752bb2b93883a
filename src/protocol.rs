use crate::types::{
    DecodedFields, FirmwareInfo, FirmwareValidity, GestureEvent, OutputConfigMask, PositionSample,
    SystemInfo,
};
use crate::{GesticError, Result};

// -- Message IDs --
pub const MSG_ID_REQUEST_MESSAGE: u8 = 0x06;
pub const MSG_ID_FW_VERSION_INFO: u8 = 0x83;
pub const MSG_ID_SENSOR_DATA_OUTPUT: u8 = 0x91;

// -- Message header geometry --
// [0] size, [1] flags, [2] sequence, [3] id, then the id-specific payload.
pub const OFFSET_SIZE: usize = 0;
pub const OFFSET_MSG_ID: usize = 3;

// Sensor data output payload:
// [4..6] output config mask (LE), [6] timestamp, [7] system info, [8..] blocks
pub const OFFSET_CONFIG_MASK: usize = 4;
pub const OFFSET_SYSTEM_INFO: usize = 7;
pub const DATA_START: usize = 8;

// -- Data block widths, in mask bit order --
pub const DSP_STATUS_LEN: usize = 2;
pub const GESTURE_LEN: usize = 4;
pub const TOUCH_LEN: usize = 4;
pub const AIR_WHEEL_LEN: usize = 2;
pub const POSITION_LEN: usize = 6;

const BLOCKS: [(OutputConfigMask, usize); 5] = [
    (OutputConfigMask::DSP_STATUS, DSP_STATUS_LEN),
    (OutputConfigMask::GESTURE, GESTURE_LEN),
    (OutputConfigMask::TOUCH, TOUCH_LEN),
    (OutputConfigMask::AIR_WHEEL, AIR_WHEEL_LEN),
    (OutputConfigMask::POSITION, POSITION_LEN),
];

// -- Firmware version info layout --
pub const OFFSET_FW_STATUS: usize = 4;
pub const OFFSET_BOOTLOADER_MINOR: usize = 10;
pub const OFFSET_BOOTLOADER_MAJOR: usize = 11;
pub const OFFSET_FW_VERSION: usize = 42;

pub const FW_STATUS_EMPTY0: u8 = 0x00;
pub const FW_STATUS_INVALID: u8 = 0x0A;
pub const FW_STATUS_VALID: u8 = 0xAA;
pub const FW_STATUS_EMPTY1: u8 = 0xFF;

// -- Commands (sent verbatim) --

/// Set runtime parameter: enable DSP, gesture, air wheel and position output.
pub const CMD_ENABLE_OUTPUTS: [u8; 16] = [
    0x10, 0x00, 0x00, 0xA2, 0xA0, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Same parameter with every output flag cleared.
pub const CMD_DISABLE_OUTPUTS: [u8; 16] = [
    0x10, 0x00, 0x00, 0xA2, 0xA0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Request message asking for firmware version info.
pub const CMD_REQUEST_FW_VERSION: [u8; 12] = [
    0x0C, 0x00, 0x00, 0x06, 0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// -- Raw passthrough --
pub const MAX_SEND_BUFFER: usize = 256;

/// Address that, with a zero payload length, requests a stream buffer read.
pub const STREAM_READ_ADDRESS: u8 = 0xFE;

/// Declared length of a received message (its first byte).
pub fn declared_len(message: &[u8]) -> usize {
    message.get(OFFSET_SIZE).copied().unwrap_or(0) as usize
}

/// Message id byte, if the message is long enough to carry one.
pub fn message_id(message: &[u8]) -> Option<u8> {
    message.get(OFFSET_MSG_ID).copied()
}

/// Bounded forward reader over a message.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let block = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(block)
    }
}

/// Decode a sensor data output message.
///
/// `payload` is the whole received message including its header. Nothing
/// past `min(declared_len, payload.len())` is read: if a block selected by the
/// output config mask would cross that bound, decoding stops and the fields
/// parsed so far are returned with `truncated` set.
///
/// DSP status and touch blocks only move the cursor. The air wheel block is
/// always skipped but its value is only reported when the system info byte
/// flags it valid.
pub fn decode_frame(payload: &[u8], declared_len: usize) -> DecodedFields {
    let end = declared_len.min(payload.len());
    let data = &payload[..end];
    let mut fields = DecodedFields::default();

    if data.is_empty() {
        return fields;
    }
    if data.len() < DATA_START {
        log::debug!(
            "Message too short for data output header ({} of {} bytes)",
            data.len(),
            DATA_START
        );
        fields.truncated = true;
        return fields;
    }

    fields.mask = OutputConfigMask::from_bits_retain(u16::from_le_bytes([
        data[OFFSET_CONFIG_MASK],
        data[OFFSET_CONFIG_MASK + 1],
    ]));
    fields.system_info = SystemInfo::from_bits_retain(data[OFFSET_SYSTEM_INFO]);

    let mut cursor = Cursor {
        data,
        pos: DATA_START,
    };

    for (bit, width) in BLOCKS {
        if !fields.mask.contains(bit) {
            continue;
        }

        let Some(block) = cursor.take(width) else {
            log::warn!(
                "Block {:?} at offset {} overruns message of {} bytes, stopping decode",
                bit,
                cursor.pos,
                data.len()
            );
            fields.truncated = true;
            break;
        };

        if bit == OutputConfigMask::GESTURE {
            let word = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
            fields.gesture = Some(GestureEvent::from_word(word));
        } else if bit == OutputConfigMask::AIR_WHEEL {
            if fields.system_info.contains(SystemInfo::AIR_WHEEL_VALID) {
                let wheel = u16::from_le_bytes([block[0], block[1]]);
                log::debug!("Air wheel {}", wheel);
                fields.air_wheel = Some(wheel);
            }
        } else if bit == OutputConfigMask::POSITION {
            fields.position = Some(PositionSample {
                x: u16::from_le_bytes([block[0], block[1]]),
                y: u16::from_le_bytes([block[2], block[3]]),
                z: u16::from_le_bytes([block[4], block[5]]),
            });
        }
    }

    fields
}

impl FirmwareValidity {
    /// Classify the version-info status byte. Unknown statuses yield `None`.
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            FW_STATUS_EMPTY0 | FW_STATUS_EMPTY1 => Some(FirmwareValidity::Empty),
            FW_STATUS_INVALID => Some(FirmwareValidity::InvalidFw),
            FW_STATUS_VALID => Some(FirmwareValidity::ValidFw),
            _ => None,
        }
    }
}

/// Parse a firmware version info message.
///
/// Returns `None` if the message is not a version response or its status
/// byte is unknown. Version fields beyond the received bytes read as zero.
pub fn parse_firmware_info(message: &[u8]) -> Option<FirmwareInfo> {
    if message_id(message)? != MSG_ID_FW_VERSION_INFO {
        return None;
    }
    let validity = FirmwareValidity::from_status(*message.get(OFFSET_FW_STATUS)?)?;
    let byte = |i: usize| message.get(i).copied().unwrap_or(0);

    let mut fw_version = [0u8; 5];
    for (i, b) in fw_version.iter_mut().enumerate() {
        *b = byte(OFFSET_FW_VERSION + i);
    }

    Some(FirmwareInfo {
        bootloader_major: byte(OFFSET_BOOTLOADER_MAJOR),
        bootloader_minor: byte(OFFSET_BOOTLOADER_MINOR),
        fw_version,
        validity,
    })
}

/// A validated raw passthrough write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRequest {
    /// `[0xFE, 0x00]`: serve the next buffered read from the stream buffer.
    StreamRead,
    /// Bytes to put on the bus: target address followed by the payload.
    Transmit(Vec<u8>),
}

/// Validate a `send_buffer` write.
///
/// Layout: `[address, payload_len, payload...]`, at most 256 bytes total.
/// The payload length byte must not promise more bytes than were supplied.
pub fn parse_send_buffer(buf: &[u8]) -> Result<SendRequest> {
    if buf.len() > MAX_SEND_BUFFER {
        return Err(GesticError::SendBufferTooLarge(buf.len()));
    }
    if buf.len() < 2 {
        return Err(GesticError::MalformedSendBuffer(format!(
            "need address and length bytes, got {} bytes",
            buf.len()
        )));
    }

    let address = buf[0];
    let payload_len = buf[1] as usize;

    if address == STREAM_READ_ADDRESS && payload_len == 0 {
        return Ok(SendRequest::StreamRead);
    }

    let payload = buf.get(2..2 + payload_len).ok_or_else(|| {
        GesticError::MalformedSendBuffer(format!(
            "length byte says {} payload bytes, only {} supplied",
            payload_len,
            buf.len() - 2
        ))
    })?;

    let mut tx = Vec::with_capacity(payload_len + 1);
    tx.push(address);
    tx.extend_from_slice(payload);
    Ok(SendRequest::Transmit(tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a data output message with a correct size byte.
    fn data_frame(mask: u16, system_info: u8, blocks: &[u8]) -> Vec<u8> {
        let [lo, hi] = mask.to_le_bytes();
        let mut msg = vec![0x00, 0x08, 0x00, MSG_ID_SENSOR_DATA_OUTPUT, lo, hi, 0x00, system_info];
        msg.extend_from_slice(blocks);
        msg[0] = msg.len() as u8;
        msg
    }

    #[test]
    fn test_position_only() {
        let msg = data_frame(0x0010, 0x00, &[0x34, 0x12, 0x01, 0x00, 0x00, 0x00]);
        let fields = decode_frame(&msg, declared_len(&msg));
        assert_eq!(
            fields.position,
            Some(PositionSample {
                x: 0x1234,
                y: 0x0001,
                z: 0x0000,
            })
        );
        assert!(fields.gesture.is_none());
        assert!(!fields.truncated);
    }

    #[test]
    fn test_gesture_only() {
        let msg = data_frame(0x0002, 0x00, &[0x12, 0x10, 0x00, 0x00]);
        let fields = decode_frame(&msg, declared_len(&msg));
        assert_eq!(
            fields.gesture,
            Some(GestureEvent {
                kind: 2,
                class: 1,
                edge_flick: false,
                in_progress: false,
            })
        );
        assert!(fields.position.is_none());
    }

    #[test]
    fn test_gesture_flags() {
        let g = GestureEvent::from_word(0x8001_2007);
        assert_eq!(g.kind, 7);
        assert_eq!(g.class, 2);
        assert!(g.edge_flick);
        assert!(g.in_progress);
    }

    #[test]
    fn test_offsets_accumulate_in_bit_order() {
        let blocks = [
            0xAA, 0xBB, // dsp status
            0x13, 0x10, 0x00, 0x00, // gesture: swipe left
            0xDE, 0xAD, 0xBE, 0xEF, // touch
            0x05, 0x01, // air wheel
            0x10, 0x00, 0x20, 0x00, 0x30, 0x00, // position
        ];
        let msg = data_frame(0x001F, SystemInfo::AIR_WHEEL_VALID.bits(), &blocks);
        let fields = decode_frame(&msg, declared_len(&msg));
        assert_eq!(fields.gesture.map(|g| g.kind), Some(3));
        assert_eq!(fields.air_wheel, Some(0x0105));
        assert_eq!(
            fields.position,
            Some(PositionSample {
                x: 0x10,
                y: 0x20,
                z: 0x30,
            })
        );
    }

    #[test]
    fn test_air_wheel_skipped_without_valid_bit() {
        let blocks = [0x05, 0x01, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
        let msg = data_frame(0x0018, 0x00, &blocks);
        let fields = decode_frame(&msg, declared_len(&msg));
        assert_eq!(fields.air_wheel, None);
        // Cursor still moved past the air wheel bytes.
        assert_eq!(fields.position, Some(PositionSample { x: 1, y: 2, z: 3 }));
    }

    #[test]
    fn test_overrun_returns_partial_fields() {
        // Gesture fits, position block is cut short.
        let msg = data_frame(0x0012, 0x00, &[0x12, 0x10, 0x00, 0x00, 0x34, 0x12, 0x01]);
        let fields = decode_frame(&msg, declared_len(&msg));
        assert!(fields.gesture.is_some());
        assert!(fields.position.is_none());
        assert!(fields.truncated);
    }

    #[test]
    fn test_declared_len_bounds_decode() {
        let mut msg = data_frame(0x0010, 0x00, &[0x34, 0x12, 0x01, 0x00, 0x00, 0x00]);
        // Sensor says the message ends before the position block.
        msg[0] = 10;
        let fields = decode_frame(&msg, declared_len(&msg));
        assert!(fields.position.is_none());
        assert!(fields.truncated);
    }

    #[test]
    fn test_short_header() {
        let fields = decode_frame(&[0x04, 0x00, 0x00, 0x91], 4);
        assert!(fields.is_empty());
        assert!(fields.truncated);
        // An idle bus reads as a zero-length message, which is not an error.
        let idle = decode_frame(&[0u8; 48], 0);
        assert!(idle.is_empty());
        assert!(!idle.truncated);
    }

    #[test]
    fn test_commands_are_bit_exact() {
        assert_eq!(CMD_ENABLE_OUTPUTS[8], 0x0A);
        assert_eq!(CMD_DISABLE_OUTPUTS[8], 0x00);
        assert_eq!(CMD_ENABLE_OUTPUTS[..8], CMD_DISABLE_OUTPUTS[..8]);
        assert_eq!(CMD_ENABLE_OUTPUTS[0] as usize, CMD_ENABLE_OUTPUTS.len());
        assert_eq!(CMD_REQUEST_FW_VERSION[0] as usize, CMD_REQUEST_FW_VERSION.len());
        assert_eq!(CMD_REQUEST_FW_VERSION[3], MSG_ID_REQUEST_MESSAGE);
        assert_eq!(CMD_REQUEST_FW_VERSION[4], MSG_ID_FW_VERSION_INFO);
    }

    #[test]
    fn test_parse_firmware_info_valid() {
        let mut msg = vec![0u8; 48];
        msg[0] = 0x84;
        msg[OFFSET_MSG_ID] = MSG_ID_FW_VERSION_INFO;
        msg[OFFSET_FW_STATUS] = FW_STATUS_VALID;
        msg[OFFSET_BOOTLOADER_MINOR] = 3;
        msg[OFFSET_BOOTLOADER_MAJOR] = 1;
        msg[42..47].copy_from_slice(&[1, 3, 14, 7, 2]);

        let info = parse_firmware_info(&msg).unwrap();
        assert!(info.is_valid());
        assert_eq!(info.bootloader_major, 1);
        assert_eq!(info.bootloader_minor, 3);
        assert_eq!(info.version_string(), "1.3.14.7.2");
    }

    #[test]
    fn test_parse_firmware_info_status_classes() {
        let mut msg = vec![0x10, 0, 0, MSG_ID_FW_VERSION_INFO, FW_STATUS_EMPTY1];
        assert_eq!(
            parse_firmware_info(&msg).map(|i| i.validity),
            Some(FirmwareValidity::Empty)
        );
        msg[4] = FW_STATUS_INVALID;
        let info = parse_firmware_info(&msg).unwrap();
        assert_eq!(info.validity, FirmwareValidity::InvalidFw);
        // Short response: version bytes were never received.
        assert_eq!(info.fw_version, [0; 5]);
        msg[4] = 0x42;
        assert!(parse_firmware_info(&msg).is_none());
        msg[3] = MSG_ID_SENSOR_DATA_OUTPUT;
        assert!(parse_firmware_info(&msg).is_none());
    }

    #[test]
    fn test_parse_send_buffer() {
        assert_eq!(
            parse_send_buffer(&[0xFE, 0x00]).unwrap(),
            SendRequest::StreamRead
        );
        assert_eq!(
            parse_send_buffer(&[0x42, 0x02, 0xAB, 0xCD, 0xEF]).unwrap(),
            SendRequest::Transmit(vec![0x42, 0xAB, 0xCD])
        );
        // 0xFE with a payload is an ordinary write.
        assert_eq!(
            parse_send_buffer(&[0xFE, 0x01, 0x07]).unwrap(),
            SendRequest::Transmit(vec![0xFE, 0x07])
        );
    }

    #[test]
    fn test_parse_send_buffer_rejects() {
        assert!(matches!(
            parse_send_buffer(&[0u8; 257]),
            Err(GesticError::SendBufferTooLarge(257))
        ));
        assert!(matches!(
            parse_send_buffer(&[0x42]),
            Err(GesticError::MalformedSendBuffer(_))
        ));
        assert!(matches!(
            parse_send_buffer(&[0x42, 0x05, 0x01]),
            Err(GesticError::MalformedSendBuffer(_))
        ));
    }
}
