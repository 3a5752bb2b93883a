/// One gesture report decoded from the 32-bit gesture word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEvent {
    /// Gesture type, bits [0:4).
    pub kind: u8,
    /// Gesture class, bits [12:16). Class 1 is a motion gesture.
    pub class: u8,
    /// Edge flick flag, bit 16.
    pub edge_flick: bool,
    /// Gesture still in progress, bit 31.
    pub in_progress: bool,
}

impl GestureEvent {
    /// Split a gesture word into its fields.
    pub fn from_word(word: u32) -> Self {
        Self {
            kind: (word & 0x0000_000F) as u8,
            class: ((word & 0x0000_F000) >> 12) as u8,
            edge_flick: word & 0x0001_0000 != 0,
            in_progress: word & 0x8000_0000 != 0,
        }
    }
}

/// Absolute hand position. Each axis spans 0..=0x7FFF on a healthy sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSample {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

/// Fields extracted from one sensor data-output message.
///
/// Everything is optional: the output config mask decides which blocks are
/// present, and a short message may end before all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFields {
    pub mask: OutputConfigMask,
    pub system_info: SystemInfo,
    pub gesture: Option<GestureEvent>,
    pub air_wheel: Option<u16>,
    pub position: Option<PositionSample>,
    /// Set when a block would have run past the end of the message.
    pub truncated: bool,
}

impl DecodedFields {
    /// True when nothing usable was extracted.
    pub fn is_empty(&self) -> bool {
        self.gesture.is_none() && self.air_wheel.is_none() && self.position.is_none()
    }
}

bitflags::bitflags! {
    /// Output config mask: which data blocks follow the message header.
    ///
    /// Blocks appear in bit order, so offsets accumulate from DSP status up
    /// to 3D position.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct OutputConfigMask: u16 {
        const DSP_STATUS  = 1 << 0;
        const GESTURE     = 1 << 1;
        const TOUCH       = 1 << 2;
        const AIR_WHEEL   = 1 << 3;
        const POSITION    = 1 << 4;
    }
}

bitflags::bitflags! {
    /// System info byte sent right before the data blocks.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SystemInfo: u8 {
        const POSITION_VALID      = 1 << 0;
        const AIR_WHEEL_VALID     = 1 << 1;
        const RAW_DATA_VALID      = 1 << 2;
        const NOISE_POWER_VALID   = 1 << 3;
        const ENVIRONMENTAL_NOISE = 1 << 4;
        const CLIPPING            = 1 << 5;
        const DSP_RUNNING         = 1 << 7;
    }
}

/// Firmware image state reported in the version-info status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareValidity {
    /// Flash is blank (status 0x00 or 0xFF).
    Empty,
    /// An incomplete or corrupt image (status 0x0A).
    InvalidFw,
    /// A complete image (status 0xAA).
    ValidFw,
}

/// Firmware identity returned by the version request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub bootloader_major: u8,
    pub bootloader_minor: u8,
    pub fw_version: [u8; 5],
    pub validity: FirmwareValidity,
}

impl FirmwareInfo {
    pub fn is_valid(&self) -> bool {
        self.validity == FirmwareValidity::ValidFw
    }

    /// Dotted firmware revision, e.g. `1.3.14.7.2`.
    pub fn version_string(&self) -> String {
        self.fw_version
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Pointer buttons reachable through the reserved mapping codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

impl PointerButton {
    /// Platform event code for the button.
    pub fn code(self) -> u16 {
        match self {
            PointerButton::Left => crate::keys::BTN_LEFT,
            PointerButton::Right => crate::keys::BTN_RIGHT,
            PointerButton::Middle => crate::keys::BTN_MIDDLE,
        }
    }
}

/// What a dispatched gesture turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    /// Key press immediately followed by release.
    KeyPulse(u16),
    /// Pointer button press immediately followed by release.
    ButtonPulse(PointerButton),
}

impl OutputAction {
    /// The event batch for this action: press, sync, release, sync.
    pub fn events(self) -> [InputEvent; 4] {
        let code = match self {
            OutputAction::KeyPulse(code) => code,
            OutputAction::ButtonPulse(button) => button.code(),
        };
        [
            InputEvent::Key { code, pressed: true },
            InputEvent::Sync,
            InputEvent::Key { code, pressed: false },
            InputEvent::Sync,
        ]
    }
}

/// Events delivered to the input sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { code: u16, pressed: bool },
    Abs { x: u16, y: u16, z: u16 },
    Sync,
}
