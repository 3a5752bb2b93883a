//! Platform input codes used by the default gesture mapping.

pub const KEY_1: i32 = 2;
pub const KEY_0: i32 = 11;
pub const KEY_ENTER: i32 = 28;
pub const KEY_UP: i32 = 103;
pub const KEY_LEFT: i32 = 105;
pub const KEY_RIGHT: i32 = 106;
pub const KEY_DOWN: i32 = 108;

/// Key codes below this value are sent as key pulses.
pub const KEY_CODE_LIMIT: i32 = 255;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;

// Reserved mapping codes that pulse a pointer button instead of a key.
pub const CODE_LEFT_CLICK: i32 = 2000;
pub const CODE_MIDDLE_CLICK: i32 = 2001;
pub const CODE_RIGHT_CLICK: i32 = 2002;
