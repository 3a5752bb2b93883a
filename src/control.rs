//! Property-style control surface.
//!
//! A host layer (sysfs attributes, a CLI, an IPC endpoint) reaches the
//! session only through [`ControlSurface::get`] and [`ControlSurface::set`].

use crate::config::GestureAction;
use crate::{GesticError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
    WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    StreamBufferSize,
    TouchEnable,
    ReadBufferSize,
    Gesture(GestureAction),
    ReceiveBuffer,
    SendBuffer,
}

impl Property {
    pub const ALL: [Property; 12] = [
        Property::StreamBufferSize,
        Property::TouchEnable,
        Property::ReadBufferSize,
        Property::Gesture(GestureAction::SwipeLeft),
        Property::Gesture(GestureAction::SwipeRight),
        Property::Gesture(GestureAction::SwipeUp),
        Property::Gesture(GestureAction::SwipeDown),
        Property::Gesture(GestureAction::HoverHold),
        Property::Gesture(GestureAction::CircleClockwise),
        Property::Gesture(GestureAction::CircleCounterClockwise),
        Property::ReceiveBuffer,
        Property::SendBuffer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Property::StreamBufferSize => "stream_buffer_size",
            Property::TouchEnable => "touch_enable",
            Property::ReadBufferSize => "i2c_read_buffer_size",
            Property::Gesture(GestureAction::SwipeLeft) => "air_swipe_left",
            Property::Gesture(GestureAction::SwipeRight) => "air_swipe_right",
            Property::Gesture(GestureAction::SwipeUp) => "air_swipe_up",
            Property::Gesture(GestureAction::SwipeDown) => "air_swipe_down",
            Property::Gesture(GestureAction::HoverHold) => "air_hover_hold",
            Property::Gesture(GestureAction::CircleClockwise) => "air_circle_clock",
            Property::Gesture(GestureAction::CircleCounterClockwise) => "air_circle_counterclock",
            Property::ReceiveBuffer => "receive_buffer",
            Property::SendBuffer => "send_buffer",
        }
    }

    pub fn from_name(name: &str) -> Result<Property> {
        Property::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| GesticError::UnknownProperty(name.to_string()))
    }

    pub fn access(self) -> Access {
        match self {
            Property::StreamBufferSize => Access::ReadOnly,
            Property::SendBuffer => Access::WriteOnly,
            _ => Access::ReadWrite,
        }
    }

    pub fn readable(self) -> bool {
        self.access() != Access::WriteOnly
    }

    pub fn writable(self) -> bool {
        self.access() != Access::ReadOnly
    }
}

/// Property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_int(&self, name: &'static str) -> Result<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Bytes(_) => Err(GesticError::InvalidValue {
                name,
                reason: "expected an integer".into(),
            }),
        }
    }

    pub fn as_bytes(&self, name: &'static str) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            Value::Int(_) => Err(GesticError::InvalidValue {
                name,
                reason: "expected bytes".into(),
            }),
        }
    }

    /// Parse the text form a host would write, e.g. `"106\n"`.
    pub fn parse_int(text: &str) -> Result<Value> {
        text.trim()
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| GesticError::InvalidValue {
                name: "integer property",
                reason: format!("{:?}: {}", text, e),
            })
    }
}

pub trait ControlSurface {
    fn get(&self, name: &str) -> Result<Value>;
    fn set(&self, name: &str, value: Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for p in Property::ALL {
            assert_eq!(Property::from_name(p.name()).unwrap(), p);
        }
        assert!(matches!(
            Property::from_name("air_swipe_sideways"),
            Err(GesticError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_access() {
        assert_eq!(Property::StreamBufferSize.access(), Access::ReadOnly);
        assert_eq!(Property::SendBuffer.access(), Access::WriteOnly);
        assert!(Property::ReceiveBuffer.readable() && Property::ReceiveBuffer.writable());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(Value::parse_int(" 106\n").unwrap(), Value::Int(106));
        assert!(Value::parse_int("left").is_err());
    }
}
