use crate::keys;
use crate::{GesticError, Result};

/// Default receive size for one sensor message.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 0x30;
/// Smallest read that still holds a data output header plus one byte.
pub const MIN_READ_BUFFER_SIZE: usize = crate::protocol::DATA_START + 1;
pub const MAX_READ_BUFFER_SIZE: usize = 256;

/// Gestures that can be bound to an output code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureAction {
    HoverHold,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    CircleClockwise,
    CircleCounterClockwise,
}

impl GestureAction {
    pub const ALL: [GestureAction; 7] = [
        GestureAction::HoverHold,
        GestureAction::SwipeLeft,
        GestureAction::SwipeRight,
        GestureAction::SwipeUp,
        GestureAction::SwipeDown,
        GestureAction::CircleClockwise,
        GestureAction::CircleCounterClockwise,
    ];

    /// Environment variable that overrides this gesture's code.
    pub fn env_var(self) -> &'static str {
        match self {
            GestureAction::HoverHold => "GESTIC_HOVER_HOLD",
            GestureAction::SwipeLeft => "GESTIC_SWIPE_LEFT",
            GestureAction::SwipeRight => "GESTIC_SWIPE_RIGHT",
            GestureAction::SwipeUp => "GESTIC_SWIPE_UP",
            GestureAction::SwipeDown => "GESTIC_SWIPE_DOWN",
            GestureAction::CircleClockwise => "GESTIC_CIRCLE_CW",
            GestureAction::CircleCounterClockwise => "GESTIC_CIRCLE_CCW",
        }
    }
}

/// Output code bound to each gesture.
///
/// Codes below 255 are key codes. 2000, 2001 and 2002 pulse the left, middle
/// and right pointer button. Anything else disables the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMapping {
    pub hover_hold: i32,
    pub swipe_left: i32,
    pub swipe_right: i32,
    pub swipe_up: i32,
    pub swipe_down: i32,
    pub circle_clockwise: i32,
    pub circle_counterclockwise: i32,
}

impl Default for ActionMapping {
    fn default() -> Self {
        Self {
            hover_hold: keys::KEY_ENTER,
            swipe_left: keys::KEY_LEFT,
            swipe_right: keys::KEY_RIGHT,
            swipe_up: keys::KEY_UP,
            swipe_down: keys::KEY_DOWN,
            circle_clockwise: keys::KEY_0,
            circle_counterclockwise: keys::KEY_1,
        }
    }
}

impl ActionMapping {
    pub fn code(&self, action: GestureAction) -> i32 {
        match action {
            GestureAction::HoverHold => self.hover_hold,
            GestureAction::SwipeLeft => self.swipe_left,
            GestureAction::SwipeRight => self.swipe_right,
            GestureAction::SwipeUp => self.swipe_up,
            GestureAction::SwipeDown => self.swipe_down,
            GestureAction::CircleClockwise => self.circle_clockwise,
            GestureAction::CircleCounterClockwise => self.circle_counterclockwise,
        }
    }

    fn slot(&mut self, action: GestureAction) -> &mut i32 {
        match action {
            GestureAction::HoverHold => &mut self.hover_hold,
            GestureAction::SwipeLeft => &mut self.swipe_left,
            GestureAction::SwipeRight => &mut self.swipe_right,
            GestureAction::SwipeUp => &mut self.swipe_up,
            GestureAction::SwipeDown => &mut self.swipe_down,
            GestureAction::CircleClockwise => &mut self.circle_clockwise,
            GestureAction::CircleCounterClockwise => &mut self.circle_counterclockwise,
        }
    }

    /// Rebind a gesture. Negative codes are rejected.
    pub fn set_code(&mut self, action: GestureAction, code: i32) -> Result<()> {
        if code < 0 {
            return Err(GesticError::InvalidValue {
                name: "gesture code",
                reason: format!("{} is negative", code),
            });
        }
        *self.slot(action) = code;
        Ok(())
    }
}

/// Session settings shared by the control surface and the decode worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub touch_enable: bool,
    /// Bytes clocked per sensor message read; also the oversize threshold.
    pub read_buffer_size: usize,
    pub mapping: ActionMapping,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            touch_enable: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            mapping: ActionMapping::default(),
        }
    }
}

impl SensorConfig {
    /// Defaults with overrides from `GESTIC_*` environment variables.
    ///
    /// Unset or unparsable variables keep their default; an out-of-range
    /// read buffer size is ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.touch_enable = read_env_bool("GESTIC_TOUCH_ENABLE", config.touch_enable);

        let size = read_env_usize("GESTIC_READ_BUFFER_SIZE", config.read_buffer_size);
        if let Err(e) = config.set_read_buffer_size(size) {
            log::warn!("Ignoring GESTIC_READ_BUFFER_SIZE: {}", e);
        }

        for action in GestureAction::ALL {
            let name = action.env_var();
            let code = read_env_i32(name, config.mapping.code(action));
            if let Err(e) = config.mapping.set_code(action, code) {
                log::warn!("Ignoring {}: {}", name, e);
            }
        }

        config
    }

    pub fn set_read_buffer_size(&mut self, size: usize) -> Result<()> {
        if !(MIN_READ_BUFFER_SIZE..=MAX_READ_BUFFER_SIZE).contains(&size) {
            return Err(GesticError::InvalidValue {
                name: "i2c_read_buffer_size",
                reason: format!(
                    "{} outside {}..={}",
                    size, MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE
                ),
            });
        }
        self.read_buffer_size = size;
        Ok(())
    }
}

fn read_env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| {
            let v = v.trim().to_ascii_lowercase();
            match v.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        })
        .unwrap_or(default)
}

fn read_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn read_env_i32(name: &str, default: i32) -> i32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let mapping = ActionMapping::default();
        assert_eq!(mapping.code(GestureAction::HoverHold), 28);
        assert_eq!(mapping.code(GestureAction::SwipeLeft), 105);
        assert_eq!(mapping.code(GestureAction::SwipeRight), 106);
        assert_eq!(mapping.code(GestureAction::SwipeUp), 103);
        assert_eq!(mapping.code(GestureAction::SwipeDown), 108);
        assert_eq!(mapping.code(GestureAction::CircleClockwise), 11);
        assert_eq!(mapping.code(GestureAction::CircleCounterClockwise), 2);
    }

    #[test]
    fn test_env_vars_are_distinct() {
        let mut names: Vec<_> = GestureAction::ALL.iter().map(|a| a.env_var()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), GestureAction::ALL.len());
        assert!(names.iter().all(|n| n.starts_with("GESTIC_")));
    }

    #[test]
    fn test_set_code() {
        let mut mapping = ActionMapping::default();
        mapping.set_code(GestureAction::SwipeUp, 2001).unwrap();
        assert_eq!(mapping.swipe_up, 2001);
        assert!(mapping.set_code(GestureAction::SwipeUp, -1).is_err());
        assert_eq!(mapping.swipe_up, 2001);
    }

    #[test]
    fn test_read_buffer_size_bounds() {
        let mut config = SensorConfig::default();
        assert_eq!(config.read_buffer_size, 48);
        assert!(config.set_read_buffer_size(8).is_err());
        assert!(config.set_read_buffer_size(257).is_err());
        config.set_read_buffer_size(9).unwrap();
        config.set_read_buffer_size(256).unwrap();
        assert_eq!(config.read_buffer_size, 256);
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("GESTIC_SWIPE_DOWN", " 2002 ");
        std::env::set_var("GESTIC_READ_BUFFER_SIZE", "64");
        std::env::set_var("GESTIC_CIRCLE_CW", "not-a-number");
        let config = SensorConfig::from_env();
        std::env::remove_var("GESTIC_SWIPE_DOWN");
        std::env::remove_var("GESTIC_READ_BUFFER_SIZE");
        std::env::remove_var("GESTIC_CIRCLE_CW");

        assert_eq!(config.mapping.swipe_down, 2002);
        assert_eq!(config.read_buffer_size, 64);
        assert_eq!(config.mapping.circle_clockwise, keys::KEY_0);
    }
}
