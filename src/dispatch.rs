//! Gesture to output policy.
//!
//! Only motion gestures (class 1) are acted on. The gesture type selects a
//! binding in the [`ActionMapping`], and the bound code decides between a key
//! pulse, a pointer button pulse, or nothing.

use crate::config::{ActionMapping, GestureAction};
use crate::keys;
use crate::sink::InputSink;
use crate::types::{GestureEvent, InputEvent, OutputAction, PointerButton, PositionSample};

/// Gesture class carrying motion gestures.
pub const CLASS_MOTION: u8 = 1;

/// Gesture types the sensor reports for each bindable gesture.
pub fn action_for_type(kind: u8) -> Option<GestureAction> {
    match kind {
        0 => Some(GestureAction::HoverHold),
        2 => Some(GestureAction::SwipeRight),
        3 => Some(GestureAction::SwipeLeft),
        4 => Some(GestureAction::SwipeUp),
        5 => Some(GestureAction::SwipeDown),
        6 => Some(GestureAction::CircleClockwise),
        7 => Some(GestureAction::CircleCounterClockwise),
        _ => None,
    }
}

/// Resolve a mapping code to an output.
pub fn action_for_code(code: i32) -> Option<OutputAction> {
    match code {
        c if (0..keys::KEY_CODE_LIMIT).contains(&c) => Some(OutputAction::KeyPulse(c as u16)),
        keys::CODE_LEFT_CLICK => Some(OutputAction::ButtonPulse(PointerButton::Left)),
        keys::CODE_MIDDLE_CLICK => Some(OutputAction::ButtonPulse(PointerButton::Middle)),
        keys::CODE_RIGHT_CLICK => Some(OutputAction::ButtonPulse(PointerButton::Right)),
        _ => None,
    }
}

/// Decide what a decoded gesture should produce.
pub fn dispatch(event: GestureEvent, mapping: &ActionMapping) -> Option<OutputAction> {
    if event.class != CLASS_MOTION {
        return None;
    }

    log::debug!(
        "Gesture type={} class={} edge_flick={} in_progress={}",
        event.kind,
        event.class,
        event.edge_flick,
        event.in_progress
    );

    let Some(gesture) = action_for_type(event.kind) else {
        log::info!("Unhandled gesture type {}", event.kind);
        return None;
    };

    let code = mapping.code(gesture);
    let action = action_for_code(code);
    match action {
        Some(a) => log::debug!("{:?} -> {:?}", gesture, a),
        None => log::debug!("{:?} bound to unused code {}", gesture, code),
    }
    action
}

/// Emit a pulse as one press/release batch.
pub fn emit_action(sink: &dyn InputSink, action: OutputAction) {
    sink.emit(&action.events());
}

/// Report an absolute position followed by a sync.
pub fn emit_position(sink: &dyn InputSink, pos: PositionSample) {
    sink.emit(&[
        InputEvent::Abs {
            x: pos.x,
            y: pos.y,
            z: pos.z,
        },
        InputEvent::Sync,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(kind: u8, class: u8) -> GestureEvent {
        GestureEvent {
            kind,
            class,
            edge_flick: false,
            in_progress: false,
        }
    }

    #[test]
    fn test_swipe_right_maps_to_key_right() {
        let mapping = ActionMapping::default();
        assert_eq!(
            dispatch(gesture(2, 1), &mapping),
            Some(OutputAction::KeyPulse(keys::KEY_RIGHT as u16))
        );
    }

    #[test]
    fn test_type_table() {
        let mapping = ActionMapping::default();
        let expected = [
            (0, keys::KEY_ENTER),
            (2, keys::KEY_RIGHT),
            (3, keys::KEY_LEFT),
            (4, keys::KEY_UP),
            (5, keys::KEY_DOWN),
            (6, keys::KEY_0),
            (7, keys::KEY_1),
        ];
        for (kind, code) in expected {
            assert_eq!(
                dispatch(gesture(kind, 1), &mapping),
                Some(OutputAction::KeyPulse(code as u16)),
                "type {}",
                kind
            );
        }
        for kind in [1, 8, 9, 10, 15] {
            assert_eq!(dispatch(gesture(kind, 1), &mapping), None);
        }
    }

    #[test]
    fn test_non_motion_class_never_dispatches() {
        let mapping = ActionMapping::default();
        for class in (0..16).filter(|&c| c != CLASS_MOTION) {
            for kind in 0..16 {
                assert_eq!(dispatch(gesture(kind, class), &mapping), None);
            }
        }
    }

    #[test]
    fn test_code_resolution() {
        assert_eq!(action_for_code(0), Some(OutputAction::KeyPulse(0)));
        assert_eq!(action_for_code(254), Some(OutputAction::KeyPulse(254)));
        assert_eq!(action_for_code(255), None);
        assert_eq!(action_for_code(-5), None);
        assert_eq!(
            action_for_code(2000),
            Some(OutputAction::ButtonPulse(PointerButton::Left))
        );
        assert_eq!(
            action_for_code(2001),
            Some(OutputAction::ButtonPulse(PointerButton::Middle))
        );
        assert_eq!(
            action_for_code(2002),
            Some(OutputAction::ButtonPulse(PointerButton::Right))
        );
        assert_eq!(action_for_code(2003), None);
    }

    #[test]
    fn test_pulse_is_press_then_release() {
        let events = OutputAction::ButtonPulse(PointerButton::Right).events();
        assert_eq!(
            events,
            [
                InputEvent::Key { code: keys::BTN_RIGHT, pressed: true },
                InputEvent::Sync,
                InputEvent::Key { code: keys::BTN_RIGHT, pressed: false },
                InputEvent::Sync,
            ]
        );
    }
}
