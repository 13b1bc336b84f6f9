//! Pointer, wheel and window events fed to the viewer.
//!
//! | gesture                              | effect              |
//! |--------------------------------------|---------------------|
//! | wheel                                | pan                 |
//! | wheel + zoom modifier (ctrl / meta)  | dolly in or out     |
//! | middle drag, or primary drag + pan modifier (alt) | pan    |
//!
//! Trackpad pinches arrive as wheel events with the zoom modifier set and
//! very small deltas; those are amplified so pinching feels as fast as a
//! mouse wheel.

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl or meta: turns wheel scrolling into zoom.
    pub zoom: bool,
    /// Alt: turns a primary-button drag into a pan.
    pub pan: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        zoom: false,
        pan: false,
    };
    pub const ZOOM: Self = Self {
        zoom: true,
        pan: false,
    };
    pub const PAN: Self = Self {
        zoom: false,
        pan: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Input in screen pixels, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Wheel {
        dx: f64,
        dy: f64,
        modifiers: Modifiers,
    },
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        button: PointerButton,
    },
    /// The pointer left the drawing surface.
    PointerLeave,
    Resize {
        width: f64,
        height: f64,
    },
}

/// Tuning for wheel gestures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelConfig {
    /// Zoom deltas smaller than this (in pixels) count as pinch steps.
    pub pinch_threshold: f64,
    /// Multiplier applied to pinch steps.
    pub pinch_amplification: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 10.0,
            pinch_amplification: 8.0,
        }
    }
}

/// Camera motion requested by a wheel event, as `Camera::dolly` arguments.
pub fn wheel_motion(dx: f64, dy: f64, modifiers: Modifiers, config: &WheelConfig) -> (f64, f64, f64) {
    if modifiers.zoom {
        let dz = if dy.abs() < config.pinch_threshold {
            dy * config.pinch_amplification
        } else {
            dy
        };
        (0.0, 0.0, dz)
    } else {
        (dx, dy, 0.0)
    }
}

/// Whether a button press starts a pan drag.
pub fn starts_drag(button: PointerButton, modifiers: Modifiers) -> bool {
    match button {
        PointerButton::Middle => true,
        PointerButton::Primary => modifiers.pan,
        PointerButton::Secondary => false,
    }
}
