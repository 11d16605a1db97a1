//! # Input Aggregator Module
//!
//! Controller pose and button polling, once per tick.
//!
//! ## Plain English
//!
//! Every frame we ask the gamepad API for all controllers, throw away the
//! ones that aren't fully tracked, and flip the survivors into the rendering
//! host's coordinate convention:
//!
//! ```text
//!   position          (x, y, z)      -> (x, y, -z)
//!   linear velocity   (x, y, z)      -> (x, y, -z)
//!   angular velocity  (x, y, z)      -> (x, y, -z)
//!   orientation       (x, y, z, w)   -> (-x, -y, z, w)
//! ```
//!
//! This is the controller twin of the view-matrix Z flip in the pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::platform::{GamepadSource, RawButton, RawGamepad};

// ============================================
// CONTROLLER SNAPSHOT
// ============================================

/// Which hand holds a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hand {
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    /// Platform didn't say
    #[serde(rename = "")]
    Unknown,
}

impl Hand {
    /// Parses the gamepad API's hand string.
    pub fn from_label(label: &str) -> Self {
        match label {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Unknown,
        }
    }
}

/// State of one button, copied verbatim
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

impl From<&RawButton> for ButtonState {
    fn from(button: &RawButton) -> Self {
        Self {
            pressed: button.pressed,
            touched: button.touched,
            value: button.value,
        }
    }
}

/// One fully tracked controller, already in host convention
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub index: u32,
    pub hand: Hand,
    pub buttons: Vec<ButtonState>,
    pub orientation: [f32; 4],
    pub position: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_velocity: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angular_velocity: Option<[f32; 3]>,
}

impl ControllerSnapshot {
    /// Converts one gamepad, or returns `None` if it isn't fully tracked.
    ///
    /// A pad qualifies when it has a pose block (or is tied to a display)
    /// AND that pose carries both position and orientation.
    pub fn from_gamepad(gamepad: &RawGamepad) -> Option<Self> {
        if gamepad.pose.is_none() && gamepad.display_id.is_none() {
            return None;
        }
        let pose = gamepad.pose.as_ref()?;
        let position = pose.position?;
        let orientation = pose.orientation?;

        Some(Self {
            index: gamepad.index,
            hand: Hand::from_label(&gamepad.hand),
            buttons: gamepad.buttons.iter().map(ButtonState::from).collect(),
            orientation: flip_orientation(orientation),
            position: flip_z(position),
            linear_velocity: pose.linear_velocity.map(flip_z),
            angular_velocity: pose.angular_velocity.map(flip_z),
        })
    }
}

fn flip_z([x, y, z]: [f32; 3]) -> [f32; 3] {
    [x, y, -z]
}

fn flip_orientation([x, y, z, w]: [f32; 4]) -> [f32; 4] {
    [-x, -y, z, w]
}

// ============================================
// INPUT AGGREGATOR
// ============================================

/// Polls gamepads each tick
pub struct InputAggregator {
    source: Arc<dyn GamepadSource>,

    /// Controllers in the last poll, for the UI's controller icon count
    last_count: AtomicUsize,
}

impl InputAggregator {
    pub fn new(source: Arc<dyn GamepadSource>) -> Self {
        Self {
            source,
            last_count: AtomicUsize::new(0),
        }
    }

    /// Reads all gamepads and returns the tracked ones, in slot order.
    pub fn poll(&self) -> Vec<ControllerSnapshot> {
        let controllers: Vec<ControllerSnapshot> = self
            .source
            .gamepads()
            .iter()
            .flatten()
            .filter_map(ControllerSnapshot::from_gamepad)
            .collect();

        let previous = self.last_count.swap(controllers.len(), Ordering::Relaxed);
        if previous != controllers.len() {
            log::info!(
                "Tracked controllers changed: {} -> {}",
                previous,
                controllers.len()
            );
        }

        controllers
    }

    /// Number of controllers seen by the last `poll`.
    pub fn controller_count(&self) -> usize {
        self.last_count.load(Ordering::Relaxed)
    }
}

// ============================================
// TESTS
// ============================================
