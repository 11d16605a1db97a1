//! # Platform Module
//!
//! The seam between the bridge and the browser-style environment it runs in.
//!
//! ## Plain English
//!
//! The bridge never pokes at `navigator`, `window` or the canvas directly.
//! Everything it needs from the outside world is one of these traits:
//!
//! ```text
//!   DisplayEnumerator  -> "which headsets are there?"
//!   VrDisplay          -> one headset: poses, eye sizes, present/exit
//!   GamepadSource      -> controller slots
//!   RenderSurface      -> the canvas and the browser window
//!   TickSource         -> the page's normal frame clock
//!   HostSink           -> the pipe into the rendering host
//! ```
//!
//! A real build wires these to web APIs; tests and the demo use the
//! in-memory versions in [`simulated`].

pub mod simulated;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::bridge::HostMessage;

// ============================================
// ASYNC BOUNDARY
// ============================================

/// Error reported by the platform at an asynchronous boundary
///
/// Carries whatever message the environment gave us (a rejected promise's
/// reason, typically).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    /// Creates a platform error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A pending platform request (promise-like)
pub type PlatformFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PlatformError>> + 'a>>;

/// Opaque id returned by a frame clock for a scheduled callback
pub type TickHandle = u64;

// ============================================
// DISPLAY DATA
// ============================================

/// Which eye a parameter set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

/// Capability flags reported by a display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// The display can present stereo frames
    pub can_present: bool,
}

/// Render target size recommended for one eye
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EyeParameters {
    pub render_width: u32,
    pub render_height: u32,
}

/// Room-scale play area data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageParameters {
    /// Column-major 4x4 transform from seated to standing space
    pub sitting_to_standing_transform: [f32; 16],
}

/// One frame report as the display produces it
///
/// All four matrices are flat, column-major, in the display's own
/// convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrameData {
    pub left_projection_matrix: [f32; 16],
    pub right_projection_matrix: [f32; 16],
    pub left_view_matrix: [f32; 16],
    pub right_view_matrix: [f32; 16],
}

// ============================================
// GAMEPAD DATA
// ============================================

/// One button as the gamepad API reports it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawButton {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

/// Pose block of a tracked gamepad; any field may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPose {
    pub position: Option<[f32; 3]>,
    pub orientation: Option<[f32; 4]>,
    pub linear_velocity: Option<[f32; 3]>,
    pub angular_velocity: Option<[f32; 3]>,
}

/// One gamepad slot as the gamepad API reports it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGamepad {
    /// Stable slot index
    pub index: u32,
    /// "left", "right" or "" when the platform doesn't know
    pub hand: String,
    /// Id of the VR display this pad belongs to, if any
    pub display_id: Option<u32>,
    /// Pose, if the pad is tracked
    pub pose: Option<RawPose>,
    pub buttons: Vec<RawButton>,
}

// ============================================
// SURFACE DATA
// ============================================

/// Pixel size of the window or render surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// CSS-style scale applied to the page container so the stereo canvas fits
/// the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorScale {
    pub x: f32,
    pub y: f32,
}

// ============================================
// TRAITS
// ============================================

/// Enumerates VR displays (the `navigator.getVRDisplays` side)
pub trait DisplayEnumerator {
    /// False when the environment has no VR enumeration at all.
    fn supports_enumeration(&self) -> bool;

    /// False when the environment cannot produce per-frame pose reports.
    fn supports_frame_data(&self) -> bool;

    /// Lists displays in platform order.
    fn get_displays(&self) -> PlatformFuture<'_, Vec<Arc<dyn VrDisplay>>>;
}

/// One VR display
pub trait VrDisplay {
    fn display_name(&self) -> &str;

    fn device_id(&self) -> Option<&str> {
        None
    }

    fn device_name(&self) -> Option<&str> {
        None
    }

    /// Legacy hardware id; only emulated displays still set it.
    fn hardware_unit_id(&self) -> Option<&str> {
        None
    }

    /// Explicit "I am emulated" flag, when the platform offers one.
    fn is_polyfilled(&self) -> bool {
        false
    }

    fn capabilities(&self) -> DisplayCapabilities;

    /// The display's own view of whether it is presenting.
    fn is_presenting(&self) -> bool;

    fn eye_parameters(&self, eye: Eye) -> EyeParameters;

    fn stage_parameters(&self) -> Option<StageParameters>;

    /// Current frame report, or `None` before the display has one.
    fn frame_data(&self) -> Option<RawFrameData>;

    /// Schedules a callback on the display's refresh clock.
    fn request_animation_frame(&self) -> TickHandle;

    /// Hands the last rendered frame to the headset.
    fn submit_frame(&self);

    fn request_present(&self) -> PlatformFuture<'_, ()>;

    fn exit_present(&self) -> PlatformFuture<'_, ()>;
}

/// Gamepad slots (the `navigator.getGamepads` side)
pub trait GamepadSource {
    /// All slots in enumeration order; empty slots are `None`.
    fn gamepads(&self) -> Vec<Option<RawGamepad>>;
}

/// The canvas the host renders into, plus the window around it
pub trait RenderSurface {
    fn window_size(&self) -> SurfaceSize;

    fn set_size(&self, size: SurfaceSize);

    /// `None` clears any scaling.
    fn set_mirror_scale(&self, scale: Option<MirrorScale>);

    fn request_fullscreen(&self) -> PlatformFuture<'_, ()>;

    fn exit_fullscreen(&self) -> PlatformFuture<'_, ()>;
}

/// A frame clock that can schedule the next tick
pub trait TickSource {
    fn request_tick(&self) -> TickHandle;
}

/// Delivers messages into the rendering host
pub trait HostSink {
    /// Fire-and-forget.
    fn deliver(&self, message: &HostMessage);
}

// ============================================
// PLATFORM BUNDLE
// ============================================

/// Everything the bridge needs from its environment
#[derive(Clone)]
pub struct Platform {
    pub displays: Arc<dyn DisplayEnumerator>,
    pub gamepads: Arc<dyn GamepadSource>,
    pub surface: Arc<dyn RenderSurface>,
    pub ambient_clock: Arc<dyn TickSource>,
    pub host: Arc<dyn HostSink>,
}
