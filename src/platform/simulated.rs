//! # Simulated Platform
//!
//! In-memory implementations of every platform trait.
//! Used by the demo and the unit tests when no browser is around.
//!
//! ## Plain English
//!
//! A fake headset, fake controllers, a fake window and a fake rendering
//! host that writes down every message it receives. Each piece can be told
//! to misbehave (reject presentation, have no frame yet, refuse fullscreen)
//! so the error paths get exercised too.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;

use super::{
    DisplayCapabilities, DisplayEnumerator, Eye, EyeParameters, GamepadSource, HostSink,
    MirrorScale, Platform, PlatformError, PlatformFuture, RawFrameData, RawGamepad,
    RenderSurface, StageParameters, SurfaceSize, TickHandle, TickSource, VrDisplay,
};
use crate::bridge::HostMessage;

/// Column-major identity, handy for building frame reports.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

// ============================================
// YIELD HELPER
// ============================================

/// Future that returns `Pending` once before completing, so callers can
/// observe a request while it is still outstanding.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

fn yield_once() -> YieldOnce {
    YieldOnce { yielded: false }
}

// ============================================
// SIMULATED DISPLAY
// ============================================

/// Mutable state of a simulated headset
#[derive(Debug, Clone)]
struct DisplayState {
    capabilities: DisplayCapabilities,
    presenting: bool,
    left_eye: EyeParameters,
    right_eye: EyeParameters,
    stage: Option<StageParameters>,
    frame: Option<RawFrameData>,
    reject_present: Option<String>,
    reject_exit: Option<String>,
}

/// A fake VR headset
pub struct SimulatedDisplay {
    display_name: String,
    device_id: Option<String>,
    device_name: Option<String>,
    hardware_unit_id: Option<String>,
    polyfilled: bool,
    state: Mutex<DisplayState>,
    present_requests: AtomicU64,
    exit_requests: AtomicU64,
    frames_submitted: AtomicU64,
    ticks_requested: AtomicU64,
}

impl SimulatedDisplay {
    /// Creates a presentable headset with typical eye sizes and a neutral
    /// frame report.
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            device_id: None,
            device_name: None,
            hardware_unit_id: None,
            polyfilled: false,
            state: Mutex::new(DisplayState {
                capabilities: DisplayCapabilities { can_present: true },
                presenting: false,
                left_eye: EyeParameters {
                    render_width: 1512,
                    render_height: 1680,
                },
                right_eye: EyeParameters {
                    render_width: 1512,
                    render_height: 1680,
                },
                stage: None,
                frame: Some(RawFrameData {
                    left_projection_matrix: IDENTITY,
                    right_projection_matrix: IDENTITY,
                    left_view_matrix: IDENTITY,
                    right_view_matrix: IDENTITY,
                }),
                reject_present: None,
                reject_exit: None,
            }),
            present_requests: AtomicU64::new(0),
            exit_requests: AtomicU64::new(0),
            frames_submitted: AtomicU64::new(0),
            ticks_requested: AtomicU64::new(0),
        }
    }

    pub fn with_device_id(mut self, id: &str) -> Self {
        self.device_id = Some(id.to_string());
        self
    }

    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = Some(name.to_string());
        self
    }

    pub fn with_hardware_unit_id(mut self, id: &str) -> Self {
        self.hardware_unit_id = Some(id.to_string());
        self
    }

    pub fn polyfilled(mut self) -> Self {
        self.polyfilled = true;
        self
    }

    pub fn with_can_present(self, can_present: bool) -> Self {
        self.state.lock().capabilities.can_present = can_present;
        self
    }

    pub fn with_eyes(self, left: EyeParameters, right: EyeParameters) -> Self {
        {
            let mut state = self.state.lock();
            state.left_eye = left;
            state.right_eye = right;
        }
        self
    }

    pub fn with_stage(self, stage: StageParameters) -> Self {
        self.state.lock().stage = Some(stage);
        self
    }

    /// Replaces the frame report returned from now on.
    pub fn set_frame(&self, frame: Option<RawFrameData>) {
        self.state.lock().frame = frame;
    }

    /// Makes the next present requests fail with `reason` (or succeed again
    /// with `None`).
    pub fn set_reject_present(&self, reason: Option<&str>) {
        self.state.lock().reject_present = reason.map(str::to_string);
    }

    pub fn set_reject_exit(&self, reason: Option<&str>) {
        self.state.lock().reject_exit = reason.map(str::to_string);
    }

    pub fn present_requests(&self) -> u64 {
        self.present_requests.load(Ordering::SeqCst)
    }

    pub fn exit_requests(&self) -> u64 {
        self.exit_requests.load(Ordering::SeqCst)
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted.load(Ordering::SeqCst)
    }

    pub fn ticks_requested(&self) -> u64 {
        self.ticks_requested.load(Ordering::SeqCst)
    }
}

impl VrDisplay for SimulatedDisplay {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    fn hardware_unit_id(&self) -> Option<&str> {
        self.hardware_unit_id.as_deref()
    }

    fn is_polyfilled(&self) -> bool {
        self.polyfilled
    }

    fn capabilities(&self) -> DisplayCapabilities {
        self.state.lock().capabilities
    }

    fn is_presenting(&self) -> bool {
        self.state.lock().presenting
    }

    fn eye_parameters(&self, eye: Eye) -> EyeParameters {
        let state = self.state.lock();
        match eye {
            Eye::Left => state.left_eye,
            Eye::Right => state.right_eye,
        }
    }

    fn stage_parameters(&self) -> Option<StageParameters> {
        self.state.lock().stage
    }

    fn frame_data(&self) -> Option<RawFrameData> {
        self.state.lock().frame
    }

    fn request_animation_frame(&self) -> TickHandle {
        self.ticks_requested.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn submit_frame(&self) {
        self.frames_submitted.fetch_add(1, Ordering::SeqCst);
    }

    fn request_present(&self) -> PlatformFuture<'_, ()> {
        self.present_requests.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            yield_once().await;
            let mut state = self.state.lock();
            if let Some(reason) = state.reject_present.clone() {
                return Err(PlatformError::new(reason));
            }
            state.presenting = true;
            Ok(())
        })
    }

    fn exit_present(&self) -> PlatformFuture<'_, ()> {
        self.exit_requests.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            yield_once().await;
            let mut state = self.state.lock();
            if let Some(reason) = state.reject_exit.clone() {
                return Err(PlatformError::new(reason));
            }
            state.presenting = false;
            Ok(())
        })
    }
}

// ============================================
// SIMULATED ENVIRONMENT
// ============================================

/// Fake `navigator` with a fixed display list
pub struct SimulatedEnvironment {
    displays: Mutex<Vec<Arc<SimulatedDisplay>>>,
    supports_enumeration: bool,
    supports_frame_data: bool,
}

impl SimulatedEnvironment {
    pub fn new(displays: Vec<Arc<SimulatedDisplay>>) -> Self {
        Self {
            displays: Mutex::new(displays),
            supports_enumeration: true,
            supports_frame_data: true,
        }
    }

    /// An environment with no WebVR at all.
    pub fn unsupported() -> Self {
        Self {
            displays: Mutex::new(Vec::new()),
            supports_enumeration: false,
            supports_frame_data: false,
        }
    }

    pub fn without_frame_data(mut self) -> Self {
        self.supports_frame_data = false;
        self
    }

    /// Simulates a headset being plugged in.
    pub fn connect(&self, display: Arc<SimulatedDisplay>) {
        self.displays.lock().push(display);
    }
}

impl DisplayEnumerator for SimulatedEnvironment {
    fn supports_enumeration(&self) -> bool {
        self.supports_enumeration
    }

    fn supports_frame_data(&self) -> bool {
        self.supports_frame_data
    }

    fn get_displays(&self) -> PlatformFuture<'_, Vec<Arc<dyn VrDisplay>>> {
        let displays: Vec<Arc<dyn VrDisplay>> = self
            .displays
            .lock()
            .iter()
            .map(|d| Arc::clone(d) as Arc<dyn VrDisplay>)
            .collect();
        Box::pin(async move { Ok(displays) })
    }
}

// ============================================
// SIMULATED GAMEPADS
// ============================================

/// Fake gamepad slots
#[derive(Default)]
pub struct SimulatedGamepads {
    slots: Mutex<Vec<Option<RawGamepad>>>,
}

impl SimulatedGamepads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_slots(&self, slots: Vec<Option<RawGamepad>>) {
        *self.slots.lock() = slots;
    }
}

impl GamepadSource for SimulatedGamepads {
    fn gamepads(&self) -> Vec<Option<RawGamepad>> {
        self.slots.lock().clone()
    }
}

// ============================================
// SIMULATED WINDOW
// ============================================

#[derive(Debug, Clone)]
struct WindowState {
    window_size: SurfaceSize,
    surface_size: SurfaceSize,
    mirror_scale: Option<MirrorScale>,
    fullscreen: bool,
    reject_fullscreen: Option<String>,
}

/// Fake browser window + canvas; also the page's ambient frame clock
pub struct SimulatedWindow {
    state: Mutex<WindowState>,
    ticks_requested: AtomicU64,
}

impl SimulatedWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Mutex::new(WindowState {
                window_size: SurfaceSize::new(width, height),
                surface_size: SurfaceSize::default(),
                mirror_scale: None,
                fullscreen: false,
                reject_fullscreen: None,
            }),
            ticks_requested: AtomicU64::new(0),
        }
    }

    /// Simulates the user resizing the browser window.
    pub fn set_window_size(&self, size: SurfaceSize) {
        self.state.lock().window_size = size;
    }

    pub fn set_reject_fullscreen(&self, reason: Option<&str>) {
        self.state.lock().reject_fullscreen = reason.map(str::to_string);
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.state.lock().surface_size
    }

    pub fn mirror_scale(&self) -> Option<MirrorScale> {
        self.state.lock().mirror_scale
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }

    pub fn ticks_requested(&self) -> u64 {
        self.ticks_requested.load(Ordering::SeqCst)
    }

    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.reject_fullscreen.clone() {
            return Err(PlatformError::new(reason));
        }
        state.fullscreen = fullscreen;
        Ok(())
    }
}

impl RenderSurface for SimulatedWindow {
    fn window_size(&self) -> SurfaceSize {
        self.state.lock().window_size
    }

    fn set_size(&self, size: SurfaceSize) {
        self.state.lock().surface_size = size;
    }

    fn set_mirror_scale(&self, scale: Option<MirrorScale>) {
        self.state.lock().mirror_scale = scale;
    }

    fn request_fullscreen(&self) -> PlatformFuture<'_, ()> {
        Box::pin(async move {
            yield_once().await;
            self.set_fullscreen(true)
        })
    }

    fn exit_fullscreen(&self) -> PlatformFuture<'_, ()> {
        Box::pin(async move {
            yield_once().await;
            self.set_fullscreen(false)
        })
    }
}

impl TickSource for SimulatedWindow {
    fn request_tick(&self) -> TickHandle {
        self.ticks_requested.fetch_add(1, Ordering::SeqCst) + 1
    }
}

// ============================================
// RECORDING HOST
// ============================================

/// Fake rendering host that keeps every message it is sent
#[derive(Default)]
pub struct RecordingHost {
    messages: Mutex<Vec<HostMessage>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.messages.lock().clone()
    }

    /// Command tags in the order they arrived.
    pub fn tags(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.tag.clone()).collect()
    }
}

impl HostSink for RecordingHost {
    fn deliver(&self, message: &HostMessage) {
        self.messages.lock().push(message.clone());
    }
}

// ============================================
// FULL SIMULATED PLATFORM
// ============================================

/// All simulated pieces, kept concrete so tests can poke at them
pub struct SimulatedPlatform {
    pub environment: Arc<SimulatedEnvironment>,
    pub gamepads: Arc<SimulatedGamepads>,
    pub window: Arc<SimulatedWindow>,
    pub host: Arc<RecordingHost>,
}

impl SimulatedPlatform {
    /// A 1280x720 window with the given displays attached.
    pub fn new(displays: Vec<Arc<SimulatedDisplay>>) -> Self {
        Self::with_environment(SimulatedEnvironment::new(displays))
    }

    pub fn with_environment(environment: SimulatedEnvironment) -> Self {
        Self {
            environment: Arc::new(environment),
            gamepads: Arc::new(SimulatedGamepads::new()),
            window: Arc::new(SimulatedWindow::new(1280, 720)),
            host: Arc::new(RecordingHost::new()),
        }
    }

    /// The trait-object bundle handed to the bridge.
    pub fn platform(&self) -> Platform {
        Platform {
            displays: self.environment.clone(),
            gamepads: self.gamepads.clone(),
            surface: self.window.clone(),
            ambient_clock: self.window.clone(),
            host: self.host.clone(),
        }
    }
}
