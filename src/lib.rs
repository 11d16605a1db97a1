//! # WebVR Bridge
//!
//! Keeps a stereoscopic VR display and a rendering host in lockstep, frame
//! after frame.
//!
//! ## Architecture Overview
//!
//! The application is structured into independent modules:
//!
//! - `device`: Finds the headset and remembers the active one
//! - `presentation`: Enter/exit VR state machine (plus fullscreen fallback)
//! - `scheduler`: Picks the headset clock or the page clock for each tick
//! - `pipeline`: Converts the headset's matrices for the host
//! - `input`: Polls and converts controller poses
//! - `bridge`: Messages to and events from the rendering host
//! - `timer`: Round-trip latency probe
//! - `platform`: The traits the environment has to implement
//! - `config`: Application configuration
//! - `error`: Error types
//!
//! ## One Frame
//!
//! ```text
//!   scheduler tick
//!        │
//!        ▼
//!   pipeline (matrices) + input (controllers)
//!        │
//!        ▼
//!   WebVRData ──▶ rendering host ──PostRender──▶ submit frame to headset
//!        │
//!        ▼
//!   request next tick (headset clock while presenting)
//! ```

// ============================================
// MODULE DECLARATIONS
// ============================================

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod platform;
pub mod presentation;
pub mod scheduler;
pub mod timer;

// ============================================
// RE-EXPORTS
// ============================================

pub use bridge::{HostBridge, HostCommand, HostMessage, InboundEvent};
pub use config::Config;
pub use device::{Device, DeviceManager};
pub use error::{BridgeError, BridgeResult};
pub use input::{ControllerSnapshot, InputAggregator};
pub use pipeline::{FrameDataPipeline, FrameSnapshot};
pub use platform::Platform;
pub use presentation::{PresentationController, PresentationState, TransitionOutcome};
pub use scheduler::{FrameScheduler, ScheduledTick, TickClock};
pub use timer::RoundTripTimer;

// ============================================
// IMPORTS
// ============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use config::KeyBindings;

// ============================================
// CONTROL SURFACE
// ============================================

/// Actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    /// Leave VR and fullscreen
    ExitPresentation,
    /// Host performance overlay on/off
    TogglePerf,
    /// Start a round-trip measurement
    MeasureRoundTrip,
}

impl ControlKey {
    /// Maps a `KeyboardEvent.key` string through the configured bindings.
    pub fn from_key(key: &str, bindings: &KeyBindings) -> Option<Self> {
        if key == bindings.exit_presentation {
            Some(Self::ExitPresentation)
        } else if key == bindings.toggle_perf {
            Some(Self::TogglePerf)
        } else if key == bindings.measure_round_trip {
            Some(Self::MeasureRoundTrip)
        } else {
            None
        }
    }
}

/// Display-level signals from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A headset was plugged in
    Connected,
    /// The display started or stopped presenting on its own
    PresentChange,
    /// The user put the headset on (or pressed its "enter" button)
    Activate,
    /// The user took the headset off
    Deactivate,
    /// The browser window changed size
    WindowResized,
}

/// Read-only flags the UI polls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiSignals {
    /// The "Enter VR" button may be enabled
    pub presentation_enabled: bool,
    /// How many tracked controllers to draw icons for
    pub controller_count: usize,
    /// Show the "your headset is emulated, learn more" hint
    pub polyfill_help: bool,
    /// Currently presenting
    pub presenting: bool,
}

// ============================================
// APPLICATION STATE
// ============================================

/// Runtime statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct BridgeStats {
    /// Ticks run
    pub ticks: u64,
    /// `WebVRData` messages sent
    pub snapshots_sent: u64,
    /// Frames handed to the headset after `PostRender`
    pub frames_submitted: u64,
}

/// The bridge session.
///
/// ## Plain English
///
/// This is the "control center" that owns every component and the one
/// active device:
/// - Runs the per-frame pipeline when the scheduler ticks
/// - Reacts to host events, keys and display events
/// - Reports UI flags
pub struct VrBridge {
    config: Config,
    devices: DeviceManager,
    presentation: PresentationController,
    scheduler: FrameScheduler,
    pipeline: FrameDataPipeline,
    input: InputAggregator,
    host: Arc<HostBridge>,
    timer: RoundTripTimer,

    /// The host has said `Ready`, so its canvas exists
    host_ready: AtomicBool,

    stats: Mutex<BridgeStats>,
}

impl VrBridge {
    /// Creates a bridge over the given platform.
    ///
    /// ## Errors
    /// - `Config` if the configuration is invalid
    /// - `MissingFrameDataSupport` if the environment can enumerate
    ///   displays but cannot report frames; startup stops here
    pub fn new(config: Config, platform: Platform) -> BridgeResult<Self> {
        // Validate configuration
        if let Some(first) = config.validate().into_iter().next() {
            return Err(BridgeError::Config(first));
        }

        let displays = platform.displays;
        if displays.supports_enumeration() && !displays.supports_frame_data() {
            error!("VR displays are enumerable but frame data is not available");
            return Err(BridgeError::MissingFrameDataSupport);
        }

        let host = Arc::new(HostBridge::new(platform.host, &config.host_target));

        info!(
            "Initializing WebVR bridge for host target '{}'",
            config.host_target
        );

        Ok(Self {
            devices: DeviceManager::new(displays, &config.polyfill_marker),
            presentation: PresentationController::new(
                platform.surface,
                Arc::clone(&host),
                config.mirror_while_presenting,
            ),
            scheduler: FrameScheduler::new(platform.ambient_clock),
            pipeline: FrameDataPipeline::new(config.default_standing_height),
            input: InputAggregator::new(platform.gamepads),
            host,
            timer: RoundTripTimer::new(),
            host_ready: AtomicBool::new(false),
            stats: Mutex::new(BridgeStats::default()),
            config,
        })
    }

    /// Sizes the surface for the current state and requests the very first
    /// tick.
    pub fn start(&self) -> ScheduledTick {
        info!("Starting render loop");
        self.presentation.resize(self.devices.active().as_deref());
        self.request_next_tick()
    }

    /// Runs one frame.
    ///
    /// Converts the active device's frame report and controllers, sends
    /// `WebVRData`, then schedules the next tick. Returns the snapshot that
    /// was sent, or `None` when there was nothing to send this tick.
    pub fn tick(&self) -> BridgeResult<Option<FrameSnapshot>> {
        let device = self.devices.active();
        let snapshot = device
            .as_deref()
            .and_then(|device| self.pipeline.build(device, || self.input.poll()));

        let sent = match &snapshot {
            Some(snapshot) => self.host.send_frame(snapshot),
            None => Ok(()),
        };

        {
            let mut stats = self.stats.lock();
            stats.ticks += 1;
            if snapshot.is_some() && sent.is_ok() {
                stats.snapshots_sent += 1;
            }
        }

        self.request_next_tick();
        sent.map(|()| snapshot)
    }

    /// Handles one event from the rendering host.
    pub async fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::Ready => {
                info!("Rendering host is ready");
                self.host_ready.store(true, Ordering::SeqCst);
                self.presentation.resize(self.devices.active().as_deref());
                self.discover().await;
            }
            InboundEvent::Timer => {
                if self.timer.complete().is_none() {
                    debug!("Timer event without a pending measurement");
                }
            }
            InboundEvent::PostRender => self.submit_frame(),
            InboundEvent::PreRender => {}
            InboundEvent::Unknown(tag) => debug!("Ignoring host event '{}'", tag),
        }
    }

    /// Handles a key press from the control surface.
    ///
    /// Unbound keys are ignored.
    pub async fn handle_key(&self, key: &str) -> BridgeResult<()> {
        let Some(action) = ControlKey::from_key(key, &self.config.key_bindings) else {
            return Ok(());
        };

        match action {
            ControlKey::ExitPresentation => self.exit_all().await,
            ControlKey::TogglePerf => self.host.send(&HostCommand::TogglePerf),
            ControlKey::MeasureRoundTrip => self.timer.start(&self.host),
        }
    }

    /// Handles a display-level signal from the environment.
    pub async fn handle_display_event(&self, event: DisplayEvent) -> BridgeResult<()> {
        match event {
            DisplayEvent::Connected => {
                self.discover().await;
            }
            DisplayEvent::PresentChange => {
                if let Some(device) = self.devices.active() {
                    self.presentation.reconcile(&device)?;
                }
                if self.host_ready.load(Ordering::SeqCst) {
                    self.presentation.resize(self.devices.active().as_deref());
                }
            }
            DisplayEvent::WindowResized => {
                if self.host_ready.load(Ordering::SeqCst) {
                    self.presentation.resize(self.devices.active().as_deref());
                }
            }
            DisplayEvent::Activate => {
                if let Some(device) = self.devices.resolve().await {
                    self.presentation.enter(&device, false).await?;
                }
            }
            DisplayEvent::Deactivate => {
                if let Some(device) = self.devices.active() {
                    if self.presentation.is_presenting() {
                        self.presentation.exit(&device, false).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The "Enter VR" button: discovers a device if needed, then toggles.
    pub async fn toggle_presentation(&self) -> BridgeResult<TransitionOutcome> {
        let device = self
            .devices
            .resolve()
            .await
            .ok_or(BridgeError::NoDevice)?;
        self.presentation.toggle(&device).await
    }

    /// Current UI flags.
    pub fn signals(&self) -> UiSignals {
        let device = self.devices.active();
        UiSignals {
            presentation_enabled: device.as_ref().is_some_and(|d| d.can_present()),
            controller_count: self.input.controller_count(),
            polyfill_help: device.as_ref().is_some_and(|d| d.is_polyfilled()),
            presenting: self.presentation.is_presenting(),
        }
    }

    /// Leaves presentation and fullscreen, whichever are active.
    ///
    /// Both are attempted; the first failure is returned.
    async fn exit_all(&self) -> BridgeResult<()> {
        let mut result = Ok(());

        if let Some(device) = self.devices.active() {
            if self.presentation.is_presenting() {
                if let Err(e) = self.presentation.exit(&device, false).await {
                    warn!("Escape could not exit VR: {}", e);
                    result = Err(e);
                }
            }
        }

        if self.presentation.is_fullscreen() {
            if let Err(e) = self.presentation.exit_fullscreen(false).await {
                warn!("Escape could not exit fullscreen: {}", e);
                result = result.and(Err(e));
            }
        }

        result
    }

    /// Rediscovers displays without swapping out a device the session is
    /// using.
    async fn discover(&self) -> Option<Arc<Device>> {
        self.devices
            .discover_keeping(|| self.presentation.state() != PresentationState::Idle)
            .await
    }

    /// Hands the rendered frame to the headset, only while presenting.
    fn submit_frame(&self) {
        if !self.presentation.is_presenting() {
            return;
        }
        if let Some(device) = self.devices.active() {
            device.submit_frame();
            self.stats.lock().frames_submitted += 1;
        }
    }

    fn request_next_tick(&self) -> ScheduledTick {
        let device = self.devices.active();
        self.scheduler
            .request_next_tick(self.presentation.is_presenting(), device.as_deref())
    }

    /// Last completed round-trip time.
    pub fn last_round_trip(&self) -> Option<Duration> {
        self.timer.last().map(|r| r.elapsed)
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn presentation(&self) -> &PresentationController {
        &self.presentation
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn host(&self) -> &HostBridge {
        &self.host
    }

    /// Returns a copy of the current statistics.
    pub fn stats(&self) -> BridgeStats {
        self.stats.lock().clone()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// ============================================
// LOGGING
// ============================================

/// Initialize logging for the platform.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::simulated::{SimulatedDisplay, SimulatedEnvironment, SimulatedPlatform};
    use crate::platform::{EyeParameters, RawGamepad, RawPose, SurfaceSize, VrDisplay};

    fn bridge_with(displays: Vec<Arc<SimulatedDisplay>>) -> (VrBridge, SimulatedPlatform) {
        let sim = SimulatedPlatform::new(displays);
        let bridge = VrBridge::new(Config::default(), sim.platform()).unwrap();
        (bridge, sim)
    }

    fn tracked_pad(index: u32) -> RawGamepad {
        RawGamepad {
            index,
            hand: "right".to_string(),
            display_id: Some(1),
            pose: Some(RawPose {
                position: Some([0.0, 1.0, -0.5]),
                orientation: Some([0.0, 0.0, 0.0, 1.0]),
                ..RawPose::default()
            }),
            buttons: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        init_logging();
        let a = Arc::new(SimulatedDisplay::new("A").with_can_present(false));
        let b = Arc::new(SimulatedDisplay::new("B").with_eyes(
            EyeParameters {
                render_width: 1200,
                render_height: 1300,
            },
            EyeParameters {
                render_width: 1250,
                render_height: 1280,
            },
        ));
        let (bridge, sim) = bridge_with(vec![a, b.clone()]);

        bridge.dispatch(InboundEvent::Ready).await;
        let device = bridge.devices().active().unwrap();
        assert_eq!(device.display_name(), "B");

        bridge.presentation().enter(&device, false).await.unwrap();
        assert_eq!(sim.window.surface_size(), SurfaceSize::new(2500, 1300));
        assert_eq!(sim.host.tags(), vec!["Begin"]);
        assert_eq!(bridge.presentation().state(), PresentationState::Presenting);

        bridge.presentation().exit(&device, false).await.unwrap();
        assert_eq!(sim.host.tags(), vec!["Begin", "End"]);
        assert_eq!(bridge.presentation().state(), PresentationState::Idle);
    }

    #[tokio::test]
    async fn test_tick_sends_snapshot() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);
        sim.gamepads.set_slots(vec![Some(tracked_pad(0)), None]);
        bridge.dispatch(InboundEvent::Ready).await;

        let snapshot = bridge.tick().unwrap().unwrap();

        assert_eq!(snapshot.controllers.len(), 1);
        assert_eq!(snapshot.controllers[0].position, [0.0, 1.0, 0.5]);

        let messages = sim.host.messages();
        let data = messages.iter().find(|m| m.tag == "WebVRData").unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(data.payload.as_deref().unwrap()).unwrap();
        assert_eq!(payload["controllers"][0]["hand"], "right");
        assert_eq!(payload["sitStand"][7], 1.5);

        assert_eq!(bridge.stats().snapshots_sent, 1);
        assert_eq!(bridge.signals().controller_count, 1);
    }

    #[tokio::test]
    async fn test_tick_without_device_or_frame() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, sim) = bridge_with(vec![display.clone()]);

        // No device yet
        assert!(bridge.tick().unwrap().is_none());

        bridge.dispatch(InboundEvent::Ready).await;
        display.set_frame(None);
        assert!(bridge.tick().unwrap().is_none());

        assert!(!sim.host.tags().iter().any(|t| t == "WebVRData"));
        let stats = bridge.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.snapshots_sent, 0);
    }

    #[tokio::test]
    async fn test_tick_follows_device_clock_while_presenting() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, sim) = bridge_with(vec![display.clone()]);

        assert_eq!(bridge.start().clock, TickClock::Ambient);
        bridge.dispatch(InboundEvent::Ready).await;
        bridge.toggle_presentation().await.unwrap();

        bridge.tick().unwrap();
        assert_eq!(display.ticks_requested(), 1);
        assert_eq!(sim.window.ticks_requested(), 1);

        bridge.toggle_presentation().await.unwrap();
        bridge.tick().unwrap();
        assert_eq!(sim.window.ticks_requested(), 2);
    }

    #[tokio::test]
    async fn test_post_render_submits_only_while_presenting() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, _sim) = bridge_with(vec![display.clone()]);
        bridge.dispatch(InboundEvent::Ready).await;

        bridge.dispatch(InboundEvent::PostRender).await;
        assert_eq!(display.frames_submitted(), 0);

        bridge.toggle_presentation().await.unwrap();
        bridge.dispatch(InboundEvent::PreRender).await;
        bridge.dispatch(InboundEvent::PostRender).await;
        assert_eq!(display.frames_submitted(), 1);
        assert_eq!(bridge.stats().frames_submitted, 1);
    }

    #[tokio::test]
    async fn test_round_trip_via_keys_and_timer_event() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);

        // A stray Timer is harmless
        bridge.dispatch(InboundEvent::Timer).await;
        assert!(bridge.last_round_trip().is_none());

        bridge.handle_key("v").await.unwrap();
        assert_eq!(sim.host.tags(), vec!["TestTime"]);

        bridge.dispatch(InboundEvent::Timer).await;
        assert!(bridge.last_round_trip().is_some());
    }

    #[tokio::test]
    async fn test_perf_key_and_unbound_key() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);

        bridge.handle_key("p").await.unwrap();
        bridge.handle_key("q").await.unwrap();

        assert_eq!(sim.host.tags(), vec!["TogglePerf"]);
    }

    #[tokio::test]
    async fn test_escape_while_idle_does_nothing() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, sim) = bridge_with(vec![display.clone()]);
        bridge.dispatch(InboundEvent::Ready).await;

        bridge.handle_key("Escape").await.unwrap();

        assert_eq!(bridge.presentation().state(), PresentationState::Idle);
        assert_eq!(display.present_requests(), 0);
        assert!(sim.host.tags().is_empty());
    }

    #[tokio::test]
    async fn test_escape_exits_presentation_and_fullscreen() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);
        bridge.dispatch(InboundEvent::Ready).await;
        bridge.toggle_presentation().await.unwrap();
        bridge.presentation().enter_fullscreen(false).await.unwrap();

        bridge.handle_key("Escape").await.unwrap();

        assert_eq!(bridge.presentation().state(), PresentationState::Idle);
        assert!(!sim.window.is_fullscreen());
        assert_eq!(sim.host.tags(), vec!["Begin", "End"]);
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);

        bridge
            .dispatch(InboundEvent::from_tag("SomethingNew"))
            .await;

        assert!(sim.host.tags().is_empty());
        assert!(bridge.devices().active().is_none());
    }

    #[tokio::test]
    async fn test_display_events() {
        let sim = SimulatedPlatform::new(Vec::new());
        let bridge = VrBridge::new(Config::default(), sim.platform()).unwrap();
        bridge.dispatch(InboundEvent::Ready).await;
        assert!(!bridge.signals().presentation_enabled);

        let display = Arc::new(SimulatedDisplay::new("Late"));
        sim.environment.connect(display.clone());
        bridge
            .handle_display_event(DisplayEvent::Connected)
            .await
            .unwrap();
        assert!(bridge.signals().presentation_enabled);

        bridge
            .handle_display_event(DisplayEvent::Activate)
            .await
            .unwrap();
        assert!(bridge.signals().presenting);

        bridge
            .handle_display_event(DisplayEvent::Deactivate)
            .await
            .unwrap();
        assert!(!bridge.signals().presenting);

        // Deactivate while idle must not re-enter
        bridge
            .handle_display_event(DisplayEvent::Deactivate)
            .await
            .unwrap();
        assert!(!bridge.signals().presenting);
        assert_eq!(display.present_requests(), 1);
    }

    #[tokio::test]
    async fn test_new_display_while_presenting_keeps_session_device() {
        let first = Arc::new(SimulatedDisplay::new("First"));
        let (bridge, sim) = bridge_with(vec![first.clone()]);
        bridge.dispatch(InboundEvent::Ready).await;
        bridge.toggle_presentation().await.unwrap();

        let second = Arc::new(SimulatedDisplay::new("Second").with_can_present(false));
        sim.environment.connect(second.clone());
        bridge
            .handle_display_event(DisplayEvent::Connected)
            .await
            .unwrap();

        assert_eq!(bridge.devices().active().unwrap().display_name(), "First");

        bridge.tick().unwrap();
        bridge.dispatch(InboundEvent::PostRender).await;
        assert_eq!(bridge.scheduler().stats().device_ticks, 1);
        assert_eq!(first.frames_submitted(), 1);
        assert_eq!(second.frames_submitted(), 0);

        bridge.handle_key("Escape").await.unwrap();

        assert_eq!(first.exit_requests(), 1);
        assert_eq!(second.exit_requests(), 0);
        assert!(!first.is_presenting());
        assert_eq!(bridge.presentation().state(), PresentationState::Idle);

        // Idle again, so the newer display may take over
        bridge
            .handle_display_event(DisplayEvent::Connected)
            .await
            .unwrap();
        assert_eq!(bridge.devices().active().unwrap().display_name(), "Second");
    }

    #[tokio::test]
    async fn test_platform_ending_presentation_is_followed() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, sim) = bridge_with(vec![display.clone()]);
        bridge.dispatch(InboundEvent::Ready).await;
        bridge.toggle_presentation().await.unwrap();
        assert_eq!(sim.window.surface_size(), SurfaceSize::new(3024, 1680));

        // Browser UI ends presentation without asking us
        display.exit_present().await.unwrap();
        bridge
            .handle_display_event(DisplayEvent::PresentChange)
            .await
            .unwrap();

        assert_eq!(bridge.presentation().state(), PresentationState::Idle);
        assert_eq!(sim.host.tags(), vec!["Begin", "End"]);
        assert_eq!(sim.window.surface_size(), SurfaceSize::new(1280, 720));
        assert_eq!(bridge.start().clock, TickClock::Ambient);
        assert!(!bridge.signals().presenting);
    }

    #[tokio::test]
    async fn test_present_change_while_presenting_keeps_session() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let (bridge, sim) = bridge_with(vec![display.clone()]);
        bridge.dispatch(InboundEvent::Ready).await;
        bridge.toggle_presentation().await.unwrap();

        bridge
            .handle_display_event(DisplayEvent::PresentChange)
            .await
            .unwrap();

        assert_eq!(bridge.presentation().state(), PresentationState::Presenting);
        assert_eq!(sim.host.tags(), vec!["Begin"]);
    }

    #[tokio::test]
    async fn test_window_resize_waits_for_host() {
        let (bridge, sim) = bridge_with(vec![Arc::new(SimulatedDisplay::new("Vive"))]);

        bridge
            .handle_display_event(DisplayEvent::WindowResized)
            .await
            .unwrap();
        assert_eq!(sim.window.surface_size(), SurfaceSize::default());

        bridge.dispatch(InboundEvent::Ready).await;
        sim.window.set_window_size(SurfaceSize::new(1920, 1080));
        bridge
            .handle_display_event(DisplayEvent::WindowResized)
            .await
            .unwrap();
        assert_eq!(sim.window.surface_size(), SurfaceSize::new(1920, 1080));
    }

    #[tokio::test]
    async fn test_polyfill_signal() {
        let display = Arc::new(SimulatedDisplay::new("Cardboard (webvr-polyfill)"));
        let (bridge, _sim) = bridge_with(vec![display]);

        bridge.dispatch(InboundEvent::Ready).await;

        assert!(bridge.signals().polyfill_help);
    }

    #[tokio::test]
    async fn test_toggle_without_any_display() {
        let (bridge, _sim) = bridge_with(Vec::new());

        let result = bridge.toggle_presentation().await;

        assert!(matches!(result, Err(BridgeError::NoDevice)));
    }

    #[test]
    fn test_missing_frame_data_aborts_startup() {
        let sim = SimulatedPlatform::with_environment(
            SimulatedEnvironment::new(Vec::new()).without_frame_data(),
        );

        let result = VrBridge::new(Config::default(), sim.platform());

        assert!(matches!(result, Err(BridgeError::MissingFrameDataSupport)));
    }

    #[tokio::test]
    async fn test_unsupported_environment_runs_degraded() {
        let sim = SimulatedPlatform::with_environment(SimulatedEnvironment::unsupported());
        let bridge = VrBridge::new(Config::default(), sim.platform()).unwrap();

        bridge.dispatch(InboundEvent::Ready).await;

        assert_eq!(bridge.signals(), UiSignals::default());
        assert!(bridge.tick().unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sim = SimulatedPlatform::new(Vec::new());
        let mut config = Config::default();
        config.host_target = String::new();

        let result = VrBridge::new(config, sim.platform());

        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
