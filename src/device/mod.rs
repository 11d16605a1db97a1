//! # Device Manager Module
//!
//! Finds the VR display to use and keeps hold of it.
//!
//! ## Plain English
//!
//! The browser may know about zero, one or several headsets. We ask for the
//! list, take the LAST one (that's the one the platform added most
//! recently), and remember it as the active device. Only this module ever
//! swaps the active device; everything else just borrows it.
//!
//! Discovery never retries on its own. If a headset gets plugged in later,
//! whoever hears about it calls [`DeviceManager::discover`] again.
//!
//! A device that is in use is never swapped out from under the session:
//! while it presents (or the caller says a session holds it), discovery
//! hands back the current device and leaves the new list alone.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BridgeError, BridgeResult};
use crate::platform::{
    DisplayEnumerator, Eye, EyeParameters, RawFrameData, StageParameters,
    SurfaceSize, TickHandle, VrDisplay,
};

// ============================================
// DEVICE
// ============================================

/// The active VR display plus what we worked out about it
pub struct Device {
    display: Arc<dyn VrDisplay>,
    polyfilled: bool,
}

impl Device {
    /// Wraps a display, classifying it against `polyfill_marker`.
    pub fn new(display: Arc<dyn VrDisplay>, polyfill_marker: &str) -> Self {
        let polyfilled = detect_polyfill(display.as_ref(), polyfill_marker);
        Self {
            display,
            polyfilled,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display.display_name()
    }

    pub fn can_present(&self) -> bool {
        self.display.capabilities().can_present
    }

    /// Whether the display itself reports presenting.
    pub fn is_presenting(&self) -> bool {
        self.display.is_presenting()
    }

    /// True for software-emulated displays. The UI shows a "learn more"
    /// hint instead of the status badge when this is set.
    pub fn is_polyfilled(&self) -> bool {
        self.polyfilled
    }

    pub fn eye_parameters(&self, eye: Eye) -> EyeParameters {
        self.display.eye_parameters(eye)
    }

    /// Side-by-side render size for both eyes.
    ///
    /// Width is twice the wider eye, height is the taller eye.
    pub fn stereo_render_size(&self) -> SurfaceSize {
        let left = self.eye_parameters(Eye::Left);
        let right = self.eye_parameters(Eye::Right);
        SurfaceSize::new(
            left.render_width.max(right.render_width).saturating_mul(2),
            left.render_height.max(right.render_height),
        )
    }

    pub fn stage_parameters(&self) -> Option<StageParameters> {
        self.display.stage_parameters()
    }

    pub fn frame_data(&self) -> Option<RawFrameData> {
        self.display.frame_data()
    }

    pub fn request_animation_frame(&self) -> TickHandle {
        self.display.request_animation_frame()
    }

    pub fn submit_frame(&self) {
        self.display.submit_frame();
    }

    /// The underlying platform display.
    pub fn display(&self) -> &dyn VrDisplay {
        self.display.as_ref()
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("display_name", &self.display_name())
            .field("can_present", &self.can_present())
            .field("polyfilled", &self.polyfilled)
            .finish()
    }
}

/// Heuristic check for an emulated display.
///
/// Any of: the explicit flag, the marker inside the device id, display name
/// or device name, or a legacy hardware unit id being present.
pub fn detect_polyfill(display: &dyn VrDisplay, marker: &str) -> bool {
    let contains_marker = |value: Option<&str>| value.is_some_and(|v| v.contains(marker));

    display.is_polyfilled()
        || contains_marker(display.device_id())
        || contains_marker(Some(display.display_name()))
        || contains_marker(display.device_name())
        || display.hardware_unit_id().is_some()
}

// ============================================
// DEVICE MANAGER
// ============================================

/// Discovers displays and owns the active one
pub struct DeviceManager {
    enumerator: Arc<dyn DisplayEnumerator>,
    polyfill_marker: String,
    active: Mutex<Option<Arc<Device>>>,
}

impl DeviceManager {
    pub fn new(enumerator: Arc<dyn DisplayEnumerator>, polyfill_marker: &str) -> Self {
        Self {
            enumerator,
            polyfill_marker: polyfill_marker.to_string(),
            active: Mutex::new(None),
        }
    }

    /// Enumerates displays and makes the last one active.
    ///
    /// ## Errors
    /// - `Unsupported` when the environment can't enumerate at all
    /// - `NoDevice` when the list is empty
    /// - `Platform` when enumeration itself fails
    pub async fn try_discover(&self) -> BridgeResult<Arc<Device>> {
        self.try_discover_keeping(|| false).await
    }

    /// Like [`try_discover`](Self::try_discover), but the active device is
    /// kept when `in_use()` is true or its display is presenting.
    ///
    /// Both are checked after enumeration, right before the swap.
    pub async fn try_discover_keeping<F>(&self, in_use: F) -> BridgeResult<Arc<Device>>
    where
        F: Fn() -> bool,
    {
        if !self.enumerator.supports_enumeration() {
            return Err(BridgeError::Unsupported);
        }

        let displays = self.enumerator.get_displays().await?;
        let display = displays.last().cloned().ok_or(BridgeError::NoDevice)?;

        let mut active = self.active.lock();
        if let Some(current) = active.as_ref() {
            if in_use() || current.is_presenting() {
                log::info!(
                    "Keeping VR display '{}' while it is in use ({} found)",
                    current.display_name(),
                    displays.len()
                );
                return Ok(Arc::clone(current));
            }
        }

        let device = Arc::new(Device::new(display, &self.polyfill_marker));
        log::info!(
            "Using VR display '{}' ({} found, canPresent={}, polyfilled={})",
            device.display_name(),
            displays.len(),
            device.can_present(),
            device.is_polyfilled()
        );

        *active = Some(Arc::clone(&device));
        Ok(device)
    }

    /// Like [`try_discover`](Self::try_discover), but logs failures and
    /// yields `None` instead.
    pub async fn discover(&self) -> Option<Arc<Device>> {
        self.discover_keeping(|| false).await
    }

    /// Logging counterpart of
    /// [`try_discover_keeping`](Self::try_discover_keeping).
    pub async fn discover_keeping<F>(&self, in_use: F) -> Option<Arc<Device>>
    where
        F: Fn() -> bool,
    {
        match self.try_discover_keeping(in_use).await {
            Ok(device) => Some(device),
            Err(e) if e.is_degraded_mode() => {
                log::warn!("{}", e);
                None
            }
            Err(e) => {
                log::error!("VR display discovery failed: {}", e);
                None
            }
        }
    }

    /// Returns the active device, discovering one if there is none yet.
    pub async fn resolve(&self) -> Option<Arc<Device>> {
        if let Some(device) = self.active() {
            return Some(device);
        }
        self.discover().await
    }

    /// The active device, if any.
    pub fn active(&self) -> Option<Arc<Device>> {
        self.active.lock().clone()
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::simulated::{SimulatedDisplay, SimulatedEnvironment};
    use crate::platform::VrDisplay;

    fn manager_for(environment: SimulatedEnvironment) -> DeviceManager {
        DeviceManager::new(Arc::new(environment), "polyfill")
    }

    #[tokio::test]
    async fn test_last_display_is_selected() {
        for count in 1..=4 {
            let displays: Vec<Arc<SimulatedDisplay>> = (0..count)
                .map(|i| Arc::new(SimulatedDisplay::new(&format!("Display {}", i))))
                .collect();
            let manager = manager_for(SimulatedEnvironment::new(displays));

            let device = manager.discover().await.unwrap();
            assert_eq!(device.display_name(), format!("Display {}", count - 1));
        }
    }

    #[tokio::test]
    async fn test_unsupported_environment() {
        let manager = manager_for(SimulatedEnvironment::unsupported());

        assert!(matches!(
            manager.try_discover().await,
            Err(BridgeError::Unsupported)
        ));
        assert!(manager.discover().await.is_none());
        assert!(manager.active().is_none());
    }

    #[tokio::test]
    async fn test_no_device() {
        let manager = manager_for(SimulatedEnvironment::new(Vec::new()));

        assert!(matches!(
            manager.try_discover().await,
            Err(BridgeError::NoDevice)
        ));
    }

    #[tokio::test]
    async fn test_rediscovery_after_connect() {
        let environment = Arc::new(SimulatedEnvironment::new(Vec::new()));
        let manager = DeviceManager::new(environment.clone(), "polyfill");
        assert!(manager.resolve().await.is_none());

        environment.connect(Arc::new(SimulatedDisplay::new("Late Headset")));

        let device = manager.resolve().await.unwrap();
        assert_eq!(device.display_name(), "Late Headset");

        // Resolve reuses the active device
        let again = manager.resolve().await.unwrap();
        assert!(Arc::ptr_eq(&device, &again));
    }

    #[tokio::test]
    async fn test_presenting_device_is_kept() {
        let first = Arc::new(SimulatedDisplay::new("First"));
        let environment = Arc::new(SimulatedEnvironment::new(vec![first.clone()]));
        let manager = DeviceManager::new(environment.clone(), "polyfill");
        let device = manager.discover().await.unwrap();
        first.request_present().await.unwrap();

        environment.connect(Arc::new(SimulatedDisplay::new("Second")));
        let again = manager.discover().await.unwrap();

        assert!(Arc::ptr_eq(&device, &again));
        assert_eq!(manager.active().unwrap().display_name(), "First");

        // Once it stops presenting, the newer display takes over
        first.exit_present().await.unwrap();
        let swapped = manager.discover().await.unwrap();
        assert_eq!(swapped.display_name(), "Second");
    }

    #[tokio::test]
    async fn test_in_use_device_is_kept() {
        let environment = Arc::new(SimulatedEnvironment::new(vec![Arc::new(
            SimulatedDisplay::new("First"),
        )]));
        let manager = DeviceManager::new(environment.clone(), "polyfill");
        manager.discover().await.unwrap();

        environment.connect(Arc::new(SimulatedDisplay::new("Second")));

        let kept = manager.discover_keeping(|| true).await.unwrap();
        assert_eq!(kept.display_name(), "First");

        let swapped = manager.discover_keeping(|| false).await.unwrap();
        assert_eq!(swapped.display_name(), "Second");
    }

    #[test]
    fn test_polyfill_detection() {
        let marker = "polyfill";

        let native = SimulatedDisplay::new("Oculus Rift CV1");
        assert!(!detect_polyfill(&native, marker));

        let by_flag = SimulatedDisplay::new("Cardboard").polyfilled();
        assert!(detect_polyfill(&by_flag, marker));

        let by_id = SimulatedDisplay::new("Cardboard").with_device_id("webvr-polyfill:cardboard");
        assert!(detect_polyfill(&by_id, marker));

        let by_name = SimulatedDisplay::new("Cardboard (polyfill)");
        assert!(detect_polyfill(&by_name, marker));

        let by_device_name = SimulatedDisplay::new("Cardboard").with_device_name("polyfill");
        assert!(detect_polyfill(&by_device_name, marker));

        let by_hardware_id = SimulatedDisplay::new("Cardboard").with_hardware_unit_id("1");
        assert!(detect_polyfill(&by_hardware_id, marker));
    }

    #[test]
    fn test_stereo_render_size_uses_larger_eye() {
        let display = SimulatedDisplay::new("Asymmetric").with_eyes(
            EyeParameters {
                render_width: 1000,
                render_height: 1200,
            },
            EyeParameters {
                render_width: 1100,
                render_height: 1150,
            },
        );
        let device = Device::new(Arc::new(display), "polyfill");

        assert_eq!(device.stereo_render_size(), SurfaceSize::new(2200, 1200));
    }

    #[test]
    fn test_stereo_render_size_saturates() {
        let huge = EyeParameters {
            render_width: u32::MAX - 1,
            render_height: 10,
        };
        let device = Device::new(
            Arc::new(SimulatedDisplay::new("Broken").with_eyes(huge, huge)),
            "polyfill",
        );

        assert_eq!(device.stereo_render_size(), SurfaceSize::new(u32::MAX, 10));
    }
}
