//! # Frame Scheduler Module
//!
//! Decides which clock drives the render loop.
//!
//! ## Plain English
//!
//! A normal monitor refreshes at ~60Hz; a headset at 90Hz or more. If the
//! render loop kept following the monitor while we're in VR, the headset
//! would get stale frames. So:
//!
//! - Presenting on a display that can present, and the display agrees it
//!   is presenting -> the headset's own clock
//! - Anything else -> the page's normal (ambient) clock
//!
//! The display's own flag matters: once the platform ends presentation
//! behind our back, the headset clock stops firing.
//!
//! The ambient clock is handed in at construction. Everything that wants a
//! next tick asks the scheduler, never a clock directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::device::Device;
use crate::platform::{TickHandle, TickSource};

/// Which clock a tick was scheduled on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickClock {
    /// The headset's refresh clock
    Device,
    /// The page's normal frame clock
    Ambient,
}

/// A scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub clock: TickClock,
    pub handle: TickHandle,
}

/// How many ticks went to each clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub device_ticks: u64,
    pub ambient_ticks: u64,
}

/// Routes "request next tick" to the right clock
pub struct FrameScheduler {
    ambient: Arc<dyn TickSource>,
    device_ticks: AtomicU64,
    ambient_ticks: AtomicU64,
}

impl FrameScheduler {
    pub fn new(ambient: Arc<dyn TickSource>) -> Self {
        Self {
            ambient,
            device_ticks: AtomicU64::new(0),
            ambient_ticks: AtomicU64::new(0),
        }
    }

    /// Picks the clock without scheduling anything.
    pub fn select_clock(presenting: bool, device: Option<&Device>) -> TickClock {
        match device {
            Some(device) if presenting && device.can_present() && device.is_presenting() => {
                TickClock::Device
            }
            _ => TickClock::Ambient,
        }
    }

    /// Schedules the next tick on the selected clock.
    pub fn request_next_tick(&self, presenting: bool, device: Option<&Device>) -> ScheduledTick {
        let clock = Self::select_clock(presenting, device);
        let handle = match (clock, device) {
            (TickClock::Device, Some(device)) => {
                self.device_ticks.fetch_add(1, Ordering::Relaxed);
                device.request_animation_frame()
            }
            _ => {
                self.ambient_ticks.fetch_add(1, Ordering::Relaxed);
                self.ambient.request_tick()
            }
        };

        ScheduledTick { clock, handle }
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            device_ticks: self.device_ticks.load(Ordering::Relaxed),
            ambient_ticks: self.ambient_ticks.load(Ordering::Relaxed),
        }
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::simulated::{SimulatedDisplay, SimulatedWindow};
    use crate::platform::VrDisplay;

    #[test]
    fn test_ambient_when_idle() {
        let window = Arc::new(SimulatedWindow::new(800, 600));
        let scheduler = FrameScheduler::new(window.clone());
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        let device = Device::new(display.clone(), "polyfill");

        let tick = scheduler.request_next_tick(false, Some(&device));

        assert_eq!(tick.clock, TickClock::Ambient);
        assert_eq!(window.ticks_requested(), 1);
        assert_eq!(display.ticks_requested(), 0);
    }

    #[tokio::test]
    async fn test_device_clock_while_presenting() {
        let window = Arc::new(SimulatedWindow::new(800, 600));
        let scheduler = FrameScheduler::new(window.clone());
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        display.request_present().await.unwrap();
        let device = Device::new(display.clone(), "polyfill");

        let tick = scheduler.request_next_tick(true, Some(&device));

        assert_eq!(tick.clock, TickClock::Device);
        assert_eq!(display.ticks_requested(), 1);
        assert_eq!(window.ticks_requested(), 0);
        assert_eq!(
            scheduler.stats(),
            SchedulerStats {
                device_ticks: 1,
                ambient_ticks: 0
            }
        );
    }

    #[test]
    fn test_ambient_when_display_cannot_present() {
        let device = Device::new(
            Arc::new(SimulatedDisplay::new("Cardboard").with_can_present(false)),
            "polyfill",
        );
        assert_eq!(
            FrameScheduler::select_clock(true, Some(&device)),
            TickClock::Ambient
        );
    }

    #[tokio::test]
    async fn test_ambient_once_display_stops_presenting() {
        let display = Arc::new(SimulatedDisplay::new("Vive"));
        display.request_present().await.unwrap();
        let device = Device::new(display.clone(), "polyfill");
        assert_eq!(
            FrameScheduler::select_clock(true, Some(&device)),
            TickClock::Device
        );

        display.exit_present().await.unwrap();

        assert_eq!(
            FrameScheduler::select_clock(true, Some(&device)),
            TickClock::Ambient
        );
    }

    #[test]
    fn test_ambient_without_device() {
        assert_eq!(FrameScheduler::select_clock(true, None), TickClock::Ambient);
    }
}
