//! # Frame Data Pipeline Module
//!
//! Turns one display frame report into the matrices the rendering host wants.
//!
//! ## Plain English
//!
//! The headset tells us, every frame, where each eye is and how it projects.
//! It speaks a slightly different dialect than the rendering host:
//!
//! 1. Rows and columns are swapped -> transpose everything
//! 2. Z points the other way -> negate the Z row of both VIEW matrices
//! 3. The floor may be unknown -> invent a standing height if so
//!
//! The result is a [`FrameSnapshot`], built fresh every tick and sent
//! straight to the host. Nothing here is cached between ticks.
//!
//! ```text
//!   RawFrameData ──┐
//!                  ├──▶ FrameDataPipeline::build ──▶ FrameSnapshot ──▶ HostBridge
//!   controllers  ──┘
//! ```

pub mod matrix;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::device::Device;
use crate::input::ControllerSnapshot;
use crate::platform::{RawFrameData, StageParameters};

// ============================================
// FRAME SNAPSHOT
// ============================================

/// One tick's worth of data for the rendering host
///
/// Serializes to the `WebVRData` payload:
/// `{leftProjectionMatrix, rightProjectionMatrix, leftViewMatrix,
///   rightViewMatrix, sitStand, controllers}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub left_projection_matrix: [f32; 16],
    pub right_projection_matrix: [f32; 16],
    pub left_view_matrix: [f32; 16],
    pub right_view_matrix: [f32; 16],
    pub sit_stand: [f32; 16],
    pub controllers: Vec<ControllerSnapshot>,
}

// ============================================
// PIPELINE
// ============================================

/// Per-tick matrix conversion
pub struct FrameDataPipeline {
    /// Standing height used when the display has no stage parameters
    default_height: f32,

    /// Snapshots produced
    frames_built: AtomicU64,

    /// Ticks skipped because the display had no frame report
    frames_skipped: AtomicU64,
}

impl FrameDataPipeline {
    pub fn new(default_height: f32) -> Self {
        Self {
            default_height,
            frames_built: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
        }
    }

    /// Reads the device's current frame report and builds a snapshot.
    ///
    /// Returns `None` (and sends nothing) when the display has no report
    /// yet. `poll_controllers` runs only when there is a report, so a
    /// skipped tick does no input work either.
    pub fn build<F>(&self, device: &Device, poll_controllers: F) -> Option<FrameSnapshot>
    where
        F: FnOnce() -> Vec<ControllerSnapshot>,
    {
        let Some(frame) = device.frame_data() else {
            let skipped = self.frames_skipped.fetch_add(1, Ordering::Relaxed) + 1;
            if skipped == 1 {
                log::debug!("Display has no frame data yet, skipping tick");
            }
            return None;
        };

        let stage = device.stage_parameters();
        let snapshot = self.convert(&frame, stage.as_ref(), poll_controllers());
        self.frames_built.fetch_add(1, Ordering::Relaxed);
        Some(snapshot)
    }

    /// Pure conversion of one report plus controllers.
    pub fn convert(
        &self,
        frame: &RawFrameData,
        stage: Option<&StageParameters>,
        controllers: Vec<ControllerSnapshot>,
    ) -> FrameSnapshot {
        FrameSnapshot {
            left_projection_matrix: matrix::transpose(&frame.left_projection_matrix),
            right_projection_matrix: matrix::transpose(&frame.right_projection_matrix),
            left_view_matrix: matrix::convert_view(&frame.left_view_matrix),
            right_view_matrix: matrix::convert_view(&frame.right_view_matrix),
            sit_stand: matrix::sit_to_stand(
                stage.map(|s| &s.sitting_to_standing_transform),
                self.default_height,
            ),
            controllers,
        }
    }

    pub fn frames_built(&self) -> u64 {
        self.frames_built.load(Ordering::Relaxed)
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped.load(Ordering::Relaxed)
    }
}

// ============================================
// TESTS
// ============================================
