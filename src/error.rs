//! # Error Types Module
//!
//! This module defines all the error types used throughout the bridge.
//!
//! ## Plain English Explanation
//!
//! VR in a browser is unreliable: the headset may be unplugged, the browser
//! may not speak WebVR at all, or the platform may simply say "no" when we
//! ask to present. These error types describe WHAT went wrong so the caller
//! can decide what to do:
//!
//! - "Unsupported: this browser can't enumerate VR displays"
//! - "NoDevice: it can, but nothing is plugged in"
//! - "PresentationRejected: the headset refused to start presenting"
//!
//! Most of these are NOT fatal. The bridge keeps running in a degraded mode
//! (no "Enter VR" button) instead of crashing. Only a missing frame-data
//! facility stops startup.

use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;

// ============================================
// MAIN BRIDGE ERROR
// ============================================

/// The main error type for the bridge
///
/// ## Plain English
///
/// This is the "parent" error that can hold a problem from any part of the
/// bridge. Each variant says how bad the problem is in its docs.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The environment has no VR display enumeration at all
    ///
    /// ## What This Means
    /// Non-fatal. Presentation affordances stay disabled.
    #[error("This environment does not support WebVR display enumeration")]
    Unsupported,

    /// Enumeration worked but found no displays
    ///
    /// ## What This Means
    /// Non-fatal. Same degraded mode as `Unsupported`.
    #[error("No VR display was found")]
    NoDevice,

    /// The platform declined an enter or exit request
    ///
    /// ## What This Means
    /// The session stays in the state it was in before the request.
    #[error("Failed to {action} VR mode: {reason}")]
    PresentationRejected {
        /// Which transition was refused
        action: PresentAction,
        /// What the platform said
        reason: String,
    },

    /// The active device lacks a capability the call needs
    ///
    /// ## Example
    /// Calling `enter()` on a display that reports `canPresent = false`.
    #[error("VR display is missing a required capability: {0}")]
    CapabilityMissing(Capability),

    /// The environment cannot produce per-frame pose reports
    ///
    /// ## What This Means
    /// Fatal at startup: without frame data there is nothing to send.
    #[error("This environment cannot provide VR frame data")]
    MissingFrameDataSupport,

    /// A platform call failed (fullscreen, enumeration, ...)
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A payload could not be encoded for the rendering host
    #[error("Failed to serialize host payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ============================================
// ERROR DETAILS
// ============================================

/// Which presentation transition an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentAction {
    /// Entering VR presentation
    Enter,
    /// Leaving VR presentation
    Exit,
}

impl std::fmt::Display for PresentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// Device capabilities the bridge may require
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The display can present stereo frames
    CanPresent,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CanPresent => write!(f, "canPresent"),
        }
    }
}

impl BridgeError {
    /// Returns true for errors that only put the bridge in degraded mode.
    ///
    /// ## Plain English
    /// "Is this the kind of problem where we just hide the VR button?"
    pub fn is_degraded_mode(&self) -> bool {
        matches!(self, Self::Unsupported | Self::NoDevice)
    }
}

// ============================================
// RESULT TYPE ALIAS
// ============================================

/// A Result type that uses BridgeError
///
/// ## Plain English
///
/// This is a shorthand. Instead of writing:
/// ```text
/// fn do_something() -> Result<Value, BridgeError>
/// ```
/// We can write:
/// ```text
/// fn do_something() -> BridgeResult<Value>
/// ```
pub type BridgeResult<T> = Result<T, BridgeError>;

// ============================================
// TESTS
// ============================================
