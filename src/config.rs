//! # Configuration Module
//!
//! This module handles all configurable settings for the bridge.
//!
//! ## Plain English Explanation
//!
//! Most of the bridge's behavior is fixed by the WebVR contract, but a few
//! knobs depend on the page and the rendering host it talks to:
//!
//! - Which object inside the rendering host receives our commands
//! - How tall a seated player is assumed to be when the headset has no
//!   room-scale data
//! - Which keys exit VR, toggle the perf overlay and measure latency
//! - How to recognize an emulated (polyfilled) headset

use thiserror::Error;

// ============================================
// KEY BINDINGS
// ============================================

/// Keyboard shortcuts understood by the control surface
///
/// ## Plain English
///
/// Keys are compared against the browser's `KeyboardEvent.key` string,
/// so "Escape" for the escape key and "p" for the letter.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyBindings {
    /// Leaves VR (and fullscreen, if active)
    pub exit_presentation: String,

    /// Shows or hides the rendering host's performance overlay
    pub toggle_perf: String,

    /// Starts a round-trip latency measurement
    pub measure_round_trip: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            exit_presentation: "Escape".to_string(),
            toggle_perf: "p".to_string(),
            measure_round_trip: "v".to_string(),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

/// All configuration options for the bridge
#[derive(Clone, Debug)]
pub struct Config {
    // ----------------------------------------
    // HOST SETTINGS
    // "Who we talk to"
    // ----------------------------------------

    /// Name of the object inside the rendering host that receives commands
    ///
    /// ## Default
    /// `WebVRCameraSet` - the camera rig prefab on the host side.
    pub host_target: String,

    // ----------------------------------------
    // TRACKING SETTINGS
    // "Where the player is"
    // ----------------------------------------

    /// Height used for the sit-to-stand transform when the display has no
    /// stage parameters (in meters)
    ///
    /// ## Limits
    /// - Must be finite and positive
    /// - Maximum: 3 meters
    /// - Default: 1.5 meters
    pub default_standing_height: f32,

    /// Substring that marks a display as software-emulated
    pub polyfill_marker: String,

    // ----------------------------------------
    // PRESENTATION SETTINGS
    // ----------------------------------------

    /// Scale the flat-screen canvas so it mirrors the headset view while
    /// presenting
    pub mirror_while_presenting: bool,

    // ----------------------------------------
    // CONTROL SURFACE
    // ----------------------------------------

    /// Keyboard shortcuts
    pub key_bindings: KeyBindings,
}

impl Config {
    /// Creates a configuration with all default values
    pub fn default() -> Self {
        Self {
            host_target: "WebVRCameraSet".to_string(),
            default_standing_height: 1.5,
            polyfill_marker: "polyfill".to_string(),
            mirror_while_presenting: true,
            key_bindings: KeyBindings::default(),
        }
    }

    /// Creates a configuration for kiosk-style setups
    ///
    /// ## When to Use
    /// The headset is the only display anyone looks at, so mirroring the
    /// stereo view onto the page is wasted work.
    pub fn headset_only() -> Self {
        Self {
            mirror_while_presenting: false,
            ..Self::default()
        }
    }

    /// Validates the configuration and returns errors if invalid
    ///
    /// ## Plain English
    /// Makes sure all settings are within reasonable bounds.
    /// Returns a list of problems, or empty if all is well.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.host_target.trim().is_empty() {
            errors.push(ConfigError::EmptyHostTarget);
        }

        let height = self.default_standing_height;
        if !height.is_finite() || height <= 0.0 || height > 3.0 {
            errors.push(ConfigError::InvalidStandingHeight(height));
        }

        if self.polyfill_marker.is_empty() {
            errors.push(ConfigError::EmptyPolyfillMarker);
        }

        let keys = &self.key_bindings;
        let all = [
            &keys.exit_presentation,
            &keys.toggle_perf,
            &keys.measure_round_trip,
        ];
        for (i, key) in all.iter().enumerate() {
            if key.is_empty() {
                errors.push(ConfigError::EmptyKeyBinding);
            } else if all[..i].contains(key) {
                errors.push(ConfigError::DuplicateKeyBinding((*key).clone()));
            }
        }

        errors
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default()
    }
}

// ============================================
// CONFIGURATION ERRORS
// ============================================

/// Errors that can occur with configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No host object to address commands to
    #[error("Host target name must not be empty")]
    EmptyHostTarget,

    /// Fallback standing height is unusable
    #[error("Standing height {0} is invalid (must be in (0, 3] meters)")]
    InvalidStandingHeight(f32),

    /// Polyfill marker would match every display
    #[error("Polyfill marker must not be empty")]
    EmptyPolyfillMarker,

    /// A key binding is blank
    #[error("Key bindings must not be empty")]
    EmptyKeyBinding,

    /// Two actions share a key
    #[error("Key '{0}' is bound to more than one action")]
    DuplicateKeyBinding(String),
}

// ============================================
// TESTS
// ============================================
