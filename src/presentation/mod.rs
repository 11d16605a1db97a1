//! # Presentation Controller Module
//!
//! The state machine for entering and leaving VR presentation.
//!
//! ## Plain English
//!
//! "Presenting" means the headset is showing our stereo frames. Getting in
//! and out of that mode means asking the platform, which answers later
//! (like a promise in JavaScript). While we wait, the session sits in an
//! in-between state so a second click can't start a second request:
//!
//! ```text
//!          enter()                    request ok
//!   Idle ───────────▶ EnteringPresent ───────────▶ Presenting
//!    ▲                      │ rejected                 │
//!    │◀─────────────────────┘                          │ exit()
//!    │           request ok                            ▼
//!    └───────────────────────────────────────── ExitingPresent
//!                                      rejected: back to Presenting
//! ```
//!
//! Fullscreen is a separate flag. Some platforms (iOS Safari, notably) have
//! no gesture to leave VR, so fullscreen is the fallback the UI offers there.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::{HostBridge, HostCommand};
use crate::device::Device;
use crate::error::{BridgeError, BridgeResult, Capability, PresentAction};
use crate::platform::{MirrorScale, RenderSurface};

// ============================================
// SESSION STATE
// ============================================

/// Where the presentation session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    Idle,
    /// Present request outstanding
    EnteringPresent,
    Presenting,
    /// Exit request outstanding
    ExitingPresent,
}

impl PresentationState {
    /// True while a platform request is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::EnteringPresent | Self::ExitingPresent)
    }
}

/// Fullscreen fallback flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenState {
    NotFullscreen,
    Fullscreen,
}

/// Snapshot of the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationSession {
    pub state: PresentationState,
    pub fullscreen: FullscreenState,
    /// Fullscreen request outstanding
    pub fullscreen_pending: bool,
}

impl Default for PresentationSession {
    fn default() -> Self {
        Self {
            state: PresentationState::Idle,
            fullscreen: FullscreenState::NotFullscreen,
            fullscreen_pending: false,
        }
    }
}

/// What a transition call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The platform request ran and succeeded
    Completed,
    /// Already in the requested state; nothing was asked of the platform
    AlreadyInState,
    /// Another request is outstanding; this call was ignored
    InFlight,
}

// ============================================
// PENDING GUARD
// ============================================

/// What to roll back if a pending request never settles
#[derive(Debug, Clone, Copy)]
enum Rollback {
    /// Put the session back into this state
    State(PresentationState),
    /// Clear `fullscreen_pending`
    Fullscreen,
}

/// Undoes the in-flight marker when the transition future is dropped
/// before the platform answers.
struct PendingGuard<'a> {
    session: &'a Mutex<PresentationSession>,
    rollback: Option<Rollback>,
}

impl<'a> PendingGuard<'a> {
    fn new(session: &'a Mutex<PresentationSession>, rollback: Rollback) -> Self {
        Self {
            session,
            rollback: Some(rollback),
        }
    }

    /// The request succeeded; apply `settle` instead of rolling back.
    fn settle(mut self, settle: impl FnOnce(&mut PresentationSession)) {
        self.rollback = None;
        settle(&mut *self.session.lock());
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let Some(rollback) = self.rollback.take() else {
            return;
        };
        let mut session = self.session.lock();
        match rollback {
            Rollback::State(state) => session.state = state,
            Rollback::Fullscreen => session.fullscreen_pending = false,
        }
    }
}

// ============================================
// PRESENTATION CONTROLLER
// ============================================

/// Owns the presentation session; the only thing allowed to change it
pub struct PresentationController {
    session: Mutex<PresentationSession>,
    surface: Arc<dyn RenderSurface>,
    host: Arc<HostBridge>,

    /// Scale the page so the stereo canvas mirrors onto the window
    mirror: bool,
}

impl PresentationController {
    pub fn new(surface: Arc<dyn RenderSurface>, host: Arc<HostBridge>, mirror: bool) -> Self {
        Self {
            session: Mutex::new(PresentationSession::default()),
            surface,
            host,
            mirror,
        }
    }

    pub fn session(&self) -> PresentationSession {
        *self.session.lock()
    }

    pub fn state(&self) -> PresentationState {
        self.session.lock().state
    }

    pub fn is_presenting(&self) -> bool {
        self.state() == PresentationState::Presenting
    }

    pub fn is_fullscreen(&self) -> bool {
        self.session.lock().fullscreen == FullscreenState::Fullscreen
    }

    /// Exits when presenting, enters otherwise.
    pub async fn toggle(&self, device: &Device) -> BridgeResult<TransitionOutcome> {
        if self.is_presenting() {
            log::info!("Toggling to exit VR mode");
            self.exit(device, false).await
        } else {
            log::info!("Toggling to enter VR mode");
            self.enter(device, false).await
        }
    }

    /// Starts presenting on `device`.
    ///
    /// On success the surface is sized for side-by-side stereo and the host
    /// is told to `Begin`. A rejected request leaves the session as it was.
    ///
    /// ## Errors
    /// - `CapabilityMissing` if the display can't present
    /// - `PresentationRejected` if the platform says no
    pub async fn enter(&self, device: &Device, force: bool) -> BridgeResult<TransitionOutcome> {
        let pending = {
            let mut session = self.session.lock();
            let state = session.state;
            if state.is_in_flight() {
                return Ok(TransitionOutcome::InFlight);
            }
            if state == PresentationState::Presenting && !force {
                return Ok(TransitionOutcome::AlreadyInState);
            }
            if !device.can_present() {
                return Err(BridgeError::CapabilityMissing(Capability::CanPresent));
            }
            session.state = PresentationState::EnteringPresent;
            PendingGuard::new(&self.session, Rollback::State(state))
        };

        log::info!("Requesting presentation on '{}'", device.display_name());

        match device.display().request_present().await {
            Ok(()) => {
                pending.settle(|s| s.state = PresentationState::Presenting);
                log::info!("Entered VR mode");
                self.resize(Some(device));
                self.host.send(&HostCommand::Begin)?;
                Ok(TransitionOutcome::Completed)
            }
            Err(e) => {
                drop(pending);
                log::error!("Failed to enter VR mode: {}", e);
                Err(BridgeError::PresentationRejected {
                    action: PresentAction::Enter,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Stops presenting on `device`.
    ///
    /// Called while idle (and not forced) this enters instead, matching the
    /// long-standing behavior of the "exit" entry point.
    ///
    /// ## Errors
    /// - `PresentationRejected` if the platform says no; the session stays
    ///   presenting
    pub async fn exit(&self, device: &Device, force: bool) -> BridgeResult<TransitionOutcome> {
        let pending = {
            let mut session = self.session.lock();
            let state = session.state;
            if state.is_in_flight() {
                return Ok(TransitionOutcome::InFlight);
            }
            if state == PresentationState::Idle && !force {
                None
            } else {
                session.state = PresentationState::ExitingPresent;
                Some(PendingGuard::new(&self.session, Rollback::State(state)))
            }
        };

        let Some(pending) = pending else {
            log::warn!("Exit requested while not presenting, entering instead");
            return self.enter(device, false).await;
        };

        match device.display().exit_present().await {
            Ok(()) => {
                pending.settle(|s| s.state = PresentationState::Idle);
                log::info!("Exited VR mode");
                self.host.send(&HostCommand::End)?;
                self.resize(Some(device));
                Ok(TransitionOutcome::Completed)
            }
            Err(e) => {
                drop(pending);
                log::error!("Failed to exit VR mode: {}", e);
                Err(BridgeError::PresentationRejected {
                    action: PresentAction::Exit,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Catches up with a display that stopped presenting on its own
    /// (browser UI, headset removed).
    ///
    /// When the session says `Presenting` but the display does not, the
    /// session goes `Idle`, the host gets `End` and the surface is resized.
    pub fn reconcile(&self, device: &Device) -> BridgeResult<TransitionOutcome> {
        {
            let mut session = self.session.lock();
            if session.state != PresentationState::Presenting || device.is_presenting() {
                return Ok(TransitionOutcome::AlreadyInState);
            }
            session.state = PresentationState::Idle;
        }

        log::warn!("'{}' stopped presenting on its own", device.display_name());
        self.host.send(&HostCommand::End)?;
        self.resize(Some(device));
        Ok(TransitionOutcome::Completed)
    }

    /// Requests fullscreen. Platform errors are returned as-is.
    pub async fn enter_fullscreen(&self, force: bool) -> BridgeResult<TransitionOutcome> {
        self.set_fullscreen(FullscreenState::Fullscreen, force).await
    }

    /// Leaves fullscreen. Platform errors are returned as-is.
    pub async fn exit_fullscreen(&self, force: bool) -> BridgeResult<TransitionOutcome> {
        self.set_fullscreen(FullscreenState::NotFullscreen, force).await
    }

    async fn set_fullscreen(
        &self,
        target: FullscreenState,
        force: bool,
    ) -> BridgeResult<TransitionOutcome> {
        let pending = {
            let mut session = self.session.lock();
            if session.fullscreen_pending {
                return Ok(TransitionOutcome::InFlight);
            }
            if session.fullscreen == target && !force {
                return Ok(TransitionOutcome::AlreadyInState);
            }
            session.fullscreen_pending = true;
            PendingGuard::new(&self.session, Rollback::Fullscreen)
        };

        let result = match target {
            FullscreenState::Fullscreen => self.surface.request_fullscreen().await,
            FullscreenState::NotFullscreen => self.surface.exit_fullscreen().await,
        };

        if let Err(e) = result {
            drop(pending);
            log::error!("Fullscreen change to {:?} failed: {}", target, e);
            return Err(e.into());
        }
        pending.settle(|s| {
            s.fullscreen_pending = false;
            s.fullscreen = target;
        });
        Ok(TransitionOutcome::Completed)
    }

    /// Sizes the render surface for the current state.
    ///
    /// Presenting: both eyes side by side, with the page scaled to mirror
    /// it onto the window. Otherwise: the window size, unscaled.
    pub fn resize(&self, device: Option<&Device>) {
        let window = self.surface.window_size();

        match device {
            Some(device) if self.is_presenting() => {
                let render = device.stereo_render_size();
                self.surface.set_size(render);

                let scale = (self.mirror && render.width > 0 && render.height > 0).then(|| {
                    MirrorScale {
                        x: window.width as f32 / render.width as f32,
                        y: window.height as f32 / render.height as f32,
                    }
                });
                self.surface.set_mirror_scale(scale);

                log::debug!("Surface resized for stereo: {}x{}", render.width, render.height);
            }
            _ => {
                self.surface.set_size(window);
                self.surface.set_mirror_scale(None);
                log::debug!("Surface resized to window: {}x{}", window.width, window.height);
            }
        }
    }
}

// ============================================
// TESTS
// ============================================
