//! # Host Bridge Module
//!
//! The message surface between the bridge and the rendering host.
//!
//! ## Plain English
//!
//! Two directions, two closed vocabularies:
//!
//! ```text
//!    bridge ──HostCommand──▶ rendering host
//!      Begin / End / WebVRData / TogglePerf / TestTime
//!
//!    bridge ◀──InboundEvent── rendering host
//!      Ready / Timer / PreRender / PostRender
//! ```
//!
//! Outbound messages are fire-and-forget: no acknowledgment, no retry.
//! Inbound tags are parsed into [`InboundEvent`]; anything we don't know
//! becomes `Unknown` and is ignored by the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::BridgeResult;
use crate::pipeline::FrameSnapshot;
use crate::platform::HostSink;

// ============================================
// OUTBOUND
// ============================================

/// One message as delivered to the rendering host
///
/// Mirrors the host's `SendMessage(target, method, payload?)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    /// Object inside the host that receives the message
    pub target: String,
    /// Command tag
    pub tag: String,
    /// JSON payload, if the command carries one
    pub payload: Option<String>,
}

/// Commands the bridge sends to the rendering host
#[derive(Debug, Clone)]
pub enum HostCommand {
    /// Start stereo rendering
    Begin,
    /// Stop stereo rendering
    End,
    /// This tick's matrices and controllers
    WebVrData(FrameSnapshot),
    /// Show/hide the host's performance overlay
    TogglePerf,
    /// Start of a round-trip measurement; the host answers with `Timer`
    TestTime,
}

impl HostCommand {
    /// Wire tag for this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::End => "End",
            Self::WebVrData(_) => "WebVRData",
            Self::TogglePerf => "TogglePerf",
            Self::TestTime => "TestTime",
        }
    }
}

// ============================================
// INBOUND
// ============================================

/// Lifecycle events raised by the rendering host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Host finished loading; its canvas exists
    Ready,
    /// Reply to `TestTime`
    Timer,
    /// Host is about to render a frame
    PreRender,
    /// Host finished rendering a frame
    PostRender,
    /// Any tag we don't handle
    Unknown(String),
}

impl InboundEvent {
    /// Parses a wire tag. Never fails; unknown tags are kept verbatim.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Ready" => Self::Ready,
            "Timer" => Self::Timer,
            "PreRender" => Self::PreRender,
            "PostRender" => Self::PostRender,
            other => Self::Unknown(other.to_string()),
        }
    }
}

// ============================================
// HOST BRIDGE
// ============================================

/// Outbound half of the host connection
pub struct HostBridge {
    sink: Arc<dyn HostSink>,
    target: String,
    messages_sent: AtomicU64,
}

impl HostBridge {
    /// Creates a bridge that addresses every message to `target`.
    pub fn new(sink: Arc<dyn HostSink>, target: &str) -> Self {
        Self {
            sink,
            target: target.to_string(),
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Sends a typed command.
    ///
    /// Only fails if the payload can't be serialized, in which case nothing
    /// is delivered.
    pub fn send(&self, command: &HostCommand) -> BridgeResult<()> {
        match command {
            HostCommand::WebVrData(snapshot) => self.send_frame(snapshot),
            _ => self.send_raw::<()>(command.tag(), None),
        }
    }

    /// Sends one tick's snapshot as `WebVRData`.
    pub fn send_frame(&self, snapshot: &FrameSnapshot) -> BridgeResult<()> {
        self.send_raw("WebVRData", Some(snapshot))
    }

    /// Sends any tag with an optional JSON payload.
    pub fn send_raw<T: Serialize + ?Sized>(
        &self,
        tag: &str,
        payload: Option<&T>,
    ) -> BridgeResult<()> {
        let payload = payload.map(serde_json::to_string).transpose()?;

        let message = HostMessage {
            target: self.target.clone(),
            tag: tag.to_string(),
            payload,
        };

        log::debug!("-> host {}.{}", message.target, message.tag);
        self.sink.deliver(&message);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Total messages delivered so far.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::simulated::RecordingHost;

    #[test]
    fn test_inbound_tags() {
        assert_eq!(InboundEvent::from_tag("Ready"), InboundEvent::Ready);
        assert_eq!(InboundEvent::from_tag("PostRender"), InboundEvent::PostRender);
        assert_eq!(
            InboundEvent::from_tag("ready"),
            InboundEvent::Unknown("ready".to_string())
        );
    }

    #[test]
    fn test_command_without_payload() {
        let host = Arc::new(RecordingHost::new());
        let bridge = HostBridge::new(host.clone(), "WebVRCameraSet");

        bridge.send(&HostCommand::Begin).unwrap();

        let messages = host.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].target, "WebVRCameraSet");
        assert_eq!(messages[0].tag, "Begin");
        assert!(messages[0].payload.is_none());
        assert_eq!(bridge.messages_sent(), 1);
    }

    #[test]
    fn test_raw_payload_is_json() {
        let host = Arc::new(RecordingHost::new());
        let bridge = HostBridge::new(host.clone(), "Rig");

        bridge.send_raw("Custom", Some(&vec![1, 2, 3])).unwrap();

        assert_eq!(host.messages()[0].payload.as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_tags_match_wire_names() {
        assert_eq!(HostCommand::TestTime.tag(), "TestTime");
        assert_eq!(HostCommand::TogglePerf.tag(), "TogglePerf");
        assert_eq!(HostCommand::End.tag(), "End");
    }
}
