//! # WebVR Bridge Demo
//!
//! This example walks one simulated headset through a full session:
//! discovery, entering VR, a few frames, a latency probe and leaving VR.
//!
//! Run with: `cargo run --example demo`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use webvr_bridge::platform::simulated::{SimulatedDisplay, SimulatedPlatform};
use webvr_bridge::platform::{EyeParameters, RawGamepad, RawPose, StageParameters};
use webvr_bridge::{Config, InboundEvent, VrBridge};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    webvr_bridge::init_logging();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           WebVR Bridge Demo                                ║");
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║ This demo drives a simulated headset and rendering host    ║");
    println!("║ through one presentation session.                          ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let display = Arc::new(
        SimulatedDisplay::new("Simulated HMD")
            .with_eyes(
                EyeParameters {
                    render_width: 1344,
                    render_height: 1600,
                },
                EyeParameters {
                    render_width: 1344,
                    render_height: 1600,
                },
            )
            .with_stage(StageParameters {
                sitting_to_standing_transform: [
                    1.0, 0.0, 0.0, 0.0, //
                    0.0, 1.0, 0.0, 0.0, //
                    0.0, 0.0, 1.0, 0.0, //
                    0.0, 1.7, 0.0, 1.0,
                ],
            }),
    );
    let sim = SimulatedPlatform::new(vec![display.clone()]);
    sim.gamepads.set_slots(vec![Some(simulated_controller(0, "left")), None]);

    let bridge = VrBridge::new(Config::default(), sim.platform())
        .context("Failed to create bridge")?;

    println!("📋 Configuration:");
    println!("   Host target: {}", bridge.config().host_target);
    println!(
        "   Default standing height: {} m",
        bridge.config().default_standing_height
    );
    println!();

    // The host finishes loading; this also triggers discovery
    bridge.start();
    bridge.dispatch(InboundEvent::Ready).await;

    let signals = bridge.signals();
    println!("🔍 Discovery:");
    match bridge.devices().active() {
        Some(device) => println!("   Active display: {}", device.display_name()),
        None => println!("   No display found"),
    }
    println!("   Enter VR enabled: {}", signals.presentation_enabled);
    println!();

    println!("🥽 Entering VR...");
    let outcome = bridge.toggle_presentation().await?;
    println!("   Outcome: {:?}", outcome);
    println!("   State: {:?}", bridge.presentation().state());
    println!();

    println!("🎮 Running 5 frames...");
    for frame in 0..5 {
        if let Some(snapshot) = bridge.tick()? {
            println!(
                "   Frame {} | controllers: {} | sit-stand height: {:.2}",
                frame,
                snapshot.controllers.len(),
                snapshot.sit_stand[7]
            );
        }
        bridge.dispatch(InboundEvent::PreRender).await;
        bridge.dispatch(InboundEvent::PostRender).await;
        tokio::time::sleep(Duration::from_millis(11)).await;
    }
    println!();

    println!("⏱️  Measuring host round-trip...");
    bridge.handle_key("v").await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    bridge.dispatch(InboundEvent::Timer).await;
    if let Some(elapsed) = bridge.last_round_trip() {
        println!("   Round trip: {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    }
    println!();

    println!("🚪 Leaving VR...");
    bridge.handle_key("Escape").await?;
    println!("   State: {:?}", bridge.presentation().state());
    println!();

    let stats = bridge.stats();
    let scheduler = bridge.scheduler().stats();
    println!("📊 Final Statistics:");
    println!("   Ticks: {}", stats.ticks);
    println!("   Snapshots sent: {}", stats.snapshots_sent);
    println!("   Frames submitted: {}", stats.frames_submitted);
    println!(
        "   Ticks on headset clock: {} | on page clock: {}",
        scheduler.device_ticks, scheduler.ambient_ticks
    );
    println!("   Messages to host: {}", bridge.host().messages_sent());
    println!("   Host saw: {:?}", sim.host.tags());

    println!();
    println!("✅ Demo complete!");
    Ok(())
}

/// A tracked controller held at chest height.
fn simulated_controller(index: u32, hand: &str) -> RawGamepad {
    RawGamepad {
        index,
        hand: hand.to_string(),
        display_id: Some(1),
        pose: Some(RawPose {
            position: Some([-0.2, 1.2, -0.3]),
            orientation: Some([0.0, 0.0, 0.0, 1.0]),
            linear_velocity: Some([0.0, 0.0, 0.0]),
            angular_velocity: None,
        }),
        buttons: Vec::new(),
    }
}
