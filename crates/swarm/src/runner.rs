//! Headless frame loop against the recording host.

use std::sync::Arc;

use swarm_core::recording::{RecordingHost, RecordingMaterial, RecordingMesh};
use swarm_core::{
    share_material, FrameDriver, InstancingLifecycle, InstancingResult, InstancingStats,
};

use crate::config::HeadlessConfig;
use crate::source::SwarmSource;

/// What a headless run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames ticked.
    pub frames: u64,
    /// Frames whose update failed.
    pub failed_frames: u64,
    /// Largest instance count drawn.
    pub peak_instances: u32,
    /// Largest number of bytes held by live buffers after a frame.
    pub peak_live_bytes: u64,
    /// Buffers still live after detach. Zero unless something leaked.
    pub leaked_buffers: usize,
    /// Host misuse recorded during the run.
    pub violations: usize,
    /// Instance set counters at detach.
    pub stats: InstancingStats,
}

impl RunSummary {
    /// Returns true if nothing failed, leaked or misused the host.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed_frames == 0 && self.leaked_buffers == 0 && self.violations == 0
    }
}

/// Runs the configured swarm for `demo.frames` frames on a fresh recording host.
///
/// Failed frames are counted and the loop carries on, the way a render loop
/// would.
///
/// # Errors
///
/// Fails only if the instance set cannot be attached.
pub fn run_headless(config: &HeadlessConfig) -> InstancingResult<RunSummary> {
    let mut host = RecordingHost::new();
    run_on(&mut host, config)
}

/// Like [`run_headless`], on a caller-supplied host.
///
/// # Errors
///
/// Fails only if the instance set cannot be attached.
pub fn run_on(host: &mut RecordingHost, config: &HeadlessConfig) -> InstancingResult<RunSummary> {
    let demo = &config.demo;
    let source = SwarmSource::new(config.instancing.layout, demo.instances, demo.seed, demo.radius)
        .with_pulse(demo.pulse);
    let mut driver = FrameDriver::new(
        config.instancing.clone(),
        Arc::new(RecordingMesh::cube()),
        share_material(RecordingMaterial::default()),
        source,
    );

    driver.on_attach(host)?;
    tracing::info!(
        layout = ?config.instancing.layout,
        instances = demo.instances,
        frames = demo.frames,
        "swarm attached"
    );

    let mut summary = RunSummary::default();
    for _ in 0..demo.frames {
        match driver.on_tick(host) {
            Ok(report) => {
                summary.peak_instances = summary.peak_instances.max(report.update.instance_count);
            }
            Err(_) => summary.failed_frames += 1,
        }
        summary.frames += 1;
        summary.peak_live_bytes = summary.peak_live_bytes.max(host.live_bytes());
        // Bounded memory on long runs
        host.clear_events();
    }

    summary.stats = driver.set().map(|set| set.stats()).unwrap_or_default();
    driver.on_detach(host);
    summary.leaked_buffers = host.live_buffer_count();
    summary.violations = host.violations().len();

    tracing::info!(?summary, "swarm detached");
    Ok(summary)
}
