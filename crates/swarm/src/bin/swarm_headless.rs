//! # SWARM Headless
//!
//! Runs a procedural swarm against the recording host and reports buffer
//! traffic. No GPU, no window.
//!
//! ```bash
//! # Defaults: 1000 colored instances, 120 frames
//! swarm_headless
//!
//! # From a config file, with debug logging
//! RUST_LOG=swarm_core=debug swarm_headless crates/swarm/configs/swarm_headless.toml
//! ```
//!
//! Exits non-zero if a frame failed, a buffer leaked or the host recorded misuse.

use std::process::ExitCode;

use swarm::{run_headless, HeadlessConfig};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match HeadlessConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, path = %path, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => HeadlessConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    SWARM HEADLESS v{}", env!("CARGO_PKG_VERSION"));
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Layout:     {:?}", config.instancing.layout);
    println!("  Policy:     {:?}", config.instancing.buffer_policy);
    println!("  Instances:  {}", config.demo.instances);
    println!("  Frames:     {}", config.demo.frames);
    println!();

    let summary = match run_headless(&config) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::error!(%err, "swarm could not be attached");
            return ExitCode::FAILURE;
        }
    };

    println!("  Draws:          {}", summary.stats.draws_submitted);
    println!("  Failed frames:  {}", summary.failed_frames);
    println!("  Peak instances: {}", summary.peak_instances);
    println!("  Peak GPU bytes: {}", summary.peak_live_bytes);
    println!("  Uploaded bytes: {}", summary.stats.bytes_uploaded);
    println!("  Allocations:    {}", summary.stats.buffers_allocated);
    println!("  Leaked buffers: {}", summary.leaked_buffers);
    println!("  Violations:     {}", summary.violations);

    if summary.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
