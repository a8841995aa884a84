//! # SWARM
//!
//! Draws thousands of copies of one mesh with a single indirect draw call.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                             SWARM                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐      ┌──────────────────┐                 │
//! │  │   swarm_core     │      │   swarm_wgpu     │  (gpu feature)  │
//! │  │  • InstanceSet   │─────>│  • WgpuHost      │                 │
//! │  │  • FrameDriver   │      │  • bind groups   │                 │
//! │  │  • RecordingHost │      │  • culling       │                 │
//! │  └────────┬─────────┘      └──────────────────┘                 │
//! │           │                                                     │
//! │  ┌────────┴─────────┐                                           │
//! │  │  SwarmSource     │  seeded orbits, optional count pulse      │
//! │  │  run_headless    │  TOML-driven frame loop                   │
//! │  └──────────────────┘                                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: headless run configuration (`[instancing]` + `[demo]`)
//! - `runner`: frame loop against the recording host
//! - `source`: procedural instance source

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod runner;
pub mod source;

pub use swarm_core as core;

#[cfg(feature = "gpu")]
pub use swarm_wgpu as gpu;

pub use config::{DemoConfig, HeadlessConfig};
pub use runner::{run_headless, run_on, RunSummary};
pub use source::SwarmSource;
