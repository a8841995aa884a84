//! # SWARM wgpu
//!
//! [`RenderHost`](swarm_core::RenderHost) implementation on a `wgpu` device.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  InstanceSet (swarm_core)                                    │
//! │     │ allocate / upload / release      │ draw                │
//! │     ↓                                  ↓                     │
//! │  WgpuHost ── limits check        Frustum test (culling)      │
//! │     │                                  ↓                     │
//! │  WgpuBuffer  STORAGE | COPY_DST  WgpuMaterial → bind group 0 │
//! │  WgpuBuffer  INDIRECT | COPY_DST       ↓                     │
//! │                                  render pass (load/store)    │
//! │                                  draw_indexed_indirect       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 20-byte draw argument record written by the core has the same layout
//! as wgpu's `DrawIndexedIndirect`, so the argument buffer is handed to
//! `draw_indexed_indirect` unchanged.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod culling;
pub mod host;
pub mod pipeline;
pub mod resources;

pub use culling::{Frustum, Plane};
pub use host::{allocation_size, usage_flags, HostStats, RenderTarget, WgpuHost};
pub use pipeline::{vertex_entry, InstancePipeline, DEPTH_FORMAT, SHADER_SOURCE};
pub use resources::{
    binding_index, cube_geometry, InstanceBindLayout, WgpuBuffer, WgpuMaterial, WgpuMesh,
};
