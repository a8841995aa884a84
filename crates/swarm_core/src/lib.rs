//! # SWARM Core
//!
//! GPU-agnostic instance buffer lifecycle for drawing thousands of copies of
//! one mesh with a single indirect draw call.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          ONE FRAME                             │
//! ├────────────────────────────────────────────────────────────────┤
//! │  InstanceSource → FrameDriver.on_tick                          │
//! │                        ↓                                       │
//! │  InstanceSet.update_view                                       │
//! │     ├── DrawArgsBuffer   {index_count, instance_count, 0,0,0}  │
//! │     └── AttributeBuffer  × N  → ShaderInterface.bind_buffer    │
//! │                        ↓                                       │
//! │  InstanceSet.draw → RenderHost.draw_mesh_instanced_indirect    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - The position array length is the instance count, and every buffer bound
//!   for a draw is sized from it
//! - Buffers are owned by exactly one wrapper and released exactly once
//! - No GPU API here: hosts implement [`RenderHost`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use swarm_core::recording::{RecordingHost, RecordingMaterial, RecordingMesh};
//! use swarm_core::{
//!     share_material, FrameDriver, InstanceData, InstanceLayout, InstancingConfig,
//!     InstancingLifecycle,
//! };
//!
//! let mut host = RecordingHost::new();
//! let mut driver = FrameDriver::new(
//!     InstancingConfig::for_layout(InstanceLayout::Colored),
//!     Arc::new(RecordingMesh::cube()),
//!     share_material(RecordingMaterial::default()),
//!     InstanceData::uniform(InstanceLayout::Colored, 1000),
//! );
//!
//! driver.on_attach(&mut host)?;
//! let report = driver.on_tick(&mut host)?;
//! assert!(report.draw.is_submitted());
//! driver.on_detach(&mut host);
//! # Ok::<(), swarm_core::InstancingError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod attributes;
pub mod config;
pub mod error;
pub mod frame;
pub mod host;
pub mod instancing;
pub mod recording;
pub mod slots;
pub mod stats;

pub use attributes::{
    AttributeArray, AttributeKind, Color, InstanceArrays, InstanceLayout, RecordType, Vec3,
};
pub use config::{BufferPolicy, InstancingConfig, LengthPolicy};
pub use error::{InstancingError, InstancingResult};
pub use frame::{FrameDriver, InstanceData, InstanceSource, InstancingLifecycle};
pub use host::{
    share_material, Bounds, BufferDescriptor, BufferUsage, IndirectDraw, MeshDescriptor,
    RenderHost, ShaderInterface, SharedMaterial,
};
pub use instancing::{
    AttributeBuffer, BufferStats, DrawArgs, DrawArgsBuffer, InstanceSet, SetState,
};
pub use slots::ShaderSlot;
pub use stats::{DrawOutcome, FrameReport, InstancingStats, UpdateReport};
