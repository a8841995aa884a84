//! Host rendering capabilities consumed by the core.
//!
//! The core never talks to a graphics API directly. A host (a `wgpu` device,
//! an engine binding, or the headless [`RecordingHost`](crate::recording::RecordingHost))
//! implements [`RenderHost`] and owns the command stream. All calls are
//! fire-and-forget submissions; nothing here waits on the GPU.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::InstancingResult;
use crate::slots::ShaderSlot;

/// How a GPU buffer is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Structured buffer of fixed-size records, read by shaders via index.
    Structured,
    /// Indirect draw argument source.
    IndirectArguments,
}

/// Parameters for a buffer allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Intended usage.
    pub usage: BufferUsage,
    /// Number of records the buffer holds. May be zero.
    pub element_count: usize,
    /// Size of one record in bytes.
    pub element_stride: usize,
}

impl BufferDescriptor {
    /// Structured buffer of `element_count` records.
    #[must_use]
    pub const fn structured(element_count: usize, element_stride: usize) -> Self {
        Self {
            usage: BufferUsage::Structured,
            element_count,
            element_stride,
        }
    }

    /// Indirect argument buffer holding one record of `stride` bytes.
    #[must_use]
    pub const fn indirect(stride: usize) -> Self {
        Self {
            usage: BufferUsage::IndirectArguments,
            element_count: 1,
            element_stride: stride,
        }
    }

    /// Total size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        (self.element_count as u64) * (self.element_stride as u64)
    }
}

/// World-space draw bounds used by the host for culling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Center of the box.
    pub center: [f32; 3],
    /// Full size of the box on each axis.
    pub size: [f32; 3],
}

impl Bounds {
    /// Creates bounds from center and full size.
    #[must_use]
    pub const fn new(center: [f32; 3], size: [f32; 3]) -> Self {
        Self { center, size }
    }

    /// Half size on each axis.
    #[must_use]
    pub fn extents(&self) -> [f32; 3] {
        self.size.map(|s| s * 0.5)
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> [f32; 3] {
        let e = self.extents();
        [self.center[0] - e[0], self.center[1] - e[1], self.center[2] - e[2]]
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> [f32; 3] {
        let e = self.extents();
        [self.center[0] + e[0], self.center[1] + e[1], self.center[2] + e[2]]
    }
}

impl Default for Bounds {
    /// A 1000-unit cube around the origin.
    fn default() -> Self {
        Self::new([0.0; 3], [1000.0; 3])
    }
}

/// An indexed mesh the instances are drawn with.
pub trait MeshDescriptor {
    /// Index count of `submesh`, or `None` if the mesh has no such submesh.
    fn index_count(&self, submesh: u32) -> Option<u32>;

    /// Number of submeshes.
    fn submesh_count(&self) -> u32;
}

/// The shader-material interface buffers are bound to.
///
/// Owned by the host. The core only writes bindings, never reads them.
pub trait ShaderInterface<B> {
    /// Attaches `buffer` to `slot`, replacing any previous binding.
    fn bind_buffer(&mut self, slot: ShaderSlot, buffer: &B);
}

/// A material shared between the host and the instance set.
pub type SharedMaterial<M> = Arc<RwLock<M>>;

/// Wraps a host material for sharing with an instance set.
#[must_use]
pub fn share_material<M>(material: M) -> SharedMaterial<M> {
    Arc::new(RwLock::new(material))
}

/// Everything a host needs to submit one indirect instanced draw.
pub struct IndirectDraw<'a, H: RenderHost + ?Sized> {
    /// Mesh to draw.
    pub mesh: &'a H::Mesh,
    /// Submesh index.
    pub submesh_index: u32,
    /// Material carrying the current attribute bindings.
    pub material: &'a H::Material,
    /// Culling bounds.
    pub bounds: Bounds,
    /// Indirect argument buffer.
    pub args: &'a H::Buffer,
}

/// GPU capabilities the instancing core needs from its host.
pub trait RenderHost {
    /// Handle to a host GPU buffer. Cloning copies the handle, not the memory.
    type Buffer: Clone;
    /// Host mesh type.
    type Mesh: MeshDescriptor;
    /// Host material type.
    type Material: ShaderInterface<Self::Buffer>;

    /// Allocates a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::ResourceExhaustion`](crate::InstancingError::ResourceExhaustion)
    /// if the device cannot provide the memory.
    fn allocate_buffer(&mut self, desc: &BufferDescriptor) -> InstancingResult<Self::Buffer>;

    /// Copies `bytes` to the start of `buffer`.
    fn upload_buffer(&mut self, buffer: &Self::Buffer, bytes: &[u8]);

    /// Frees a buffer's GPU memory.
    fn release_buffer(&mut self, buffer: Self::Buffer);

    /// Submits one indirect instanced draw.
    fn draw_mesh_instanced_indirect(&mut self, draw: IndirectDraw<'_, Self>);
}
