//! GPU-side resource types handed to the instancing core.
//!
//! ```text
//! WgpuBuffer    ── Arc<wgpu::Buffer> + size; cloning shares the handle
//! WgpuMesh      ── vertex positions + one index buffer per submesh
//! WgpuMaterial  ── ShaderSlot → WgpuBuffer, turned into a bind group at draw
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use swarm_core::{AttributeKind, InstanceLayout, MeshDescriptor, ShaderInterface, ShaderSlot};
use wgpu::util::DeviceExt;

/// Storage binding index of an attribute in bind group 0.
///
/// Fixed per attribute so one shader module serves every layout.
#[must_use]
pub const fn binding_index(kind: AttributeKind) -> u32 {
    match kind {
        AttributeKind::Position => 0,
        AttributeKind::Rotation => 1,
        AttributeKind::Size => 2,
        AttributeKind::Color => 3,
    }
}

/// A GPU buffer handle.
#[derive(Debug, Clone)]
pub struct WgpuBuffer {
    raw: Arc<wgpu::Buffer>,
    size: u64,
}

impl WgpuBuffer {
    pub(crate) fn new(raw: wgpu::Buffer, size: u64) -> Self {
        Self {
            raw: Arc::new(raw),
            size,
        }
    }

    /// The underlying buffer.
    #[must_use]
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.raw
    }

    /// Allocated size in bytes. At least one element, even for empty arrays.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// Vertex positions of a mesh and the index buffer of each submesh.
#[derive(Debug)]
pub struct WgpuMesh {
    vertices: wgpu::Buffer,
    submeshes: Vec<(wgpu::Buffer, u32)>,
}

impl WgpuMesh {
    /// Uploads a mesh. Each entry of `submeshes` is one index list into `vertices`.
    #[must_use]
    pub fn new(device: &wgpu::Device, vertices: &[[f32; 3]], submeshes: &[Vec<u32>]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Swarm Mesh Vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let submeshes = submeshes
            .iter()
            .map(|indices| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Swarm Mesh Indices"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (buffer, u32::try_from(indices.len()).unwrap_or(u32::MAX))
            })
            .collect();

        Self {
            vertices: vertex_buffer,
            submeshes,
        }
    }

    /// Unit cube centered on the origin, one submesh.
    #[must_use]
    pub fn cube(device: &wgpu::Device) -> Self {
        let (vertices, indices) = cube_geometry();
        Self::new(device, &vertices, &[indices])
    }

    /// Vertex buffer (`Float32x3` positions).
    #[must_use]
    pub const fn vertices(&self) -> &wgpu::Buffer {
        &self.vertices
    }

    /// Index buffer (`Uint32`) of `submesh`.
    #[must_use]
    pub fn indices(&self, submesh: u32) -> Option<&wgpu::Buffer> {
        self.submeshes.get(submesh as usize).map(|(buffer, _)| buffer)
    }
}

impl MeshDescriptor for WgpuMesh {
    fn index_count(&self, submesh: u32) -> Option<u32> {
        self.submeshes.get(submesh as usize).map(|&(_, count)| count)
    }

    fn submesh_count(&self) -> u32 {
        u32::try_from(self.submeshes.len()).unwrap_or(u32::MAX)
    }
}

/// Eight corners and 36 counter-clockwise indices of a unit cube.
#[must_use]
pub fn cube_geometry() -> (Vec<[f32; 3]>, Vec<u32>) {
    let vertices = (0..8u32)
        .map(|i| {
            let corner = |bit: u32| if i & bit == 0 { -0.5 } else { 0.5 };
            [corner(1), corner(2), corner(4)]
        })
        .collect();
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    (vertices, indices)
}

/// Material: the storage buffer currently bound to each attribute slot.
#[derive(Debug, Clone, Default)]
pub struct WgpuMaterial {
    bindings: BTreeMap<ShaderSlot, WgpuBuffer>,
}

impl WgpuMaterial {
    /// Creates a material with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer bound to `slot`.
    #[must_use]
    pub fn binding(&self, slot: ShaderSlot) -> Option<&WgpuBuffer> {
        self.bindings.get(&slot)
    }

    /// Builds bind group 0 for `layout`, or `None` if an attribute is unbound.
    #[must_use]
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        bind_layout: &InstanceBindLayout,
    ) -> Option<wgpu::BindGroup> {
        let entries = bind_layout
            .layout
            .attributes()
            .iter()
            .map(|&kind| {
                self.binding(kind.slot()).map(|buffer| wgpu::BindGroupEntry {
                    binding: binding_index(kind),
                    resource: buffer.raw().as_entire_binding(),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Swarm Instance Bind Group"),
            layout: &bind_layout.raw,
            entries: &entries,
        }))
    }
}

impl ShaderInterface<WgpuBuffer> for WgpuMaterial {
    fn bind_buffer(&mut self, slot: ShaderSlot, buffer: &WgpuBuffer) {
        self.bindings.insert(slot, buffer.clone());
    }
}

/// Bind group layout with one read-only storage entry per attribute of a layout.
#[derive(Debug)]
pub struct InstanceBindLayout {
    layout: InstanceLayout,
    raw: wgpu::BindGroupLayout,
}

impl InstanceBindLayout {
    /// Creates the layout for `layout`'s attributes, visible to the vertex stage.
    #[must_use]
    pub fn for_layout(device: &wgpu::Device, layout: InstanceLayout) -> Self {
        let entries = layout_entries(layout);
        let raw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Swarm Instance Layout"),
            entries: &entries,
        });
        Self { layout, raw }
    }

    /// The instance layout this bind layout serves.
    #[must_use]
    pub const fn instance_layout(&self) -> InstanceLayout {
        self.layout
    }

    /// The wgpu layout.
    #[must_use]
    pub const fn raw(&self) -> &wgpu::BindGroupLayout {
        &self.raw
    }
}

/// Bind group layout entries for `layout`, one per attribute.
#[must_use]
pub fn layout_entries(layout: InstanceLayout) -> Vec<wgpu::BindGroupLayoutEntry> {
    layout
        .attributes()
        .iter()
        .map(|&kind| wgpu::BindGroupLayoutEntry {
            binding: binding_index(kind),
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect()
}
