//! [`RenderHost`] on a wgpu device.
//!
//! ```text
//! allocate_buffer ── limit check → create_buffer (STORAGE | INDIRECT, COPY_DST)
//! upload_buffer   ── queue.write_buffer at offset 0
//! release_buffer  ── buffer.destroy()
//! draw            ── frustum test → bind group from material
//!                    → render pass (load/store) → draw_indexed_indirect → submit
//! ```

use std::sync::Arc;

use swarm_core::{
    BufferDescriptor, BufferUsage, IndirectDraw, InstancingError, InstancingResult, RenderHost,
};

use crate::culling::Frustum;
use crate::pipeline::InstancePipeline;
use crate::resources::{WgpuBuffer, WgpuMaterial, WgpuMesh};

/// Views the next draws render into.
#[derive(Debug)]
pub struct RenderTarget {
    /// Color attachment, loaded and stored.
    pub color: wgpu::TextureView,
    /// Depth attachment. Required when the pipeline was built with depth.
    pub depth: Option<wgpu::TextureView>,
}

/// Host-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Buffers created.
    pub buffers_allocated: u64,
    /// Buffers destroyed.
    pub buffers_released: u64,
    /// Bytes written through the queue.
    pub bytes_uploaded: u64,
    /// Indirect draws encoded and submitted.
    pub draws_submitted: u64,
    /// Draws skipped because the bounds were outside the frustum.
    pub draws_culled: u64,
    /// Draws dropped for a missing target, submesh or binding.
    pub draws_dropped: u64,
}

/// Computes the byte size of an allocation and checks it against `limits`.
///
/// Empty arrays still get one element of capacity, since wgpu rejects
/// zero-sized storage bindings. The result is rounded up to
/// [`wgpu::COPY_BUFFER_ALIGNMENT`].
///
/// # Errors
///
/// [`InstancingError::ResourceExhaustion`] if the size overflows or exceeds
/// the device's buffer or storage binding limits.
pub fn allocation_size(desc: &BufferDescriptor, limits: &wgpu::Limits) -> InstancingResult<u64> {
    let exhausted = |requested_bytes: u64, reason: String| InstancingError::ResourceExhaustion {
        requested_bytes,
        reason,
    };

    let count = desc.element_count.max(1) as u64;
    let size = count
        .checked_mul(desc.element_stride as u64)
        .and_then(|s| s.checked_next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT))
        .ok_or_else(|| exhausted(u64::MAX, "allocation size overflows".to_string()))?
        .max(wgpu::COPY_BUFFER_ALIGNMENT);

    if size > limits.max_buffer_size {
        return Err(exhausted(
            size,
            format!("device max_buffer_size is {}", limits.max_buffer_size),
        ));
    }
    if desc.usage == BufferUsage::Structured
        && size > u64::from(limits.max_storage_buffer_binding_size)
    {
        return Err(exhausted(
            size,
            format!(
                "device max_storage_buffer_binding_size is {}",
                limits.max_storage_buffer_binding_size
            ),
        ));
    }
    Ok(size)
}

/// Buffer usage flags for a descriptor.
#[must_use]
pub fn usage_flags(usage: BufferUsage) -> wgpu::BufferUsages {
    match usage {
        BufferUsage::Structured => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        BufferUsage::IndirectArguments => {
            wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST
        }
    }
}

/// A wgpu device, queue and pipeline acting as the instancing host.
pub struct WgpuHost {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    limits: wgpu::Limits,
    pipeline: InstancePipeline,
    target: Option<RenderTarget>,
    frustum: Option<Frustum>,
    stats: HostStats,
}

impl WgpuHost {
    /// Creates a host drawing with `pipeline`. No target is set yet.
    #[must_use]
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        pipeline: InstancePipeline,
    ) -> Self {
        let limits = device.limits();
        Self {
            device,
            queue,
            limits,
            pipeline,
            target: None,
            frustum: None,
            stats: HostStats::default(),
        }
    }

    /// Sets the views the next draws render into.
    pub fn set_target(&mut self, target: RenderTarget) {
        if self.pipeline.has_depth() && target.depth.is_none() {
            tracing::warn!("pipeline writes depth but target has no depth view");
        }
        self.target = Some(target);
    }

    /// Drops the current target. Draws are dropped until a new one is set.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Updates the camera uniform and the culling frustum.
    pub fn set_view_projection(&mut self, view_projection: &[[f32; 4]; 4]) {
        self.pipeline.write_camera(&self.queue, view_projection);
        self.frustum = Some(Frustum::from_view_projection(view_projection));
    }

    /// The device.
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue.
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &InstancePipeline {
        &self.pipeline
    }

    /// Host counters.
    #[must_use]
    pub const fn stats(&self) -> HostStats {
        self.stats
    }

    fn drop_draw(&mut self, reason: &str) {
        self.stats.draws_dropped += 1;
        tracing::warn!(reason, "indirect draw dropped");
    }
}

impl RenderHost for WgpuHost {
    type Buffer = WgpuBuffer;
    type Mesh = WgpuMesh;
    type Material = WgpuMaterial;

    fn allocate_buffer(&mut self, desc: &BufferDescriptor) -> InstancingResult<WgpuBuffer> {
        let size = allocation_size(desc, &self.limits)?;
        let raw = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(match desc.usage {
                BufferUsage::Structured => "Swarm Attribute Buffer",
                BufferUsage::IndirectArguments => "Swarm Draw Args",
            }),
            size,
            usage: usage_flags(desc.usage),
            mapped_at_creation: false,
        });
        self.stats.buffers_allocated += 1;
        tracing::debug!(usage = ?desc.usage, size, "gpu buffer allocated");
        Ok(WgpuBuffer::new(raw, size))
    }

    fn upload_buffer(&mut self, buffer: &WgpuBuffer, bytes: &[u8]) {
        let len = bytes.len() as u64;
        if len == 0 {
            return;
        }
        if len > buffer.size() {
            tracing::warn!(len, size = buffer.size(), "upload larger than buffer, skipped");
            return;
        }
        if len % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            self.queue.write_buffer(buffer.raw(), 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(len.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize, 0);
            self.queue.write_buffer(buffer.raw(), 0, &padded);
        }
        self.stats.bytes_uploaded += len;
    }

    fn release_buffer(&mut self, buffer: WgpuBuffer) {
        buffer.raw().destroy();
        self.stats.buffers_released += 1;
    }

    fn draw_mesh_instanced_indirect(&mut self, draw: IndirectDraw<'_, Self>) {
        if let Some(frustum) = &self.frustum {
            if !frustum.intersects(&draw.bounds) {
                self.stats.draws_culled += 1;
                tracing::trace!(bounds = ?draw.bounds, "instance set culled");
                return;
            }
        }
        if self.target.is_none() {
            return self.drop_draw("no render target");
        }
        let Some(indices) = draw.mesh.indices(draw.submesh_index) else {
            return self.drop_draw("submesh has no index buffer");
        };
        let Some(bind_group) = draw
            .material
            .bind_group(&self.device, self.pipeline.bind_layout())
        else {
            return self.drop_draw("attribute buffer unbound");
        };
        let Some(target) = self.target.as_ref() else {
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Swarm Draw Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Swarm Instanced Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: target.depth.as_ref().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });

            pass.set_pipeline(self.pipeline.raw());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_bind_group(1, self.pipeline.camera_group(), &[]);
            pass.set_vertex_buffer(0, draw.mesh.vertices().slice(..));
            pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed_indirect(draw.args.raw(), 0);
        }
        self.queue.submit(Some(encoder.finish()));
        self.stats.draws_submitted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_array_padded_to_one_element() {
        let limits = wgpu::Limits::default();
        assert_eq!(
            allocation_size(&BufferDescriptor::structured(0, 12), &limits),
            Ok(12)
        );
        assert_eq!(
            allocation_size(&BufferDescriptor::structured(3, 16), &limits),
            Ok(48)
        );
        assert_eq!(allocation_size(&BufferDescriptor::indirect(20), &limits), Ok(20));
    }

    #[test]
    fn test_storage_binding_limit() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 1024,
            ..wgpu::Limits::default()
        };
        let result = allocation_size(&BufferDescriptor::structured(100, 12), &limits);
        assert!(matches!(
            result,
            Err(InstancingError::ResourceExhaustion { requested_bytes: 1200, .. })
        ));
    }

    #[test]
    fn test_size_overflow() {
        let result = allocation_size(
            &BufferDescriptor::structured(usize::MAX, 16),
            &wgpu::Limits::default(),
        );
        assert!(matches!(result, Err(InstancingError::ResourceExhaustion { .. })));
    }

    #[test]
    fn test_usage_flags() {
        assert!(usage_flags(BufferUsage::Structured).contains(wgpu::BufferUsages::STORAGE));
        assert!(usage_flags(BufferUsage::IndirectArguments).contains(wgpu::BufferUsages::INDIRECT));
        assert!(usage_flags(BufferUsage::IndirectArguments).contains(wgpu::BufferUsages::COPY_DST));
    }
}
