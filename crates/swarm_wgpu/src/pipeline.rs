//! Render pipeline for instanced meshes.
//!
//! Bind group 0 holds the per-instance storage buffers (see
//! [`binding_index`](crate::resources::binding_index)), bind group 1 the
//! camera uniform. Vertex buffer 0 is the mesh's `Float32x3` positions.

use swarm_core::InstanceLayout;

use crate::resources::InstanceBindLayout;

/// WGSL source of the instanced mesh shader.
pub const SHADER_SOURCE: &str = include_str!("../shaders/instanced.wgsl");

/// Depth format expected by pipelines created with a depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CAMERA_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;

/// Vertex entry point for `layout`.
#[must_use]
pub const fn vertex_entry(layout: InstanceLayout) -> &'static str {
    match layout {
        InstanceLayout::Colored => "vs_colored",
        InstanceLayout::Transformed => "vs_transformed",
    }
}

/// Pipeline, bind layouts and camera uniform for one instance layout.
#[derive(Debug)]
pub struct InstancePipeline {
    bind_layout: InstanceBindLayout,
    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    depth: bool,
    raw: wgpu::RenderPipeline,
}

impl InstancePipeline {
    /// Builds the pipeline for `layout`, drawing into `color_format`.
    ///
    /// With `depth` set, render targets must carry a [`DEPTH_FORMAT`] view.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        layout: InstanceLayout,
        color_format: wgpu::TextureFormat,
        depth: bool,
    ) -> Self {
        let bind_layout = InstanceBindLayout::for_layout(device, layout);

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Swarm Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Swarm Camera Uniform"),
            size: CAMERA_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Swarm Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Swarm Instanced Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Swarm Pipeline Layout"),
            bind_group_layouts: &[bind_layout.raw(), &camera_layout],
            push_constant_ranges: &[],
        });

        let raw = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Swarm Instanced Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: vertex_entry(layout),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: depth.then(|| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        tracing::debug!(?layout, ?color_format, depth, "instanced pipeline created");
        Self {
            bind_layout,
            camera_buffer,
            camera_group,
            depth,
            raw,
        }
    }

    /// Writes the camera's column-major view-projection matrix.
    pub fn write_camera(&self, queue: &wgpu::Queue, view_projection: &[[f32; 4]; 4]) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(view_projection));
    }

    /// Layout of bind group 0.
    #[must_use]
    pub const fn bind_layout(&self) -> &InstanceBindLayout {
        &self.bind_layout
    }

    /// Bind group 1.
    #[must_use]
    pub const fn camera_group(&self) -> &wgpu::BindGroup {
        &self.camera_group
    }

    /// Returns true if the pipeline writes depth.
    #[must_use]
    pub const fn has_depth(&self) -> bool {
        self.depth
    }

    /// The wgpu pipeline.
    #[must_use]
    pub const fn raw(&self) -> &wgpu::RenderPipeline {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_exist() {
        for layout in [InstanceLayout::Colored, InstanceLayout::Transformed] {
            let entry = format!("fn {}(", vertex_entry(layout));
            assert!(SHADER_SOURCE.contains(&entry), "missing {entry}");
        }
        assert!(SHADER_SOURCE.contains("fn fs_main("));
    }

    #[test]
    fn test_camera_size() {
        assert_eq!(CAMERA_SIZE, 64);
    }
}
