//! Instance set manager.
//!
//! Owns every buffer of one drawable entity and keeps them consistent:
//!
//! ```text
//! update_view(arrays)
//!   ├── count = positions.len()
//!   ├── validate lengths (LengthPolicy)
//!   ├── DrawArgsBuffer.rebuild(index_count, count)
//!   └── AttributeBuffer.rebuild(array) + bind, for each attribute
//! draw()
//!   └── one indirect instanced draw (mesh, submesh, material, bounds, args)
//! shutdown()
//!   └── release every buffer
//! ```

use std::sync::Arc;

use super::{AttributeBuffer, BufferStats, DrawArgs, DrawArgsBuffer};
use crate::attributes::{AttributeKind, InstanceArrays};
use crate::config::{InstancingConfig, LengthPolicy};
use crate::error::{InstancingError, InstancingResult};
use crate::host::{IndirectDraw, MeshDescriptor, RenderHost, SharedMaterial};
use crate::stats::{DrawOutcome, InstancingStats, UpdateReport};

/// Lifecycle state of an [`InstanceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetState {
    /// No successful update yet. `draw` is a no-op.
    Uninitialized,
    /// Buffers built at least once.
    Ready,
    /// Shut down. Terminal.
    Released,
}

/// All GPU buffers of one drawable entity, plus the state that ties them together.
pub struct InstanceSet<H: RenderHost> {
    config: InstancingConfig,
    mesh: Arc<H::Mesh>,
    material: SharedMaterial<H::Material>,
    args: DrawArgsBuffer<H>,
    attributes: Vec<AttributeBuffer<H>>,
    state: SetState,
    /// False while the last update failed part-way.
    frame_valid: bool,
    updates: u64,
    draws_submitted: u64,
    draws_skipped: u64,
}

impl<H: RenderHost> InstanceSet<H> {
    /// Creates an instance set drawing `mesh` with `material`.
    ///
    /// The index count of the configured submesh is read once here and never
    /// changes afterwards.
    ///
    /// # Errors
    ///
    /// - [`InstancingError::SubmeshOutOfRange`] if the mesh lacks the configured submesh.
    /// - [`InstancingError::InvalidConfig`] if the config does not validate.
    pub fn new(
        config: InstancingConfig,
        mesh: Arc<H::Mesh>,
        material: SharedMaterial<H::Material>,
    ) -> InstancingResult<Self> {
        config.validate()?;
        let index_count = mesh.index_count(config.submesh_index).ok_or(
            InstancingError::SubmeshOutOfRange {
                submesh: config.submesh_index,
                available: mesh.submesh_count(),
            },
        )?;

        let attributes = config
            .layout
            .attributes()
            .iter()
            .map(|&kind| AttributeBuffer::new(kind, config.buffer_policy))
            .collect();

        tracing::debug!(
            layout = ?config.layout,
            index_count,
            policy = ?config.buffer_policy,
            "created instance set"
        );

        Ok(Self {
            args: DrawArgsBuffer::new(index_count, config.buffer_policy),
            config,
            mesh,
            material,
            attributes,
            state: SetState::Uninitialized,
            frame_valid: false,
            updates: 0,
            draws_submitted: 0,
            draws_skipped: 0,
        })
    }

    /// Rebuilds the argument buffer and every attribute buffer from `arrays`.
    ///
    /// The instance count is the position array length. Call once per frame,
    /// before [`draw`](Self::draw).
    ///
    /// # Errors
    ///
    /// - [`InstancingError::Released`] after [`shutdown`](Self::shutdown).
    /// - [`InstancingError::InstanceCountOverflow`] above `u32::MAX` instances.
    /// - [`InstancingError::MissingAttribute`] if the layout needs an array
    ///   the frame did not supply.
    /// - [`InstancingError::LengthMismatch`] under [`LengthPolicy::Strict`].
    ///   No buffer is touched in that case.
    /// - `ResourceExhaustion` from the host. The frame is then invalid and
    ///   `draw` submits nothing until the next successful update.
    pub fn update_view(
        &mut self,
        host: &mut H,
        arrays: &InstanceArrays<'_>,
    ) -> InstancingResult<UpdateReport> {
        if self.state == SetState::Released {
            return Err(InstancingError::Released);
        }

        let count = arrays.count();
        let instance_count =
            u32::try_from(count).map_err(|_| InstancingError::InstanceCountOverflow(count))?;
        self.validate_lengths(arrays, count)?;

        let before = self.buffer_totals();
        self.frame_valid = false;

        self.args.rebuild(host, instance_count)?;
        for buffer in &mut self.attributes {
            let kind = buffer.kind();
            let array = arrays.get(kind).ok_or(InstancingError::MissingAttribute(kind))?;
            let mut material = self.material.write();
            buffer.rebuild(host, &mut *material, array)?;
        }

        self.frame_valid = true;
        if self.state == SetState::Uninitialized {
            tracing::info!(instance_count, "instance set ready");
        }
        self.state = SetState::Ready;
        self.updates += 1;

        let after = self.buffer_totals();
        Ok(UpdateReport {
            instance_count,
            buffers_allocated: u32::try_from(after.allocations - before.allocations)
                .unwrap_or(u32::MAX),
            bytes_uploaded: after.bytes_uploaded - before.bytes_uploaded,
        })
    }

    fn validate_lengths(&self, arrays: &InstanceArrays<'_>, count: usize) -> InstancingResult<()> {
        for buffer in &self.attributes {
            let kind = buffer.kind();
            let array = arrays.get(kind).ok_or(InstancingError::MissingAttribute(kind))?;
            if array.len() == count {
                continue;
            }
            match self.config.length_policy {
                LengthPolicy::Strict => {
                    return Err(InstancingError::LengthMismatch {
                        attribute: kind,
                        expected: count,
                        actual: array.len(),
                    });
                }
                LengthPolicy::BestEffort => {
                    // The draw reads `count` records from this buffer regardless.
                    tracing::warn!(
                        attribute = %kind,
                        expected = count,
                        actual = array.len(),
                        "attribute length differs from instance count"
                    );
                }
            }
        }
        Ok(())
    }

    /// Issues the indirect draw.
    ///
    /// Before the first successful update this is a silent no-op, as is a
    /// frame whose update failed part-way.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::Released`] after [`shutdown`](Self::shutdown).
    pub fn draw(&mut self, host: &mut H) -> InstancingResult<DrawOutcome> {
        match self.state {
            SetState::Released => return Err(InstancingError::Released),
            SetState::Uninitialized => {
                self.draws_skipped += 1;
                return Ok(DrawOutcome::Uninitialized);
            }
            SetState::Ready => {}
        }

        let args = match self.args.buffer() {
            Some(args) if self.frame_valid => args,
            _ => {
                tracing::warn!("skipping draw: last update did not complete");
                self.draws_skipped += 1;
                return Ok(DrawOutcome::InvalidFrame);
            }
        };

        {
            let material = self.material.read();
            host.draw_mesh_instanced_indirect(IndirectDraw {
                mesh: &*self.mesh,
                submesh_index: self.config.submesh_index,
                material: &*material,
                bounds: self.config.bounds,
                args,
            });
        }

        self.draws_submitted += 1;
        Ok(DrawOutcome::Submitted {
            instance_count: self.args.args().instance_count,
        })
    }

    /// Releases every owned GPU buffer. Safe to call more than once.
    ///
    /// Must run before the host releases the mesh or material.
    pub fn shutdown(&mut self, host: &mut H) {
        self.args.release(host);
        for buffer in &mut self.attributes {
            buffer.release(host);
        }
        if self.state != SetState::Released {
            tracing::info!(updates = self.updates, "instance set released");
        }
        self.state = SetState::Released;
        self.frame_valid = false;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SetState {
        self.state
    }

    /// Configuration the set was created with.
    #[must_use]
    pub const fn config(&self) -> &InstancingConfig {
        &self.config
    }

    /// Current draw arguments.
    #[must_use]
    pub const fn draw_args(&self) -> DrawArgs {
        self.args.args()
    }

    /// The argument buffer wrapper.
    #[must_use]
    pub const fn args_buffer(&self) -> &DrawArgsBuffer<H> {
        &self.args
    }

    /// The buffer for `kind`, if the layout carries it.
    #[must_use]
    pub fn attribute(&self, kind: AttributeKind) -> Option<&AttributeBuffer<H>> {
        self.attributes.iter().find(|b| b.kind() == kind)
    }

    /// All attribute buffers, in rebuild order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeBuffer<H>] {
        &self.attributes
    }

    /// The shared material bindings are written to.
    #[must_use]
    pub const fn material(&self) -> &SharedMaterial<H::Material> {
        &self.material
    }

    /// The mesh the instances are drawn with.
    #[must_use]
    pub fn mesh(&self) -> &H::Mesh {
        &self.mesh
    }

    /// Returns true if every buffer is built and sized for the current instance count.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let count = self.args.args().instance_count as usize;
        self.args.is_built()
            && self
                .attributes
                .iter()
                .all(|b| b.buffer().is_some() && b.len() == count && b.capacity() >= count)
    }

    /// Cumulative statistics.
    #[must_use]
    pub fn stats(&self) -> InstancingStats {
        let totals = self.buffer_totals();
        InstancingStats {
            updates: self.updates,
            buffers_allocated: totals.allocations,
            buffers_released: totals.releases,
            bytes_uploaded: totals.bytes_uploaded,
            draws_submitted: self.draws_submitted,
            draws_skipped: self.draws_skipped,
        }
    }

    fn buffer_totals(&self) -> BufferStats {
        self.attributes
            .iter()
            .fold(self.args.stats(), |acc, b| acc + b.stats())
    }
}

impl<H: RenderHost> Drop for InstanceSet<H> {
    fn drop(&mut self) {
        let live = self.stats().live_buffers();
        if self.state != SetState::Released && live > 0 {
            tracing::warn!(live, "instance set dropped without shutdown, GPU buffers leaked");
        }
    }
}
