//! Headless host that records every GPU call instead of executing it.
//!
//! Used by the test suite, the benchmarks and the `swarm_headless` binary.
//! Buffer contents are kept in CPU memory so callers can inspect exactly
//! what would have reached the GPU, and misuse (uploading to or drawing with
//! a released buffer) is recorded as a [`HostViolation`].

use std::collections::BTreeMap;

use bytemuck::Pod;

use crate::error::{InstancingError, InstancingResult};
use crate::host::{
    Bounds, BufferDescriptor, BufferUsage, IndirectDraw, MeshDescriptor, RenderHost,
    ShaderInterface,
};
use crate::instancing::DrawArgs;
use crate::slots::ShaderSlot;

/// Handle of a recorded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Raw id. Ids are never reused.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A buffer as the recording host sees it.
#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    /// Allocation parameters.
    pub descriptor: BufferDescriptor,
    /// Current contents. Emptied on release.
    pub data: Vec<u8>,
    /// False once released.
    pub live: bool,
}

/// One GPU call, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Buffer allocated.
    Allocate(BufferId),
    /// Bytes uploaded to a buffer.
    Upload(BufferId, usize),
    /// Buffer released.
    Release(BufferId),
    /// Indirect draw submitted (index into [`RecordingHost::draws`]).
    Draw(usize),
}

/// Misuse detected by the recording host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostViolation {
    /// Upload into a released or unknown buffer.
    UploadToDeadBuffer(BufferId),
    /// Upload larger than the buffer.
    UploadOverflow {
        /// Target buffer.
        buffer: BufferId,
        /// Bytes offered.
        bytes: usize,
        /// Buffer size.
        size: usize,
    },
    /// Release of a released or unknown buffer.
    DoubleRelease(BufferId),
    /// A draw referenced a released argument buffer or binding.
    DrawWithDeadBuffer(BufferId),
    /// A draw read its arguments from a buffer not allocated as an indirect
    /// argument source.
    ArgsBufferNotIndirect(BufferId),
}

/// A submitted draw with the state the GPU would have seen.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Submesh index.
    pub submesh_index: u32,
    /// Culling bounds.
    pub bounds: Bounds,
    /// Argument buffer.
    pub args_buffer: BufferId,
    /// Argument record read from the buffer at submission time.
    pub args: DrawArgs,
    /// Material bindings at submission time.
    pub bindings: BTreeMap<ShaderSlot, BufferId>,
}

/// Mesh with one index count per submesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingMesh {
    index_counts: Vec<u32>,
}

impl RecordingMesh {
    /// Creates a mesh with the given per-submesh index counts.
    #[must_use]
    pub fn new(index_counts: Vec<u32>) -> Self {
        Self { index_counts }
    }

    /// A unit cube: one submesh, 36 indices.
    #[must_use]
    pub fn cube() -> Self {
        Self::new(vec![36])
    }
}

impl MeshDescriptor for RecordingMesh {
    fn index_count(&self, submesh: u32) -> Option<u32> {
        self.index_counts.get(submesh as usize).copied()
    }

    fn submesh_count(&self) -> u32 {
        u32::try_from(self.index_counts.len()).unwrap_or(u32::MAX)
    }
}

/// Material that remembers the last buffer bound to each slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingMaterial {
    bindings: BTreeMap<ShaderSlot, BufferId>,
    bind_calls: u64,
}

impl RecordingMaterial {
    /// Buffer currently bound to `slot`.
    #[must_use]
    pub fn binding(&self, slot: ShaderSlot) -> Option<BufferId> {
        self.bindings.get(&slot).copied()
    }

    /// All bindings.
    #[must_use]
    pub const fn bindings(&self) -> &BTreeMap<ShaderSlot, BufferId> {
        &self.bindings
    }

    /// Number of `bind_buffer` calls so far.
    #[must_use]
    pub const fn bind_calls(&self) -> u64 {
        self.bind_calls
    }
}

impl ShaderInterface<BufferId> for RecordingMaterial {
    fn bind_buffer(&mut self, slot: ShaderSlot, buffer: &BufferId) {
        self.bindings.insert(slot, *buffer);
        self.bind_calls += 1;
    }
}

/// Records GPU calls in memory.
#[derive(Debug, Default)]
pub struct RecordingHost {
    next_id: u64,
    buffers: BTreeMap<BufferId, RecordedBuffer>,
    events: Vec<HostEvent>,
    draws: Vec<DrawRecord>,
    violations: Vec<HostViolation>,
    fail_countdown: Option<u32>,
    memory_budget: Option<u64>,
}

impl RecordingHost {
    /// Creates a host with unlimited memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host that refuses allocations once `bytes` are live.
    #[must_use]
    pub fn with_memory_budget(bytes: u64) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::default()
        }
    }

    /// Makes the next allocation fail with `ResourceExhaustion`.
    pub fn fail_next_allocation(&mut self) {
        self.fail_allocation_after(0);
    }

    /// Lets `successes` allocations through, then fails the one after.
    pub fn fail_allocation_after(&mut self, successes: u32) {
        self.fail_countdown = Some(successes);
    }

    /// Returns true if `id` was allocated and not yet released.
    #[must_use]
    pub fn is_live(&self, id: BufferId) -> bool {
        self.buffers.get(&id).is_some_and(|b| b.live)
    }

    /// The recorded buffer behind `id`, live or released. Released buffers keep
    /// their descriptor but not their contents.
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> Option<&RecordedBuffer> {
        self.buffers.get(&id)
    }

    /// Allocation parameters of `id`.
    #[must_use]
    pub fn descriptor(&self, id: BufferId) -> Option<BufferDescriptor> {
        self.buffers.get(&id).map(|b| b.descriptor)
    }

    /// Contents of `id` reinterpreted as records of `T`. Trailing bytes are ignored.
    #[must_use]
    pub fn read_as<T: Pod>(&self, id: BufferId) -> Vec<T> {
        let size = std::mem::size_of::<T>();
        self.buffers.get(&id).map_or_else(Vec::new, |b| {
            b.data
                .chunks_exact(size)
                .map(bytemuck::pod_read_unaligned)
                .collect()
        })
    }

    /// Number of live buffers.
    #[must_use]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.values().filter(|b| b.live).count()
    }

    /// Bytes held by live buffers.
    #[must_use]
    pub fn live_bytes(&self) -> u64 {
        self.buffers
            .values()
            .filter(|b| b.live)
            .map(|b| b.descriptor.size_bytes())
            .sum()
    }

    /// Every call, in submission order.
    #[must_use]
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Submitted draws.
    #[must_use]
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Detected misuse.
    #[must_use]
    pub fn violations(&self) -> &[HostViolation] {
        &self.violations
    }

    /// Forgets recorded events and draws. Buffers are kept.
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.draws.clear();
    }

    fn live_record(&self, id: BufferId) -> Option<&RecordedBuffer> {
        self.buffers.get(&id).filter(|b| b.live)
    }
}

impl RenderHost for RecordingHost {
    type Buffer = BufferId;
    type Mesh = RecordingMesh;
    type Material = RecordingMaterial;

    fn allocate_buffer(&mut self, desc: &BufferDescriptor) -> InstancingResult<BufferId> {
        let requested_bytes = desc.size_bytes();
        match self.fail_countdown {
            Some(0) => {
                self.fail_countdown = None;
                return Err(InstancingError::ResourceExhaustion {
                    requested_bytes,
                    reason: "injected allocation failure".to_string(),
                });
            }
            Some(n) => self.fail_countdown = Some(n - 1),
            None => {}
        }
        if let Some(budget) = self.memory_budget {
            if self.live_bytes() + requested_bytes > budget {
                return Err(InstancingError::ResourceExhaustion {
                    requested_bytes,
                    reason: format!("memory budget of {budget} bytes exhausted"),
                });
            }
        }

        let size = usize::try_from(requested_bytes).map_err(|_| {
            InstancingError::ResourceExhaustion {
                requested_bytes,
                reason: "exceeds host address space".to_string(),
            }
        })?;

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            RecordedBuffer {
                descriptor: *desc,
                data: vec![0; size],
                live: true,
            },
        );
        self.events.push(HostEvent::Allocate(id));
        Ok(id)
    }

    fn upload_buffer(&mut self, buffer: &BufferId, bytes: &[u8]) {
        let id = *buffer;
        let Some(record) = self.buffers.get_mut(&id).filter(|b| b.live) else {
            self.violations.push(HostViolation::UploadToDeadBuffer(id));
            return;
        };
        let size = record.data.len();
        if bytes.len() > size {
            self.violations.push(HostViolation::UploadOverflow {
                buffer: id,
                bytes: bytes.len(),
                size,
            });
        }
        let n = bytes.len().min(size);
        record.data[..n].copy_from_slice(&bytes[..n]);
        self.events.push(HostEvent::Upload(id, n));
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        match self.buffers.get_mut(&buffer) {
            Some(record) if record.live => {
                record.live = false;
                record.data = Vec::new();
                self.events.push(HostEvent::Release(buffer));
            }
            _ => self.violations.push(HostViolation::DoubleRelease(buffer)),
        }
    }

    fn draw_mesh_instanced_indirect(&mut self, draw: IndirectDraw<'_, Self>) {
        let args_buffer = *draw.args;
        let bindings = draw.material.bindings().clone();

        let dead: Vec<BufferId> = std::iter::once(args_buffer)
            .chain(bindings.values().copied())
            .filter(|&id| self.live_record(id).is_none())
            .collect();
        self.violations
            .extend(dead.into_iter().map(HostViolation::DrawWithDeadBuffer));
        if self
            .buffers
            .get(&args_buffer)
            .is_some_and(|b| b.descriptor.usage != BufferUsage::IndirectArguments)
        {
            self.violations.push(HostViolation::ArgsBufferNotIndirect(args_buffer));
        }

        let args = self
            .live_record(args_buffer)
            .and_then(|b| b.data.get(..DrawArgs::SIZE))
            .map(bytemuck::pod_read_unaligned::<DrawArgs>)
            .unwrap_or_default();

        self.draws.push(DrawRecord {
            submesh_index: draw.submesh_index,
            bounds: draw.bounds,
            args_buffer,
            args,
            bindings,
        });
        self.events.push(HostEvent::Draw(self.draws.len() - 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exhaustion() {
        let mut host = RecordingHost::with_memory_budget(100);
        let first = host.allocate_buffer(&BufferDescriptor::structured(5, 16)).unwrap();
        assert_eq!(host.live_bytes(), 80);

        let result = host.allocate_buffer(&BufferDescriptor::structured(2, 16));
        assert!(matches!(
            result,
            Err(InstancingError::ResourceExhaustion { requested_bytes: 32, .. })
        ));

        host.release_buffer(first);
        assert!(host.allocate_buffer(&BufferDescriptor::structured(2, 16)).is_ok());
    }

    #[test]
    fn test_misuse_is_recorded() {
        let mut host = RecordingHost::new();
        let id = host.allocate_buffer(&BufferDescriptor::structured(1, 4)).unwrap();

        host.upload_buffer(&id, &[0u8; 8]);
        host.release_buffer(id);
        host.release_buffer(id);
        host.upload_buffer(&id, &[1u8; 4]);

        assert_eq!(
            host.violations(),
            &[
                HostViolation::UploadOverflow { buffer: id, bytes: 8, size: 4 },
                HostViolation::DoubleRelease(id),
                HostViolation::UploadToDeadBuffer(id),
            ]
        );
    }

    #[test]
    fn test_draw_from_structured_buffer_is_recorded() {
        let mut host = RecordingHost::new();
        let mesh = RecordingMesh::cube();
        let material = RecordingMaterial::default();
        let args = host
            .allocate_buffer(&BufferDescriptor::structured(1, DrawArgs::SIZE))
            .unwrap();
        host.upload_buffer(&args, bytemuck::bytes_of(&DrawArgs::new(36, 1)));

        host.draw_mesh_instanced_indirect(IndirectDraw {
            mesh: &mesh,
            submesh_index: 0,
            material: &material,
            bounds: Bounds::default(),
            args: &args,
        });

        assert_eq!(host.violations(), &[HostViolation::ArgsBufferNotIndirect(args)]);
        assert_eq!(host.draws()[0].args, DrawArgs::new(36, 1));
    }

    #[test]
    fn test_mesh_submeshes() {
        let mesh = RecordingMesh::new(vec![6, 12]);
        assert_eq!(mesh.index_count(1), Some(12));
        assert_eq!(mesh.index_count(2), None);
        assert_eq!(mesh.submesh_count(), 2);
    }
}
