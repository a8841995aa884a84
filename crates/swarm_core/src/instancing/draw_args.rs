//! Indirect draw argument record and the buffer that holds it.

use bytemuck::{Pod, Zeroable};

use super::BufferStats;
use crate::config::BufferPolicy;
use crate::error::InstancingResult;
use crate::host::{BufferDescriptor, RenderHost};

/// Indexed indirect draw arguments.
///
/// Layout matches `DrawIndexedInstancedIndirect` / `vkCmdDrawIndexedIndirect`:
/// five 32-bit fields, 20 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArgs {
    /// Indices per instance. Fixed from the mesh, never changes.
    pub index_count_per_instance: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index in the index buffer.
    pub start_index_location: u32,
    /// Value added to each index before fetching a vertex.
    pub base_vertex_location: i32,
    /// First instance ID.
    pub start_instance_location: u32,
}

impl DrawArgs {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Arguments drawing `instance_count` copies of a mesh with `index_count` indices.
    #[must_use]
    pub const fn new(index_count: u32, instance_count: u32) -> Self {
        Self {
            index_count_per_instance: index_count,
            instance_count,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: 0,
        }
    }
}

/// Owns the GPU buffer holding one [`DrawArgs`] record.
pub struct DrawArgsBuffer<H: RenderHost> {
    args: DrawArgs,
    buffer: Option<H::Buffer>,
    policy: BufferPolicy,
    stats: BufferStats,
}

impl<H: RenderHost> DrawArgsBuffer<H> {
    /// Creates an unbuilt argument buffer for a mesh with `index_count` indices.
    #[must_use]
    pub fn new(index_count: u32, policy: BufferPolicy) -> Self {
        Self {
            args: DrawArgs::new(index_count, 0),
            buffer: None,
            policy,
            stats: BufferStats::default(),
        }
    }

    /// Rewrites the arguments for `instance_count` and uploads them.
    ///
    /// On return the buffer is a valid indirect source for `instance_count`.
    ///
    /// # Errors
    ///
    /// Propagates the host's `ResourceExhaustion`; the wrapper then holds no
    /// buffer and [`args`](Self::args) keeps the last uploaded count.
    pub fn rebuild(&mut self, host: &mut H, instance_count: u32) -> InstancingResult<()> {
        let reuse = self.policy == BufferPolicy::GrowOnly && self.buffer.is_some();
        if !reuse {
            self.release(host);
            let buffer = host.allocate_buffer(&BufferDescriptor::indirect(DrawArgs::SIZE))?;
            self.stats.allocations += 1;
            self.buffer = Some(buffer);
        }

        self.args.instance_count = instance_count;
        if let Some(buffer) = &self.buffer {
            host.upload_buffer(buffer, bytemuck::bytes_of(&self.args));
            self.stats.bytes_uploaded += DrawArgs::SIZE as u64;
        }
        Ok(())
    }

    /// Frees the GPU buffer, if any.
    pub fn release(&mut self, host: &mut H) {
        if let Some(buffer) = self.buffer.take() {
            host.release_buffer(buffer);
            self.stats.releases += 1;
        }
    }

    /// Current argument record.
    #[must_use]
    pub const fn args(&self) -> DrawArgs {
        self.args
    }

    /// GPU buffer, once built.
    #[must_use]
    pub fn buffer(&self) -> Option<&H::Buffer> {
        self.buffer.as_ref()
    }

    /// Returns true once a buffer has been built and not released.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.buffer.is_some()
    }

    /// Allocation counters.
    #[must_use]
    pub const fn stats(&self) -> BufferStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingHost;

    #[test]
    fn test_args_layout() {
        assert_eq!(DrawArgs::SIZE, 20);
        let args = DrawArgs::new(36, 3);
        let bytes = bytemuck::bytes_of(&args);
        assert_eq!(&bytes[0..4], &36u32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &3u32.to_ne_bytes());
        assert!(bytes[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rebuild_replaces_buffer() {
        let mut host = RecordingHost::new();
        let mut args = DrawArgsBuffer::<RecordingHost>::new(36, BufferPolicy::RebuildEveryFrame);

        args.rebuild(&mut host, 3).unwrap();
        let first = *args.buffer().unwrap();
        args.rebuild(&mut host, 7).unwrap();
        let second = *args.buffer().unwrap();

        assert_ne!(first, second);
        assert!(!host.is_live(first));
        assert_eq!(host.read_as::<DrawArgs>(second), vec![DrawArgs::new(36, 7)]);
        assert_eq!(args.stats().allocations, 2);
        assert_eq!(args.stats().releases, 1);
    }

    #[test]
    fn test_grow_only_reuses_buffer() {
        let mut host = RecordingHost::new();
        let mut args = DrawArgsBuffer::<RecordingHost>::new(6, BufferPolicy::GrowOnly);

        args.rebuild(&mut host, 1).unwrap();
        let first = *args.buffer().unwrap();
        args.rebuild(&mut host, 2).unwrap();

        assert_eq!(args.buffer(), Some(&first));
        assert_eq!(host.read_as::<DrawArgs>(first)[0].instance_count, 2);
    }

    #[test]
    fn test_allocation_failure_leaves_no_buffer() {
        let mut host = RecordingHost::new();
        let mut args = DrawArgsBuffer::<RecordingHost>::new(6, BufferPolicy::RebuildEveryFrame);

        args.rebuild(&mut host, 1).unwrap();
        host.fail_next_allocation();
        assert!(args.rebuild(&mut host, 2).is_err());
        assert!(!args.is_built());
        assert_eq!(host.live_buffer_count(), 0);
        // Count never reached the GPU
        assert_eq!(args.args().instance_count, 1);
    }

    #[test]
    fn test_buffer_is_one_indirect_record() {
        let mut host = RecordingHost::new();
        let mut args = DrawArgsBuffer::<RecordingHost>::new(36, BufferPolicy::RebuildEveryFrame);

        args.rebuild(&mut host, 4).unwrap();
        let id = *args.buffer().unwrap();

        assert_eq!(host.descriptor(id), Some(BufferDescriptor::indirect(20)));
        assert_eq!(host.descriptor(id).map(|d| d.size_bytes()), Some(20));
    }
}
