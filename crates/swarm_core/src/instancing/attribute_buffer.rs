//! One GPU structured buffer per per-instance attribute.

use super::BufferStats;
use crate::attributes::{AttributeArray, AttributeKind};
use crate::config::BufferPolicy;
use crate::error::{InstancingError, InstancingResult};
use crate::host::{BufferDescriptor, RenderHost, ShaderInterface};
use crate::slots::ShaderSlot;

/// Owns the GPU copy of one attribute array and its shader binding.
///
/// After a successful [`rebuild`](Self::rebuild) the buffer holds exactly the
/// records of the array it was given, and the material's slot points at it.
pub struct AttributeBuffer<H: RenderHost> {
    kind: AttributeKind,
    slot: ShaderSlot,
    policy: BufferPolicy,
    buffer: Option<H::Buffer>,
    /// Records of the last uploaded array.
    len: usize,
    /// Records the GPU buffer has room for.
    capacity: usize,
    stats: BufferStats,
}

impl<H: RenderHost> AttributeBuffer<H> {
    /// Creates an unbuilt buffer for `kind`.
    #[must_use]
    pub fn new(kind: AttributeKind, policy: BufferPolicy) -> Self {
        Self {
            kind,
            slot: kind.slot(),
            policy,
            buffer: None,
            len: 0,
            capacity: 0,
            stats: BufferStats::default(),
        }
    }

    /// Copies `array` into GPU memory and binds it to the attribute's slot.
    ///
    /// # Errors
    ///
    /// - [`InstancingError::AttributeTypeMismatch`] if the array holds the wrong record type.
    /// - `ResourceExhaustion` from the host. The previous buffer is already
    ///   released at that point and the material keeps its old, stale binding.
    pub fn rebuild(
        &mut self,
        host: &mut H,
        material: &mut H::Material,
        array: AttributeArray<'_>,
    ) -> InstancingResult<()> {
        let record = self.kind.record_type();
        if array.record_type() != record {
            return Err(InstancingError::AttributeTypeMismatch { attribute: self.kind });
        }

        let len = array.len();
        let needs_allocation = match self.policy {
            BufferPolicy::RebuildEveryFrame => true,
            BufferPolicy::GrowOnly => self.buffer.is_none() || len > self.capacity,
        };

        if needs_allocation {
            self.release(host);
            let capacity = match self.policy {
                BufferPolicy::RebuildEveryFrame => len,
                BufferPolicy::GrowOnly => len.next_power_of_two(),
            };
            let buffer =
                host.allocate_buffer(&BufferDescriptor::structured(capacity, record.stride()))?;
            tracing::debug!(attribute = %self.kind, capacity, "allocated attribute buffer");
            self.stats.allocations += 1;
            self.capacity = capacity;
            self.buffer = Some(buffer);
        }
        self.len = len;

        if let Some(buffer) = &self.buffer {
            let bytes = array.as_bytes();
            if !bytes.is_empty() {
                host.upload_buffer(buffer, bytes);
                self.stats.bytes_uploaded += bytes.len() as u64;
            }
            material.bind_buffer(self.slot, buffer);
        }
        Ok(())
    }

    /// Frees the GPU buffer, if any. The material binding is left as is.
    pub fn release(&mut self, host: &mut H) {
        if let Some(buffer) = self.buffer.take() {
            host.release_buffer(buffer);
            self.stats.releases += 1;
        }
        self.len = 0;
        self.capacity = 0;
    }

    /// Attribute this buffer carries.
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Slot the buffer binds to.
    #[must_use]
    pub const fn slot(&self) -> ShaderSlot {
        self.slot
    }

    /// GPU buffer, once built.
    #[must_use]
    pub fn buffer(&self) -> Option<&H::Buffer> {
        self.buffer.as_ref()
    }

    /// Records of the last uploaded array.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the last uploaded array was empty (or nothing was uploaded).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records the GPU buffer has room for.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocation counters.
    #[must_use]
    pub const fn stats(&self) -> BufferStats {
        self.stats
    }
}
