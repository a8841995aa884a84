//! Instance buffer lifecycle.
//!
//! ## Key Concepts
//!
//! - **Attribute Buffer**: one GPU structured buffer per per-instance attribute
//! - **Draw Argument Buffer**: the 20-byte indexed indirect draw record
//! - **Instance Set**: owns both, rebuilds them from one instance count and
//!   issues a single indirect draw

mod attribute_buffer;
mod draw_args;
mod instance_set;

pub use attribute_buffer::AttributeBuffer;
pub use draw_args::{DrawArgs, DrawArgsBuffer};
pub use instance_set::{InstanceSet, SetState};

/// Allocation counters of one buffer wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// GPU buffers allocated.
    pub allocations: u64,
    /// GPU buffers released.
    pub releases: u64,
    /// Bytes uploaded.
    pub bytes_uploaded: u64,
}

impl std::ops::Add for BufferStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            allocations: self.allocations + rhs.allocations,
            releases: self.releases + rhs.releases,
            bytes_uploaded: self.bytes_uploaded + rhs.bytes_uploaded,
        }
    }
}
