//! Instancing statistics.

/// Cumulative counters of one instance set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstancingStats {
    /// Successful `update_view` calls.
    pub updates: u64,
    /// Buffers allocated.
    pub buffers_allocated: u64,
    /// Buffers released.
    pub buffers_released: u64,
    /// Bytes handed to the host for upload.
    pub bytes_uploaded: u64,
    /// Indirect draws submitted.
    pub draws_submitted: u64,
    /// Draws skipped (uninitialized set or invalid frame).
    pub draws_skipped: u64,
}

impl InstancingStats {
    /// Buffers currently held (allocated minus released).
    #[must_use]
    pub const fn live_buffers(&self) -> u64 {
        self.buffers_allocated.saturating_sub(self.buffers_released)
    }
}

/// Result of one `update_view`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Instance count written to the draw arguments.
    pub instance_count: u32,
    /// Buffers allocated during this update.
    pub buffers_allocated: u32,
    /// Bytes uploaded during this update.
    pub bytes_uploaded: u64,
}

/// What `draw` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// One indirect draw was submitted.
    Submitted {
        /// Instance count in the argument buffer.
        instance_count: u32,
    },
    /// Nothing has been built yet; first-frame no-op.
    Uninitialized,
    /// The last update failed part-way; nothing consistent to draw.
    InvalidFrame,
}

impl DrawOutcome {
    /// Returns true if a draw was submitted.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// Result of one frame driver tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// What the update did.
    pub update: UpdateReport,
    /// What the draw did.
    pub draw: DrawOutcome,
}
