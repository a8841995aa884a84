//! # Instancing Error Types
//!
//! All errors that can occur while building, binding or drawing an instance set.

use thiserror::Error;

use crate::attributes::AttributeKind;

/// Errors that can occur in the instancing core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstancingError {
    /// The host could not allocate a GPU buffer (out of device memory, over a limit).
    ///
    /// Not recoverable locally. The host decides whether to abort or retry
    /// with fewer instances.
    #[error("resource exhaustion: could not allocate {requested_bytes} bytes ({reason})")]
    ResourceExhaustion {
        /// Size of the allocation that failed.
        requested_bytes: u64,
        /// Host-provided reason.
        reason: String,
    },

    /// An attribute array does not have the same length as the position array.
    #[error("length mismatch: {attribute} has {actual} records, positions have {expected}")]
    LengthMismatch {
        /// The offending attribute.
        attribute: AttributeKind,
        /// Instance count taken from the position array.
        expected: usize,
        /// Length of the offending array.
        actual: usize,
    },

    /// The layout requires an attribute the frame did not supply.
    #[error("missing attribute: {0}")]
    MissingAttribute(AttributeKind),

    /// An array of the wrong record type was handed to an attribute buffer.
    #[error("attribute type mismatch for {attribute}")]
    AttributeTypeMismatch {
        /// The attribute buffer that rejected the array.
        attribute: AttributeKind,
    },

    /// More instances than an indirect draw can address.
    #[error("instance count {0} does not fit in a 32-bit draw argument")]
    InstanceCountOverflow(usize),

    /// The configured submesh does not exist on the mesh.
    #[error("submesh {submesh} out of range: mesh has {available} submeshes")]
    SubmeshOutOfRange {
        /// Requested submesh index.
        submesh: u32,
        /// Number of submeshes on the mesh.
        available: u32,
    },

    /// The instance set was shut down and can no longer be used.
    #[error("instance set already released")]
    Released,

    /// The frame driver was ticked before being attached.
    #[error("frame driver not attached")]
    NotAttached,

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for instancing operations.
pub type InstancingResult<T> = Result<T, InstancingError>;
