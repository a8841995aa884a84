//! Per-instance attribute records and the arrays the host hands over each frame.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::slots::ShaderSlot;

/// A packed 3D vector (12 bytes), used for positions, rotations and sizes.
///
/// No padding: shaders must read the buffer as a packed `float3` array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// All zeros.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// All ones.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with every component set to `v`.
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Converts to array format.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// A linear RGBA color (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new color.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// Record type stored in an attribute buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// [`Vec3`] records.
    Vec3,
    /// [`Color`] records.
    Color,
}

impl RecordType {
    /// Byte stride of one record.
    #[must_use]
    pub const fn stride(self) -> usize {
        match self {
            Self::Vec3 => std::mem::size_of::<Vec3>(),
            Self::Color => std::mem::size_of::<Color>(),
        }
    }
}

/// The per-instance attributes a shader can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    /// World position. The authoritative source of the instance count.
    Position,
    /// Euler rotation.
    Rotation,
    /// Per-axis scale.
    Size,
    /// RGBA tint.
    Color,
}

impl AttributeKind {
    /// Every attribute kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Position, Self::Rotation, Self::Size, Self::Color];

    /// Shader property name the attribute is bound to.
    #[must_use]
    pub const fn slot_name(self) -> &'static str {
        match self {
            Self::Position => "_Positions",
            Self::Rotation => "_Rotations",
            Self::Size => "_Sizes",
            Self::Color => "_Colors",
        }
    }

    /// Resolved shader slot for this attribute.
    #[must_use]
    pub fn slot(self) -> ShaderSlot {
        crate::slots::slot_for(self)
    }

    /// Record type stored for this attribute.
    #[must_use]
    pub const fn record_type(self) -> RecordType {
        match self {
            Self::Position | Self::Rotation | Self::Size => RecordType::Vec3,
            Self::Color => RecordType::Color,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "positions",
            Self::Rotation => "rotations",
            Self::Size => "sizes",
            Self::Color => "colors",
        };
        f.write_str(name)
    }
}

/// Which attribute set an instance set carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceLayout {
    /// Position and color.
    #[default]
    Colored,
    /// Position, rotation, size and color.
    Transformed,
}

impl InstanceLayout {
    /// Attributes of this layout, in rebuild order.
    ///
    /// Colors are rebuilt before positions. There is no dependency between
    /// attributes, the order only has to be stable.
    #[must_use]
    pub const fn attributes(self) -> &'static [AttributeKind] {
        match self {
            Self::Colored => &[AttributeKind::Color, AttributeKind::Position],
            Self::Transformed => &[
                AttributeKind::Color,
                AttributeKind::Size,
                AttributeKind::Rotation,
                AttributeKind::Position,
            ],
        }
    }

    /// Returns true if the layout carries `kind`.
    #[must_use]
    pub fn contains(self, kind: AttributeKind) -> bool {
        self.attributes().contains(&kind)
    }
}

/// One borrowed per-instance attribute array.
#[derive(Debug, Clone, Copy)]
pub enum AttributeArray<'a> {
    /// Array of [`Vec3`] records.
    Vec3(&'a [Vec3]),
    /// Array of [`Color`] records.
    Color(&'a [Color]),
}

impl<'a> AttributeArray<'a> {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Vec3(records) => records.len(),
            Self::Color(records) => records.len(),
        }
    }

    /// Returns true if the array holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record type of the array.
    #[must_use]
    pub const fn record_type(&self) -> RecordType {
        match self {
            Self::Vec3(_) => RecordType::Vec3,
            Self::Color(_) => RecordType::Color,
        }
    }

    /// Raw bytes for GPU upload, record for record.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::Vec3(records) => bytemuck::cast_slice(records),
            Self::Color(records) => bytemuck::cast_slice(records),
        }
    }
}

/// The attribute arrays supplied by the host for one frame.
///
/// The core never mutates them, it only copies them into GPU memory.
#[derive(Debug, Clone, Copy)]
pub struct InstanceArrays<'a> {
    /// Positions. Their length is the instance count.
    pub positions: &'a [Vec3],
    /// Colors.
    pub colors: &'a [Color],
    /// Rotations (transformed layout only).
    pub rotations: Option<&'a [Vec3]>,
    /// Sizes (transformed layout only).
    pub sizes: Option<&'a [Vec3]>,
}

impl<'a> InstanceArrays<'a> {
    /// Arrays for the colored layout.
    #[must_use]
    pub const fn colored(positions: &'a [Vec3], colors: &'a [Color]) -> Self {
        Self {
            positions,
            colors,
            rotations: None,
            sizes: None,
        }
    }

    /// Arrays for the transformed layout.
    #[must_use]
    pub const fn transformed(
        positions: &'a [Vec3],
        rotations: &'a [Vec3],
        sizes: &'a [Vec3],
        colors: &'a [Color],
    ) -> Self {
        Self {
            positions,
            colors,
            rotations: Some(rotations),
            sizes: Some(sizes),
        }
    }

    /// Authoritative instance count (the position array length).
    #[must_use]
    pub const fn count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the array for `kind`, if supplied.
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Option<AttributeArray<'a>> {
        match kind {
            AttributeKind::Position => Some(AttributeArray::Vec3(self.positions)),
            AttributeKind::Rotation => self.rotations.map(AttributeArray::Vec3),
            AttributeKind::Size => self.sizes.map(AttributeArray::Vec3),
            AttributeKind::Color => Some(AttributeArray::Color(self.colors)),
        }
    }
}
