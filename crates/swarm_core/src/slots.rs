//! Shader slot identifiers.
//!
//! Slot names are resolved to opaque handles once per process and cached in an
//! immutable table. Resolution is a pure function of the name, so every host
//! sees the same handle for the same property.

use std::fmt;

use once_cell::sync::Lazy;

use crate::attributes::AttributeKind;

/// Opaque handle for a named shader property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderSlot(u32);

impl ShaderSlot {
    /// Resolves a property name to its handle (32-bit FNV-1a of the UTF-8 bytes).
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        const FNV_PRIME: u32 = 0x0100_0193;
        const FNV_OFFSET: u32 = 0x811C_9DC5;

        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShaderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{:08x}", self.0)
    }
}

/// The resolved slot of every attribute kind.
#[derive(Debug)]
struct SlotTable {
    slots: [(AttributeKind, ShaderSlot); 4],
}

impl SlotTable {
    fn resolve() -> Self {
        let slots = AttributeKind::ALL.map(|kind| (kind, ShaderSlot::from_name(kind.slot_name())));
        tracing::debug!(?slots, "resolved instance attribute shader slots");
        Self { slots }
    }

    fn get(&self, kind: AttributeKind) -> ShaderSlot {
        self.slots
            .iter()
            .find_map(|&(k, slot)| (k == kind).then_some(slot))
            .unwrap_or_else(|| ShaderSlot::from_name(kind.slot_name()))
    }
}

static SLOTS: Lazy<SlotTable> = Lazy::new(SlotTable::resolve);

/// Returns the cached slot for `kind`.
#[must_use]
pub fn slot_for(kind: AttributeKind) -> ShaderSlot {
    SLOTS.get(kind)
}
