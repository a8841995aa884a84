//! Host-supplied per-instance data.

use crate::attributes::{Color, InstanceArrays, InstanceLayout, Vec3};

/// Provides the current attribute arrays each frame.
pub trait InstanceSource {
    /// Arrays for the frame about to be drawn.
    fn arrays(&self) -> InstanceArrays<'_>;

    /// Advances the source by `frame`. Sources that do not animate ignore this.
    fn advance(&mut self, _frame: u64) {}
}

/// Owned per-instance arrays.
///
/// The simplest source: whatever the host last wrote into the vectors is
/// drawn on the next tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceData {
    /// Positions. Their length is the instance count.
    pub positions: Vec<Vec3>,
    /// Colors.
    pub colors: Vec<Color>,
    /// Rotations, for the transformed layout.
    pub rotations: Option<Vec<Vec3>>,
    /// Sizes, for the transformed layout.
    pub sizes: Option<Vec<Vec3>>,
}

impl InstanceData {
    /// Colored-layout data.
    #[must_use]
    pub fn colored(positions: Vec<Vec3>, colors: Vec<Color>) -> Self {
        Self {
            positions,
            colors,
            rotations: None,
            sizes: None,
        }
    }

    /// Transformed-layout data.
    #[must_use]
    pub fn transformed(
        positions: Vec<Vec3>,
        rotations: Vec<Vec3>,
        sizes: Vec<Vec3>,
        colors: Vec<Color>,
    ) -> Self {
        Self {
            positions,
            colors,
            rotations: Some(rotations),
            sizes: Some(sizes),
        }
    }

    /// `count` instances at the origin, white, unrotated, unit size.
    #[must_use]
    pub fn uniform(layout: InstanceLayout, count: usize) -> Self {
        let positions = vec![Vec3::ZERO; count];
        let colors = vec![Color::WHITE; count];
        match layout {
            InstanceLayout::Colored => Self::colored(positions, colors),
            InstanceLayout::Transformed => Self::transformed(
                positions,
                vec![Vec3::ZERO; count],
                vec![Vec3::ONE; count],
                colors,
            ),
        }
    }

    /// Instance count (position count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if there are no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl InstanceSource for InstanceData {
    fn arrays(&self) -> InstanceArrays<'_> {
        InstanceArrays {
            positions: &self.positions,
            colors: &self.colors,
            rotations: self.rotations.as_deref(),
            sizes: self.sizes.as_deref(),
        }
    }
}
