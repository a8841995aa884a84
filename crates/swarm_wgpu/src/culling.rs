//! Frustum culling of draw bounds.
//!
//! Extracts the six frustum planes from a view-projection matrix and tests
//! an instance set's world-space [`Bounds`] against them. A set whose box is
//! entirely outside any plane is not submitted.

use swarm_core::Bounds;

/// A plane in 3D space (Ax + By + Cz + D = 0).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Distance from origin.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Scales the plane to a unit normal. Degenerate planes are returned as is.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        if len > 0.0 {
            Self::new(self.a / len, self.b / len, self.c / len, self.d / len)
        } else {
            self
        }
    }

    /// Signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: [f32; 3]) -> f32 {
        self.a * p[0] + self.b * p[1] + self.c * p[2] + self.d
    }
}

/// View frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts frustum planes from a column-major view-projection matrix
    /// with wgpu's 0..1 clip depth.
    #[must_use]
    pub fn from_view_projection(m: &[[f32; 4]; 4]) -> Self {
        let row = |r: usize| [m[0][r], m[1][r], m[2][r], m[3][r]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let plane = |v: [f32; 4]| Plane::new(v[0], v[1], v[2], v[3]).normalized();
        let add = |a: [f32; 4], b: [f32; 4]| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]];
        let sub = |a: [f32; 4], b: [f32; 4]| [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];

        Self {
            planes: [
                plane(add(r3, r0)),
                plane(sub(r3, r0)),
                plane(add(r3, r1)),
                plane(sub(r3, r1)),
                // Near: z >= 0
                plane(r2),
                plane(sub(r3, r2)),
            ],
        }
    }

    /// Returns true if `bounds` intersects or lies inside the frustum.
    #[must_use]
    pub fn intersects(&self, bounds: &Bounds) -> bool {
        let half = bounds.extents();
        self.planes.iter().all(|plane| {
            // Projection interval radius of the box onto the plane normal
            let r = half[0] * plane.a.abs() + half[1] * plane.b.abs() + half[2] * plane.c.abs();
            plane.distance_to_point(bounds.center) >= -r
        })
    }
}
