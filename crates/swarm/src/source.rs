//! Procedural swarm: instances orbiting the origin in a flat disc.
//!
//! Every instance gets a seeded orbit (radius, phase, height), color and
//! size. `advance` moves each one along its orbit, so consecutive frames
//! upload different bytes. With pulsing enabled the active instance count
//! swings between half and all of the instances, which forces the buffers
//! through growing and shrinking rebuilds.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarm_core::{Color, InstanceArrays, InstanceData, InstanceLayout, InstanceSource, Vec3};

/// Radians per frame at unit radius. Outer orbits move slower.
const ANGULAR_STEP: f32 = 0.02;

/// Frames per half pulse cycle.
const PULSE_PERIOD: u64 = 60;

#[derive(Debug, Clone, Copy)]
struct Orbit {
    radius: f32,
    phase: f32,
    height: f32,
}

/// Deterministic animated instance source.
#[derive(Debug, Clone)]
pub struct SwarmSource {
    data: InstanceData,
    orbits: Vec<Orbit>,
    pulse: bool,
    active: usize,
}

impl SwarmSource {
    /// Creates `count` instances within `radius` of the origin, seeded by `seed`.
    #[must_use]
    pub fn new(layout: InstanceLayout, count: usize, seed: u64, radius: f32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut data = InstanceData::uniform(layout, count);

        let orbits = (0..count)
            .map(|_| Orbit {
                radius: rng.gen_range(0.2..=1.0) * radius,
                phase: rng.gen_range(0.0..TAU),
                height: rng.gen_range(-0.05..=0.05) * radius,
            })
            .collect();

        for color in &mut data.colors {
            *color = Color::rgb(rng.gen(), rng.gen(), rng.gen());
        }
        if let Some(sizes) = data.sizes.as_mut() {
            for size in sizes {
                *size = Vec3::splat(rng.gen_range(0.5..=1.5));
            }
        }

        let mut source = Self {
            data,
            orbits,
            pulse: false,
            active: count,
        };
        source.place(0);
        source
    }

    /// Enables or disables count pulsing.
    #[must_use]
    pub const fn with_pulse(mut self, pulse: bool) -> Self {
        self.pulse = pulse;
        self
    }

    /// Total instances, active or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Instances drawn this frame.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.active
    }

    fn place(&mut self, frame: u64) {
        let t = frame as f32 * ANGULAR_STEP;
        for (i, orbit) in self.orbits.iter().enumerate() {
            let angle = orbit.phase + t / orbit.radius.max(1.0);
            self.data.positions[i] = Vec3::new(
                orbit.radius * angle.cos(),
                orbit.height,
                orbit.radius * angle.sin(),
            );
            if let Some(rotations) = self.data.rotations.as_mut() {
                // Face along the orbit
                rotations[i] = Vec3::new(0.0, -angle.to_degrees(), 0.0);
            }
        }
    }

    /// Active count for `frame`: a triangle wave between half and all instances.
    fn pulse_count(&self, frame: u64) -> usize {
        let total = self.capacity();
        let half = total / 2;
        let step = frame % (2 * PULSE_PERIOD);
        let rising = if step < PULSE_PERIOD {
            step
        } else {
            2 * PULSE_PERIOD - step
        };
        half + ((total - half) as u64 * rising / PULSE_PERIOD) as usize
    }
}

impl InstanceSource for SwarmSource {
    fn arrays(&self) -> InstanceArrays<'_> {
        let n = self.active;
        InstanceArrays {
            positions: &self.data.positions[..n],
            colors: &self.data.colors[..n],
            rotations: self.data.rotations.as_deref().map(|r| &r[..n]),
            sizes: self.data.sizes.as_deref().map(|s| &s[..n]),
        }
    }

    fn advance(&mut self, frame: u64) {
        self.place(frame);
        if self.pulse {
            self.active = self.pulse_count(frame);
        }
    }
}
