//! Frame driver - the per-frame entry point the host calls.
//!
//! ```text
//! on_attach  ── read mesh index count, build InstanceSet
//! on_tick    ── source.advance → update_view(arrays) → draw
//! on_detach  ── shutdown (release every buffer)
//! ```
//!
//! Update always runs before draw. A failed update skips the draw for that
//! frame and the error goes back to the host, which decides whether to abort
//! or carry on with the next frame.

use std::sync::Arc;

use super::source::InstanceSource;
use crate::config::InstancingConfig;
use crate::error::{InstancingError, InstancingResult};
use crate::host::{RenderHost, SharedMaterial};
use crate::instancing::InstanceSet;
use crate::stats::FrameReport;

/// Lifecycle callbacks a host invokes on an instanced drawable.
///
/// The core knows nothing about the host's component model; the host maps
/// its own attach/update/destroy hooks onto these three methods.
pub trait InstancingLifecycle<H: RenderHost> {
    /// Called once when the drawable enters the scene.
    ///
    /// # Errors
    ///
    /// Implementation-defined setup failures.
    fn on_attach(&mut self, host: &mut H) -> InstancingResult<()>;

    /// Called once per rendered frame.
    ///
    /// # Errors
    ///
    /// Implementation-defined frame failures.
    fn on_tick(&mut self, host: &mut H) -> InstancingResult<FrameReport>;

    /// Called once when the drawable leaves the scene.
    fn on_detach(&mut self, host: &mut H);
}

/// Drives one [`InstanceSet`] from an [`InstanceSource`].
pub struct FrameDriver<H: RenderHost, S: InstanceSource> {
    config: InstancingConfig,
    mesh: Arc<H::Mesh>,
    material: SharedMaterial<H::Material>,
    source: S,
    set: Option<InstanceSet<H>>,
    frame: u64,
}

impl<H: RenderHost, S: InstanceSource> FrameDriver<H, S> {
    /// Creates a detached driver.
    #[must_use]
    pub fn new(
        config: InstancingConfig,
        mesh: Arc<H::Mesh>,
        material: SharedMaterial<H::Material>,
        source: S,
    ) -> Self {
        Self {
            config,
            mesh,
            material,
            source,
            set: None,
            frame: 0,
        }
    }

    /// The instance set, while attached.
    #[must_use]
    pub fn set(&self) -> Option<&InstanceSet<H>> {
        self.set.as_ref()
    }

    /// The data source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the data source, for hosts that write arrays directly.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Number of ticks so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns true between `on_attach` and `on_detach`.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.set.is_some()
    }
}

impl<H: RenderHost, S: InstanceSource> InstancingLifecycle<H> for FrameDriver<H, S> {
    fn on_attach(&mut self, _host: &mut H) -> InstancingResult<()> {
        if self.set.is_some() {
            tracing::debug!("frame driver already attached");
            return Ok(());
        }
        let set = InstanceSet::new(
            self.config.clone(),
            Arc::clone(&self.mesh),
            Arc::clone(&self.material),
        )?;
        self.set = Some(set);
        Ok(())
    }

    fn on_tick(&mut self, host: &mut H) -> InstancingResult<FrameReport> {
        let Some(set) = self.set.as_mut() else {
            return Err(InstancingError::NotAttached);
        };

        self.frame += 1;
        let frame = self.frame;
        self.source.advance(frame);

        let update = match set.update_view(host, &self.source.arrays()) {
            Ok(update) => update,
            Err(err) => {
                tracing::error!(frame, %err, "instance update failed, draw skipped");
                return Err(err);
            }
        };
        let draw = set.draw(host)?;

        tracing::trace!(frame, instances = update.instance_count, ?draw, "frame complete");
        Ok(FrameReport { frame, update, draw })
    }

    fn on_detach(&mut self, host: &mut H) {
        if let Some(mut set) = self.set.take() {
            set.shutdown(host);
            tracing::debug!(frames = self.frame, stats = ?set.stats(), "frame driver detached");
        }
    }
}
