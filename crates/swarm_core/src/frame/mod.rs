//! Per-frame driving of an instance set.

mod driver;
mod source;

pub use driver::{FrameDriver, InstancingLifecycle};
pub use source::{InstanceData, InstanceSource};
