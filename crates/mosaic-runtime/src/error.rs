//! Runtime error taxonomy.
//!
//! Configuration problems fail fast at [`AppBuilder::build`]
//! (crate::AppBuilder::build); render-target failures surface as
//! [`DomError`](mosaic_render::DomError) through the operations that touch
//! the target. Hook and effect panics are not caught.

use mosaic_core::NodeId;
use thiserror::Error;

/// Invalid builder configuration, detected before the app runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `build()` was called without `mount(dom, container)`.
    #[error("app was never mounted; call mount(dom, container) before build()")]
    NotMounted,
    /// The mount container does not exist in the render target.
    #[error("mount container {0} does not exist in the render target")]
    MissingContainer(NodeId),
    /// The mount container is not an element node.
    #[error("mount container {0} is not an element")]
    ContainerNotElement(NodeId),
}
