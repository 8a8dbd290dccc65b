//! The tree renderer: diff gate, role projection, and the render cycle.

mod cycle;
mod diff;
mod element;
mod projector;

pub use cycle::{RenderLoop, RenderOutcome, Renderer, Trigger};
pub use diff::snapshot_changed;
pub use element::{
    Element, ElementId, ElementKind, ElementTree, FocusSnapshot, NodeBinding, Selection,
    ToggleKind,
};
pub use projector::{project, ProjectionOptions};
