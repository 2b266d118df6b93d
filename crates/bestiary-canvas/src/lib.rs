//! # bestiary-canvas
//!
//! The canvas graph-synchronization core:
//! - [`projection::project`]  — pure derivation of a node/edge graph from the
//!   three relational collections (entities, class taxonomy, specificities)
//! - [`resolve::resolve`]     — attribute id → display name + class color
//! - [`controller::CanvasController`] — owns the live graph state, applies
//!   gestures (drag, connect, editor save) and reconciles persistence results
//!
//! The projection is recomputed from scratch whenever any input collection
//! changes; it holds no hidden state and never fails on dangling references —
//! referential integrity belongs to the store, the canvas renders best-effort.

pub mod backend;
pub mod controller;
pub mod model;
pub mod projection;
pub mod resolve;

pub use backend::{BackendError, EntityBackend, SpecificityBackend};
pub use controller::{CanvasController, ConnectOutcome, DragOutcome, EditorState};
pub use model::{
    parse_spec_node_id, spec_node_id, AttributeBadge, CanvasEdge, CanvasGraph, CanvasNode,
    NodeData, NodeKind, SPEC_NODE_PREFIX,
};
pub use projection::project;
pub use resolve::{resolve, AttributeMeta};
