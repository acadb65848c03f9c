//! Drag-lift gesture coordination for retained UI trees.
//!
//! A [`DragPipeline`] owns one window's [`DragDropManager`] and a [`DragEventActuator`] per
//! draggable node. The host feeds it recognizer outcomes and raw touches; the pipeline stages the
//! floating preview, the multi-select gather node and badge, and reports the pre-drag lifecycle
//! through [`PreDragStatus`].
//!
//! The tree itself stays with the host behind the [`NodeTree`] trait. [`MemoryTree`] is an
//! in-memory implementation.

#![forbid(unsafe_code)]

mod arena;
pub mod drag_event;
pub mod memory_tree;
pub mod node;
pub mod preview_option;

pub use drag_event::{
    ActuatorId, DeferredTask, DragCallbacks, DragDropManager, DragDropState, DragEventActuator,
    DragGestureOptions, DragPipeline, GestureCallback, GestureInfo, OptionsError, PreDragStatus,
    TouchEventInfo, TouchRestrict,
};
pub use memory_tree::MemoryTree;
pub use node::{
    BackgroundEffect, Bitmap, BlurStyle, DragNodeAttrs, NodeId, NodeKind, NodeTree, RenderProps,
};
pub use preview_option::{DragPreviewOption, OptionsAfterApplied, PreviewModifier};
