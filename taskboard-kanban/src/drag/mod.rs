//! Drag interaction: pointer geometry and the drag state machine

mod controller;
mod geometry;

pub use controller::{
    CompletionEvent, DragController, DragSession, DragState, DropOutcome, DropTarget, MoveRequest,
};
pub use geometry::{BoardLayout, CardBounds, LaneLayout, Point, Rect};
