//! Drag interaction state machine.
//!
//! `Idle` → `Dragging` on drag-start; every pointer-move recomputes the hovered
//! lane and insertion index; drop or cancel returns to `Idle`. The controller
//! never touches the task cache. A successful drop yields a [`MoveRequest`]
//! for the store to carry out.

use super::geometry::{BoardLayout, Point};
use crate::error::{BoardError, Result};
use crate::types::{Lane, TaskId};
use serde::Serialize;
use std::fmt;

/// A lane and a display index within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropTarget {
    pub lane: Lane,
    pub index: usize,
}

impl DropTarget {
    pub fn new(lane: Lane, index: usize) -> Self {
        Self { lane, index }
    }
}

/// An in-progress drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub task_id: TaskId,
    /// Where the card was when the drag started
    pub origin: DropTarget,
    /// Current drop indicator, if one is shown
    pub indicator: Option<DropTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Request to place a task at `index` of `lane`.
///
/// `index` counts positions in the target lane *without* the moved task,
/// which is the list the allocator works on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveRequest {
    pub task_id: TaskId,
    pub from: DropTarget,
    pub lane: Lane,
    pub index: usize,
    pub point: Point,
}

impl MoveRequest {
    /// Moving between lanes, as opposed to within one
    pub fn changes_lane(&self) -> bool {
        self.from.lane != self.lane
    }

    /// Entering the terminal lane from another lane
    pub fn completes(&self) -> bool {
        self.lane.is_terminal() && !self.from.lane.is_terminal()
    }
}

/// How a drag ended
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Released outside any lane or explicitly cancelled
    Cancelled,
    /// Dropped back where it started
    Unchanged,
    Move(MoveRequest),
}

/// Fired when a card is dropped into the terminal lane from another lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionEvent {
    pub task_id: TaskId,
    pub from: Lane,
    pub point: Point,
}

type CompletionHandler = Box<dyn FnMut(&CompletionEvent) + Send>;

/// Turns pointer events into drop targets and move requests
#[derive(Default)]
pub struct DragController {
    state: DragState,
    on_complete: Option<CompletionHandler>,
}

impl fmt::Debug for DragController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragController")
            .field("state", &self.state)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback fired when a drop completes a task
    pub fn with_completion_handler(
        mut self,
        handler: impl FnMut(&CompletionEvent) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Task being dragged
    pub fn dragged(&self) -> Option<&TaskId> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.task_id),
            DragState::Idle => None,
        }
    }

    /// Drop indicator currently shown
    pub fn indicator(&self) -> Option<DropTarget> {
        match &self.state {
            DragState::Dragging(session) => session.indicator,
            DragState::Idle => None,
        }
    }

    /// Begin dragging a rendered card
    pub fn start(&mut self, task_id: impl Into<TaskId>, layout: &BoardLayout) -> Result<()> {
        let task_id = task_id.into();
        if let DragState::Dragging(session) = &self.state {
            return Err(BoardError::DragAlreadyActive {
                id: session.task_id.to_string(),
            });
        }
        let (lane, index) = layout
            .locate(&task_id)
            .ok_or_else(|| BoardError::TaskNotRendered {
                id: task_id.to_string(),
            })?;

        tracing::trace!(%task_id, %lane, index, "drag started");
        self.state = DragState::Dragging(DragSession {
            task_id,
            origin: DropTarget::new(lane, index),
            indicator: None,
        });
        Ok(())
    }

    /// Track the pointer; returns the drop indicator to show, if any
    pub fn pointer_move(&mut self, point: Point, layout: &BoardLayout) -> Option<DropTarget> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };
        session.indicator = resolve_target(session, point, layout);
        session.indicator
    }

    /// Release the pointer and return to `Idle`
    pub fn drop(&mut self, point: Point, layout: &BoardLayout) -> DropOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DropOutcome::Cancelled;
        };

        let Some(hovered) = layout.lane_at(point) else {
            tracing::trace!(task_id = %session.task_id, "dropped outside any lane");
            return DropOutcome::Cancelled;
        };
        let Some(target) = resolve_target(&session, point, layout) else {
            tracing::trace!(task_id = %session.task_id, "dropped on its own slot");
            return DropOutcome::Unchanged;
        };

        let index = if hovered.lane == session.origin.lane && target.index > session.origin.index {
            target.index - 1
        } else {
            target.index
        };
        let request = MoveRequest {
            task_id: session.task_id,
            from: session.origin,
            lane: target.lane,
            index,
            point,
        };

        if request.completes() {
            if let Some(handler) = self.on_complete.as_mut() {
                handler(&CompletionEvent {
                    task_id: request.task_id.clone(),
                    from: request.from.lane,
                    point,
                });
            }
        }

        tracing::debug!(
            task_id = %request.task_id,
            lane = %request.lane,
            index = request.index,
            "drop resolved to move"
        );
        DropOutcome::Move(request)
    }

    /// Abandon the drag without any change
    pub fn cancel(&mut self) -> DropOutcome {
        if let DragState::Dragging(session) = std::mem::take(&mut self.state) {
            tracing::trace!(task_id = %session.task_id, "drag cancelled");
        }
        DropOutcome::Cancelled
    }
}

/// Hovered lane and insertion index, or `None` when the pointer is outside
/// every lane or over a slot that would leave the card where it is.
fn resolve_target(session: &DragSession, point: Point, layout: &BoardLayout) -> Option<DropTarget> {
    let lane = layout.lane_at(point)?;
    let index = lane.insertion_index(point.y);
    let origin = session.origin;
    if lane.lane == origin.lane && (index == origin.index || index == origin.index + 1) {
        return None;
    }
    Some(DropTarget::new(lane.lane, index))
}
