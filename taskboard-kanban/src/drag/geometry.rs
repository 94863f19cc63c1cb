//! Rendered geometry supplied by the board view

use crate::ordering::BoardSnapshot;
use crate::types::{Lane, TaskId};
use serde::{Deserialize, Serialize};

/// Pointer position in view coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Vertical midpoint
    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Inclusive of the top-left edges, exclusive of the bottom-right
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }
}

/// A rendered card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardBounds {
    pub task_id: TaskId,
    pub rect: Rect,
}

/// A rendered lane: its drop surface and its cards in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    pub lane: Lane,
    pub bounds: Rect,
    pub cards: Vec<CardBounds>,
}

impl LaneLayout {
    pub fn new(lane: Lane, bounds: Rect) -> Self {
        Self {
            lane,
            bounds,
            cards: Vec::new(),
        }
    }

    /// Add a card below the ones already present
    pub fn with_card(mut self, task_id: impl Into<TaskId>, rect: Rect) -> Self {
        self.cards.push(CardBounds {
            task_id: task_id.into(),
            rect,
        });
        self
    }

    /// Insertion index for a pointer at height `y`: before the first card whose
    /// midpoint lies below the pointer, else at the end.
    pub fn insertion_index(&self, y: f64) -> usize {
        self.cards
            .iter()
            .position(|card| card.rect.mid_y() > y)
            .unwrap_or(self.cards.len())
    }

    /// Display index of a card
    pub fn index_of(&self, task_id: &TaskId) -> Option<usize> {
        self.cards.iter().position(|c| &c.task_id == task_id)
    }
}

/// All rendered lanes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub lanes: Vec<LaneLayout>,
}

impl BoardLayout {
    pub fn new(lanes: Vec<LaneLayout>) -> Self {
        Self { lanes }
    }

    /// Simple column layout of a snapshot: lanes side by side, cards stacked
    /// from the top with a fixed height. Used by headless callers and tests.
    pub fn columns(snapshot: &BoardSnapshot, lane_width: f64, card_height: f64) -> Self {
        let lanes = snapshot
            .iter()
            .map(|(lane, tasks)| {
                let left = lane.order() as f64 * lane_width;
                let height = card_height * (tasks.len() as f64 + 1.0);
                let mut layout = LaneLayout::new(lane, Rect::new(left, 0.0, lane_width, height));
                for (i, task) in tasks.iter().enumerate() {
                    layout = layout.with_card(
                        task.id.clone(),
                        Rect::new(left, i as f64 * card_height, lane_width, card_height),
                    );
                }
                layout
            })
            .collect();
        Self { lanes }
    }

    /// The lane whose drop surface contains the point
    pub fn lane_at(&self, point: Point) -> Option<&LaneLayout> {
        self.lanes.iter().find(|l| l.bounds.contains(point))
    }

    pub fn lane(&self, lane: Lane) -> Option<&LaneLayout> {
        self.lanes.iter().find(|l| l.lane == lane)
    }

    /// Lane and display index of a rendered card
    pub fn locate(&self, task_id: &TaskId) -> Option<(Lane, usize)> {
        self.lanes
            .iter()
            .find_map(|l| l.index_of(task_id).map(|i| (l.lane, i)))
    }
}
