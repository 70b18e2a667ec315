use serde::{Deserialize, Serialize};

/// Logical coordinate on the battlefield, decoupled from any presentation transform.
///
/// `x` runs across the lane and `y` measures progress from the spawn edge
/// (`y == 0`) toward the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate measured across the lane.
    pub x: f32,
    /// Progress along the lane toward the goal.
    pub y: f32,
}

impl Position {
    /// Creates a new logical position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance between two positions.
    #[must_use]
    pub fn distance_sq(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Reports whether `other` lies within `radius` of this position, inclusive.
    #[must_use]
    pub fn within(self, other: Position, radius: f32) -> bool {
        if radius < 0.0 {
            return false;
        }
        self.distance_sq(other) <= radius * radius
    }
}

/// Side of the lane a slot is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LaneSide {
    /// Slots laid out left of the lane.
    Left,
    /// Slots laid out right of the lane.
    Right,
}

/// Grid coordinate of a slot relative to its lane side.
///
/// Column zero hugs the lane; larger columns sit further away from it. Rows
/// grow in the direction enemies travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    /// Side of the lane that owns the slot.
    pub side: LaneSide,
    /// Distance from the lane measured in slot columns.
    pub column: u32,
    /// Index along the lane measured in slot rows.
    pub row: u32,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(side: LaneSide, column: u32, row: u32) -> Self {
        Self { side, column, row }
    }

    /// Reports whether `other` sits in the forward column of this slot.
    #[must_use]
    pub fn is_forward_of(self, other: SlotCoord) -> bool {
        self.side == other.side && self.column == other.column && other.row > self.row
    }

    /// Reports whether `other` is a horizontal neighbour in the same row.
    #[must_use]
    pub fn is_row_neighbour(self, other: SlotCoord) -> bool {
        self.side == other.side && self.row == other.row && self.column.abs_diff(other.column) == 1
    }
}
