//! Lines, stations, and line occurrences.

use tm_core::{LineId, Point, TransitNodeId};

/// A transit line (route) as drawn on the map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// External identifier from the upstream feed.
    pub id: String,
    /// Short label shown on the map (e.g. "U6").
    pub label: String,
    /// CSS-style hex color without the leading `#`.
    pub color: String,
}

/// A station attached to a transit node.
///
/// Nodes without stations are topological joints, not stops.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station {
    pub id: String,
    pub name: String,
    pub pos: Point,
}

/// One line running over a transit edge.
///
/// `direction` records the "towards" endpoint when the line is directional
/// on this edge; `None` means the line runs both ways.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineOcc {
    pub line: LineId,
    pub direction: Option<TransitNodeId>,
}

impl LineOcc {
    pub fn undirected(line: LineId) -> Self {
        Self { line, direction: None }
    }

    pub fn towards(line: LineId, node: TransitNodeId) -> Self {
        Self { line, direction: Some(node) }
    }
}
