//! Path fragments: contiguous polylines cut under one fixed settings value.
//!
//! A [`PathElement`] is the unit the planner reorders and merges. The
//! decomposer produces one per contiguous run of cuts, the loop joiner
//! splices them, and the assembler flattens them back into a command stream.

use serde::{Deserialize, Serialize};

use crate::types::{CutSettings, Point};

/// A contiguous open or closed polyline sharing one settings value.
///
/// Owns a `start` point and the ordered `moves` after it. The settings
/// value never changes over the fragment's lifetime; the point content is
/// mutated in place by [`invert`](Self::invert) and
/// [`append`](Self::append) during joining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathElement {
    start: Point,
    moves: Vec<Point>,
    settings: CutSettings,
}

impl PathElement {
    /// Create a fragment with no moves yet.
    #[must_use]
    pub const fn new(start: Point, settings: CutSettings) -> Self {
        Self {
            start,
            moves: Vec::new(),
            settings,
        }
    }

    /// The fragment's first point.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// The points after the start, in cut order.
    #[must_use]
    pub fn moves(&self) -> &[Point] {
        &self.moves
    }

    /// The settings this fragment is cut with.
    #[must_use]
    pub const fn settings(&self) -> &CutSettings {
        &self.settings
    }

    /// The fragment's last point: the final move, or the start when there
    /// are no moves.
    #[must_use]
    pub fn end(&self) -> Point {
        self.moves.last().copied().unwrap_or(self.start)
    }

    /// Total number of points (start plus moves).
    #[must_use]
    pub const fn point_count(&self) -> usize {
        1 + self.moves.len()
    }

    /// Extend the fragment with another cut target.
    pub fn push_point(&mut self, p: Point) {
        self.moves.push(p);
    }

    /// Whether the fragment is a closed loop: at least one move, and the
    /// end exactly equal to the start. Tolerance plays no part here; gaps
    /// are closed (or not) by the loop joiner before this test matters.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.moves.is_empty() && self.end() == self.start
    }

    /// Reverse the point order, swapping the roles of start and end.
    pub fn invert(&mut self) {
        let Some(&new_start) = self.moves.last() else {
            return;
        };
        let old_start = std::mem::replace(&mut self.start, new_start);
        self.moves.pop();
        self.moves.reverse();
        self.moves.push(old_start);
    }

    /// Concatenate another fragment onto this one's end, discarding the
    /// other's start point:
    ///
    /// `[a, b, c].append([d, e, f]) == [a, b, c, e, f]` (no `d`).
    ///
    /// Only meaningful when this end and the other start coincide (within
    /// the joiner's tolerance). Both fragments must carry equal settings;
    /// the joiner's per-settings partitioning makes an unequal pair
    /// unreachable, so a mismatch here is a partitioning bug.
    pub fn append(&mut self, other: Self) {
        debug_assert!(
            self.settings == other.settings,
            "cannot join fragments with different settings",
        );
        self.moves.extend(other.moves);
    }

    /// Axis-aligned bounding box of the start point and all moves.
    #[must_use]
    pub fn bounding_box(&self) -> geo::Rect<f64> {
        let (min, max) = self
            .moves
            .iter()
            .fold((self.start, self.start), |(lo, hi), p| {
                (
                    Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point::new(hi.x.max(p.x), hi.y.max(p.y)),
                )
            });
        geo::Rect::new(geo::Coord { x: min.x, y: min.y }, geo::Coord { x: max.x, y: max.y })
    }

    /// Whether this fragment traces exactly the same ordered point sequence
    /// as another, ignoring settings. Duplicate removal keys on this.
    #[must_use]
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.start == other.start && self.moves == other.moves
    }
}
