//! Shared types for the kerf planning pipeline.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::order::OrderStrategy;

/// A 2D point in device pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Manhattan distance (`|dx| + |dy|`) to another point.
    ///
    /// The merge tolerance of the loop joiner is expressed in this metric.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

/// Machine parameters attached to a run of cut commands.
///
/// Treated as an opaque value by the planner: fragments carrying unequal
/// settings are never merged, and the assembler re-emits a settings change
/// only when the value actually differs between consecutive fragments.
///
/// Equality and hashing compare float bit patterns, so `Eq` and `Hash` stay
/// consistent with each other for every representable value (including NaN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutSettings {
    /// Laser power in percent (0-100).
    pub power: f32,
    /// Head speed in percent of the machine maximum (0-100).
    pub speed: f32,
    /// Focal offset in machine units. Zero means focus on the material surface.
    pub focus: f32,
    /// Pulse frequency in Hz. Zero on machines without frequency control.
    pub frequency: u32,
}

impl CutSettings {
    /// Create settings with the given power and speed, both clamped to
    /// `0.0..=100.0`, at surface focus and without frequency control.
    #[must_use]
    pub fn new(power: f32, speed: f32) -> Self {
        Self {
            power: power.clamp(0.0, 100.0),
            speed: speed.clamp(0.0, 100.0),
            focus: 0.0,
            frequency: 0,
        }
    }
}

impl Default for CutSettings {
    fn default() -> Self {
        Self::new(20.0, 100.0)
    }
}

impl PartialEq for CutSettings {
    fn eq(&self, other: &Self) -> bool {
        self.power.to_bits() == other.power.to_bits()
            && self.speed.to_bits() == other.speed.to_bits()
            && self.focus.to_bits() == other.focus.to_bits()
            && self.frequency == other.frequency
    }
}

impl Eq for CutSettings {}

impl Hash for CutSettings {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.power.to_bits().hash(state);
        self.speed.to_bits().hash(state);
        self.focus.to_bits().hash(state);
        self.frequency.hash(state);
    }
}

/// A single pen-like command in a vector part.
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
pub enum VectorCommand {
    /// Travel to the point with the tool off.
    MoveTo(Point),
    /// Cut a straight line to the point with the tool on.
    LineTo(Point),
    /// Switch the machine to the given settings for subsequent cuts.
    SetSettings(CutSettings),
}

/// An ordered command stream plus the resolution it was authored at.
///
/// This is the sole interchange format with upstream shape flattening and
/// downstream hardware drivers. The resolution (DPI) is carried through
/// untouched; only the driver layer may interpret it for unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPart {
    commands: Vec<VectorCommand>,
    resolution: f64,
    current_settings: CutSettings,
}

impl VectorPart {
    /// Create an empty part. The initial settings are recorded as the first
    /// command so the stream never depends on implicit machine state.
    #[must_use]
    pub fn new(initial_settings: CutSettings, resolution: f64) -> Self {
        Self {
            commands: vec![VectorCommand::SetSettings(initial_settings.clone())],
            resolution,
            current_settings: initial_settings,
        }
    }

    /// Travel to `(x, y)` with the tool off.
    pub fn move_to(&mut self, p: Point) {
        self.commands.push(VectorCommand::MoveTo(p));
    }

    /// Cut a line to `(x, y)` with the tool on.
    pub fn line_to(&mut self, p: Point) {
        self.commands.push(VectorCommand::LineTo(p));
    }

    /// Switch to new settings for subsequent cuts.
    pub fn set_settings(&mut self, settings: CutSettings) {
        self.current_settings = settings.clone();
        self.commands.push(VectorCommand::SetSettings(settings));
    }

    /// The full command stream in execution order.
    #[must_use]
    pub fn commands(&self) -> &[VectorCommand] {
        &self.commands
    }

    /// Resolution in DPI. Not interpreted by the planner.
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// The settings in effect after the last command.
    #[must_use]
    pub const fn current_settings(&self) -> &CutSettings {
        &self.current_settings
    }

    /// Axis-aligned extent of all coordinates in the stream, or `None`
    /// when the part contains no moves or cuts.
    #[must_use]
    pub fn bounding_box(&self) -> Option<geo::Rect<f64>> {
        let mut points = self.commands.iter().filter_map(|cmd| match cmd {
            VectorCommand::MoveTo(p) | VectorCommand::LineTo(p) => Some(*p),
            VectorCommand::SetSettings(_) => None,
        });
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });
        Some(geo::Rect::new(
            geo::Coord { x: min.x, y: min.y },
            geo::Coord { x: max.x, y: max.y },
        ))
    }

    /// Deterministic fingerprint of the resolution and command stream.
    ///
    /// Uses SipHash-1-3 with fixed keys, so equal parts hash equally across
    /// runs and platforms. Driver regression tests compare these values to
    /// detect planner output drift.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = SipHasher13::new();
        self.resolution.to_bits().hash(&mut hasher);
        self.commands.hash(&mut hasher);
        hasher.finish()
    }
}

/// Configuration for a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Which ordering strategy to apply.
    pub strategy: OrderStrategy,

    /// Maximum Manhattan distance between two fragment endpoints for them
    /// to be considered coincident by the loop joiner. Used by the
    /// strategies that join before ordering.
    ///
    /// The default of 0.9 pixels heals sub-pixel gaps from authoring tools
    /// without bridging intentional breaks; near-zero travel moves between
    /// such gaps are known to confuse motion controllers.
    pub join_tolerance: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            strategy: OrderStrategy::default(),
            join_tolerance: 0.9,
        }
    }
}

impl PlanConfig {
    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidConfig`] if `join_tolerance` is negative
    /// or not finite.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.join_tolerance.is_finite() || self.join_tolerance < 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "join_tolerance must be finite and non-negative, got {}",
                self.join_tolerance
            )));
        }
        Ok(())
    }
}

/// Errors that can occur during planning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PlanError {
    /// The command stream cuts a line before any move established a start
    /// point. `index` is the offending command's position in the stream.
    #[error("command {index} cuts a line before any move established a position")]
    LineBeforeMove {
        /// Position of the offending `LineTo` in the command stream.
        index: usize,
    },

    /// Planning configuration is invalid.
    #[error("invalid plan configuration: {0}")]
    InvalidConfig(String),
}
