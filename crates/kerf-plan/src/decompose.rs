//! Path decomposition: split a flat command stream into disjoint fragments.
//!
//! Each fragment is a contiguous run of cuts under one fixed settings
//! value. A `MoveTo` or `SetSettings` command raises a boundary, so the
//! next `LineTo` starts a fresh fragment. A settings change alone, with
//! no explicit move, still forces a split at the last known position.

use crate::element::PathElement;
use crate::types::{CutSettings, PlanError, Point, VectorCommand, VectorPart};

/// Split a command stream into an ordered sequence of fragments.
///
/// Fragments come out in authoring order, each carrying the settings in
/// effect when its first cut was issued.
///
/// # Errors
///
/// Returns [`PlanError::LineBeforeMove`] when a `LineTo` appears before
/// any `MoveTo` established a position. Such a stream is malformed at the
/// source; recovering would invent an undefined start point.
pub fn decompose(part: &VectorPart) -> Result<Vec<PathElement>, PlanError> {
    let mut result = Vec::new();
    let mut current: Option<PathElement> = None;
    let mut pending_point: Option<Point> = None;
    let mut pending_settings: Option<CutSettings> = None;
    let mut boundary = false;

    for (index, cmd) in part.commands().iter().enumerate() {
        match cmd {
            VectorCommand::MoveTo(p) => {
                pending_point = Some(*p);
                boundary = true;
            }
            VectorCommand::SetSettings(settings) => {
                pending_settings = Some(settings.clone());
                boundary = true;
            }
            VectorCommand::LineTo(p) => {
                if boundary {
                    boundary = false;
                    if let Some(done) = current.take() {
                        result.push(done);
                    }
                    let start = pending_point.ok_or(PlanError::LineBeforeMove { index })?;
                    // The part builder seeds an initial SetSettings, so a
                    // stream without one is synthetic; fall back to defaults
                    // rather than rejecting it.
                    let settings = pending_settings.clone().unwrap_or_default();
                    current = Some(PathElement::new(start, settings));
                }
                match current.as_mut() {
                    Some(el) => el.push_point(*p),
                    None => return Err(PlanError::LineBeforeMove { index }),
                }
            }
        }
    }

    if let Some(done) = current {
        result.push(done);
    }
    Ok(result)
}
