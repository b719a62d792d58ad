//! Assembly: flatten ordered fragments back into a flat command stream.

use crate::element::PathElement;
use crate::types::{CutSettings, VectorPart};

/// Flatten fragments, in the given order, into a new [`VectorPart`].
///
/// Each fragment becomes a `MoveTo` to its start followed by one `LineTo`
/// per move. A `SetSettings` command is emitted only when the settings
/// value actually changes between consecutive fragments; the first
/// fragment's settings (or `fallback` when there are no fragments) become
/// the part's seeded initial settings, so the stream always opens with
/// exactly one settings command.
#[must_use]
pub fn assemble(elements: &[PathElement], resolution: f64, fallback: &CutSettings) -> VectorPart {
    let initial = elements
        .first()
        .map_or_else(|| fallback.clone(), |el| el.settings().clone());
    let mut part = VectorPart::new(initial, resolution);

    for el in elements {
        if el.settings() != part.current_settings() {
            part.set_settings(el.settings().clone());
        }
        part.move_to(el.start());
        for &p in el.moves() {
            part.line_to(p);
        }
    }
    part
}
