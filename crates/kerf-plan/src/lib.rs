//! kerf-plan: Pure cut-path planning pipeline (sans-IO).
//!
//! Rewrites a vector part's command stream to cut faster and cleaner:
//! decompose -> join hairline gaps -> order -> reassemble.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! command streams and returns a new stream. Talking to hardware and
//! loading job files live in the driver layers above.

pub mod assemble;
pub mod decompose;
pub mod element;
pub mod join;
pub mod order;
pub mod types;

pub use assemble::assemble;
pub use decompose::decompose;
pub use element::PathElement;
pub use join::join_contiguous;
pub use order::{ElementSorter, OrderStrategy};
pub use types::{CutSettings, PlanConfig, PlanError, Point, VectorCommand, VectorPart};

/// Run the full planning pipeline on one vector part.
///
/// Produces a new part at the same resolution whose commands cut the same
/// geometry in the order chosen by the configured strategy. Cut content is
/// conserved: every `LineTo` segment of the input reappears exactly once,
/// possibly reversed and regrouped, with `MoveTo` and `SetSettings`
/// commands regenerated to match the new order.
///
/// # Pipeline steps
///
/// 1. Decompose the command stream into fragments
/// 2. Apply the ordering strategy (which may join, invert, or deduplicate)
/// 3. Reassemble the fragments into a fresh command stream
///
/// # Errors
///
/// Returns [`PlanError::InvalidConfig`] if the configuration fails
/// validation. Returns [`PlanError::LineBeforeMove`] if the input stream
/// cuts before any move established a position.
pub fn optimize(part: &VectorPart, config: &PlanConfig) -> Result<VectorPart, PlanError> {
    config.validate()?;

    // 1. Decompose into fragments.
    let elements = decompose::decompose(part)?;

    // 2. Order (and possibly join or deduplicate) the fragments.
    let ordered = config.strategy.sort(elements, config.join_tolerance);

    // 3. Reassemble into a flat stream.
    Ok(assemble::assemble(
        &ordered,
        part.resolution(),
        part.current_settings(),
    ))
}
