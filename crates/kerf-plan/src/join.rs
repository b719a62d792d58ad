//! Loop joining: merge fragments whose endpoints coincide within a
//! tolerance, closing loops where possible.
//!
//! # Algorithm overview
//!
//! 1. **Partition by settings:** fragments carrying unequal settings are
//!    never candidates for each other, so each settings group is processed
//!    independently. Already-closed fragments go straight to the result.
//!
//! 2. **Sweep-line index:** every open fragment contributes two directed
//!    endpoint records (its start and its end) to one collection sorted by
//!    x-coordinate. The sorted x order is snapshotted once and binary
//!    searched for the rest of the run; merges never move points, they only
//!    tombstone records and update their role, so the snapshot stays valid.
//!
//! 3. **Fixed-point merging:** repeatedly scan the live fragments. For each
//!    head (end first, then start), count the live endpoints of *other*
//!    fragments within the Manhattan tolerance. Exactly one neighbor means
//!    the two fragments meet end-to-end and are spliced (inverting one side
//!    as needed so they connect end-to-start). Two or more means a fork —
//!    a junction that must stay cuttable as distinct strokes — and is never
//!    merged. Zero at both heads means nothing can ever attach; the
//!    fragment is final and leaves the working set.
//!
//! 4. Fragments still live when a full pass changes nothing are appended to
//!    the result as-is.
//!
//! Worst case remains quadratic when many endpoints share an x-coordinate;
//! the binary search only bounds the scan to the local endpoint density.

use crate::element::PathElement;
use crate::types::Point;

/// A directed endpoint record used by the sweep line: one fragment endpoint
/// (start or end) plus the arena slot of its owning fragment.
///
/// The stored point never changes after sorting. A merge that survives in a
/// slot updates `slot` and `is_end` on the surviving records instead of
/// reinserting, which keeps the x-sorted order intact.
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    /// Arena slot of the owning fragment.
    slot: usize,
    /// The endpoint's coordinates.
    at: Point,
    /// `true` when this record is the owning fragment's end point.
    is_end: bool,
}

/// Merge fragments of equal settings whose start/end points coincide within
/// `tolerance` (Manhattan distance, strict), without ever merging at a fork.
///
/// Closed fragments pass through untouched. Open fragments that cannot be
/// joined further come out as-is. Each successful join discards exactly one
/// duplicate junction point; the total point count shrinks by the number of
/// joins and is otherwise conserved.
#[must_use]
pub fn join_contiguous(input: Vec<PathElement>, tolerance: f64) -> Vec<PathElement> {
    let mut result = Vec::new();
    for group in group_by_settings(input) {
        join_group(group, tolerance, &mut result);
    }
    result
}

/// Partition fragments into settings groups, in first-seen group order so
/// the transform stays deterministic.
fn group_by_settings(input: Vec<PathElement>) -> Vec<Vec<PathElement>> {
    let mut groups: Vec<Vec<PathElement>> = Vec::new();
    for el in input {
        match groups.iter_mut().find(|g| g[0].settings() == el.settings()) {
            Some(group) => group.push(el),
            None => groups.push(vec![el]),
        }
    }
    groups
}

/// Join one settings group, appending finished fragments to `result`.
#[allow(clippy::too_many_lines)]
fn join_group(elements: Vec<PathElement>, tolerance: f64, result: &mut Vec<PathElement>) {
    // Closed fragments need no further processing.
    let mut slots: Vec<Option<PathElement>> = Vec::with_capacity(elements.len());
    for el in elements {
        if el.is_closed() {
            result.push(el);
        } else {
            slots.push(Some(el));
        }
    }

    // Two directed endpoints per fragment, sorted by x. The x snapshot is
    // immutable from here on; `live` carries erasures separately so binary
    // search never has to skip holes.
    let mut endpoints: Vec<Endpoint> = Vec::with_capacity(slots.len() * 2);
    for (slot, el) in slots.iter().enumerate() {
        let Some(el) = el else { continue };
        endpoints.push(Endpoint {
            slot,
            at: el.start(),
            is_end: false,
        });
        endpoints.push(Endpoint {
            slot,
            at: el.end(),
            is_end: true,
        });
    }
    endpoints.sort_by(|a, b| a.at.x.total_cmp(&b.at.x));
    let xs: Vec<f64> = endpoints.iter().map(|e| e.at.x).collect();
    let mut live = vec![true; endpoints.len()];

    // Back-references from arena slots into the endpoint collection, kept
    // in step with invert/append so a fragment's records can be found
    // without searching.
    let mut start_ep = vec![0usize; slots.len()];
    let mut end_ep = vec![0usize; slots.len()];
    for (i, ep) in endpoints.iter().enumerate() {
        if ep.is_end {
            end_ep[ep.slot] = i;
        } else {
            start_ep[ep.slot] = i;
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for idx in 0..slots.len() {
            let Some(current) = slots[idx].as_ref() else {
                continue;
            };
            // End first, then start; values are copied out so the arena can
            // be mutated once a merge is decided.
            let heads = [(true, current.end()), (false, current.start())];
            let mut any_neighbor = false;

            for (head_is_end, head) in heads {
                // Skip everything strictly left of the tolerance window,
                // then scan right until the window closes.
                let from = xs.partition_point(|&x| x <= head.x - tolerance);
                let mut nearby = 0u32;
                let mut start_neighbor: Option<usize> = None;
                let mut end_neighbor: Option<usize> = None;
                for i in from..endpoints.len() {
                    if xs[i] > head.x + tolerance {
                        break;
                    }
                    if !live[i] || endpoints[i].slot == idx {
                        continue;
                    }
                    if nearby >= 2 {
                        // Fork confirmed; no point scanning further.
                        break;
                    }
                    if endpoints[i].at.manhattan_distance(head) < tolerance {
                        nearby += 1;
                        if endpoints[i].is_end {
                            end_neighbor = Some(endpoints[i].slot);
                        } else {
                            start_neighbor = Some(endpoints[i].slot);
                        }
                    }
                }

                if nearby >= 1 {
                    any_neighbor = true;
                }
                if nearby != 1 {
                    // Dead end (0) or fork (>= 2): nothing to merge at this
                    // head. The other head still gets its turn.
                    continue;
                }

                let (other_slot, neighbor_is_end) = match (start_neighbor, end_neighbor) {
                    (Some(slot), None) => (slot, false),
                    (None, Some(slot)) => (slot, true),
                    // Unreachable with nearby == 1.
                    _ => break,
                };
                let (Some(mut cur_el), Some(mut other_el)) =
                    (slots[idx].take(), slots[other_slot].take())
                else {
                    break;
                };

                let merged_slot = match (head_is_end, neighbor_is_end) {
                    (true, false) => {
                        // current.end -- other.start: plain splice.
                        live[end_ep[idx]] = false;
                        live[start_ep[other_slot]] = false;
                        cur_el.append(other_el);
                        end_ep[idx] = end_ep[other_slot];
                        slots[idx] = Some(cur_el);
                        idx
                    }
                    (false, false) => {
                        // current.start -- other.start: reverse current so
                        // the pair meets end-to-start.
                        live[start_ep[idx]] = false;
                        live[start_ep[other_slot]] = false;
                        cur_el.invert();
                        std::mem::swap(&mut start_ep[idx], &mut end_ep[idx]);
                        cur_el.append(other_el);
                        end_ep[idx] = end_ep[other_slot];
                        slots[idx] = Some(cur_el);
                        idx
                    }
                    (true, true) => {
                        // current.end -- other.end: reverse the neighbor
                        // instead so it becomes start-compatible.
                        live[end_ep[idx]] = false;
                        live[end_ep[other_slot]] = false;
                        other_el.invert();
                        std::mem::swap(&mut start_ep[other_slot], &mut end_ep[other_slot]);
                        cur_el.append(other_el);
                        end_ep[idx] = end_ep[other_slot];
                        slots[idx] = Some(cur_el);
                        idx
                    }
                    (false, true) => {
                        // other.end -- current.start: the neighbor absorbs
                        // the current fragment.
                        live[end_ep[other_slot]] = false;
                        live[start_ep[idx]] = false;
                        other_el.append(cur_el);
                        end_ep[other_slot] = end_ep[idx];
                        slots[other_slot] = Some(other_el);
                        other_slot
                    }
                };

                let merged_closed = slots[merged_slot]
                    .as_ref()
                    .is_some_and(PathElement::is_closed);
                if merged_closed {
                    if let Some(done) = slots[merged_slot].take() {
                        result.push(done);
                    }
                    live[start_ep[merged_slot]] = false;
                    live[end_ep[merged_slot]] = false;
                } else {
                    let s = start_ep[merged_slot];
                    let e = end_ep[merged_slot];
                    endpoints[s].slot = merged_slot;
                    endpoints[s].is_end = false;
                    endpoints[e].slot = merged_slot;
                    endpoints[e].is_end = true;
                }
                changed = true;
                // This fragment has been restructured; move on to the next.
                break;
            }

            if !any_neighbor {
                // Neither head found anything anywhere: nothing can ever
                // attach to this fragment, so it is final.
                if let Some(done) = slots[idx].take() {
                    result.push(done);
                    live[start_ep[idx]] = false;
                    live[end_ep[idx]] = false;
                }
            }
        }
    }

    // Whatever is still live could not be joined further (open polylines
    // and dangling ends held apart by forks).
    for slot in &mut slots {
        if let Some(el) = slot.take() {
            result.push(el);
        }
    }
}
