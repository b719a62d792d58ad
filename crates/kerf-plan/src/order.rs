//! Ordering strategies: arrange fragments into the sequence they will be
//! cut in.
//!
//! This module defines the [`ElementSorter`] trait for pluggable ordering
//! policies and the [`OrderStrategy`] enum for runtime selection. The
//! strategy set is closed; each variant dispatches to one function.

use serde::{Deserialize, Serialize};

use crate::element::PathElement;
use crate::join::join_contiguous;

/// Selects which ordering strategy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStrategy {
    /// Keep the authored order and directions untouched. For jobs where
    /// sequencing is intentional (e.g. direction-sensitive cuts).
    Preserve,

    /// Greedy nearest-neighbor tour over fragment endpoints, after joining
    /// hairline gaps. Cheap, predictable travel reduction; not globally
    /// optimal.
    #[default]
    Nearest,

    /// Join loops, then cut enclosed shapes before the boundary that
    /// encloses them, so interior pieces are freed while the surrounding
    /// material is still held in place.
    InnerFirst,

    /// Cut fragments in ascending bounding-box area. A cheaper stand-in
    /// for [`InnerFirst`](Self::InnerFirst) when containment analysis is
    /// unnecessary.
    SmallestFirst,

    /// Drop fragments that trace a point sequence already kept (settings
    /// ignored), then order the survivors like
    /// [`Nearest`](Self::Nearest). Guards against authoring tools emitting
    /// the same stroke twice.
    DeleteDuplicates,
}

/// Trait for ordering strategies.
///
/// Input: decomposed fragments in authored order. Output: the same
/// fragments (possibly joined, inverted, or deduplicated) in cut order.
pub trait ElementSorter {
    /// Arrange the given fragments into cut order. `join_tolerance` is the
    /// Manhattan merge tolerance for the strategies that join first.
    fn sort(&self, elements: Vec<PathElement>, join_tolerance: f64) -> Vec<PathElement>;
}

impl ElementSorter for OrderStrategy {
    fn sort(&self, elements: Vec<PathElement>, join_tolerance: f64) -> Vec<PathElement> {
        match *self {
            Self::Preserve => elements,
            Self::Nearest => nearest_order(elements, join_tolerance),
            Self::InnerFirst => inner_first_order(elements, join_tolerance),
            Self::SmallestFirst => smallest_first_order(elements),
            Self::DeleteDuplicates => delete_duplicate_paths(elements, join_tolerance),
        }
    }
}

/// Greedy nearest-neighbor tour construction.
///
/// Joins first: authoring tools leave sub-pixel gaps that would otherwise
/// turn into near-zero travel moves, which confuse motion controllers.
/// Then, starting from the first fragment, repeatedly appends the remaining
/// fragment whose start or end is closest (Euclidean) to the tour's last
/// point, inverting it when its end is the closer side. Strict `<`
/// comparison, so ties go to the lowest index.
fn nearest_order(elements: Vec<PathElement>, join_tolerance: f64) -> Vec<PathElement> {
    let mut remaining = join_contiguous(elements, join_tolerance);
    if remaining.is_empty() {
        return remaining;
    }

    let mut result = Vec::with_capacity(remaining.len());
    result.push(remaining.remove(0));
    let mut cursor = result[0].end();

    while !remaining.is_empty() {
        let mut next = 0;
        let mut invert = false;
        let mut best = f64::INFINITY;
        for (i, el) in remaining.iter().enumerate() {
            let to_start = el.start().distance_squared(cursor);
            if to_start < best {
                next = i;
                best = to_start;
                invert = false;
            }
            if el.start() != el.end() {
                let to_end = el.end().distance_squared(cursor);
                if to_end < best {
                    next = i;
                    best = to_end;
                    invert = true;
                }
            }
        }

        let mut el = remaining.remove(next);
        if invert {
            el.invert();
        }
        cursor = el.end();
        result.push(el);
    }
    result
}

/// Join loops, then order nested fragments inside-out.
///
/// Containment is judged on bounding boxes: for an inner box I inside an
/// outer box O, every edge satisfies `I.max < O.max` and `I.min > O.min`.
/// One stable sort by the key chain (y-max asc, x-max asc, y-min desc,
/// x-min desc) therefore emits contained fragments before their container,
/// while fragments with no containment relation keep their join-pass
/// order. Robust even when shapes arrive as individual line segments;
/// shapes sharing one bounding box (a circle inscribed in a square) are
/// beyond this heuristic.
fn inner_first_order(elements: Vec<PathElement>, join_tolerance: f64) -> Vec<PathElement> {
    let joined = join_contiguous(elements, join_tolerance);
    let mut keyed: Vec<(geo::Rect<f64>, PathElement)> = joined
        .into_iter()
        .map(|el| (el.bounding_box(), el))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        a.max()
            .y
            .total_cmp(&b.max().y)
            .then_with(|| a.max().x.total_cmp(&b.max().x))
            .then_with(|| b.min().y.total_cmp(&a.min().y))
            .then_with(|| b.min().x.total_cmp(&a.min().x))
    });
    keyed.into_iter().map(|(_, el)| el).collect()
}

/// Order by ascending bounding-box area, independent of containment.
///
/// Stable, so equal-area fragments keep their input order.
fn smallest_first_order(elements: Vec<PathElement>) -> Vec<PathElement> {
    let mut keyed: Vec<(f64, PathElement)> = elements
        .into_iter()
        .map(|el| {
            let bb = el.bounding_box();
            (bb.width() * bb.height(), el)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    keyed.into_iter().map(|(_, el)| el).collect()
}

/// Keep the first fragment of each identical point sequence and drop every
/// later copy, then order the survivors with the nearest-neighbor tour.
fn delete_duplicate_paths(elements: Vec<PathElement>, join_tolerance: f64) -> Vec<PathElement> {
    let mut unique: Vec<PathElement> = Vec::new();
    for el in elements {
        if !unique.iter().any(|kept| kept.same_geometry(&el)) {
            unique.push(el);
        }
    }
    nearest_order(unique, join_tolerance)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{CutSettings, Point};

    fn element(power: f32, points: &[(f64, f64)]) -> PathElement {
        let mut el = PathElement::new(
            Point::new(points[0].0, points[0].1),
            CutSettings::new(power, 100.0),
        );
        for &(x, y) in &points[1..] {
            el.push_point(Point::new(x, y));
        }
        el
    }

    // --- Preserve ---

    #[test]
    fn preserve_returns_input_unchanged() {
        let input = vec![
            element(50.0, &[(5.0, 5.0), (6.0, 5.0)]),
            element(50.0, &[(0.0, 0.0), (1.0, 0.0)]),
        ];
        let sorted = OrderStrategy::Preserve.sort(input.clone(), 0.9);
        assert_eq!(sorted, input);
    }

    // --- Nearest ---

    #[test]
    fn nearest_empty_input() {
        assert!(OrderStrategy::Nearest.sort(Vec::new(), 0.9).is_empty());
    }

    #[test]
    fn nearest_visits_closer_fragment_first() {
        // Tour starts at the first fragment, ending at (1, 0). The far
        // fragment comes second in authored order but must be cut last.
        let near_origin = element(50.0, &[(0.0, 0.0), (1.0, 0.0)]);
        let far = element(50.0, &[(100.0, 100.0), (101.0, 100.0)]);
        let near = element(50.0, &[(3.0, 0.0), (4.0, 0.0)]);

        let sorted = OrderStrategy::Nearest.sort(
            vec![near_origin.clone(), far.clone(), near.clone()],
            0.0,
        );
        assert_eq!(sorted, vec![near_origin, near, far]);
    }

    #[test]
    fn nearest_inverts_when_end_is_closer() {
        let first = element(50.0, &[(0.0, 0.0), (10.0, 0.0)]);
        let backwards = element(50.0, &[(100.0, 0.0), (12.0, 0.0)]);

        let sorted = OrderStrategy::Nearest.sort(vec![first, backwards], 0.0);
        assert_eq!(sorted[1].start(), Point::new(12.0, 0.0));
        assert_eq!(sorted[1].end(), Point::new(100.0, 0.0));
    }

    #[test]
    fn nearest_breaks_ties_toward_lower_index() {
        let first = element(50.0, &[(-1.0, 0.0), (0.0, 0.0)]);
        let right = element(50.0, &[(2.0, 0.0), (3.0, 0.0)]);
        let up = element(50.0, &[(0.0, 2.0), (0.0, 3.0)]);

        // Both candidates sit exactly 2.0 away from the cursor.
        let sorted = OrderStrategy::Nearest.sort(vec![first, right.clone(), up.clone()], 0.0);
        assert_eq!(sorted[1], right);
        assert_eq!(sorted[2], up);
    }

    #[test]
    fn nearest_visits_every_fragment_exactly_once() {
        let input: Vec<PathElement> = (0..10)
            .map(|i| {
                let x = f64::from(i) * 10.0;
                element(50.0, &[(x, 0.0), (x + 1.0, 0.0)])
            })
            .collect();

        let sorted = OrderStrategy::Nearest.sort(input.clone(), 0.0);
        assert_eq!(sorted.len(), 10);
        for original in &input {
            let mut reversed = original.clone();
            reversed.invert();
            assert_eq!(
                sorted
                    .iter()
                    .filter(|el| el.same_geometry(original) || el.same_geometry(&reversed))
                    .count(),
                1,
            );
        }
    }

    #[test]
    fn nearest_heals_hairline_gaps_before_ordering() {
        let input = vec![
            element(50.0, &[(0.0, 0.0), (1.0, 0.0)]),
            element(50.0, &[(1.2, 0.0), (2.0, 0.0)]),
        ];
        let sorted = OrderStrategy::Nearest.sort(input, 0.9);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].point_count(), 3);
    }

    #[test]
    fn nearest_reduces_total_travel() {
        let c0 = element(50.0, &[(0.0, 0.0), (1.0, 0.0)]);
        let c1 = element(50.0, &[(50.0, 0.0), (51.0, 0.0)]);
        let c2 = element(50.0, &[(2.0, 0.0), (3.0, 0.0)]);
        let c3 = element(50.0, &[(52.0, 0.0), (53.0, 0.0)]);

        let original = vec![c0, c1, c2, c3];
        let sorted = OrderStrategy::Nearest.sort(original.clone(), 0.0);

        let travel = |elements: &[PathElement]| -> f64 {
            elements
                .windows(2)
                .map(|pair| pair[0].end().distance(pair[1].start()))
                .sum()
        };
        assert!(travel(&sorted) <= travel(&original));
    }

    // --- InnerFirst ---

    /// The 12-segment nested-squares fixture, coordinates scaled by 2 so
    /// every genuine vertex distance clears the join tolerance.
    fn nested_squares() -> Vec<PathElement> {
        let s = 2.0;
        vec![
            element(50.0, &[(0.0, 0.0), (3.0 * s, 0.0)]),
            element(50.0, &[(3.0 * s, 5.0 * s), (3.0 * s, 0.0)]),
            element(50.0, &[(3.0 * s, 5.0 * s), (0.0, 5.0 * s)]),
            element(50.0, &[(0.0, 0.0), (0.0, 5.0 * s)]),
            element(50.0, &[(2.0 * s, s), (s, s)]),
            element(50.0, &[(s, 2.0 * s), (2.0 * s, 2.0 * s)]),
            element(50.0, &[(2.0 * s, s), (2.0 * s, 2.0 * s)]),
            element(50.0, &[(s, 2.0 * s), (s, s)]),
            element(50.0, &[(s, 3.0 * s), (2.0 * s, 3.0 * s)]),
            element(50.0, &[(2.0 * s, 4.0 * s), (2.0 * s, 3.0 * s)]),
            element(50.0, &[(2.0 * s, 4.0 * s), (s, 4.0 * s)]),
            element(50.0, &[(s, 3.0 * s), (s, 4.0 * s)]),
        ]
    }

    #[test]
    fn inner_first_cuts_nested_loops_inside_out() {
        let sorted = OrderStrategy::InnerFirst.sort(nested_squares(), 0.9);

        assert_eq!(sorted.len(), 3);
        for el in &sorted {
            assert!(el.is_closed());
            assert_eq!(el.point_count(), 5);
        }
        // Upper inner square, lower inner square, then the outer boundary.
        let upper = sorted[0].bounding_box();
        assert!((upper.min().y - 2.0).abs() < f64::EPSILON);
        assert!((upper.max().y - 4.0).abs() < f64::EPSILON);
        let lower = sorted[1].bounding_box();
        assert!((lower.min().y - 6.0).abs() < f64::EPSILON);
        assert!((lower.max().y - 8.0).abs() < f64::EPSILON);
        let outer = sorted[2].bounding_box();
        assert!((outer.max().x - 6.0).abs() < f64::EPSILON);
        assert!((outer.max().y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inner_first_keeps_differently_set_fragments_apart() {
        // As above, but one edge of the upper inner square cuts at a
        // different power. That edge must come back unmerged while the
        // remaining three edges join into an open chain.
        let s = 2.0;
        let input = vec![
            element(50.0, &[(0.0, 0.0), (3.0 * s, 0.0)]),
            element(50.0, &[(3.0 * s, 5.0 * s), (3.0 * s, 0.0)]),
            element(50.0, &[(3.0 * s, 5.0 * s), (0.0, 5.0 * s)]),
            element(50.0, &[(0.0, 0.0), (0.0, 5.0 * s)]),
            element(50.0, &[(2.0 * s, s), (s, s)]),
            element(50.0, &[(s, 2.0 * s), (s, s)]),
            element(100.0, &[(2.0 * s, s), (2.0 * s, 2.0 * s)]),
            element(50.0, &[(2.0 * s, 2.0 * s), (s, 2.0 * s)]),
            element(50.0, &[(s, 3.0 * s), (2.0 * s, 3.0 * s)]),
            element(50.0, &[(2.0 * s, 4.0 * s), (2.0 * s, 3.0 * s)]),
            element(50.0, &[(2.0 * s, 4.0 * s), (s, 4.0 * s)]),
            element(50.0, &[(s, 3.0 * s), (s, 4.0 * s)]),
        ];

        let sorted = OrderStrategy::InnerFirst.sort(input, 0.9);
        assert_eq!(sorted.len(), 4);

        // The odd-power edge sorts first (equal box maxima, larger minima)
        // and stays a bare two-point segment.
        assert_eq!(sorted[0].settings(), &CutSettings::new(100.0, 100.0));
        assert_eq!(sorted[0].point_count(), 2);

        // The rest of that square joined into one open 4-point chain.
        assert_eq!(sorted[1].point_count(), 4);
        assert!(!sorted[1].is_closed());

        // The untouched inner square and the outer boundary still close.
        assert!(sorted[2].is_closed());
        assert!(sorted[3].is_closed());
        assert!((sorted[3].bounding_box().max().y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inner_first_on_branching_grid_keeps_junctions_distinct() {
        let s = 2.0;
        let mut input = vec![
            element(50.0, &[(0.0, 0.0), (3.0 * s, 0.0)]),
            element(
                50.0,
                &[(0.0, 0.0), (0.0, 3.0 * s), (0.0, 5.0 * s), (3.0 * s, 5.0 * s)],
            ),
        ];
        for i in 1..=2 {
            for j in 1..=3 {
                let (fi, fj) = (f64::from(i) * s, f64::from(j) * s);
                input.push(element(50.0, &[(fi, fj), (fi + s, fj)]));
                input.push(element(50.0, &[(fj, fi), (fj, fi + s)]));
            }
        }

        let sorted = OrderStrategy::InnerFirst.sort(input, 0.9);
        // Lattice partially combined (degree-2 corners only), border pair
        // joined via the start-start inversion case.
        assert_eq!(sorted.len(), 9);
        // The border polyline spans the widest box and is cut last.
        assert_eq!(sorted[8].point_count(), 5);
        assert!((sorted[8].bounding_box().max().y - 10.0).abs() < f64::EPSILON);
    }

    // --- SmallestFirst ---

    #[test]
    fn smallest_first_orders_by_ascending_area() {
        let big = element(50.0, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let small = element(50.0, &[(20.0, 20.0), (21.0, 20.0), (21.0, 21.0)]);
        let medium = element(50.0, &[(40.0, 0.0), (45.0, 0.0), (45.0, 5.0)]);

        let sorted =
            OrderStrategy::SmallestFirst.sort(vec![big.clone(), small.clone(), medium.clone()], 0.9);
        assert_eq!(sorted, vec![small, medium, big]);
    }

    #[test]
    fn smallest_first_is_stable_for_equal_areas() {
        let a = element(50.0, &[(0.0, 0.0), (1.0, 1.0)]);
        let b = element(50.0, &[(10.0, 10.0), (11.0, 11.0)]);
        let sorted = OrderStrategy::SmallestFirst.sort(vec![a.clone(), b.clone()], 0.9);
        assert_eq!(sorted, vec![a, b]);
    }

    // --- DeleteDuplicates ---

    #[test]
    fn delete_duplicates_drops_repeated_geometry_regardless_of_settings() {
        let stroke = element(50.0, &[(0.0, 0.0), (5.0, 0.0)]);
        let same_at_other_power = element(90.0, &[(0.0, 0.0), (5.0, 0.0)]);
        let other = element(50.0, &[(20.0, 0.0), (25.0, 0.0)]);

        let sorted = OrderStrategy::DeleteDuplicates.sort(
            vec![stroke.clone(), same_at_other_power, other.clone()],
            0.0,
        );
        assert_eq!(sorted, vec![stroke, other]);
    }

    #[test]
    fn delete_duplicates_removes_all_later_copies() {
        let stroke = element(50.0, &[(0.0, 0.0), (5.0, 0.0)]);
        let sorted = OrderStrategy::DeleteDuplicates.sort(
            vec![stroke.clone(), stroke.clone(), stroke.clone()],
            0.0,
        );
        assert_eq!(sorted, vec![stroke]);
    }

    // --- Serde ---

    #[test]
    fn strategy_serde_round_trip() {
        for strategy in [
            OrderStrategy::Preserve,
            OrderStrategy::Nearest,
            OrderStrategy::InnerFirst,
            OrderStrategy::SmallestFirst,
            OrderStrategy::DeleteDuplicates,
        ] {
            let json = serde_json::to_string(&strategy).unwrap();
            let deserialized: OrderStrategy = serde_json::from_str(&json).unwrap();
            assert_eq!(strategy, deserialized);
        }
    }
}
