//! Run-length grouping of an ordered sequence by a distance gap.
//!
//! Both clustering and segmentation walk a time-ordered sequence, compare
//! each element with its immediate predecessor, and open a new group
//! whenever the two are farther apart than a threshold. The group index is
//! the running count of such gaps, so the first element is always in group 0.

use crate::geo_utils::distance;
use crate::GeoPoint;

/// True when `next` is farther than `threshold_m` from `prev`.
///
/// A distance exactly equal to the threshold is not a gap.
pub fn is_gap(prev: &GeoPoint, next: &GeoPoint, threshold_m: f64) -> bool {
    distance(prev, next) > threshold_m
}

/// Split `items` into maximal runs in which every element lies within
/// `threshold_m` of its immediate predecessor.
///
/// Runs are yielded in input order and are never empty; the n-th run is the
/// group whose running gap count is n.
pub fn split_runs<'a, T, F>(
    items: &'a [T],
    threshold_m: f64,
    position: F,
) -> impl Iterator<Item = &'a [T]> + 'a
where
    T: 'a,
    F: Fn(&T) -> GeoPoint + 'a,
{
    items.chunk_by(move |prev, next| !is_gap(&position(prev), &position(next), threshold_m))
}

/// Running gap count for every element: the group index each element
/// belongs to under [`split_runs`].
pub fn run_ids<T, F>(items: &[T], threshold_m: f64, position: F) -> Vec<u32>
where
    F: Fn(&T) -> GeoPoint,
{
    let mut ids = Vec::with_capacity(items.len());
    let mut current = 0u32;
    let mut previous: Option<GeoPoint> = None;

    for item in items {
        let here = position(item);
        if let Some(prev) = previous {
            if is_gap(&prev, &here, threshold_m) {
                current += 1;
            }
        }
        ids.push(current);
        previous = Some(here);
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::offset_meters;

    fn line_with_steps(steps: &[f64]) -> Vec<GeoPoint> {
        let mut current = GeoPoint::new(33.7, -118.2);
        let mut points = vec![current];
        for step in steps {
            current = offset_meters(&current, *step, 0.0);
            points.push(current);
        }
        points
    }

    #[test]
    fn test_runs_and_ids_agree() {
        let points = line_with_steps(&[5.0, 5.0, 800.0, 5.0, 300.0, 2.0]);
        let ids = run_ids(&points, 100.0, |p| *p);
        assert_eq!(ids, vec![0, 0, 0, 1, 1, 2, 2]);

        let runs: Vec<&[GeoPoint]> = split_runs(&points, 100.0, |p| *p).collect();
        assert_eq!(runs.len(), 3);
        for (run_index, run) in runs.iter().enumerate() {
            let expected = ids.iter().filter(|id| **id == run_index as u32).count();
            assert_eq!(run.len(), expected);
        }
    }

    #[test]
    fn test_empty_and_single() {
        let empty: Vec<GeoPoint> = vec![];
        assert_eq!(split_runs(&empty, 10.0, |p| *p).count(), 0);
        assert!(run_ids(&empty, 10.0, |p| *p).is_empty());

        let single = vec![GeoPoint::new(0.0, 0.0)];
        assert_eq!(split_runs(&single, 10.0, |p| *p).count(), 1);
        assert_eq!(run_ids(&single, 10.0, |p| *p), vec![0]);
    }
}
